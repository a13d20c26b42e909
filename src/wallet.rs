// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Wallet state and the per-wallet atomic unit.
//!
//! A [`Wallet`] guards its balances and its entry log behind one mutex.
//! Holding that mutex *is* the atomic unit: every balance write appends its
//! ledger entry before the lock is released, so no observer can see a
//! balance change without its audit record or vice versa.
//!
//! # Example
//!
//! ```
//! use wallet_ledger::{Currency, UserId, Wallet};
//! use rust_decimal::Decimal;
//!
//! let wallet = Wallet::new(UserId(1), Currency::usd());
//! assert_eq!(wallet.real(), Decimal::ZERO);
//! ```

use crate::base::{Currency, EntryId, UserId};
use crate::entry::{
    BalanceKind, Direction, EntryKind, EntryReference, EntryStatus, LedgerEntry,
};
use crate::error::LedgerError;
use crate::ledger::EntryLog;
use chrono::Utc;
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct WalletData {
    pub(crate) user_id: UserId,
    pub(crate) real: Decimal,
    pub(crate) bonus: Decimal,
    /// Funds earmarked but not yet settled. Informational; no operation in
    /// this core mutates it.
    pub(crate) pending: Decimal,
    pub(crate) currency: Currency,
    pub(crate) entries: EntryLog,
}

impl WalletData {
    fn new(user_id: UserId, currency: Currency) -> Self {
        Self {
            user_id,
            real: Decimal::ZERO,
            bonus: Decimal::ZERO,
            pending: Decimal::ZERO,
            currency,
            entries: EntryLog::new(),
        }
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.real >= Decimal::ZERO,
            "Invariant violated: real balance went negative: {}",
            self.real
        );
        debug_assert!(
            self.bonus >= Decimal::ZERO,
            "Invariant violated: bonus balance went negative: {}",
            self.bonus
        );
    }

    pub(crate) fn balance(&self, kind: BalanceKind) -> Decimal {
        match kind {
            BalanceKind::Real => self.real,
            BalanceKind::Bonus => self.bonus,
        }
    }

    /// Whether a subtraction of `amount` from `kind` would be covered.
    pub(crate) fn can_cover(&self, kind: BalanceKind, amount: Decimal) -> bool {
        self.balance(kind) >= amount
    }

    /// Applies one balance change, returning `(before, after)`.
    ///
    /// The precondition check reads the balance here, inside the caller's
    /// lock scope, never from an earlier stale read.
    fn apply(
        &mut self,
        kind: BalanceKind,
        direction: Direction,
        amount: Decimal,
    ) -> Result<(Decimal, Decimal), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }

        let before = self.balance(kind);
        let after = match direction {
            Direction::Add => before + amount,
            Direction::Subtract => {
                if before < amount {
                    return Err(LedgerError::InsufficientBalance);
                }
                before - amount
            }
        };

        match kind {
            BalanceKind::Real => self.real = after,
            BalanceKind::Bonus => self.bonus = after,
        }
        self.assert_invariants();
        Ok((before, after))
    }

    /// Applies a balance change and appends its ledger entry as one unit.
    ///
    /// The entry's before/after values are taken from the apply itself, so
    /// they always match the wallet state this call produced. On error
    /// neither the balance nor the log is touched.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn record(
        &mut self,
        id: EntryId,
        kind: EntryKind,
        balance: BalanceKind,
        direction: Direction,
        amount: Decimal,
        description: Option<String>,
        reference: Option<EntryReference>,
        metadata: Option<serde_json::Value>,
    ) -> Result<Arc<LedgerEntry>, LedgerError> {
        let (balance_before, balance_after) = self.apply(balance, direction, amount)?;

        Ok(self.entries.append(LedgerEntry {
            id,
            user_id: self.user_id,
            kind,
            amount,
            balance,
            balance_before,
            balance_after,
            status: EntryStatus::Completed,
            description,
            reference,
            metadata,
            created_at: Utc::now(),
        }))
    }

    pub(crate) fn snapshot(&self) -> WalletSnapshot {
        WalletSnapshot {
            user_id: self.user_id,
            real: self.real,
            bonus: self.bonus,
            pending: self.pending,
            total_available: self.real + self.bonus,
            currency: self.currency.clone(),
        }
    }
}

/// Per-user wallet holding current balances and their audit history.
#[derive(Debug)]
pub struct Wallet {
    inner: Mutex<WalletData>,
}

impl Wallet {
    /// Currency precision used when serializing balances.
    const DECIMAL_PRECISION: u32 = 2;

    pub fn new(user_id: UserId, currency: Currency) -> Self {
        Self {
            inner: Mutex::new(WalletData::new(user_id, currency)),
        }
    }

    /// Serializes access to the wallet; the guard's scope is the atomic
    /// unit for any mutation.
    pub(crate) fn lock(&self) -> MutexGuard<'_, WalletData> {
        self.inner.lock()
    }

    pub fn user_id(&self) -> UserId {
        self.inner.lock().user_id
    }

    pub fn real(&self) -> Decimal {
        self.inner.lock().real
    }

    pub fn bonus(&self) -> Decimal {
        self.inner.lock().bonus
    }

    pub fn pending(&self) -> Decimal {
        self.inner.lock().pending
    }

    /// Returns `real + bonus`.
    pub fn total_available(&self) -> Decimal {
        let data = self.inner.lock();
        data.real + data.bonus
    }

    pub fn currency(&self) -> Currency {
        self.inner.lock().currency.clone()
    }

    /// Number of ledger entries recorded against this wallet.
    pub fn entry_count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Consistent point-in-time copy of the wallet's balances.
    pub fn snapshot(&self) -> WalletSnapshot {
        self.inner.lock().snapshot()
    }
}

/// Immutable caller-facing view of a wallet, taken under its lock.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub user_id: UserId,
    pub real: Decimal,
    pub bonus: Decimal,
    pub pending: Decimal,
    pub total_available: Decimal,
    pub currency: Currency,
}

impl Serialize for Wallet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = self.inner.lock();
        let mut state = serializer.serialize_struct("Wallet", 6)?;
        state.serialize_field("user", &data.user_id)?;
        state.serialize_field("real", &data.real.round_dp(Wallet::DECIMAL_PRECISION))?;
        state.serialize_field("bonus", &data.bonus.round_dp(Wallet::DECIMAL_PRECISION))?;
        state.serialize_field("pending", &data.pending.round_dp(Wallet::DECIMAL_PRECISION))?;
        state.serialize_field(
            "total_available",
            &(data.real + data.bonus).round_dp(Wallet::DECIMAL_PRECISION),
        )?;
        state.serialize_field("currency", &data.currency)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    // === WalletData Internal Tests ===
    // These test the private WalletData methods directly.

    fn next_id(data: &WalletData) -> EntryId {
        EntryId(data.entries.len() as u64 + 1)
    }

    fn credit_real(data: &mut WalletData, amount: Decimal) {
        data.record(
            next_id(data),
            EntryKind::Adjustment,
            BalanceKind::Real,
            Direction::Add,
            amount,
            None,
            None,
            None,
        )
        .unwrap();
    }

    #[test]
    fn apply_add_increases_balance() {
        let mut data = WalletData::new(UserId(1), Currency::usd());
        let (before, after) = data
            .apply(BalanceKind::Real, Direction::Add, dec!(100.00))
            .unwrap();
        assert_eq!(before, Decimal::ZERO);
        assert_eq!(after, dec!(100.00));
        assert_eq!(data.real, dec!(100.00));
        assert_eq!(data.bonus, Decimal::ZERO);
    }

    #[test]
    fn apply_subtract_decreases_balance() {
        let mut data = WalletData::new(UserId(1), Currency::usd());
        data.apply(BalanceKind::Real, Direction::Add, dec!(100.00))
            .unwrap();
        let (before, after) = data
            .apply(BalanceKind::Real, Direction::Subtract, dec!(30.00))
            .unwrap();
        assert_eq!(before, dec!(100.00));
        assert_eq!(after, dec!(70.00));
    }

    #[test]
    fn apply_subtract_insufficient_returns_error() {
        let mut data = WalletData::new(UserId(1), Currency::usd());
        data.apply(BalanceKind::Real, Direction::Add, dec!(50.00))
            .unwrap();
        let result = data.apply(BalanceKind::Real, Direction::Subtract, dec!(100.00));
        assert_eq!(result, Err(LedgerError::InsufficientBalance));
        assert_eq!(data.real, dec!(50.00));
    }

    #[test]
    fn apply_rejects_non_positive_amounts() {
        let mut data = WalletData::new(UserId(1), Currency::usd());
        assert_eq!(
            data.apply(BalanceKind::Real, Direction::Add, Decimal::ZERO),
            Err(LedgerError::InvalidAmount)
        );
        assert_eq!(
            data.apply(BalanceKind::Real, Direction::Add, dec!(-1.00)),
            Err(LedgerError::InvalidAmount)
        );
    }

    #[test]
    fn bonus_balance_is_independent_of_real() {
        let mut data = WalletData::new(UserId(1), Currency::usd());
        data.apply(BalanceKind::Bonus, Direction::Add, dec!(25.00))
            .unwrap();
        assert_eq!(data.bonus, dec!(25.00));
        assert_eq!(data.real, Decimal::ZERO);

        // Real funds cannot cover a bonus subtraction
        let result = data.apply(BalanceKind::Bonus, Direction::Subtract, dec!(30.00));
        assert_eq!(result, Err(LedgerError::InsufficientBalance));
    }

    #[test]
    fn record_appends_matching_entry() {
        let mut data = WalletData::new(UserId(7), Currency::usd());
        credit_real(&mut data, dec!(100.00));
        let entry = data
            .record(
                EntryId(2),
                EntryKind::Adjustment,
                BalanceKind::Real,
                Direction::Subtract,
                dec!(30.00),
                Some("test".to_string()),
                None,
                None,
            )
            .unwrap();

        assert_eq!(entry.balance_before, dec!(100.00));
        assert_eq!(entry.balance_after, dec!(70.00));
        assert_eq!(entry.status, EntryStatus::Completed);
        assert_eq!(entry.user_id, UserId(7));
        assert!(entry.is_consistent());
        assert_eq!(data.entries.len(), 2);
        assert_eq!(data.real, entry.balance_after);
    }

    #[test]
    fn failed_record_appends_nothing() {
        let mut data = WalletData::new(UserId(1), Currency::usd());
        credit_real(&mut data, dec!(70.00));
        let result = data.record(
            EntryId(2),
            EntryKind::Adjustment,
            BalanceKind::Real,
            Direction::Subtract,
            dec!(1000.00),
            None,
            None,
            None,
        );
        assert_eq!(result, Err(LedgerError::InsufficientBalance));
        assert_eq!(data.entries.len(), 1);
        assert_eq!(data.real, dec!(70.00));
    }

    #[test]
    fn can_cover_reads_the_chosen_field() {
        let mut data = WalletData::new(UserId(1), Currency::usd());
        data.apply(BalanceKind::Real, Direction::Add, dec!(10.00))
            .unwrap();
        assert!(data.can_cover(BalanceKind::Real, dec!(10.00)));
        assert!(!data.can_cover(BalanceKind::Real, dec!(10.01)));
        assert!(!data.can_cover(BalanceKind::Bonus, dec!(0.01)));
    }

    // === Snapshot Tests ===

    #[test]
    fn snapshot_totals_real_plus_bonus() {
        let mut data = WalletData::new(UserId(3), Currency::usd());
        data.apply(BalanceKind::Real, Direction::Add, dec!(40.00))
            .unwrap();
        data.apply(BalanceKind::Bonus, Direction::Add, dec!(10.00))
            .unwrap();

        let snap = data.snapshot();
        assert_eq!(snap.real, dec!(40.00));
        assert_eq!(snap.bonus, dec!(10.00));
        assert_eq!(snap.pending, Decimal::ZERO);
        assert_eq!(snap.total_available, dec!(50.00));
        assert_eq!(snap.currency, Currency::usd());
    }

    // === Serialization Tests ===

    #[test]
    fn serializer_rounds_to_two_decimal_places() {
        let wallet = Wallet::new(UserId(1), Currency::usd());

        {
            let mut data = wallet.inner.lock();
            // 123.456 should round to 123.46
            data.real = dec!(123.456);
            data.bonus = dec!(0.001); // Should round to 0.00
        }

        let json = serde_json::to_string(&wallet).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["real"].as_str().unwrap(), "123.46");
        assert_eq!(parsed["bonus"].as_str().unwrap(), "0.00");
        assert_eq!(parsed["total_available"].as_str().unwrap(), "123.46");
    }

    #[test]
    fn serializer_includes_all_fields() {
        let wallet = Wallet::new(UserId(42), Currency::usd());

        {
            let mut data = wallet.inner.lock();
            data.real = dec!(100.10);
            data.bonus = dec!(50.50);
        }

        let json = serde_json::to_string(&wallet).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["user"], 42);
        assert_eq!(parsed["real"].as_str().unwrap(), "100.10");
        assert_eq!(parsed["bonus"].as_str().unwrap(), "50.50");
        assert_eq!(parsed["pending"].as_str().unwrap(), "0");
        assert_eq!(parsed["total_available"].as_str().unwrap(), "150.60");
        assert_eq!(parsed["currency"], "USD");
    }

    #[test]
    fn serializer_uses_bankers_rounding() {
        let wallet = Wallet::new(UserId(1), Currency::usd());

        {
            let mut data = wallet.inner.lock();
            // Decimal rounds half to even:
            // 0.015 rounds to 0.02, 0.005 rounds to 0.00
            data.real = dec!(0.015);
            data.bonus = dec!(0.005);
        }

        let json = serde_json::to_string(&wallet).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["real"].as_str().unwrap(), "0.02");
        assert_eq!(parsed["bonus"].as_str().unwrap(), "0.00");
    }

    #[test]
    fn serializer_precision_constant_is_two() {
        assert_eq!(Wallet::DECIMAL_PRECISION, 2);
    }
}
