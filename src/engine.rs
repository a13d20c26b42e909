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

//! Transaction engine.
//!
//! The [`Engine`] owns the balance store (a concurrent map of wallets) and
//! performs every balance mutation as one atomic unit: the balance write
//! and the ledger-entry append happen under the same wallet lock, so they
//! take effect together or not at all.
//!
//! # Concurrency
//!
//! Operations against the same wallet are serialized by that wallet's
//! mutex, so the second of two racing operations always observes the
//! first's committed balance. Operations against disjoint wallets run
//! fully in parallel. A transfer locks both wallets in `UserId` order,
//! which makes two opposing concurrent transfers deadlock-free.

use crate::base::{Currency, EntryId, UserId};
use crate::entry::{BalanceKind, Direction, EntryKind, EntryReference, ReferenceKind};
use crate::error::LedgerError;
use crate::wallet::{Wallet, WalletSnapshot};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Transaction engine managing per-user wallets.
///
/// # Invariants
///
/// - `real >= 0` and `bonus >= 0` on every wallet at all times.
/// - Every balance change has exactly one ledger entry whose
///   before/after values match the change, and vice versa.
/// - A transfer never half-applies: both balance writes and both entry
///   appends commit while both wallet locks are held.
pub struct Engine {
    /// Wallets indexed by owning user. Wallets are shared via `Arc` so a
    /// transfer can lock two of them without holding map references.
    wallets: DashMap<UserId, Arc<Wallet>>,
    /// Global ledger-entry id sequence.
    entry_seq: AtomicU64,
}

impl Engine {
    /// Creates a new engine with no wallets.
    pub fn new() -> Self {
        Engine {
            wallets: DashMap::new(),
            entry_seq: AtomicU64::new(1),
        }
    }

    fn next_entry_id(&self) -> EntryId {
        EntryId(self.entry_seq.fetch_add(1, Ordering::Relaxed))
    }

    /// Looks up the wallet for `user_id`.
    ///
    /// Mutating operations never create wallets implicitly; a missing
    /// wallet is always [`LedgerError::WalletNotFound`].
    pub(crate) fn wallet(&self, user_id: UserId) -> Result<Arc<Wallet>, LedgerError> {
        self.wallets
            .get(&user_id)
            .map(|w| Arc::clone(w.value()))
            .ok_or(LedgerError::WalletNotFound)
    }

    /// Idempotent wallet provisioning in the default currency.
    ///
    /// Creates a zero-balance wallet for the user if none exists, otherwise
    /// returns the existing one unchanged. The map's entry API makes a
    /// racing duplicate create impossible; the loser of the race simply
    /// observes the winner's wallet.
    pub fn ensure_wallet(&self, user_id: UserId) -> WalletSnapshot {
        self.ensure_wallet_with_currency(user_id, Currency::usd())
    }

    /// Idempotent wallet provisioning with an explicit currency.
    ///
    /// The currency is fixed at creation; an existing wallet keeps the
    /// currency it was created with.
    pub fn ensure_wallet_with_currency(
        &self,
        user_id: UserId,
        currency: Currency,
    ) -> WalletSnapshot {
        let wallet = self
            .wallets
            .entry(user_id)
            .or_insert_with(|| Arc::new(Wallet::new(user_id, currency)))
            .clone();
        wallet.snapshot()
    }

    /// Adjusts one balance field by `amount` in the given direction.
    ///
    /// The precondition check (sufficient balance on subtract) and the
    /// write happen under the same wallet lock, together with the entry
    /// append.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] - amount is zero or negative.
    /// - [`LedgerError::WalletNotFound`] - no wallet for the user.
    /// - [`LedgerError::InsufficientBalance`] - subtract exceeds the field.
    pub fn adjust_balance(
        &self,
        user_id: UserId,
        amount: Decimal,
        direction: Direction,
        balance: BalanceKind,
        reason: impl Into<String>,
    ) -> Result<WalletSnapshot, LedgerError> {
        // Shape validation first, wallet lookup second; every mutating
        // operation reports errors in that order.
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        let wallet = self.wallet(user_id)?;
        let mut data = wallet.lock();
        data.record(
            self.next_entry_id(),
            EntryKind::Adjustment,
            balance,
            direction,
            amount,
            Some(reason.into()),
            None,
            None,
        )?;
        Ok(data.snapshot())
    }

    /// Credits promotional funds to the bonus balance.
    pub fn credit_bonus(
        &self,
        user_id: UserId,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Result<WalletSnapshot, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        let wallet = self.wallet(user_id)?;
        let mut data = wallet.lock();
        data.record(
            self.next_entry_id(),
            EntryKind::Bonus,
            BalanceKind::Bonus,
            Direction::Add,
            amount,
            Some(description.into()),
            None,
            None,
        )?;
        Ok(data.snapshot())
    }

    /// Moves real funds between two wallets as one atomic unit.
    ///
    /// Both wallet locks are held across all four effects: the debit, the
    /// credit, and the two cross-referencing ledger entries. Precondition
    /// checks run after both locks are acquired, so a failed transfer
    /// leaves both wallets and both logs untouched.
    ///
    /// Bonus funds are non-transferable; only the real balance moves.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::SelfTransfer`] - sender and receiver are the same.
    /// - [`LedgerError::InvalidAmount`] - amount is zero or negative.
    /// - [`LedgerError::WalletNotFound`] - either wallet is missing.
    /// - [`LedgerError::CurrencyMismatch`] - wallets hold different currencies.
    /// - [`LedgerError::InsufficientBalance`] - sender's real balance short.
    pub fn transfer(
        &self,
        from: UserId,
        to: UserId,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Result<(WalletSnapshot, WalletSnapshot), LedgerError> {
        if from == to {
            return Err(LedgerError::SelfTransfer);
        }
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }

        let sender_wallet = self.wallet(from)?;
        let receiver_wallet = self.wallet(to)?;

        // Lock ordering by user id prevents deadlock between two opposing
        // concurrent transfers.
        let (mut sender, mut receiver) = if from < to {
            let sender = sender_wallet.lock();
            let receiver = receiver_wallet.lock();
            (sender, receiver)
        } else {
            let receiver = receiver_wallet.lock();
            let sender = sender_wallet.lock();
            (sender, receiver)
        };

        if sender.currency != receiver.currency {
            return Err(LedgerError::CurrencyMismatch);
        }
        if !sender.can_cover(BalanceKind::Real, amount) {
            return Err(LedgerError::InsufficientBalance);
        }

        let description = description.into();
        let metadata = json!({ "from": from, "to": to });
        let debit_id = self.next_entry_id();
        let credit_id = self.next_entry_id();

        sender.record(
            debit_id,
            EntryKind::Transfer,
            BalanceKind::Real,
            Direction::Subtract,
            amount,
            Some(description.clone()),
            Some(EntryReference {
                kind: ReferenceKind::TransferOut,
                id: credit_id.to_string(),
            }),
            Some(metadata.clone()),
        )?;
        receiver.record(
            credit_id,
            EntryKind::Transfer,
            BalanceKind::Real,
            Direction::Add,
            amount,
            Some(description),
            Some(EntryReference {
                kind: ReferenceKind::TransferIn,
                id: debit_id.to_string(),
            }),
            Some(metadata),
        )?;

        Ok((sender.snapshot(), receiver.snapshot()))
    }

    /// Records an entry produced by an external flow (bet settlement,
    /// deposit/withdrawal approval) through the same atomic unit.
    ///
    /// The caller supplies the entry kind and an optional correlation id,
    /// which is also the hook for caller-side retry deduplication.
    #[allow(clippy::too_many_arguments)]
    pub fn record_external(
        &self,
        user_id: UserId,
        kind: EntryKind,
        amount: Decimal,
        direction: Direction,
        balance: BalanceKind,
        description: Option<String>,
        reference_id: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> Result<WalletSnapshot, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        let wallet = self.wallet(user_id)?;
        let mut data = wallet.lock();
        data.record(
            self.next_entry_id(),
            kind,
            balance,
            direction,
            amount,
            description,
            reference_id.map(|id| EntryReference {
                kind: ReferenceKind::External,
                id,
            }),
            metadata,
        )?;
        Ok(data.snapshot())
    }

    /// Returns an iterator over all wallets.
    ///
    /// Useful for generating output reports of wallet states.
    pub fn wallets(
        &self,
    ) -> impl Iterator<Item = dashmap::mapref::multiple::RefMulti<'_, UserId, Arc<Wallet>>> {
        self.wallets.iter()
    }

    /// Number of provisioned wallets.
    pub fn wallet_count(&self) -> usize {
        self.wallets.len()
    }

    /// Retrieves a wallet handle by owning user.
    pub fn get_wallet(&self, user_id: UserId) -> Option<Arc<Wallet>> {
        self.wallets.get(&user_id).map(|w| Arc::clone(w.value()))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
