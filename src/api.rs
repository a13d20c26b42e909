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

//! Caller-facing ledger façade.
//!
//! [`Ledger`] is the boundary consumed by the bet engine, the
//! deposit/withdrawal approval flows, and admin tools. It delegates to the
//! [`Engine`] and logs every operation result; business invariants live in
//! the engine, not here.

use crate::base::{Currency, UserId};
use crate::engine::Engine;
use crate::entry::{BalanceKind, Direction, EntryKind};
use crate::error::LedgerError;
use crate::query::{BalanceView, HistoryPage};
use crate::wallet::WalletSnapshot;
use rust_decimal::Decimal;
use tracing::{info, warn};

/// Thin façade over the transaction engine and the query surface.
pub struct Ledger {
    engine: Engine,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            engine: Engine::new(),
        }
    }

    /// Direct access to the underlying engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Idempotent create-if-absent wallet provisioning.
    pub fn ensure_wallet(&self, user_id: UserId) -> WalletSnapshot {
        self.ensure_wallet_with_currency(user_id, Currency::usd())
    }

    /// Idempotent wallet provisioning with an explicit currency.
    pub fn ensure_wallet_with_currency(
        &self,
        user_id: UserId,
        currency: Currency,
    ) -> WalletSnapshot {
        let snap = self.engine.ensure_wallet_with_currency(user_id, currency);
        info!(user = %user_id, currency = %snap.currency, "wallet ensured");
        snap
    }

    /// Current balances for the user's wallet.
    pub fn balance(&self, user_id: UserId) -> Result<BalanceView, LedgerError> {
        self.engine.balance(user_id)
    }

    /// Adjusts one balance field; `reason` lands on the audit entry.
    pub fn adjust_balance(
        &self,
        user_id: UserId,
        amount: Decimal,
        direction: Direction,
        balance: BalanceKind,
        reason: impl Into<String>,
    ) -> Result<WalletSnapshot, LedgerError> {
        let result = self
            .engine
            .adjust_balance(user_id, amount, direction, balance, reason);
        Self::log_result("adjust", user_id, Some(amount), &result);
        result
    }

    /// Moves real funds from `from` to `to`.
    pub fn transfer(
        &self,
        from: UserId,
        to: UserId,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Result<(WalletSnapshot, WalletSnapshot), LedgerError> {
        let result = self.engine.transfer(from, to, amount, description);
        match &result {
            Ok(_) => info!(from = %from, to = %to, amount = %amount, "transfer applied"),
            Err(e) => warn!(from = %from, to = %to, amount = %amount, "transfer rejected: {e}"),
        }
        result
    }

    /// Credits promotional funds to the bonus balance.
    pub fn credit_bonus(
        &self,
        user_id: UserId,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Result<WalletSnapshot, LedgerError> {
        let result = self.engine.credit_bonus(user_id, amount, description);
        Self::log_result("bonus", user_id, Some(amount), &result);
        result
    }

    /// One page of the wallet's history, newest-first.
    pub fn history(
        &self,
        user_id: UserId,
        page: usize,
        limit: usize,
    ) -> Result<HistoryPage, LedgerError> {
        self.engine.history(user_id, page, limit)
    }

    /// Records an externally produced balance change (bet settlement,
    /// approved deposit/withdrawal) through the same atomic unit.
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
        let result = self.engine.record_external(
            user_id,
            kind,
            amount,
            direction,
            balance,
            description,
            reference_id,
            metadata,
        );
        Self::log_result("external", user_id, Some(amount), &result);
        result
    }

    /// Small helper to log operation results.
    fn log_result<T>(
        op: &str,
        user: UserId,
        amount: Option<Decimal>,
        result: &Result<T, LedgerError>,
    ) {
        match (result, amount) {
            (Ok(_), Some(amt)) => info!(user = %user, amount = %amt, "{op} applied"),
            (Ok(_), None) => info!(user = %user, "{op} applied"),
            (Err(e), Some(amt)) => warn!(user = %user, amount = %amt, "{op} rejected: {e}"),
            (Err(e), None) => warn!(user = %user, "{op} rejected: {e}"),
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
