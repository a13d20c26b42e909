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

//! Read-only wallet views: current balance and paginated history.
//!
//! Reads take the wallet lock only long enough to copy a snapshot or clone
//! one page of `Arc`-shared entries, so they never block the engine's
//! writers longer than a normal read.

use crate::base::{Currency, UserId};
use crate::engine::Engine;
use crate::entry::LedgerEntry;
use crate::error::LedgerError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Upper bound on history page size.
pub const MAX_PAGE_LIMIT: usize = 100;

/// Point-in-time view of a wallet's balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceView {
    pub user_id: UserId,
    pub real: Decimal,
    pub bonus: Decimal,
    pub pending: Decimal,
    /// `real + bonus`.
    pub total_available: Decimal,
    pub currency: Currency,
}

/// Pagination metadata for a history page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Total entries recorded against the wallet.
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

/// One page of a wallet's ledger history, newest-first.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub entries: Vec<Arc<LedgerEntry>>,
    pub meta: PageMeta,
}

/// Read-only query surface.
impl Engine {
    /// Current balances for the user's wallet.
    ///
    /// # Errors
    ///
    /// [`LedgerError::WalletNotFound`] if the user has no wallet.
    pub fn balance(&self, user_id: UserId) -> Result<BalanceView, LedgerError> {
        let wallet = self.wallet(user_id)?;
        let snap = wallet.snapshot();
        Ok(BalanceView {
            user_id: snap.user_id,
            real: snap.real,
            bonus: snap.bonus,
            pending: snap.pending,
            total_available: snap.total_available,
            currency: snap.currency,
        })
    }

    /// One page of the wallet's ledger history, newest-first by creation.
    ///
    /// `page` is 1-based; `limit` is capped at [`MAX_PAGE_LIMIT`]. A page
    /// past the last entry yields an empty page, not an error.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::WalletNotFound`] - no wallet for the user.
    /// - [`LedgerError::InvalidPage`] - `page` or `limit` is zero.
    pub fn history(
        &self,
        user_id: UserId,
        page: usize,
        limit: usize,
    ) -> Result<HistoryPage, LedgerError> {
        if page == 0 || limit == 0 {
            return Err(LedgerError::InvalidPage);
        }
        let limit = limit.min(MAX_PAGE_LIMIT);

        let wallet = self.wallet(user_id)?;
        let data = wallet.lock();
        let total = data.entries.len();
        let entries = data.entries.page_newest_first(page, limit);
        drop(data);

        Ok(HistoryPage {
            entries,
            meta: PageMeta {
                total,
                page,
                limit,
                total_pages: total.div_ceil(limit),
            },
        })
    }
}
