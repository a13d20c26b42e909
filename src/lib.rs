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

//! # Wallet Ledger
//!
//! This library provides a wallet ledger engine: per-user monetary balances
//! with every change recorded as an immutable, auditable transaction.
//!
//! ## Core Components
//!
//! - [`Ledger`]: Caller-facing façade over the engine and query surface
//! - [`Engine`]: Transaction engine performing atomic balance mutations
//! - [`Wallet`]: Per-user balances (real, bonus, pending) plus entry log
//! - [`LedgerEntry`]: Immutable audit record of one balance change
//! - [`LedgerError`]: Typed failures for ledger operations
//!
//! ## Example
//!
//! ```
//! use wallet_ledger::{BalanceKind, Direction, Ledger, UserId};
//! use rust_decimal_macros::dec;
//!
//! let ledger = Ledger::new();
//!
//! // Provision a wallet and credit it
//! ledger.ensure_wallet(UserId(1));
//! ledger
//!     .adjust_balance(UserId(1), dec!(100.00), Direction::Add, BalanceKind::Real, "deposit approved")
//!     .unwrap();
//!
//! // Check the balance
//! let view = ledger.balance(UserId(1)).unwrap();
//! assert_eq!(view.real, dec!(100.00));
//! assert_eq!(view.total_available, dec!(100.00));
//! ```
//!
//! ## Thread Safety
//!
//! Operations against one wallet are serialized; operations against
//! disjoint wallets run in parallel. Every mutation commits its balance
//! write and its ledger entry together or not at all.

mod api;
mod base;
mod engine;
pub mod entry;
pub mod error;
mod ledger;
mod query;
pub mod wallet;

pub use api::Ledger;
pub use base::{Currency, EntryId, UserId};
pub use engine::Engine;
pub use entry::{
    BalanceKind, Direction, EntryKind, EntryReference, EntryStatus, LedgerEntry, ReferenceKind,
};
pub use error::LedgerError;
pub use ledger::EntryLog;
pub use query::{BalanceView, HistoryPage, PageMeta, MAX_PAGE_LIMIT};
pub use wallet::{Wallet, WalletSnapshot};
