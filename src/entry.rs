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

//! Ledger entry model.
//!
//! A [`LedgerEntry`] is the immutable audit record of exactly one balance
//! change. Entries are created by the engine inside the same critical
//! section as the balance write and are never updated or deleted;
//! corrections are made via new offsetting entries.

use crate::base::{EntryId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which balance field of the wallet an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceKind {
    Real,
    Bonus,
}

impl fmt::Display for BalanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalanceKind::Real => write!(f, "real"),
            BalanceKind::Bonus => write!(f, "bonus"),
        }
    }
}

/// Direction of a balance adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Add,
    Subtract,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Add => write!(f, "add"),
            Direction::Subtract => write!(f, "subtract"),
        }
    }
}

/// What kind of event produced an entry.
///
/// The engine itself produces `Adjustment`, `Transfer`, and `Bonus`; the
/// remaining kinds are recorded on behalf of external callers (bet engine,
/// deposit/withdrawal approval flows) through the same API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Adjustment,
    Transfer,
    Bonus,
    Deposit,
    Withdrawal,
    BetPlaced,
    BetWon,
    BetRefund,
}

/// Settlement status of an entry.
///
/// The engine writes `Completed`; the full set exists for external flows
/// that stage entries before settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

/// How a reference id on an entry should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Debit side of a transfer; the id names the paired credit entry.
    TransferOut,
    /// Credit side of a transfer; the id names the paired debit entry.
    TransferIn,
    /// Caller-supplied correlation id (e.g. a deposit request id).
    External,
}

/// Correlates an entry with its counterpart or an external record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryReference {
    pub kind: ReferenceKind,
    pub id: String,
}

/// One immutable audit record of a balance change.
///
/// `balance_before`/`balance_after` are taken on the specific balance field
/// named by `balance`, inside the same critical section that applied the
/// change, so `balance_after` always equals the wallet's value at the
/// moment this entry was the newest one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub user_id: UserId,
    pub kind: EntryKind,
    /// Magnitude only; direction is implied by before/after.
    pub amount: Decimal,
    pub balance: BalanceKind,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub status: EntryStatus,
    pub description: Option<String>,
    pub reference: Option<EntryReference>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Whether the entry recorded a credit (balance went up).
    pub fn is_credit(&self) -> bool {
        self.balance_after >= self.balance_before
    }

    /// The direction this entry recorded, derived from before/after.
    pub fn direction(&self) -> Direction {
        if self.is_credit() {
            Direction::Add
        } else {
            Direction::Subtract
        }
    }

    /// Checks the arithmetic invariant: `after == before ± amount`.
    pub fn is_consistent(&self) -> bool {
        self.balance_after == self.balance_before + self.amount
            || self.balance_after == self.balance_before - self.amount
    }
}
