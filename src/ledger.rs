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

//! Append-only per-wallet transaction log.
//!
//! The log lives inside the wallet's mutex, so an append always happens in
//! the same critical section as the balance write it records. Nothing here
//! can update or remove an existing entry.

use crate::entry::LedgerEntry;
use std::sync::Arc;

/// Append-only sequence of ledger entries for one wallet.
///
/// Entries are stored oldest-first in append order; readers page through
/// them newest-first. Entries are handed out as `Arc`s so a history page is
/// a cheap clone that stays valid after the wallet lock is released.
#[derive(Debug, Default)]
pub struct EntryLog {
    entries: Vec<Arc<LedgerEntry>>,
}

impl EntryLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends an entry and returns the shared handle to it.
    pub fn append(&mut self, entry: LedgerEntry) -> Arc<LedgerEntry> {
        let entry = Arc::new(entry);
        self.entries.push(Arc::clone(&entry));
        entry
    }

    /// Total number of entries ever appended.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recently appended entry, if any.
    pub fn latest(&self) -> Option<&Arc<LedgerEntry>> {
        self.entries.last()
    }

    /// Returns one page of entries, newest-first.
    ///
    /// `page` is 1-based. A page past the end is empty, not an error, so
    /// the skip offset saturates rather than overflowing for huge pages.
    pub fn page_newest_first(&self, page: usize, limit: usize) -> Vec<Arc<LedgerEntry>> {
        debug_assert!(page >= 1 && limit >= 1);
        self.entries
            .iter()
            .rev()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .cloned()
            .collect()
    }
}
