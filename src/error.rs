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

//! Error types for ledger operations.

use thiserror::Error;

/// Ledger operation errors.
///
/// Every business-rule failure is detected before any write, so an error
/// result always means the wallet and its history are untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Referenced user has no wallet; callers provision explicitly via
    /// `ensure_wallet`, mutating operations never auto-create
    #[error("wallet not found")]
    WalletNotFound,

    /// Amount is zero or negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Subtraction or transfer would drive a balance negative
    #[error("insufficient balance")]
    InsufficientBalance,

    /// Sender and receiver of a transfer are the same wallet
    #[error("cannot transfer to own wallet")]
    SelfTransfer,

    /// Transfer between wallets holding different currencies
    #[error("wallet currencies do not match")]
    CurrencyMismatch,

    /// History page or limit is zero
    #[error("invalid page parameters (page and limit must be >= 1)")]
    InvalidPage,

    /// The underlying store detected contention it could not resolve.
    /// Never produced by the in-process store; kept so callers wrapping a
    /// durable store share one taxonomy. Safe to retry whole operations.
    #[error("store conflict, operation not applied")]
    StoreConflict,
}

#[cfg(test)]
mod tests {
    use super::LedgerError;

    #[test]
    fn error_display_messages() {
        assert_eq!(LedgerError::WalletNotFound.to_string(), "wallet not found");
        assert_eq!(
            LedgerError::InvalidAmount.to_string(),
            "invalid amount (must be positive)"
        );
        assert_eq!(
            LedgerError::InsufficientBalance.to_string(),
            "insufficient balance"
        );
        assert_eq!(
            LedgerError::SelfTransfer.to_string(),
            "cannot transfer to own wallet"
        );
        assert_eq!(
            LedgerError::CurrencyMismatch.to_string(),
            "wallet currencies do not match"
        );
        assert_eq!(
            LedgerError::InvalidPage.to_string(),
            "invalid page parameters (page and limit must be >= 1)"
        );
        assert_eq!(
            LedgerError::StoreConflict.to_string(),
            "store conflict, operation not applied"
        );
    }

    #[test]
    fn errors_are_cloneable() {
        let error = LedgerError::InsufficientBalance;
        let cloned = error.clone();
        assert_eq!(error, cloned);
    }
}
