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

//! Error types for ledger processing.

use crate::validator::Violation;
use thiserror::Error;

/// Broad failure categories, used by callers to decide whether a request
/// can be retried and by transports to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing fields; nothing was mutated.
    Validation,
    /// A referenced supplier, author, product, or movement does not resolve.
    NotFound,
    /// The request conflicts with current state (e.g. insufficient stock).
    Conflict,
    /// The store failed mid-operation; no partial state was left behind
    /// and the request is safe to retry.
    Transient,
}

/// Ledger processing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The request failed validation; carries the first violated rule.
    #[error("{0}")]
    Validation(Violation),

    /// Referenced supplier does not exist
    #[error("supplier not found")]
    SupplierNotFound,

    /// Referenced author does not exist
    #[error("author not found")]
    AuthorNotFound,

    /// A receipt line names a material with no catalog entry
    #[error("product not registered")]
    ProductNotRegistered,

    /// A withdrawal names a material with no catalog entry
    #[error("material not found")]
    MaterialNotFound,

    /// Product disappeared between resolution and quantity application
    #[error("product not found")]
    ProductNotFound,

    /// No movement record with the requested id
    #[error("movement not found")]
    MovementNotFound,

    /// A product with the same name (case-insensitive) already exists
    #[error("product already exists")]
    DuplicateProduct,

    /// Products can only be removed once their quantity is zero
    #[error("product still has stock on hand")]
    ProductNotEmpty,

    /// Withdrawal quantity exceeds the current on-hand quantity
    #[error("insufficient stock")]
    InsufficientStock,

    /// Applying the delta would overflow the quantity counter
    #[error("quantity overflow")]
    QuantityOverflow,

    /// The movement store failed; the operation was rolled back
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl LedgerError {
    /// Classifies the error into the retry/status taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation(_) => ErrorKind::Validation,
            LedgerError::SupplierNotFound
            | LedgerError::AuthorNotFound
            | LedgerError::ProductNotRegistered
            | LedgerError::MaterialNotFound
            | LedgerError::ProductNotFound
            | LedgerError::MovementNotFound => ErrorKind::NotFound,
            LedgerError::DuplicateProduct
            | LedgerError::ProductNotEmpty
            | LedgerError::InsufficientStock
            | LedgerError::QuantityOverflow => ErrorKind::Conflict,
            LedgerError::StoreUnavailable(_) => ErrorKind::Transient,
        }
    }
}
