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

//! # Stock Ledger
//!
//! This library provides an inventory movement ledger for warehouse stock:
//! suppliers deliver materials (receipts), the warehouse issues materials
//! for use (withdrawals), and every product's on-hand quantity always
//! equals the net of its recorded movements.
//!
//! ## Core Components
//!
//! - [`Ledger`]: the engine that validates, applies, and records movements
//! - [`Catalog`]: products and their current quantities
//! - [`MovementStore`]: append-only log of applied movements
//! - [`IdentityDirectory`]: existence checks for suppliers and authors
//! - [`LedgerError`]: failure taxonomy for movement processing
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use rust_decimal_macros::dec;
//! use stock_ledger_rs::{
//!     Catalog, InMemoryDirectory, InMemoryStore, Ledger, ReceiptLine,
//!     ReceiptRequest, SupplierId, UserId,
//! };
//!
//! let catalog = Arc::new(Catalog::new());
//! let bolt = catalog.register("Bolt").unwrap();
//!
//! let directory = Arc::new(InMemoryDirectory::new());
//! directory.add_supplier(SupplierId(1));
//! directory.add_user(UserId(1));
//!
//! let ledger = Ledger::new(
//!     Arc::clone(&catalog),
//!     directory,
//!     Arc::new(InMemoryStore::new()),
//! );
//!
//! // Record a delivery of five bolts.
//! let outcome = ledger
//!     .record_receipt(ReceiptRequest {
//!         supplier_id: SupplierId(1),
//!         author: UserId(1),
//!         lines: vec![ReceiptLine {
//!             material_name: "Bolt".to_string(),
//!             quantity: 5,
//!             total_value: dec!(50.00),
//!         }],
//!     })
//!     .unwrap();
//!
//! assert_eq!(outcome.movement_ids.len(), 1);
//! assert_eq!(catalog.current_quantity(bolt).unwrap(), 5);
//! ```
//!
//! ## Thread Safety
//!
//! Movements against different products proceed fully in parallel;
//! movements against the same product serialize on a per-product lock held
//! only across the read-stage-commit of the quantity update.

mod base;
pub mod catalog;
mod directory;
pub mod error;
mod ledger;
pub mod movement;
mod product;
pub mod store;
pub mod validator;

pub use base::{BatchId, MovementId, ProductId, SupplierId, UserId};
pub use catalog::Catalog;
pub use directory::{IdentityDirectory, InMemoryDirectory};
pub use error::{ErrorKind, LedgerError};
pub use ledger::Ledger;
pub use movement::{
    MovementDraft, MovementKind, MovementRecord, ReceiptLine, ReceiptOutcome, ReceiptRequest,
    WithdrawalOutcome, WithdrawalRequest,
};
pub use product::Product;
pub use store::{AppendedBatch, InMemoryStore, MovementStore};
pub use validator::{Violation, validate_receipt, validate_withdrawal};
