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

//! The ledger engine.
//!
//! [`Ledger`] validates, records, and applies stock-changing events against
//! product quantities. It owns nothing but injected handles: the catalog it
//! mutates, the identity directory it consults, and the store it appends to.
//!
//! # Atomicity
//!
//! A receipt is one unit of work. Every line's product is resolved before
//! any quantity changes; the deltas are applied through the catalog's
//! all-or-nothing batch; and if the store rejects the records afterwards,
//! the applied deltas are reversed before the error surfaces. Validation,
//! not-found, and conflict errors are all raised before the first mutation.
//!
//! # Concurrency
//!
//! Identity and catalog lookups happen outside any critical section. The
//! per-product serialization lives in the catalog accessor, so movements
//! against different products proceed in parallel while movements against
//! the same product serialize.

use crate::base::{MovementId, ProductId};
use crate::catalog::Catalog;
use crate::directory::IdentityDirectory;
use crate::error::LedgerError;
use crate::movement::{
    MovementDraft, MovementKind, MovementRecord, ReceiptOutcome, ReceiptRequest,
    WithdrawalOutcome, WithdrawalRequest,
};
use crate::store::MovementStore;
use crate::validator::{validate_receipt, validate_withdrawal};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Inventory movement ledger.
///
/// # Invariants
///
/// - A product's quantity always equals the net of its applied deltas.
/// - Quantities never go negative.
/// - No receipt is ever partially applied: all lines and the store append
///   succeed together or leave no trace.
pub struct Ledger {
    catalog: Arc<Catalog>,
    directory: Arc<dyn IdentityDirectory>,
    store: Arc<dyn MovementStore>,
}

impl Ledger {
    pub fn new(
        catalog: Arc<Catalog>,
        directory: Arc<dyn IdentityDirectory>,
        store: Arc<dyn MovementStore>,
    ) -> Self {
        Self {
            catalog,
            directory,
            store,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Records a delivery of one or more materials from a supplier.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Validation`] - a field rule is violated; the first
    ///   violation is carried, the full list is logged.
    /// - [`LedgerError::SupplierNotFound`] / [`LedgerError::AuthorNotFound`] -
    ///   an identity reference does not resolve.
    /// - [`LedgerError::ProductNotRegistered`] - any line names an unknown
    ///   material; the whole receipt is rejected.
    /// - [`LedgerError::QuantityOverflow`] - a delta would overflow.
    /// - [`LedgerError::StoreUnavailable`] - the store failed; all applied
    ///   deltas were reversed and the request is safe to retry.
    pub fn record_receipt(&self, request: ReceiptRequest) -> Result<ReceiptOutcome, LedgerError> {
        let violations = validate_receipt(&request);
        if let Some(first) = violations.first() {
            debug!(?violations, "receipt rejected by validation");
            return Err(LedgerError::Validation(*first));
        }

        if !self.directory.supplier_exists(request.supplier_id) {
            debug!(supplier = %request.supplier_id, "receipt references unknown supplier");
            return Err(LedgerError::SupplierNotFound);
        }
        if !self.directory.user_exists(request.author) {
            debug!(author = %request.author, "receipt references unknown author");
            return Err(LedgerError::AuthorNotFound);
        }

        // Resolve every line before touching any quantity; a single unknown
        // material rejects the whole receipt with nothing applied.
        let mut deltas: Vec<(ProductId, i64)> = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            let product = self
                .catalog
                .find_by_name(&line.material_name)
                .ok_or(LedgerError::ProductNotRegistered)?;
            let delta =
                i64::try_from(line.quantity).map_err(|_| LedgerError::QuantityOverflow)?;
            deltas.push((product.id(), delta));
        }

        self.catalog.apply_batch(&deltas)?;

        let date = Utc::now();
        let drafts: Vec<MovementDraft> = deltas
            .iter()
            .zip(&request.lines)
            .map(|((product_id, delta), line)| MovementDraft {
                date,
                product_id: *product_id,
                delta: *delta,
                kind: MovementKind::Receipt,
                author: request.author,
                supplier_id: Some(request.supplier_id),
                total_value: Some(line.total_value),
            })
            .collect();

        match self.store.append_batch(drafts) {
            Ok(batch) => {
                info!(
                    batch = %batch.batch_id,
                    supplier = %request.supplier_id,
                    lines = batch.records.len(),
                    "receipt recorded"
                );
                Ok(ReceiptOutcome {
                    batch_id: batch.batch_id,
                    movement_ids: batch.records.iter().map(|record| record.id).collect(),
                })
            }
            Err(err) => {
                self.reverse(&deltas);
                error!(error = %err, "store rejected receipt batch; deltas reversed");
                Err(err)
            }
        }
    }

    /// Records an issuance of one material.
    ///
    /// The sufficiency check and the decrement are evaluated against the
    /// same quantity value, under the product's lock.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Validation`] - a field rule is violated.
    /// - [`LedgerError::AuthorNotFound`] - the author does not resolve.
    /// - [`LedgerError::MaterialNotFound`] - no product with that name.
    /// - [`LedgerError::ProductNotFound`] - the product was removed between
    ///   resolution and application.
    /// - [`LedgerError::InsufficientStock`] - on-hand quantity is short;
    ///   nothing is mutated.
    /// - [`LedgerError::StoreUnavailable`] - the store failed; the decrement
    ///   was reversed and the request is safe to retry.
    pub fn record_withdrawal(
        &self,
        request: WithdrawalRequest,
    ) -> Result<WithdrawalOutcome, LedgerError> {
        let violations = validate_withdrawal(&request);
        if let Some(first) = violations.first() {
            debug!(?violations, "withdrawal rejected by validation");
            return Err(LedgerError::Validation(*first));
        }

        if !self.directory.user_exists(request.author) {
            debug!(author = %request.author, "withdrawal references unknown author");
            return Err(LedgerError::AuthorNotFound);
        }

        let product = self
            .catalog
            .find_by_name(&request.material_name)
            .ok_or(LedgerError::MaterialNotFound)?;
        let delta = -i64::try_from(request.quantity).map_err(|_| LedgerError::QuantityOverflow)?;

        self.catalog.apply_delta(product.id(), delta)?;

        let draft = MovementDraft {
            date: Utc::now(),
            product_id: product.id(),
            delta,
            kind: MovementKind::Withdrawal,
            author: request.author,
            supplier_id: None,
            total_value: None,
        };

        match self.store.append_batch(vec![draft]) {
            Ok(batch) => {
                info!(
                    movement = %batch.records[0].id,
                    material = %request.material_name,
                    quantity = request.quantity,
                    "withdrawal recorded"
                );
                Ok(WithdrawalOutcome {
                    movement_id: batch.records[0].id,
                })
            }
            Err(err) => {
                self.reverse(&[(product.id(), delta)]);
                error!(error = %err, "store rejected withdrawal; delta reversed");
                Err(err)
            }
        }
    }

    /// All recorded movements, in append order.
    pub fn movements(&self) -> Vec<Arc<MovementRecord>> {
        self.store.list()
    }

    /// One movement record by id.
    pub fn movement(&self, id: MovementId) -> Result<Arc<MovementRecord>, LedgerError> {
        self.store.get(id).ok_or(LedgerError::MovementNotFound)
    }

    /// Compensating reversal of already-applied deltas after a store
    /// failure, run under the same per-product serialization as the
    /// original application.
    fn reverse(&self, deltas: &[(ProductId, i64)]) {
        let reversal: Vec<(ProductId, i64)> =
            deltas.iter().map(|(id, delta)| (*id, -delta)).collect();
        if let Err(err) = self.catalog.apply_batch(&reversal) {
            // A concurrent withdrawal may have consumed part of the stock a
            // failed receipt had briefly added; the discrepancy is surfaced
            // rather than forcing a quantity negative.
            error!(error = %err, "compensating reversal failed; quantities may diverge from the movement log");
        }
    }
}
