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

//! Product catalog and the quantity accessor used by the ledger engine.
//!
//! The catalog owns every [`Product`] and the case-insensitive name index.
//! Quantity changes go through [`Catalog::apply_delta`] (one product) or
//! [`Catalog::apply_batch`] (all lines of a receipt, all-or-nothing); both
//! run the read-stage-commit under the product mutex, so concurrent deltas
//! against the same product serialize while different products proceed in
//! parallel.

use crate::base::ProductId;
use crate::error::LedgerError;
use crate::product::{Product, ProductData};
use crate::validator::Violation;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::MutexGuard;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// The collection of products and their current quantities.
#[derive(Debug)]
pub struct Catalog {
    /// Products indexed by id.
    products: DashMap<ProductId, Arc<Product>>,
    /// Lowercased name to id, for case-insensitive resolution.
    names: DashMap<String, ProductId>,
    next_id: AtomicU32,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            products: DashMap::new(),
            names: DashMap::new(),
            next_id: AtomicU32::new(1),
        }
    }

    /// Registers a new product with zero quantity.
    ///
    /// Stock for a new product arrives through its first receipt, never at
    /// registration time.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Validation`] for a blank name.
    /// - [`LedgerError::DuplicateProduct`] if a product with the same name
    ///   (case-insensitive) already exists.
    pub fn register(&self, name: &str) -> Result<ProductId, LedgerError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(LedgerError::Validation(Violation {
                field: "name",
                line: None,
                message: "product name is required",
            }));
        }

        // Entry API keeps check-and-insert atomic under concurrent registration.
        match self.names.entry(trimmed.to_lowercase()) {
            Entry::Occupied(_) => Err(LedgerError::DuplicateProduct),
            Entry::Vacant(entry) => {
                let id = ProductId(self.next_id.fetch_add(1, Ordering::Relaxed));
                let product = Arc::new(Product::new(id, trimmed));
                self.products.insert(id, product);
                entry.insert(id);
                Ok(id)
            }
        }
    }

    /// Removes a product from the catalog.
    ///
    /// Only permitted once the quantity is zero; removal never erases
    /// movement history.
    pub fn remove(&self, id: ProductId) -> Result<(), LedgerError> {
        let product = self.get(id).ok_or(LedgerError::ProductNotFound)?;

        let name_key = {
            let mut data = product.lock();
            if data.quantity() != 0 {
                return Err(LedgerError::ProductNotEmpty);
            }
            // Retire under the lock so an in-flight movement that already
            // resolved this product observes the removal before applying.
            data.retire();
            data.name().to_lowercase()
        };

        self.products.remove(&id);
        self.names.remove(&name_key);
        Ok(())
    }

    pub fn get(&self, id: ProductId) -> Option<Arc<Product>> {
        self.products.get(&id).map(|p| Arc::clone(p.value()))
    }

    /// Resolves a product by name, case-insensitively.
    pub fn find_by_name(&self, name: &str) -> Option<Arc<Product>> {
        let id = *self.names.get(name.trim().to_lowercase().as_str())?;
        self.get(id)
    }

    /// Current on-hand quantity of a product.
    pub fn current_quantity(&self, id: ProductId) -> Result<u64, LedgerError> {
        Ok(self.get(id).ok_or(LedgerError::ProductNotFound)?.quantity())
    }

    /// Applies one signed delta to one product, returning the new quantity.
    ///
    /// The sufficiency check and the write happen under the same lock
    /// acquisition, against the same quantity value.
    pub fn apply_delta(&self, id: ProductId, delta: i64) -> Result<u64, LedgerError> {
        let product = self.get(id).ok_or(LedgerError::ProductNotFound)?;
        let mut data = product.lock();
        if data.retired() {
            return Err(LedgerError::ProductNotFound);
        }
        data.apply(delta)
    }

    /// Applies every delta of a receipt as one atomic unit.
    ///
    /// Locks the distinct products in ascending id order (a single global
    /// lock order, so concurrent batches cannot deadlock), stages every new
    /// quantity with checked arithmetic, and commits only if all stages
    /// succeed. A failure on any delta leaves every product untouched.
    /// Repeated deltas for one product fold into the staged value, never a
    /// stale read.
    ///
    /// Returns the post-delta quantity for each input delta, in input order.
    pub fn apply_batch(&self, deltas: &[(ProductId, i64)]) -> Result<Vec<u64>, LedgerError> {
        let mut ids: Vec<ProductId> = deltas.iter().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        ids.dedup();

        let mut products = Vec::with_capacity(ids.len());
        for id in &ids {
            products.push(self.get(*id).ok_or(LedgerError::ProductNotFound)?);
        }

        let mut guards: Vec<MutexGuard<'_, ProductData>> =
            products.iter().map(|product| product.lock()).collect();
        if guards.iter().any(|data| data.retired()) {
            return Err(LedgerError::ProductNotFound);
        }

        // Stage first: no product is written until every delta checks out.
        let mut staged: Vec<u64> = guards.iter().map(|data| data.quantity()).collect();
        let mut applied = Vec::with_capacity(deltas.len());
        for (id, delta) in deltas {
            let slot = ids.binary_search(id).expect("id collected above");
            staged[slot] = ProductData::stage(staged[slot], *delta)?;
            applied.push(staged[slot]);
        }

        for (data, quantity) in guards.iter_mut().zip(&staged) {
            data.commit(*quantity);
        }

        Ok(applied)
    }

    /// Products with nothing on hand, for restocking reports.
    pub fn out_of_stock(&self) -> Vec<Arc<Product>> {
        self.products
            .iter()
            .filter(|entry| entry.value().quantity() == 0)
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Returns an iterator over all products.
    pub fn products(
        &self,
    ) -> impl Iterator<Item = dashmap::mapref::multiple::RefMulti<'_, ProductId, Arc<Product>>>
    {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
