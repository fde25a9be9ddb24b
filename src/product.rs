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

//! Product state and per-product quantity arithmetic.
//!
//! Each product guards its on-hand quantity with a mutex; the
//! read-stage-commit of a delta is the per-product critical section that
//! serializes concurrent movements against the same material.
//!
//! # Example
//!
//! ```
//! use stock_ledger_rs::{Product, ProductId};
//!
//! let product = Product::new(ProductId(1), "Bolt");
//! assert_eq!(product.quantity(), 0);
//! ```

use crate::base::ProductId;
use crate::error::LedgerError;
use parking_lot::{Mutex, MutexGuard};
use serde::ser::{Serialize, SerializeStruct, Serializer};

#[derive(Debug)]
pub(crate) struct ProductData {
    id: ProductId,
    name: String,
    quantity: u64,
    retired: bool,
}

impl ProductData {
    fn new(id: ProductId, name: String) -> Self {
        // Products enter the catalog empty; stock arrives through receipts.
        Self {
            id,
            name,
            quantity: 0,
            retired: false,
        }
    }

    pub(crate) fn quantity(&self) -> u64 {
        self.quantity
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// True once the product has been removed from the catalog. A movement
    /// that resolved the product before removal must not apply after it.
    pub(crate) fn retired(&self) -> bool {
        self.retired
    }

    pub(crate) fn retire(&mut self) {
        self.retired = true;
    }

    /// Computes the quantity that `delta` would produce on top of `current`,
    /// without writing anything.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InsufficientStock`] if the result would be negative.
    /// - [`LedgerError::QuantityOverflow`] if the result would not fit.
    pub(crate) fn stage(current: u64, delta: i64) -> Result<u64, LedgerError> {
        if delta >= 0 {
            current
                .checked_add(delta as u64)
                .ok_or(LedgerError::QuantityOverflow)
        } else {
            current
                .checked_sub(delta.unsigned_abs())
                .ok_or(LedgerError::InsufficientStock)
        }
    }

    /// Applies `delta` to the on-hand quantity, returning the new value.
    pub(crate) fn apply(&mut self, delta: i64) -> Result<u64, LedgerError> {
        let next = Self::stage(self.quantity, delta)?;
        self.quantity = next;
        Ok(next)
    }

    /// Overwrites the quantity with a value staged earlier under this lock.
    pub(crate) fn commit(&mut self, staged: u64) {
        self.quantity = staged;
    }
}

/// A catalog product: name plus current on-hand quantity.
#[derive(Debug)]
pub struct Product {
    inner: Mutex<ProductData>,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(ProductData::new(id, name.into())),
        }
    }

    pub fn id(&self) -> ProductId {
        self.inner.lock().id
    }

    /// The product name with its original casing.
    pub fn name(&self) -> String {
        self.inner.lock().name.clone()
    }

    pub fn quantity(&self) -> u64 {
        self.inner.lock().quantity
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ProductData> {
        self.inner.lock()
    }
}

impl Serialize for Product {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = self.inner.lock();
        let mut state = serializer.serialize_struct("Product", 3)?;
        state.serialize_field("id", &data.id)?;
        state.serialize_field("name", &data.name)?;
        state.serialize_field("quantity", &data.quantity)?;
        state.end()
    }
}
