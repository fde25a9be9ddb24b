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

//! Append-only store of applied movement records.
//!
//! Records are never mutated or deleted once appended. Administrative
//! correction of history happens through explicit compensating movements
//! issued by the caller, never by rewriting records.

use crate::base::{BatchId, MovementId};
use crate::error::LedgerError;
use crate::movement::{MovementDraft, MovementRecord};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A batch of records the store accepted as one unit.
#[derive(Debug, Clone)]
pub struct AppendedBatch {
    pub batch_id: BatchId,
    pub records: Vec<Arc<MovementRecord>>,
}

/// Durable log of applied receipts and withdrawals.
///
/// `append_batch` must persist every draft or none of them; the engine
/// relies on that to keep receipts atomic. Assigned movement ids are
/// strictly increasing, so id order is append order.
pub trait MovementStore: Send + Sync {
    /// Appends all drafts under one fresh batch id.
    ///
    /// # Errors
    ///
    /// [`LedgerError::StoreUnavailable`] if persistence fails; the store
    /// must leave no partial batch behind.
    fn append_batch(&self, drafts: Vec<MovementDraft>) -> Result<AppendedBatch, LedgerError>;

    /// All records in append order.
    fn list(&self) -> Vec<Arc<MovementRecord>>;

    /// One record by id.
    fn get(&self, id: MovementId) -> Option<Arc<MovementRecord>>;
}

/// Store backed by a concurrent in-process map.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    movements: DashMap<MovementId, Arc<MovementRecord>>,
    next_movement: AtomicU64,
    next_batch: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            movements: DashMap::new(),
            next_movement: AtomicU64::new(1),
            next_batch: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.movements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }
}

impl MovementStore for InMemoryStore {
    fn append_batch(&self, drafts: Vec<MovementDraft>) -> Result<AppendedBatch, LedgerError> {
        let batch_id = BatchId(self.next_batch.fetch_add(1, Ordering::Relaxed));

        let mut records = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let id = MovementId(self.next_movement.fetch_add(1, Ordering::Relaxed));
            let record = Arc::new(MovementRecord {
                id,
                date: draft.date,
                product_id: draft.product_id,
                delta: draft.delta,
                kind: draft.kind,
                batch_id,
                author: draft.author,
                supplier_id: draft.supplier_id,
                total_value: draft.total_value,
            });
            self.movements.insert(id, Arc::clone(&record));
            records.push(record);
        }

        Ok(AppendedBatch { batch_id, records })
    }

    fn list(&self) -> Vec<Arc<MovementRecord>> {
        let mut records: Vec<Arc<MovementRecord>> = self
            .movements
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        records.sort_unstable_by_key(|record| record.id);
        records
    }

    fn get(&self, id: MovementId) -> Option<Arc<MovementRecord>> {
        self.movements.get(&id).map(|record| Arc::clone(record.value()))
    }
}
