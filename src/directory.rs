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

//! Identity directory seam.
//!
//! Suppliers and users live outside the ledger; the engine only asks
//! whether a referenced id exists. The trait is injected at construction so
//! tests can substitute doubles and no module-global state is shared across
//! requests.

use crate::base::{SupplierId, UserId};
use dashmap::DashSet;

/// Read-only existence checks against the external identity records.
pub trait IdentityDirectory: Send + Sync {
    fn supplier_exists(&self, id: SupplierId) -> bool;
    fn user_exists(&self, id: UserId) -> bool;
}

/// Directory backed by in-process sets, for the CLI, the demo server, and
/// tests.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    suppliers: DashSet<SupplierId>,
    users: DashSet<UserId>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_supplier(&self, id: SupplierId) {
        self.suppliers.insert(id);
    }

    pub fn add_user(&self, id: UserId) {
        self.users.insert(id);
    }
}

impl IdentityDirectory for InMemoryDirectory {
    fn supplier_exists(&self, id: SupplierId) -> bool {
        self.suppliers.contains(&id)
    }

    fn user_exists(&self, id: UserId) -> bool {
        self.users.contains(&id)
    }
}
