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

//! Movement requests, persisted records, and engine outcomes.
//!
//! A *receipt* adds stock for one or more materials delivered by a single
//! supplier; a *withdrawal* removes stock for exactly one material. Each
//! applied receipt line and each applied withdrawal becomes one immutable
//! [`MovementRecord`] carrying the signed quantity delta.

use crate::base::{BatchId, MovementId, ProductId, SupplierId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One line of a receipt: a delivered material with its quantity and the
/// total value paid for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub material_name: String,
    pub quantity: u64,
    pub total_value: Decimal,
}

/// A delivery event from one supplier. Either all lines apply or none do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRequest {
    pub supplier_id: SupplierId,
    pub author: UserId,
    pub lines: Vec<ReceiptLine>,
}

/// An issuance event removing stock for one material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    pub material_name: String,
    pub quantity: u64,
    pub author: UserId,
}

/// Which side of the ledger a movement record sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementKind {
    Receipt,
    Withdrawal,
}

/// An applied movement awaiting store ids.
///
/// The store assigns the movement id and batch id at append time; everything
/// else is fixed by the engine when the deltas are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementDraft {
    pub date: DateTime<Utc>,
    pub product_id: ProductId,
    pub delta: i64,
    pub kind: MovementKind,
    pub author: UserId,
    pub supplier_id: Option<SupplierId>,
    pub total_value: Option<Decimal>,
}

/// The persisted, immutable record of one applied movement.
///
/// `delta` is positive for receipt lines and negative for withdrawals.
/// Records of one receipt share a `batch_id`; a withdrawal record is the
/// sole member of its own batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementRecord {
    pub id: MovementId,
    pub date: DateTime<Utc>,
    pub product_id: ProductId,
    pub delta: i64,
    pub kind: MovementKind,
    pub batch_id: BatchId,
    pub author: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<SupplierId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_value: Option<Decimal>,
}

impl MovementRecord {
    pub fn is_receipt(&self) -> bool {
        self.kind == MovementKind::Receipt
    }

    pub fn is_withdrawal(&self) -> bool {
        self.kind == MovementKind::Withdrawal
    }
}

/// Result of a successfully recorded receipt: one movement id per line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptOutcome {
    pub batch_id: BatchId,
    pub movement_ids: Vec<MovementId>,
}

/// Result of a successfully recorded withdrawal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalOutcome {
    pub movement_id: MovementId,
}
