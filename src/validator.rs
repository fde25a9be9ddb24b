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

//! Structural validation of movement requests.
//!
//! Validation runs before any engine work: it is a pure function of the
//! request and collects every violated rule. The engine surfaces the first
//! violation to the caller and logs the full list.

use crate::movement::{ReceiptRequest, WithdrawalRequest};
use rust_decimal::Decimal;
use std::fmt;

/// A single violated field rule.
///
/// `line` is set for violations inside a receipt line and names the
/// zero-based line index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub line: Option<usize>,
    pub message: &'static str,
}

impl Violation {
    fn new(field: &'static str, message: &'static str) -> Self {
        Self {
            field,
            line: None,
            message,
        }
    }

    fn in_line(field: &'static str, line: usize, message: &'static str) -> Self {
        Self {
            field,
            line: Some(line),
            message,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.message),
            None => f.write_str(self.message),
        }
    }
}

/// Checks a receipt request against the field rules.
///
/// Rules: at least one line; every line has a non-blank material name, a
/// quantity greater than zero, and a total value greater than zero.
/// Returns every violation found, in field order.
pub fn validate_receipt(request: &ReceiptRequest) -> Vec<Violation> {
    let mut violations = Vec::new();

    if request.lines.is_empty() {
        violations.push(Violation::new("lines", "receipt must contain at least one line"));
    }

    for (index, line) in request.lines.iter().enumerate() {
        if line.material_name.trim().is_empty() {
            violations.push(Violation::in_line(
                "materialName",
                index,
                "material name is required",
            ));
        }
        if line.quantity == 0 {
            violations.push(Violation::in_line(
                "quantity",
                index,
                "quantity must be greater than zero",
            ));
        }
        if line.total_value <= Decimal::ZERO {
            violations.push(Violation::in_line(
                "totalValue",
                index,
                "total value must be greater than zero",
            ));
        }
    }

    violations
}

/// Checks a withdrawal request against the field rules.
///
/// Rules: non-blank material name and a quantity greater than zero.
pub fn validate_withdrawal(request: &WithdrawalRequest) -> Vec<Violation> {
    let mut violations = Vec::new();

    if request.material_name.trim().is_empty() {
        violations.push(Violation::new("materialName", "material name is required"));
    }
    if request.quantity == 0 {
        violations.push(Violation::new("quantity", "quantity must be greater than zero"));
    }

    violations
}
