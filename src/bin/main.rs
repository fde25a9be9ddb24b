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

use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use stock_ledger_rs::{
    Catalog, IdentityDirectory, InMemoryDirectory, InMemoryStore, Ledger, ReceiptLine,
    ReceiptRequest, SupplierId,
    UserId, WithdrawalRequest,
};
use tracing_subscriber::EnvFilter;

/// Stock Ledger - Replay a movement CSV against an empty warehouse
///
/// Reads registrations, receipts, and withdrawals from a CSV file and
/// outputs final product quantities to stdout. Consecutive receipt rows
/// sharing a batch value form one all-or-nothing receipt.
#[derive(Parser, Debug)]
#[command(name = "stock-ledger-rs")]
#[command(about = "An inventory ledger that replays movement CSVs", long_about = None)]
struct Args {
    /// Path to CSV file with movements
    ///
    /// Expected format: op,batch,supplier,author,material,quantity,total_value
    /// Example: cargo run -- movements.csv > stock.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let ledger = match process_movements(BufReader::new(file)) {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("Error processing movements: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_products(&ledger, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `op, batch, supplier, author, material, quantity, total_value`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    op: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    batch: Option<u64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    supplier: Option<u32>,
    #[serde(deserialize_with = "csv::invalid_option")]
    author: Option<u32>,
    material: Option<String>,
    #[serde(deserialize_with = "csv::invalid_option")]
    quantity: Option<u64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    total_value: Option<Decimal>,
}

/// One parsed input row.
#[derive(Debug)]
enum Op {
    RegisterProduct {
        name: String,
    },
    RegisterSupplier {
        id: SupplierId,
    },
    RegisterUser {
        id: UserId,
    },
    ReceiptLine {
        batch: u64,
        supplier: SupplierId,
        author: UserId,
        line: ReceiptLine,
    },
    Withdrawal {
        request: WithdrawalRequest,
    },
}

impl CsvRecord {
    /// Converts a CSV record to an operation.
    ///
    /// Returns `None` for unknown ops or missing required fields.
    fn into_op(self) -> Option<Op> {
        match self.op.to_lowercase().as_str() {
            "product" => Some(Op::RegisterProduct {
                name: self.material?,
            }),
            "supplier" => Some(Op::RegisterSupplier {
                id: SupplierId(self.supplier?),
            }),
            "user" => Some(Op::RegisterUser {
                id: UserId(self.author?),
            }),
            "receipt" => Some(Op::ReceiptLine {
                batch: self.batch?,
                supplier: SupplierId(self.supplier?),
                author: UserId(self.author?),
                line: ReceiptLine {
                    material_name: self.material?,
                    quantity: self.quantity?,
                    total_value: self.total_value?,
                },
            }),
            "withdrawal" => Some(Op::Withdrawal {
                request: WithdrawalRequest {
                    material_name: self.material?,
                    quantity: self.quantity?,
                    author: UserId(self.author?),
                },
            }),
            _ => None,
        }
    }
}

/// Receipt lines buffered until the batch value changes.
struct PendingReceipt {
    batch: u64,
    request: ReceiptRequest,
}

/// Process movements from a CSV reader.
///
/// Streaming parse; malformed rows and rejected movements are skipped and
/// logged rather than stopping the replay. Receipt lines must be
/// contiguous: the pending receipt is submitted as soon as a row with a
/// different batch value (or a different op) arrives.
///
/// # CSV Format
///
/// Expected columns: `op, batch, supplier, author, material, quantity, total_value`
/// - `op`: product | supplier | user | receipt | withdrawal
/// - `batch`: groups receipt rows into one all-or-nothing receipt
/// - `supplier` / `author`: identity references (u32)
/// - `material`: product name, matched case-insensitively
/// - `quantity`: units moved
/// - `total_value`: money paid for a receipt line
///
/// # Example
///
/// ```csv
/// op,batch,supplier,author,material,quantity,total_value
/// product,,,,Bolt,,
/// supplier,,1,,,,
/// user,,,7,,,
/// receipt,1,1,7,Bolt,5,50.00
/// withdrawal,,,7,Bolt,2,
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
pub fn process_movements<R: Read>(reader: R) -> Result<Ledger, csv::Error> {
    let catalog = Arc::new(Catalog::new());
    let directory = Arc::new(InMemoryDirectory::new());
    let store = Arc::new(InMemoryStore::new());
    let ledger = Ledger::new(
        Arc::clone(&catalog),
        Arc::clone(&directory) as Arc<dyn IdentityDirectory>,
        store,
    );

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let mut pending: Option<PendingReceipt> = None;

    for result in rdr.deserialize::<CsvRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed row");
                continue;
            }
        };

        let Some(op) = record.into_op() else {
            tracing::warn!("skipping invalid movement record");
            continue;
        };

        match op {
            Op::ReceiptLine {
                batch,
                supplier,
                author,
                line,
            } => match pending.as_mut() {
                Some(p) if p.batch == batch => p.request.lines.push(line),
                _ => {
                    flush_pending(&ledger, pending.take());
                    pending = Some(PendingReceipt {
                        batch,
                        request: ReceiptRequest {
                            supplier_id: supplier,
                            author,
                            lines: vec![line],
                        },
                    });
                }
            },
            Op::RegisterProduct { name } => {
                flush_pending(&ledger, pending.take());
                if let Err(e) = catalog.register(&name) {
                    tracing::warn!(error = %e, "skipping product registration");
                }
            }
            Op::RegisterSupplier { id } => {
                flush_pending(&ledger, pending.take());
                directory.add_supplier(id);
            }
            Op::RegisterUser { id } => {
                flush_pending(&ledger, pending.take());
                directory.add_user(id);
            }
            Op::Withdrawal { request } => {
                flush_pending(&ledger, pending.take());
                if let Err(e) = ledger.record_withdrawal(request) {
                    tracing::warn!(error = %e, "skipping withdrawal");
                }
            }
        }
    }

    flush_pending(&ledger, pending.take());
    Ok(ledger)
}

fn flush_pending(ledger: &Ledger, pending: Option<PendingReceipt>) {
    if let Some(p) = pending {
        if let Err(e) = ledger.record_receipt(p.request) {
            tracing::warn!(batch = p.batch, error = %e, "skipping receipt");
        }
    }
}

/// Write final product quantities to a CSV writer.
///
/// # CSV Format
///
/// Columns: `id, name, quantity`, ordered by product id.
///
/// # Example
///
/// ```csv
/// id,name,quantity
/// 1,Bolt,3
/// 2,Nut,20
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_products<W: Write>(ledger: &Ledger, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    let mut products: Vec<_> = ledger
        .catalog()
        .products()
        .map(|entry| Arc::clone(entry.value()))
        .collect();
    products.sort_unstable_by_key(|product| product.id());

    for product in products {
        wtr.serialize(&*product)?;
    }

    wtr.flush()?;
    Ok(())
}
