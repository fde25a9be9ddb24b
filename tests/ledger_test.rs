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

//! Ledger engine public API integration tests.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use stock_ledger_rs::{
    AppendedBatch, Catalog, InMemoryDirectory, InMemoryStore, Ledger, LedgerError, MovementDraft,
    MovementId, MovementKind, MovementRecord, MovementStore, ReceiptLine, ReceiptRequest,
    SupplierId, UserId, WithdrawalRequest,
};

const SUPPLIER: SupplierId = SupplierId(1);
const AUTHOR: UserId = UserId(1);

struct TestLedger {
    catalog: Arc<Catalog>,
    store: Arc<InMemoryStore>,
    ledger: Ledger,
}

fn setup() -> TestLedger {
    let catalog = Arc::new(Catalog::new());
    let directory = Arc::new(InMemoryDirectory::new());
    directory.add_supplier(SUPPLIER);
    directory.add_user(AUTHOR);
    let store = Arc::new(InMemoryStore::new());
    let ledger = Ledger::new(
        Arc::clone(&catalog),
        directory,
        Arc::clone(&store) as Arc<dyn MovementStore>,
    );
    TestLedger {
        catalog,
        store,
        ledger,
    }
}

fn make_receipt(lines: &[(&str, u64, Decimal)]) -> ReceiptRequest {
    ReceiptRequest {
        supplier_id: SUPPLIER,
        author: AUTHOR,
        lines: lines
            .iter()
            .map(|(name, quantity, total_value)| ReceiptLine {
                material_name: name.to_string(),
                quantity: *quantity,
                total_value: *total_value,
            })
            .collect(),
    }
}

fn make_withdrawal(name: &str, quantity: u64) -> WithdrawalRequest {
    WithdrawalRequest {
        material_name: name.to_string(),
        quantity,
        author: AUTHOR,
    }
}

/// Seeds a product with stock through a real receipt, so the invariant
/// "quantity equals net of recorded movements" holds from the start.
fn seed(test: &TestLedger, name: &str, quantity: u64) {
    test.catalog.register(name).unwrap();
    if quantity > 0 {
        test.ledger
            .record_receipt(make_receipt(&[(name, quantity, dec!(1.00))]))
            .unwrap();
    }
}

// === Receipts ===

/// Scenario: product "Bolt" exists with quantity 10; a five-unit delivery
/// arrives; quantity becomes 15 and one movement record references the
/// supplier and author.
#[test]
fn successful_receipt() {
    let test = setup();
    seed(&test, "Bolt", 10);
    let before = test.store.len();

    let outcome = test
        .ledger
        .record_receipt(make_receipt(&[("Bolt", 5, dec!(50.00))]))
        .unwrap();

    assert_eq!(outcome.movement_ids.len(), 1);
    let bolt = test.catalog.find_by_name("Bolt").unwrap();
    assert_eq!(bolt.quantity(), 15);

    assert_eq!(test.store.len(), before + 1);
    let record = test.ledger.movement(outcome.movement_ids[0]).unwrap();
    assert_eq!(record.kind, MovementKind::Receipt);
    assert_eq!(record.delta, 5);
    assert_eq!(record.supplier_id, Some(SUPPLIER));
    assert_eq!(record.author, AUTHOR);
    assert_eq!(record.total_value, Some(dec!(50.00)));
    assert_eq!(record.batch_id, outcome.batch_id);
}

#[test]
fn multi_line_receipt_updates_every_product() {
    let test = setup();
    seed(&test, "Bolt", 0);
    seed(&test, "Nut", 0);

    let outcome = test
        .ledger
        .record_receipt(make_receipt(&[
            ("Bolt", 5, dec!(50.00)),
            ("Nut", 20, dec!(10.00)),
        ]))
        .unwrap();

    assert_eq!(outcome.movement_ids.len(), 2);
    assert_eq!(test.catalog.find_by_name("Bolt").unwrap().quantity(), 5);
    assert_eq!(test.catalog.find_by_name("Nut").unwrap().quantity(), 20);

    // Both records share the receipt's batch id.
    let records = test.ledger.movements();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.batch_id == outcome.batch_id));
}

/// A receipt with two lines for the same material composes: final quantity
/// reflects both deltas and two movement records exist, not one.
#[test]
fn repeated_line_composition() {
    let test = setup();
    seed(&test, "Bolt", 10);
    let movements_before = test.store.len();

    test.ledger
        .record_receipt(make_receipt(&[
            ("Bolt", 5, dec!(50.00)),
            ("Bolt", 3, dec!(30.00)),
        ]))
        .unwrap();

    assert_eq!(test.catalog.find_by_name("Bolt").unwrap().quantity(), 18);
    assert_eq!(test.store.len(), movements_before + 2);
}

/// Scenario: "Bolt" exists, "Washer" does not. The whole receipt is
/// rejected: "Bolt" unchanged, zero movement records created.
#[test]
fn unregistered_material_blocks_whole_receipt() {
    let test = setup();
    seed(&test, "Bolt", 10);
    let movements_before = test.store.len();

    let result = test.ledger.record_receipt(make_receipt(&[
        ("Bolt", 5, dec!(50.00)),
        ("Washer", 2, dec!(20.00)),
    ]));

    assert_eq!(result, Err(LedgerError::ProductNotRegistered));
    assert_eq!(test.catalog.find_by_name("Bolt").unwrap().quantity(), 10);
    assert_eq!(test.store.len(), movements_before);
}

/// The position of the failing line makes no difference.
#[test]
fn unregistered_material_in_first_line_blocks_receipt() {
    let test = setup();
    seed(&test, "Bolt", 10);
    let movements_before = test.store.len();

    let result = test.ledger.record_receipt(make_receipt(&[
        ("Washer", 2, dec!(20.00)),
        ("Bolt", 5, dec!(50.00)),
    ]));

    assert_eq!(result, Err(LedgerError::ProductNotRegistered));
    assert_eq!(test.catalog.find_by_name("Bolt").unwrap().quantity(), 10);
    assert_eq!(test.store.len(), movements_before);
}

#[test]
fn unknown_supplier_rejected() {
    let test = setup();
    seed(&test, "Bolt", 10);

    let mut request = make_receipt(&[("Bolt", 5, dec!(50.00))]);
    request.supplier_id = SupplierId(99);

    assert_eq!(
        test.ledger.record_receipt(request),
        Err(LedgerError::SupplierNotFound)
    );
    assert_eq!(test.catalog.find_by_name("Bolt").unwrap().quantity(), 10);
}

#[test]
fn unknown_author_rejected() {
    let test = setup();
    seed(&test, "Bolt", 10);

    let mut request = make_receipt(&[("Bolt", 5, dec!(50.00))]);
    request.author = UserId(99);

    assert_eq!(
        test.ledger.record_receipt(request),
        Err(LedgerError::AuthorNotFound)
    );
    assert_eq!(test.catalog.find_by_name("Bolt").unwrap().quantity(), 10);
}

#[test]
fn empty_receipt_rejected() {
    let test = setup();

    let result = test.ledger.record_receipt(make_receipt(&[]));
    assert!(matches!(result, Err(LedgerError::Validation(_))));
    assert!(test.store.is_empty());
}

/// Submitting the same invalid receipt twice produces the same validation
/// error both times and mutates nothing either time.
#[test]
fn rejection_is_idempotent() {
    let test = setup();
    seed(&test, "Bolt", 10);
    let movements_before = test.store.len();

    let request = make_receipt(&[("Bolt", 0, dec!(50.00))]);
    let first = test.ledger.record_receipt(request.clone());
    let second = test.ledger.record_receipt(request);

    assert!(matches!(first, Err(LedgerError::Validation(_))));
    assert_eq!(first, second);
    assert_eq!(test.catalog.find_by_name("Bolt").unwrap().quantity(), 10);
    assert_eq!(test.store.len(), movements_before);
}

#[test]
fn material_names_resolve_case_insensitively() {
    let test = setup();
    seed(&test, "Bolt", 10);

    test.ledger
        .record_receipt(make_receipt(&[("bOLT", 5, dec!(50.00))]))
        .unwrap();
    assert_eq!(test.catalog.find_by_name("BOLT").unwrap().quantity(), 15);

    test.ledger.record_withdrawal(make_withdrawal("bolt", 3)).unwrap();
    assert_eq!(test.catalog.find_by_name("Bolt").unwrap().quantity(), 12);
}

// === Withdrawals ===

#[test]
fn withdrawal_after_receipt() {
    let test = setup();
    seed(&test, "Bolt", 10);

    let outcome = test.ledger.record_withdrawal(make_withdrawal("Bolt", 4)).unwrap();

    assert_eq!(test.catalog.find_by_name("Bolt").unwrap().quantity(), 6);
    let record = test.ledger.movement(outcome.movement_id).unwrap();
    assert_eq!(record.kind, MovementKind::Withdrawal);
    assert_eq!(record.delta, -4);
    assert_eq!(record.supplier_id, None);
    assert_eq!(record.total_value, None);
}

/// Scenario: product "Nut" has quantity 2; withdrawing 5 is rejected with
/// insufficient stock, quantity remains 2, no movement recorded.
#[test]
fn withdrawal_insufficient_stock() {
    let test = setup();
    seed(&test, "Nut", 2);
    let movements_before = test.store.len();

    let result = test.ledger.record_withdrawal(make_withdrawal("Nut", 5));

    assert_eq!(result, Err(LedgerError::InsufficientStock));
    assert_eq!(test.catalog.find_by_name("Nut").unwrap().quantity(), 2);
    assert_eq!(test.store.len(), movements_before);
}

#[test]
fn withdrawal_of_exact_balance_empties_product() {
    let test = setup();
    seed(&test, "Nut", 7);

    test.ledger.record_withdrawal(make_withdrawal("Nut", 7)).unwrap();
    assert_eq!(test.catalog.find_by_name("Nut").unwrap().quantity(), 0);
}

#[test]
fn withdrawal_of_unknown_material_rejected() {
    let test = setup();

    assert_eq!(
        test.ledger.record_withdrawal(make_withdrawal("Washer", 1)),
        Err(LedgerError::MaterialNotFound)
    );
    assert!(test.store.is_empty());
}

#[test]
fn withdrawal_with_unknown_author_rejected() {
    let test = setup();
    seed(&test, "Bolt", 10);

    let mut request = make_withdrawal("Bolt", 1);
    request.author = UserId(99);

    assert_eq!(
        test.ledger.record_withdrawal(request),
        Err(LedgerError::AuthorNotFound)
    );
    assert_eq!(test.catalog.find_by_name("Bolt").unwrap().quantity(), 10);
}

#[test]
fn invalid_withdrawal_rejected_before_resolution() {
    let test = setup();

    // Zero quantity fails validation even though the material is unknown;
    // validation runs first.
    let result = test.ledger.record_withdrawal(make_withdrawal("Washer", 0));
    assert!(matches!(result, Err(LedgerError::Validation(_))));
}

// === Movement listing ===

#[test]
fn movements_listed_in_append_order() {
    let test = setup();
    seed(&test, "Bolt", 10);
    seed(&test, "Nut", 5);

    test.ledger.record_withdrawal(make_withdrawal("Bolt", 1)).unwrap();
    test.ledger
        .record_receipt(make_receipt(&[("Nut", 3, dec!(9.00))]))
        .unwrap();

    let movements = test.ledger.movements();
    assert_eq!(movements.len(), 4);
    let ids: Vec<MovementId> = movements.iter().map(|record| record.id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
}

#[test]
fn unknown_movement_id_is_not_found() {
    let test = setup();
    assert_eq!(
        test.ledger.movement(MovementId(42)),
        Err(LedgerError::MovementNotFound)
    );
}

/// For every product, quantity equals the net of recorded deltas.
#[test]
fn quantity_matches_net_of_recorded_movements() {
    let test = setup();
    seed(&test, "Bolt", 0);
    seed(&test, "Nut", 0);

    test.ledger
        .record_receipt(make_receipt(&[
            ("Bolt", 10, dec!(100.00)),
            ("Nut", 4, dec!(2.00)),
            ("Bolt", 2, dec!(20.00)),
        ]))
        .unwrap();
    test.ledger.record_withdrawal(make_withdrawal("Bolt", 5)).unwrap();
    let _ = test.ledger.record_withdrawal(make_withdrawal("Nut", 9));

    for entry in test.catalog.products() {
        let product = entry.value();
        let net: i64 = test
            .ledger
            .movements()
            .iter()
            .filter(|record| record.product_id == product.id())
            .map(|record| record.delta)
            .sum();
        assert_eq!(product.quantity() as i64, net);
    }
}

// === Store failure rollback ===

/// Store double that fails on demand, leaving its inner log untouched.
struct FailingStore {
    inner: InMemoryStore,
    fail: AtomicBool,
}

impl FailingStore {
    fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            fail: AtomicBool::new(false),
        }
    }

    fn fail_next(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl MovementStore for FailingStore {
    fn append_batch(&self, drafts: Vec<MovementDraft>) -> Result<AppendedBatch, LedgerError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(LedgerError::StoreUnavailable("injected fault".to_string()));
        }
        self.inner.append_batch(drafts)
    }

    fn list(&self) -> Vec<Arc<MovementRecord>> {
        self.inner.list()
    }

    fn get(&self, id: MovementId) -> Option<Arc<MovementRecord>> {
        self.inner.get(id)
    }
}

fn setup_failing() -> (Arc<Catalog>, Arc<FailingStore>, Ledger) {
    let catalog = Arc::new(Catalog::new());
    let directory = Arc::new(InMemoryDirectory::new());
    directory.add_supplier(SUPPLIER);
    directory.add_user(AUTHOR);
    let store = Arc::new(FailingStore::new());
    let ledger = Ledger::new(
        Arc::clone(&catalog),
        directory,
        Arc::clone(&store) as Arc<dyn MovementStore>,
    );
    (catalog, store, ledger)
}

/// A store failure during a receipt reverses every applied delta: the
/// error is transient, the quantities are unchanged, nothing is logged.
#[test]
fn store_failure_rolls_back_receipt() {
    let (catalog, store, ledger) = setup_failing();
    catalog.register("Bolt").unwrap();
    catalog.register("Nut").unwrap();
    ledger
        .record_receipt(make_receipt(&[("Bolt", 10, dec!(1.00))]))
        .unwrap();

    store.fail_next(true);
    let result = ledger.record_receipt(make_receipt(&[
        ("Bolt", 5, dec!(50.00)),
        ("Nut", 20, dec!(10.00)),
    ]));

    assert!(matches!(result, Err(LedgerError::StoreUnavailable(_))));
    assert_eq!(catalog.find_by_name("Bolt").unwrap().quantity(), 10);
    assert_eq!(catalog.find_by_name("Nut").unwrap().quantity(), 0);
    assert_eq!(store.list().len(), 1);

    // The same request succeeds once the store recovers.
    store.fail_next(false);
    ledger
        .record_receipt(make_receipt(&[
            ("Bolt", 5, dec!(50.00)),
            ("Nut", 20, dec!(10.00)),
        ]))
        .unwrap();
    assert_eq!(catalog.find_by_name("Bolt").unwrap().quantity(), 15);
    assert_eq!(catalog.find_by_name("Nut").unwrap().quantity(), 20);
}

#[test]
fn store_failure_rolls_back_withdrawal() {
    let (catalog, store, ledger) = setup_failing();
    catalog.register("Bolt").unwrap();
    ledger
        .record_receipt(make_receipt(&[("Bolt", 10, dec!(1.00))]))
        .unwrap();

    store.fail_next(true);
    let result = ledger.record_withdrawal(make_withdrawal("Bolt", 4));

    assert!(matches!(result, Err(LedgerError::StoreUnavailable(_))));
    assert_eq!(catalog.find_by_name("Bolt").unwrap().quantity(), 10);
    assert_eq!(store.list().len(), 1);
}
