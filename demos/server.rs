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

//! Simple REST API server example for the inventory ledger.
//!
//! Run with: `cargo run --example server`
//!
//! ## Endpoints
//!
//! - `POST /products` - Register a product (quantity starts at zero)
//! - `GET /products` - List all products with current quantities
//! - `GET /products/missing` - List products with nothing on hand
//! - `POST /suppliers` / `POST /users` - Register identity references
//! - `POST /receipts` - Record a delivery (all lines or none)
//! - `POST /withdrawals` - Record an issuance
//! - `GET /movements` - List all recorded movements
//! - `GET /movements/{id}` - Get a movement by id
//!
//! ## Example Usage
//!
//! ```bash
//! curl -X POST http://localhost:3000/products \
//!   -H "Content-Type: application/json" -d '{"name": "Bolt"}'
//!
//! curl -X POST http://localhost:3000/suppliers \
//!   -H "Content-Type: application/json" -d '{"id": 1}'
//!
//! curl -X POST http://localhost:3000/users \
//!   -H "Content-Type: application/json" -d '{"id": 7}'
//!
//! # Receipt with two lines
//! curl -X POST http://localhost:3000/receipts \
//!   -H "Content-Type: application/json" \
//!   -d '{"supplierId": 1, "author": 7, "lines": [{"materialName": "Bolt", "quantity": 5, "totalValue": "50.00"}]}'
//!
//! # Withdrawal
//! curl -X POST http://localhost:3000/withdrawals \
//!   -H "Content-Type: application/json" \
//!   -d '{"materialName": "Bolt", "quantity": 2, "author": 7}'
//!
//! curl http://localhost:3000/movements
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use stock_ledger_rs::{
    Catalog, ErrorKind, IdentityDirectory, InMemoryDirectory, InMemoryStore, Ledger, LedgerError,
    MovementId,
    MovementRecord, ReceiptOutcome, ReceiptRequest, SupplierId, UserId, WithdrawalOutcome,
    WithdrawalRequest,
};
use tokio::net::TcpListener;

// === Request/Response DTOs ===

/// Request body for registering a product.
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub name: String,
}

/// Request body for registering a supplier.
#[derive(Debug, Deserialize)]
pub struct SupplierRequest {
    pub id: u32,
}

/// Request body for registering a user.
#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub id: u32,
}

/// Response body for product information.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: u32,
    pub name: String,
    pub quantity: u64,
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the ledger and its collaborators.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub directory: Arc<InMemoryDirectory>,
    pub ledger: Arc<Ledger>,
}

impl AppState {
    fn new() -> Self {
        let catalog = Arc::new(Catalog::new());
        let directory = Arc::new(InMemoryDirectory::new());
        let store = Arc::new(InMemoryStore::new());
        let ledger = Arc::new(Ledger::new(
            Arc::clone(&catalog),
            Arc::clone(&directory) as Arc<dyn IdentityDirectory>,
            store,
        ));
        Self {
            catalog,
            directory,
            ledger,
        }
    }
}

// === Error Handling ===

/// Wrapper for converting `LedgerError` into HTTP responses.
pub struct AppError(LedgerError);

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
        };
        let code = match &self.0 {
            LedgerError::Validation(_) => "VALIDATION",
            LedgerError::SupplierNotFound => "SUPPLIER_NOT_FOUND",
            LedgerError::AuthorNotFound => "AUTHOR_NOT_FOUND",
            LedgerError::ProductNotRegistered => "PRODUCT_NOT_REGISTERED",
            LedgerError::MaterialNotFound => "MATERIAL_NOT_FOUND",
            LedgerError::ProductNotFound => "PRODUCT_NOT_FOUND",
            LedgerError::MovementNotFound => "MOVEMENT_NOT_FOUND",
            LedgerError::DuplicateProduct => "DUPLICATE_PRODUCT",
            LedgerError::ProductNotEmpty => "PRODUCT_NOT_EMPTY",
            LedgerError::InsufficientStock => "INSUFFICIENT_STOCK",
            LedgerError::QuantityOverflow => "QUANTITY_OVERFLOW",
            LedgerError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        };

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

/// POST /products - Register a product.
async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<ProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    let id = state.catalog.register(&request.name)?;
    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            id: id.0,
            name: request.name.trim().to_string(),
            quantity: 0,
        }),
    ))
}

/// GET /products - List all products.
async fn list_products(State(state): State<AppState>) -> Json<Vec<ProductResponse>> {
    let mut products: Vec<ProductResponse> = state
        .catalog
        .products()
        .map(|entry| {
            let product = entry.value();
            ProductResponse {
                id: product.id().0,
                name: product.name(),
                quantity: product.quantity(),
            }
        })
        .collect();
    products.sort_unstable_by_key(|product| product.id);

    Json(products)
}

/// GET /products/missing - Products with nothing on hand.
async fn missing_products(State(state): State<AppState>) -> Json<Vec<ProductResponse>> {
    let mut products: Vec<ProductResponse> = state
        .catalog
        .out_of_stock()
        .into_iter()
        .map(|product| ProductResponse {
            id: product.id().0,
            name: product.name(),
            quantity: 0,
        })
        .collect();
    products.sort_unstable_by_key(|product| product.id);

    Json(products)
}

/// POST /suppliers - Register a supplier reference.
async fn create_supplier(
    State(state): State<AppState>,
    Json(request): Json<SupplierRequest>,
) -> StatusCode {
    state.directory.add_supplier(SupplierId(request.id));
    StatusCode::CREATED
}

/// POST /users - Register a user reference.
async fn create_user(State(state): State<AppState>, Json(request): Json<UserRequest>) -> StatusCode {
    state.directory.add_user(UserId(request.id));
    StatusCode::CREATED
}

/// POST /receipts - Record a delivery.
async fn create_receipt(
    State(state): State<AppState>,
    Json(request): Json<ReceiptRequest>,
) -> Result<(StatusCode, Json<ReceiptOutcome>), AppError> {
    let outcome = state.ledger.record_receipt(request)?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// POST /withdrawals - Record an issuance.
async fn create_withdrawal(
    State(state): State<AppState>,
    Json(request): Json<WithdrawalRequest>,
) -> Result<(StatusCode, Json<WithdrawalOutcome>), AppError> {
    let outcome = state.ledger.record_withdrawal(request)?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /movements - List all movements.
async fn list_movements(State(state): State<AppState>) -> Json<Vec<MovementRecord>> {
    let movements = state
        .ledger
        .movements()
        .iter()
        .map(|record| (**record).clone())
        .collect();
    Json(movements)
}

/// GET /movements/{id} - Get a movement by id.
async fn get_movement(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<MovementRecord>, AppError> {
    let record = state.ledger.movement(MovementId(id))?;
    Ok(Json((*record).clone()))
}

// === Router ===

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/products", post(create_product).get(list_products))
        .route("/products/missing", get(missing_products))
        .route("/suppliers", post(create_supplier))
        .route("/users", post(create_user))
        .route("/receipts", post(create_receipt))
        .route("/withdrawals", post(create_withdrawal))
        .route("/movements", get(list_movements))
        .route("/movements/{id}", get(get_movement))
        .with_state(state)
}

// === Main ===

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let state = AppState::new();
    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
    println!("Stock ledger API server running on http://127.0.0.1:3000");
    println!();
    println!("Endpoints:");
    println!("  POST /products          - Register a product");
    println!("  GET  /products          - List products and quantities");
    println!("  GET  /products/missing  - List out-of-stock products");
    println!("  POST /suppliers         - Register a supplier");
    println!("  POST /users             - Register a user");
    println!("  POST /receipts          - Record a delivery");
    println!("  POST /withdrawals       - Record an issuance");
    println!("  GET  /movements         - List movements");
    println!("  GET  /movements/:id     - Get a movement by id");

    axum::serve(listener, app).await.unwrap();
}
