//! Simple REST API server example for the wallet ledger.
//!
//! Run with: `cargo run --example server`
//!
//! ## Endpoints
//!
//! - `POST /wallets/{user_id}` - Ensure a wallet exists (idempotent)
//! - `GET /wallets/{user_id}/balance` - Current balances
//! - `GET /wallets/{user_id}/transactions?page=1&limit=10` - Ledger history
//! - `POST /wallets/{user_id}/adjust` - Adjust a balance field
//! - `POST /wallets/{user_id}/bonus` - Credit bonus funds
//! - `POST /transfers` - Move real funds between wallets
//!
//! ## Example Usage
//!
//! ```bash
//! # Provision a wallet
//! curl -X POST http://localhost:3000/wallets/1
//!
//! # Credit it
//! curl -X POST http://localhost:3000/wallets/1/adjust \
//!   -H "Content-Type: application/json" \
//!   -d '{"amount": "100.00", "direction": "add", "balance": "real", "reason": "deposit approved"}'
//!
//! # Transfer
//! curl -X POST http://localhost:3000/transfers \
//!   -H "Content-Type: application/json" \
//!   -d '{"from": 1, "to": 2, "amount": "25.00", "description": "gift"}'
//!
//! # Balance and history
//! curl http://localhost:3000/wallets/1/balance
//! curl 'http://localhost:3000/wallets/1/transactions?page=1&limit=10'
//! ```

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use wallet_ledger::{BalanceKind, Direction, Ledger, LedgerError, UserId};

// === Request/Response DTOs ===

/// Request body for balance adjustments.
///
/// ```json
/// {"amount": "100.00", "direction": "add", "balance": "real", "reason": "deposit approved"}
/// ```
#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub amount: Decimal,
    pub direction: Direction,
    pub balance: BalanceKind,
    pub reason: String,
}

/// Request body for transfers.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub from: u64,
    pub to: u64,
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
}

/// Request body for bonus credits.
#[derive(Debug, Deserialize)]
pub struct BonusRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
}

/// Query parameters for history pagination.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    10
}

/// Response body for transfers: both updated wallets.
#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub from: wallet_ledger::WalletSnapshot,
    pub to: wallet_ledger::WalletSnapshot,
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the ledger.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
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
        let (status, code) = match &self.0 {
            LedgerError::WalletNotFound => (StatusCode::NOT_FOUND, "WALLET_NOT_FOUND"),
            LedgerError::InvalidAmount => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
            LedgerError::InsufficientBalance => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_BALANCE")
            }
            LedgerError::SelfTransfer => (StatusCode::BAD_REQUEST, "SELF_TRANSFER"),
            LedgerError::CurrencyMismatch => (StatusCode::CONFLICT, "CURRENCY_MISMATCH"),
            LedgerError::InvalidPage => (StatusCode::BAD_REQUEST, "INVALID_PAGE"),
            LedgerError::StoreConflict => (StatusCode::SERVICE_UNAVAILABLE, "STORE_CONFLICT"),
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

/// POST /wallets/{user_id} - Idempotent wallet provisioning.
async fn ensure_wallet(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
) -> impl IntoResponse {
    let snapshot = state.ledger.ensure_wallet(UserId(user_id));
    (StatusCode::OK, Json(snapshot))
}

/// GET /wallets/{user_id}/balance - Current balances.
async fn get_balance(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.ledger.balance(UserId(user_id))?;
    Ok(Json(view))
}

/// GET /wallets/{user_id}/transactions - Paginated ledger history.
async fn get_history(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = state
        .ledger
        .history(UserId(user_id), params.page, params.limit)?;
    Ok(Json(page))
}

/// POST /wallets/{user_id}/adjust - Adjust a balance field.
async fn adjust_balance(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
    Json(request): Json<AdjustRequest>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = state.ledger.adjust_balance(
        UserId(user_id),
        request.amount,
        request.direction,
        request.balance,
        request.reason,
    )?;
    Ok(Json(snapshot))
}

/// POST /wallets/{user_id}/bonus - Credit bonus funds.
async fn credit_bonus(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
    Json(request): Json<BonusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot =
        state
            .ledger
            .credit_bonus(UserId(user_id), request.amount, request.description)?;
    Ok(Json(snapshot))
}

/// POST /transfers - Move real funds between wallets.
async fn transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (from, to) = state.ledger.transfer(
        UserId(request.from),
        UserId(request.to),
        request.amount,
        request.description,
    )?;
    Ok(Json(TransferResponse { from, to }))
}

// === Router ===

pub fn app(ledger: Arc<Ledger>) -> Router {
    Router::new()
        .route("/wallets/{user_id}", post(ensure_wallet))
        .route("/wallets/{user_id}/balance", get(get_balance))
        .route("/wallets/{user_id}/transactions", get(get_history))
        .route("/wallets/{user_id}/adjust", post(adjust_balance))
        .route("/wallets/{user_id}/bonus", post(credit_bonus))
        .route("/transfers", post(transfer))
        .with_state(AppState { ledger })
}

#[tokio::main]
async fn main() {
    let ledger = Arc::new(Ledger::new());
    let app = app(ledger);

    let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
    println!("Wallet ledger listening on http://127.0.0.1:3000");
    axum::serve(listener, app).await.unwrap();
}
