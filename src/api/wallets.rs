//! Wallet API endpoint handlers.
//!
//! HTTP handlers for the wallet daemon's REST API:
//!
//! - Provisioning new wallets
//! - Listing wallets and reading a single wallet's public details
//! - Ledger balance lookups
//! - Paginated local transaction history
//! - Triggering a history sync
//!
//! Responses never include the encrypted secret key; exporting key material
//! is a CLI-only operation. Error responses use [`ApiError`] for consistent
//! JSON formatting.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::error::ApiError;
use crate::{
    api::AppState,
    db::{SqlitePool, WalletRow},
    wallet::{self, SyncReport, WalletHistoryPage},
};

/// History page size when the query omits `limit`.
const DEFAULT_HISTORY_LIMIT: u64 = 50;

/// Path parameters identifying a wallet.
///
/// For a request to `/api/v1/wallets/my_wallet/balance`, the `name` field
/// contains `"my_wallet"`.
#[derive(Debug, Deserialize, IntoParams, utoipa::ToSchema)]
pub struct WalletParams {
    /// The unique name identifying the wallet.
    name: String,
}

/// Pagination query parameters for history requests.
#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryParams {
    /// Rows to skip, counted from the newest transaction. Defaults to 0.
    pub offset: Option<u64>,
    /// Maximum rows to return. Defaults to 50.
    pub limit: Option<u64>,
}

/// Request body for provisioning a wallet.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateWalletRequest {
    /// Unique name for the new wallet.
    pub name: String,
}

/// Public view of a wallet. The encrypted secret key is deliberately
/// absent.
#[derive(Debug, Serialize, ToSchema)]
pub struct WalletResponse {
    pub name: String,
    pub public_key: String,
    pub account_id: String,
    #[schema(value_type = String)]
    pub created_at: NaiveDateTime,
}

impl From<WalletRow> for WalletResponse {
    fn from(row: WalletRow) -> Self {
        Self {
            name: row.name,
            public_key: row.public_key,
            account_id: row.account_id,
            created_at: row.created_at,
        }
    }
}

/// Ledger balance for a wallet's account.
#[derive(Debug, Serialize, ToSchema)]
pub struct WalletBalanceResponse {
    /// Balance in micro-units.
    pub balance: i64,
}

/// Daemon liveness plus a snapshot of the cipher executor.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub worker_alive: bool,
    pub queued_tasks: usize,
    pub tasks_settled: u64,
}

/// Provisions a new wallet.
///
/// Generates a keypair, encrypts the secret key through the cipher executor
/// and stores the wallet. The response carries only public material.
///
/// # Errors
///
/// - [`ApiError::BadRequest`]: The name is empty
/// - [`ApiError::Conflict`]: A wallet with this name already exists
/// - [`ApiError::TransformFailed`]: The encrypt task failed or was refused
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:3000/api/v1/wallets \
///   -H "Content-Type: application/json" \
///   -d '{"name": "treasury"}'
/// ```
#[utoipa::path(
    post,
    path = "/api/v1/wallets",
    request_body = CreateWalletRequest,
    responses(
        (status = 201, description = "Wallet provisioned successfully", body = WalletResponse),
        (status = 400, description = "Invalid wallet name", body = ApiError),
        (status = 409, description = "Wallet name or key already taken", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError),
    )
)]
pub async fn api_create_wallet(
    State(app_state): State<AppState>,
    Json(body): Json<CreateWalletRequest>,
) -> Result<(StatusCode, Json<WalletResponse>), ApiError> {
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Wallet name must not be empty".to_string()));
    }

    let row = wallet::create_wallet(&app_state.db_pool, &app_state.executor, &name).await?;

    Ok((StatusCode::CREATED, Json(row.into())))
}

/// Lists all wallets, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/wallets",
    responses(
        (status = 200, description = "All provisioned wallets", body = Vec<WalletResponse>),
        (status = 500, description = "Internal server error", body = ApiError),
    )
)]
pub async fn api_list_wallets(State(db_pool): State<SqlitePool>) -> Result<Json<Vec<WalletResponse>>, ApiError> {
    let wallets = wallet::list_wallets(&db_pool).await?;

    Ok(Json(wallets.into_iter().map(WalletResponse::from).collect()))
}

/// Returns one wallet's public details.
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{name}",
    responses(
        (status = 200, description = "Wallet details", body = WalletResponse),
        (status = 404, description = "Wallet not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError),
    ),
    params(
        ("name" = String, Path, description = "Name of the wallet"),
    )
)]
pub async fn api_get_wallet(
    State(db_pool): State<SqlitePool>,
    Path(WalletParams { name }): Path<WalletParams>,
) -> Result<Json<WalletResponse>, ApiError> {
    let row = wallet::load_wallet(&db_pool, &name).await?;

    Ok(Json(row.into()))
}

/// Retrieves the current ledger balance for a wallet.
///
/// The balance is read live from the ledger service, not from the local
/// database.
///
/// # Errors
///
/// - [`ApiError::WalletNotFound`]: The wallet does not exist
/// - [`ApiError::LedgerUnavailable`]: The ledger request failed
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{name}/balance",
    responses(
        (status = 200, description = "Balance retrieved successfully", body = WalletBalanceResponse),
        (status = 404, description = "Wallet not found", body = ApiError),
        (status = 502, description = "Ledger unavailable", body = ApiError),
    ),
    params(
        ("name" = String, Path, description = "Name of the wallet"),
    )
)]
pub async fn api_get_balance(
    State(app_state): State<AppState>,
    Path(WalletParams { name }): Path<WalletParams>,
) -> Result<Json<WalletBalanceResponse>, ApiError> {
    let balance = wallet::wallet_balance(&app_state.db_pool, &app_state.ledger, &name).await?;

    Ok(Json(WalletBalanceResponse { balance }))
}

/// Returns one page of locally stored history, newest first, with
/// credit/debit aggregates over the whole history.
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{name}/history",
    responses(
        (status = 200, description = "History page", body = WalletHistoryPage),
        (status = 404, description = "Wallet not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError),
    ),
    params(
        ("name" = String, Path, description = "Name of the wallet"),
        HistoryParams,
    )
)]
pub async fn api_get_history(
    State(db_pool): State<SqlitePool>,
    Path(WalletParams { name }): Path<WalletParams>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<WalletHistoryPage>, ApiError> {
    let offset = params.offset.unwrap_or(0);
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);

    let page = wallet::wallet_history(&db_pool, &name, offset, limit).await?;

    Ok(Json(page))
}

/// Pulls any new ledger transactions into the local history.
#[utoipa::path(
    post,
    path = "/api/v1/wallets/{name}/sync",
    responses(
        (status = 200, description = "Sync completed", body = SyncReport),
        (status = 404, description = "Wallet not found", body = ApiError),
        (status = 502, description = "Ledger unavailable", body = ApiError),
    ),
    params(
        ("name" = String, Path, description = "Name of the wallet"),
    )
)]
pub async fn api_sync_wallet(
    State(app_state): State<AppState>,
    Path(WalletParams { name }): Path<WalletParams>,
) -> Result<Json<SyncReport>, ApiError> {
    let report = wallet::sync_wallet_history(&app_state.db_pool, &app_state.ledger, &name).await?;

    Ok(Json(report))
}

/// Liveness check including the cipher executor's worker state.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Daemon is healthy", body = HealthResponse),
        (status = 500, description = "Executor unavailable", body = ApiError),
    )
)]
pub async fn api_health(State(app_state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let status = app_state
        .executor
        .status()
        .await
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        worker_alive: status.worker_alive,
        queued_tasks: status.queued,
        tasks_settled: status.tasks_settled,
    }))
}
