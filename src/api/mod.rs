use axum::{
    Router,
    extract::FromRef,
    routing::{get, post},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::cipher::CipherExecutor;
use crate::db::SqlitePool;
use crate::ledger::LedgerClient;

mod error;
pub mod wallets;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub executor: CipherExecutor,
    pub ledger: LedgerClient,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.db_pool.clone()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        wallets::api_create_wallet,
        wallets::api_list_wallets,
        wallets::api_get_wallet,
        wallets::api_get_balance,
        wallets::api_get_history,
        wallets::api_sync_wallet,
        wallets::api_health,
    ),
    components(
        schemas(
            error::ApiError,
            wallets::WalletParams,
            wallets::CreateWalletRequest,
            wallets::WalletResponse,
            wallets::WalletBalanceResponse,
            wallets::HealthResponse,
            crate::models::WalletTransaction,
            crate::models::TransactionDirection,
            crate::wallet::SyncReport,
            crate::wallet::WalletHistoryPage,
        )
    ),
    tags(
        (name = "walletd", description = "Wallet daemon API"),
    )
)]
pub struct ApiDoc;

pub fn create_router(db_pool: SqlitePool, executor: CipherExecutor, ledger: LedgerClient) -> Router {
    let app_state = AppState {
        db_pool,
        executor,
        ledger,
    };

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/openapi.json", ApiDoc::openapi()))
        .route("/health", get(wallets::api_health))
        .route(
            "/api/v1/wallets",
            get(wallets::api_list_wallets).post(wallets::api_create_wallet),
        )
        .route("/api/v1/wallets/{name}", get(wallets::api_get_wallet))
        .route("/api/v1/wallets/{name}/balance", get(wallets::api_get_balance))
        .route("/api/v1/wallets/{name}/history", get(wallets::api_get_history))
        .route("/api/v1/wallets/{name}/sync", post(wallets::api_sync_wallet))
        .with_state(app_state)
}
