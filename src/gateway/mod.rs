pub mod error;
pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Ledger and account routes, relative to their mount point
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/accounts",
            get(handlers::list_accounts).post(handlers::create_account),
        )
        // Combined credit/debit form; static segment wins over {id}
        .route("/accounts/transaction", post(handlers::legacy_transaction))
        .route(
            "/accounts/{id}",
            get(handlers::get_account)
                .put(handlers::update_account)
                .delete(handlers::delete_account),
        )
        .route("/accounts/{id}/deposit", post(handlers::deposit))
        .route("/accounts/{id}/withdraw", post(handlers::withdraw))
        .route(
            "/accounts/{id}/transactions",
            get(handlers::transaction_history),
        )
}

/// Build the complete router.
///
/// The API is served both at the root and under `/api`.
pub fn build_router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/", get(handlers::root))
        .merge(api_routes())
        .nest("/api", api_routes())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve `router` on `listener` until `shutdown` resolves.
///
/// In-flight requests are allowed to finish; their ledger units commit or
/// roll back before the future returns.
pub async fn run_server<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Gateway listening on http://{}", addr);
        tracing::info!("API Docs: http://{}/docs", addr);
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
