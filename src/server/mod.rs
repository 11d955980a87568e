pub mod api;

use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::services::Store;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
}

/// Start the axum server on the given port.
pub async fn serve(store: Store, port: u16) -> crate::error::Result<()> {
    let app_state = AppState { store };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);

    tracing::info!("Registering routes:");
    tracing::info!("  GET /api/stocks/");
    tracing::info!("  GET /api/stocks/{{ticker}}/");
    tracing::info!("  GET /api/stocks/{{ticker}}/insider/");
    tracing::info!("  GET /api/stocks/{{ticker}}/insider/{{insider}}/");
    tracing::info!("  GET /api/stocks/{{ticker}}/analytics/?date_from&date_to");
    tracing::info!("  GET /api/stocks/{{ticker}}/delta/?type&value");

    let app = Router::new()
        .route("/api/stocks/", get(api::list_companies))
        .route("/api/stocks/{ticker}/", get(api::list_stock_days))
        .route("/api/stocks/{ticker}/insider/", get(api::list_trades))
        .route(
            "/api/stocks/{ticker}/insider/{insider}/",
            get(api::list_insider_trades),
        )
        .route("/api/stocks/{ticker}/analytics/", get(api::price_analytics))
        .route("/api/stocks/{ticker}/delta/", get(api::period_analytics))
        .layer(cors)
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| crate::error::Error::Config(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::Io(e.to_string()))
}
