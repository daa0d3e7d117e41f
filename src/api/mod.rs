pub mod handlers;
pub mod types;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::alerts::Dispatcher;
use crate::lookup::TokenInspector;
use crate::rpc::ChainClient;

pub struct AppState<C> {
    pub inspector: Arc<TokenInspector<C>>,
    pub dispatcher: Arc<Dispatcher>,
    pub chain: Arc<C>,
    pub lookup_timeout: Duration,
}

pub fn router<C: ChainClient + 'static>(state: AppState<C>) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/v1/token/{address}", get(handlers::token_report::<C>))
        .route("/api/v1/subscribers", post(handlers::subscribe::<C>))
        .route(
            "/api/v1/subscribers/{id}/wallets",
            post(handlers::watch_wallet::<C>),
        )
        .route(
            "/api/v1/subscribers/{id}/wallets/{address}",
            delete(handlers::unwatch_wallet::<C>),
        )
        .route("/api/v1/endpoints", get(handlers::endpoints::<C>))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve<C: ChainClient + 'static>(state: AppState<C>, host: &str, port: u16) -> eyre::Result<()> {
    let app = router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
