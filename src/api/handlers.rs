use alloy::primitives::Address;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use super::types::*;
use super::AppState;
use crate::alerts::{RegistryError, SubscriberId};
use crate::error::ChainError;
use crate::lookup::TokenReport;
use crate::rpc::ChainClient;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn api_error(status: StatusCode, msg: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: msg.into(),
        }),
    )
}

fn parse_address(raw: &str) -> Result<Address, (StatusCode, Json<ErrorResponse>)> {
    Address::from_str(raw.trim())
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("Invalid address '{}': {}", raw, e)))
}

fn registry_error(e: RegistryError) -> (StatusCode, Json<ErrorResponse>) {
    match e {
        RegistryError::UnknownSubscriber(_) => api_error(StatusCode::NOT_FOUND, e.to_string()),
    }
}

// ============================================================
// Token lookup
// ============================================================

pub async fn token_report<C: ChainClient + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path(address): Path<String>,
    Query(params): Query<LookupParams>,
) -> ApiResult<TokenReport> {
    let token = parse_address(&address)?;
    let timeout = params
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(state.lookup_timeout);

    state
        .inspector
        .inspect(token, timeout)
        .await
        .map(Json)
        .map_err(|e| match e {
            ChainError::TimedOut { .. } => api_error(StatusCode::GATEWAY_TIMEOUT, e.to_string()),
            other => api_error(StatusCode::BAD_GATEWAY, other.to_string()),
        })
}

// ============================================================
// Subscribers
// ============================================================

pub async fn subscribe<C: ChainClient + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Json(body): Json<SubscribeRequest>,
) -> ApiResult<SubscribeResponse> {
    let destination = body.destination.trim();
    if destination.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "destination must not be empty"));
    }
    let id = state.dispatcher.subscribe(destination).await;
    Ok(Json(SubscribeResponse { id }))
}

pub async fn watch_wallet<C: ChainClient + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path(id): Path<SubscriberId>,
    Json(body): Json<WatchWalletRequest>,
) -> ApiResult<WatchWalletResponse> {
    let wallet = parse_address(&body.address)?;
    let outcome = state
        .dispatcher
        .watch_wallet(id, wallet)
        .await
        .map_err(registry_error)?;

    Ok(Json(WatchWalletResponse {
        subscriber: id,
        wallet,
        status: outcome.as_str(),
    }))
}

pub async fn unwatch_wallet<C: ChainClient + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path((id, address)): Path<(SubscriberId, String)>,
) -> ApiResult<UnwatchWalletResponse> {
    let wallet = parse_address(&address)?;
    let removed = state
        .dispatcher
        .unwatch_wallet(id, wallet)
        .await
        .map_err(registry_error)?;

    Ok(Json(UnwatchWalletResponse {
        subscriber: id,
        wallet,
        removed,
    }))
}

// ============================================================
// Endpoints
// ============================================================

pub async fn endpoints<C: ChainClient + 'static>(
    State(state): State<Arc<AppState<C>>>,
) -> Json<EndpointsResponse> {
    Json(EndpointsResponse {
        endpoints: state.chain.endpoint_status(),
    })
}
