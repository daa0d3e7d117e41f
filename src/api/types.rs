use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::alerts::SubscriberId;
use crate::rpc::EndpointStatus;

// ============================================================
// Query params & request bodies
// ============================================================

#[derive(Debug, Deserialize)]
pub struct LookupParams {
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub destination: String,
}

#[derive(Debug, Deserialize)]
pub struct WatchWalletRequest {
    pub address: String,
}

// ============================================================
// Responses
// ============================================================

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub id: SubscriberId,
}

#[derive(Debug, Serialize)]
pub struct WatchWalletResponse {
    pub subscriber: SubscriberId,
    pub wallet: Address,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UnwatchWalletResponse {
    pub subscriber: SubscriberId,
    pub wallet: Address,
    pub removed: bool,
}

#[derive(Debug, Serialize)]
pub struct EndpointsResponse {
    pub endpoints: Vec<EndpointStatus>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
