use alloy::primitives::Address;
use serde::Serialize;

use crate::rpc::ChainClient;

pub const UNKNOWN_NAME: &str = "Unknown";
pub const UNKNOWN_SYMBOL: &str = "???";

/// ERC-20 display metadata. Fetched on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub address: Address,
    pub name: String,
    pub symbol: String,
}

/// Fetch name and symbol. A failed field falls back to a sentinel instead of
/// failing the caller.
pub async fn fetch_token_info<C: ChainClient + ?Sized>(chain: &C, token: Address) -> TokenInfo {
    let (name, symbol) = tokio::join!(chain.token_name(token), chain.token_symbol(token));

    let name = name.unwrap_or_else(|e| {
        tracing::debug!(token = %token, error = %e, "Token name unavailable");
        UNKNOWN_NAME.to_string()
    });
    let symbol = symbol.unwrap_or_else(|e| {
        tracing::debug!(token = %token, error = %e, "Token symbol unavailable");
        UNKNOWN_SYMBOL.to_string()
    });

    TokenInfo {
        address: token,
        name,
        symbol,
    }
}
