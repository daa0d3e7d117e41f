use alloy::primitives::Address;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ChainError;
use crate::pricing::PriceOracle;
use crate::risk::{RiskEvaluator, RiskVerdict};
use crate::rpc::ChainClient;
use crate::tokens::fetch_token_info;

/// On-demand answer for one token: metadata, price and honeypot verdict.
#[derive(Debug, Clone, Serialize)]
pub struct TokenReport {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    /// Fiat price; `"0"` means no liquidity.
    pub price_usd: String,
    pub liquidity: bool,
    /// Why the price is what it is (`priced`, `no_pair`, `drained_pool`, `unavailable`).
    pub price_status: &'static str,
    pub risk: RiskVerdict,
}

pub struct TokenInspector<C> {
    chain: Arc<C>,
    oracle: Arc<PriceOracle<C>>,
    evaluator: Arc<RiskEvaluator<C>>,
}

impl<C: ChainClient> TokenInspector<C> {
    pub fn new(chain: Arc<C>, oracle: Arc<PriceOracle<C>>, evaluator: Arc<RiskEvaluator<C>>) -> Self {
        Self {
            chain,
            oracle,
            evaluator,
        }
    }

    /// Gather the report concurrently. Fails only when `timeout` elapses.
    pub async fn inspect(&self, token: Address, timeout: Duration) -> Result<TokenReport, ChainError> {
        let lookups = async {
            tokio::join!(
                fetch_token_info(self.chain.as_ref(), token),
                self.oracle.price_of(token),
                self.evaluator.evaluate(token),
            )
        };

        let (info, price, risk) = tokio::time::timeout(timeout, lookups)
            .await
            .map_err(|_| ChainError::TimedOut {
                operation: "token lookup",
                timeout_ms: timeout.as_millis() as u64,
            })?;

        tracing::debug!(
            token = %token,
            symbol = %info.symbol,
            price = price.as_str(),
            reason = risk.reason.as_str(),
            "Token inspected"
        );

        Ok(TokenReport {
            address: token,
            name: info.name,
            symbol: info.symbol,
            price_usd: price.usd().normalized().to_string(),
            liquidity: price.has_liquidity(),
            price_status: price.as_str(),
            risk,
        })
    }
}
