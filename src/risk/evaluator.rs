use alloy::primitives::{Address, U256};
use chrono::Utc;
use std::sync::Arc;

use super::types::RiskVerdict;
use crate::error::ChainError;
use crate::rpc::{BuySimulation, ChainClient};

const SIMULATION_DEADLINE_SECS: i64 = 300;

/// Honeypot check by simulated buy through the router.
///
/// A pure `eth_call` cannot hold the bought tokens afterwards, so the sell
/// leg is never simulated and taxes are reported as bands.
pub struct RiskEvaluator<C> {
    chain: Arc<C>,
    factory: Address,
    router: Address,
    anchor: Address,
    buy_amount: U256,
    sender: Address,
}

impl<C: ChainClient> RiskEvaluator<C> {
    pub fn new(
        chain: Arc<C>,
        factory: Address,
        router: Address,
        anchor: Address,
        buy_amount: U256,
        sender: Address,
    ) -> Self {
        Self {
            chain,
            factory,
            router,
            anchor,
            buy_amount,
            sender,
        }
    }

    pub async fn evaluate(&self, token: Address) -> RiskVerdict {
        let pair = match self.chain.get_pair(self.factory, token, self.anchor).await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(token = %token, error = %e, "Pair lookup failed during risk check");
                return RiskVerdict::rpc_error();
            }
        };

        if pair == Address::ZERO {
            return RiskVerdict::no_liquidity();
        }

        let sim = BuySimulation {
            router: self.router,
            anchor: self.anchor,
            token,
            sender: self.sender,
            amount_in: self.buy_amount,
            deadline: (Utc::now().timestamp() + SIMULATION_DEADLINE_SECS) as u64,
        };

        match self.chain.simulate_buy(&sim).await {
            Ok(()) => RiskVerdict::tradable(),
            Err(ChainError::Reverted { reason, .. }) => {
                tracing::info!(token = %token, pair = %pair, reason = %reason, "Simulated buy reverted");
                RiskVerdict::buy_blocked()
            }
            Err(e) => {
                tracing::warn!(token = %token, error = %e, "Buy simulation failed");
                RiskVerdict::rpc_error()
            }
        }
    }
}
