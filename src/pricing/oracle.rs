use alloy::primitives::{Address, U256};
use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use std::sync::Arc;

use super::quote::AnchorQuoteSource;
use super::{raw_to_human, u256_to_decimal};
use crate::error::ChainError;
use crate::rpc::ChainClient;

/// Result of a price lookup. Callers that only need a number use
/// [`PriceOutcome::usd`], where every non-priced case reads as zero
/// ("no liquidity"); the variant keeps the reason for logs.
#[derive(Debug, Clone)]
pub enum PriceOutcome {
    Priced(BigDecimal),
    NoPair,
    /// Pair exists but one side of it is empty.
    DrainedPool,
    Unavailable(ChainError),
}

impl PriceOutcome {
    pub fn usd(&self) -> BigDecimal {
        match self {
            Self::Priced(price) => price.clone(),
            _ => BigDecimal::zero(),
        }
    }

    pub fn has_liquidity(&self) -> bool {
        matches!(self, Self::Priced(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Priced(_) => "priced",
            Self::NoPair => "no_pair",
            Self::DrainedPool => "drained_pool",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

/// Prices tokens from V2 reserves against the anchor asset.
pub struct PriceOracle<C> {
    chain: Arc<C>,
    factory: Address,
    anchor: Address,
    anchor_decimals: u8,
    quotes: AnchorQuoteSource,
}

impl<C: ChainClient> PriceOracle<C> {
    pub fn new(
        chain: Arc<C>,
        factory: Address,
        anchor: Address,
        anchor_decimals: u8,
        quotes: AnchorQuoteSource,
    ) -> Self {
        Self {
            chain,
            factory,
            anchor,
            anchor_decimals,
            quotes,
        }
    }

    pub fn anchor(&self) -> Address {
        self.anchor
    }

    pub fn anchor_decimals(&self) -> u8 {
        self.anchor_decimals
    }

    pub async fn anchor_usd(&self) -> BigDecimal {
        self.quotes.anchor_usd().await
    }

    /// Fiat value of a raw anchor amount at the given anchor price.
    pub fn anchor_value_usd(&self, amount: U256, anchor_usd: &BigDecimal) -> f64 {
        let units = raw_to_human(amount, self.anchor_decimals);
        let price = anchor_usd.to_f64().unwrap_or(0.0);
        units * price
    }

    /// Price of `token` in fiat. Never fails; see [`PriceOutcome`].
    pub async fn price_of(&self, token: Address) -> PriceOutcome {
        if token == self.anchor {
            return PriceOutcome::Priced(self.anchor_usd().await);
        }

        match self.pair_price(token).await {
            Ok(outcome) => {
                if !outcome.has_liquidity() {
                    tracing::debug!(token = %token, outcome = outcome.as_str(), "No liquidity for token");
                }
                outcome
            }
            Err(e) => {
                tracing::warn!(token = %token, error = %e, "Price lookup failed, reporting no liquidity");
                PriceOutcome::Unavailable(e)
            }
        }
    }

    async fn pair_price(&self, token: Address) -> Result<PriceOutcome, ChainError> {
        let pair = self.chain.get_pair(self.factory, token, self.anchor).await?;
        if pair == Address::ZERO {
            return Ok(PriceOutcome::NoPair);
        }

        let reserves = self.chain.reserves(pair).await?;
        let token0 = self.chain.token0(pair).await?;

        let (anchor_reserve, token_reserve) = if token0 == self.anchor {
            (reserves.reserve0, reserves.reserve1)
        } else {
            (reserves.reserve1, reserves.reserve0)
        };

        if token_reserve.is_zero() || anchor_reserve.is_zero() {
            return Ok(PriceOutcome::DrainedPool);
        }

        let ratio = u256_to_decimal(anchor_reserve) / u256_to_decimal(token_reserve);
        Ok(PriceOutcome::Priced(ratio * self.anchor_usd().await))
    }
}
