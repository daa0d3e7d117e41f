use alloy::primitives::{Address, U256};
use bigdecimal::BigDecimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::alerts::{ClassifiedEvent, SwapSide, TransferDirection};
use crate::config::AlertsConfig;
use crate::error::ChainError;
use crate::indexer::decoder::{DecodedLog, LogMeta};
use crate::pricing::PriceOracle;
use crate::risk::RiskEvaluator;
use crate::rpc::ChainClient;
use crate::tokens::fetch_token_info;

/// USD thresholds an event must strictly exceed to be alerted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub whale_usd: f64,
    pub rug_usd: f64,
    pub mempool_usd: f64,
}

impl From<&AlertsConfig> for Thresholds {
    fn from(config: &AlertsConfig) -> Self {
        Self {
            whale_usd: config.whale_threshold_usd,
            rug_usd: config.rug_threshold_usd,
            mempool_usd: config.mempool_threshold_usd,
        }
    }
}

/// State memoised for the duration of one scanner tick.
#[derive(Default)]
pub struct TickContext {
    pair_tokens: HashMap<Address, Option<(Address, Address)>>,
    anchor_usd: Option<BigDecimal>,
    watched: HashSet<Address>,
}

impl TickContext {
    pub fn new(watched: HashSet<Address>) -> Self {
        Self {
            watched,
            ..Default::default()
        }
    }

    pub fn set_watched(&mut self, watched: HashSet<Address>) {
        self.watched = watched;
    }
}

/// Which side of a pair is the anchor.
#[derive(Debug, Clone, Copy)]
struct AnchorSide {
    token: Address,
    anchor_is_token0: bool,
}

/// Turns decoded logs into alertable events:
/// 1. `PairCreated` → enriched `NewLaunch`
/// 2. `Swap` → `WhaleSwap` above the whale threshold
/// 3. `Burn` → `RugPull` above the rug threshold
/// 4. `Transfer` touching a watched wallet → `WalletActivity`
pub struct EventPipeline<C> {
    chain: Arc<C>,
    oracle: Arc<PriceOracle<C>>,
    evaluator: Arc<RiskEvaluator<C>>,
    thresholds: Thresholds,
}

impl<C: ChainClient> EventPipeline<C> {
    pub fn new(
        chain: Arc<C>,
        oracle: Arc<PriceOracle<C>>,
        evaluator: Arc<RiskEvaluator<C>>,
        thresholds: Thresholds,
    ) -> Self {
        Self {
            chain,
            oracle,
            evaluator,
            thresholds,
        }
    }

    pub fn oracle(&self) -> &PriceOracle<C> {
        &self.oracle
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Anchor price, fetched at most once per tick.
    pub async fn anchor_usd(&self, ctx: &mut TickContext) -> BigDecimal {
        if let Some(price) = &ctx.anchor_usd {
            return price.clone();
        }
        let price = self.oracle.anchor_usd().await;
        ctx.anchor_usd = Some(price.clone());
        price
    }

    /// Classify one decoded log. Only transient chain errors are returned;
    /// the caller retries the window on the next tick.
    pub async fn classify(
        &self,
        decoded: DecodedLog,
        meta: LogMeta,
        ctx: &mut TickContext,
    ) -> Result<Vec<ClassifiedEvent>, ChainError> {
        match decoded {
            DecodedLog::PairCreated { token0, token1, pair } => {
                Ok(self.new_launch(token0, token1, pair, meta).await.into_iter().collect())
            }
            DecodedLog::Swap {
                pair,
                amount0_in,
                amount1_in,
                amount0_out,
                amount1_out,
            } => {
                let Some(side) = self.anchor_side(pair, ctx).await? else {
                    return Ok(Vec::new());
                };
                let (anchor_in, anchor_out) = if side.anchor_is_token0 {
                    (amount0_in, amount0_out)
                } else {
                    (amount1_in, amount1_out)
                };
                let anchor_usd = self.anchor_usd(ctx).await;
                let usd_value = self
                    .oracle
                    .anchor_value_usd(anchor_in.saturating_add(anchor_out), &anchor_usd);

                if usd_value <= self.thresholds.whale_usd {
                    return Ok(Vec::new());
                }
                // Anchor flowing into the pair means someone bought the token
                let swap_side = if anchor_in > U256::ZERO {
                    SwapSide::Buy
                } else {
                    SwapSide::Sell
                };
                Ok(vec![ClassifiedEvent::WhaleSwap {
                    pair,
                    token: side.token,
                    side: swap_side,
                    usd_value,
                    block_number: meta.block_number,
                    tx_hash: meta.tx_hash,
                }])
            }
            DecodedLog::Burn {
                pair,
                amount0,
                amount1,
            } => {
                let Some(side) = self.anchor_side(pair, ctx).await? else {
                    return Ok(Vec::new());
                };
                let anchor_amount = if side.anchor_is_token0 { amount0 } else { amount1 };
                let anchor_usd = self.anchor_usd(ctx).await;
                // Both sides leave the pool in equal value
                let usd_value = 2.0 * self.oracle.anchor_value_usd(anchor_amount, &anchor_usd);

                if usd_value <= self.thresholds.rug_usd {
                    return Ok(Vec::new());
                }
                Ok(vec![ClassifiedEvent::RugPull {
                    pair,
                    token: side.token,
                    usd_value,
                    block_number: meta.block_number,
                    tx_hash: meta.tx_hash,
                }])
            }
            DecodedLog::Transfer { token, from, to, value } => {
                let mut events = Vec::new();
                if ctx.watched.contains(&from) {
                    events.push(ClassifiedEvent::WalletActivity {
                        wallet: from,
                        token,
                        direction: TransferDirection::Outgoing,
                        counterparty: to,
                        amount: value,
                        block_number: meta.block_number,
                        tx_hash: meta.tx_hash,
                    });
                }
                if ctx.watched.contains(&to) && to != from {
                    events.push(ClassifiedEvent::WalletActivity {
                        wallet: to,
                        token,
                        direction: TransferDirection::Incoming,
                        counterparty: from,
                        amount: value,
                        block_number: meta.block_number,
                        tx_hash: meta.tx_hash,
                    });
                }
                Ok(events)
            }
        }
    }

    async fn new_launch(
        &self,
        token0: Address,
        token1: Address,
        pair: Address,
        meta: LogMeta,
    ) -> Option<ClassifiedEvent> {
        let anchor = self.oracle.anchor();
        let token = if token0 == anchor { token1 } else { token0 };
        if token == anchor {
            return None;
        }

        let (info, risk, price) = tokio::join!(
            fetch_token_info(self.chain.as_ref(), token),
            self.evaluator.evaluate(token),
            self.oracle.price_of(token),
        );

        tracing::info!(
            token = %token,
            pair = %pair,
            symbol = %info.symbol,
            honeypot = risk.is_honeypot,
            reason = risk.reason.as_str(),
            price = price.as_str(),
            block = meta.block_number,
            "New pair launched"
        );

        Some(ClassifiedEvent::NewLaunch {
            token: info,
            pair,
            risk,
            price_usd: price.usd().normalized().to_string(),
            block_number: meta.block_number,
            tx_hash: meta.tx_hash,
        })
    }

    /// Resolve the pair's anchor side. `Ok(None)` for pairs without the
    /// anchor or whose token calls do not decode.
    async fn anchor_side(
        &self,
        pair: Address,
        ctx: &mut TickContext,
    ) -> Result<Option<AnchorSide>, ChainError> {
        let tokens = match ctx.pair_tokens.get(&pair) {
            Some(tokens) => *tokens,
            None => {
                let tokens = match self.chain.pair_tokens(pair).await {
                    Ok(tokens) => Some(tokens),
                    Err(e) if e.is_transient() => return Err(e),
                    Err(e) => {
                        tracing::debug!(pair = %pair, error = %e, "Not a V2 pair, skipping");
                        None
                    }
                };
                ctx.pair_tokens.insert(pair, tokens);
                tokens
            }
        };

        let anchor = self.oracle.anchor();
        let side = match tokens {
            Some((token0, token1)) if token0 == anchor => Some(AnchorSide {
                token: token1,
                anchor_is_token0: true,
            }),
            Some((token0, token1)) if token1 == anchor => Some(AnchorSide {
                token: token0,
                anchor_is_token0: false,
            }),
            Some(_) => {
                tracing::debug!(pair = %pair, "Pair has no anchor side, skipping valuation");
                None
            }
            None => None,
        };
        Ok(side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::AnchorQuoteSource;
    use crate::risk::RiskReason;
    use crate::rpc::testing::{addr, ether, hash, FakeChain};

    const FACTORY: u8 = 0xfa;
    const ROUTER: u8 = 0xee;
    const ANCHOR: u8 = 0xaa;
    const PAIR: u8 = 0x50;
    const TOKEN: u8 = 0x01;

    fn pipeline(chain: Arc<FakeChain>) -> EventPipeline<FakeChain> {
        let oracle = Arc::new(PriceOracle::new(
            chain.clone(),
            addr(FACTORY),
            addr(ANCHOR),
            18,
            AnchorQuoteSource::fixed(BigDecimal::from(1)),
        ));
        let evaluator = Arc::new(RiskEvaluator::new(
            chain.clone(),
            addr(FACTORY),
            addr(ROUTER),
            addr(ANCHOR),
            ether(1),
            addr(0xde),
        ));
        EventPipeline::new(
            chain,
            oracle,
            evaluator,
            Thresholds {
                whale_usd: 50_000.0,
                rug_usd: 10_000.0,
                mempool_usd: 50_000.0,
            },
        )
    }

    fn meta(tx: u8) -> LogMeta {
        LogMeta {
            block_number: 103,
            tx_hash: hash(tx),
            log_index: 0,
        }
    }

    fn swap(anchor_in: u64, token_out: u64) -> DecodedLog {
        DecodedLog::Swap {
            pair: addr(PAIR),
            amount0_in: ether(anchor_in),
            amount1_in: U256::ZERO,
            amount0_out: U256::ZERO,
            amount1_out: ether(token_out),
        }
    }

    #[tokio::test]
    async fn test_pair_created_becomes_enriched_launch() {
        let chain = Arc::new(FakeChain::new());
        chain.add_pair(addr(PAIR), addr(TOKEN), addr(ANCHOR), ether(500_000), ether(1000));
        chain.set_metadata(addr(TOKEN), "Moon", "MOON");
        let pipeline = pipeline(chain);

        let decoded = DecodedLog::PairCreated {
            token0: addr(TOKEN),
            token1: addr(ANCHOR),
            pair: addr(PAIR),
        };
        let events = pipeline
            .classify(decoded, meta(0x0a), &mut TickContext::default())
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        match &events[0] {
            ClassifiedEvent::NewLaunch { token, risk, price_usd, .. } => {
                assert_eq!(token.symbol, "MOON");
                assert_eq!(risk.reason, RiskReason::Ok);
                assert_eq!(price_usd, "0.002");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_swap_above_threshold_is_whale() {
        let chain = Arc::new(FakeChain::new());
        chain.add_pair(addr(PAIR), addr(ANCHOR), addr(TOKEN), ether(1_000_000), ether(1_000_000));
        let pipeline = pipeline(chain);
        let mut ctx = TickContext::default();

        let events = pipeline.classify(swap(60_000, 55_000), meta(1), &mut ctx).await.unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            ClassifiedEvent::WhaleSwap { side: SwapSide::Buy, usd_value, token, .. }
                if usd_value == 60_000.0 && token == addr(TOKEN)
        ));

        let small = pipeline.classify(swap(50_000, 45_000), meta(2), &mut ctx).await.unwrap();
        assert!(small.is_empty());
    }

    #[tokio::test]
    async fn test_burn_values_twice_anchor_side() {
        let chain = Arc::new(FakeChain::new());
        chain.add_pair(addr(PAIR), addr(TOKEN), addr(ANCHOR), ether(1), ether(1));
        let pipeline = pipeline(chain);
        let mut ctx = TickContext::default();

        let burn = |anchor: u64| DecodedLog::Burn {
            pair: addr(PAIR),
            amount0: ether(1_000_000),
            amount1: ether(anchor),
        };
        let events = pipeline.classify(burn(6_000), meta(1), &mut ctx).await.unwrap();
        assert!(matches!(events[0], ClassifiedEvent::RugPull { usd_value, .. } if usd_value == 12_000.0));
        assert!(pipeline.classify(burn(4_000), meta(2), &mut ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pair_without_anchor_is_skipped() {
        let chain = Arc::new(FakeChain::new());
        chain.add_pair(addr(PAIR), addr(0x02), addr(0x03), ether(1), ether(1));
        let pipeline = pipeline(chain);
        let events = pipeline
            .classify(swap(1_000_000, 1), meta(1), &mut TickContext::default())
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_transient_error_propagates() {
        let chain = Arc::new(FakeChain::new());
        chain.set_offline(true);
        let pipeline = pipeline(chain);
        let result = pipeline
            .classify(swap(60_000, 1), meta(1), &mut TickContext::default())
            .await;
        assert!(matches!(result, Err(ChainError::RpcUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_transfer_matches_watched_wallets() {
        let pipeline = pipeline(Arc::new(FakeChain::new()));
        let watched = addr(0x77);
        let mut ctx = TickContext::new(HashSet::from([watched]));

        let incoming = DecodedLog::Transfer {
            token: addr(TOKEN),
            from: addr(0x12),
            to: watched,
            value: U256::from(5u64),
        };
        let events = pipeline.classify(incoming, meta(1), &mut ctx).await.unwrap();
        assert!(matches!(
            events[0],
            ClassifiedEvent::WalletActivity { direction: TransferDirection::Incoming, counterparty, .. }
                if counterparty == addr(0x12)
        ));

        let unrelated = DecodedLog::Transfer {
            token: addr(TOKEN),
            from: addr(0x12),
            to: addr(0x13),
            value: U256::from(5u64),
        };
        assert!(pipeline.classify(unrelated, meta(2), &mut ctx).await.unwrap().is_empty());
    }
}
