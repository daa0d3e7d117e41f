use alloy::consensus::Transaction as ConsensusTx;
use alloy::network::TransactionResponse;
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::state::{AccountOverride, StateOverride};
use alloy::rpc::types::{BlockNumberOrTag, Filter, Log};
use alloy::sol;
use alloy::transports::{RpcError, TransportError};
use async_trait::async_trait;
use std::time::Duration;

use super::pool::{AttemptError, EndpointPool, EndpointStatus};
use super::types::{BuySimulation, PendingTx, Reserves};
use crate::error::ChainError;

sol! {
    #[sol(rpc)]
    interface IUniswapV2Factory {
        function getPair(address tokenA, address tokenB) external view returns (address pair);
    }

    #[sol(rpc)]
    interface IUniswapV2Pair {
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
        function token0() external view returns (address);
        function token1() external view returns (address);
    }

    #[sol(rpc)]
    interface IERC20Metadata {
        function name() external view returns (string);
        function symbol() external view returns (string);
    }

    #[sol(rpc)]
    interface IUniswapV2Router02 {
        function swapExactETHForTokensSupportingFeeOnTransferTokens(
            uint256 amountOutMin,
            address[] calldata path,
            address to,
            uint256 deadline
        ) external payable;
    }
}

/// Every chain read the monitor needs. Implemented over the endpoint pool
/// in production and by an in-memory fake in tests.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn block_number(&self) -> Result<u64, ChainError>;

    /// Logs in `[from_block, to_block]` whose topic0 is one of `signatures`.
    async fn logs(
        &self,
        from_block: u64,
        to_block: u64,
        signatures: &[B256],
    ) -> Result<Vec<Log>, ChainError>;

    async fn pending_transactions(&self) -> Result<Vec<PendingTx>, ChainError>;

    /// Factory lookup. Returns the zero address when no pair exists.
    async fn get_pair(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Address, ChainError>;

    async fn reserves(&self, pair: Address) -> Result<Reserves, ChainError>;

    async fn token0(&self, pair: Address) -> Result<Address, ChainError>;

    async fn pair_tokens(&self, pair: Address) -> Result<(Address, Address), ChainError>;

    async fn token_name(&self, token: Address) -> Result<String, ChainError>;

    async fn token_symbol(&self, token: Address) -> Result<String, ChainError>;

    /// `Ok(())` when the buy would go through, `Err(Reverted)` when it would not.
    async fn simulate_buy(&self, sim: &BuySimulation) -> Result<(), ChainError>;

    fn endpoint_status(&self) -> Vec<EndpointStatus> {
        Vec::new()
    }
}

/// Build one long-lived HTTP provider per configured URL, in rank order.
pub fn connect_pool(urls: &[String], attempt_timeout: Duration) -> eyre::Result<EndpointPool<DynProvider>> {
    let mut clients = Vec::with_capacity(urls.len());
    for raw in urls {
        let url = raw
            .parse()
            .map_err(|e| eyre::eyre!("Invalid RPC URL '{}': {}", raw, e))?;
        let provider = ProviderBuilder::new().connect_http(url).erased();
        clients.push((raw.clone(), provider));
    }
    Ok(EndpointPool::new(clients, attempt_timeout))
}

/// [`ChainClient`] that routes every read through an [`EndpointPool`].
pub struct PooledChain {
    pool: EndpointPool<DynProvider>,
}

impl PooledChain {
    pub fn new(pool: EndpointPool<DynProvider>) -> Self {
        Self { pool }
    }
}

fn transport_attempt_error(method: &'static str, err: TransportError) -> AttemptError {
    if let RpcError::ErrorResp(payload) = &err {
        // geth reports reverts as code 3, some forks as -32000 with a message
        if payload.code == 3 || payload.message.to_ascii_lowercase().contains("revert") {
            return AttemptError::Final(ChainError::Reverted {
                method,
                reason: payload.message.to_string(),
            });
        }
    }
    AttemptError::Unavailable(err.to_string())
}

fn contract_attempt_error(method: &'static str, err: alloy::contract::Error) -> AttemptError {
    match err {
        alloy::contract::Error::TransportError(e) => transport_attempt_error(method, e),
        other => AttemptError::Final(ChainError::Decode {
            method,
            reason: other.to_string(),
        }),
    }
}

#[async_trait]
impl ChainClient for PooledChain {
    async fn block_number(&self) -> Result<u64, ChainError> {
        self.pool
            .call("eth_blockNumber", |provider: DynProvider| async move {
                provider
                    .get_block_number()
                    .await
                    .map_err(|e| AttemptError::Unavailable(e.to_string()))
            })
            .await
    }

    async fn logs(
        &self,
        from_block: u64,
        to_block: u64,
        signatures: &[B256],
    ) -> Result<Vec<Log>, ChainError> {
        let filter = Filter::new()
            .event_signature(signatures.to_vec())
            .from_block(from_block)
            .to_block(to_block);

        self.pool
            .call("eth_getLogs", |provider: DynProvider| {
                let filter = filter.clone();
                async move {
                    provider
                        .get_logs(&filter)
                        .await
                        .map_err(|e| AttemptError::Unavailable(e.to_string()))
                }
            })
            .await
    }

    async fn pending_transactions(&self) -> Result<Vec<PendingTx>, ChainError> {
        self.pool
            .call("eth_getBlockByNumber(pending)", |provider: DynProvider| async move {
                let block = provider
                    .get_block_by_number(BlockNumberOrTag::Pending)
                    .full()
                    .await
                    .map_err(|e| AttemptError::Unavailable(e.to_string()))?;

                let txs: Vec<PendingTx> = block
                    .map(|block| {
                        block
                            .transactions
                            .txns()
                            .map(|tx| PendingTx {
                                hash: TransactionResponse::tx_hash(tx),
                                from: TransactionResponse::from(tx),
                                to: ConsensusTx::to(tx),
                                value: ConsensusTx::value(tx),
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(txs)
            })
            .await
    }

    async fn get_pair(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Address, ChainError> {
        self.pool
            .call("getPair", |provider: DynProvider| async move {
                IUniswapV2Factory::new(factory, provider)
                    .getPair(token_a, token_b)
                    .call()
                    .await
                    .map_err(|e| contract_attempt_error("getPair", e))
            })
            .await
    }

    async fn reserves(&self, pair: Address) -> Result<Reserves, ChainError> {
        self.pool
            .call("getReserves", |provider: DynProvider| async move {
                let reserves = IUniswapV2Pair::new(pair, provider)
                    .getReserves()
                    .call()
                    .await
                    .map_err(|e| contract_attempt_error("getReserves", e))?;
                Ok(Reserves {
                    reserve0: U256::from(reserves.reserve0),
                    reserve1: U256::from(reserves.reserve1),
                })
            })
            .await
    }

    async fn token0(&self, pair: Address) -> Result<Address, ChainError> {
        self.pool
            .call("token0", |provider: DynProvider| async move {
                IUniswapV2Pair::new(pair, provider)
                    .token0()
                    .call()
                    .await
                    .map_err(|e| contract_attempt_error("token0", e))
            })
            .await
    }

    async fn pair_tokens(&self, pair: Address) -> Result<(Address, Address), ChainError> {
        let token0 = self.token0(pair).await?;
        let token1 = self
            .pool
            .call("token1", |provider: DynProvider| async move {
                IUniswapV2Pair::new(pair, provider)
                    .token1()
                    .call()
                    .await
                    .map_err(|e| contract_attempt_error("token1", e))
            })
            .await?;
        Ok((token0, token1))
    }

    async fn token_name(&self, token: Address) -> Result<String, ChainError> {
        self.pool
            .call("name", |provider: DynProvider| async move {
                IERC20Metadata::new(token, provider)
                    .name()
                    .call()
                    .await
                    .map_err(|e| contract_attempt_error("name", e))
            })
            .await
    }

    async fn token_symbol(&self, token: Address) -> Result<String, ChainError> {
        self.pool
            .call("symbol", |provider: DynProvider| async move {
                IERC20Metadata::new(token, provider)
                    .symbol()
                    .call()
                    .await
                    .map_err(|e| contract_attempt_error("symbol", e))
            })
            .await
    }

    async fn simulate_buy(&self, sim: &BuySimulation) -> Result<(), ChainError> {
        const METHOD: &str = "swapExactETHForTokensSupportingFeeOnTransferTokens";

        self.pool
            .call(METHOD, |provider: DynProvider| {
                let sim = sim.clone();
                async move {
                    // Fund the simulated sender so the call is not rejected for balance
                    let mut overrides = StateOverride::default();
                    overrides.insert(
                        sim.sender,
                        AccountOverride {
                            balance: Some(sim.amount_in.saturating_mul(U256::from(2))),
                            ..Default::default()
                        },
                    );

                    IUniswapV2Router02::new(sim.router, provider)
                        .swapExactETHForTokensSupportingFeeOnTransferTokens(
                            U256::ZERO,
                            vec![sim.anchor, sim.token],
                            sim.sender,
                            U256::from(sim.deadline),
                        )
                        .from(sim.sender)
                        .value(sim.amount_in)
                        .state(overrides)
                        .call()
                        .await
                        .map(|_| ())
                        .map_err(|e| contract_attempt_error(METHOD, e))
                }
            })
            .await
    }

    fn endpoint_status(&self) -> Vec<EndpointStatus> {
        self.pool.snapshot()
    }
}
