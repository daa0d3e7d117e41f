//! In-memory chain used by unit tests across the crate.

use alloy::primitives::{Address, B256, U256};
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::client::ChainClient;
use super::types::{BuySimulation, PendingTx, Reserves};
use crate::error::ChainError;

pub fn addr(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

pub fn hash(byte: u8) -> B256 {
    B256::repeat_byte(byte)
}

pub fn ether(units: u64) -> U256 {
    U256::from(units) * U256::from(10u64).pow(U256::from(18))
}

/// Wrap an encoded event into an RPC log as a node would return it.
pub fn rpc_log<E: SolEvent>(emitter: Address, event: &E, block: u64, tx_hash: B256) -> Log {
    Log {
        inner: alloy::primitives::Log {
            address: emitter,
            data: event.encode_log_data(),
        },
        block_number: Some(block),
        transaction_hash: Some(tx_hash),
        log_index: Some(0),
        ..Default::default()
    }
}

struct FakePool {
    token0: Address,
    token1: Address,
    reserves: Reserves,
}

#[derive(Default)]
pub struct FakeChain {
    offline: AtomicBool,
    stalled: AtomicBool,
    head: Mutex<u64>,
    logs: Mutex<Vec<Log>>,
    pending: Mutex<Vec<PendingTx>>,
    pairs: Mutex<HashMap<(Address, Address), Address>>,
    pools: Mutex<HashMap<Address, FakePool>>,
    metadata: Mutex<HashMap<Address, (String, String)>>,
    blocked: Mutex<HashSet<Address>>,
    pub log_queries: Mutex<Vec<(u64, u64)>>,
}

impl FakeChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_online(&self, method: &'static str) -> Result<(), ChainError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ChainError::RpcUnavailable {
                method,
                attempts: 2,
            });
        }
        Ok(())
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make pair lookups hang forever, as an unresponsive node would.
    pub fn stall(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    pub fn set_head(&self, head: u64) {
        *self.head.lock().unwrap() = head;
    }

    pub fn push_log(&self, log: Log) {
        self.logs.lock().unwrap().push(log);
    }

    pub fn push_pending(&self, tx: PendingTx) {
        self.pending.lock().unwrap().push(tx);
    }

    /// Register a V2 pair: factory lookup in both orders plus its reserves.
    pub fn add_pair(&self, pair: Address, token0: Address, token1: Address, reserve0: U256, reserve1: U256) {
        let mut pairs = self.pairs.lock().unwrap();
        pairs.insert((token0, token1), pair);
        pairs.insert((token1, token0), pair);
        self.pools.lock().unwrap().insert(
            pair,
            FakePool {
                token0,
                token1,
                reserves: Reserves { reserve0, reserve1 },
            },
        );
    }

    pub fn set_metadata(&self, token: Address, name: &str, symbol: &str) {
        self.metadata
            .lock()
            .unwrap()
            .insert(token, (name.to_string(), symbol.to_string()));
    }

    pub fn block_buys(&self, token: Address) {
        self.blocked.lock().unwrap().insert(token);
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn block_number(&self) -> Result<u64, ChainError> {
        self.check_online("eth_blockNumber")?;
        Ok(*self.head.lock().unwrap())
    }

    async fn logs(&self, from_block: u64, to_block: u64, signatures: &[B256]) -> Result<Vec<Log>, ChainError> {
        self.check_online("eth_getLogs")?;
        self.log_queries.lock().unwrap().push((from_block, to_block));
        let logs = self.logs.lock().unwrap();
        Ok(logs
            .iter()
            .filter(|log| {
                let block = log.block_number.unwrap_or(0);
                let topic0 = log.inner.data.topics().first().copied();
                block >= from_block
                    && block <= to_block
                    && topic0.map(|t| signatures.contains(&t)).unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn pending_transactions(&self) -> Result<Vec<PendingTx>, ChainError> {
        self.check_online("eth_getBlockByNumber(pending)")?;
        Ok(self.pending.lock().unwrap().clone())
    }

    async fn get_pair(&self, _factory: Address, token_a: Address, token_b: Address) -> Result<Address, ChainError> {
        self.check_online("getPair")?;
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(self
            .pairs
            .lock()
            .unwrap()
            .get(&(token_a, token_b))
            .copied()
            .unwrap_or(Address::ZERO))
    }

    async fn reserves(&self, pair: Address) -> Result<Reserves, ChainError> {
        self.check_online("getReserves")?;
        self.pools
            .lock()
            .unwrap()
            .get(&pair)
            .map(|p| p.reserves)
            .ok_or(ChainError::Decode {
                method: "getReserves",
                reason: "no contract".to_string(),
            })
    }

    async fn token0(&self, pair: Address) -> Result<Address, ChainError> {
        Ok(self.pair_tokens(pair).await?.0)
    }

    async fn pair_tokens(&self, pair: Address) -> Result<(Address, Address), ChainError> {
        self.check_online("token0")?;
        self.pools
            .lock()
            .unwrap()
            .get(&pair)
            .map(|p| (p.token0, p.token1))
            .ok_or(ChainError::Decode {
                method: "token0",
                reason: "no contract".to_string(),
            })
    }

    async fn token_name(&self, token: Address) -> Result<String, ChainError> {
        self.check_online("name")?;
        self.metadata
            .lock()
            .unwrap()
            .get(&token)
            .map(|(name, _)| name.clone())
            .ok_or(ChainError::Decode {
                method: "name",
                reason: "empty return data".to_string(),
            })
    }

    async fn token_symbol(&self, token: Address) -> Result<String, ChainError> {
        self.check_online("symbol")?;
        self.metadata
            .lock()
            .unwrap()
            .get(&token)
            .map(|(_, symbol)| symbol.clone())
            .ok_or(ChainError::Decode {
                method: "symbol",
                reason: "empty return data".to_string(),
            })
    }

    async fn simulate_buy(&self, sim: &BuySimulation) -> Result<(), ChainError> {
        self.check_online("swapExactETHForTokensSupportingFeeOnTransferTokens")?;
        if self.blocked.lock().unwrap().contains(&sim.token) {
            return Err(ChainError::Reverted {
                method: "swapExactETHForTokensSupportingFeeOnTransferTokens",
                reason: "execution reverted: TRANSFER_FAILED".to_string(),
            });
        }
        Ok(())
    }
}
