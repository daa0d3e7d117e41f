use alloy::primitives::{Address, B256, U256};

/// Raw reserves of a V2 pair, in `token0`/`token1` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reserves {
    pub reserve0: U256,
    pub reserve1: U256,
}

/// A transaction sitting in the node's pending block.
#[derive(Debug, Clone)]
pub struct PendingTx {
    pub hash: B256,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
}

/// Parameters for a read-only buy through the router.
#[derive(Debug, Clone)]
pub struct BuySimulation {
    pub router: Address,
    pub anchor: Address,
    pub token: Address,
    pub sender: Address,
    pub amount_in: U256,
    pub deadline: u64,
}
