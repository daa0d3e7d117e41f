use alloy::primitives::{Address, B256, U256};
use serde::Serialize;

use crate::risk::RiskVerdict;
use crate::tokens::TokenInfo;

/// Direction of a swap from the non-anchor token's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDirection {
    Incoming,
    Outgoing,
}

/// A classified on-chain event, ready for delivery.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifiedEvent {
    NewLaunch {
        token: TokenInfo,
        pair: Address,
        risk: RiskVerdict,
        price_usd: String,
        block_number: u64,
        tx_hash: B256,
    },
    WhaleSwap {
        pair: Address,
        token: Address,
        side: SwapSide,
        usd_value: f64,
        block_number: u64,
        tx_hash: B256,
    },
    RugPull {
        pair: Address,
        token: Address,
        usd_value: f64,
        block_number: u64,
        tx_hash: B256,
    },
    WalletActivity {
        wallet: Address,
        token: Address,
        direction: TransferDirection,
        counterparty: Address,
        amount: U256,
        block_number: u64,
        tx_hash: B256,
    },
    /// Advisory only: pending transactions may vanish or reorder.
    MempoolWhaleBuy {
        from: Address,
        usd_value: f64,
        tx_hash: B256,
    },
}

impl ClassifiedEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewLaunch { .. } => "new_launch",
            Self::WhaleSwap { .. } => "whale_swap",
            Self::RugPull { .. } => "rug_pull",
            Self::WalletActivity { .. } => "wallet_activity",
            Self::MempoolWhaleBuy { .. } => "mempool_whale_buy",
        }
    }

    pub fn tx_hash(&self) -> B256 {
        match self {
            Self::NewLaunch { tx_hash, .. }
            | Self::WhaleSwap { tx_hash, .. }
            | Self::RugPull { tx_hash, .. }
            | Self::WalletActivity { tx_hash, .. }
            | Self::MempoolWhaleBuy { tx_hash, .. } => *tx_hash,
        }
    }

    /// `Some(wallet)` for events only that wallet's watchers should see.
    pub fn watched_wallet(&self) -> Option<Address> {
        match self {
            Self::WalletActivity { wallet, .. } => Some(*wallet),
            _ => None,
        }
    }
}
