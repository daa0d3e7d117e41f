use alloy::primitives::{Address, B256, U256};
use alloy::rpc::types::Log;
use alloy::sol;
use alloy::sol_types::SolEvent;

// Factory, pair and ERC-20 events the scanner subscribes to.
sol! {
    event PairCreated(address indexed token0, address indexed token1, address pair, uint256 pairIndex);

    event Swap(
        address indexed sender,
        uint256 amount0In,
        uint256 amount1In,
        uint256 amount0Out,
        uint256 amount1Out,
        address indexed to
    );

    event Burn(address indexed sender, uint256 amount0, uint256 amount1, address indexed to);

    event Transfer(address indexed from, address indexed to, uint256 value);
}

/// Topic0 values to request from `eth_getLogs`. `Transfer` is only asked
/// for when some wallet is watched, since it matches every token transfer.
pub fn signatures(include_transfers: bool) -> Vec<B256> {
    let mut signatures = vec![
        PairCreated::SIGNATURE_HASH,
        Swap::SIGNATURE_HASH,
        Burn::SIGNATURE_HASH,
    ];
    if include_transfers {
        signatures.push(Transfer::SIGNATURE_HASH);
    }
    signatures
}

/// A log recognised as one of the monitored events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedLog {
    PairCreated {
        token0: Address,
        token1: Address,
        pair: Address,
    },
    Swap {
        pair: Address,
        amount0_in: U256,
        amount1_in: U256,
        amount0_out: U256,
        amount1_out: U256,
    },
    Burn {
        pair: Address,
        amount0: U256,
        amount1: U256,
    },
    Transfer {
        token: Address,
        from: Address,
        to: Address,
        value: U256,
    },
}

/// Where a log sits in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogMeta {
    pub block_number: u64,
    pub tx_hash: B256,
    pub log_index: u64,
}

impl LogMeta {
    pub fn from_log(log: &Log) -> Self {
        Self {
            block_number: log.block_number.unwrap_or(0),
            tx_hash: log.transaction_hash.unwrap_or_default(),
            log_index: log.log_index.unwrap_or(0),
        }
    }
}

/// Decode a log by topic0.
///
/// Returns `None` if:
/// - topic0 is not a monitored signature
/// - a `PairCreated` was not emitted by `factory` (anyone can emit that topic)
/// - a `Transfer` does not carry exactly 3 topics (ERC-721 shares the signature)
/// - the payload does not decode
pub fn decode_log(log: &Log, factory: Address) -> Option<(DecodedLog, LogMeta)> {
    let topics = log.inner.data.topics();
    let sig = *topics.first()?;
    let emitter = log.inner.address;

    let decoded = if sig == PairCreated::SIGNATURE_HASH {
        if emitter != factory {
            return None;
        }
        let event = decode_event::<PairCreated>(log)?;
        DecodedLog::PairCreated {
            token0: event.token0,
            token1: event.token1,
            pair: event.pair,
        }
    } else if sig == Swap::SIGNATURE_HASH {
        let event = decode_event::<Swap>(log)?;
        DecodedLog::Swap {
            pair: emitter,
            amount0_in: event.amount0In,
            amount1_in: event.amount1In,
            amount0_out: event.amount0Out,
            amount1_out: event.amount1Out,
        }
    } else if sig == Burn::SIGNATURE_HASH {
        let event = decode_event::<Burn>(log)?;
        DecodedLog::Burn {
            pair: emitter,
            amount0: event.amount0,
            amount1: event.amount1,
        }
    } else if sig == Transfer::SIGNATURE_HASH {
        if topics.len() != 3 {
            return None;
        }
        let event = decode_event::<Transfer>(log)?;
        DecodedLog::Transfer {
            token: emitter,
            from: event.from,
            to: event.to,
            value: event.value,
        }
    } else {
        return None;
    };

    Some((decoded, LogMeta::from_log(log)))
}

/// A monitored topic whose payload is malformed is logged, then skipped.
fn decode_event<E: SolEvent>(log: &Log) -> Option<alloy::primitives::Log<E>> {
    match E::decode_log(&log.inner) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!(
                event = E::SIGNATURE,
                emitter = %log.inner.address,
                tx_hash = ?log.transaction_hash,
                error = %e,
                "Monitored event failed to decode"
            );
            None
        }
    }
}
