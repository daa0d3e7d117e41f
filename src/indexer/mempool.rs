use alloy::primitives::Address;

use crate::alerts::ClassifiedEvent;
use crate::pricing::raw_to_human;
use crate::rpc::PendingTx;

/// Pending transactions sending more native value to the router than
/// `threshold_usd`. The native coin is valued at the anchor price, since the
/// anchor is its wrapped form.
pub fn whale_buys(
    txs: &[PendingTx],
    router: Address,
    anchor_decimals: u8,
    anchor_usd: f64,
    threshold_usd: f64,
) -> Vec<ClassifiedEvent> {
    txs.iter()
        .filter(|tx| tx.to == Some(router))
        .filter_map(|tx| {
            let usd_value = raw_to_human(tx.value, anchor_decimals) * anchor_usd;
            (usd_value > threshold_usd).then_some(ClassifiedEvent::MempoolWhaleBuy {
                from: tx.from,
                usd_value,
                tx_hash: tx.hash,
            })
        })
        .collect()
}
