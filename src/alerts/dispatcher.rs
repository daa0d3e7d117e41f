use alloy::primitives::Address;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::registry::{RegistryError, Subscriber, SubscriberId, SubscriberRegistry, WatchOutcome};
use super::seen::SeenSet;
use super::sink::AlertSink;
use super::types::ClassifiedEvent;

/// Outcome of one [`Dispatcher::dispatch`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
    /// Dropped as a duplicate of an already-alerted transaction.
    pub suppressed: bool,
}

/// Owns subscriber and dedup state and fans events out to the sink.
///
/// Whale swaps and mempool notices are gated by separate seen sets, so an
/// advisory mempool notice never swallows the confirmed swap alert.
pub struct Dispatcher {
    registry: Mutex<SubscriberRegistry>,
    whale_seen: SeenSet,
    mempool_seen: SeenSet,
    sink: Arc<dyn AlertSink>,
}

impl Dispatcher {
    pub fn new(sink: Arc<dyn AlertSink>, seen_ttl: Duration, seen_capacity: usize) -> Self {
        Self {
            registry: Mutex::new(SubscriberRegistry::new()),
            whale_seen: SeenSet::new(seen_ttl, seen_capacity),
            mempool_seen: SeenSet::new(seen_ttl, seen_capacity),
            sink,
        }
    }

    pub async fn subscribe(&self, destination: &str) -> SubscriberId {
        self.registry.lock().await.subscribe(destination)
    }

    pub async fn watch_wallet(&self, id: SubscriberId, wallet: Address) -> Result<WatchOutcome, RegistryError> {
        self.registry.lock().await.watch_wallet(id, wallet)
    }

    pub async fn unwatch_wallet(&self, id: SubscriberId, wallet: Address) -> Result<bool, RegistryError> {
        self.registry.lock().await.unwatch_wallet(id, wallet)
    }

    pub async fn subscriber(&self, id: SubscriberId) -> Option<Subscriber> {
        self.registry.lock().await.get(id).cloned()
    }

    pub async fn watched_wallets(&self) -> HashSet<Address> {
        self.registry.lock().await.watched_wallets()
    }

    /// Deliver `event` to every interested subscriber. A failing destination
    /// is logged and does not affect the others.
    pub async fn dispatch(&self, event: &ClassifiedEvent) -> DispatchReport {
        let fresh = match event {
            ClassifiedEvent::WhaleSwap { tx_hash, .. } => self.whale_seen.insert(*tx_hash).await,
            ClassifiedEvent::MempoolWhaleBuy { tx_hash, .. } => self.mempool_seen.insert(*tx_hash).await,
            _ => true,
        };
        if !fresh {
            tracing::debug!(
                kind = event.as_str(),
                tx_hash = %event.tx_hash(),
                "Duplicate alert suppressed"
            );
            return DispatchReport {
                suppressed: true,
                ..Default::default()
            };
        }

        // Snapshot recipients so the lock is not held across delivery
        let recipients = self.registry.lock().await.recipients(event);
        if recipients.is_empty() {
            tracing::debug!(kind = event.as_str(), "No subscribers for event");
            return DispatchReport::default();
        }

        let deliveries = recipients.iter().map(|(id, destination)| async move {
            (*id, destination, self.sink.deliver(destination, event).await)
        });

        let mut report = DispatchReport::default();
        for (id, destination, result) in join_all(deliveries).await {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        subscriber = id,
                        destination = %destination,
                        kind = event.as_str(),
                        error = %e,
                        "Alert delivery failed"
                    );
                }
            }
        }

        tracing::info!(
            kind = event.as_str(),
            tx_hash = %event.tx_hash(),
            delivered = report.delivered,
            failed = report.failed,
            "Alert dispatched"
        );
        report
    }
}
