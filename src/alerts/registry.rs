use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use super::types::ClassifiedEvent;

pub type SubscriberId = u64;

#[derive(Debug, Clone, Serialize)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub destination: String,
    pub watched_wallets: HashSet<Address>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchOutcome {
    Added,
    AlreadyTracking,
}

impl WatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::AlreadyTracking => "already_tracking",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown subscriber {0}")]
    UnknownSubscriber(SubscriberId),
}

/// Process-lifetime subscriber table. Not synchronized; the dispatcher owns
/// it behind a mutex.
#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: SubscriberId,
    by_id: HashMap<SubscriberId, Subscriber>,
    by_destination: HashMap<String, SubscriberId>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `destination`, or return its existing id.
    pub fn subscribe(&mut self, destination: &str) -> SubscriberId {
        if let Some(id) = self.by_destination.get(destination) {
            return *id;
        }

        self.next_id += 1;
        let id = self.next_id;
        self.by_id.insert(
            id,
            Subscriber {
                id,
                destination: destination.to_string(),
                watched_wallets: HashSet::new(),
                created_at: Utc::now(),
            },
        );
        self.by_destination.insert(destination.to_string(), id);
        tracing::info!(subscriber = id, destination, "Subscriber registered");
        id
    }

    pub fn watch_wallet(&mut self, id: SubscriberId, wallet: Address) -> Result<WatchOutcome, RegistryError> {
        let subscriber = self
            .by_id
            .get_mut(&id)
            .ok_or(RegistryError::UnknownSubscriber(id))?;

        if subscriber.watched_wallets.insert(wallet) {
            tracing::info!(subscriber = id, wallet = %wallet, "Wallet watch added");
            Ok(WatchOutcome::Added)
        } else {
            Ok(WatchOutcome::AlreadyTracking)
        }
    }

    /// Returns whether the wallet was being watched.
    pub fn unwatch_wallet(&mut self, id: SubscriberId, wallet: Address) -> Result<bool, RegistryError> {
        let subscriber = self
            .by_id
            .get_mut(&id)
            .ok_or(RegistryError::UnknownSubscriber(id))?;
        Ok(subscriber.watched_wallets.remove(&wallet))
    }

    pub fn get(&self, id: SubscriberId) -> Option<&Subscriber> {
        self.by_id.get(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Union of every subscriber's watch set.
    pub fn watched_wallets(&self) -> HashSet<Address> {
        self.by_id
            .values()
            .flat_map(|s| s.watched_wallets.iter().copied())
            .collect()
    }

    /// `(id, destination)` of every subscriber interested in `event`.
    pub fn recipients(&self, event: &ClassifiedEvent) -> Vec<(SubscriberId, String)> {
        let mut recipients: Vec<_> = match event.watched_wallet() {
            Some(wallet) => self
                .by_id
                .values()
                .filter(|s| s.watched_wallets.contains(&wallet))
                .map(|s| (s.id, s.destination.clone()))
                .collect(),
            None => self
                .by_id
                .values()
                .map(|s| (s.id, s.destination.clone()))
                .collect(),
        };
        recipients.sort_by_key(|(id, _)| *id);
        recipients
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::types::TransferDirection;
    use alloy::primitives::{B256, U256};

    fn wallet(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn activity(w: Address) -> ClassifiedEvent {
        ClassifiedEvent::WalletActivity {
            wallet: w,
            token: wallet(0x01),
            direction: TransferDirection::Outgoing,
            counterparty: wallet(0x02),
            amount: U256::from(1u64),
            block_number: 10,
            tx_hash: B256::repeat_byte(0x0c),
        }
    }

    #[test]
    fn test_subscribe_is_stable_per_destination() {
        let mut registry = SubscriberRegistry::new();
        let a = registry.subscribe("chat:1");
        let b = registry.subscribe("chat:2");
        assert_ne!(a, b);
        assert_eq!(registry.subscribe("chat:1"), a);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_watch_wallet_is_idempotent() {
        let mut registry = SubscriberRegistry::new();
        let id = registry.subscribe("chat:1");

        assert_eq!(registry.watch_wallet(id, wallet(0x77)), Ok(WatchOutcome::Added));
        assert_eq!(registry.watch_wallet(id, wallet(0x77)), Ok(WatchOutcome::AlreadyTracking));
        assert_eq!(registry.get(id).unwrap().watched_wallets.len(), 1);
    }

    #[test]
    fn test_watch_unknown_subscriber() {
        let mut registry = SubscriberRegistry::new();
        assert_eq!(
            registry.watch_wallet(42, wallet(0x77)),
            Err(RegistryError::UnknownSubscriber(42))
        );
    }

    #[test]
    fn test_unwatch_wallet() {
        let mut registry = SubscriberRegistry::new();
        let id = registry.subscribe("chat:1");
        registry.watch_wallet(id, wallet(0x77)).unwrap();
        assert_eq!(registry.unwatch_wallet(id, wallet(0x77)), Ok(true));
        assert_eq!(registry.unwatch_wallet(id, wallet(0x77)), Ok(false));
        assert!(registry.watched_wallets().is_empty());
    }

    #[test]
    fn test_wallet_activity_reaches_only_watchers() {
        let mut registry = SubscriberRegistry::new();
        let a = registry.subscribe("chat:a");
        let b = registry.subscribe("chat:b");
        let c = registry.subscribe("chat:c");
        registry.watch_wallet(a, wallet(0x77)).unwrap();
        registry.watch_wallet(c, wallet(0x77)).unwrap();
        registry.watch_wallet(b, wallet(0x88)).unwrap();

        let ids: Vec<_> = registry
            .recipients(&activity(wallet(0x77)))
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec![a, c]);

        assert!(registry.recipients(&activity(wallet(0x99))).is_empty());
        assert_eq!(
            registry.watched_wallets(),
            HashSet::from([wallet(0x77), wallet(0x88)])
        );
    }

    #[test]
    fn test_broadcast_events_reach_everyone() {
        let mut registry = SubscriberRegistry::new();
        registry.subscribe("chat:a");
        registry.subscribe("chat:b");
        let event = ClassifiedEvent::MempoolWhaleBuy {
            from: wallet(0x11),
            usd_value: 75_000.0,
            tx_hash: B256::ZERO,
        };
        assert_eq!(registry.recipients(&event).len(), 2);
    }
}
