//! Recording sink shared by dispatcher and scanner tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use super::sink::AlertSink;
use super::types::ClassifiedEvent;

#[derive(Default)]
pub struct RecordingSink {
    delivered: Mutex<Vec<(String, ClassifiedEvent)>>,
    failing: HashSet<String>,
}

impl RecordingSink {
    pub fn failing_for(destinations: &[&str]) -> Self {
        Self {
            delivered: Mutex::new(Vec::new()),
            failing: destinations.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Successful deliveries, sorted by destination.
    pub fn destinations(&self) -> Vec<String> {
        let mut destinations: Vec<_> = self
            .delivered
            .lock()
            .unwrap()
            .iter()
            .map(|(d, _)| d.clone())
            .collect();
        destinations.sort();
        destinations
    }

    pub fn events(&self) -> Vec<ClassifiedEvent> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .map(|(_, e)| e.clone())
            .collect()
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn deliver(&self, destination: &str, event: &ClassifiedEvent) -> eyre::Result<()> {
        if self.failing.contains(destination) {
            return Err(eyre::eyre!("destination {} blocked the bot", destination));
        }
        self.delivered
            .lock()
            .unwrap()
            .push((destination.to_string(), event.clone()));
        Ok(())
    }
}
