use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::types::ClassifiedEvent;
use crate::config::DeliveryConfig;

/// Hands a classified event to the messaging layer for one destination.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, destination: &str, event: &ClassifiedEvent) -> eyre::Result<()>;
}

/// Writes each delivery as a structured log record.
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    async fn deliver(&self, destination: &str, event: &ClassifiedEvent) -> eyre::Result<()> {
        let payload = serde_json::to_string(event)?;
        tracing::info!(
            destination,
            kind = event.as_str(),
            tx_hash = %event.tx_hash(),
            payload = %payload,
            "ALERT"
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookEnvelope<'a> {
    sent_at: DateTime<Utc>,
    event: &'a ClassifiedEvent,
}

/// POSTs each event as JSON to the destination URL.
pub struct WebhookSink {
    http: reqwest::Client,
}

impl WebhookSink {
    pub fn new(timeout: Duration) -> eyre::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| eyre::eyre!("Failed to build webhook HTTP client: {}", e))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    async fn deliver(&self, destination: &str, event: &ClassifiedEvent) -> eyre::Result<()> {
        let envelope = WebhookEnvelope {
            sent_at: Utc::now(),
            event,
        };
        self.http
            .post(destination)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| eyre::eyre!("Webhook request to '{}' failed: {}", destination, e))?
            .error_for_status()
            .map_err(|e| eyre::eyre!("Webhook '{}' rejected alert: {}", destination, e))?;
        Ok(())
    }
}

pub fn build_sink(config: &DeliveryConfig) -> eyre::Result<Arc<dyn AlertSink>> {
    match config {
        DeliveryConfig::Log => Ok(Arc::new(LogSink)),
        DeliveryConfig::Webhook { timeout_ms } => {
            Ok(Arc::new(WebhookSink::new(Duration::from_millis(*timeout_ms))?))
        }
    }
}
