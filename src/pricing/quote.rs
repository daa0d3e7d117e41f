use bigdecimal::{BigDecimal, FromPrimitive, Zero};
use serde_json::Value;
use std::str::FromStr;
use moka::future::Cache;
use std::time::Duration;
use thiserror::Error;

use crate::config::QuoteConfig;

/// Why the external quote could not be used. Never surfaces past
/// [`AnchorQuoteSource::anchor_usd`]; it only feeds the fallback log line.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("quote request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("no value at '{0}' in quote response")]
    Missing(String),
    #[error("malformed quote value: {0}")]
    Malformed(String),
}

/// Fiat price of the anchor asset, from an optional HTTP quote service with
/// a static fallback. Results (including fallbacks) are cached for a TTL.
pub struct AnchorQuoteSource {
    http: reqwest::Client,
    url: Option<String>,
    json_pointer: String,
    fallback: BigDecimal,
    cached: Cache<(), BigDecimal>,
}

fn quote_cache(ttl: Duration) -> Cache<(), BigDecimal> {
    Cache::builder().max_capacity(1).time_to_live(ttl).build()
}

impl AnchorQuoteSource {
    pub fn from_config(config: &QuoteConfig) -> eyre::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| eyre::eyre!("Failed to build quote HTTP client: {}", e))?;
        let fallback = BigDecimal::from_f64(config.fallback_usd)
            .ok_or_else(|| eyre::eyre!("Invalid quote.fallback_usd {}", config.fallback_usd))?;

        Ok(Self {
            http,
            url: config.url.clone(),
            json_pointer: config.json_pointer.clone(),
            fallback,
            cached: quote_cache(Duration::from_secs(config.cache_ttl_secs)),
        })
    }

    /// Quote source that never leaves the process.
    pub fn fixed(price: BigDecimal) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: None,
            json_pointer: String::new(),
            fallback: price,
            cached: quote_cache(Duration::ZERO),
        }
    }

    pub fn fallback(&self) -> &BigDecimal {
        &self.fallback
    }

    /// Never fails: any fetch or parse problem degrades to the fallback.
    pub async fn anchor_usd(&self) -> BigDecimal {
        let Some(url) = &self.url else {
            return self.fallback.clone();
        };

        // Concurrent callers share one in-flight refresh
        self.cached.get_with((), self.refresh(url)).await
    }

    async fn refresh(&self, url: &str) -> BigDecimal {
        match self.fetch(url).await {
            Ok(price) => {
                tracing::debug!(%price, "Anchor quote refreshed");
                price
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fallback = %self.fallback,
                    "Anchor quote unavailable, using fallback price"
                );
                self.fallback.clone()
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<BigDecimal, QuoteError> {
        let body: Value = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        parse_quote(&body, &self.json_pointer)
    }
}

/// Extract a positive price at `pointer`, accepting JSON numbers or numeric strings.
pub fn parse_quote(body: &Value, pointer: &str) -> Result<BigDecimal, QuoteError> {
    let value = body
        .pointer(pointer)
        .ok_or_else(|| QuoteError::Missing(pointer.to_string()))?;

    let price = match value {
        Value::Number(n) => BigDecimal::from_str(&n.to_string())
            .map_err(|e| QuoteError::Malformed(e.to_string()))?,
        Value::String(s) => {
            BigDecimal::from_str(s.trim()).map_err(|e| QuoteError::Malformed(e.to_string()))?
        }
        other => return Err(QuoteError::Malformed(other.to_string())),
    };

    if price <= BigDecimal::zero() {
        return Err(QuoteError::Malformed(format!("non-positive price {}", price)));
    }
    Ok(price)
}
