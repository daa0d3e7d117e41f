use alloy::primitives::{Address, U256};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub chain: ChainConfig,
    pub dex: DexConfig,
    #[serde(default)]
    pub quote: QuoteConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub subscribers: Vec<SubscriberConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChainConfig {
    pub name: String,
    pub chain_id: u64,
    /// Ranked: earlier entries are always tried first.
    pub rpc_endpoints: Vec<String>,
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,
}

fn default_rpc_timeout_ms() -> u64 {
    4000
}

impl ChainConfig {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DexConfig {
    pub factory: String,
    pub router: String,
    /// Wrapped native asset every price is quoted through.
    pub anchor: String,
    #[serde(default = "default_anchor_decimals")]
    pub anchor_decimals: u8,
}

fn default_anchor_decimals() -> u8 {
    18
}

/// Parsed contract addresses, produced once at startup.
#[derive(Debug, Clone, Copy)]
pub struct DexAddresses {
    pub factory: Address,
    pub router: Address,
    pub anchor: Address,
}

impl DexConfig {
    pub fn addresses(&self) -> eyre::Result<DexAddresses> {
        Ok(DexAddresses {
            factory: parse_address("dex.factory", &self.factory)?,
            router: parse_address("dex.router", &self.router)?,
            anchor: parse_address("dex.anchor", &self.anchor)?,
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct QuoteConfig {
    /// HTTP endpoint returning the anchor's fiat price as JSON. Optional.
    pub url: Option<String>,
    #[serde(default = "default_json_pointer")]
    pub json_pointer: String,
    #[serde(default = "default_fallback_usd")]
    pub fallback_usd: f64,
    #[serde(default = "default_quote_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_quote_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            url: None,
            json_pointer: default_json_pointer(),
            fallback_usd: default_fallback_usd(),
            cache_ttl_secs: default_quote_ttl(),
            timeout_ms: default_quote_timeout_ms(),
        }
    }
}

fn default_json_pointer() -> String {
    "/pulsechain/usd".to_string()
}

fn default_fallback_usd() -> f64 {
    0.0000082
}

fn default_quote_ttl() -> u64 {
    60
}

fn default_quote_timeout_ms() -> u64 {
    3000
}

#[derive(Debug, Deserialize, Clone)]
pub struct RiskConfig {
    /// Size of the simulated buy, in whole anchor units.
    #[serde(default = "default_simulate_buy_units")]
    pub simulate_buy_units: u64,
    #[serde(default = "default_simulation_sender")]
    pub simulation_sender: String,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            simulate_buy_units: default_simulate_buy_units(),
            simulation_sender: default_simulation_sender(),
        }
    }
}

fn default_simulate_buy_units() -> u64 {
    1
}

fn default_simulation_sender() -> String {
    "0x000000000000000000000000000000000000dEaD".to_string()
}

impl RiskConfig {
    pub fn buy_amount(&self, anchor_decimals: u8) -> U256 {
        U256::from(self.simulate_buy_units) * U256::from(10u64).pow(U256::from(anchor_decimals))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertsConfig {
    #[serde(default = "default_whale_threshold")]
    pub whale_threshold_usd: f64,
    #[serde(default = "default_rug_threshold")]
    pub rug_threshold_usd: f64,
    #[serde(default = "default_whale_threshold")]
    pub mempool_threshold_usd: f64,
    #[serde(default = "default_seen_ttl")]
    pub seen_ttl_secs: u64,
    #[serde(default = "default_seen_capacity")]
    pub seen_capacity: usize,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            whale_threshold_usd: default_whale_threshold(),
            rug_threshold_usd: default_rug_threshold(),
            mempool_threshold_usd: default_whale_threshold(),
            seen_ttl_secs: default_seen_ttl(),
            seen_capacity: default_seen_capacity(),
        }
    }
}

fn default_whale_threshold() -> f64 {
    50_000.0
}

fn default_rug_threshold() -> f64 {
    10_000.0
}

fn default_seen_ttl() -> u64 {
    6 * 3600
}

fn default_seen_capacity() -> usize {
    100_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScannerConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    /// First block to scan. Defaults to the head at startup.
    pub start_block: Option<u64>,
    #[serde(default = "default_true")]
    pub mempool_watch: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            batch_size: default_batch_size(),
            start_block: None,
            mempool_watch: true,
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    10_000
}

fn default_batch_size() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_port")]
    pub port: u16,
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_api_port(),
            host: default_api_host(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
        }
    }
}

fn default_api_port() -> u16 {
    3000
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_lookup_timeout_ms() -> u64 {
    15_000
}

/// Where classified events go once they leave the dispatcher.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryConfig {
    /// Emit one structured log record per delivery.
    #[default]
    Log,
    /// POST each event as JSON to the subscriber's destination URL.
    Webhook {
        #[serde(default = "default_webhook_timeout_ms")]
        timeout_ms: u64,
    },
}

fn default_webhook_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Deserialize, Clone)]
pub struct SubscriberConfig {
    pub destination: String,
    #[serde(default)]
    pub watched_wallets: Vec<String>,
}

pub fn parse_address(field: &str, raw: &str) -> eyre::Result<Address> {
    if !raw.starts_with("0x") || raw.len() != 42 {
        return Err(eyre::eyre!("Invalid address '{}' for {}", raw, field));
    }
    Address::from_str(raw).map_err(|e| eyre::eyre!("Invalid address '{}' for {}: {}", raw, field, e))
}

impl Config {
    pub fn load(path: &str) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("Failed to read config file '{}': {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| eyre::eyre!("Failed to parse config file '{}': {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> eyre::Result<()> {
        if self.chain.rpc_endpoints.is_empty() {
            return Err(eyre::eyre!(
                "Chain '{}' must have at least one RPC endpoint configured",
                self.chain.name
            ));
        }
        for url in &self.chain.rpc_endpoints {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(eyre::eyre!("RPC endpoint '{}' must be an http(s) URL", url));
            }
        }
        if self.chain.rpc_timeout_ms == 0 {
            return Err(eyre::eyre!("chain.rpc_timeout_ms must be positive"));
        }

        self.dex.addresses()?;
        parse_address("risk.simulation_sender", &self.risk.simulation_sender)?;

        if self.scanner.batch_size == 0 {
            return Err(eyre::eyre!("scanner.batch_size must be positive"));
        }
        for (name, value) in [
            ("alerts.whale_threshold_usd", self.alerts.whale_threshold_usd),
            ("alerts.rug_threshold_usd", self.alerts.rug_threshold_usd),
            ("alerts.mempool_threshold_usd", self.alerts.mempool_threshold_usd),
            ("quote.fallback_usd", self.quote.fallback_usd),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(eyre::eyre!("{} must be a non-negative number, got {}", name, value));
            }
        }

        for subscriber in &self.subscribers {
            for wallet in &subscriber.watched_wallets {
                parse_address("subscribers.watched_wallets", wallet)?;
            }
        }
        Ok(())
    }
}
