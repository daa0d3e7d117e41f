use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskReason {
    #[serde(rename = "No liquidity")]
    NoLiquidity,
    #[serde(rename = "Buy blocked")]
    BuyBlocked,
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "RPC error")]
    RpcError,
}

impl RiskReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoLiquidity => "No liquidity",
            Self::BuyBlocked => "Buy blocked",
            Self::Ok => "OK",
            Self::RpcError => "RPC error",
        }
    }
}

/// Coarse tax readout. The simulation only observes pass/fail, so these are
/// bands, not measured percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaxBand {
    #[serde(rename = "<5%")]
    Low,
    #[serde(rename = "≈99%")]
    Blocked,
    #[serde(rename = "100%")]
    Total,
    #[serde(rename = "?")]
    Unknown,
}

impl TaxBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "<5%",
            Self::Blocked => "≈99%",
            Self::Total => "100%",
            Self::Unknown => "?",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskVerdict {
    pub is_honeypot: bool,
    pub reason: RiskReason,
    pub buy_tax: TaxBand,
    pub sell_tax: TaxBand,
}

impl RiskVerdict {
    /// No market at all counts as maximal risk.
    pub fn no_liquidity() -> Self {
        Self {
            is_honeypot: true,
            reason: RiskReason::NoLiquidity,
            buy_tax: TaxBand::Total,
            sell_tax: TaxBand::Total,
        }
    }

    pub fn buy_blocked() -> Self {
        Self {
            is_honeypot: true,
            reason: RiskReason::BuyBlocked,
            buy_tax: TaxBand::Blocked,
            sell_tax: TaxBand::Blocked,
        }
    }

    pub fn tradable() -> Self {
        Self {
            is_honeypot: false,
            reason: RiskReason::Ok,
            buy_tax: TaxBand::Low,
            sell_tax: TaxBand::Low,
        }
    }

    /// The chain could not be queried: report unsafe, never safe.
    pub fn rpc_error() -> Self {
        Self {
            is_honeypot: true,
            reason: RiskReason::RpcError,
            buy_tax: TaxBand::Unknown,
            sell_tax: TaxBand::Unknown,
        }
    }
}
