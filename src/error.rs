use thiserror::Error;

/// Failure of a read against the chain, after the endpoint pool has done its job.
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    /// Every configured endpoint errored or timed out for this call.
    #[error("{method}: all {attempts} RPC endpoints exhausted")]
    RpcUnavailable { method: &'static str, attempts: usize },

    /// A node executed the call and it reverted. Every endpoint would agree.
    #[error("{method}: execution reverted: {reason}")]
    Reverted { method: &'static str, reason: String },

    /// Malformed ABI response or log payload.
    #[error("{method}: decode failure: {reason}")]
    Decode { method: &'static str, reason: String },

    /// A caller-specified deadline elapsed before the operation finished.
    #[error("{operation} timed out after {timeout_ms}ms")]
    TimedOut { operation: &'static str, timeout_ms: u64 },
}

impl ChainError {
    /// Transient errors are worth retrying on the next tick; the rest are
    /// properties of the data and will fail the same way again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RpcUnavailable { .. } | Self::TimedOut { .. })
    }
}
