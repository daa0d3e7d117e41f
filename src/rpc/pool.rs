use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::error::ChainError;

/// Why one attempt against one endpoint did not produce a value.
#[derive(Debug)]
pub enum AttemptError {
    /// Transport fault or node-side error another endpoint may not share.
    /// The pool moves on to the next endpoint.
    Unavailable(String),
    /// Deterministic answer (revert, undecodable data). Returned as-is.
    Final(ChainError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EndpointHealth {
    Ok,
    Degraded {
        last_failure: DateTime<Utc>,
        error: String,
    },
}

/// Point-in-time view of one endpoint, in rank order.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointStatus {
    pub url: String,
    pub health: EndpointHealth,
}

struct Endpoint<C> {
    url: String,
    client: C,
    health: Mutex<EndpointHealth>,
}

impl<C> Endpoint<C> {
    fn health(&self) -> MutexGuard<'_, EndpointHealth> {
        match self.health.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn mark_ok(&self) {
        let mut health = self.health();
        if *health != EndpointHealth::Ok {
            tracing::info!(endpoint = %self.url, "RPC endpoint recovered");
            *health = EndpointHealth::Ok;
        }
    }

    fn mark_degraded(&self, error: String) {
        *self.health() = EndpointHealth::Degraded {
            last_failure: Utc::now(),
            error,
        };
    }
}

/// Ranked list of long-lived RPC clients.
///
/// Every call walks the list in configured order and returns the first
/// success. Rank never changes at runtime; a failure only affects the call
/// that observed it (plus the health bookkeeping exposed by [`snapshot`]).
///
/// [`snapshot`]: EndpointPool::snapshot
pub struct EndpointPool<C> {
    endpoints: Vec<Endpoint<C>>,
    attempt_timeout: Duration,
}

impl<C: Clone> EndpointPool<C> {
    pub fn new(clients: Vec<(String, C)>, attempt_timeout: Duration) -> Self {
        let endpoints = clients
            .into_iter()
            .map(|(url, client)| Endpoint {
                url,
                client,
                health: Mutex::new(EndpointHealth::Ok),
            })
            .collect();
        Self {
            endpoints,
            attempt_timeout,
        }
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn snapshot(&self) -> Vec<EndpointStatus> {
        self.endpoints
            .iter()
            .map(|ep| EndpointStatus {
                url: ep.url.clone(),
                health: ep.health().clone(),
            })
            .collect()
    }

    /// Run `op` against each endpoint in rank order until one succeeds.
    ///
    /// Each attempt is bounded by the pool's attempt timeout, so the worst
    /// case is `len() * attempt_timeout`. There is no retry against the same
    /// endpoint.
    pub async fn call<T, F, Fut>(&self, method: &'static str, op: F) -> Result<T, ChainError>
    where
        F: Fn(C) -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
    {
        for (rank, endpoint) in self.endpoints.iter().enumerate() {
            let attempt = tokio::time::timeout(self.attempt_timeout, op(endpoint.client.clone())).await;

            let error = match attempt {
                Ok(Ok(value)) => {
                    endpoint.mark_ok();
                    return Ok(value);
                }
                Ok(Err(AttemptError::Final(err))) => {
                    // The node answered; the endpoint itself is fine.
                    endpoint.mark_ok();
                    return Err(err);
                }
                Ok(Err(AttemptError::Unavailable(msg))) => msg,
                Err(_) => format!("timed out after {}ms", self.attempt_timeout.as_millis()),
            };

            tracing::warn!(
                method,
                endpoint = %endpoint.url,
                rank,
                error = %error,
                "RPC attempt failed, trying next endpoint"
            );
            endpoint.mark_degraded(error);
        }

        Err(ChainError::RpcUnavailable {
            method,
            attempts: self.endpoints.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone)]
    struct FakeNode {
        id: usize,
        healthy: bool,
        hangs: bool,
    }

    fn node(id: usize, healthy: bool) -> (String, FakeNode) {
        (
            format!("http://node-{id}"),
            FakeNode {
                id,
                healthy,
                hangs: false,
            },
        )
    }

    async fn answer(node: FakeNode) -> Result<usize, AttemptError> {
        if node.hangs {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        if node.healthy {
            Ok(node.id)
        } else {
            Err(AttemptError::Unavailable(format!("node {} refused", node.id)))
        }
    }

    #[tokio::test]
    async fn test_first_healthy_endpoint_wins() {
        let pool = EndpointPool::new(vec![node(0, true), node(1, true)], Duration::from_secs(1));
        let result = pool.call("eth_blockNumber", answer).await.unwrap();
        assert_eq!(result, 0);
    }

    #[tokio::test]
    async fn test_fails_over_past_k_broken_endpoints() {
        let pool = EndpointPool::new(
            vec![node(0, false), node(1, false), node(2, false), node(3, true), node(4, true)],
            Duration::from_secs(1),
        );
        let result = pool.call("eth_blockNumber", answer).await.unwrap();
        assert_eq!(result, 3);

        let snapshot = pool.snapshot();
        assert!(matches!(snapshot[0].health, EndpointHealth::Degraded { .. }));
        assert!(matches!(snapshot[2].health, EndpointHealth::Degraded { .. }));
        assert_eq!(snapshot[3].health, EndpointHealth::Ok);
        // Rank order is untouched by failures
        assert_eq!(snapshot[0].url, "http://node-0");
    }

    #[tokio::test]
    async fn test_all_endpoints_down_is_rpc_unavailable() {
        let pool = EndpointPool::new(vec![node(0, false), node(1, false)], Duration::from_secs(1));
        let err = pool.call("getReserves", answer).await.unwrap_err();
        match err {
            ChainError::RpcUnavailable { method, attempts } => {
                assert_eq!(method, "getReserves");
                assert_eq!(attempts, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_hung_endpoint_is_bounded_by_timeout() {
        let (url, mut hung) = node(0, true);
        hung.hangs = true;
        let pool = EndpointPool::new(vec![(url, hung), node(1, true)], Duration::from_millis(50));

        let started = std::time::Instant::now();
        let result = pool.call("eth_call", answer).await.unwrap();
        assert_eq!(result, 1);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_final_error_does_not_fail_over() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pool = EndpointPool::new(vec![node(0, true), node(1, true)], Duration::from_secs(1));

        let counter = calls.clone();
        let err = pool
            .call("swapExactETHForTokens", move |_node: FakeNode| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(AttemptError::Final(ChainError::Reverted {
                        method: "swapExactETHForTokens",
                        reason: "TRANSFER_FAILED".to_string(),
                    }))
                }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ChainError::Reverted { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovered_endpoint_reports_ok() {
        let pool = EndpointPool::new(vec![node(0, false), node(1, true)], Duration::from_secs(1));
        pool.call("eth_blockNumber", answer).await.unwrap();
        assert!(matches!(pool.snapshot()[0].health, EndpointHealth::Degraded { .. }));

        // Same URL, now answering
        let pool_ok = EndpointPool::new(vec![node(0, true)], Duration::from_secs(1));
        pool_ok.endpoints[0].mark_degraded("earlier failure".to_string());
        pool_ok.call("eth_blockNumber", answer).await.unwrap();
        assert_eq!(pool_ok.snapshot()[0].health, EndpointHealth::Ok);
    }
}
