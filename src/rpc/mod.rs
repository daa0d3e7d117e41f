pub mod client;
pub mod pool;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{connect_pool, ChainClient, PooledChain};
pub use pool::{AttemptError, EndpointHealth, EndpointPool, EndpointStatus};
pub use types::{BuySimulation, PendingTx, Reserves};
