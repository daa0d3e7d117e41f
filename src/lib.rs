pub mod alerts;
pub mod api;
pub mod config;
pub mod error;
pub mod indexer;
pub mod lookup;
pub mod pipeline;
pub mod pricing;
pub mod risk;
pub mod rpc;
pub mod tokens;
