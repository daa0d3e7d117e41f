pub mod dispatcher;
pub mod registry;
pub mod seen;
pub mod sink;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::{DispatchReport, Dispatcher};
pub use registry::{RegistryError, Subscriber, SubscriberId, WatchOutcome};
pub use sink::{build_sink, AlertSink, LogSink, WebhookSink};
pub use types::{ClassifiedEvent, SwapSide, TransferDirection};
