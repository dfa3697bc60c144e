//! Tick streaming: subscriber registry, bindings table, and the feed context.

pub mod bindings;
pub mod feed;
pub mod registry;

pub use bindings::Bindings;
pub use feed::{RandomStreamOptions, TelemetryFeed};
pub use registry::{Subscriber, SubscriberRegistry, Subscription};
