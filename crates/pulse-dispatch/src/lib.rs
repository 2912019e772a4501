//! Message dispatch and command routing.
//!
//! Every service here is generic over the traits in `pulse-core`, so the same
//! code runs against SQLite and the Graph API in production and against
//! in-memory fakes in tests.
//!
//! - [`Resolver`]: phone lookup, registration and activation toggles.
//! - [`Bridge`]: builds, stores and renders insight snapshots.
//! - [`Dispatcher`]: one message to one recipient.
//! - [`Batch`]: one sequential delivery pass over the active subscribers.
//! - [`CommandRouter`]: single-turn handling of inbound messages.

pub mod batch;
pub mod bridge;
pub mod dispatcher;
pub mod error;
pub mod resolver;
pub mod router;

pub use batch::{Batch, BatchConfig, DeliveryMode, DeliveryReport};
pub use bridge::Bridge;
pub use dispatcher::Dispatcher;
pub use error::{Error, Result};
pub use resolver::Resolver;
pub use router::{CommandRouter, RouteOutcome};
