//! SQLite backend for Pulse.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Provides the subscriber/snapshot
//! store and a live metric source over a CRM database.

mod crm;
mod encode;
mod schema;
mod store;

pub mod error;

pub use crm::CrmMetrics;
pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
