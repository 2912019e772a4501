//! Core types and trait definitions for Pulse.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! storage backend, the WhatsApp transport and the dispatch services all
//! depend on it and meet through the traits in [`store`], [`transport`] and
//! [`metrics`].

pub mod error;
pub mod inbound;
pub mod insight;
pub mod metrics;
pub mod phone;
pub mod render;
pub mod store;
pub mod subscriber;
pub mod template;
pub mod transport;

pub use error::{Error, Result};
