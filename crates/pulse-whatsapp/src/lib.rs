//! WhatsApp Business Cloud API integration.
//!
//! - [`WhatsAppClient`] implements [`pulse_core::transport::Transport`] over
//!   the Graph API `/{phone_number_id}/messages` endpoint.
//! - [`webhook`] holds the inbound webhook envelope and lifts it into
//!   [`pulse_core::inbound::InboundMessage`]s.

mod client;
mod payload;

pub mod error;
pub mod webhook;

pub use client::{PhoneNumberInfo, WhatsAppClient, WhatsAppConfig};
pub use error::{Error, Result};
