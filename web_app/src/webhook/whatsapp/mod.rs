//! WhatsApp webhook integration module
//!
//! ## Submodules
//!
//! - [`handler`] - Stores incoming messages of a verified payload
//! - [`routes`] - HTTP endpoint handlers for WhatsApp webhooks
//! - [`schemas`] - Incoming webhook payloads
//! - [`outgoing_schemas`] - Payloads sent to the Cloud API
//! - [`security`] - `X-Hub-Signature-256` verification
//! - [`client`] - WhatsApp API client for sending messages

pub mod client;
pub mod handler;
pub mod outgoing_schemas;
pub mod routes;
pub mod schemas;
pub mod security;

// Re-export commonly used items for convenience
pub use routes::{receive, verify};
