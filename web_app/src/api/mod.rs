//! # API Module
//!
//! This module contains the business logic of the inbox. Handlers in
//! `front/` and `webhook/` validate the input, call into these functions
//! and map their results to HTTP responses.
//!
//! ## Modules
//!
//! - [`conversation`] - Conversation reads, status updates and agent replies

pub mod conversation;
