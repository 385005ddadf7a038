//! Toqan AI conversation API client.
//!
//! This crate provides the transport layer for talking to the Toqan AI
//! backend. It supports:
//!
//! - Creating and continuing conversations (optionally with attached files)
//! - Fetching the answer for a submitted request
//! - Looking up a conversation with its full message history
//! - Uploading files for later reference
//!
//! Every backend operation is first described as a [`BackendCall`], a plain
//! value that can be inspected without a network, and then handed to a
//! [`ToqanApi`] implementation for execution. [`ToqanClient`] is the
//! reqwest-backed implementation; tests can substitute their own.
//!
//! # Example
//!
//! ```no_run
//! use toqan_client::{ConversationRequest, ToqanApi, ToqanClient, ToqanConfig};
//!
//! # async fn example() -> Result<(), toqan_client::ToqanError> {
//! let client = ToqanClient::new(ToqanConfig::from_env()?)?;
//!
//! let started = client
//!     .create_conversation(ConversationRequest::new("Hello!"))
//!     .await?;
//! println!("request: {:?}", started.get("request_id"));
//! # Ok(())
//! # }
//! ```

pub mod call;
pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use call::{BackendCall, CallBody, FilePart, HttpMethod, Operation};
pub use client::{ToqanApi, ToqanClient};
pub use config::{ToqanConfig, ToqanConfigBuilder, API_KEY_HEADER, DEFAULT_BASE_URL};
pub use error::ToqanError;
pub use types::*;

// Re-export async_trait for implementors of ToqanApi
pub use async_trait::async_trait;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
