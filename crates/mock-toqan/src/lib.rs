//! Mock Toqan API implementations for testing.
//!
//! This crate provides implementations of the `ToqanApi` trait that never
//! touch the network:
//! - `ScriptedApi` - Answers from a per-submission script and records every call
//! - `DelayedApi` - Wraps another API with artificial latency
//!
//! # Example
//!
//! ```rust
//! use mock_toqan::{AnswerScript, ScriptedApi, ToqanApi};
//! use toqan_client::ConversationRequest;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), toqan_client::ToqanError> {
//!     let api = ScriptedApi::new();
//!     api.push_answer(AnswerScript::finished_after(1, "Hello!"));
//!
//!     let started = api.create_conversation(ConversationRequest::new("Hi")).await?;
//!     let answer = api.get_answer("conv-1", "req-1").await?;
//!     assert_eq!(started["request_id"], "req-1");
//!     assert_eq!(answer["answer"], "Hello!");
//!     Ok(())
//! }
//! ```

mod delayed;
mod scripted;

pub use toqan_client::{async_trait, BackendCall, Operation, Record, ToqanApi, ToqanError};

pub use delayed::DelayedApi;
pub use scripted::{AnswerScript, ScriptedApi, Step, Submission};
