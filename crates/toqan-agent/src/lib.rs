//! Conversation orchestration for the Toqan AI API.
//!
//! The backend answers asynchronously: submitting a message returns ids, and
//! the answer must be polled for. This crate turns that into complete
//! results.
//!
//! # Features
//!
//! - Polls a submitted request until it finishes, fails, or times out
//! - Splits `<think>` reasoning blocks out of answers
//! - Runs batches of items, routing each result to a finished, error or
//!   timeout channel
//! - Runs single-answer agent prompts
//! - Drives chat-style sessions with tool definitions and tool call
//!   extraction
//!
//! # Architecture
//!
//! ```text
//! BatchItem / AgentRequest / ChatMessage
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ORCHESTRATORS                            │
//! │   BatchRunner          Agent             ChatSession        │
//! │         ↓                                                   │
//! │  1. Submit (create or continue conversation)                │
//! │         ↓                                                   │
//! │  2. Poll get_answer every interval until:                   │
//! │     • finished → strip reasoning, annotate timing           │
//! │     • error    → backend error                              │
//! │     • timeout  → last status seen                           │
//! │     • transport failure → stop immediately                  │
//! │         ↓                                                   │
//! │  3. Route or return the result                              │
//! └─────────────────────────────────────────────────────────────┘
//!          ↓
//!      ToqanApi (toqan-client)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use toqan_agent::{Agent, AgentRequest};
//! use toqan_client::ToqanClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let agent = Agent::new(ToqanClient::from_env()?);
//!     let output = agent.run(&AgentRequest::new("Summarize Rust ownership")).await?;
//!
//!     println!("{}", output.output);
//!     Ok(())
//! }
//! ```

mod agent;
mod batch;
mod chat;
mod conversation;
mod error;
mod poller;
mod settings;
mod thinking;
mod tool_calls;

pub use agent::{Agent, AgentOutput, AgentRequest, ItemFailure, SessionStrategy};
pub use batch::{
    BatchItem, BatchOperation, BatchOptions, BatchOutput, BatchRunner, ItemRecord,
    OutcomeChannels, TIMEOUT_MESSAGE,
};
pub use chat::{ChatGeneration, ChatMessage, ChatSession, ProgressFn};
pub use conversation::{submit, Submitted};
pub use error::AgentError;
pub use poller::{
    timestamp, OutcomeKind, PollOutcome, PollProgress, PollReport, Poller, UNKNOWN_STATUS,
};
pub use settings::{
    PollSettings, DEFAULT_AGENT_TIMEOUT_SECS, DEFAULT_BATCH_TIMEOUT_SECS,
    DEFAULT_POLL_INTERVAL_SECS,
};
pub use thinking::{process_thinking, split_thinking, strip_thinking, ProcessedAnswer};
pub use tool_calls::{FunctionCall, MarkupToolCallParser, NoToolCalls, ToolCall, ToolCallParser};
