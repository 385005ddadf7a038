//! Chat-model style sessions.
//!
//! A [`ChatSession`] owns the id of the conversation it talks to. The first
//! generation creates the conversation and remembers its id; later turns
//! continue it. Independent conversations use independent sessions.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use toqan_client::{ConversationRequest, ToolDefinition, ToqanApi};
use tracing::info;

use crate::conversation::submit;
use crate::error::AgentError;
use crate::poller::{PollOutcome, PollProgress, Poller};
use crate::settings::PollSettings;
use crate::thinking::strip_thinking;
use crate::tool_calls::{MarkupToolCallParser, ToolCall, ToolCallParser};

/// Observer for poll progress, shared between bound sessions.
pub type ProgressFn = Arc<dyn Fn(&PollProgress) + Send + Sync>;

/// A message in the chat history. Only the last one is sent; the backend
/// holds the rest of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// One model turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatGeneration {
    /// Answer text with reasoning removed.
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub conversation_id: String,
    pub request_id: String,
}

/// A conversation with the backend, driven one turn at a time.
pub struct ChatSession<A: ToqanApi + Clone> {
    api: A,
    settings: PollSettings,
    conversation_id: Option<String>,
    tools: Vec<ToolDefinition>,
    parser: Arc<dyn ToolCallParser>,
    progress: Option<ProgressFn>,
}

impl<A: ToqanApi + Clone> ChatSession<A> {
    /// A session with no conversation yet, using the agent poll defaults.
    pub fn new(api: A) -> Self {
        Self {
            api,
            settings: PollSettings::agent_default(),
            conversation_id: None,
            tools: Vec::new(),
            parser: Arc::new(MarkupToolCallParser),
            progress: None,
        }
    }

    /// Poll interval and timeout in seconds; `0` keeps the default.
    pub fn with_poll_secs(mut self, interval_secs: f64, timeout_secs: f64) -> Self {
        self.settings = PollSettings::agent_from_secs(interval_secs, timeout_secs);
        self
    }

    pub fn with_poll(mut self, settings: PollSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Continue an existing conversation instead of creating one.
    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn ToolCallParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// A new session offering `tools`, sharing this session's transport,
    /// settings, parser and current conversation id. Later turns on either
    /// session do not affect the other.
    pub fn bind_tools(&self, tools: Vec<ToolDefinition>) -> Self {
        Self {
            api: self.api.clone(),
            settings: self.settings,
            conversation_id: self.conversation_id.clone(),
            tools,
            parser: Arc::clone(&self.parser),
            progress: self.progress.clone(),
        }
    }

    /// Send the last message and wait for the answer.
    ///
    /// Every error message starts with `Toqan API Error:`.
    pub async fn generate(&mut self, messages: &[ChatMessage]) -> Result<ChatGeneration, AgentError> {
        self.turn(messages).await.map_err(AgentError::into_chat)
    }

    async fn turn(&mut self, messages: &[ChatMessage]) -> Result<ChatGeneration, AgentError> {
        let last = messages
            .last()
            .ok_or_else(|| AgentError::Validation("no messages to send".to_string()))?;

        let request = match self.conversation_id {
            Some(ref id) => ConversationRequest::continuing(id, &last.content),
            None => ConversationRequest::new(&last.content),
        }
        .with_tools(self.tools.clone());

        let submitted = submit(&self.api, request).await?;
        if self.conversation_id.is_none() {
            info!("Chat session started conversation {}", submitted.conversation_id);
            self.conversation_id = Some(submitted.conversation_id.clone());
        }

        let mut poller = Poller::new(&self.api, self.settings);
        if let Some(ref progress) = self.progress {
            poller = poller.with_observer(&**progress);
        }
        let report = poller
            .poll(&submitted.conversation_id, &submitted.request_id)
            .await;

        let mut response = match report.outcome {
            PollOutcome::Finished(response) => response,
            PollOutcome::Failed(response) => return Err(AgentError::Backend(response)),
            PollOutcome::TimedOut { last_status } => {
                return Err(AgentError::Timeout {
                    last_status,
                    elapsed: report.elapsed,
                })
            }
            PollOutcome::Transport(e) => return Err(AgentError::Transport(e)),
        };

        let text = strip_thinking(response.get("answer").and_then(Value::as_str).unwrap_or(""));
        // Tool calls are read from the answer without its reasoning block.
        response.insert("answer".to_string(), Value::String(text.clone()));
        let tool_calls = self.parser.parse(&response);

        Ok(ChatGeneration {
            text,
            tool_calls,
            conversation_id: submitted.conversation_id,
            request_id: submitted.request_id,
        })
    }
}
