//! Single-outcome agent orchestration.
//!
//! [`Agent`] always submits and always waits: a finished answer becomes one
//! [`AgentOutput`] with the cleaned text in `output`; a backend error or a
//! timeout fails the item.

use serde::Serialize;
use serde_json::Value;
use toqan_client::{ConversationRequest, Record, ToqanApi};
use tracing::{info, warn};

use crate::batch::ItemRecord;
use crate::conversation::submit;
use crate::error::AgentError;
use crate::poller::{timestamp, PollOutcome, Poller};
use crate::settings::PollSettings;
use crate::thinking::split_thinking;

/// Whether to start a new conversation or continue one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStrategy {
    New,
    Continue(String),
}

/// One prompt for the agent.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub session: SessionStrategy,
    pub prompt: String,
    /// Comma-separated file ids to attach.
    pub file_ids: Option<String>,
    pub poll: PollSettings,
}

impl AgentRequest {
    /// A prompt for a new conversation with the agent poll defaults.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            session: SessionStrategy::New,
            prompt: prompt.into(),
            file_ids: None,
            poll: PollSettings::agent_default(),
        }
    }

    pub fn continuing(mut self, conversation_id: impl Into<String>) -> Self {
        self.session = SessionStrategy::Continue(conversation_id.into());
        self
    }

    pub fn with_file_ids(mut self, file_ids: impl Into<String>) -> Self {
        self.file_ids = Some(file_ids.into());
        self
    }

    pub fn with_poll(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    fn to_conversation_request(&self) -> ConversationRequest {
        let request = match self.session {
            SessionStrategy::New => ConversationRequest::new(&self.prompt),
            SessionStrategy::Continue(ref id) => ConversationRequest::continuing(id, &self.prompt),
        };
        match self.file_ids {
            Some(ref ids) => request.with_file_ids(ids),
            None => request,
        }
    }
}

/// The agent's answer for one prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentOutput {
    /// Answer text with reasoning removed.
    pub output: String,
    pub conversation_id: String,
    pub request_id: String,
    pub thinking: Option<String>,
    pub has_thinking: bool,
    pub answer_original: String,
    pub elapsed_ms: u64,
    pub started_at: String,
    pub finished_at: String,
}

impl AgentOutput {
    pub fn to_record(&self) -> Record {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Record::new(),
        }
    }
}

/// A failed item that stopped an agent run.
#[derive(Debug, thiserror::Error)]
#[error("item {item}: {error}")]
pub struct ItemFailure {
    pub item: usize,
    #[source]
    pub error: AgentError,
}

/// Runs prompts to completion, one answer per prompt.
pub struct Agent<A: ToqanApi> {
    api: A,
}

impl<A: ToqanApi> Agent<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Submit one prompt and wait for its answer.
    pub async fn run(&self, request: &AgentRequest) -> Result<AgentOutput, AgentError> {
        let submitted = submit(&self.api, request.to_conversation_request()).await?;

        let report = Poller::new(&self.api, request.poll)
            .poll(&submitted.conversation_id, &submitted.request_id)
            .await;

        let response = match report.outcome {
            PollOutcome::Finished(ref response) => response,
            PollOutcome::Failed(response) => return Err(AgentError::Backend(response)),
            PollOutcome::TimedOut { last_status } => {
                return Err(AgentError::Timeout {
                    last_status,
                    elapsed: report.elapsed,
                })
            }
            PollOutcome::Transport(e) => return Err(AgentError::Transport(e)),
        };

        let raw = response.get("answer").and_then(Value::as_str).unwrap_or("");
        let processed = split_thinking(raw);

        info!(
            "Agent answered request {} in {} ms",
            report.request_id,
            report.elapsed_ms()
        );

        Ok(AgentOutput {
            output: processed.answer,
            conversation_id: report.conversation_id.clone(),
            request_id: report.request_id.clone(),
            thinking: processed.thinking,
            has_thinking: processed.has_thinking,
            answer_original: processed.answer_original,
            elapsed_ms: report.elapsed_ms(),
            started_at: timestamp(&report.started_at),
            finished_at: timestamp(&report.finished_at),
        })
    }

    /// Run prompts in order.
    ///
    /// With `continue_on_fail` a failed prompt becomes an `{error}` record and
    /// the run goes on; otherwise the first failure stops the run and is
    /// returned with its item index.
    pub async fn run_all(
        &self,
        requests: &[AgentRequest],
        continue_on_fail: bool,
    ) -> Result<Vec<ItemRecord>, ItemFailure> {
        let mut records = Vec::with_capacity(requests.len());

        for (index, request) in requests.iter().enumerate() {
            match self.run(request).await {
                Ok(output) => records.push(ItemRecord::new(index, output.to_record())),
                Err(error) if continue_on_fail => {
                    warn!("Item {} failed, continuing: {}", index, error);
                    records.push(ItemRecord::error(index, error.to_string()));
                }
                Err(error) => return Err(ItemFailure { item: index, error }),
            }
        }

        Ok(records)
    }
}
