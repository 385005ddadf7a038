//! Batch orchestration with outcome routing.
//!
//! [`BatchRunner`] runs one operation over a list of input items. Items are
//! processed one at a time, in order, and each is isolated: an item that
//! fails never stops the ones after it.
//!
//! With `wait_for_response` on and a create/continue operation, every item is
//! submitted, polled, and routed into exactly one of three channels
//! (`finished`, `error`, `timeout`). Otherwise every item yields one record on
//! a single channel: the raw response, or `{error}` if the call failed.

use serde_json::Value;
use toqan_client::{ConversationRequest, FileUpload, Record, ToqanApi};
use tracing::{debug, info, warn};

use crate::conversation::submit;
use crate::error::AgentError;
use crate::poller::{PollOutcome, Poller};
use crate::settings::PollSettings;
use crate::thinking::process_thinking;

/// Message of the timeout channel records.
pub const TIMEOUT_MESSAGE: &str = "Timeout exceeded waiting for response";

/// The operation a batch runs for every item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOperation {
    CreateConversation,
    ContinueConversation,
    GetAnswer,
    UploadFile,
    FindConversation,
}

impl BatchOperation {
    /// Whether this operation submits a message and can be polled.
    pub fn submits(&self) -> bool {
        matches!(self, Self::CreateConversation | Self::ContinueConversation)
    }
}

/// Options shared by every item of a batch.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub operation: BatchOperation,
    /// Poll until the answer is ready and route by outcome.
    pub wait_for_response: bool,
    /// Poll settings for items that do not carry their own.
    pub poll: PollSettings,
}

impl BatchOptions {
    pub fn new(operation: BatchOperation) -> Self {
        Self {
            operation,
            wait_for_response: false,
            poll: PollSettings::batch_default(),
        }
    }

    pub fn wait_for_response(mut self, poll: PollSettings) -> Self {
        self.wait_for_response = true;
        self.poll = poll;
        self
    }

    /// Routed (three channel) mode applies only to create/continue with waiting on.
    pub fn routes_outcomes(&self) -> bool {
        self.wait_for_response && self.operation.submits()
    }
}

/// Inputs of one item. Which fields are needed depends on the operation.
#[derive(Debug, Clone, Default)]
pub struct BatchItem {
    pub message: Option<String>,
    pub conversation_id: Option<String>,
    pub request_id: Option<String>,
    /// Comma-separated file ids to attach.
    pub file_ids: Option<String>,
    pub upload: Option<FileUpload>,
    /// Overrides [`BatchOptions::poll`] for this item.
    pub poll: Option<PollSettings>,
}

impl BatchItem {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_request(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_file_ids(mut self, file_ids: impl Into<String>) -> Self {
        self.file_ids = Some(file_ids.into());
        self
    }

    pub fn with_upload(mut self, upload: FileUpload) -> Self {
        self.upload = Some(upload);
        self
    }

    pub fn with_poll(mut self, poll: PollSettings) -> Self {
        self.poll = Some(poll);
        self
    }

    fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, AgentError> {
        value
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AgentError::Validation(format!("{} is required", name)))
    }

    fn conversation_request(&self, operation: BatchOperation) -> Result<ConversationRequest, AgentError> {
        let message = Self::require(&self.message, "message")?;
        let request = match operation {
            BatchOperation::ContinueConversation => ConversationRequest::continuing(
                Self::require(&self.conversation_id, "conversation id")?,
                message,
            ),
            _ => ConversationRequest::new(message),
        };
        Ok(match self.file_ids {
            Some(ref ids) => request.with_file_ids(ids),
            None => request,
        })
    }
}

/// One output record, tagged with the position of the item it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    pub item: usize,
    pub json: Record,
}

impl ItemRecord {
    pub fn new(item: usize, json: Record) -> Self {
        Self { item, json }
    }

    /// `{error: message}` for an item.
    pub fn error(item: usize, message: impl Into<String>) -> Self {
        let mut json = Record::new();
        json.insert("error".to_string(), Value::String(message.into()));
        Self { item, json }
    }
}

/// Routed output: each item lands in exactly one channel, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutcomeChannels {
    pub finished: Vec<ItemRecord>,
    pub error: Vec<ItemRecord>,
    pub timeout: Vec<ItemRecord>,
}

impl OutcomeChannels {
    pub fn len(&self) -> usize {
        self.finished.len() + self.error.len() + self.timeout.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Output of a batch run.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutput {
    Single(Vec<ItemRecord>),
    Routed(OutcomeChannels),
}

impl BatchOutput {
    /// Output channels in host order: `[all]` or `[finished, error, timeout]`.
    pub fn into_channels(self) -> Vec<Vec<ItemRecord>> {
        match self {
            Self::Single(records) => vec![records],
            Self::Routed(channels) => vec![channels.finished, channels.error, channels.timeout],
        }
    }
}

/// Runs a batch operation over input items.
pub struct BatchRunner<A: ToqanApi> {
    api: A,
    options: BatchOptions,
}

impl<A: ToqanApi> BatchRunner<A> {
    pub fn new(api: A, options: BatchOptions) -> Self {
        Self { api, options }
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Process every item in order.
    pub async fn run(&self, items: &[BatchItem]) -> BatchOutput {
        info!(
            "Running {:?} over {} items (wait for response: {})",
            self.options.operation,
            items.len(),
            self.options.wait_for_response
        );

        if self.options.routes_outcomes() {
            let mut channels = OutcomeChannels::default();
            for (index, item) in items.iter().enumerate() {
                self.run_routed(index, item, &mut channels).await;
            }
            return BatchOutput::Routed(channels);
        }

        let mut records = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let record = match self.run_once(item).await {
                Ok(json) => ItemRecord::new(index, json),
                Err(e) => {
                    warn!("Item {} failed: {}", index, e);
                    ItemRecord::error(index, e.to_string())
                }
            };
            records.push(record);
        }
        BatchOutput::Single(records)
    }

    /// Perform the operation once for an item and return the raw response.
    async fn run_once(&self, item: &BatchItem) -> Result<Record, AgentError> {
        let response = match self.options.operation {
            op @ (BatchOperation::CreateConversation | BatchOperation::ContinueConversation) => {
                let request = item.conversation_request(op)?;
                match request.conversation_id.clone() {
                    Some(id) => self.api.continue_conversation(&id, request).await?,
                    None => self.api.create_conversation(request).await?,
                }
            }
            BatchOperation::GetAnswer => {
                let conversation_id = BatchItem::require(&item.conversation_id, "conversation id")?;
                let request_id = BatchItem::require(&item.request_id, "request id")?;
                self.api.get_answer(conversation_id, request_id).await?
            }
            BatchOperation::FindConversation => {
                let conversation_id = BatchItem::require(&item.conversation_id, "conversation id")?;
                self.api.find_conversation(conversation_id).await?
            }
            BatchOperation::UploadFile => {
                let upload = item
                    .upload
                    .clone()
                    .ok_or_else(|| AgentError::Validation("file is required".to_string()))?;
                self.api.upload_file(upload).await?
            }
        };
        Ok(response)
    }

    /// Submit, poll, and route one item.
    async fn run_routed(&self, index: usize, item: &BatchItem, channels: &mut OutcomeChannels) {
        let submitted = match item.conversation_request(self.options.operation) {
            Ok(request) => submit(&self.api, request).await,
            Err(e) => Err(e),
        };
        let submitted = match submitted {
            Ok(submitted) => submitted,
            Err(e) => {
                warn!("Item {} could not be submitted: {}", index, e);
                channels.error.push(ItemRecord::error(index, e.to_string()));
                return;
            }
        };

        let settings = item.poll.unwrap_or(self.options.poll);
        let report = Poller::new(&self.api, settings)
            .poll(&submitted.conversation_id, &submitted.request_id)
            .await;
        debug!(
            "Item {} ended as {} after {} ms",
            index,
            report.outcome.kind().as_str(),
            report.elapsed_ms()
        );

        match report.outcome {
            PollOutcome::Finished(ref response) => {
                let mut json = process_thinking(response.clone());
                report.annotate(&mut json);
                channels.finished.push(ItemRecord::new(index, json));
            }
            PollOutcome::Failed(ref response) => {
                let mut json = response.clone();
                report.annotate(&mut json);
                channels.error.push(ItemRecord::new(index, json));
            }
            PollOutcome::TimedOut { ref last_status } => {
                let mut json = Record::new();
                json.insert("error".to_string(), Value::String(TIMEOUT_MESSAGE.to_string()));
                json.insert("last_status".to_string(), Value::String(last_status.clone()));
                report.annotate(&mut json);
                channels.timeout.push(ItemRecord::new(index, json));
            }
            PollOutcome::Transport(ref e) => {
                let mut json = Record::new();
                json.insert("error".to_string(), Value::String(e.to_string()));
                json.insert(
                    "conversation_id".to_string(),
                    Value::String(report.conversation_id.clone()),
                );
                json.insert(
                    "request_id".to_string(),
                    Value::String(report.request_id.clone()),
                );
                channels.error.push(ItemRecord::new(index, json));
            }
        }
    }
}
