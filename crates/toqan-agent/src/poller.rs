//! Answer polling.
//!
//! [`Poller`] repeatedly calls `get_answer` for one request until the
//! backend reports a terminal status, the time budget runs out, or a call
//! fails. The loop is:
//!
//! ```text
//! start clock
//! loop:
//!   elapsed > timeout?  -> TimedOut (last status or "unknown")
//!   sleep(interval)
//!   get_answer          -> Err: Transport (no retry)
//!     status finished   -> Finished
//!     status error      -> Failed
//!     anything else     -> loop
//! ```
//!
//! The wait comes before every check, so the first answer is fetched no
//! sooner than one interval after submission, and a zero timeout still
//! performs one check. The first timeout check can never fire, which looks
//! like an off-by-one in the polling contract; it is kept as is so timing
//! matches existing callers.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tokio::time::{sleep, Instant};
use toqan_client::{AnswerStatus, Record, ToqanApi, ToqanError};
use tracing::{debug, info, warn};

use crate::settings::PollSettings;

/// Reported as the last status when no check completed before the timeout.
pub const UNKNOWN_STATUS: &str = "unknown";

/// The four ways a poll can end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Finished,
    Error,
    Timeout,
    TransportError,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Finished => "finished",
            Self::Error => "error",
            Self::Timeout => "timeout",
            Self::TransportError => "transport_error",
        }
    }
}

/// How a poll ended.
#[derive(Debug)]
pub enum PollOutcome {
    /// Status `finished`; the full answer record.
    Finished(Record),
    /// Status `error`; the full response record.
    Failed(Record),
    /// The time budget ran out first.
    TimedOut { last_status: String },
    /// A `get_answer` call failed.
    Transport(ToqanError),
}

impl PollOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Finished(_) => OutcomeKind::Finished,
            Self::Failed(_) => OutcomeKind::Error,
            Self::TimedOut { .. } => OutcomeKind::Timeout,
            Self::Transport(_) => OutcomeKind::TransportError,
        }
    }
}

/// Progress of a poll that has not reached a terminal status yet.
#[derive(Debug, Clone)]
pub struct PollProgress {
    pub attempt: u32,
    pub status: String,
    pub elapsed: Duration,
}

/// Result of polling one request.
#[derive(Debug)]
pub struct PollReport {
    pub conversation_id: String,
    pub request_id: String,
    pub outcome: PollOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
    /// Number of `get_answer` calls made.
    pub attempts: u32,
}

impl PollReport {
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }

    /// Insert `conversation_id`, `request_id`, `elapsed_ms`, `started_at`
    /// and `finished_at` into a record.
    pub fn annotate(&self, record: &mut Record) {
        record.insert(
            "conversation_id".to_string(),
            Value::String(self.conversation_id.clone()),
        );
        record.insert(
            "request_id".to_string(),
            Value::String(self.request_id.clone()),
        );
        record.insert("elapsed_ms".to_string(), Value::from(self.elapsed_ms()));
        record.insert(
            "started_at".to_string(),
            Value::String(timestamp(&self.started_at)),
        );
        record.insert(
            "finished_at".to_string(),
            Value::String(timestamp(&self.finished_at)),
        );
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2025-01-31T12:00:00.000Z`.
pub fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Polls one request to completion.
pub struct Poller<'a, A: ToqanApi + ?Sized> {
    api: &'a A,
    settings: PollSettings,
    observer: Option<&'a (dyn Fn(&PollProgress) + Send + Sync)>,
}

impl<'a, A: ToqanApi + ?Sized> Poller<'a, A> {
    pub fn new(api: &'a A, settings: PollSettings) -> Self {
        Self {
            api,
            settings,
            observer: None,
        }
    }

    /// Call `observer` after every non-terminal check.
    pub fn with_observer(mut self, observer: &'a (dyn Fn(&PollProgress) + Send + Sync)) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Poll until a terminal status, timeout, or transport failure.
    pub async fn poll(&self, conversation_id: &str, request_id: &str) -> PollReport {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut last_status: Option<String> = None;
        let mut attempts = 0u32;

        let outcome = loop {
            if start.elapsed() > self.settings.timeout {
                let last_status = last_status
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| UNKNOWN_STATUS.to_string());
                warn!(
                    "Request {} timed out after {} checks (last status: {})",
                    request_id, attempts, last_status
                );
                break PollOutcome::TimedOut { last_status };
            }

            sleep(self.settings.interval).await;
            attempts += 1;

            let response = match self.api.get_answer(conversation_id, request_id).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Polling request {} failed: {}", request_id, e);
                    break PollOutcome::Transport(e);
                }
            };

            match AnswerStatus::of(&response) {
                AnswerStatus::Finished => {
                    info!("Request {} finished after {} checks", request_id, attempts);
                    break PollOutcome::Finished(response);
                }
                AnswerStatus::Error => {
                    warn!("Request {} reported an error", request_id);
                    break PollOutcome::Failed(response);
                }
                status => {
                    debug!(
                        "Request {} still pending (check {}, status: {:?})",
                        request_id,
                        attempts,
                        status.as_str()
                    );
                    if let Some(observer) = self.observer {
                        observer(&PollProgress {
                            attempt: attempts,
                            status: status.as_str().to_string(),
                            elapsed: start.elapsed(),
                        });
                    }
                    last_status = Some(status.as_str().to_string());
                }
            }
        };

        let elapsed = start.elapsed();
        let finished_at = started_at
            + chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero());

        PollReport {
            conversation_id: conversation_id.to_string(),
            request_id: request_id.to_string(),
            outcome,
            started_at,
            finished_at,
            elapsed,
            attempts,
        }
    }
}
