//! Scripted API implementation - answers from queued scripts.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde_json::{json, Value};
use toqan_client::{
    async_trait, into_record, BackendCall, CallBody, Operation, Record, ToqanApi, ToqanError,
};

/// One `get_answer` response in a script.
#[derive(Debug, Clone)]
pub enum Step {
    /// Respond with this record.
    Respond(Record),
    /// Fail the call with a transport error carrying this message.
    Fail(String),
}

impl Step {
    pub fn in_progress() -> Self {
        Self::status("in_progress")
    }

    pub fn status(status: &str) -> Self {
        Self::Respond(record(json!({ "status": status })))
    }

    pub fn finished(answer: &str) -> Self {
        Self::Respond(record(json!({ "status": "finished", "answer": answer })))
    }

    pub fn error(message: &str) -> Self {
        Self::Respond(record(json!({ "status": "error", "error_message": message })))
    }
}

/// The sequence of `get_answer` responses for one submitted request.
///
/// Steps are consumed one per poll; once exhausted the last step repeats.
#[derive(Debug, Clone)]
pub struct AnswerScript {
    steps: Vec<Step>,
}

impl AnswerScript {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// `n - 1` in-progress polls, then `finished` with the given answer on poll `n`.
    pub fn finished_after(n: usize, answer: &str) -> Self {
        let mut steps: Vec<Step> = (1..n).map(|_| Step::in_progress()).collect();
        steps.push(Step::finished(answer));
        Self { steps }
    }

    /// `n - 1` in-progress polls, then a backend `error` status on poll `n`.
    pub fn error_after(n: usize, message: &str) -> Self {
        let mut steps: Vec<Step> = (1..n).map(|_| Step::in_progress()).collect();
        steps.push(Step::error(message));
        Self { steps }
    }

    /// Never reaches a terminal status.
    pub fn never_finishes() -> Self {
        Self {
            steps: vec![Step::in_progress()],
        }
    }

    /// `n - 1` in-progress polls, then a transport failure on poll `n`.
    pub fn transport_failure_after(n: usize, message: &str) -> Self {
        let mut steps: Vec<Step> = (1..n).map(|_| Step::in_progress()).collect();
        steps.push(Step::Fail(message.to_string()));
        Self { steps }
    }
}

/// How the next create/continue call is handled.
#[derive(Debug, Clone)]
pub enum Submission {
    /// Accept the request and answer polls from the script.
    Accept(AnswerScript),
    /// Fail the create/continue call itself.
    Fail(String),
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<BackendCall>,
    submissions: VecDeque<Submission>,
    scripts: HashMap<String, VecDeque<Step>>,
    last_steps: HashMap<String, Step>,
    polls: HashMap<String, usize>,
    messages: HashMap<String, Vec<Value>>,
    conversations: usize,
    requests: usize,
    files: usize,
}

/// A `ToqanApi` that answers from queued scripts and records every call.
///
/// Conversation ids are `conv-1`, `conv-2`, ...; request ids `req-1`, ...;
/// file ids `file-1`, .... Each create/continue consumes the next queued
/// [`Submission`]; with nothing queued the request finishes on the first poll
/// with the answer `"ok"`.
#[derive(Debug, Default)]
pub struct ScriptedApi {
    state: Mutex<State>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an accepted submission answered by `script`.
    pub fn push_answer(&self, script: AnswerScript) {
        self.push(Submission::Accept(script));
    }

    /// Queue a create/continue call that fails with a transport error.
    pub fn push_submit_failure(&self, message: &str) {
        self.push(Submission::Fail(message.to_string()));
    }

    pub fn push(&self, submission: Submission) {
        self.lock().submissions.push_back(submission);
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// Calls received for one operation.
    pub fn calls_for(&self, operation: Operation) -> Vec<BackendCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .cloned()
            .collect()
    }

    /// Number of `get_answer` calls made for a request id.
    pub fn poll_count(&self, request_id: &str) -> usize {
        self.lock().polls.get(request_id).copied().unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A panic while holding the lock only happens inside a failing test.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn submit(state: &mut State, conversation_id: String, body: &Value) -> Result<Record, ToqanError> {
        let submission = state
            .submissions
            .pop_front()
            .unwrap_or_else(|| Submission::Accept(AnswerScript::finished_after(1, "ok")));

        let script = match submission {
            Submission::Accept(script) => script,
            Submission::Fail(message) => return Err(transport_error(message)),
        };

        state.requests += 1;
        let request_id = format!("req-{}", state.requests);
        state
            .scripts
            .insert(request_id.clone(), script.steps.into_iter().collect());

        let message = body.get("user_message").cloned().unwrap_or(Value::Null);
        state
            .messages
            .entry(conversation_id.clone())
            .or_default()
            .push(json!({ "role": "user", "content": message, "request_id": request_id }));

        Ok(record(json!({
            "conversation_id": conversation_id,
            "request_id": request_id,
        })))
    }

    fn answer(state: &mut State, request_id: &str) -> Result<Record, ToqanError> {
        *state.polls.entry(request_id.to_string()).or_insert(0) += 1;

        let next = match state.scripts.get_mut(request_id) {
            Some(steps) => steps.pop_front(),
            None => {
                return Err(ToqanError::Status {
                    status: 404,
                    body: format!("unknown request {}", request_id),
                })
            }
        };

        let step = match next {
            Some(step) => {
                state.last_steps.insert(request_id.to_string(), step.clone());
                step
            }
            None => state
                .last_steps
                .get(request_id)
                .cloned()
                .unwrap_or_else(Step::in_progress),
        };

        match step {
            Step::Respond(mut response) => {
                response
                    .entry("request_id")
                    .or_insert_with(|| Value::String(request_id.to_string()));
                Ok(response)
            }
            Step::Fail(message) => Err(transport_error(message)),
        }
    }
}

#[async_trait]
impl ToqanApi for ScriptedApi {
    async fn execute(&self, call: BackendCall) -> Result<Record, ToqanError> {
        let mut state = self.lock();
        state.calls.push(call.clone());

        let body = call.json_body().cloned().unwrap_or(Value::Null);
        let field = |name: &str| body.get(name).and_then(Value::as_str).map(str::to_string);

        match call.operation {
            Operation::CreateConversation => {
                state.conversations += 1;
                let conversation_id = format!("conv-{}", state.conversations);
                Self::submit(&mut state, conversation_id, &body)
            }
            Operation::ContinueConversation => {
                let conversation_id = field("conversation_id").unwrap_or_default();
                Self::submit(&mut state, conversation_id, &body)
            }
            Operation::GetAnswer => {
                let request_id = call
                    .query
                    .iter()
                    .find(|(k, _)| *k == "request_id")
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default();
                Self::answer(&mut state, &request_id)
            }
            Operation::FindConversation => {
                let conversation_id = field("conversation_id").unwrap_or_default();
                match state.messages.get(&conversation_id) {
                    Some(messages) => Ok(record(json!({
                        "conversation": { "id": conversation_id, "messages": messages },
                    }))),
                    None => Err(ToqanError::Status {
                        status: 404,
                        body: format!("unknown conversation {}", conversation_id),
                    }),
                }
            }
            Operation::UploadFile => {
                let name = match call.body {
                    CallBody::Multipart(ref upload) => upload.filename.clone(),
                    _ => String::new(),
                };
                state.files += 1;
                Ok(record(json!({ "file_id": format!("file-{}", state.files), "filename": name })))
            }
        }
    }
}

fn transport_error(message: String) -> ToqanError {
    ToqanError::Status {
        status: 503,
        body: message,
    }
}

fn record(value: Value) -> Record {
    into_record(value).unwrap_or_default()
}
