//! Request and response types for the Toqan API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ToqanError;

/// An opaque backend response: the JSON object returned by an endpoint.
pub type Record = Map<String, Value>;

/// A reference to an uploaded file, as sent in `private_user_files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub id: String,
}

impl FileRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Parse a comma-separated list of file ids into file references.
///
/// Each id is trimmed; segments that are empty after trimming are skipped,
/// so `""` and `" , "` both yield no references.
pub fn parse_file_ids(input: &str) -> Vec<FileRef> {
    input
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(FileRef::new)
        .collect()
}

/// A tool the model may call, in OpenAI function format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a tool definition. A null schema is replaced by an empty object schema.
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        let parameters = if parameters.is_null() {
            serde_json::json!({ "type": "object", "properties": {}, "required": [] })
        } else {
            parameters
        };
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Render as `{"type": "function", "function": {...}}`.
    pub fn to_openai(&self) -> Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// Parameters for a create or continue conversation request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationRequest {
    /// Conversation to continue. `None` creates a new conversation.
    pub conversation_id: Option<String>,
    /// The user message.
    pub user_message: String,
    /// Files to attach.
    pub files: Vec<FileRef>,
    /// Tools offered to the model.
    pub tools: Vec<ToolDefinition>,
}

impl ConversationRequest {
    /// Create a request for a new conversation.
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            ..Default::default()
        }
    }

    /// Create a request continuing an existing conversation.
    pub fn continuing(conversation_id: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            conversation_id: Some(conversation_id.into()),
            user_message: user_message.into(),
            ..Default::default()
        }
    }

    /// Attach files from a comma-separated id list.
    pub fn with_file_ids(mut self, file_ids: &str) -> Self {
        self.files.extend(parse_file_ids(file_ids));
        self
    }

    /// Attach a single file reference.
    pub fn with_file(mut self, file: FileRef) -> Self {
        self.files.push(file);
        self
    }

    /// Offer tools to the model.
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Build the JSON body sent to the backend.
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        if let Some(ref id) = self.conversation_id {
            body.insert("conversation_id".to_string(), Value::String(id.clone()));
        }
        body.insert(
            "user_message".to_string(),
            Value::String(self.user_message.clone()),
        );
        if !self.files.is_empty() {
            let files = self
                .files
                .iter()
                .map(|f| serde_json::json!({ "id": f.id }))
                .collect();
            body.insert("private_user_files".to_string(), Value::Array(files));
        }
        if !self.tools.is_empty() {
            let tools = self.tools.iter().map(ToolDefinition::to_openai).collect();
            body.insert("tools".to_string(), Value::Array(tools));
            body.insert("tool_choice".to_string(), Value::String("auto".to_string()));
        }
        Value::Object(body)
    }
}

/// Status of a request as reported by `/get_answer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerStatus {
    InProgress,
    Finished,
    Error,
    /// Any status the client does not recognise. Treated as non-terminal.
    Other(String),
}

impl AnswerStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "in_progress" => Self::InProgress,
            "finished" => Self::Finished,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    /// Read the status of an answer record. A missing status is `Other("")`.
    pub fn of(record: &Record) -> Self {
        Self::parse(record.get("status").and_then(Value::as_str).unwrap_or(""))
    }

    /// Whether polling should stop at this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Error)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::InProgress => "in_progress",
            Self::Finished => "finished",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }
}

/// A file to upload.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: Option<String>,
}

impl FileUpload {
    /// Create an upload. An empty filename becomes `"file"`.
    pub fn new(bytes: impl Into<Vec<u8>>, filename: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            bytes: bytes.into(),
            filename: if filename.is_empty() {
                "file".to_string()
            } else {
                filename
            },
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl std::fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUpload")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Read a required string field from a response record.
pub fn require_str<'a>(record: &'a Record, field: &'static str) -> Result<&'a str, ToqanError> {
    record
        .get(field)
        .and_then(Value::as_str)
        .ok_or(ToqanError::MissingField(field))
}

/// Convert a JSON value into a response record.
pub fn into_record(value: Value) -> Result<Record, ToqanError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ToqanError::UnexpectedResponse(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_file_ids_trims_each_entry() {
        assert_eq!(
            parse_file_ids("a, b ,c"),
            vec![FileRef::new("a"), FileRef::new("b"), FileRef::new("c")]
        );
    }

    #[test]
    fn test_parse_file_ids_blank() {
        assert!(parse_file_ids("").is_empty());
        assert!(parse_file_ids(" , ").is_empty());
        assert_eq!(parse_file_ids("x,,y"), vec![FileRef::new("x"), FileRef::new("y")]);
    }

    #[test]
    fn test_create_body_minimal() {
        let body = ConversationRequest::new("Hello").to_body();
        assert_eq!(body, json!({ "user_message": "Hello" }));
    }

    #[test]
    fn test_continue_body_with_files() {
        let body = ConversationRequest::continuing("conv-1", "More")
            .with_file_ids("f1, f2")
            .to_body();
        assert_eq!(
            body,
            json!({
                "conversation_id": "conv-1",
                "user_message": "More",
                "private_user_files": [{ "id": "f1" }, { "id": "f2" }],
            })
        );
    }

    #[test]
    fn test_body_with_tools() {
        let tool = ToolDefinition::new("calculator", "Does math", Value::Null);
        let body = ConversationRequest::new("2+2?")
            .with_tools(vec![tool])
            .to_body();

        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "calculator");
        assert_eq!(body["tools"][0]["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_answer_status() {
        let record = into_record(json!({ "status": "in_progress" })).unwrap();
        assert_eq!(AnswerStatus::of(&record), AnswerStatus::InProgress);
        assert!(!AnswerStatus::of(&record).is_terminal());

        assert!(AnswerStatus::parse("finished").is_terminal());
        assert!(AnswerStatus::parse("error").is_terminal());
        assert_eq!(AnswerStatus::parse("queued"), AnswerStatus::Other("queued".into()));
        assert_eq!(AnswerStatus::of(&Record::new()).as_str(), "");
    }

    #[test]
    fn test_into_record_rejects_non_objects() {
        assert!(into_record(json!([1, 2])).is_err());
        assert!(into_record(json!({ "a": 1 })).is_ok());
    }

    #[test]
    fn test_require_str() {
        let record = into_record(json!({ "request_id": "r1", "n": 3 })).unwrap();
        assert_eq!(require_str(&record, "request_id").unwrap(), "r1");
        assert!(matches!(
            require_str(&record, "n"),
            Err(ToqanError::MissingField("n"))
        ));
    }

    #[test]
    fn test_file_upload_default_name() {
        let upload = FileUpload::new(b"abc".to_vec(), "");
        assert_eq!(upload.filename, "file");
    }
}
