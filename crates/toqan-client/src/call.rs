//! Backend call descriptions.
//!
//! A [`BackendCall`] says what to send (method, path, query, body) without
//! sending it. Executors turn it into an HTTP request; tests assert on it.

use serde_json::Value;

use crate::types::{ConversationRequest, FileUpload};

/// The backend operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateConversation,
    ContinueConversation,
    GetAnswer,
    FindConversation,
    UploadFile,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateConversation => "create_conversation",
            Self::ContinueConversation => "continue_conversation",
            Self::GetAnswer => "get_answer",
            Self::FindConversation => "find_conversation",
            Self::UploadFile => "upload_file",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP methods used by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl HttpMethod {
    pub fn as_reqwest(&self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
        }
    }
}

/// A single multipart file part.
pub type FilePart = FileUpload;

/// Request body of a call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallBody {
    Empty,
    Json(Value),
    Multipart(FilePart),
}

/// Description of one backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendCall {
    pub operation: Operation,
    pub method: HttpMethod,
    pub path: &'static str,
    pub query: Vec<(&'static str, String)>,
    pub body: CallBody,
}

impl BackendCall {
    fn new(operation: Operation, method: HttpMethod, path: &'static str, body: CallBody) -> Self {
        Self {
            operation,
            method,
            path,
            query: Vec::new(),
            body,
        }
    }

    /// `POST /create_conversation`. Any conversation id on the request is ignored.
    pub fn create_conversation(request: &ConversationRequest) -> Self {
        let mut body = request.to_body();
        if let Value::Object(ref mut map) = body {
            map.remove("conversation_id");
        }
        Self::new(
            Operation::CreateConversation,
            HttpMethod::Post,
            "/create_conversation",
            CallBody::Json(body),
        )
    }

    /// `POST /continue_conversation`.
    pub fn continue_conversation(conversation_id: &str, request: &ConversationRequest) -> Self {
        let mut body = request.to_body();
        if let Value::Object(ref mut map) = body {
            map.insert(
                "conversation_id".to_string(),
                Value::String(conversation_id.to_string()),
            );
        }
        Self::new(
            Operation::ContinueConversation,
            HttpMethod::Post,
            "/continue_conversation",
            CallBody::Json(body),
        )
    }

    /// Create or continue depending on whether the request names a conversation.
    pub fn submit(request: &ConversationRequest) -> Self {
        match request.conversation_id {
            Some(ref id) => Self::continue_conversation(id, request),
            None => Self::create_conversation(request),
        }
    }

    /// `GET /get_answer?conversation_id=..&request_id=..`.
    pub fn get_answer(conversation_id: &str, request_id: &str) -> Self {
        let mut call = Self::new(
            Operation::GetAnswer,
            HttpMethod::Get,
            "/get_answer",
            CallBody::Empty,
        );
        call.query = vec![
            ("conversation_id", conversation_id.to_string()),
            ("request_id", request_id.to_string()),
        ];
        call
    }

    /// `POST /find_conversation`.
    pub fn find_conversation(conversation_id: &str) -> Self {
        Self::new(
            Operation::FindConversation,
            HttpMethod::Post,
            "/find_conversation",
            CallBody::Json(serde_json::json!({ "conversation_id": conversation_id })),
        )
    }

    /// `PUT /upload_file` with a single multipart `file` part.
    pub fn upload_file(upload: FileUpload) -> Self {
        Self::new(
            Operation::UploadFile,
            HttpMethod::Put,
            "/upload_file",
            CallBody::Multipart(upload),
        )
    }

    /// The JSON body, if any.
    pub fn json_body(&self) -> Option<&Value> {
        match self.body {
            CallBody::Json(ref v) => Some(v),
            _ => None,
        }
    }

    /// Render the full URL against a base URL, query string included.
    pub fn url(&self, base_url: &str) -> String {
        let mut url = format!("{}{}", base_url.trim_end_matches('/'), self.path);
        if !self.query.is_empty() {
            let query: Vec<String> = self
                .query
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect();
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }
}
