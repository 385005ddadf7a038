//! Toqan API HTTP client.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use tracing::debug;

use crate::call::{BackendCall, CallBody};
use crate::config::{ToqanConfig, API_KEY_HEADER};
use crate::error::ToqanError;
use crate::types::{into_record, ConversationRequest, FileUpload, Record};

/// Executes backend calls.
///
/// Implementors only provide [`execute`](ToqanApi::execute); the operation
/// helpers build the matching [`BackendCall`] and delegate to it. Transport
/// failures are returned as errors and never retried here.
#[async_trait]
pub trait ToqanApi: Send + Sync {
    /// Execute a call and return the response object.
    async fn execute(&self, call: BackendCall) -> Result<Record, ToqanError>;

    /// Create a new conversation. The response carries `conversation_id` and `request_id`.
    async fn create_conversation(&self, request: ConversationRequest) -> Result<Record, ToqanError> {
        self.execute(BackendCall::create_conversation(&request)).await
    }

    /// Continue a conversation. The response carries `request_id`.
    async fn continue_conversation(
        &self,
        conversation_id: &str,
        request: ConversationRequest,
    ) -> Result<Record, ToqanError> {
        self.execute(BackendCall::continue_conversation(conversation_id, &request))
            .await
    }

    /// Fetch the current answer state for a request.
    async fn get_answer(&self, conversation_id: &str, request_id: &str) -> Result<Record, ToqanError> {
        self.execute(BackendCall::get_answer(conversation_id, request_id))
            .await
    }

    /// Look up a conversation with its full message history.
    async fn find_conversation(&self, conversation_id: &str) -> Result<Record, ToqanError> {
        self.execute(BackendCall::find_conversation(conversation_id))
            .await
    }

    /// Upload a file. The response carries `file_id`.
    async fn upload_file(&self, upload: FileUpload) -> Result<Record, ToqanError> {
        self.execute(BackendCall::upload_file(upload)).await
    }
}

#[async_trait]
impl<T: ToqanApi + ?Sized> ToqanApi for Arc<T> {
    async fn execute(&self, call: BackendCall) -> Result<Record, ToqanError> {
        (**self).execute(call).await
    }
}

/// Client for the Toqan API.
#[derive(Clone)]
pub struct ToqanClient {
    http: Client,
    config: ToqanConfig,
}

impl ToqanClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ToqanConfig) -> Result<Self, ToqanError> {
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ToqanError::Http)?;

        debug!("Toqan client configured for {}", config.base_url);

        Ok(Self { http, config })
    }

    /// Create a client from environment variables.
    ///
    /// See [`ToqanConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, ToqanError> {
        Self::new(ToqanConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &ToqanConfig {
        &self.config
    }

    /// Check that the API key is accepted.
    ///
    /// Sends a short `create_conversation` request; any error means the
    /// credentials (or base URL) are not usable.
    pub async fn verify_credentials(&self) -> Result<(), ToqanError> {
        self.create_conversation(ConversationRequest::new("Test connection"))
            .await
            .map(|_| ())
    }

    fn build_form(upload: FileUpload) -> Result<Form, ToqanError> {
        let mut part = Part::bytes(upload.bytes).file_name(upload.filename);
        if let Some(ref content_type) = upload.content_type {
            part = part.mime_str(content_type).map_err(ToqanError::Http)?;
        }
        Ok(Form::new().part("file", part))
    }

    /// Build the HTTP request for a call. The URL, query string included,
    /// is the one rendered by [`BackendCall::url`].
    fn request(&self, call: BackendCall) -> Result<RequestBuilder, ToqanError> {
        let url = call.url(&self.config.base_url);
        debug!("{:?} {} ({})", call.method, url, call.operation);

        let request = self
            .http
            .request(call.method.as_reqwest(), &url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .header("Accept", "application/json");

        Ok(match call.body {
            CallBody::Empty => request,
            CallBody::Json(body) => request.json(&body),
            CallBody::Multipart(upload) => request.multipart(Self::build_form(upload)?),
        })
    }
}

#[async_trait]
impl ToqanApi for ToqanClient {
    async fn execute(&self, call: BackendCall) -> Result<Record, ToqanError> {
        let response = self.request(call)?.send().await.map_err(ToqanError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToqanError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(ToqanError::Http)?;
        parse_body(&body)
    }
}

/// Decode a success body into a response record.
fn parse_body(body: &str) -> Result<Record, ToqanError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    into_record(value)
}

impl std::fmt::Debug for ToqanClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToqanClient")
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_missing_key() {
        let result = ToqanClient::new(ToqanConfig::default());
        assert!(matches!(result, Err(ToqanError::Config(_))));
    }

    #[test]
    fn test_new_with_timeout() {
        let config = ToqanConfig::builder()
            .api_key("sk_test")
            .http_timeout(std::time::Duration::from_secs(3))
            .build();
        let client = ToqanClient::new(config).unwrap();
        assert_eq!(client.config().api_key, "sk_test");
    }

    #[test]
    fn test_build_form_rejects_bad_mime() {
        let upload = FileUpload::new(b"x".to_vec(), "a.txt").with_content_type("not a mime\n");
        assert!(ToqanClient::build_form(upload).is_err());
    }

    #[test]
    fn test_request_url_matches_call_description() {
        let config = ToqanConfig::builder()
            .api_key("sk_test")
            .base_url("https://api.example.com/api/")
            .build();
        let client = ToqanClient::new(config).unwrap();

        let call = BackendCall::get_answer("conv 1", "req&2");
        let described = call.url(&client.config().base_url);
        let request = client.request(call).unwrap().build().unwrap();

        assert_eq!(request.url().as_str(), described);
        assert_eq!(
            request.url().as_str(),
            "https://api.example.com/api/get_answer?conversation_id=conv%201&request_id=req%262"
        );
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.headers()[API_KEY_HEADER], "sk_test");
    }

    #[test]
    fn test_parse_body() {
        let record = parse_body(r#"{"status":"finished"}"#).unwrap();
        assert_eq!(record["status"], "finished");

        assert!(matches!(parse_body("not json"), Err(ToqanError::Json(_))));
        assert!(matches!(
            parse_body("[1, 2]"),
            Err(ToqanError::UnexpectedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_http_error() {
        let config = ToqanConfig::builder()
            .api_key("sk_test")
            .base_url("http://127.0.0.1:1")
            .build();
        let client = ToqanClient::new(config).unwrap();

        let result = client.get_answer("c", "r").await;
        assert!(matches!(result, Err(ToqanError::Http(_))));
    }
}
