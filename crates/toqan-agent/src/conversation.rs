//! Submitting a message to a new or existing conversation.

use toqan_client::{require_str, ConversationRequest, ToqanApi};
use tracing::debug;

use crate::error::AgentError;

/// Identifiers of a submitted request, ready to be polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub conversation_id: String,
    pub request_id: String,
}

/// Create or continue a conversation and return the ids to poll.
///
/// A request naming a conversation continues it; the conversation id is
/// taken from the request since `continue_conversation` only answers with
/// a request id. Otherwise a new conversation is created and both ids come
/// from the response.
pub async fn submit<A: ToqanApi + ?Sized>(
    api: &A,
    request: ConversationRequest,
) -> Result<Submitted, AgentError> {
    if request.user_message.trim().is_empty() {
        return Err(AgentError::Validation("message is required".to_string()));
    }

    match request.conversation_id.clone() {
        Some(conversation_id) => {
            if conversation_id.trim().is_empty() {
                return Err(AgentError::Validation(
                    "conversation id is required".to_string(),
                ));
            }
            let response = api.continue_conversation(&conversation_id, request).await?;
            let request_id = require_str(&response, "request_id")?.to_string();
            debug!("Continued conversation {} as request {}", conversation_id, request_id);
            Ok(Submitted {
                conversation_id,
                request_id,
            })
        }
        None => {
            let response = api.create_conversation(request).await?;
            let submitted = Submitted {
                conversation_id: require_str(&response, "conversation_id")?.to_string(),
                request_id: require_str(&response, "request_id")?.to_string(),
            };
            debug!(
                "Created conversation {} with request {}",
                submitted.conversation_id, submitted.request_id
            );
            Ok(submitted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock_toqan::ScriptedApi;
    use serde_json::json;
    use toqan_client::{Operation, ToqanError};

    #[tokio::test]
    async fn test_submit_creates() {
        let api = ScriptedApi::new();
        let submitted = submit(&api, ConversationRequest::new("Hi")).await.unwrap();

        assert_eq!(submitted.conversation_id, "conv-1");
        assert_eq!(submitted.request_id, "req-1");
        assert_eq!(api.calls_for(Operation::CreateConversation).len(), 1);
    }

    #[tokio::test]
    async fn test_submit_continues_with_given_id() {
        let api = ScriptedApi::new();
        let submitted = submit(&api, ConversationRequest::continuing("conv-42", "More"))
            .await
            .unwrap();

        assert_eq!(submitted.conversation_id, "conv-42");
        let calls = api.calls_for(Operation::ContinueConversation);
        assert_eq!(
            calls[0].json_body(),
            Some(&json!({ "conversation_id": "conv-42", "user_message": "More" }))
        );
    }

    #[tokio::test]
    async fn test_submit_validates_before_calling() {
        let api = ScriptedApi::new();

        let err = submit(&api, ConversationRequest::continuing("  ", "Hi"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");

        let err = submit(&api, ConversationRequest::new("")).await.unwrap_err();
        assert_eq!(err.kind(), "validation_error");

        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_submit_transport_failure() {
        let api = ScriptedApi::new();
        api.push_submit_failure("boom");

        let err = submit(&api, ConversationRequest::new("Hi")).await.unwrap_err();
        assert!(matches!(err, AgentError::Transport(ToqanError::Status { .. })));
    }
}
