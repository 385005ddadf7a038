//! Delayed API implementation - wraps another API with artificial latency.

use std::time::Duration;

use tokio::time::sleep;
use toqan_client::{async_trait, BackendCall, Record, ToqanApi, ToqanError};

/// An API that wraps another API and delays every call.
///
/// Useful for testing that elapsed-time accounting includes network latency.
pub struct DelayedApi<A: ToqanApi> {
    inner: A,
    delay: Duration,
}

impl<A: ToqanApi> DelayedApi<A> {
    pub fn new(inner: A, delay: Duration) -> Self {
        Self { inner, delay }
    }

    pub fn with_millis(inner: A, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

#[async_trait]
impl<A: ToqanApi> ToqanApi for DelayedApi<A> {
    async fn execute(&self, call: BackendCall) -> Result<Record, ToqanError> {
        sleep(self.delay).await;
        self.inner.execute(call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedApi;
    use tokio::time::Instant;
    use toqan_client::ConversationRequest;

    #[tokio::test(start_paused = true)]
    async fn test_delayed_api() {
        let api = DelayedApi::with_millis(ScriptedApi::new(), 250);

        let start = Instant::now();
        let started = api
            .create_conversation(ConversationRequest::new("Hi"))
            .await
            .unwrap();

        assert_eq!(started["request_id"], "req-1");
        assert!(start.elapsed() >= Duration::from_millis(250));
        assert_eq!(api.inner().calls().len(), 1);
    }
}
