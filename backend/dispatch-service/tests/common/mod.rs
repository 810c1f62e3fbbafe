#![allow(dead_code)]

use async_trait::async_trait;
use dispatch_service::services::provider::{
    BatchResponse, FCMError, Message, MulticastMessage, PushProvider, SendResponse,
    TopicManagementError, TopicManagementResponse, TopicOperation,
};
use parking_lot::Mutex;

/// Records every call and answers from a fixed script
pub struct FakeProvider {
    pub message_id: String,
    pub unavailable: bool,
    pub failing_tokens: Vec<String>,
    pub sent: Mutex<Vec<Message>>,
    pub multicasts: Mutex<Vec<MulticastMessage>>,
    pub topic_calls: Mutex<Vec<(Vec<String>, String, TopicOperation)>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            message_id: "msg-123".to_string(),
            unavailable: false,
            failing_tokens: Vec::new(),
            sent: Mutex::new(Vec::new()),
            multicasts: Mutex::new(Vec::new()),
            topic_calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails as if the provider could not be reached
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new()
        }
    }

    /// These tokens fail with "reason" in multicasts and topic management
    pub fn with_failing_tokens(mut self, tokens: &[&str]) -> Self {
        self.failing_tokens = tokens.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn call_count(&self) -> usize {
        self.sent.lock().len() + self.multicasts.lock().len() + self.topic_calls.lock().len()
    }

    fn fails(&self, token: &str) -> bool {
        self.failing_tokens.iter().any(|t| t == token)
    }
}

#[async_trait]
impl PushProvider for FakeProvider {
    async fn send(&self, message: &Message) -> Result<String, FCMError> {
        self.sent.lock().push(message.clone());
        if self.unavailable {
            return Err(FCMError::SendRequestError("connection refused".to_string()));
        }
        Ok(self.message_id.clone())
    }

    async fn send_multicast(&self, message: &MulticastMessage) -> Result<BatchResponse, FCMError> {
        self.multicasts.lock().push(message.clone());
        if self.unavailable {
            return Err(FCMError::TokenError("connection refused".to_string()));
        }

        let responses = message
            .tokens
            .iter()
            .map(|token| {
                if self.fails(token) {
                    SendResponse::failed("reason".to_string())
                } else {
                    SendResponse::sent(format!("msg-{}", token))
                }
            })
            .collect();

        Ok(BatchResponse::from_responses(responses))
    }

    async fn manage_topic(
        &self,
        tokens: &[String],
        topic: &str,
        operation: TopicOperation,
    ) -> Result<TopicManagementResponse, FCMError> {
        self.topic_calls
            .lock()
            .push((tokens.to_vec(), topic.to_string(), operation));
        if self.unavailable {
            return Err(FCMError::TopicManagementError(
                "connection refused".to_string(),
            ));
        }

        let errors: Vec<TopicManagementError> = tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| self.fails(token))
            .map(|(index, _)| TopicManagementError {
                index,
                reason: "reason".to_string(),
            })
            .collect();

        Ok(TopicManagementResponse {
            success_count: tokens.len() - errors.len(),
            failure_count: errors.len(),
            errors,
        })
    }
}
