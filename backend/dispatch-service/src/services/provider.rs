/// Push provider boundary
///
/// The dispatch engine and subscription manager only see this trait. The
/// production implementation is the FCM client from `fcm-shared`; tests plug
/// in their own.
use async_trait::async_trait;

pub use fcm_shared::{
    BatchResponse, FCMClient, FCMError, Message, MessageTarget, MulticastMessage, PlatformConfig,
    SendResponse, TopicManagementError, TopicManagementResponse, TopicOperation,
};

#[async_trait]
pub trait PushProvider: Send + Sync {
    /// Send to one token, topic or condition; returns the provider message id
    async fn send(&self, message: &Message) -> Result<String, FCMError>;

    /// Send to every token; `responses[i]` belongs to `message.tokens[i]`
    async fn send_multicast(&self, message: &MulticastMessage) -> Result<BatchResponse, FCMError>;

    /// Add or remove topic membership for a batch of tokens
    async fn manage_topic(
        &self,
        tokens: &[String],
        topic: &str,
        operation: TopicOperation,
    ) -> Result<TopicManagementResponse, FCMError>;
}

#[async_trait]
impl PushProvider for FCMClient {
    async fn send(&self, message: &Message) -> Result<String, FCMError> {
        FCMClient::send(self, message).await
    }

    async fn send_multicast(&self, message: &MulticastMessage) -> Result<BatchResponse, FCMError> {
        self.send_each_for_multicast(message).await
    }

    async fn manage_topic(
        &self,
        tokens: &[String],
        topic: &str,
        operation: TopicOperation,
    ) -> Result<TopicManagementResponse, FCMError> {
        FCMClient::manage_topic(self, tokens, topic, operation).await
    }
}
