use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Firebase Service Account Key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    pub auth_uri: String,
    pub token_uri: String,
}

/// OAuth2 Token Cache
#[derive(Debug, Clone)]
pub struct TokenCache {
    pub access_token: String,
    pub expires_at: i64,
}

/// JWT Claims for Google OAuth2
#[derive(Debug, Serialize)]
pub struct JwtClaims {
    pub iss: String,
    pub sub: String,
    pub scope: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

/// Google OAuth2 Token Response
#[derive(Debug, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// Google OAuth2 error body
#[derive(Debug, Deserialize)]
pub struct GoogleOAuthError {
    pub error: String,
    pub error_description: Option<String>,
}

/// Where a single message is delivered. Exactly one per message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageTarget {
    Token(String),
    Topic(String),
    Condition(String),
}

/// Per-platform delivery options, forwarded to FCM as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlatformConfig {
    pub android: Option<serde_json::Value>,
    pub apns: Option<serde_json::Value>,
    pub webpush: Option<serde_json::Value>,
}

/// Data message addressed to one token, topic or condition
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub data: HashMap<String, String>,
    pub target: MessageTarget,
    pub platform: PlatformConfig,
}

/// Data message fanned out to an ordered list of tokens
#[derive(Debug, Clone, PartialEq)]
pub struct MulticastMessage {
    pub data: HashMap<String, String>,
    pub tokens: Vec<String>,
    pub platform: PlatformConfig,
}

/// Outcome of one message inside a multicast batch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SendResponse {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl SendResponse {
    pub fn sent(message_id: String) -> Self {
        Self {
            success: true,
            message_id: Some(message_id),
            error: None,
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error),
        }
    }
}

/// Multicast send result. `responses[i]` belongs to `tokens[i]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchResponse {
    pub success_count: usize,
    pub failure_count: usize,
    pub responses: Vec<SendResponse>,
}

impl BatchResponse {
    pub fn from_responses(responses: Vec<SendResponse>) -> Self {
        let success_count = responses.iter().filter(|r| r.success).count();
        Self {
            success_count,
            failure_count: responses.len() - success_count,
            responses,
        }
    }
}

/// Topic membership change requested from the IID API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicOperation {
    Subscribe,
    Unsubscribe,
}

impl TopicOperation {
    /// IID batch endpoint for this operation
    pub fn endpoint(&self) -> &'static str {
        match self {
            TopicOperation::Subscribe => "iid/v1:batchAdd",
            TopicOperation::Unsubscribe => "iid/v1:batchRemove",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TopicOperation::Subscribe => "subscribe",
            TopicOperation::Unsubscribe => "unsubscribe",
        }
    }
}

/// A token the IID API refused, by its position in the request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopicManagementError {
    pub index: usize,
    pub reason: String,
}

/// Topic subscription result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopicManagementResponse {
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<TopicManagementError>,
}

/// FCM Message Request
#[derive(Debug, Serialize)]
pub struct FcmMessage {
    pub message: FcmMessageContent,
}

/// FCM Message Content
#[derive(Debug, Serialize)]
pub struct FcmMessageContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub data: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apns: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webpush: Option<serde_json::Value>,
}

impl FcmMessageContent {
    pub fn new(
        target: &MessageTarget,
        data: &HashMap<String, String>,
        platform: &PlatformConfig,
    ) -> Self {
        let (token, topic, condition) = match target {
            MessageTarget::Token(token) => (Some(token.clone()), None, None),
            MessageTarget::Topic(topic) => {
                // The v1 API wants the bare topic name
                let bare = topic.strip_prefix("/topics/").unwrap_or(topic);
                (None, Some(bare.to_string()), None)
            }
            MessageTarget::Condition(condition) => (None, None, Some(condition.clone())),
        };

        Self {
            token,
            topic,
            condition,
            data: data.clone(),
            android: platform.android.clone(),
            apns: platform.apns.clone(),
            webpush: platform.webpush.clone(),
        }
    }
}

/// FCM API Response
#[derive(Debug, Deserialize)]
pub struct FcmApiResponse {
    pub name: Option<String>,
}

/// Google API error envelope
#[derive(Debug, Deserialize)]
pub struct GoogleErrorEnvelope {
    pub error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct GoogleErrorBody {
    pub code: Option<u16>,
    pub message: Option<String>,
    pub status: Option<String>,
}

/// IID batchAdd/batchRemove request body
#[derive(Debug, Serialize)]
pub struct IidBatchRequest<'a> {
    pub to: String,
    pub registration_tokens: &'a [String],
}

/// IID batch response; `results[i]` belongs to `registration_tokens[i]`
#[derive(Debug, Deserialize)]
pub struct IidBatchResponse {
    #[serde(default)]
    pub results: Vec<IidBatchResult>,
}

#[derive(Debug, Deserialize)]
pub struct IidBatchResult {
    pub error: Option<String>,
}
