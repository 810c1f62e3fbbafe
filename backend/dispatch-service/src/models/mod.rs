use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{AppError, Result};

pub use fcm_shared::{TopicOperation, MAX_MULTICAST_TOKENS, MAX_TOPIC_MANAGEMENT_TOKENS};

/// Reserved data keys injected from the payload
pub const TITLE_KEY: &str = "title";
pub const BODY_KEY: &str = "body";

const TOPIC_PREFIX: &str = "/topics/";

/// Title, body and custom key/value data of a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    title: Option<String>,
    body: Option<String>,
    custom_data: HashMap<String, String>,
}

impl NotificationPayload {
    /// At least one of `title` and `body` must be non-blank
    pub fn new(
        title: Option<String>,
        body: Option<String>,
        custom_data: HashMap<String, String>,
    ) -> Result<Self> {
        let blank =
            |field: &Option<String>| field.as_deref().map_or(true, |v| v.trim().is_empty());
        if blank(&title) && blank(&body) {
            return Err(AppError::Validation(
                "notification requires a title or a body".to_string(),
            ));
        }

        Ok(Self {
            title,
            body,
            custom_data,
        })
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn custom_data(&self) -> &HashMap<String, String> {
        &self.custom_data
    }

    /// Flatten into the single data map sent to the provider.
    ///
    /// Custom entries go in first, `title` and `body` last, so the payload's
    /// own title/body replace any custom key of the same name. Both reserved
    /// keys are always present; a missing one is sent as an empty string.
    pub fn to_data_map(&self) -> HashMap<String, String> {
        let mut data = self.custom_data.clone();
        data.insert(
            TITLE_KEY.to_string(),
            self.title.clone().unwrap_or_default(),
        );
        data.insert(BODY_KEY.to_string(), self.body.clone().unwrap_or_default());
        data
    }
}

/// Who receives a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryTarget {
    Device(String),
    MultiDevice(Vec<String>),
    Topic(String),
    Condition(String),
}

impl DeliveryTarget {
    /// Check cardinality and identifiers before anything is sent
    pub fn validate(&self) -> Result<()> {
        match self {
            DeliveryTarget::Device(token) => validate_token(token),
            DeliveryTarget::MultiDevice(tokens) => validate_tokens(tokens, MAX_MULTICAST_TOKENS),
            DeliveryTarget::Topic(topic) => validate_topic_name(topic),
            DeliveryTarget::Condition(condition) => {
                if condition.trim().is_empty() {
                    return Err(AppError::Validation(
                        "condition must not be empty".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Label used in logs and metrics
    pub fn mode(&self) -> &'static str {
        match self {
            DeliveryTarget::Device(_) => "device",
            DeliveryTarget::MultiDevice(_) => "multicast",
            DeliveryTarget::Topic(_) => "topic",
            DeliveryTarget::Condition(_) => "condition",
        }
    }
}

/// Optional per-platform FCM config, passed through untouched except for
/// the Android priority default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryHints {
    pub android: Option<serde_json::Value>,
    pub apns: Option<serde_json::Value>,
    pub webpush: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRequest {
    pub payload: NotificationPayload,
    pub target: DeliveryTarget,
    pub hints: DeliveryHints,
}

impl DispatchRequest {
    pub fn new(payload: NotificationPayload, target: DeliveryTarget) -> Self {
        Self {
            payload,
            target,
            hints: DeliveryHints::default(),
        }
    }

    pub fn with_hints(mut self, hints: DeliveryHints) -> Self {
        self.hints = hints;
        self
    }
}

/// Delivery result for one token of a multicast
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientResult {
    pub recipient: String,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Device, topic and condition sends
    Single { message_id: String },
    /// Multicast sends; `results[i]` belongs to the i-th requested token
    Batch {
        success_count: usize,
        failure_count: usize,
        results: Vec<RecipientResult>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRequest {
    pub tokens: Vec<String>,
    pub topic: String,
    pub operation: TopicOperation,
}

impl SubscriptionRequest {
    pub fn validate(&self) -> Result<()> {
        validate_tokens(&self.tokens, MAX_TOPIC_MANAGEMENT_TOKENS)?;
        validate_topic_name(&self.topic)
    }
}

/// A token whose membership change was refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenError {
    pub token: String,
    pub error: String,
}

/// Only failed tokens are itemized
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionOutcome {
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<TokenError>,
}

fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(AppError::Validation(
            "device token must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_tokens(tokens: &[String], max: usize) -> Result<()> {
    if tokens.is_empty() {
        return Err(AppError::Validation("tokens must not be empty".to_string()));
    }
    if tokens.len() > max {
        return Err(AppError::Validation(format!(
            "tokens must not contain more than {} items, got {}",
            max,
            tokens.len()
        )));
    }
    if let Some(index) = tokens.iter().position(|t| t.is_empty()) {
        return Err(AppError::Validation(format!(
            "token at index {} must not be empty",
            index
        )));
    }
    Ok(())
}

/// Topic names follow FCM's grammar: `[a-zA-Z0-9-_.~%]+`, optionally
/// prefixed with `/topics/`.
pub fn validate_topic_name(topic: &str) -> Result<()> {
    let name = topic.strip_prefix(TOPIC_PREFIX).unwrap_or(topic);
    if name.is_empty() {
        return Err(AppError::Validation("topic must not be empty".to_string()));
    }

    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | '%'));
    if !valid {
        return Err(AppError::Validation(format!(
            "malformed topic name: {}",
            topic
        )));
    }
    Ok(())
}
