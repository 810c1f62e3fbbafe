/// Dispatch Engine
///
/// Turns a validated `DispatchRequest` into one provider call and reduces
/// the provider's answer into a `DispatchOutcome`.
///
/// - Device, topic and condition targets produce a single send and a message id
/// - Multi-device targets produce a multicast whose per-token results keep
///   the order of the requested tokens
/// - Partial multicast failure is reported as data; only a failed provider
///   call is an error
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{
    DeliveryHints, DeliveryTarget, DispatchOutcome, DispatchRequest, RecipientResult,
};
use crate::services::provider::{
    BatchResponse, Message, MessageTarget, MulticastMessage, PlatformConfig, PushProvider,
};

const ANDROID_PRIORITY_KEY: &str = "priority";
const DEFAULT_ANDROID_PRIORITY: &str = "high";

pub struct DispatchEngine {
    provider: Arc<dyn PushProvider>,
}

impl DispatchEngine {
    pub fn new(provider: Arc<dyn PushProvider>) -> Self {
        Self { provider }
    }

    /// Validate, route and send one request
    pub async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchOutcome> {
        let mode = request.target.mode();

        let platform = match request
            .target
            .validate()
            .and_then(|_| platform_config(request.hints))
        {
            Ok(platform) => platform,
            Err(e) => {
                metrics::record_dispatch(mode, "rejected");
                return Err(e);
            }
        };
        let data = request.payload.to_data_map();

        let result = match request.target {
            DeliveryTarget::Device(token) => {
                self.send_single(MessageTarget::Token(token), data, platform)
                    .await
            }
            DeliveryTarget::Topic(topic) => {
                self.send_single(MessageTarget::Topic(topic), data, platform)
                    .await
            }
            DeliveryTarget::Condition(condition) => {
                self.send_single(MessageTarget::Condition(condition), data, platform)
                    .await
            }
            DeliveryTarget::MultiDevice(tokens) => {
                let message = MulticastMessage {
                    data,
                    tokens,
                    platform,
                };
                self.send_multicast(message).await
            }
        };

        match &result {
            Ok(_) => metrics::record_dispatch(mode, "sent"),
            Err(e) => {
                warn!(mode = mode, error = %e, "Dispatch failed");
                metrics::record_dispatch(mode, "provider_error");
            }
        }

        result
    }

    async fn send_single(
        &self,
        target: MessageTarget,
        data: std::collections::HashMap<String, String>,
        platform: PlatformConfig,
    ) -> Result<DispatchOutcome> {
        let message = Message {
            data,
            target,
            platform,
        };

        let message_id = self.provider.send(&message).await?;
        if message_id.is_empty() {
            return Err(AppError::Provider(
                "provider returned an empty message id".to_string(),
            ));
        }

        info!(message_id = %message_id, "Successfully sent message");
        Ok(DispatchOutcome::Single { message_id })
    }

    async fn send_multicast(&self, message: MulticastMessage) -> Result<DispatchOutcome> {
        info!(
            "Attempting to send notification to {} devices",
            message.tokens.len()
        );

        let batch = self.provider.send_multicast(&message).await?;
        reduce_batch(message.tokens, batch)
    }
}

/// Pair each requested token with the provider response at the same position
fn reduce_batch(tokens: Vec<String>, batch: BatchResponse) -> Result<DispatchOutcome> {
    if batch.responses.len() != tokens.len() {
        return Err(AppError::Provider(format!(
            "provider returned {} results for {} tokens",
            batch.responses.len(),
            tokens.len()
        )));
    }

    let results: Vec<RecipientResult> = tokens
        .into_iter()
        .zip(batch.responses)
        .map(|(recipient, response)| RecipientResult {
            recipient,
            success: response.success,
            error: if response.success {
                None
            } else {
                Some(
                    response
                        .error
                        .unwrap_or_else(|| "unknown delivery error".to_string()),
                )
            },
        })
        .collect();

    let success_count = results.iter().filter(|r| r.success).count();
    let failure_count = results.len() - success_count;

    if failure_count > 0 {
        let failed_tokens: Vec<&str> = results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.recipient.as_str())
            .collect();
        warn!(
            failure_count = failure_count,
            "List of tokens that caused failures: {:?}", failed_tokens
        );
    }
    metrics::record_batch_recipients(success_count, failure_count);

    Ok(DispatchOutcome::Batch {
        success_count,
        failure_count,
        results,
    })
}

/// Forward the caller's platform config, defaulting Android priority to high
fn platform_config(hints: DeliveryHints) -> Result<PlatformConfig> {
    let android = match hints.android {
        None => serde_json::json!({ ANDROID_PRIORITY_KEY: DEFAULT_ANDROID_PRIORITY }),
        Some(serde_json::Value::Object(mut config)) => {
            config
                .entry(ANDROID_PRIORITY_KEY)
                .or_insert_with(|| DEFAULT_ANDROID_PRIORITY.into());
            serde_json::Value::Object(config)
        }
        Some(_) => {
            return Err(AppError::Validation(
                "android config must be a JSON object".to_string(),
            ))
        }
    };

    Ok(PlatformConfig {
        android: Some(android),
        apns: hints.apns,
        webpush: hints.webpush,
    })
}
