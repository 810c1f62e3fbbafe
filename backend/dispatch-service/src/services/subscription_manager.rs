/// Subscription Manager
///
/// Adds or removes topic membership for a batch of tokens through the
/// provider. Stateless: the provider is the only source of truth for who is
/// subscribed.
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{SubscriptionOutcome, SubscriptionRequest, TokenError, TopicOperation};
use crate::services::provider::{PushProvider, TopicManagementResponse};

pub struct SubscriptionManager {
    provider: Arc<dyn PushProvider>,
}

impl SubscriptionManager {
    pub fn new(provider: Arc<dyn PushProvider>) -> Self {
        Self { provider }
    }

    pub async fn subscribe(&self, tokens: Vec<String>, topic: String) -> Result<SubscriptionOutcome> {
        self.apply(SubscriptionRequest {
            tokens,
            topic,
            operation: TopicOperation::Subscribe,
        })
        .await
    }

    pub async fn unsubscribe(
        &self,
        tokens: Vec<String>,
        topic: String,
    ) -> Result<SubscriptionOutcome> {
        self.apply(SubscriptionRequest {
            tokens,
            topic,
            operation: TopicOperation::Unsubscribe,
        })
        .await
    }

    /// Validate and forward one membership change
    pub async fn apply(&self, request: SubscriptionRequest) -> Result<SubscriptionOutcome> {
        let operation = request.operation.as_str();

        if let Err(e) = request.validate() {
            metrics::record_subscription(operation, "rejected");
            return Err(e);
        }

        info!(
            topic = %request.topic,
            operation = operation,
            "Attempting to {} {} tokens",
            operation,
            request.tokens.len()
        );

        let response = match self
            .provider
            .manage_topic(&request.tokens, &request.topic, request.operation)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(topic = %request.topic, operation = operation, error = %e, "Topic management failed");
                metrics::record_subscription(operation, "provider_error");
                return Err(e.into());
            }
        };

        let outcome = reduce_topic_response(&request.tokens, response)?;
        metrics::record_subscription(operation, "applied");

        info!(
            topic = %request.topic,
            "{} tokens were {}d successfully, {} failed",
            outcome.success_count,
            operation,
            outcome.failure_count
        );

        Ok(outcome)
    }
}

/// Resolve failed indices back to tokens; successes are only counted
fn reduce_topic_response(
    tokens: &[String],
    response: TopicManagementResponse,
) -> Result<SubscriptionOutcome> {
    if response.errors.len() > tokens.len() {
        return Err(AppError::Provider(format!(
            "provider returned {} failures for {} tokens",
            response.errors.len(),
            tokens.len()
        )));
    }

    let mut seen = HashSet::with_capacity(response.errors.len());
    if let Some(duplicate) = response.errors.iter().find(|e| !seen.insert(e.index)) {
        return Err(AppError::Provider(format!(
            "provider reported token index {} more than once",
            duplicate.index
        )));
    }

    let errors = response
        .errors
        .into_iter()
        .map(|failure| {
            tokens
                .get(failure.index)
                .map(|token| TokenError {
                    token: token.clone(),
                    error: failure.reason,
                })
                .ok_or_else(|| {
                    AppError::Provider(format!(
                        "provider reported a failure for unknown token index {}",
                        failure.index
                    ))
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let failure_count = errors.len();

    Ok(SubscriptionOutcome {
        success_count: tokens.len() - failure_count,
        failure_count,
        errors,
    })
}
