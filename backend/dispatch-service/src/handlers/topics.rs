/// Topic subscription handlers
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::error::Result;
use crate::AppState;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TopicSubscriptionPayload {
    #[validate(length(min = 1, message = "tokens must contain at least one token"))]
    pub tokens: Vec<String>,
    #[validate(length(min = 1, message = "topic must not be empty"))]
    pub topic: String,
}

/// Subscribe one or more device tokens to a topic
///
/// POST /subscribe-to-topic
pub async fn subscribe_to_topic(
    state: web::Data<AppState>,
    payload: web::Json<TopicSubscriptionPayload>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    payload.validate()?;
    let topic = payload.topic.clone();

    let outcome = state
        .subscriptions
        .subscribe(payload.tokens, payload.topic)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!(
            "{} tokens successfully subscribed to topic '{}'.",
            outcome.success_count, topic
        ),
        "success_count": outcome.success_count,
        "failure_count": outcome.failure_count,
        "errors": outcome.errors,
    })))
}

/// Unsubscribe one or more device tokens from a topic
///
/// POST /unsubscribe-from-topic
pub async fn unsubscribe_from_topic(
    state: web::Data<AppState>,
    payload: web::Json<TopicSubscriptionPayload>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    payload.validate()?;
    let topic = payload.topic.clone();

    let outcome = state
        .subscriptions
        .unsubscribe(payload.tokens, payload.topic)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!(
            "{} tokens successfully unsubscribed from topic '{}'.",
            outcome.success_count, topic
        ),
        "success_count": outcome.success_count,
        "failure_count": outcome.failure_count,
        "errors": outcome.errors,
    })))
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/subscribe-to-topic", web::post().to(subscribe_to_topic))
        .route(
            "/unsubscribe-from-topic",
            web::post().to(unsubscribe_from_topic),
        );
}
