/// Notification send handlers
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::info;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{
    DeliveryHints, DeliveryTarget, DispatchOutcome, DispatchRequest, NotificationPayload,
};
use crate::AppState;

/// Fields shared by every send payload
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationFields {
    pub title: Option<String>,
    pub body: Option<String>,
    /// Custom key/value data delivered alongside title and body
    #[serde(default)]
    pub data: Option<HashMap<String, String>>,
    #[serde(default)]
    pub android: Option<serde_json::Value>,
    #[serde(default)]
    pub apns: Option<serde_json::Value>,
    #[serde(default)]
    pub webpush: Option<serde_json::Value>,
}

impl NotificationFields {
    fn into_request(self, target: DeliveryTarget) -> Result<DispatchRequest> {
        let payload =
            NotificationPayload::new(self.title, self.body, self.data.unwrap_or_default())?;
        let hints = DeliveryHints {
            android: self.android,
            apns: self.apns,
            webpush: self.webpush,
        };

        Ok(DispatchRequest::new(payload, target).with_hints(hints))
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendToDevicePayload {
    #[serde(flatten)]
    pub notification: NotificationFields,
    #[validate(length(min = 1, message = "token must not be empty"))]
    pub token: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendToMultipleDevicesPayload {
    #[serde(flatten)]
    pub notification: NotificationFields,
    #[validate(length(min = 1, message = "tokens must contain at least one token"))]
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendToTopicPayload {
    #[serde(flatten)]
    pub notification: NotificationFields,
    #[validate(length(min = 1, message = "topic must not be empty"))]
    pub topic: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendToConditionPayload {
    #[serde(flatten)]
    pub notification: NotificationFields,
    #[validate(length(min = 1, message = "condition must not be empty"))]
    pub condition: String,
}

/// Send a notification to one device token
///
/// POST /send-notification-to-device
pub async fn send_notification_to_device(
    state: web::Data<AppState>,
    payload: web::Json<SendToDevicePayload>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    payload.validate()?;
    info!(token = %payload.token, "Attempting to send notification to device");

    let request = payload
        .notification
        .into_request(DeliveryTarget::Device(payload.token))?;
    let outcome = state.dispatch.dispatch(request).await?;

    single_response("Notification sent successfully.", outcome)
}

/// Send a notification to a list of device tokens
///
/// POST /send-notification-to-multiple-devices
pub async fn send_notification_to_multiple_devices(
    state: web::Data<AppState>,
    payload: web::Json<SendToMultipleDevicesPayload>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    payload.validate()?;

    let request = payload
        .notification
        .into_request(DeliveryTarget::MultiDevice(payload.tokens))?;

    match state.dispatch.dispatch(request).await? {
        DispatchOutcome::Batch {
            success_count,
            failure_count,
            results,
        } => {
            let responses: Vec<serde_json::Value> = results
                .into_iter()
                .map(|r| json!({"token": r.recipient, "success": r.success, "error": r.error}))
                .collect();

            Ok(HttpResponse::Ok().json(json!({
                "message": format!("{} notifications sent successfully.", success_count),
                "success_count": success_count,
                "failure_count": failure_count,
                "responses": responses,
            })))
        }
        DispatchOutcome::Single { .. } => Err(AppError::Internal(
            "multicast dispatch returned a single outcome".to_string(),
        )),
    }
}

/// Send a notification to every subscriber of a topic
///
/// POST /send-notification-to-topic
pub async fn send_notification_to_topic(
    state: web::Data<AppState>,
    payload: web::Json<SendToTopicPayload>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    payload.validate()?;
    info!(topic = %payload.topic, "Attempting to send notification to topic");

    let request = payload
        .notification
        .into_request(DeliveryTarget::Topic(payload.topic))?;
    let outcome = state.dispatch.dispatch(request).await?;

    single_response("Topic notification sent successfully.", outcome)
}

/// Send a notification to devices matching a topic condition,
/// e.g. `'TopicA' in topics && 'TopicB' in topics`
///
/// POST /send-notification-by-condition
pub async fn send_notification_by_condition(
    state: web::Data<AppState>,
    payload: web::Json<SendToConditionPayload>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    payload.validate()?;
    info!(condition = %payload.condition, "Attempting to send notification by condition");

    let request = payload
        .notification
        .into_request(DeliveryTarget::Condition(payload.condition))?;
    let outcome = state.dispatch.dispatch(request).await?;

    single_response("Condition notification sent successfully.", outcome)
}

fn single_response(message: &str, outcome: DispatchOutcome) -> Result<HttpResponse> {
    match outcome {
        DispatchOutcome::Single { message_id } => Ok(HttpResponse::Ok().json(json!({
            "message": message,
            "response_id": message_id,
        }))),
        DispatchOutcome::Batch { .. } => Err(AppError::Internal(
            "single dispatch returned a batch outcome".to_string(),
        )),
    }
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/send-notification-to-device",
        web::post().to(send_notification_to_device),
    )
    .route(
        "/send-notification-to-multiple-devices",
        web::post().to(send_notification_to_multiple_devices),
    )
    .route(
        "/send-notification-to-topic",
        web::post().to(send_notification_to_topic),
    )
    .route(
        "/send-notification-by-condition",
        web::post().to(send_notification_by_condition),
    );
}
