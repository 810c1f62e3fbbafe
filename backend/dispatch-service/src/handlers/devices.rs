/// Device token registration handlers
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::error::Result;
use crate::AppState;

/// Register device token request
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct RegisterTokenPayload {
    #[validate(length(min = 1, message = "token must not be empty"))]
    pub token: String,
}

/// Register a device token
///
/// POST /register-token
pub async fn register_token(
    state: web::Data<AppState>,
    payload: web::Json<RegisterTokenPayload>,
) -> Result<HttpResponse> {
    payload.validate()?;
    let registration = state.registry.register(&payload.token);

    let message = if registration.newly_registered {
        "Token registered successfully."
    } else {
        "Token was already registered."
    };

    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "registered_tokens_count": registration.registered_count,
        "last_registered_token": payload.token,
    })))
}

/// List registered device tokens
///
/// GET /registered-tokens
pub async fn registered_tokens(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "Registered device tokens:",
        "tokens": state.registry.tokens(),
    }))
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/register-token", web::post().to(register_token))
        .route("/registered-tokens", web::get().to(registered_tokens));
}
