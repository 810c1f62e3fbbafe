/// HTTP handlers for the dispatch service API
pub mod devices;
pub mod notifications;
pub mod topics;

use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse};

use crate::error::AppError;
use crate::metrics;

pub use devices::register_routes as register_devices;
pub use notifications::register_routes as register_notifications;
pub use topics::register_routes as register_topics;

/// Malformed JSON bodies get the same error shape as validation failures
fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(err.to_string()).into()
}

async fn root() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Welcome to the FCM dispatch service!"
    }))
}

/// Mount every route of the service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .route("/", web::get().to(root))
        .route("/health", web::get().to(|| async { "OK" }))
        .route("/metrics", web::get().to(metrics::serve_metrics));

    register_devices(cfg);
    register_notifications(cfg);
    register_topics(cfg);
}
