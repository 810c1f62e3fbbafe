use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use dispatch_service::{handlers, metrics, AppState, Config, PushProvider};
use fcm_shared::{ClientOptions, FCMClient};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting dispatch service");

    let config = Config::from_env().context("failed to load configuration")?;

    let options = ClientOptions {
        fcm_base_url: config.fcm.api_base_url.clone(),
        iid_base_url: config.fcm.iid_base_url.clone(),
        request_timeout: config.fcm.request_timeout(),
    };
    let fcm_client = FCMClient::from_service_account_file(
        &config.fcm.credentials_path,
        config.fcm.project_id.clone(),
        options,
    )
    .context("failed to initialize FCM client")?;
    tracing::info!(project_id = %fcm_client.project_id, "FCM client initialized");

    let provider: Arc<dyn PushProvider> = Arc::new(fcm_client);
    let state = web::Data::new(AppState::new(provider));

    let addr = config.bind_address();
    tracing::info!(env = %config.app.env, "Starting HTTP server on {}", addr);

    let cors_config = config.cors.clone();
    HttpServer::new(move || {
        let cors = if cors_config.allows_any_origin() {
            Cors::default().allow_any_origin()
        } else {
            cors_config
                .allowed_origins
                .iter()
                .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        }
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(metrics::MetricsMiddleware)
            .configure(handlers::configure)
    })
    .bind(&addr)
    .with_context(|| format!("failed to bind {}", addr))?
    .run()
    .await
    .context("HTTP server error")
}
