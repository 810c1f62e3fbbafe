pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
pub use services::*;

use std::sync::Arc;

/// Shared state handed to every HTTP worker
pub struct AppState {
    pub dispatch: DispatchEngine,
    pub subscriptions: SubscriptionManager,
    pub registry: TokenRegistry,
}

impl AppState {
    pub fn new(provider: Arc<dyn PushProvider>) -> Self {
        Self {
            dispatch: DispatchEngine::new(provider.clone()),
            subscriptions: SubscriptionManager::new(provider),
            registry: TokenRegistry::new(),
        }
    }
}
