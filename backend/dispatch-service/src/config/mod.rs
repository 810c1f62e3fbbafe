use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub fcm: FcmConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FcmConfig {
    /// Path to the Firebase service account JSON
    pub credentials_path: String,
    /// Overrides the project id from the service account file
    pub project_id: Option<String>,
    pub request_timeout_secs: u64,
    pub api_base_url: String,
    pub iid_base_url: String,
}

impl FcmConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// `*` allows any origin
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; missing keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = get("APP_PORT", "8000")
            .parse::<u16>()
            .map_err(|e| AppError::Config(format!("APP_PORT must be a valid u16: {}", e)))?;

        let request_timeout_secs = get("FCM_REQUEST_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .map_err(|e| {
                AppError::Config(format!("FCM_REQUEST_TIMEOUT_SECS must be a valid u64: {}", e))
            })?;
        if request_timeout_secs == 0 {
            return Err(AppError::Config(
                "FCM_REQUEST_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        let allowed_origins: Vec<String> = get("CORS_ALLOWED_ORIGINS", "*")
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Config {
            app: AppConfig {
                env: get("APP_ENV", "development"),
                host: get("APP_HOST", "0.0.0.0"),
                port,
            },
            fcm: FcmConfig {
                credentials_path: get(
                    "GOOGLE_APPLICATION_CREDENTIALS",
                    "service-account-file.json",
                ),
                project_id: lookup("FCM_PROJECT_ID").filter(|id| !id.is_empty()),
                request_timeout_secs,
                api_base_url: get("FCM_API_BASE_URL", "https://fcm.googleapis.com"),
                iid_base_url: get("FCM_IID_BASE_URL", "https://iid.googleapis.com"),
            },
            cors: CorsConfig { allowed_origins },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}
