use chrono::{Duration, Utc};
use futures::future::join_all;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::errors::FCMError;
use crate::models::*;

/// FCM rejects multicast requests above this many tokens
pub const MAX_MULTICAST_TOKENS: usize = 500;

/// IID batchAdd/batchRemove ceiling
pub const MAX_TOPIC_MANAGEMENT_TOKENS: usize = 1000;

const FCM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const TOPIC_PREFIX: &str = "/topics/";

/// Endpoints and transport settings for the FCM client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub fcm_base_url: String,
    pub iid_base_url: String,
    pub request_timeout: std::time::Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            fcm_base_url: "https://fcm.googleapis.com".to_string(),
            iid_base_url: "https://iid.googleapis.com".to_string(),
            request_timeout: std::time::Duration::from_secs(10),
        }
    }
}

/// Firebase Cloud Messaging Client
///
/// Sends data messages through the FCM HTTP v1 API and manages topic
/// membership through the IID batch API. Manages OAuth2 token generation
/// and caching.
pub struct FCMClient {
    pub project_id: String,
    pub credentials: Arc<ServiceAccountKey>,
    options: ClientOptions,
    token_cache: Arc<Mutex<Option<TokenCache>>>,
    http_client: reqwest::Client,
}

impl FCMClient {
    /// Create new FCM client with default endpoints
    ///
    /// # Arguments
    /// * `project_id` - Firebase project ID
    /// * `credentials` - Service account key with OAuth2 credentials
    pub fn new(project_id: String, credentials: ServiceAccountKey) -> Self {
        Self {
            project_id,
            credentials: Arc::new(credentials),
            options: ClientOptions::default(),
            token_cache: Arc::new(Mutex::new(None)),
            http_client: reqwest::Client::new(),
        }
    }

    /// Create a client with custom endpoints and request timeout
    pub fn with_options(
        project_id: String,
        credentials: ServiceAccountKey,
        options: ClientOptions,
    ) -> Result<Self, FCMError> {
        let http_client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| FCMError::HttpClientError(e.to_string()))?;

        Ok(Self {
            project_id,
            credentials: Arc::new(credentials),
            options,
            token_cache: Arc::new(Mutex::new(None)),
            http_client,
        })
    }

    /// Load a service account JSON file and build a client for its project.
    /// `project_id` overrides the project named in the key file.
    pub fn from_service_account_file(
        path: impl AsRef<Path>,
        project_id: Option<String>,
        options: ClientOptions,
    ) -> Result<Self, FCMError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| FCMError::CredentialsError(format!("{}: {}", path.display(), e)))?;
        let credentials: ServiceAccountKey = serde_json::from_str(&raw)
            .map_err(|e| FCMError::CredentialsError(format!("{}: {}", path.display(), e)))?;

        let project_id = project_id.unwrap_or_else(|| credentials.project_id.clone());
        info!(
            project_id = %project_id,
            client_email = %credentials.client_email,
            "Loaded FCM service account"
        );

        Self::with_options(project_id, credentials, options)
    }

    /// Send a data message to one token, topic or condition.
    /// Returns the message name assigned by FCM.
    pub async fn send(&self, message: &Message) -> Result<String, FCMError> {
        let access_token = self.get_access_token().await?;
        let message_id = self
            .post_message(&access_token, &message.target, &message.data, &message.platform)
            .await?;

        debug!(message_id = %message_id, "FCM message sent");
        Ok(message_id)
    }

    /// Send the same data message to every token, one request per token.
    ///
    /// Per-token failures are reported inside the batch. The call itself
    /// fails when no token could be attempted, or when FCM could not be
    /// reached for any of them.
    pub async fn send_each_for_multicast(
        &self,
        message: &MulticastMessage,
    ) -> Result<BatchResponse, FCMError> {
        if message.tokens.is_empty() {
            return Err(FCMError::InvalidArgument(
                "tokens must not be empty".to_string(),
            ));
        }
        if message.tokens.len() > MAX_MULTICAST_TOKENS {
            return Err(FCMError::InvalidArgument(format!(
                "tokens must not contain more than {} items",
                MAX_MULTICAST_TOKENS
            )));
        }

        let access_token = self.get_access_token().await?;

        // join_all yields results in input order
        let mut results = join_all(
            message
                .tokens
                .iter()
                .map(|token| self.send_to_token(&access_token, token, message)),
        )
        .await;

        let unreachable = results
            .iter()
            .all(|result| matches!(result, Err(FCMError::SendRequestError(_))));
        if unreachable {
            warn!(
                "FCM unreachable for all {} multicast tokens",
                message.tokens.len()
            );
            if let Some(Err(e)) = results.pop() {
                return Err(e);
            }
        }

        let responses = results
            .into_iter()
            .map(|result| match result {
                Ok(message_id) => SendResponse::sent(message_id),
                Err(e) => SendResponse::failed(e.to_string()),
            })
            .collect();

        let batch = BatchResponse::from_responses(responses);
        info!(
            "{} messages were sent successfully, {} failed",
            batch.success_count, batch.failure_count
        );

        Ok(batch)
    }

    /// Subscribe device tokens to a topic
    pub async fn subscribe_to_topic(
        &self,
        device_tokens: &[String],
        topic: &str,
    ) -> Result<TopicManagementResponse, FCMError> {
        self.manage_topic(device_tokens, topic, TopicOperation::Subscribe)
            .await
    }

    /// Unsubscribe device tokens from a topic
    pub async fn unsubscribe_from_topic(
        &self,
        device_tokens: &[String],
        topic: &str,
    ) -> Result<TopicManagementResponse, FCMError> {
        self.manage_topic(device_tokens, topic, TopicOperation::Unsubscribe)
            .await
    }

    /// Add or remove topic membership for a batch of tokens
    pub async fn manage_topic(
        &self,
        device_tokens: &[String],
        topic: &str,
        operation: TopicOperation,
    ) -> Result<TopicManagementResponse, FCMError> {
        if device_tokens.is_empty() {
            return Err(FCMError::InvalidArgument(
                "tokens must not be empty".to_string(),
            ));
        }
        if device_tokens.len() > MAX_TOPIC_MANAGEMENT_TOKENS {
            return Err(FCMError::InvalidArgument(format!(
                "tokens must not contain more than {} items",
                MAX_TOPIC_MANAGEMENT_TOKENS
            )));
        }
        if topic.is_empty() {
            return Err(FCMError::InvalidArgument("topic must not be empty".to_string()));
        }

        let access_token = self.get_access_token().await?;

        let url = format!(
            "{}/{}",
            self.options.iid_base_url.trim_end_matches('/'),
            operation.endpoint()
        );
        let body = IidBatchRequest {
            to: normalize_topic(topic),
            registration_tokens: device_tokens,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&access_token)
            .header("access_token_auth", "true")
            .json(&body)
            .send()
            .await
            .map_err(|e| FCMError::TopicManagementError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let batch: IidBatchResponse = response
            .json()
            .await
            .map_err(|e| FCMError::ResponseParseError(e.to_string()))?;

        if batch.results.len() != device_tokens.len() {
            return Err(FCMError::ResponseParseError(format!(
                "expected {} topic management results, got {}",
                device_tokens.len(),
                batch.results.len()
            )));
        }

        let errors: Vec<TopicManagementError> = batch
            .results
            .into_iter()
            .enumerate()
            .filter_map(|(index, result)| {
                result.error.map(|reason| TopicManagementError { index, reason })
            })
            .collect();

        let failure_count = errors.len();
        let success_count = device_tokens.len() - failure_count;
        info!(
            topic = %topic,
            operation = operation.as_str(),
            "{} tokens were processed successfully, {} failed",
            success_count,
            failure_count
        );

        Ok(TopicManagementResponse {
            success_count,
            failure_count,
            errors,
        })
    }

    /// Get access token from service account (with caching)
    pub async fn get_access_token(&self) -> Result<String, FCMError> {
        // Held across the refresh so concurrent callers wait for one exchange
        let mut cache = self.token_cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            let now = Utc::now().timestamp();
            if cached.expires_at > now + 60 {
                // Token is still valid for at least 60 more seconds
                return Ok(cached.access_token.clone());
            }
        }

        let token_response = self.fetch_access_token().await?;

        let expires_at = Utc::now().timestamp() + token_response.expires_in;
        *cache = Some(TokenCache {
            access_token: token_response.access_token.clone(),
            expires_at,
        });

        Ok(token_response.access_token)
    }

    async fn fetch_access_token(&self) -> Result<GoogleTokenResponse, FCMError> {
        let now = Utc::now();
        let exp = (now + Duration::hours(1)).timestamp();
        let iat = now.timestamp();

        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            sub: self.credentials.client_email.clone(),
            scope: FCM_SCOPE.to_string(),
            aud: self.credentials.token_uri.clone(),
            exp,
            iat,
        };

        // Sign JWT with private key
        let encoding_key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| FCMError::KeyParseError(e.to_string()))?;

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.credentials.private_key_id.clone());

        let token = encode(&header, &claims, &encoding_key)
            .map_err(|e| FCMError::JwtEncodeError(e.to_string()))?;

        // Exchange JWT for access token
        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", token.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.credentials.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| FCMError::TokenError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FCMError::TokenRequestFailed(token_error_detail(status, &body)));
        }

        response
            .json()
            .await
            .map_err(|e| FCMError::TokenParseError(e.to_string()))
    }

    async fn send_to_token(
        &self,
        access_token: &str,
        token: &str,
        message: &MulticastMessage,
    ) -> Result<String, FCMError> {
        let target = MessageTarget::Token(token.to_string());
        let result = self
            .post_message(access_token, &target, &message.data, &message.platform)
            .await;

        if let Err(e) = &result {
            warn!(token = %token, error = %e, "FCM multicast delivery failed for token");
        }
        result
    }

    async fn post_message(
        &self,
        access_token: &str,
        target: &MessageTarget,
        data: &HashMap<String, String>,
        platform: &PlatformConfig,
    ) -> Result<String, FCMError> {
        let message = FcmMessage {
            message: FcmMessageContent::new(target, data, platform),
        };

        let url = format!(
            "{}/v1/projects/{}/messages:send",
            self.options.fcm_base_url.trim_end_matches('/'),
            self.project_id
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(access_token)
            .json(&message)
            .send()
            .await
            .map_err(|e| FCMError::SendRequestError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let fcm_response: FcmApiResponse = response
            .json()
            .await
            .map_err(|e| FCMError::ResponseParseError(e.to_string()))?;

        fcm_response
            .name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| FCMError::ResponseParseError("missing message name".to_string()))
    }
}

/// Topic names are addressed as `/topics/<name>` by the IID API
pub fn normalize_topic(topic: &str) -> String {
    if topic.starts_with(TOPIC_PREFIX) {
        topic.to_string()
    } else {
        format!("{}{}", TOPIC_PREFIX, topic)
    }
}

/// OAuth2 errors come back as `{"error": .., "error_description": ..}`
fn token_error_detail(status: reqwest::StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<GoogleOAuthError>(body)
        .ok()
        .map(|e| match e.error_description {
            Some(description) => format!("{}: {}", e.error, description),
            None => e.error,
        })
        .unwrap_or_else(|| body.trim().to_string());

    if detail.is_empty() {
        status.to_string()
    } else {
        format!("{} - {}", status, detail)
    }
}

async fn api_error(response: reqwest::Response) -> FCMError {
    let status = response.status();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    let message = serde_json::from_str::<GoogleErrorEnvelope>(&text)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or(text);

    FCMError::ApiError(status.to_string(), message)
}
