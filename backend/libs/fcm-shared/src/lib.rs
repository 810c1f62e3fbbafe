/// FCM Shared Library
///
/// Firebase Cloud Messaging (FCM) client used by the dispatch service to
/// deliver data messages and manage topic membership.
///
/// It handles:
/// - OAuth2 token generation using Google service accounts
/// - Token caching with automatic refresh
/// - Single sends to a token, topic or condition
/// - Multicast delivery with per-token results
/// - Topic subscribe/unsubscribe through the IID batch API

pub mod client;
pub mod models;
pub mod errors;

pub use client::{ClientOptions, FCMClient, MAX_MULTICAST_TOKENS, MAX_TOPIC_MANAGEMENT_TOKENS};
pub use models::{
    BatchResponse, Message, MessageTarget, MulticastMessage, PlatformConfig, SendResponse,
    ServiceAccountKey, TopicManagementError, TopicManagementResponse, TopicOperation,
};
pub use errors::FCMError;
