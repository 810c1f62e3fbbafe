mod common;

use common::FakeProvider;
use dispatch_service::models::{TokenError, TopicOperation, MAX_TOPIC_MANAGEMENT_TOKENS};
use dispatch_service::{AppError, SubscriptionManager};
use std::sync::Arc;

fn tokens(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn subscribe_full_success() {
    let provider = Arc::new(FakeProvider::new());
    let manager = SubscriptionManager::new(provider.clone());

    let outcome = manager
        .subscribe(tokens(&["t1", "t2"]), "news".to_string())
        .await
        .unwrap();

    assert_eq!(outcome.success_count, 2);
    assert_eq!(outcome.failure_count, 0);
    assert!(outcome.errors.is_empty());

    let calls = provider.topic_calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, tokens(&["t1", "t2"]));
    assert_eq!(calls[0].1, "news");
    assert_eq!(calls[0].2, TopicOperation::Subscribe);
}

#[tokio::test]
async fn unsubscribe_itemizes_failed_tokens_only() {
    let provider = Arc::new(FakeProvider::new().with_failing_tokens(&["t2"]));
    let manager = SubscriptionManager::new(provider.clone());

    let outcome = manager
        .unsubscribe(tokens(&["t1", "t2", "t3"]), "news".to_string())
        .await
        .unwrap();

    assert_eq!(outcome.success_count, 2);
    assert_eq!(outcome.failure_count, 1);
    assert_eq!(
        outcome.errors,
        vec![TokenError {
            token: "t2".to_string(),
            error: "reason".to_string()
        }]
    );
    assert_eq!(provider.topic_calls.lock()[0].2, TopicOperation::Unsubscribe);
}

#[tokio::test]
async fn invalid_requests_never_reach_provider() {
    let provider = Arc::new(FakeProvider::new());
    let manager = SubscriptionManager::new(provider.clone());

    let empty_tokens = manager.subscribe(vec![], "news".to_string()).await;
    assert!(matches!(empty_tokens, Err(AppError::Validation(_))));

    let empty_topic = manager.subscribe(tokens(&["t1"]), String::new()).await;
    assert!(matches!(empty_topic, Err(AppError::Validation(_))));

    let oversized: Vec<String> = (0..=MAX_TOPIC_MANAGEMENT_TOKENS)
        .map(|i| format!("tok-{}", i))
        .collect();
    let too_many = manager.unsubscribe(oversized, "news".to_string()).await;
    assert!(matches!(too_many, Err(AppError::Validation(_))));

    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn provider_unavailable_is_an_error() {
    let provider = Arc::new(FakeProvider::unavailable());
    let manager = SubscriptionManager::new(provider);

    match manager.subscribe(tokens(&["t1"]), "news".to_string()).await {
        Err(AppError::Provider(detail)) => assert!(detail.contains("connection refused")),
        other => panic!("expected provider error, got {:?}", other),
    }
}
