/// Dispatch engine behavior against a scripted provider
///
/// Covers:
/// - Routing of each target to the right provider call
/// - Data map construction (reserved keys win over custom data)
/// - Positional correspondence of multicast results
/// - Validation before any provider call
/// - Total provider failure surfacing as an error
mod common;

use common::FakeProvider;
use dispatch_service::models::*;
use dispatch_service::services::provider::MessageTarget;
use dispatch_service::{AppError, DispatchEngine};
use std::collections::HashMap;
use std::sync::Arc;

fn payload(title: &str, body: &str, custom: &[(&str, &str)]) -> NotificationPayload {
    NotificationPayload::new(
        Some(title.to_string()),
        Some(body.to_string()),
        custom
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
    .unwrap()
}

fn tokens(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("tok-{}", i)).collect()
}

fn engine(provider: &Arc<FakeProvider>) -> DispatchEngine {
    DispatchEngine::new(provider.clone())
}

#[tokio::test]
async fn device_dispatch_sends_merged_data_map() {
    let provider = Arc::new(FakeProvider::new());
    let request = DispatchRequest::new(
        payload("Hi", "there", &[("route", "/home")]),
        DeliveryTarget::Device("tok-1".to_string()),
    );

    let outcome = engine(&provider).dispatch(request).await.unwrap();
    assert_eq!(
        outcome,
        DispatchOutcome::Single {
            message_id: "msg-123".to_string()
        }
    );

    let sent = provider.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].target, MessageTarget::Token("tok-1".to_string()));

    let expected: HashMap<String, String> = [("route", "/home"), ("title", "Hi"), ("body", "there")]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert_eq!(sent[0].data, expected);
}

#[tokio::test]
async fn single_targets_make_exactly_one_provider_call() {
    let targets = vec![
        (
            DeliveryTarget::Device("tok-1".to_string()),
            MessageTarget::Token("tok-1".to_string()),
        ),
        (
            DeliveryTarget::Topic("news".to_string()),
            MessageTarget::Topic("news".to_string()),
        ),
        (
            DeliveryTarget::Condition("'A' in topics && 'B' in topics".to_string()),
            MessageTarget::Condition("'A' in topics && 'B' in topics".to_string()),
        ),
    ];

    for (target, expected) in targets {
        let provider = Arc::new(FakeProvider::new());
        let outcome = engine(&provider)
            .dispatch(DispatchRequest::new(payload("Hi", "there", &[]), target))
            .await
            .unwrap();

        match outcome {
            DispatchOutcome::Single { message_id } => assert!(!message_id.is_empty()),
            other => panic!("expected single outcome, got {:?}", other),
        }
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.sent.lock()[0].target, expected);
    }
}

#[tokio::test]
async fn reserved_keys_win_over_custom_data() {
    let provider = Arc::new(FakeProvider::new());
    let request = DispatchRequest::new(
        payload("Hi", "there", &[("title", "spoofed"), ("body", "spoofed")]),
        DeliveryTarget::Topic("news".to_string()),
    );

    engine(&provider).dispatch(request).await.unwrap();

    let sent = provider.sent.lock();
    assert_eq!(sent[0].data.get("title").map(String::as_str), Some("Hi"));
    assert_eq!(sent[0].data.get("body").map(String::as_str), Some("there"));
    assert_eq!(sent[0].data.len(), 2);
}

#[tokio::test]
async fn android_priority_defaults_to_high() {
    let provider = Arc::new(FakeProvider::new());
    let request = DispatchRequest::new(
        payload("Hi", "there", &[]),
        DeliveryTarget::Device("tok-1".to_string()),
    )
    .with_hints(DeliveryHints {
        webpush: Some(serde_json::json!({"headers": {"Urgency": "high"}})),
        ..Default::default()
    });

    engine(&provider).dispatch(request).await.unwrap();

    let sent = provider.sent.lock();
    assert_eq!(
        sent[0].platform.android,
        Some(serde_json::json!({"priority": "high"}))
    );
    assert_eq!(
        sent[0].platform.webpush,
        Some(serde_json::json!({"headers": {"Urgency": "high"}}))
    );
}

#[tokio::test]
async fn multicast_reports_partial_failure_in_order() {
    let provider = Arc::new(FakeProvider::new().with_failing_tokens(&["b"]));
    let request = DispatchRequest::new(
        payload("Hi", "there", &[]),
        DeliveryTarget::MultiDevice(vec!["a".into(), "b".into(), "c".into()]),
    );

    let outcome = engine(&provider).dispatch(request).await.unwrap();
    assert_eq!(
        outcome,
        DispatchOutcome::Batch {
            success_count: 2,
            failure_count: 1,
            results: vec![
                RecipientResult {
                    recipient: "a".into(),
                    success: true,
                    error: None
                },
                RecipientResult {
                    recipient: "b".into(),
                    success: false,
                    error: Some("reason".into())
                },
                RecipientResult {
                    recipient: "c".into(),
                    success: true,
                    error: None
                },
            ],
        }
    );
}

#[tokio::test]
async fn multicast_results_align_with_tokens() {
    for n in [1, 7, MAX_MULTICAST_TOKENS] {
        let requested = tokens(n);
        let failing: Vec<&str> = requested.iter().step_by(3).map(String::as_str).collect();
        let provider = Arc::new(FakeProvider::new().with_failing_tokens(&failing));

        let outcome = engine(&provider)
            .dispatch(DispatchRequest::new(
                payload("Hi", "there", &[]),
                DeliveryTarget::MultiDevice(requested.clone()),
            ))
            .await
            .unwrap();

        match outcome {
            DispatchOutcome::Batch {
                success_count,
                failure_count,
                results,
            } => {
                assert_eq!(results.len(), n);
                assert_eq!(success_count + failure_count, n);
                assert_eq!(failure_count, failing.len());
                for (i, result) in results.iter().enumerate() {
                    assert_eq!(result.recipient, requested[i]);
                }
            }
            other => panic!("expected batch outcome, got {:?}", other),
        }
        assert_eq!(provider.call_count(), 1);
    }
}

#[tokio::test]
async fn empty_multicast_is_rejected_before_provider_call() {
    let provider = Arc::new(FakeProvider::new());
    let result = engine(&provider)
        .dispatch(DispatchRequest::new(
            payload("Hi", "there", &[]),
            DeliveryTarget::MultiDevice(vec![]),
        ))
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn oversized_multicast_is_rejected() {
    let provider = Arc::new(FakeProvider::new());
    let result = engine(&provider)
        .dispatch(DispatchRequest::new(
            payload("Hi", "there", &[]),
            DeliveryTarget::MultiDevice(tokens(MAX_MULTICAST_TOKENS + 1)),
        ))
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn blank_identifiers_are_rejected() {
    let provider = Arc::new(FakeProvider::new());
    let engine = engine(&provider);

    for target in [
        DeliveryTarget::Device(String::new()),
        DeliveryTarget::Topic(String::new()),
        DeliveryTarget::Condition(String::new()),
    ] {
        let result = engine
            .dispatch(DispatchRequest::new(payload("Hi", "there", &[]), target))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn provider_unavailable_is_an_error_for_every_target() {
    let provider = Arc::new(FakeProvider::unavailable());
    let engine = engine(&provider);

    for target in [
        DeliveryTarget::Device("tok-1".to_string()),
        DeliveryTarget::MultiDevice(vec!["a".into(), "b".into()]),
        DeliveryTarget::Topic("news".to_string()),
        DeliveryTarget::Condition("'A' in topics".to_string()),
    ] {
        let result = engine
            .dispatch(DispatchRequest::new(payload("Hi", "there", &[]), target))
            .await;

        match result {
            Err(AppError::Provider(detail)) => assert!(detail.contains("connection refused")),
            other => panic!("expected provider error, got {:?}", other),
        }
    }
}
