//! Feedback token validation and thumbs-up/down accounting.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde_json::{Value, json};
use sha2::Sha256;

use chat_analytics::events::FeedbackReceived;
use chat_analytics::feedback::{self, FeedbackValidator};
use chat_analytics::{
    AnalyticsConfig, AuthError, ChatAnalytics, FeedbackConfig, FeedbackVote, telemetry,
};

const SECRET: &[u8] = b"jwt-secret";
const PREFIX: &str = "user_";

// ============================================================================
// Token helpers
// ============================================================================

fn encode(value: &Value) -> String {
    URL_SAFE_NO_PAD.encode(value.to_string())
}

fn sign_with(header: &Value, claims: &Value, secret: &[u8]) -> String {
    let signing_input = format!("{}.{}", encode(header), encode(claims));
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).unwrap();
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    format!("{signing_input}.{signature}")
}

fn sign(claims: &Value, secret: &[u8]) -> String {
    sign_with(&json!({ "alg": "HS256", "typ": "JWT" }), claims, secret)
}

fn analytics() -> ChatAnalytics {
    ChatAnalytics::builder()
        .config(AnalyticsConfig::default().with_feedback(FeedbackConfig::new(
            "jwt-secret",
            PREFIX,
        )))
        .build()
        .unwrap()
}

fn thumbs(analytics: &ChatAnalytics) -> (Option<f64>, Option<f64>) {
    let snapshot = analytics.snapshot();
    (
        snapshot.counter_value(telemetry::FEEDBACK_THUMB_UP_TOTAL, &[]),
        snapshot.counter_value(telemetry::FEEDBACK_THUMB_DOWN_TOTAL, &[]),
    )
}

// ============================================================================
// Validator
// ============================================================================

#[test]
fn valid_token_returns_session_id() {
    let token = sign(&json!({ "sub": "user_123" }), SECRET);
    assert_eq!(
        feedback::validate(&token, SECRET, PREFIX),
        Ok("user_123".to_string())
    );
}

#[test]
fn user_id_claim_is_accepted() {
    let token = sign(&json!({ "user_id": "user_9", "exp": 0 }), SECRET);
    assert_eq!(
        feedback::validate(&token, SECRET, PREFIX),
        Ok("user_9".to_string())
    );
}

#[test]
fn wrong_secret_is_invalid_signature() {
    let token = sign(&json!({ "sub": "user_123" }), b"other-secret");
    assert_eq!(
        feedback::validate(&token, SECRET, PREFIX),
        Err(AuthError::InvalidSignature)
    );
}

#[test]
fn tampered_payload_is_invalid_signature() {
    let token = sign(&json!({ "sub": "admin_1" }), SECRET);
    let forged = encode(&json!({ "sub": "user_1" }));
    let mut parts: Vec<&str> = token.split('.').collect();
    parts[1] = &forged;
    assert_eq!(
        feedback::validate(&parts.join("."), SECRET, PREFIX),
        Err(AuthError::InvalidSignature)
    );
}

#[test]
fn other_algorithms_are_rejected() {
    let token = sign_with(
        &json!({ "alg": "none" }),
        &json!({ "sub": "user_1" }),
        SECRET,
    );
    assert_eq!(
        feedback::validate(&token, SECRET, PREFIX),
        Err(AuthError::InvalidSignature)
    );
}

#[test]
fn wrong_prefix_is_prefix_mismatch() {
    let token = sign(&json!({ "sub": "admin_1" }), SECRET);
    assert_eq!(
        feedback::validate(&token, SECRET, PREFIX),
        Err(AuthError::PrefixMismatch {
            subject: "admin_1".to_string(),
            prefix: PREFIX.to_string(),
        })
    );
}

#[test]
fn missing_subject_is_prefix_mismatch() {
    let token = sign(&json!({ "name": "anon" }), SECRET);
    assert!(matches!(
        feedback::validate(&token, SECRET, PREFIX),
        Err(AuthError::PrefixMismatch { .. })
    ));
}

#[test]
fn validation_is_idempotent() {
    let validator = FeedbackValidator::new(SECRET, PREFIX);
    let token = sign(&json!({ "sub": "user_1" }), SECRET);
    let header = format!("Bearer {token}");
    for _ in 0..3 {
        assert_eq!(validator.validate_header(Some(header.as_str())), Ok("user_1".into()));
    }
}

// ============================================================================
// Facade
// ============================================================================

#[test]
fn thumb_up_counts_once() {
    let analytics = analytics();
    let token = sign(&json!({ "sub": "user_1" }), SECRET);

    let vote = analytics
        .on_feedback(&FeedbackReceived::new(format!("Bearer {token}"), Some(true)))
        .unwrap();
    assert_eq!(vote, FeedbackVote::Up);
    assert_eq!(thumbs(&analytics), (Some(1.0), None));
}

#[test]
fn absent_or_false_value_is_thumb_down() {
    let analytics = analytics();
    let token = sign(&json!({ "sub": "user_1" }), SECRET);

    assert_eq!(
        analytics.record_feedback(&token, None),
        Ok(FeedbackVote::Down)
    );
    assert_eq!(
        analytics.record_feedback(&token, Some(false)),
        Ok(FeedbackVote::Down)
    );
    assert_eq!(thumbs(&analytics), (None, Some(2.0)));
}

#[test]
fn rejected_feedback_counts_nothing() {
    let analytics = analytics();
    let bad = sign(&json!({ "sub": "user_1" }), b"nope");
    let foreign = sign(&json!({ "sub": "guest_1" }), SECRET);

    assert_eq!(
        analytics.record_feedback(&bad, Some(true)),
        Err(AuthError::InvalidSignature)
    );
    assert!(matches!(
        analytics.record_feedback(&foreign, Some(true)),
        Err(AuthError::PrefixMismatch { .. })
    ));
    assert_eq!(
        analytics.on_feedback(&FeedbackReceived {
            authorization: None,
            value: Some(true),
        }),
        Err(AuthError::MissingToken)
    );
    assert_eq!(thumbs(&analytics), (None, None));
}

#[test]
fn unconfigured_feedback_is_rejected() {
    let analytics = ChatAnalytics::builder().build().unwrap();
    let token = sign(&json!({ "sub": "user_1" }), SECRET);
    assert_eq!(
        analytics.record_feedback(&token, Some(true)),
        Err(AuthError::NotConfigured)
    );
}
