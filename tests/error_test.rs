use chat_analytics::{AnalyticsError, AuthError, Result};

#[test]
fn test_error_display() {
    let err = AnalyticsError::UnknownMetric("chat_nope_total".to_string());
    assert!(err.to_string().contains("chat_nope_total"));
}

#[test]
fn test_kind_mismatch_display() {
    let err = AnalyticsError::KindMismatch {
        name: "chat_sessions_total".into(),
        expected: "gauge",
        actual: "counter",
    };
    let msg = err.to_string();
    assert!(msg.contains("counter"));
    assert!(msg.contains("gauge"));
}

#[test]
fn test_result_alias() {
    fn returns_error() -> Result<()> {
        Err(AnalyticsError::Configuration("bad namespace".into()))
    }
    assert!(returns_error().is_err());
}

#[test]
fn test_question_mark_lifts_auth_errors() {
    fn check() -> Result<()> {
        Err::<(), _>(AuthError::MissingToken)?;
        Ok(())
    }
    assert!(matches!(
        check(),
        Err(AnalyticsError::Auth(AuthError::MissingToken))
    ));
}

#[test]
fn test_json_errors_convert() {
    fn parse() -> Result<serde_json::Value> {
        Ok(serde_json::from_str("{not json")?)
    }
    assert!(matches!(parse(), Err(AnalyticsError::Json(_))));
}

// ============================================================================
// Diagnostic event names
// ============================================================================

#[test]
fn scoring_errors_map_to_lifecycle_events() {
    assert_eq!(
        AnalyticsError::DependencyUnavailable("x".into()).event_name(),
        "model_unavailable"
    );
    assert_eq!(
        AnalyticsError::ScoringFailure("x".into()).event_name(),
        "sentiment_analysis_error"
    );
    assert_eq!(
        AnalyticsError::TransientIo("x".into()).event_name(),
        "model_load_timeout"
    );
}

#[test]
fn payload_errors_are_invalid_events() {
    assert_eq!(
        AnalyticsError::InvalidEvent("empty session id".into()).event_name(),
        "invalid_event"
    );
    assert_eq!(
        AnalyticsError::LabelMismatch {
            name: "x".into(),
            expected: vec!["sender".into()],
        }
        .event_name(),
        "metric_update_error"
    );
}
