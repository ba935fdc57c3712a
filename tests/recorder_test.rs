//! `metrics` facade integration: the store as a `metrics::Recorder`.

use chat_analytics::store::MetricStore;
use chat_analytics::telemetry;

fn store() -> MetricStore {
    MetricStore::builder()
        .namespace("chatbot")
        .register_all(telemetry::catalog(None))
        .build()
        .unwrap()
}

#[test]
fn macros_write_into_registered_families() {
    let store = store();

    metrics::with_local_recorder(&store, || {
        metrics::counter!("chatbot_chat_messages_total", "sender" => "user").increment(2);
        metrics::counter!("chat_messages_total", "sender" => "user").increment(1);
        metrics::gauge!("chat_messages_per_chat_max").set(6.0);
        metrics::histogram!("chat_sentiment_score", "sender" => "user").record(0.5);
    });

    let snapshot = store.snapshot();
    assert_eq!(
        snapshot.counter_value(telemetry::MESSAGES_TOTAL, &[("sender", "user")]),
        Some(3.0)
    );
    assert_eq!(
        snapshot.gauge_value(telemetry::MESSAGES_PER_CHAT_MAX, &[]),
        Some(6.0)
    );
    let h = snapshot
        .histogram(telemetry::SENTIMENT_SCORE, &[("sender", "user")])
        .unwrap();
    assert_eq!(h.count, 1);
    assert_eq!(h.sum, 0.5);
}

#[test]
fn recorder_and_direct_calls_share_series() {
    let store = store();
    store
        .inc(telemetry::FEEDBACK_THUMB_UP_TOTAL, &[])
        .unwrap();
    metrics::with_local_recorder(&store, || {
        metrics::counter!("feedback_thumb_up_total").increment(1);
    });
    assert_eq!(
        store
            .snapshot()
            .counter_value(telemetry::FEEDBACK_THUMB_UP_TOTAL, &[]),
        Some(2.0)
    );
}

#[test]
fn unregistered_keys_are_dropped() {
    let store = store();
    metrics::with_local_recorder(&store, || {
        metrics::counter!("not_a_metric_total").increment(1);
        // Registered name, wrong labels.
        metrics::counter!("chat_messages_total", "who" => "user").increment(1);
        // Registered name, wrong kind.
        metrics::gauge!("chat_messages_total", "sender" => "user").set(1.0);
    });

    let snapshot = store.snapshot();
    assert!(snapshot.family("not_a_metric_total").is_none());
    assert_eq!(
        snapshot.counter_total(telemetry::MESSAGES_TOTAL),
        0.0
    );
}

#[test]
fn counter_absolute_never_decreases() {
    let store = store();
    metrics::with_local_recorder(&store, || {
        let counter = metrics::counter!("chat_sessions_total");
        counter.absolute(10);
        counter.absolute(4);
    });
    assert_eq!(
        store
            .snapshot()
            .counter_value(telemetry::SESSIONS_TOTAL, &[]),
        Some(10.0)
    );
}
