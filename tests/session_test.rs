//! Session tracking and conversation-depth gauges.

use std::sync::Arc;

use futures_util::future::join_all;

use chat_analytics::session::SessionTracker;
use chat_analytics::store::MetricStore;
use chat_analytics::{AnalyticsError, telemetry};

fn store() -> Arc<MetricStore> {
    Arc::new(
        MetricStore::builder()
            .namespace("chatbot")
            .register_all(telemetry::catalog(None))
            .build()
            .unwrap(),
    )
}

#[test]
fn three_sessions_of_two_four_six() {
    let store = store();
    let tracker = SessionTracker::new(Arc::clone(&store));

    for (session, messages) in [("user_a", 2), ("user_b", 4), ("user_c", 6)] {
        for _ in 0..messages {
            tracker.record_message(session).unwrap();
        }
    }

    let snapshot = store.snapshot();
    assert_eq!(
        snapshot.counter_value(telemetry::SESSIONS_TOTAL, &[]),
        Some(3.0)
    );
    assert_eq!(
        snapshot.gauge_value(telemetry::MESSAGES_PER_CHAT_AVG, &[]),
        Some(4.0)
    );
    assert_eq!(
        snapshot.gauge_value(telemetry::MESSAGES_PER_CHAT_MAX, &[]),
        Some(6.0)
    );
    assert_eq!(tracker.message_count("user_b"), Some(4));
}

#[test]
fn first_message_opens_session() {
    let tracker = SessionTracker::new(store());
    let first = tracker.record_message("s").unwrap();
    assert!(first.is_new);
    assert_eq!(first.message_count, 1);

    let second = tracker.record_message("s").unwrap();
    assert!(!second.is_new);
    assert_eq!(second.message_count, 2);
}

#[test]
fn empty_session_id_is_invalid() {
    let store = store();
    let tracker = SessionTracker::new(Arc::clone(&store));
    assert!(matches!(
        tracker.record_message(""),
        Err(AnalyticsError::InvalidEvent(_))
    ));
    assert_eq!(
        store.snapshot().counter_value(telemetry::SESSIONS_TOTAL, &[]),
        None
    );
}

#[test]
fn registered_session_counts_with_zero_messages() {
    let store = store();
    let tracker = SessionTracker::new(Arc::clone(&store));

    assert!(tracker.register("idle").unwrap());
    assert!(!tracker.register("idle").unwrap());
    for _ in 0..4 {
        tracker.record_message("busy").unwrap();
    }
    tracker.record_message("idle").unwrap();
    tracker.record_message("idle").unwrap();

    let snapshot = store.snapshot();
    assert_eq!(
        snapshot.counter_value(telemetry::SESSIONS_TOTAL, &[]),
        Some(2.0)
    );
    assert_eq!(
        snapshot.gauge_value(telemetry::MESSAGES_PER_CHAT_AVG, &[]),
        Some(3.0)
    );
    assert_eq!(
        snapshot.gauge_value(telemetry::MESSAGES_PER_CHAT_MAX, &[]),
        Some(4.0)
    );
}

#[test]
fn registering_alone_averages_zero() {
    let store = store();
    let tracker = SessionTracker::new(Arc::clone(&store));
    tracker.register("s1").unwrap();
    let snapshot = store.snapshot();
    assert_eq!(
        snapshot.gauge_value(telemetry::MESSAGES_PER_CHAT_AVG, &[]),
        Some(0.0)
    );
    assert_eq!(tracker.message_count("s1"), Some(0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sessions_keep_average_consistent() {
    let store = store();
    let tracker = Arc::new(SessionTracker::new(Arc::clone(&store)));
    let sessions = 20u64;

    // Session i sends i + 1 messages, interleaved across tasks.
    let handles = (0..sessions).map(|i| {
        let tracker = Arc::clone(&tracker);
        tokio::spawn(async move {
            let id = format!("user_{i}");
            for _ in 0..=i {
                tracker.record_message(&id).unwrap();
                tokio::task::yield_now().await;
            }
        })
    });
    for result in join_all(handles).await {
        result.unwrap();
    }

    let total: u64 = (1..=sessions).sum();
    let depth = tracker.depth();
    assert_eq!(depth.sessions, sessions);
    assert_eq!(depth.messages, total);
    assert_eq!(depth.max_messages, sessions);

    let snapshot = store.snapshot();
    assert_eq!(
        snapshot.counter_value(telemetry::SESSIONS_TOTAL, &[]),
        Some(sessions as f64)
    );
    assert_eq!(
        snapshot.gauge_value(telemetry::MESSAGES_PER_CHAT_AVG, &[]),
        Some(total as f64 / sessions as f64)
    );
    assert_eq!(
        snapshot.gauge_value(telemetry::MESSAGES_PER_CHAT_MAX, &[]),
        Some(sessions as f64)
    );
}
