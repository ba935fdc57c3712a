//! [`metrics::Recorder`] implementation for [`MetricStore`].
//!
//! Lets code instrumented with `metrics::counter!` and friends write into
//! the registered families under `metrics::with_local_recorder(&store, ..)`.
//! Keys that do not match a registered family get no-op handles and a
//! diagnostic record.

use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use serde_json::json;

use super::MetricStore;
use crate::diagnostics;

fn key_labels(key: &Key) -> Vec<(&str, &str)> {
    key.labels().map(|l| (l.key(), l.value())).collect()
}

fn unregistered(key: &Key, err: &crate::AnalyticsError) {
    diagnostics::warn(
        "recorder_key_rejected",
        json!({ "metric": key.name(), "error": err.to_string() }),
    );
}

impl Recorder for MetricStore {
    // Descriptions come from the registered descriptors.
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        match self.counter(key.name(), &key_labels(key)) {
            Ok(cell) => Counter::from_arc(cell),
            Err(e) => {
                unregistered(key, &e);
                Counter::noop()
            }
        }
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        match self.gauge(key.name(), &key_labels(key)) {
            Ok(cell) => Gauge::from_arc(cell),
            Err(e) => {
                unregistered(key, &e);
                Gauge::noop()
            }
        }
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        match self.histogram(key.name(), &key_labels(key)) {
            Ok(cell) => Histogram::from_arc(cell),
            Err(e) => {
                unregistered(key, &e);
                Histogram::noop()
            }
        }
    }
}
