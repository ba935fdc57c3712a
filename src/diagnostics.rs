//! Structured diagnostic records.
//!
//! Every record carries `component`, `event`, and a JSON `data` payload.
//! These are the engine's only health signal; metric failures never
//! surface to the host's chat turn.

use serde_json::{Value, json};

use crate::AnalyticsError;

/// Value of the `component` field on every diagnostic record.
pub const COMPONENT: &str = "chat_analytics";

pub(crate) fn info(event: &str, data: Value) {
    tracing::info!(component = COMPONENT, event, data = %data, "analytics lifecycle");
}

pub(crate) fn warn(event: &str, data: Value) {
    tracing::warn!(component = COMPONENT, event, data = %data, "analytics warning");
}

pub(crate) fn error(event: &str, data: Value) {
    tracing::error!(component = COMPONENT, event, data = %data, "analytics error");
}

/// Record a failed update under the given event name.
///
/// An unavailable scorer is reported once by the loader, so repeats are
/// demoted to debug.
pub(crate) fn failure(event: &str, err: &AnalyticsError) {
    let data = json!({ "error": err.to_string(), "kind": err.event_name() });
    match err {
        AnalyticsError::DependencyUnavailable(_) => {
            tracing::debug!(component = COMPONENT, event, data = %data, "analytics skipped");
        }
        _ => error(event, data),
    }
}
