//! Metric family descriptors and registration-time validation.

use metrics::Unit;
use serde::Serialize;

use crate::{AnalyticsError, Result};

/// Accumulator kind of a metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
        }
    }
}

/// Static description of a metric family: name, kind, and label keys.
///
/// ```rust
/// # use chat_analytics::store::MetricDescriptor;
/// let messages = MetricDescriptor::counter("chat_messages_total", "Total number of messages")
///     .labels(&["sender"]);
/// assert_eq!(messages.label_keys(), ["sender"]);
/// ```
#[derive(Debug, Clone)]
pub struct MetricDescriptor {
    pub(crate) name: String,
    pub(crate) help: String,
    pub(crate) kind: MetricKind,
    pub(crate) unit: Option<Unit>,
    pub(crate) label_keys: Vec<String>,
    pub(crate) buckets: Vec<f64>,
    pub(crate) max_series: Option<usize>,
}

impl MetricDescriptor {
    fn new(kind: MetricKind, name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            kind,
            unit: None,
            label_keys: Vec::new(),
            buckets: Vec::new(),
            max_series: None,
        }
    }

    pub fn counter(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::new(MetricKind::Counter, name, help)
    }

    pub fn gauge(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::new(MetricKind::Gauge, name, help)
    }

    /// Histogram with the given upper bucket bounds (`+Inf` is implicit).
    pub fn histogram(name: impl Into<String>, help: impl Into<String>, buckets: &[f64]) -> Self {
        let mut d = Self::new(MetricKind::Histogram, name, help);
        d.buckets = buckets.to_vec();
        d
    }

    /// Set the label keys, in the order series are keyed and reported.
    pub fn labels(mut self, keys: &[&str]) -> Self {
        self.label_keys = keys.iter().map(|k| (*k).to_string()).collect();
        self
    }

    pub fn unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Cap the number of distinct series; later label combinations fold
    /// into the overflow series.
    pub fn max_series(mut self, limit: Option<usize>) -> Self {
        self.max_series = limit;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn label_keys(&self) -> &[String] {
        &self.label_keys
    }

    /// Reject malformed names, label keys, and bucket layouts.
    pub(crate) fn validate(&self) -> Result<()> {
        if !is_valid_metric_name(&self.name) {
            return Err(config_err(format!("invalid metric name '{}'", self.name)));
        }
        for (i, key) in self.label_keys.iter().enumerate() {
            if !is_valid_label_key(key) {
                return Err(config_err(format!(
                    "invalid label key '{key}' on metric '{}'",
                    self.name
                )));
            }
            if self.label_keys[..i].contains(key) {
                return Err(config_err(format!(
                    "duplicate label key '{key}' on metric '{}'",
                    self.name
                )));
            }
        }
        if self.max_series == Some(0) {
            return Err(config_err(format!(
                "max_series must be positive on metric '{}'",
                self.name
            )));
        }
        match self.kind {
            MetricKind::Histogram => {
                if self.label_keys.iter().any(|k| k == "le") {
                    return Err(config_err(format!(
                        "histogram '{}' cannot use reserved label 'le'",
                        self.name
                    )));
                }
                if self.buckets.is_empty() {
                    return Err(config_err(format!("histogram '{}' has no buckets", self.name)));
                }
                let ordered = self.buckets.iter().all(|b| b.is_finite())
                    && self.buckets.windows(2).all(|w| w[0] < w[1]);
                if !ordered {
                    return Err(config_err(format!(
                        "histogram '{}' buckets must be finite and strictly increasing",
                        self.name
                    )));
                }
            }
            MetricKind::Counter | MetricKind::Gauge => {
                if !self.buckets.is_empty() {
                    return Err(config_err(format!(
                        "{} '{}' cannot declare buckets",
                        self.kind.as_str(),
                        self.name
                    )));
                }
            }
        }
        Ok(())
    }
}

fn config_err(msg: String) -> AnalyticsError {
    AnalyticsError::Configuration(msg)
}

/// `[a-zA-Z_:][a-zA-Z0-9_:]*`
pub(crate) fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// `[a-zA-Z_][a-zA-Z0-9_]*`, excluding the reserved `__` prefix.
fn is_valid_label_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    !key.starts_with("__") && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
