//! Immutable point-in-time view of the metric store.
//!
//! Each series is read atomically, but a snapshot as a whole is not a
//! consistent cut across series: updates racing with [`MetricStore::snapshot`]
//! may be reflected in some series and not others.
//!
//! [`MetricStore::snapshot`]: super::MetricStore::snapshot

use serde::Serialize;

use super::MetricKind;

/// All registered metric families, sorted by name.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub families: Vec<FamilySnapshot>,
}

/// One metric family and its series, sorted by label values.
#[derive(Debug, Clone, Serialize)]
pub struct FamilySnapshot {
    /// Exposed name, including the namespace prefix.
    pub name: String,
    /// Name the family was registered under, without namespace.
    #[serde(skip)]
    pub base_name: String,
    pub help: String,
    pub kind: MetricKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub series: Vec<SeriesSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesSnapshot {
    /// Label pairs in the family's declared key order.
    pub labels: Vec<(String, String)>,
    pub value: SeriesValue,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SeriesValue {
    Scalar(f64),
    Histogram(HistogramSnapshot),
}

/// Histogram state: cumulative counts per finite bound, plus sum and count.
///
/// The implicit `+Inf` bucket equals `count`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSnapshot {
    pub buckets: Vec<(f64, u64)>,
    pub sum: f64,
    pub count: u64,
}

impl MetricsSnapshot {
    /// Find a family by exposed or registered name.
    pub fn family(&self, name: &str) -> Option<&FamilySnapshot> {
        self.families
            .iter()
            .find(|f| f.name == name || f.base_name == name)
    }

    /// Value of a counter series, if it has been touched.
    pub fn counter_value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.scalar(name, MetricKind::Counter, labels)
    }

    /// Value of a gauge series, if it has been touched.
    pub fn gauge_value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.scalar(name, MetricKind::Gauge, labels)
    }

    pub fn histogram(&self, name: &str, labels: &[(&str, &str)]) -> Option<&HistogramSnapshot> {
        match &self.series(name, MetricKind::Histogram, labels)?.value {
            SeriesValue::Histogram(h) => Some(h),
            SeriesValue::Scalar(_) => None,
        }
    }

    /// Sum of a counter across every series of the family.
    pub fn counter_total(&self, name: &str) -> f64 {
        self.family(name)
            .filter(|f| f.kind == MetricKind::Counter)
            .map(|f| {
                f.series
                    .iter()
                    .filter_map(|s| match s.value {
                        SeriesValue::Scalar(v) => Some(v),
                        SeriesValue::Histogram(_) => None,
                    })
                    .fold(0.0, |acc, v| acc + v)
            })
            .unwrap_or(0.0)
    }

    fn scalar(&self, name: &str, kind: MetricKind, labels: &[(&str, &str)]) -> Option<f64> {
        match self.series(name, kind, labels)?.value {
            SeriesValue::Scalar(v) => Some(v),
            SeriesValue::Histogram(_) => None,
        }
    }

    fn series(
        &self,
        name: &str,
        kind: MetricKind,
        labels: &[(&str, &str)],
    ) -> Option<&SeriesSnapshot> {
        let family = self.family(name).filter(|f| f.kind == kind)?;
        family.series.iter().find(|s| s.matches(labels))
    }
}

impl SeriesSnapshot {
    /// Order-insensitive comparison against label pairs.
    fn matches(&self, labels: &[(&str, &str)]) -> bool {
        self.labels.len() == labels.len()
            && labels
                .iter()
                .all(|(k, v)| self.labels.iter().any(|(sk, sv)| sk == k && sv == v))
    }
}
