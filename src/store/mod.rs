//! Thread-safe registry of counters, gauges, and histograms.
//!
//! Families are registered up front through [`MetricStoreBuilder`]; label
//! keys and bucket layouts are validated there, so steady-state recording
//! only fails for structural mistakes (unknown name, wrong kind, wrong
//! label keys) or non-finite values.
//!
//! # Concurrency
//!
//! The family table is immutable after [`build()`](MetricStoreBuilder::build).
//! Each family guards its series map with its own `RwLock`, taken for
//! writing only when a new label combination first appears (double-checked
//! locking, same as lazy model loading). Updates to an existing series go
//! through atomics on an `Arc`ed cell, so unrelated keys never contend and
//! concurrent increments on one key are never lost.

mod cell;
mod descriptor;
mod recorder;
mod snapshot;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::json;

use crate::diagnostics;
use crate::{AnalyticsError, Result};

pub use cell::{CounterCell, GaugeCell, HistogramCell};
pub use descriptor::{MetricDescriptor, MetricKind};
pub use snapshot::{FamilySnapshot, HistogramSnapshot, MetricsSnapshot, SeriesSnapshot, SeriesValue};

/// Label value that absorbs series beyond a family's `max_series` cap.
pub const OVERFLOW_LABEL_VALUE: &str = "other";

/// Live handle to one series.
#[derive(Debug, Clone)]
enum Series {
    Counter(Arc<CounterCell>),
    Gauge(Arc<GaugeCell>),
    Histogram(Arc<HistogramCell>),
}

struct Family {
    descriptor: MetricDescriptor,
    /// Name including namespace prefix.
    exposed_name: String,
    series: RwLock<HashMap<Vec<String>, Series>>,
    capped: AtomicBool,
}

impl Family {
    fn new_series(&self) -> Series {
        match self.descriptor.kind {
            MetricKind::Counter => Series::Counter(Arc::new(CounterCell::default())),
            MetricKind::Gauge => Series::Gauge(Arc::new(GaugeCell::default())),
            MetricKind::Histogram => {
                Series::Histogram(Arc::new(HistogramCell::new(&self.descriptor.buckets)))
            }
        }
    }

    /// Order label values by the declared keys; every key exactly once.
    fn label_values(&self, labels: &[(&str, &str)]) -> Result<Vec<String>> {
        let keys = &self.descriptor.label_keys;
        let mismatch = || AnalyticsError::LabelMismatch {
            name: self.descriptor.name.clone(),
            expected: keys.clone(),
        };
        if labels.len() != keys.len() {
            return Err(mismatch());
        }
        keys.iter()
            .map(|key| {
                labels
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| (*v).to_string())
                    .ok_or_else(mismatch)
            })
            .collect()
    }

    fn get(&self, values: &[String]) -> Option<Series> {
        let series = self.series.read().unwrap_or_else(PoisonError::into_inner);
        series.get(values).cloned()
    }

    fn get_or_create(&self, values: Vec<String>) -> Series {
        // Fast path: series already exists (read lock)
        {
            let series = self.series.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(s) = series.get(&values) {
                return s.clone();
            }
        }

        // Slow path: need to insert (write lock)
        let mut series = self.series.write().unwrap_or_else(PoisonError::into_inner);

        // Double-check after acquiring write lock
        if let Some(s) = series.get(&values) {
            return s.clone();
        }

        let key = match self.descriptor.max_series {
            Some(limit) if series.len() >= limit => {
                if !self.capped.swap(true, Ordering::Relaxed) {
                    diagnostics::warn(
                        "label_cardinality_capped",
                        json!({ "metric": self.exposed_name, "max_series": limit }),
                    );
                }
                vec![OVERFLOW_LABEL_VALUE.to_string(); values.len()]
            }
            _ => values,
        };

        series
            .entry(key)
            .or_insert_with(|| self.new_series())
            .clone()
    }

    fn snapshot(&self) -> FamilySnapshot {
        let series = self.series.read().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<(&Vec<String>, &Series)> = series.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let series = entries
            .into_iter()
            .map(|(values, s)| SeriesSnapshot {
                labels: self
                    .descriptor
                    .label_keys
                    .iter()
                    .cloned()
                    .zip(values.iter().cloned())
                    .collect(),
                value: match s {
                    Series::Counter(c) => SeriesValue::Scalar(c.get()),
                    Series::Gauge(g) => SeriesValue::Scalar(g.get()),
                    Series::Histogram(h) => SeriesValue::Histogram(HistogramSnapshot {
                        buckets: h
                            .bounds()
                            .iter()
                            .copied()
                            .zip(h.cumulative_counts())
                            .collect(),
                        sum: h.sum(),
                        count: h.count(),
                    }),
                },
            })
            .collect();

        FamilySnapshot {
            name: self.exposed_name.clone(),
            base_name: self.descriptor.name.clone(),
            help: self.descriptor.help.clone(),
            kind: self.descriptor.kind,
            unit: self.descriptor.unit.as_ref().map(|u| u.as_str().to_string()),
            series,
        }
    }
}

/// Builder for [`MetricStore`].
#[derive(Debug, Default)]
pub struct MetricStoreBuilder {
    namespace: Option<String>,
    descriptors: Vec<MetricDescriptor>,
}

impl MetricStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix every exposed name with `{namespace}_`.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        let ns = namespace.into();
        self.namespace = if ns.is_empty() { None } else { Some(ns) };
        self
    }

    pub fn register(mut self, descriptor: MetricDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn register_all(mut self, descriptors: impl IntoIterator<Item = MetricDescriptor>) -> Self {
        self.descriptors.extend(descriptors);
        self
    }

    /// Validate every descriptor and build the store.
    ///
    /// Fails with [`AnalyticsError::Configuration`] on invalid names,
    /// label keys, bucket layouts, or duplicate registrations.
    pub fn build(self) -> Result<MetricStore> {
        if let Some(ns) = &self.namespace {
            if !descriptor::is_valid_metric_name(ns) {
                return Err(AnalyticsError::Configuration(format!(
                    "invalid metric namespace '{ns}'"
                )));
            }
        }

        let mut families = HashMap::with_capacity(self.descriptors.len());
        for descriptor in self.descriptors {
            descriptor.validate()?;
            let exposed_name = match &self.namespace {
                Some(ns) => format!("{ns}_{}", descriptor.name),
                None => descriptor.name.clone(),
            };
            let name = descriptor.name.clone();
            let family = Family {
                descriptor,
                exposed_name,
                series: RwLock::new(HashMap::new()),
                capped: AtomicBool::new(false),
            };
            if families.insert(name.clone(), family).is_some() {
                return Err(AnalyticsError::Configuration(format!(
                    "metric '{name}' registered twice"
                )));
            }
        }

        Ok(MetricStore {
            namespace: self.namespace,
            families,
        })
    }
}

/// Registry owning all numeric analytics state.
///
/// Construct once at startup and share by `Arc`; every component writes
/// through it and none keeps a private copy of a published value.
pub struct MetricStore {
    namespace: Option<String>,
    families: HashMap<String, Family>,
}

impl std::fmt::Debug for MetricStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricStore")
            .field("namespace", &self.namespace)
            .field("families", &self.families.len())
            .finish()
    }
}

impl MetricStore {
    pub fn builder() -> MetricStoreBuilder {
        MetricStoreBuilder::new()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Add `delta` (finite, non-negative) to a counter.
    pub fn increment(&self, name: &str, labels: &[(&str, &str)], delta: f64) -> Result<()> {
        if !delta.is_finite() || delta < 0.0 {
            return Err(invalid(name, delta));
        }
        self.counter(name, labels)?.add(delta);
        Ok(())
    }

    /// Add one to a counter.
    pub fn inc(&self, name: &str, labels: &[(&str, &str)]) -> Result<()> {
        self.increment(name, labels, 1.0)
    }

    /// Overwrite a gauge.
    pub fn set(&self, name: &str, labels: &[(&str, &str)], value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(invalid(name, value));
        }
        self.gauge(name, labels)?.set(value);
        Ok(())
    }

    /// Raise a gauge to `value` if larger; returns the resulting maximum.
    pub fn set_max(&self, name: &str, labels: &[(&str, &str)], value: f64) -> Result<f64> {
        if !value.is_finite() {
            return Err(invalid(name, value));
        }
        Ok(self.gauge(name, labels)?.raise_to(value))
    }

    /// Record one histogram sample.
    pub fn observe(&self, name: &str, labels: &[(&str, &str)], value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(invalid(name, value));
        }
        self.histogram(name, labels)?.observe(value);
        Ok(())
    }

    /// Live counter handle; creates the series on first use.
    pub fn counter(&self, name: &str, labels: &[(&str, &str)]) -> Result<Arc<CounterCell>> {
        match self.resolve(name, labels, MetricKind::Counter)? {
            Series::Counter(c) => Ok(c),
            other => Err(kind_mismatch(name, MetricKind::Counter, &other)),
        }
    }

    /// Live gauge handle; creates the series on first use.
    pub fn gauge(&self, name: &str, labels: &[(&str, &str)]) -> Result<Arc<GaugeCell>> {
        match self.resolve(name, labels, MetricKind::Gauge)? {
            Series::Gauge(g) => Ok(g),
            other => Err(kind_mismatch(name, MetricKind::Gauge, &other)),
        }
    }

    /// Live histogram handle; creates the series on first use.
    pub fn histogram(&self, name: &str, labels: &[(&str, &str)]) -> Result<Arc<HistogramCell>> {
        match self.resolve(name, labels, MetricKind::Histogram)? {
            Series::Histogram(h) => Ok(h),
            other => Err(kind_mismatch(name, MetricKind::Histogram, &other)),
        }
    }

    /// Current value of an existing counter series. Never creates one.
    pub fn get_counter(&self, name: &str, labels: &[(&str, &str)]) -> Result<Option<f64>> {
        match self.lookup(name, labels, MetricKind::Counter)? {
            Some(Series::Counter(c)) => Ok(Some(c.get())),
            Some(other) => Err(kind_mismatch(name, MetricKind::Counter, &other)),
            None => Ok(None),
        }
    }

    /// Current value of an existing gauge series. Never creates one.
    pub fn get_gauge(&self, name: &str, labels: &[(&str, &str)]) -> Result<Option<f64>> {
        match self.lookup(name, labels, MetricKind::Gauge)? {
            Some(Series::Gauge(g)) => Ok(Some(g.get())),
            Some(other) => Err(kind_mismatch(name, MetricKind::Gauge, &other)),
            None => Ok(None),
        }
    }

    /// Snapshot every registered family, sorted by exposed name.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut families: Vec<FamilySnapshot> =
            self.families.values().map(Family::snapshot).collect();
        families.sort_by(|a, b| a.name.cmp(&b.name));
        MetricsSnapshot { families }
    }

    /// Look a family up by registered name, or by exposed (namespaced) name.
    fn family(&self, name: &str) -> Result<&Family> {
        if let Some(f) = self.families.get(name) {
            return Ok(f);
        }
        self.namespace
            .as_deref()
            .and_then(|ns| name.strip_prefix(ns))
            .and_then(|rest| rest.strip_prefix('_'))
            .and_then(|base| self.families.get(base))
            .ok_or_else(|| AnalyticsError::UnknownMetric(name.to_string()))
    }

    fn resolve(&self, name: &str, labels: &[(&str, &str)], kind: MetricKind) -> Result<Series> {
        let (family, values) = self.checked(name, labels, kind)?;
        Ok(family.get_or_create(values))
    }

    fn lookup(
        &self,
        name: &str,
        labels: &[(&str, &str)],
        kind: MetricKind,
    ) -> Result<Option<Series>> {
        let (family, values) = self.checked(name, labels, kind)?;
        Ok(family.get(&values))
    }

    fn checked(
        &self,
        name: &str,
        labels: &[(&str, &str)],
        kind: MetricKind,
    ) -> Result<(&Family, Vec<String>)> {
        let family = self.family(name)?;
        if family.descriptor.kind != kind {
            return Err(AnalyticsError::KindMismatch {
                name: name.to_string(),
                expected: kind.as_str(),
                actual: family.descriptor.kind.as_str(),
            });
        }
        let values = family.label_values(labels)?;
        Ok((family, values))
    }
}

fn invalid(name: &str, value: f64) -> AnalyticsError {
    AnalyticsError::InvalidValue {
        name: name.to_string(),
        value,
    }
}

fn kind_mismatch(name: &str, expected: MetricKind, actual: &Series) -> AnalyticsError {
    let actual = match actual {
        Series::Counter(_) => MetricKind::Counter,
        Series::Gauge(_) => MetricKind::Gauge,
        Series::Histogram(_) => MetricKind::Histogram,
    };
    AnalyticsError::KindMismatch {
        name: name.to_string(),
        expected: expected.as_str(),
        actual: actual.as_str(),
    }
}
