//! Token accounting and response-time accounting.
//!
//! Totals live in the store's counters; averages are recomputed from those
//! totals after every update rather than adjusted incrementally, so they
//! never drift. Each model gets its own lock so the average gauges published
//! for a model always correspond to one consistent set of totals.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::store::MetricStore;
use crate::telemetry;
use crate::{AnalyticsError, Result};

/// Model label used when the host cannot name the model.
pub const UNKNOWN_MODEL: &str = "unknown";

/// Per-model token totals, read back from the store.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModelTokenStats {
    pub input_tokens_total: f64,
    pub output_tokens_total: f64,
    pub interaction_count: f64,
}

impl ModelTokenStats {
    pub fn input_tokens_avg(&self) -> f64 {
        average(self.input_tokens_total, self.interaction_count)
    }

    pub fn output_tokens_avg(&self) -> f64 {
        average(self.output_tokens_total, self.interaction_count)
    }
}

fn average(total: f64, count: f64) -> f64 {
    if count > 0.0 { total / count } else { 0.0 }
}

/// Accumulates LLM and embedding token usage per model.
pub struct TokenTracker {
    store: Arc<MetricStore>,
    model_locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl TokenTracker {
    pub fn new(store: Arc<MetricStore>) -> Self {
        Self {
            store,
            model_locks: RwLock::new(HashMap::new()),
        }
    }

    /// Record one completed LLM interaction and republish the averages.
    pub fn record_interaction(
        &self,
        model: &str,
        input_tokens: u64,
        output_tokens: u64,
    ) -> Result<ModelTokenStats> {
        let model = model_label(model);
        let labels = [("model", model)];
        let lock = self.model_lock(model);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.store
            .increment(telemetry::LLM_INPUT_TOKENS_TOTAL, &labels, input_tokens as f64)?;
        self.store
            .increment(telemetry::LLM_OUTPUT_TOKENS_TOTAL, &labels, output_tokens as f64)?;
        self.store.inc(telemetry::LLM_INTERACTIONS_TOTAL, &labels)?;

        let stats = self.read_stats(model)?;
        self.store
            .set(telemetry::LLM_INPUT_TOKENS_AVG, &labels, stats.input_tokens_avg())?;
        self.store
            .set(telemetry::LLM_OUTPUT_TOKENS_AVG, &labels, stats.output_tokens_avg())?;
        Ok(stats)
    }

    /// Record tokens sent to an embedder. No averages are kept.
    pub fn record_embedding(&self, model: &str, tokens: u64) -> Result<()> {
        self.store.increment(
            telemetry::EMBEDDING_TOKENS_TOTAL,
            &[("model", model_label(model))],
            tokens as f64,
        )
    }

    /// Current totals for `model`.
    pub fn stats(&self, model: &str) -> Result<ModelTokenStats> {
        self.read_stats(model_label(model))
    }

    fn read_stats(&self, model: &str) -> Result<ModelTokenStats> {
        let labels = [("model", model)];
        let total = |name: &str| -> Result<f64> {
            Ok(self.store.get_counter(name, &labels)?.unwrap_or(0.0))
        };
        Ok(ModelTokenStats {
            input_tokens_total: total(telemetry::LLM_INPUT_TOKENS_TOTAL)?,
            output_tokens_total: total(telemetry::LLM_OUTPUT_TOKENS_TOTAL)?,
            interaction_count: total(telemetry::LLM_INTERACTIONS_TOTAL)?,
        })
    }

    fn model_lock(&self, model: &str) -> Arc<Mutex<()>> {
        {
            let locks = self.model_locks.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(lock) = locks.get(model) {
                return Arc::clone(lock);
            }
        }
        let mut locks = self.model_locks.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(model.to_string()).or_default())
    }
}

fn model_label(model: &str) -> &str {
    let model = model.trim();
    if model.is_empty() { UNKNOWN_MODEL } else { model }
}

/// Running response-time statistics, read back from the store.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResponseTimeStats {
    pub sum_seconds: f64,
    pub count: f64,
    pub max_seconds: f64,
}

impl ResponseTimeStats {
    pub fn average_seconds(&self) -> f64 {
        average(self.sum_seconds, self.count)
    }
}

/// Accumulates reply latency, skipping fast/default replies.
pub struct ResponseTimeTracker {
    store: Arc<MetricStore>,
}

impl ResponseTimeTracker {
    pub fn new(store: Arc<MetricStore>) -> Self {
        Self { store }
    }

    /// Account one reply. Excluded samples leave every statistic unchanged.
    pub fn record(&self, elapsed_seconds: f64, excluded: bool) -> Result<ResponseTimeStats> {
        if excluded {
            return self.stats();
        }
        if !elapsed_seconds.is_finite() || elapsed_seconds < 0.0 {
            return Err(AnalyticsError::InvalidEvent(format!(
                "elapsed time must be a non-negative number of seconds, got {elapsed_seconds}"
            )));
        }

        self.store
            .increment(telemetry::RESPONSE_TIME_SECONDS_SUM, &[], elapsed_seconds)?;
        self.store.inc(telemetry::RESPONSE_TIME_SECONDS_COUNT, &[])?;
        self.store
            .set_max(telemetry::RESPONSE_TIME_SECONDS_MAX, &[], elapsed_seconds)?;
        self.stats()
    }

    pub fn stats(&self) -> Result<ResponseTimeStats> {
        let store = &self.store;
        Ok(ResponseTimeStats {
            sum_seconds: store
                .get_counter(telemetry::RESPONSE_TIME_SECONDS_SUM, &[])?
                .unwrap_or(0.0),
            count: store
                .get_counter(telemetry::RESPONSE_TIME_SECONDS_COUNT, &[])?
                .unwrap_or(0.0),
            max_seconds: store
                .get_gauge(telemetry::RESPONSE_TIME_SECONDS_MAX, &[])?
                .unwrap_or(0.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Arc<MetricStore> {
        Arc::new(
            MetricStore::builder()
                .register_all(telemetry::catalog(None))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn blank_model_is_unknown() {
        assert_eq!(model_label("  "), UNKNOWN_MODEL);
        assert_eq!(model_label("gpt-4o"), "gpt-4o");
    }

    #[test]
    fn stats_for_unseen_model_are_zero() {
        let tracker = TokenTracker::new(store());
        let stats = tracker.stats("never-used").unwrap();
        assert_eq!(stats, ModelTokenStats::default());
        assert_eq!(stats.input_tokens_avg(), 0.0);
    }

    #[test]
    fn reading_stats_creates_no_series() {
        let store = store();
        let tokens = TokenTracker::new(Arc::clone(&store));
        let latency = ResponseTimeTracker::new(Arc::clone(&store));

        tokens.stats("never-used").unwrap();
        latency.record(2.0, true).unwrap();
        latency.stats().unwrap();

        let snapshot = store.snapshot();
        for name in [
            telemetry::LLM_INPUT_TOKENS_TOTAL,
            telemetry::LLM_INTERACTIONS_TOTAL,
            telemetry::RESPONSE_TIME_SECONDS_COUNT,
            telemetry::RESPONSE_TIME_SECONDS_MAX,
        ] {
            assert!(snapshot.family(name).unwrap().series.is_empty(), "{name}");
        }
    }

    #[test]
    fn negative_elapsed_is_rejected() {
        let tracker = ResponseTimeTracker::new(store());
        assert!(matches!(
            tracker.record(-1.0, false),
            Err(AnalyticsError::InvalidEvent(_))
        ));
        assert!(tracker.record(f64::NAN, false).is_err());
        assert_eq!(tracker.stats().unwrap(), ResponseTimeStats::default());
    }

    #[test]
    fn excluded_invalid_sample_is_simply_skipped() {
        let tracker = ResponseTimeTracker::new(store());
        assert!(tracker.record(f64::NAN, true).is_ok());
    }
}
