//! One-shot lazy loading of the scoring model.
//!
//! The first scoring request (or an explicit [`LazyScorer::warm_up`]) runs
//! the loader under its own load timeout, separate from the per-message
//! scoring timeout. Concurrent callers wait on the same attempt. A failed load
//! is logged once and never retried for the life of the process; every
//! later call fails fast with `DependencyUnavailable`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::OnceCell;

use super::Scorer;
use crate::diagnostics;
use crate::{AnalyticsError, Result};

/// Loads (and if necessary downloads) a scoring model.
#[async_trait]
pub trait ScorerLoader: Send + Sync {
    /// Model name for logging.
    fn name(&self) -> &str;

    /// Produce a ready scorer.
    ///
    /// Return `DependencyUnavailable` when the model is missing and
    /// `TransientIo` for download failures.
    async fn load(&self) -> Result<Arc<dyn Scorer>>;
}

/// [`Scorer`] that loads its model on first use, at most once.
pub struct LazyScorer {
    loader: Arc<dyn ScorerLoader>,
    load_timeout: Duration,
    cell: OnceCell<Option<Arc<dyn Scorer>>>,
}

impl LazyScorer {
    pub fn new(loader: Arc<dyn ScorerLoader>, load_timeout: Duration) -> Self {
        Self {
            loader,
            load_timeout,
            cell: OnceCell::new(),
        }
    }

    /// Trigger the load now. Returns whether a scorer is available.
    pub async fn warm_up(&self) -> bool {
        self.resolve().await.is_ok()
    }

    /// Whether a load has been attempted (successfully or not).
    pub fn attempted(&self) -> bool {
        self.cell.initialized()
    }

    async fn resolve(&self) -> Result<Arc<dyn Scorer>> {
        let slot = self.cell.get_or_init(|| self.load_once()).await;
        slot.clone().ok_or_else(|| {
            AnalyticsError::DependencyUnavailable(format!(
                "model '{}' failed to load",
                self.loader.name()
            ))
        })
    }

    async fn load_once(&self) -> Option<Arc<dyn Scorer>> {
        let model_name = self.loader.name().to_string();
        diagnostics::info("model_load_start", json!({ "model_name": model_name }));

        let outcome = match tokio::time::timeout(self.load_timeout, self.loader.load()).await {
            Ok(result) => result,
            Err(_) => Err(AnalyticsError::TransientIo(format!(
                "loading '{model_name}' timed out after {}s",
                self.load_timeout.as_secs()
            ))),
        };

        match outcome {
            Ok(scorer) => {
                diagnostics::info("model_load_success", json!({ "model_name": model_name }));
                Some(scorer)
            }
            Err(e) => {
                let event = match e {
                    AnalyticsError::TransientIo(_) => "model_load_timeout",
                    _ => "model_load_error",
                };
                diagnostics::error(
                    event,
                    json!({ "model_name": model_name, "error": e.to_string() }),
                );
                None
            }
        }
    }
}

#[async_trait]
impl Scorer for LazyScorer {
    fn name(&self) -> &str {
        self.loader.name()
    }

    async fn score(&self, text: &str) -> Result<f64> {
        self.resolve().await?.score(text).await
    }

    async fn ready(&self) -> Result<()> {
        self.resolve().await.map(|_| ())
    }
}
