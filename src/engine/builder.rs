//! Builder for the analytics engine.

use std::sync::Arc;

use serde_json::json;

use super::ChatAnalytics;
use crate::config::AnalyticsConfig;
use crate::diagnostics;
use crate::sentiment::{CachingScorer, LazyScorer, Scorer, ScorerLoader, SentimentClassifier};
use crate::session::SessionTracker;
use crate::store::MetricStore;
use crate::telemetry;
use crate::usage::{ResponseTimeTracker, TokenTracker};
use crate::version::PKG_VERSION;
use crate::{AnalyticsError, Result};

/// Plugin id published in `plugin_info` for this engine.
pub const PLUGIN_ID: &str = "chat_analytics";

/// Builder for [`ChatAnalytics`].
///
/// ```rust
/// # use chat_analytics::{ChatAnalytics, AnalyticsConfig};
/// # use chat_analytics::sentiment::FnScorer;
/// # use std::sync::Arc;
/// let analytics = ChatAnalytics::builder()
///     .config(AnalyticsConfig::default())
///     .scorer(Arc::new(FnScorer::new("constant", |_: &str| Ok(0.0))))
///     .build()
///     .unwrap();
/// ```
#[derive(Default)]
pub struct ChatAnalyticsBuilder {
    config: AnalyticsConfig,
    scorer: Option<Arc<dyn Scorer>>,
    loader: Option<Arc<dyn ScorerLoader>>,
}

impl ChatAnalyticsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: AnalyticsConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a ready scorer.
    pub fn scorer(mut self, scorer: Arc<dyn Scorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Load the scorer lazily, at most once, on first use or
    /// [`ChatAnalytics::warm_up`].
    pub fn scorer_loader(mut self, loader: Arc<dyn ScorerLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Build the engine.
    ///
    /// Fails with `Configuration` for an invalid namespace or when both a
    /// scorer and a loader are supplied. Without either, sentiment metrics
    /// are not produced.
    pub fn build(self) -> Result<ChatAnalytics> {
        let config = self.config;

        let store = Arc::new(
            MetricStore::builder()
                .namespace(config.metrics.namespace.clone())
                .register_all(telemetry::catalog(config.metrics.max_source_series))
                .build()?,
        );

        let (scorer, lazy_scorer) = match (self.scorer, self.loader) {
            (Some(_), Some(_)) => {
                return Err(AnalyticsError::Configuration(
                    "configure either a scorer or a scorer loader, not both".to_string(),
                ));
            }
            (Some(scorer), None) => (Some(scorer), None),
            (None, Some(loader)) => {
                let lazy = Arc::new(LazyScorer::new(
                    loader,
                    config.sentiment.load_timeout_duration(),
                ));
                (Some(lazy.clone() as Arc<dyn Scorer>), Some(lazy))
            }
            (None, None) => (None, None),
        };

        let scorer = match (scorer, &config.sentiment.cache) {
            (Some(scorer), Some(cache)) => {
                Some(Arc::new(CachingScorer::new(scorer, cache)) as Arc<dyn Scorer>)
            }
            (scorer, _) => scorer,
        };

        let sentiment = scorer.map(|scorer| {
            SentimentClassifier::new(
                store.clone(),
                scorer,
                config.sentiment.max_text_chars,
                config.sentiment.score_timeout_duration(),
            )
        });

        store.set(
            telemetry::PLUGIN_INFO,
            &[("plugin_id", PLUGIN_ID), ("version", PKG_VERSION)],
            1.0,
        )?;

        diagnostics::info(
            "analytics_started",
            json!({
                "namespace": config.metrics.namespace,
                "sentiment": sentiment.as_ref().map(|s| s.scorer().name().to_string()),
                "feedback": config.feedback.is_some(),
            }),
        );

        Ok(ChatAnalytics {
            sessions: SessionTracker::new(store.clone()),
            tokens: TokenTracker::new(store.clone()),
            response_times: ResponseTimeTracker::new(store.clone()),
            feedback: config.feedback.as_ref().map(|f| f.validator()),
            metrics: config.metrics,
            sentiment,
            lazy_scorer,
            store,
        })
    }
}
