//! The sentiment scoring capability.
//!
//! Scoring models are black boxes: anything that turns text into a
//! polarity in roughly `[-1, 1]` can back the classifier. Implementations
//! may be slow or fail; the classifier never holds a store lock while
//! awaiting them.

use async_trait::async_trait;

use crate::Result;

/// Produces a polarity score for a piece of text.
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Scorer name for logging/debugging.
    fn name(&self) -> &str;

    /// Score `text`, nominally in `[-1.0, 1.0]`.
    ///
    /// Return [`ScoringFailure`](crate::AnalyticsError::ScoringFailure) for
    /// per-message errors and
    /// [`DependencyUnavailable`](crate::AnalyticsError::DependencyUnavailable)
    /// when the underlying model cannot be used at all.
    async fn score(&self, text: &str) -> Result<f64>;

    /// Wait until the scorer can serve [`score`](Scorer::score) calls.
    ///
    /// Runs before the per-message scoring timeout starts, so one-time
    /// setup such as a model load is bounded by its own limits only.
    async fn ready(&self) -> Result<()> {
        Ok(())
    }
}

/// Adapts a synchronous closure into a [`Scorer`].
///
/// ```rust
/// # use chat_analytics::sentiment::FnScorer;
/// let scorer = FnScorer::new("constant", |_text: &str| Ok(0.25));
/// ```
pub struct FnScorer<F> {
    name: String,
    f: F,
}

impl<F> FnScorer<F>
where
    F: Fn(&str) -> Result<f64> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> Scorer for FnScorer<F>
where
    F: Fn(&str) -> Result<f64> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn score(&self, text: &str) -> Result<f64> {
        (self.f)(text)
    }
}
