//! Sentiment classification.
//!
//! Turns a polarity score into a [`SentimentBucket`] and records both the
//! raw score (histogram) and the bucket (counter). Scores outside `[-1, 1]`
//! are recorded as-is.

mod cache;
mod lazy;
mod scorer;

use std::sync::Arc;
use std::time::Duration;

pub use cache::{CachingScorer, ScoreCacheConfig};
pub use lazy::{LazyScorer, ScorerLoader};
pub use scorer::{FnScorer, Scorer};

use crate::store::MetricStore;
use crate::telemetry;
use crate::{AnalyticsError, Result};

/// Scores below this are negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

/// Scores above this are positive.
pub const POSITIVE_THRESHOLD: f64 = 0.05;

/// Categorical sentiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentimentBucket {
    Negative,
    Neutral,
    Positive,
}

impl SentimentBucket {
    /// Classify a polarity score. The neutral band is inclusive on both ends.
    ///
    /// ```rust
    /// # use chat_analytics::sentiment::SentimentBucket;
    /// assert_eq!(SentimentBucket::classify(-0.3), SentimentBucket::Negative);
    /// assert_eq!(SentimentBucket::classify(0.05), SentimentBucket::Neutral);
    /// assert_eq!(SentimentBucket::classify(0.051), SentimentBucket::Positive);
    /// ```
    pub fn classify(score: f64) -> Self {
        if score < NEGATIVE_THRESHOLD {
            Self::Negative
        } else if score > POSITIVE_THRESHOLD {
            Self::Positive
        } else {
            Self::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Negative => "negative",
            Self::Neutral => "neutral",
            Self::Positive => "positive",
        }
    }
}

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }
}

/// Scores messages and records the sentiment metrics.
pub struct SentimentClassifier {
    store: Arc<MetricStore>,
    scorer: Arc<dyn Scorer>,
    max_text_chars: usize,
    score_timeout: Duration,
}

impl SentimentClassifier {
    pub fn new(
        store: Arc<MetricStore>,
        scorer: Arc<dyn Scorer>,
        max_text_chars: usize,
        score_timeout: Duration,
    ) -> Self {
        Self {
            store,
            scorer,
            max_text_chars,
            score_timeout,
        }
    }

    pub fn scorer(&self) -> &Arc<dyn Scorer> {
        &self.scorer
    }

    /// Record an already-computed score for `sender`.
    pub fn record(&self, sender: Sender, score: f64) -> Result<SentimentBucket> {
        if !score.is_finite() {
            return Err(AnalyticsError::ScoringFailure(format!(
                "non-finite score {score}"
            )));
        }
        let bucket = SentimentBucket::classify(score);
        self.store
            .observe(telemetry::SENTIMENT_SCORE, &[("sender", sender.as_str())], score)?;
        self.store.inc(
            telemetry::SENTIMENT_COUNTS,
            &[("sender", sender.as_str()), ("type", bucket.as_str())],
        )?;
        Ok(bucket)
    }

    /// Score `text` and record the result.
    ///
    /// The scorer is made ready first; only the score call itself runs
    /// under the per-message timeout.
    ///
    /// On any scoring error (failure, timeout, model unavailable) nothing is
    /// recorded and the error is returned for the caller to log.
    pub async fn classify(&self, sender: Sender, text: &str) -> Result<SentimentBucket> {
        let text = truncate_chars(text, self.max_text_chars);
        self.scorer.ready().await?;
        let score = match tokio::time::timeout(self.score_timeout, self.scorer.score(text)).await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(AnalyticsError::ScoringFailure(format!(
                    "scorer '{}' timed out after {}ms",
                    self.scorer.name(),
                    self.score_timeout.as_millis()
                )));
            }
        };
        self.record(sender, score)
    }
}

/// Longest prefix of `text` with at most `max_chars` characters.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
