//! chat-analytics - in-process analytics for conversational AI hosts
//!
//! This crate observes chat lifecycle events (messages, replies, memory
//! retrieval, token usage, feedback) and aggregates them into counters,
//! gauges, and histograms that an exposition layer can snapshot on demand.
//! Recording is best-effort: failures become structured diagnostics and
//! never reach the host's chat turn.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use chat_analytics::{ChatAnalytics, AnalyticsConfig};
//! use chat_analytics::events::{BotReply, UserMessage};
//! use chat_analytics::sentiment::FnScorer;
//!
//! #[tokio::main]
//! async fn main() -> chat_analytics::Result<()> {
//!     let analytics = ChatAnalytics::builder()
//!         .config(AnalyticsConfig::default())
//!         .scorer(Arc::new(FnScorer::new("fixed", |_: &str| Ok(0.4))))
//!         .build()?;
//!
//!     analytics
//!         .on_user_message(&UserMessage::new("Thanks, that helped!", "user_42"))
//!         .await;
//!     analytics.on_bot_reply(&BotReply::new(1.2));
//!
//!     let snapshot = analytics.snapshot();
//!     assert_eq!(snapshot.counter_value("chat_sessions_total", &[]), Some(1.0));
//!     assert_eq!(
//!         snapshot.counter_value(
//!             "chat_sentiment_counts",
//!             &[("sender", "user"), ("type", "positive")],
//!         ),
//!         Some(1.0)
//!     );
//!     Ok(())
//! }
//! ```

pub mod config;
mod diagnostics;
pub mod engine;
pub mod error;
pub mod events;
pub mod feedback;
pub mod sentiment;
pub mod session;
pub mod source;
pub mod store;
pub mod telemetry;
pub mod usage;
pub mod version;

// Re-export main types at crate root
pub use config::{AnalyticsConfig, FeedbackConfig, MetricsConfig, SentimentConfig};
pub use diagnostics::COMPONENT;
pub use engine::{ChatAnalytics, ChatAnalyticsBuilder};
pub use error::{AnalyticsError, AuthError, Result};
pub use events::ChatEvent;
pub use feedback::{FeedbackValidator, FeedbackVote};
pub use sentiment::{Scorer, ScorerLoader, SentimentBucket, Sender};
pub use source::cluster_source;
pub use store::{MetricDescriptor, MetricKind, MetricStore, MetricsSnapshot};
