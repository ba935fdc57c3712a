//! chat-analytics-replay: feed recorded chat events through the engine
//!
//! Reads newline-delimited JSON events and prints the resulting metrics
//! snapshot as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use chat_analytics::sentiment::FnScorer;
use chat_analytics::{AnalyticsConfig, ChatAnalytics, ChatEvent};
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Replay chat events through the analytics engine
#[derive(Parser)]
#[command(name = "chat-analytics-replay")]
#[command(version = chat_analytics::version::PKG_VERSION)]
#[command(about = "Replay JSONL chat events and print the metrics snapshot")]
struct Args {
    /// Events file, one JSON object per line (`-` for stdin)
    events: PathBuf,

    /// Configuration file (TOML)
    #[arg(short, long, env = "CHAT_ANALYTICS_CONFIG")]
    config: Option<PathBuf>,

    /// Score every user message with this fixed polarity
    #[arg(long, allow_hyphen_values = true)]
    fixed_score: Option<f64>,

    /// Stop at the first malformed line instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Compact output
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AnalyticsConfig::load(path)?,
        None => AnalyticsConfig::default(),
    };

    let mut builder = ChatAnalytics::builder().config(config);
    if let Some(score) = args.fixed_score {
        builder = builder.scorer(Arc::new(FnScorer::new("fixed", move |_: &str| Ok(score))));
    }
    let analytics = builder.build()?;

    let replayed = if args.events.as_os_str() == "-" {
        replay(&analytics, BufReader::new(tokio::io::stdin()), args.strict).await?
    } else {
        let file = tokio::fs::File::open(&args.events).await?;
        replay(&analytics, BufReader::new(file), args.strict).await?
    };
    tracing::info!(events = replayed, "replay finished");

    let snapshot = analytics.snapshot();
    let output = if args.compact {
        serde_json::to_string(&snapshot)?
    } else {
        serde_json::to_string_pretty(&snapshot)?
    };
    println!("{output}");
    Ok(())
}

/// Dispatch every event line; returns how many were dispatched.
async fn replay<R>(
    analytics: &ChatAnalytics,
    reader: R,
    strict: bool,
) -> Result<usize, Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_no = 0usize;
    let mut dispatched = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event: ChatEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(e) if strict => return Err(format!("line {line_no}: {e}").into()),
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "skipping malformed event");
                continue;
            }
        };

        if let Err(e) = analytics.dispatch(&event).await {
            tracing::warn!(line = line_no, error = %e, "feedback rejected");
        }
        dispatched += 1;
    }

    Ok(dispatched)
}
