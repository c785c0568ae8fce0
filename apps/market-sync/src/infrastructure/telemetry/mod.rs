//! Tracing Setup
//!
//! Structured logging to stdout via `tracing-subscriber`. The `RUST_LOG`
//! environment variable extends the defaults; noisy transport crates are
//! capped at warn.
//!
//! # Usage
//!
//! ```ignore
//! use market_sync::infrastructure::telemetry;
//!
//! telemetry::init();
//! tracing::info!("Starting");
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the global tracing subscriber.
///
/// Call once at startup; a second call panics, so tests use their own
/// subscribers instead.
#[allow(clippy::expect_used)]
pub fn init() {
    let env_filter = EnvFilter::from_default_env()
        .add_directive(
            "market_sync=info"
                .parse()
                .expect("static directive 'market_sync=info' is valid"),
        )
        .add_directive(
            "tungstenite=warn"
                .parse()
                .expect("static directive 'tungstenite=warn' is valid"),
        )
        .add_directive(
            "hyper=warn"
                .parse()
                .expect("static directive 'hyper=warn' is valid"),
        )
        .add_directive(
            "reqwest=warn"
                .parse()
                .expect("static directive 'reqwest=warn' is valid"),
        );

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
