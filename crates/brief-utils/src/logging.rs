//! Logging and tracing utilities

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Initialize a human-readable tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `default_directive` (for example
/// `"warn,market_brief=info"`) is used.
pub fn init_tracing(default_directive: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_directive))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize a tracing subscriber that emits one JSON object per event.
pub fn init_json_tracing(default_directive: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_directive))
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}
