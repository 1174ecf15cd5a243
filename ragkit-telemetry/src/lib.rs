//! # ragkit-telemetry
//!
//! Logging setup shared by the ragkit binaries and tests.
//!
//! Filtering follows `RUST_LOG` and falls back to `info`. Installing a global
//! subscriber twice is reported as an error rather than a panic.
//!
//! ```no_run
//! ragkit_telemetry::init_telemetry("rag-demo").ok();
//! tracing::info!("ready");
//! ```

pub mod capture;

pub use capture::{CaptureLayer, CapturedEvent, CapturedEvents};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("failed to install tracing subscriber for {service}: {message}")]
    Init { service: String, message: String },
}

pub type Result<T> = std::result::Result<T, TelemetryError>;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn init_error(service_name: &str, err: impl std::fmt::Display) -> TelemetryError {
    TelemetryError::Init { service: service_name.to_string(), message: err.to_string() }
}

/// Install a human-readable subscriber writing to stderr.
pub fn init_telemetry(service_name: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init()
        .map_err(|e| init_error(service_name, e))?;
    tracing::debug!(service = service_name, "telemetry initialized");
    Ok(())
}

/// Install a subscriber that writes one JSON object per event to stderr.
pub fn init_json_telemetry(service_name: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| init_error(service_name, e))?;
    tracing::debug!(service = service_name, format = "json", "telemetry initialized");
    Ok(())
}

/// Install the stderr subscriber plus a [`CaptureLayer`] feeding `storage`.
pub fn init_with_capture(service_name: &str, storage: CapturedEvents) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(CaptureLayer::new(storage))
        .try_init()
        .map_err(|e| init_error(service_name, e))
}

/// Build a subscriber that only captures, for use with
/// [`tracing::subscriber::set_default`] in tests.
pub fn capture_subscriber(
    storage: CapturedEvents,
) -> impl tracing::Subscriber + Send + Sync + 'static {
    tracing_subscriber::registry().with(CaptureLayer::new(storage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn captures_message_and_fields() {
        let events = CapturedEvents::new();
        tracing::subscriber::with_default(capture_subscriber(events.clone()), || {
            tracing::info!(documents = 3, provider = "gemini", "index rebuilt");
            tracing::debug!("embedding query");
        });

        let all = events.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].level, "INFO");
        assert_eq!(all[0].message.as_deref(), Some("index rebuilt"));
        assert_eq!(all[0].field("documents"), Some(&serde_json::json!(3)));
        assert_eq!(all[0].field("provider"), Some(&serde_json::json!("gemini")));
        assert!(all[0].field("message").is_none());
        assert_eq!(events.at_level(Level::DEBUG).len(), 1);
    }

    #[test]
    fn storage_filters_and_clears() {
        let events = CapturedEvents::new();
        tracing::subscriber::with_default(capture_subscriber(events.clone()), || {
            tracing::warn!("slow provider");
            tracing::error!(status = 401u64, "request failed");
        });

        assert_eq!(events.with_message("request failed").len(), 1);
        assert_eq!(events.at_level(Level::ERROR)[0].field("status"), Some(&serde_json::json!(401)));
        assert!(events.at_level(Level::INFO).is_empty());

        events.clear();
        assert!(events.all().is_empty());
    }

    #[test]
    fn events_outside_the_scope_are_not_captured() {
        let events = CapturedEvents::new();
        tracing::subscriber::with_default(capture_subscriber(events.clone()), || {
            tracing::info!("inside");
        });
        tracing::info!("outside");

        assert_eq!(events.all().len(), 1);
    }

    #[tokio::test]
    async fn second_global_init_is_an_error() {
        let events = CapturedEvents::new();
        let first = init_with_capture("telemetry-test", events.clone());
        let second = init_telemetry("telemetry-test");

        assert!(first.is_ok());
        assert!(matches!(second, Err(TelemetryError::Init { .. })));

        tracing::info!(attempt = 2u64, "global subscriber active");
        assert_eq!(events.with_message("global subscriber active").len(), 1);
    }
}
