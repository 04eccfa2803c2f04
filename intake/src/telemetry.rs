//! Tracing initialization.
//!
//! Log verbosity is controlled by the standard `RUST_LOG` environment variable and defaults to
//! `info`. For example, to see per-request spans and stored-upload events:
//!
//! ```bash
//! RUST_LOG=intake=debug,tower_http=debug intake -f config.yaml
//! ```

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global subscriber: an env-driven filter in front of the console fmt layer.
///
/// Fails if a global subscriber has already been set.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    info!("Telemetry initialized");
    Ok(())
}
