//! Push stream channel statistics core.
//!
//! This crate turns the JSON document served by the nginx push stream
//! module's `channels-stats` location into typed metric samples:
//!
//! - [`wire`] - Decoding of both payload shapes into a [`StatsRecord`]
//! - [`catalog`] - The fixed registry of emittable metrics
//! - [`filter`] - Resolution of the configured metric selection
//! - [`extract`] - Sample extraction, including the `subscribers_total` rollup
//! - [`config`] - Logging configuration
//! - [`error`] - Error types
//!
//! Nothing here performs network I/O; fetching and exposition live in the
//! exporter crate.

pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod filter;
pub mod wire;

// Re-export commonly used types at the crate root
pub use catalog::{ALL_CHANNELS, CHANNEL_LABEL, Catalog, CatalogEntry, MetricKind};
pub use config::{LogFormat, LoggingConfig};
pub use error::{DecodeError, Error, Result};
pub use extract::{Extraction, FieldCoercionWarning, Sample, extract};
pub use filter::Selection;
pub use wire::{ChannelRecord, Count, Schema, StatsRecord, decode};

/// Initialize tracing with the given configuration.
///
/// Supports two output formats:
/// - `LogFormat::Text` (default): Human-readable text format
/// - `LogFormat::Json`: Structured JSON format for log aggregation systems
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
    }

    Ok(())
}
