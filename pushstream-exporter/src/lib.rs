//! Prometheus exporter for the nginx push stream module.
//!
//! Every pull of the metrics endpoint scrapes the module's `channels-stats`
//! location, decodes it and exposes the per-channel counters.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │  nginx push     │<────│    Collector    │<────│   HTTP Server   │
//! │  stream module  │────>│ (decode/extract)│────>│   (/metrics)    │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! pushstream-exporter --nginx.scrape-uri 'http://localhost:8080/channels-stats?id=ALL'
//! ```
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod collector;
pub mod config;
pub mod fetch;
pub mod http;
pub mod mapping;

pub use collector::{MetricCollector, ScrapeError, SharedCollector};
pub use config::ExporterConfig;
pub use fetch::{FetchError, Fetcher};
pub use http::HttpServer;
