//! Scrape orchestration: fetch, decode, extract, render.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use pushstream_common::{Catalog, DecodeError, Extraction, Sample, Selection, decode, extract};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::fetch::{FetchError, Fetcher};
use crate::mapping::{PrometheusType, build_fq_name, build_metric_name, write_header, write_series};

/// Name of the exporter, used for its build info metric.
pub const EXPORTER_NAME: &str = "nginx_push_stream_exporter";

/// Why a scrape produced no samples.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Can't scrape push stream: {0}")]
    Fetch(#[from] FetchError),
    #[error("Unexpected error while reading JSON: {0}")]
    Decode(#[from] DecodeError),
}

/// Scrape statistics.
#[derive(Debug, Clone, Default)]
pub struct CollectorStats {
    /// Scrapes attempted, successful or not.
    pub total_scrapes: u64,
    /// Scrapes that failed to fetch or decode.
    pub failed_scrapes: u64,
    /// Malformed per-channel counts seen across all scrapes.
    pub coercion_warnings: u64,
    /// Whether the last scrape succeeded.
    pub up: bool,
}

/// Collects push stream statistics on every pull.
///
/// Scrapes are serialized: concurrent pulls wait for the one in flight and
/// then run their own.
pub struct MetricCollector {
    fetcher: Fetcher,
    catalog: Catalog,
    selection: Selection,
    namespace: String,
    scrape_lock: Mutex<()>,
    stats: RwLock<CollectorStats>,
}

impl MetricCollector {
    /// Create a new collector.
    pub fn new(fetcher: Fetcher, catalog: Catalog, selection: Selection, namespace: String) -> Self {
        Self {
            fetcher,
            catalog,
            selection,
            namespace,
            scrape_lock: Mutex::new(()),
            stats: RwLock::new(CollectorStats::default()),
        }
    }

    /// Fetch, decode and extract once.
    pub async fn scrape(&self) -> Result<Extraction, ScrapeError> {
        let body = self.fetcher.fetch().await?;
        let record = decode(&body)?;

        debug!(
            schema = ?record.schema,
            channels = record.channels.len(),
            "Decoded channel statistics"
        );

        Ok(extract(&record, &self.selection))
    }

    /// Run one scrape and render the result in Prometheus exposition format.
    pub async fn collect(&self) -> String {
        let _guard = self.scrape_lock.lock().await;

        self.stats.write().total_scrapes += 1;

        let samples = match self.scrape().await {
            Ok(extraction) => {
                for warning in &extraction.warnings {
                    warn!(
                        channel = %warning.channel,
                        field = %warning.field,
                        value = %warning.raw,
                        "Count is not an integer, treating as zero"
                    );
                }

                let mut stats = self.stats.write();
                stats.up = true;
                stats.coercion_warnings += extraction.warnings.len() as u64;
                extraction.samples
            }
            Err(e) => {
                error!(uri = %self.fetcher.location(), error = %e, "Scrape failed");

                let mut stats = self.stats.write();
                stats.up = false;
                stats.failed_scrapes += 1;
                Vec::new()
            }
        };

        self.render(&samples)
    }

    /// Get collector statistics.
    pub fn stats(&self) -> CollectorStats {
        self.stats.read().clone()
    }

    fn render(&self, samples: &[Sample]) -> String {
        let mut output = String::with_capacity(samples.len() * 64 + 512);

        // Group samples by metric name for HELP/TYPE comments
        let mut by_name: BTreeMap<String, Vec<&Sample>> = BTreeMap::new();
        for sample in samples {
            by_name
                .entry(build_metric_name(&self.namespace, sample.kind))
                .or_default()
                .push(sample);
        }

        for (name, series) in &by_name {
            let entry = self.catalog.entry(series[0].kind);
            write_header(&mut output, name, entry.description, PrometheusType::Gauge);
            for sample in series {
                write_series(&mut output, name, &sample.labels, sample.value);
            }
        }

        let stats = self.stats.read();

        let up = build_fq_name(&self.namespace, "", "up");
        write_header(
            &mut output,
            &up,
            "Was the last scrape of nginx successful.",
            PrometheusType::Gauge,
        );
        write_series(
            &mut output,
            &up,
            std::iter::empty(),
            if stats.up { 1.0 } else { 0.0 },
        );

        let scrapes = build_fq_name(&self.namespace, "exporter", "total_scrapes");
        write_header(
            &mut output,
            &scrapes,
            "Current total nginx scrapes.",
            PrometheusType::Counter,
        );
        write_series(
            &mut output,
            &scrapes,
            std::iter::empty(),
            stats.total_scrapes as f64,
        );

        let build_info = build_fq_name(EXPORTER_NAME, "", "build_info");
        let version_labels: BTreeMap<String, String> =
            [("version".to_string(), env!("CARGO_PKG_VERSION").to_string())]
                .into_iter()
                .collect();
        write_header(
            &mut output,
            &build_info,
            "A metric with a constant '1' value labeled by the exporter version.",
            PrometheusType::Gauge,
        );
        write_series(&mut output, &build_info, &version_labels, 1.0);

        output
    }
}

/// Create a shareable collector handle.
pub type SharedCollector = Arc<MetricCollector>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn file_collector(path: &Path, selection: &str) -> MetricCollector {
        let catalog = Catalog::standard();
        let selection = Selection::parse(&catalog, selection);
        let fetcher = Fetcher::new(&format!("file://{}", path.display()), TIMEOUT).unwrap();
        MetricCollector::new(fetcher, catalog, selection, "nginx".to_string())
    }

    fn write_stats(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("stats.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn test_collect_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_stats(
            &dir,
            r#"{"channels":1,"infos":[{"channel":"news","published_messages":4,"stored_messages":1,"subscribers":3}]}"#,
        );
        let collector = file_collector(&path, &Catalog::standard().default_selection());

        let output = collector.collect().await;

        assert!(output.contains("# TYPE nginx_push_stream_channels gauge"));
        assert!(output.contains("nginx_push_stream_channels{channel=\"all\"} 1"));
        assert!(output.contains("nginx_push_stream_subscribers{channel=\"news\"} 3"));
        assert!(output.contains("nginx_push_stream_published_messages{channel=\"news\"} 4"));
        assert!(output.contains("nginx_push_stream_stored_messages{channel=\"news\"} 1"));
        assert!(output.contains("nginx_push_stream_subscribers_total{channel=\"all\"} 3"));
        assert!(output.contains("nginx_up 1"));
        assert!(output.contains("nginx_exporter_total_scrapes 1"));
        assert!(output.contains("nginx_push_stream_exporter_build_info{version=\""));

        let stats = collector.stats();
        assert!(stats.up);
        assert_eq!(stats.total_scrapes, 1);
        assert_eq!(stats.failed_scrapes, 0);
    }

    #[tokio::test]
    async fn test_collect_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_stats(&dir, r#"{"channels":"not-a-number","infos":[]}"#);
        let collector = file_collector(&path, &Catalog::standard().default_selection());

        let output = collector.collect().await;

        assert!(!output.contains("nginx_push_stream_channels"));
        assert!(!output.contains("nginx_push_stream_subscribers_total"));
        assert!(output.contains("nginx_up 0"));
        assert!(output.contains("nginx_exporter_total_scrapes 1"));
        assert!(matches!(
            collector.scrape().await,
            Err(ScrapeError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_collect_fetch_failure_then_recovery() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let collector = file_collector(&path, "channels");

        let output = collector.collect().await;
        assert!(output.contains("nginx_up 0"));

        std::fs::write(&path, r#"{"channels":7,"infos":[]}"#).unwrap();
        let output = collector.collect().await;

        assert!(output.contains("nginx_up 1"));
        assert!(output.contains("nginx_push_stream_channels{channel=\"all\"} 7"));
        assert!(output.contains("nginx_exporter_total_scrapes 2"));

        let stats = collector.stats();
        assert_eq!(stats.total_scrapes, 2);
        assert_eq!(stats.failed_scrapes, 1);
    }

    #[tokio::test]
    async fn test_collect_counts_coercion_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_stats(
            &dir,
            r#"{"channels":"2","infos":[
                {"channel":"a","published_messages":"1","stored_messages":"0","subscribers":"4"},
                {"channel":"b","published_messages":"1","stored_messages":"0","subscribers":"??"}
            ]}"#,
        );
        let collector = file_collector(&path, "subscribers");

        let output = collector.collect().await;

        assert!(output.contains("nginx_up 1"));
        assert!(output.contains("nginx_push_stream_subscribers{channel=\"a\"} 4"));
        assert!(!output.contains("nginx_push_stream_subscribers{channel=\"b\"}"));
        assert!(output.contains("nginx_push_stream_subscribers_total{channel=\"all\"} 4"));
        assert_eq!(collector.stats().coercion_warnings, 1);
    }

    #[tokio::test]
    async fn test_help_comes_from_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_stats(&dir, r#"{"channels":0,"infos":[]}"#);
        let collector = file_collector(&path, "");

        let output = collector.collect().await;
        let description = Catalog::standard()
            .entry(pushstream_common::MetricKind::SubscribersTotal)
            .description;

        assert!(output.contains(&format!(
            "# HELP nginx_push_stream_subscribers_total {}",
            description
        )));
        assert!(!output.contains("nginx_push_stream_channels"));
    }
}
