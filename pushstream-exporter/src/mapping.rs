//! Prometheus naming and text exposition helpers.

use std::fmt::Write;

use pushstream_common::MetricKind;

/// Subsystem between the namespace and the metric key.
pub const SUBSYSTEM: &str = "push_stream";

/// Build the full name of a push stream metric.
///
/// Format: `{namespace}_push_stream_{key}`
pub fn build_metric_name(namespace: &str, kind: MetricKind) -> String {
    build_fq_name(namespace, SUBSYSTEM, kind.key())
}

/// Join non-empty name components with underscores.
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// Prometheus metric type, as written in `# TYPE` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrometheusType {
    Counter,
    Gauge,
}

impl PrometheusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrometheusType::Counter => "counter",
            PrometheusType::Gauge => "gauge",
        }
    }
}

/// Write the `# HELP` and `# TYPE` header of a metric family.
pub fn write_header(out: &mut String, name: &str, help: &str, metric_type: PrometheusType) {
    writeln!(out, "# HELP {} {}", name, escape_help(help)).ok();
    writeln!(out, "# TYPE {} {}", name, metric_type.as_str()).ok();
}

/// Write one series line.
pub fn write_series<'a, I>(out: &mut String, name: &str, labels: I, value: f64)
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    writeln!(out, "{}{} {}", name, format_labels(labels), format_value(value)).ok();
}

/// Format labels for Prometheus exposition format.
pub fn format_labels<'a, I>(labels: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let parts: Vec<String> = labels
        .into_iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
        .collect();

    if parts.is_empty() {
        return String::new();
    }

    format!("{{{}}}", parts.join(","))
}

/// Escape special characters in label values.
pub fn escape_label_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            _ => result.push(c),
        }
    }
    result
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Format a floating point value for Prometheus.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        }
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}
