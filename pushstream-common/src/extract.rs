//! Turning a decoded [`StatsRecord`] into labeled metric samples.
//!
//! Extraction is a pure function of the record and the [`Selection`]: it does
//! no I/O and keeps no state between calls, so concurrent scrapes can call it
//! freely.

use std::collections::BTreeMap;
use std::fmt;

use crate::catalog::{ALL_CHANNELS, CHANNEL_LABEL, MetricKind};
use crate::filter::Selection;
use crate::wire::{ChannelRecord, Count, StatsRecord};

/// One observation produced by a scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub kind: MetricKind,
    pub value: f64,
    pub labels: BTreeMap<String, String>,
}

impl Sample {
    fn new(kind: MetricKind, channel: &str, value: u64) -> Self {
        let mut labels = BTreeMap::new();
        labels.insert(CHANNEL_LABEL.to_string(), channel.to_string());

        Self {
            kind,
            value: value as f64,
            labels,
        }
    }

    /// Value of the `channel` label.
    pub fn channel(&self) -> Option<&str> {
        self.labels.get(CHANNEL_LABEL).map(String::as_str)
    }
}

/// A per-channel count that could not be read as a non-negative integer.
///
/// Only the text payload shape produces these. They never fail a scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCoercionWarning {
    pub channel: String,
    pub field: MetricKind,
    pub raw: String,
}

impl fmt::Display for FieldCoercionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "channel '{}': {} value {:?} is not an integer",
            self.channel, self.field, self.raw
        )
    }
}

/// Result of one extraction pass.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub samples: Vec<Sample>,
    pub warnings: Vec<FieldCoercionWarning>,
}

impl Extraction {
    fn warn(&mut self, channel: &ChannelRecord, field: MetricKind, raw: &str) {
        let warning = FieldCoercionWarning {
            channel: channel.name.clone(),
            field,
            raw: raw.to_string(),
        };
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }
}

/// Where the value of a metric kind comes from.
enum Source {
    /// Server-wide field of the record.
    Server(fn(&StatsRecord) -> u64),
    /// Per-channel field, one sample per channel.
    Channel(fn(&ChannelRecord) -> &Count),
    /// Rollup across channels.
    Aggregate,
}

fn total_channels(record: &StatsRecord) -> u64 {
    record.total_channels
}

fn subscribers(channel: &ChannelRecord) -> &Count {
    &channel.subscribers
}

fn published_messages(channel: &ChannelRecord) -> &Count {
    &channel.published_messages
}

fn stored_messages(channel: &ChannelRecord) -> &Count {
    &channel.stored_messages
}

fn source(kind: MetricKind) -> Source {
    match kind {
        MetricKind::Channels => Source::Server(total_channels),
        MetricKind::Subscribers => Source::Channel(subscribers),
        MetricKind::PublishedMessages => Source::Channel(published_messages),
        MetricKind::StoredMessages => Source::Channel(stored_messages),
        MetricKind::SubscribersTotal => Source::Aggregate,
    }
}

/// Produce the samples for `record`.
///
/// `subscribers_total` is emitted exactly once whether or not it is part of
/// `selection`. Malformed per-channel counts are skipped, reported in
/// [`Extraction::warnings`], and count as zero towards the total.
pub fn extract(record: &StatsRecord, selection: &Selection) -> Extraction {
    let mut out = Extraction::default();

    for entry in selection.entries() {
        match source(entry.kind) {
            Source::Server(field) => {
                out.samples
                    .push(Sample::new(entry.kind, ALL_CHANNELS, field(record)));
            }
            Source::Channel(field) => {
                for channel in &record.channels {
                    match field(channel) {
                        Count::Known(v) => {
                            out.samples.push(Sample::new(entry.kind, &channel.name, *v))
                        }
                        Count::Malformed(raw) => out.warn(channel, entry.kind, raw),
                    }
                }
            }
            // Emitted below regardless of the selection.
            Source::Aggregate => {}
        }
    }

    let mut total: u64 = 0;
    for channel in &record.channels {
        match &channel.subscribers {
            Count::Known(v) => total = total.saturating_add(*v),
            Count::Malformed(raw) => out.warn(channel, MetricKind::Subscribers, raw),
        }
    }
    out.samples
        .push(Sample::new(MetricKind::SubscribersTotal, ALL_CHANNELS, total));

    out
}
