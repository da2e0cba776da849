//! The fixed set of metrics the exporter knows how to produce.

use std::fmt;

/// Label attached to every push stream sample.
pub const CHANNEL_LABEL: &str = "channel";

/// Label value used for server-wide samples.
pub const ALL_CHANNELS: &str = "all";

/// A metric kind the exporter can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    Channels,
    Subscribers,
    PublishedMessages,
    StoredMessages,
    SubscribersTotal,
}

impl MetricKind {
    /// Stable key, identical to the payload field name.
    pub fn key(&self) -> &'static str {
        match self {
            MetricKind::Channels => "channels",
            MetricKind::Subscribers => "subscribers",
            MetricKind::PublishedMessages => "published_messages",
            MetricKind::StoredMessages => "stored_messages",
            MetricKind::SubscribersTotal => "subscribers_total",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Descriptor of one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub kind: MetricKind,
    pub description: &'static str,
    pub labels: &'static [&'static str],
}

impl CatalogEntry {
    pub fn key(&self) -> &'static str {
        self.kind.key()
    }
}

const ENTRIES: [CatalogEntry; 5] = [
    CatalogEntry {
        kind: MetricKind::Channels,
        description: "Current number of existing channels on this server.",
        labels: &[CHANNEL_LABEL],
    },
    CatalogEntry {
        kind: MetricKind::Subscribers,
        description: "Current number of connected subscribers on channels on this server.",
        labels: &[CHANNEL_LABEL],
    },
    CatalogEntry {
        kind: MetricKind::PublishedMessages,
        description: "Number of messages published to channels on this server.",
        labels: &[CHANNEL_LABEL],
    },
    CatalogEntry {
        kind: MetricKind::StoredMessages,
        description: "Number of messages currently stored in channels on this server.",
        labels: &[CHANNEL_LABEL],
    },
    CatalogEntry {
        kind: MetricKind::SubscribersTotal,
        description: "Total current number of connected subscribers on this server.",
        labels: &[CHANNEL_LABEL],
    },
];

/// Immutable registry of all emittable metrics.
///
/// Built once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: &'static [CatalogEntry],
}

impl Catalog {
    /// The catalog of push stream channel metrics.
    pub fn standard() -> Self {
        Self { entries: &ENTRIES }
    }

    pub fn entries(&self) -> &'static [CatalogEntry] {
        self.entries
    }

    /// Look up a descriptor by its key.
    pub fn get(&self, key: &str) -> Option<&'static CatalogEntry> {
        self.entries.iter().find(|e| e.key() == key)
    }

    /// Descriptor for a metric kind.
    pub fn entry(&self, kind: MetricKind) -> &'static CatalogEntry {
        // ENTRIES is laid out in MetricKind declaration order.
        &self.entries[kind as usize]
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self.entries.iter().map(|e| e.key()).collect();
        keys.sort_unstable();
        keys
    }

    /// Sorted keys joined by commas; the default metric selection.
    pub fn default_selection(&self) -> String {
        self.keys().join(",")
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}
