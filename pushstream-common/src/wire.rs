//! Decoding of the push stream module's `channels-stats` payload.
//!
//! Two payload shapes exist depending on the module version:
//!
//! - the native shape, where every count is a JSON number
//!   (`{"channels": 2, "infos": [{"subscribers": 5, ...}]}`);
//! - the text shape, where every count is a decimal string
//!   (`{"channels": "2", "infos": [{"subscribers": "5", ...}]}`).
//!
//! The shape is picked from the type of the top-level `channels` field.
//! Both are normalized into a single [`StatsRecord`] so nothing downstream
//! has to care which one was received.

use serde::Deserialize;
use serde_json::Value;

use crate::error::DecodeError;

/// Payload shape a [`StatsRecord`] was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// Counts are JSON numbers.
    Native,
    /// Counts are decimal strings.
    Text,
}

/// A per-channel count after normalization.
///
/// The native shape only ever yields [`Count::Known`]. The text shape keeps
/// values that do not parse as [`Count::Malformed`] with the raw text, so a
/// single corrupt channel does not sink the whole scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Count {
    Known(u64),
    Malformed(String),
}

impl Count {
    fn parse(raw: String) -> Self {
        match raw.parse::<u64>() {
            Ok(v) => Count::Known(v),
            Err(_) => Count::Malformed(raw),
        }
    }
}

impl From<u64> for Count {
    fn from(v: u64) -> Self {
        Count::Known(v)
    }
}

/// Counters of a single channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRecord {
    pub name: String,
    pub published_messages: Count,
    pub stored_messages: Count,
    pub subscribers: Count,
}

/// One decoded scrape response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsRecord {
    pub schema: Schema,
    /// Server-wide channel count.
    pub total_channels: u64,
    /// Channels in the order the server listed them.
    pub channels: Vec<ChannelRecord>,
}

#[derive(Deserialize)]
struct NativePayload {
    #[serde(default)]
    channels: u64,
    infos: Option<Vec<NativeChannel>>,
}

#[derive(Deserialize)]
struct NativeChannel {
    #[serde(default)]
    channel: String,
    #[serde(default)]
    published_messages: u64,
    #[serde(default)]
    stored_messages: u64,
    #[serde(default)]
    subscribers: u64,
}

#[derive(Deserialize)]
struct TextPayload {
    channels: String,
    infos: Option<Vec<TextChannel>>,
}

#[derive(Deserialize)]
struct TextChannel {
    #[serde(default)]
    channel: String,
    #[serde(default)]
    published_messages: TextCount,
    #[serde(default)]
    stored_messages: TextCount,
    #[serde(default)]
    subscribers: TextCount,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextCount {
    Number(u64),
    Text(String),
    Other(Value),
}

impl Default for TextCount {
    fn default() -> Self {
        TextCount::Number(0)
    }
}

impl From<TextCount> for Count {
    fn from(raw: TextCount) -> Self {
        match raw {
            TextCount::Number(v) => Count::Known(v),
            TextCount::Text(s) => Count::parse(s),
            TextCount::Other(v) => Count::Malformed(v.to_string()),
        }
    }
}

/// Decode a raw `channels-stats` response body.
///
/// Either a complete record is returned or nothing is: malformed JSON, a
/// non-integer anywhere in the native shape, or an unparseable top-level
/// channel count in the text shape all fail the whole decode.
///
/// Missing fields are read as zero, so an unrelated JSON object (a wrong
/// endpoint, for instance) decodes as a healthy server with no channels.
pub fn decode(bytes: &[u8]) -> Result<StatsRecord, DecodeError> {
    let value: Value = serde_json::from_slice(bytes)?;

    match value.get("channels") {
        Some(Value::String(_)) => decode_text(value),
        _ => decode_native(value),
    }
}

fn decode_native(value: Value) -> Result<StatsRecord, DecodeError> {
    let payload: NativePayload = serde_json::from_value(value)?;

    let channels = payload
        .infos
        .unwrap_or_default()
        .into_iter()
        .map(|info| ChannelRecord {
            name: info.channel,
            published_messages: info.published_messages.into(),
            stored_messages: info.stored_messages.into(),
            subscribers: info.subscribers.into(),
        })
        .collect();

    Ok(StatsRecord {
        schema: Schema::Native,
        total_channels: payload.channels,
        channels,
    })
}

fn decode_text(value: Value) -> Result<StatsRecord, DecodeError> {
    let payload: TextPayload = serde_json::from_value(value)?;

    let total_channels = payload
        .channels
        .parse::<u64>()
        .map_err(|_| DecodeError::InvalidCount {
            field: "channels",
            value: payload.channels.clone(),
        })?;

    let channels = payload
        .infos
        .unwrap_or_default()
        .into_iter()
        .map(|info| ChannelRecord {
            name: info.channel,
            published_messages: info.published_messages.into(),
            stored_messages: info.stored_messages.into(),
            subscribers: info.subscribers.into(),
        })
        .collect();

    Ok(StatsRecord {
        schema: Schema::Text,
        total_channels,
        channels,
    })
}
