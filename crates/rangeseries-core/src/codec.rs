//! Event Codec
//!
//! Converts application events into stored [`EventRecord`]s and back. Every
//! write path (single put, batch put, chunked ingestion) goes through
//! [`encode`], and every read goes through [`decode`] followed by [`flatten`].
//!
//! ## Encoding Rules
//!
//! | Input                 | Stored `event`          | `compress` honoured |
//! |-----------------------|-------------------------|---------------------|
//! | `EventValue::Single`  | `Value` / `Compressed`  | yes                 |
//! | `EventValue::List`    | `Entries` / `Compressed`| yes                 |
//! | `EventValue::Serialized` | `Serialized`         | no                  |
//!
//! List elements are normalized by [`normalize`]: an element without a type
//! tag or timestamp gets the call's. The caller's items are never mutated.
//!
//! ## Compression
//!
//! The body is serialized to JSON and compressed with LZ4
//! (`lz4_flex::compress_prepend_size`). The `compressed` flag lives on each
//! record, so a table can hold a mix of compressed and plain records.
//!
//! ## Flattening
//!
//! Query results are a mix of plain records and list records (explicit arrays
//! or day chunks). [`flatten`] splices list records in place so callers see
//! one event per element, in order.

use crate::error::{CodecError, Result};
use crate::record::{
    EventItem, EventPayload, EventRecord, EventValue, PayloadBody, RecordPayload, SubjectKey,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-write codec options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeOptions {
    /// LZ4-compress structured bodies
    pub compress: bool,
}

impl EncodeOptions {
    pub fn compressed() -> Self {
        Self { compress: true }
    }
}

/// The decoded `event` of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum EventBody {
    Value(Value),
    Entries(Vec<EventPayload>),
    Serialized(String),
}

/// A record after decompression, ready for flattening.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPayload {
    pub timestamp: i64,
    pub type_tag: String,
    pub body: EventBody,
}

/// Fill missing type tags and timestamps from the call.
///
/// Pure: returns new payloads, the input slice is untouched.
pub fn normalize(type_tag: &str, timestamp: i64, items: &[EventItem]) -> Vec<EventPayload> {
    items
        .iter()
        .map(|item| EventPayload {
            timestamp: item.timestamp.unwrap_or(timestamp),
            type_tag: item
                .type_tag
                .clone()
                .unwrap_or_else(|| type_tag.to_string()),
            event: item.event.clone(),
        })
        .collect()
}

/// Build the stored record for one event.
pub fn encode(
    subject_key: &SubjectKey,
    type_tag: &str,
    timestamp: i64,
    value: &EventValue,
    options: EncodeOptions,
) -> Result<EventRecord> {
    let body = match value {
        EventValue::Single(value) => PayloadBody::Value(value.clone()),
        EventValue::List(items) => PayloadBody::Entries(normalize(type_tag, timestamp, items)),
        EventValue::Serialized(text) => PayloadBody::Serialized(text.clone()),
    };

    let compressed = options.compress && !matches!(body, PayloadBody::Serialized(_));
    let event = if compressed {
        PayloadBody::Compressed(compress_body(&body)?)
    } else {
        body
    };

    Ok(EventRecord {
        subject_key: subject_key.clone(),
        timestamp,
        compressed,
        payload: RecordPayload {
            timestamp,
            type_tag: type_tag.to_string(),
            event,
        },
    })
}

/// Recover the original body of a stored record.
pub fn decode(record: &EventRecord) -> Result<DecodedPayload> {
    if record.payload.timestamp != record.timestamp {
        return Err(CodecError::InvalidRecord(format!(
            "payload timestamp {} does not match record timestamp {}",
            record.payload.timestamp, record.timestamp
        ))
        .into());
    }

    let body = match (&record.payload.event, record.compressed) {
        (PayloadBody::Compressed(bytes), true) => match decompress_body(bytes)? {
            PayloadBody::Value(value) => EventBody::Value(value),
            PayloadBody::Entries(entries) => EventBody::Entries(entries),
            PayloadBody::Serialized(_) | PayloadBody::Compressed(_) => {
                return Err(CodecError::InvalidRecord(
                    "compressed body must hold a value or entries".to_string(),
                )
                .into());
            }
        },
        (PayloadBody::Compressed(_), false) | (_, true) => {
            return Err(CodecError::InvalidRecord(format!(
                "compressed flag is {} but body {} compressed",
                record.compressed,
                if record.compressed { "is not" } else { "is" }
            ))
            .into());
        }
        (PayloadBody::Value(value), false) => EventBody::Value(value.clone()),
        (PayloadBody::Entries(entries), false) => EventBody::Entries(entries.clone()),
        (PayloadBody::Serialized(text), false) => EventBody::Serialized(text.clone()),
    };

    Ok(DecodedPayload {
        timestamp: record.payload.timestamp,
        type_tag: record.payload.type_tag.clone(),
        body,
    })
}

/// Splice list bodies into one ordered stream of events.
pub fn flatten(payloads: Vec<DecodedPayload>) -> Vec<EventPayload> {
    let mut out = Vec::with_capacity(payloads.len());
    for payload in payloads {
        match payload.body {
            EventBody::Entries(entries) => out.extend(entries),
            EventBody::Value(event) => out.push(EventPayload {
                timestamp: payload.timestamp,
                type_tag: payload.type_tag,
                event,
            }),
            EventBody::Serialized(text) => out.push(EventPayload {
                timestamp: payload.timestamp,
                type_tag: payload.type_tag,
                event: Value::String(text),
            }),
        }
    }
    out
}

fn compress_body(body: &PayloadBody) -> Result<Bytes> {
    let json = serde_json::to_vec(body).map_err(CodecError::from)?;
    Ok(Bytes::from(lz4_flex::compress_prepend_size(&json)))
}

fn decompress_body(bytes: &[u8]) -> Result<PayloadBody> {
    let json = lz4_flex::decompress_size_prepended(bytes)
        .map_err(|e| CodecError::Decompression(e.to_string()))?;
    let body = serde_json::from_slice(&json).map_err(CodecError::from)?;
    Ok(body)
}
