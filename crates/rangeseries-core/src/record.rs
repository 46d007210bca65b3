//! Record Data Structures
//!
//! This module defines the types that travel between the application, the
//! codec and the store.
//!
//! ## Application Side
//! - **EventValue**: what a caller hands to `put`: a single JSON value, a list
//!   of items, or a string the caller already serialized
//! - **EventItem**: one list element, with optional type tag / timestamp that
//!   are filled in from the surrounding call when missing
//! - **EventPayload**: a fully normalized event (timestamp, type tag, event).
//!   This is also what queries hand back after flattening.
//!
//! ## Store Side
//! - **SubjectKey**: partition key, `subject_id + type_tag` with no separator
//! - **EventRecord**: the persisted item
//!   `{ subjectKey, timestamp, compressed, payload: { timestamp, typeTag, event } }`
//! - **RecordKey**: the composite primary key `(subjectKey, timestamp)`
//!
//! ## Key Collisions
//! Because the subject key is a plain concatenation, `("ab", "c")` and
//! `("a", "bc")` land in the same partition. Callers must pick identifiers
//! and type tags that cannot split ambiguously.
//!
//! ## Example
//! ```ignore
//! let key = SubjectKey::new("user-42", "heartRate");
//! assert_eq!(key.as_str(), "user-42heartRate");
//!
//! let value = EventValue::from(serde_json::json!({ "bpm": 71 }));
//! ```

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Partition key derived from a subject identifier and an event type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectKey(String);

impl SubjectKey {
    pub fn new(subject_id: &str, type_tag: &str) -> Self {
        let mut key = String::with_capacity(subject_id.len() + type_tag.len());
        key.push_str(subject_id);
        key.push_str(type_tag);
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Composite primary key of a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordKey {
    pub subject_key: SubjectKey,
    pub timestamp: i64,
}

impl RecordKey {
    pub fn new(subject_key: SubjectKey, timestamp: i64) -> Self {
        Self {
            subject_key,
            timestamp,
        }
    }
}

/// A normalized event: every field present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    /// Timestamp in milliseconds since epoch
    pub timestamp: i64,
    pub type_tag: String,
    pub event: Value,
}

impl EventPayload {
    pub fn new(timestamp: i64, type_tag: impl Into<String>, event: Value) -> Self {
        Self {
            timestamp,
            type_tag: type_tag.into(),
            event,
        }
    }
}

/// One element of a list-shaped event before normalization.
///
/// Missing fields inherit the type tag and timestamp of the `encode` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
    pub event: Value,
}

impl EventItem {
    pub fn new(event: Value) -> Self {
        Self {
            timestamp: None,
            type_tag: None,
            event,
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_type_tag(mut self, type_tag: impl Into<String>) -> Self {
        self.type_tag = Some(type_tag.into());
        self
    }
}

impl From<Value> for EventItem {
    fn from(event: Value) -> Self {
        Self::new(event)
    }
}

impl From<EventPayload> for EventItem {
    fn from(payload: EventPayload) -> Self {
        Self {
            timestamp: Some(payload.timestamp),
            type_tag: Some(payload.type_tag),
            event: payload.event,
        }
    }
}

/// An application-level event as handed to the write path.
#[derive(Debug, Clone, PartialEq)]
pub enum EventValue {
    /// Arbitrary structured data.
    Single(Value),
    /// Several events stored under one key (also the shape of a day chunk).
    List(Vec<EventItem>),
    /// Pre-serialized by the caller, stored verbatim, never compressed.
    Serialized(String),
}

impl From<Value> for EventValue {
    /// JSON arrays become `List` with bare items; everything else is `Single`.
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => EventValue::List(items.into_iter().map(EventItem::new).collect()),
            other => EventValue::Single(other),
        }
    }
}

impl From<Vec<EventItem>> for EventValue {
    fn from(items: Vec<EventItem>) -> Self {
        EventValue::List(items)
    }
}

/// The `event` attribute of a stored payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum PayloadBody {
    Value(Value),
    Entries(Vec<EventPayload>),
    Serialized(String),
    /// LZ4 block (size-prepended) of the JSON form of a `Value` or `Entries` body.
    Compressed(Bytes),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPayload {
    pub timestamp: i64,
    pub type_tag: String,
    pub event: PayloadBody,
}

/// A persisted item, immutable once written.
///
/// `payload.timestamp` always equals `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub subject_key: SubjectKey,
    pub timestamp: i64,
    pub compressed: bool,
    pub payload: RecordPayload,
}

impl EventRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.subject_key.clone(), self.timestamp)
    }
}
