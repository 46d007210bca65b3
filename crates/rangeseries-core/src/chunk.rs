//! Day Chunking
//!
//! Bulk ingestion stores one record per calendar day instead of one record per
//! event. This cuts item count (and per-item storage cost) for dense series
//! while keeping every event individually recoverable through
//! [`crate::codec::flatten`].
//!
//! ## Calendar
//!
//! Day boundaries are computed in **UTC** on the proleptic Gregorian calendar.
//! Two timestamps share a chunk only when their full UTC calendar dates are
//! equal; weekday alone is never used, so events exactly one week apart land
//! in different chunks.
//!
//! ## Ordering
//!
//! The chunker does not sort. Input must be ascending by timestamp. Input that
//! leaves a day and comes back to it yields two chunks for that day; they are
//! not merged.
//!
//! ```text
//! input:  d1 d1 d2 d2 d2 d3
//! output: [d1 d1] [d2 d2 d2] [d3]
//!
//! input:  d1 d2 d1          (unsorted)
//! output: [d1] [d2] [d1]
//! ```

use crate::error::{Error, Result};
use crate::record::{EventItem, EventPayload, EventValue};
use chrono::{NaiveDate, TimeZone, Utc};

/// A group of same-day events, stored as one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Timestamp of the first entry
    pub timestamp: i64,
    /// Type tag of the first entry
    pub type_tag: String,
    pub entries: Vec<EventPayload>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The list-shaped value the codec stores for this chunk.
    pub fn into_value(self) -> EventValue {
        EventValue::List(self.entries.into_iter().map(EventItem::from).collect())
    }
}

/// UTC calendar date of an epoch-millisecond timestamp.
pub fn utc_day(timestamp: i64) -> Result<NaiveDate> {
    Utc.timestamp_millis_opt(timestamp)
        .single()
        .map(|dt| dt.date_naive())
        .ok_or_else(|| {
            Error::InvalidArgument(format!(
                "timestamp {} is outside the supported calendar range",
                timestamp
            ))
        })
}

/// Group consecutive same-day records.
///
/// Fails with `InvalidArgument` on empty input.
pub fn chunk_by_day(records: Vec<EventPayload>) -> Result<Vec<Chunk>> {
    let mut iter = records.into_iter();
    let first = iter
        .next()
        .ok_or_else(|| Error::InvalidArgument("cannot chunk an empty record list".to_string()))?;

    let mut current_day = utc_day(first.timestamp)?;
    let mut current = Chunk {
        timestamp: first.timestamp,
        type_tag: first.type_tag.clone(),
        entries: vec![first],
    };
    let mut chunks = Vec::new();

    for record in iter {
        let day = utc_day(record.timestamp)?;
        if day != current_day {
            let next = Chunk {
                timestamp: record.timestamp,
                type_tag: record.type_tag.clone(),
                entries: Vec::new(),
            };
            chunks.push(std::mem::replace(&mut current, next));
            current_day = day;
        }
        current.entries.push(record);
    }
    chunks.push(current);

    Ok(chunks)
}
