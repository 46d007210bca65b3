//! Key-range store capability.
//!
//! The client never talks to a concrete database. It drives a [`RangeStore`]:
//! a table of [`EventRecord`]s addressed by `(subjectKey, timestamp)` that
//! supports single puts, range reads, deletes, and bounded batch writes.
//! Transport, credentials, retries inside a single request and table
//! provisioning all belong to the implementation.
//!
//! A [`StoreConnector`] turns the verbatim `connectionOptions` map from
//! [`crate::ClientConfig`] into a store handle, so every client owns its own
//! connection.
//!
//! Implementations must be safe to share across tasks (`Send + Sync`).

use crate::error::StoreResult;
use async_trait::async_trait;
use rangeseries_core::{EventRecord, RecordKey, SubjectKey};
use std::collections::HashMap;
use std::sync::Arc;

/// Typical per-request item limit of managed key-value stores.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 25;

/// Options handed to the store client untouched (credentials, endpoint, region, ...).
pub type ConnectionOptions = HashMap<String, String>;

/// A read over one partition, bounds inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeQuery {
    pub subject_key: SubjectKey,
    /// Lower bound; `None` means unbounded
    pub min: Option<i64>,
    /// Upper bound; `None` means unbounded
    pub max: Option<i64>,
    /// Maximum records returned
    pub limit: Option<usize>,
    /// Descending timestamp order
    pub reverse: bool,
}

impl RangeQuery {
    /// Whole partition, ascending, no limit.
    pub fn new(subject_key: SubjectKey) -> Self {
        Self {
            subject_key,
            min: None,
            max: None,
            limit: None,
            reverse: false,
        }
    }

    pub fn between(mut self, min: i64, max: i64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        self.min.map_or(true, |min| timestamp >= min) && self.max.map_or(true, |max| timestamp <= max)
    }
}

/// Result of one batch-write request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchWriteOutcome {
    /// Records durably written by this request
    pub written: usize,
    /// Records the store refused this time (throttling, capacity); safe to resubmit
    pub rejected: Vec<EventRecord>,
}

#[async_trait]
pub trait RangeStore: Send + Sync {
    /// Write one record, replacing any record with the same key.
    async fn put_item(&self, table: &str, record: EventRecord) -> StoreResult<()>;

    /// Records of one partition within the query bounds, ordered by timestamp.
    async fn get_items_in_range(&self, table: &str, query: &RangeQuery)
        -> StoreResult<Vec<EventRecord>>;

    /// Remove one record. Removing a missing key succeeds.
    async fn delete_item(&self, table: &str, key: &RecordKey) -> StoreResult<()>;

    /// Write up to [`RangeStore::max_batch_size`] records in one request.
    async fn batch_write(&self, table: &str, records: Vec<EventRecord>)
        -> StoreResult<BatchWriteOutcome>;

    /// Largest batch accepted by [`RangeStore::batch_write`].
    fn max_batch_size(&self) -> usize {
        DEFAULT_MAX_BATCH_SIZE
    }
}

/// Opens a store handle from connection options.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, options: &ConnectionOptions) -> StoreResult<Arc<dyn RangeStore>>;
}
