//! Range Store Client
//!
//! The public face of RangeSeries. A client is bound to one table and stores
//! events per `(subject, type tag)` partition, ordered by timestamp.
//!
//! ## Architecture
//!
//! ```text
//!   put / put_batch / put_chunked            query / get_latest / delete
//!            │                                        │
//!            ▼                                        ▼
//!   ┌──────────────────┐                     ┌──────────────────┐
//!   │ validate, encode │                     │ validate         │
//!   │ (chunk_by_day)   │                     └────────┬─────────┘
//!   └────────┬─────────┘                              │
//!            │ single        │ many                   │
//!            ▼               ▼                        ▼
//!        put_item      BatchWriter ─────→   RangeStore (Arc<dyn>)
//!                                                     │
//!                                          decode + flatten on reads
//! ```
//!
//! ## Guarantees
//!
//! - Arguments are validated before any request reaches the store.
//! - Writes are keyed by `(subjectKey, timestamp)` and overwrite silently.
//! - A corrupt stored record fails the whole query.
//! - `get_latest` answers `Ok(None)` when the partition is empty.
//!
//! ## Example
//!
//! ```ignore
//! use rangeseries_client::{InMemoryStore, QueryOptions, RangeStoreClient};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let store = InMemoryStore::new();
//! store.create_table("events").await;
//!
//! let client = RangeStoreClient::builder()
//!     .table_name("events")
//!     .store(Arc::new(store))
//!     .build()
//!     .await?;
//!
//! client.put("user-1", "steps", 1_447_858_800_001, json!({ "count": 120 })).await?;
//! let events = client
//!     .query("user-1", "steps", 0, i64::MAX, QueryOptions::default())
//!     .await?;
//! ```

use crate::batch::BatchWriter;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::retry::RetryPolicy;
use crate::store::{ConnectionOptions, RangeQuery, RangeStore, StoreConnector};
use rangeseries_core::{
    chunk_by_day, decode, encode, flatten, DecodedPayload, EncodeOptions, EventPayload,
    EventRecord, EventValue, RecordKey, SubjectKey,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Acknowledgement of a single put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutAck {
    pub subject_key: SubjectKey,
    pub timestamp: i64,
    pub compressed: bool,
}

/// Read options for [`RangeStoreClient::query`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Newest stored record first
    pub latest: bool,
    /// Maximum number of stored records read (a chunk counts once)
    pub limit: Option<usize>,
}

impl QueryOptions {
    pub fn latest() -> Self {
        Self {
            latest: true,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One element of [`RangeStoreClient::put_batch`].
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    pub timestamp: i64,
    pub value: EventValue,
}

impl BatchItem {
    pub fn new(timestamp: i64, value: impl Into<EventValue>) -> Self {
        Self {
            timestamp,
            value: value.into(),
        }
    }
}

/// Time-series client over a [`RangeStore`].
///
/// Cheap to share: wrap it in an `Arc` and call it from as many tasks as needed.
pub struct RangeStoreClient {
    config: ClientConfig,
    store: Arc<dyn RangeStore>,
    writer: BatchWriter,
}

impl RangeStoreClient {
    pub fn builder() -> RangeStoreClientBuilder {
        RangeStoreClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    fn default_options(&self) -> EncodeOptions {
        EncodeOptions {
            compress: self.config.compress,
        }
    }

    /// Store one event, using the configured compression default.
    pub async fn put(
        &self,
        subject_id: &str,
        type_tag: &str,
        timestamp: i64,
        value: impl Into<EventValue>,
    ) -> Result<PutAck> {
        let options = self.default_options();
        self.put_with(subject_id, type_tag, timestamp, value, options)
            .await
    }

    /// Store one event with explicit codec options.
    ///
    /// Replaces any event already stored under the same key.
    pub async fn put_with(
        &self,
        subject_id: &str,
        type_tag: &str,
        timestamp: i64,
        value: impl Into<EventValue>,
        options: EncodeOptions,
    ) -> Result<PutAck> {
        let subject_key = subject_key(subject_id, type_tag)?;
        validate_timestamp(timestamp)?;
        let value = value.into();
        validate_value(&value)?;

        let record = encode(&subject_key, type_tag, timestamp, &value, options)?;
        let compressed = record.compressed;

        debug!(
            table = %self.config.table_name,
            subject_key = %subject_key,
            timestamp,
            compressed,
            "Putting event"
        );
        self.store.put_item(&self.config.table_name, record).await?;

        Ok(PutAck {
            subject_key,
            timestamp,
            compressed,
        })
    }

    /// Store many events, one record each, through the batch writer.
    ///
    /// Returns the number of records written. Fails with
    /// [`ClientError::PartialWrite`] when the retry budget runs out or the
    /// store refuses a request outright. Store failures on this path are not
    /// reported as [`ClientError::Store`]: inspect `source.kind()` of the
    /// partial write instead (e.g. for bad credentials).
    pub async fn put_batch(
        &self,
        subject_id: &str,
        type_tag: &str,
        items: Vec<BatchItem>,
    ) -> Result<usize> {
        let subject_key = subject_key(subject_id, type_tag)?;
        for item in &items {
            validate_timestamp(item.timestamp)?;
            validate_value(&item.value)?;
        }

        let options = self.default_options();
        let records = items
            .iter()
            .map(|item| encode(&subject_key, type_tag, item.timestamp, &item.value, options))
            .collect::<rangeseries_core::Result<Vec<EventRecord>>>()?;

        debug!(
            table = %self.config.table_name,
            subject_key = %subject_key,
            records = records.len(),
            "Putting batch"
        );
        self.writer.write_all(records).await
    }

    /// Bulk ingestion: group an ordered event sequence into one record per UTC day.
    ///
    /// Events with an empty type tag take `type_tag`. Input order is kept as
    /// given; a sequence that leaves a day and comes back produces two records
    /// for that day. Returns the number of records written.
    ///
    /// Errors follow [`RangeStoreClient::put_batch`]: store failures arrive as
    /// [`ClientError::PartialWrite`] with the store error as `source`.
    pub async fn put_chunked(
        &self,
        subject_id: &str,
        type_tag: &str,
        events: Vec<EventPayload>,
    ) -> Result<usize> {
        let subject_key = subject_key(subject_id, type_tag)?;
        let events = events
            .into_iter()
            .map(|mut event| {
                validate_timestamp(event.timestamp)?;
                if event.type_tag.is_empty() {
                    event.type_tag = type_tag.to_string();
                }
                Ok(event)
            })
            .collect::<Result<Vec<_>>>()?;

        let event_count = events.len();
        let chunks = chunk_by_day(events)?;

        let options = self.default_options();
        let records = chunks
            .into_iter()
            .map(|chunk| {
                let (chunk_tag, chunk_ts) = (chunk.type_tag.clone(), chunk.timestamp);
                encode(&subject_key, &chunk_tag, chunk_ts, &chunk.into_value(), options)
            })
            .collect::<rangeseries_core::Result<Vec<EventRecord>>>()?;

        debug!(
            table = %self.config.table_name,
            subject_key = %subject_key,
            events = event_count,
            chunks = records.len(),
            "Putting day chunks"
        );
        self.writer.write_all(records).await
    }

    /// Events stored in `[start, end]` (inclusive), flattened.
    ///
    /// Ascending by stored record unless `options.latest`, in which case
    /// records come newest first while the entries of each chunk keep their
    /// own order.
    pub async fn query(
        &self,
        subject_id: &str,
        type_tag: &str,
        start: i64,
        end: i64,
        options: QueryOptions,
    ) -> Result<Vec<EventPayload>> {
        let subject_key = subject_key(subject_id, type_tag)?;
        validate_timestamp(start)?;
        validate_timestamp(end)?;
        if start > end {
            return Err(ClientError::InvalidArgument(format!(
                "start {} is after end {}",
                start, end
            )));
        }

        let mut range = RangeQuery::new(subject_key).between(start, end);
        if options.latest {
            range = range.reverse();
        }
        if let Some(limit) = options.limit {
            range = range.limit(limit);
        }

        self.read(&range).await
    }

    /// Most recent event of a partition, `None` if it holds no events.
    pub async fn get_latest(
        &self,
        subject_id: &str,
        type_tag: &str,
    ) -> Result<Option<EventPayload>> {
        let range = RangeQuery::new(subject_key(subject_id, type_tag)?)
            .reverse()
            .limit(1);
        let mut events = self.read(&range).await?;
        Ok(events.pop())
    }

    /// Remove the record stored at `timestamp`. Deleting a missing record succeeds.
    pub async fn delete(&self, subject_id: &str, type_tag: &str, timestamp: i64) -> Result<()> {
        let subject_key = subject_key(subject_id, type_tag)?;
        validate_timestamp(timestamp)?;

        debug!(
            table = %self.config.table_name,
            subject_key = %subject_key,
            timestamp,
            "Deleting event"
        );
        let key = RecordKey::new(subject_key, timestamp);
        self.store.delete_item(&self.config.table_name, &key).await?;
        Ok(())
    }

    async fn read(&self, range: &RangeQuery) -> Result<Vec<EventPayload>> {
        debug!(
            table = %self.config.table_name,
            subject_key = %range.subject_key,
            min = ?range.min,
            max = ?range.max,
            reverse = range.reverse,
            "Range query"
        );

        let records = self
            .store
            .get_items_in_range(&self.config.table_name, range)
            .await?;
        let decoded = records
            .iter()
            .map(decode)
            .collect::<rangeseries_core::Result<Vec<DecodedPayload>>>()?;

        Ok(flatten(decoded))
    }
}

fn subject_key(subject_id: &str, type_tag: &str) -> Result<SubjectKey> {
    if subject_id.is_empty() {
        return Err(ClientError::InvalidArgument(
            "subject_id is required".to_string(),
        ));
    }
    if type_tag.is_empty() {
        return Err(ClientError::InvalidArgument(
            "type_tag is required".to_string(),
        ));
    }
    Ok(SubjectKey::new(subject_id, type_tag))
}

/// Empty lists and strings would be stored as records that flatten to nothing.
fn validate_value(value: &EventValue) -> Result<()> {
    let empty = match value {
        EventValue::Single(_) => false,
        EventValue::List(items) => items.is_empty(),
        EventValue::Serialized(text) => text.is_empty(),
    };
    if empty {
        return Err(ClientError::InvalidArgument("event is required".to_string()));
    }
    Ok(())
}

fn validate_timestamp(timestamp: i64) -> Result<()> {
    if timestamp == 0 {
        return Err(ClientError::InvalidArgument(
            "timestamp is required".to_string(),
        ));
    }
    Ok(())
}

/// Builder for [`RangeStoreClient`].
///
/// Either a ready store handle or a connector must be supplied. With a
/// connector, `build()` opens a fresh handle from the configured connection
/// options, so each client owns its connection.
///
/// ```ignore
/// let client = RangeStoreClient::builder()
///     .table_name("events")
///     .connection_option("credentials", secret)
///     .connector(Arc::new(store))
///     .compress(true)
///     .max_retries(8)
///     .build()
///     .await?;
/// ```
pub struct RangeStoreClientBuilder {
    config: ClientConfig,
    store: Option<Arc<dyn RangeStore>>,
    connector: Option<Arc<dyn StoreConnector>>,
}

impl RangeStoreClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::new(String::new()),
            store: None,
            connector: None,
        }
    }

    /// Replace the whole configuration (e.g. one loaded with [`ClientConfig::from_json_str`]).
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the table name (required).
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.config.table_name = table_name.into();
        self
    }

    pub fn connection_options(mut self, options: ConnectionOptions) -> Self {
        self.config.connection_options = options;
        self
    }

    pub fn connection_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.connection_options.insert(key.into(), value.into());
        self
    }

    /// Compress payloads by default (default: false).
    pub fn compress(mut self, compress: bool) -> Self {
        self.config.compress = compress;
        self
    }

    /// Use an already connected store handle.
    pub fn store(mut self, store: Arc<dyn RangeStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Open the store handle at build time from the connection options.
    pub fn connector(mut self, connector: Arc<dyn StoreConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Cap records per batch request (default: 25).
    pub fn max_batch_size(mut self, size: usize) -> Self {
        self.config.batch.max_batch_size = size;
        self
    }

    /// Resubmissions after the first batch attempt (default: 5).
    pub fn max_retries(mut self, retries: usize) -> Self {
        self.config.batch.max_retries = retries;
        self
    }

    /// Take all backoff settings from a policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        let batch = &mut self.config.batch;
        batch.max_retries = policy.max_retries;
        batch.initial_backoff_ms = duration_ms(policy.initial_backoff);
        batch.max_backoff_ms = duration_ms(policy.max_backoff);
        batch.backoff_multiplier = policy.backoff_multiplier;
        self
    }

    /// Randomize backoff by ±25% (default: true).
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.config.batch.jitter = jitter;
        self
    }

    pub async fn build(self) -> Result<RangeStoreClient> {
        self.config.validate()?;

        let store = match (self.store, self.connector) {
            (Some(store), _) => store,
            (None, Some(connector)) => connector.connect(&self.config.connection_options).await?,
            (None, None) => {
                return Err(ClientError::ConfigError(
                    "a store or a store connector is required".to_string(),
                ))
            }
        };

        let mut writer = BatchWriter::new(
            Arc::clone(&store),
            self.config.table_name.clone(),
            self.config.batch.max_batch_size,
            self.config.batch.retry_policy(),
        );
        if !self.config.batch.jitter {
            writer = writer.without_jitter();
        }

        info!(
            table = %self.config.table_name,
            compress = self.config.compress,
            max_batch_size = writer.max_batch_size(),
            max_retries = self.config.batch.max_retries,
            "RangeStore client initialized"
        );

        Ok(RangeStoreClient {
            config: self.config,
            store,
            writer,
        })
    }
}

/// Milliseconds, saturating at `u64::MAX`.
fn duration_ms(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Default for RangeStoreClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
