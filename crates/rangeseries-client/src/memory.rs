//! In-memory [`RangeStore`].
//!
//! Behaves like a managed key-range table closely enough to run the client
//! end to end without a network: composite keys, inclusive range reads with
//! limit and reverse, idempotent deletes, a hard batch-size limit, and
//! credential checks driven by connection options.
//!
//! Clones share the same tables. Tables must be created before use; a request
//! against an unknown table fails with [`StoreErrorKind::ResourceNotFound`].
//!
//! ```ignore
//! let store = InMemoryStore::new();
//! store.create_table("events").await;
//!
//! let client = RangeStoreClient::builder()
//!     .table_name("events")
//!     .store(Arc::new(store.clone()))
//!     .build()
//!     .await?;
//! ```

use crate::error::{StoreError, StoreErrorKind, StoreResult};
use crate::store::{
    BatchWriteOutcome, ConnectionOptions, RangeQuery, RangeStore, StoreConnector,
    DEFAULT_MAX_BATCH_SIZE,
};
use async_trait::async_trait;
use rangeseries_core::{EventRecord, RecordKey, SubjectKey};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, trace};

type Partition = BTreeMap<i64, EventRecord>;
type Table = HashMap<SubjectKey, Partition>;

/// Connection option checked against [`InMemoryStore::require_credentials`].
pub const CREDENTIALS_OPTION: &str = "credentials";

#[derive(Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<String, Table>>>,
    max_batch_size: usize,
    required_credentials: Option<String>,
    authorized: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            required_credentials: None,
            authorized: true,
        }
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    /// Only handles connected with `credentials = secret` may issue requests.
    ///
    /// The returned handle itself is unauthenticated.
    pub fn require_credentials(mut self, secret: impl Into<String>) -> Self {
        self.required_credentials = Some(secret.into());
        self.authorized = false;
        self
    }

    pub async fn create_table(&self, name: &str) {
        self.tables
            .write()
            .await
            .entry(name.to_string())
            .or_default();
    }

    pub async fn delete_table(&self, name: &str) -> bool {
        self.tables.write().await.remove(name).is_some()
    }

    /// Number of records stored in a table, `None` if the table is missing.
    pub async fn item_count(&self, name: &str) -> Option<usize> {
        self.tables
            .read()
            .await
            .get(name)
            .map(|table| table.values().map(|p| p.len()).sum())
    }

    fn check_authorized(&self) -> StoreResult<()> {
        if self.authorized {
            Ok(())
        } else {
            Err(StoreError::new(
                StoreErrorKind::Credentials,
                "missing or invalid credentials",
            ))
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn table_not_found(table: &str) -> StoreError {
    StoreError::new(
        StoreErrorKind::ResourceNotFound,
        format!("table '{}' does not exist", table),
    )
}

#[async_trait]
impl RangeStore for InMemoryStore {
    async fn put_item(&self, table: &str, record: EventRecord) -> StoreResult<()> {
        self.check_authorized()?;
        let mut tables = self.tables.write().await;
        let rows = tables.get_mut(table).ok_or_else(|| table_not_found(table))?;
        rows.entry(record.subject_key.clone())
            .or_default()
            .insert(record.timestamp, record);
        Ok(())
    }

    async fn get_items_in_range(
        &self,
        table: &str,
        query: &RangeQuery,
    ) -> StoreResult<Vec<EventRecord>> {
        self.check_authorized()?;
        let tables = self.tables.read().await;
        let rows = tables.get(table).ok_or_else(|| table_not_found(table))?;
        let Some(partition) = rows.get(&query.subject_key) else {
            return Ok(Vec::new());
        };

        let min = query.min.unwrap_or(i64::MIN);
        let max = query.max.unwrap_or(i64::MAX);
        if min > max {
            return Ok(Vec::new());
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        let matching = partition.range(min..=max).map(|(_, record)| record);
        let items: Vec<EventRecord> = if query.reverse {
            matching.rev().take(limit).cloned().collect()
        } else {
            matching.take(limit).cloned().collect()
        };

        debug!(
            table,
            subject_key = %query.subject_key,
            count = items.len(),
            "Range read"
        );
        Ok(items)
    }

    async fn delete_item(&self, table: &str, key: &RecordKey) -> StoreResult<()> {
        self.check_authorized()?;
        let mut tables = self.tables.write().await;
        let rows = tables.get_mut(table).ok_or_else(|| table_not_found(table))?;
        if let Some(partition) = rows.get_mut(&key.subject_key) {
            partition.remove(&key.timestamp);
            if partition.is_empty() {
                rows.remove(&key.subject_key);
            }
        }
        Ok(())
    }

    async fn batch_write(
        &self,
        table: &str,
        records: Vec<EventRecord>,
    ) -> StoreResult<BatchWriteOutcome> {
        self.check_authorized()?;
        if records.len() > self.max_batch_size {
            return Err(StoreError::new(
                StoreErrorKind::Validation,
                format!(
                    "batch of {} exceeds limit of {}",
                    records.len(),
                    self.max_batch_size
                ),
            ));
        }

        let mut tables = self.tables.write().await;
        let rows = tables.get_mut(table).ok_or_else(|| table_not_found(table))?;
        let written = records.len();
        for record in records {
            rows.entry(record.subject_key.clone())
                .or_default()
                .insert(record.timestamp, record);
        }
        trace!(table, written, "Batch written");

        Ok(BatchWriteOutcome {
            written,
            rejected: Vec::new(),
        })
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }
}

#[async_trait]
impl StoreConnector for InMemoryStore {
    async fn connect(&self, options: &ConnectionOptions) -> StoreResult<Arc<dyn RangeStore>> {
        let mut handle = self.clone();
        handle.authorized = match &self.required_credentials {
            None => true,
            Some(secret) => options.get(CREDENTIALS_OPTION) == Some(secret),
        };
        Ok(Arc::new(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rangeseries_core::{encode, EncodeOptions, EventValue};
    use serde_json::json;

    fn record(subject: &str, timestamp: i64) -> EventRecord {
        encode(
            &SubjectKey::new(subject, "t"),
            "t",
            timestamp,
            &EventValue::Single(json!({ "ts": timestamp })),
            EncodeOptions::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_table_is_resource_not_found() {
        let store = InMemoryStore::new();
        let err = store.put_item("missing", record("u", 1)).await.unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::ResourceNotFound);
    }

    #[tokio::test]
    async fn test_put_overwrites_same_key() {
        let store = InMemoryStore::new();
        store.create_table("t").await;
        store.put_item("t", record("u", 1)).await.unwrap();
        store.put_item("t", record("u", 1)).await.unwrap();
        assert_eq!(store.item_count("t").await, Some(1));
    }

    #[tokio::test]
    async fn test_range_read_order_limit_reverse() {
        let store = InMemoryStore::new();
        store.create_table("t").await;
        for ts in [5, 1, 3, 9, 7] {
            store.put_item("t", record("u", ts)).await.unwrap();
        }
        store.put_item("t", record("other", 4)).await.unwrap();

        let key = SubjectKey::new("u", "t");
        let asc = store
            .get_items_in_range("t", &RangeQuery::new(key.clone()).between(3, 7))
            .await
            .unwrap();
        let asc: Vec<i64> = asc.iter().map(|r| r.timestamp).collect();
        assert_eq!(asc, vec![3, 5, 7]);

        let latest = store
            .get_items_in_range("t", &RangeQuery::new(key).reverse().limit(2))
            .await
            .unwrap();
        let latest: Vec<i64> = latest.iter().map(|r| r.timestamp).collect();
        assert_eq!(latest, vec![9, 7]);
    }

    #[tokio::test]
    async fn test_range_read_open_and_inverted_bounds() {
        let store = InMemoryStore::new();
        store.create_table("t").await;
        for ts in [i64::MIN + 1, -5, 1, i64::MAX] {
            store.put_item("t", record("u", ts)).await.unwrap();
        }
        let key = SubjectKey::new("u", "t");

        let all = store
            .get_items_in_range("t", &RangeQuery::new(key.clone()))
            .await
            .unwrap();
        assert_eq!(all.len(), 4);

        let mut upper_only = RangeQuery::new(key.clone());
        upper_only.max = Some(0);
        let items = store.get_items_in_range("t", &upper_only).await.unwrap();
        let ts: Vec<i64> = items.iter().map(|r| r.timestamp).collect();
        assert_eq!(ts, vec![i64::MIN + 1, -5]);

        let inverted = RangeQuery::new(key).between(10, 1);
        assert!(store.get_items_in_range("t", &inverted).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let store = InMemoryStore::new();
        store.create_table("t").await;
        let key = RecordKey::new(SubjectKey::new("nobody", "t"), 42);
        store.delete_item("t", &key).await.unwrap();
    }

    #[tokio::test]
    async fn test_batch_over_limit_is_validation_error() {
        let store = InMemoryStore::new().with_max_batch_size(2);
        store.create_table("t").await;
        let err = store
            .batch_write("t", vec![record("u", 1), record("u", 2), record("u", 3)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::Validation);
        assert_eq!(store.item_count("t").await, Some(0));
    }

    #[tokio::test]
    async fn test_connect_checks_credentials() {
        let store = InMemoryStore::new().require_credentials("s3cret");
        store.create_table("t").await;

        let mut good = ConnectionOptions::new();
        good.insert(CREDENTIALS_OPTION.to_string(), "s3cret".to_string());
        let handle = store.connect(&good).await.unwrap();
        handle.put_item("t", record("u", 1)).await.unwrap();

        let mut bad = ConnectionOptions::new();
        bad.insert(CREDENTIALS_OPTION.to_string(), "invalid credentials".to_string());
        let handle = store.connect(&bad).await.unwrap();
        let err = handle.put_item("t", record("u", 2)).await.unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::Credentials);

        assert_eq!(store.item_count("t").await, Some(1));
    }
}
