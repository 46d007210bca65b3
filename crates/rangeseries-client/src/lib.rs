//! RangeSeries Client - time-series storage over a key-range store
//!
//! This crate stores timestamped JSON events in any table that is addressed by
//! a partition key plus a numeric sort key. It handles argument validation,
//! optional LZ4 compression, day chunking for bulk ingestion, bounded batch
//! writes with retries, and flattening of query results.
//!
//! The store itself is abstract: implement [`RangeStore`] (and optionally
//! [`StoreConnector`]) for the database of your choice. [`InMemoryStore`] is
//! provided for tests and local development.
//!
//! # Examples
//!
//! ## Single events
//!
//! ```ignore
//! use rangeseries_client::{QueryOptions, RangeStoreClient};
//!
//! let client = RangeStoreClient::builder()
//!     .table_name("events")
//!     .store(store)
//!     .build()
//!     .await?;
//!
//! client.put("user-1", "testEvent", 100, json!({ "eventFoo": "bar" })).await?;
//! let events = client.query("user-1", "testEvent", 100, 1000, QueryOptions::default()).await?;
//! ```
//!
//! ## Bulk ingestion
//!
//! ```ignore
//! // One stored record per UTC day, written 25 at a time
//! let written = client.put_chunked("user-1", "heartRate", samples).await?;
//! let latest = client.get_latest("user-1", "heartRate").await?;
//! ```

pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod memory;
pub mod retry;
pub mod store;

pub use batch::BatchWriter;
pub use client::{BatchItem, PutAck, QueryOptions, RangeStoreClient, RangeStoreClientBuilder};
pub use config::{BatchConfig, ClientConfig};
pub use error::{ClientError, Result, StoreError, StoreErrorKind, StoreResult};
pub use memory::{InMemoryStore, CREDENTIALS_OPTION};
pub use retry::RetryPolicy;
pub use store::{
    BatchWriteOutcome, ConnectionOptions, RangeQuery, RangeStore, StoreConnector,
    DEFAULT_MAX_BATCH_SIZE,
};

pub use rangeseries_core::{EncodeOptions, EventItem, EventPayload, EventRecord, EventValue};
