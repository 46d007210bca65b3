//! Error types for RangeSeries client operations.
//!
//! Every public operation either returns a well-formed result or fails with
//! one of the variants below. Nothing is reported as an ambiguous empty value:
//! "no latest event" is `Ok(None)`, never an error.
//!
//! ## Error Handling Strategy
//!
//! - **Caller errors**: `InvalidArgument`, `ConfigError` (raised before any
//!   request reaches the store, so they never leave partial side effects)
//! - **Read errors**: `Codec` (a stored record could not be decoded; the whole
//!   query fails rather than skipping the record)
//! - **Bulk write errors**: `PartialWrite` (retry budget exhausted; carries
//!   what was written and what was not)
//! - **Store errors**: `Store` (passed through with the store's own
//!   classification so throttling, bad credentials and missing tables can be
//!   told apart)
//!
//! ## Examples
//!
//! ```ignore
//! use rangeseries_client::{ClientError, StoreErrorKind};
//!
//! match client.put_chunked("user-1", "steps", events).await {
//!     Ok(written) => println!("wrote {} records", written),
//!     Err(ClientError::PartialWrite { written, unwritten, .. }) => {
//!         eprintln!("{} written, {} to retry later", written, unwritten.len());
//!     }
//!     Err(ClientError::Store(e)) if e.kind() == StoreErrorKind::Credentials => {
//!         eprintln!("check credentials: {}", e);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use rangeseries_core::{CodecError, EventRecord};
use std::fmt;
use thiserror::Error;

/// Convenience type alias for `Result<T, ClientError>`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Result type returned by [`crate::RangeStore`] implementations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Comprehensive error type for RangeSeries client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A required parameter is missing, empty or out of range.
    ///
    /// ## Causes
    /// - Empty subject id or type tag
    /// - Zero timestamp
    /// - `start > end` on a range query
    /// - Empty input to chunked ingestion
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A record could not be encoded or decoded.
    ///
    /// On reads this means a stored record is corrupt (bad LZ4 block, JSON
    /// that does not match the payload shape, or inconsistent timestamps).
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// A bulk write ran out of retries with records still unwritten.
    ///
    /// `written` records are durable. `unwritten` holds every record that was
    /// rejected on the last attempt plus every record never submitted, so the
    /// caller can resubmit exactly that list. Records are idempotent by key.
    #[error("Partial write: {written} records written, {} unwritten", .unwritten.len())]
    PartialWrite {
        written: usize,
        unwritten: Vec<EventRecord>,
        #[source]
        source: Option<StoreError>,
    },

    /// The store rejected a request.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid client configuration.
    ///
    /// ## Causes
    /// - Missing `tableName`
    /// - No store handle or connector given to the builder
    /// - Zero batch size
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<rangeseries_core::Error> for ClientError {
    fn from(e: rangeseries_core::Error) -> Self {
        match e {
            rangeseries_core::Error::InvalidArgument(msg) => ClientError::InvalidArgument(msg),
            rangeseries_core::Error::Codec(e) => ClientError::Codec(e),
        }
    }
}

/// Classification of a store failure, preserved as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// Request rate or capacity exceeded
    Throttled,
    /// Missing or invalid credentials
    Credentials,
    /// Credentials valid but not allowed
    AccessDenied,
    /// Table does not exist
    ResourceNotFound,
    /// Store temporarily unreachable
    Unavailable,
    /// Request rejected as malformed (item too large, batch too big)
    Validation,
    Other,
}

impl StoreErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreErrorKind::Throttled => "throttled",
            StoreErrorKind::Credentials => "credentials",
            StoreErrorKind::AccessDenied => "access denied",
            StoreErrorKind::ResourceNotFound => "resource not found",
            StoreErrorKind::Unavailable => "unavailable",
            StoreErrorKind::Validation => "validation",
            StoreErrorKind::Other => "other",
        }
    }
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque store failure.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct StoreError {
    kind: StoreErrorKind,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying client error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> StoreErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
