//! RangeSeries Core - record model, codec and day chunking
//!
//! This crate holds the parts of RangeSeries that never talk to a store:
//!
//! - [`record`]: subject keys, event values and the persisted record shape
//! - [`codec`]: encode/decode with optional LZ4 compression, and flattening
//! - [`chunk`]: grouping an ordered event sequence into UTC-day chunks
//!
//! The store-facing client lives in `rangeseries-client`.

pub mod chunk;
pub mod codec;
pub mod error;
pub mod record;

pub use chunk::{chunk_by_day, utc_day, Chunk};
pub use codec::{decode, encode, flatten, normalize, DecodedPayload, EncodeOptions, EventBody};
pub use error::{CodecError, Error, Result};
pub use record::{
    EventItem, EventPayload, EventRecord, EventValue, PayloadBody, RecordKey, RecordPayload,
    SubjectKey,
};
