//! Error Types for RangeSeries Core
//!
//! This module defines the errors raised by the pure parts of the library: the
//! codec and the day chunker. Neither touches the network, so the taxonomy is
//! small.
//!
//! ## Error Categories
//!
//! ### Argument Errors
//! - `InvalidArgument`: Empty chunk input, timestamp outside the calendar range
//!
//! ### Codec Errors
//! - `CodecError::Serialization`: JSON encoding/decoding of a payload body failed
//! - `CodecError::Decompression`: LZ4 data is truncated or corrupt
//! - `CodecError::InvalidRecord`: Record shape violates an invariant
//!   (e.g. outer and payload timestamps disagree)
//!
//! ## Usage
//! All fallible functions in this crate return `Result<T>` which is aliased to
//! `Result<T, Error>`, so `?` works across codec and chunker calls.
//!
//! ```ignore
//! use rangeseries_core::{codec, Error};
//!
//! match codec::decode(&record) {
//!     Ok(decoded) => println!("{} at {}", decoded.type_tag, decoded.timestamp),
//!     Err(Error::Codec(e)) => eprintln!("corrupt record: {}", e),
//!     Err(e) => return Err(e),
//! }
//! ```

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Failure while turning an event into a stored record or back.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("decompression failed: {0}")]
    Decompression(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Codec(CodecError::Serialization(e))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
