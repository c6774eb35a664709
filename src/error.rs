//! Error types for guide decoding.

use thiserror::Error;

use crate::epg::TimestampError;

/// Errors that can occur while decoding a guide document.
///
/// Every error is terminal for the decode call that produced it; there is
/// no partially decoded guide to recover.
#[derive(Error, Debug)]
pub enum Error {
    /// The tokenizer rejected the input. Stream read failures, invalid
    /// UTF-8 and unknown entities all surface here.
    #[error("malformed XML at byte {position}: {source}")]
    MalformedXml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// A `start` or `stop` attribute is not a `YYYYMMDDhhmmss` timestamp.
    #[error("invalid `{attribute}` attribute: {source}")]
    TimestampFormat {
        attribute: &'static str,
        #[source]
        source: TimestampError,
    },

    /// Markup is well-formed but does not fit the modeled element type.
    #[error("unexpected content in <{element}> at byte {position}: {reason}")]
    SchemaMismatch {
        element: String,
        position: u64,
        reason: String,
    },
}

impl Error {
    pub fn is_malformed_xml(&self) -> bool {
        matches!(self, Error::MalformedXml { .. })
    }

    pub fn is_timestamp_format(&self) -> bool {
        matches!(self, Error::TimestampFormat { .. })
    }

    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, Error::SchemaMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
