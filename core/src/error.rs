//! Core error types for hoap.
//!
//! Every fatal condition aborts the whole parse: there is no partial result on
//! error. A token whose closing tag never arrived is *not* an error; it is
//! reported through [`Position::is_resolved`](crate::Position::is_resolved)
//! unless [`ParseConfig::strict`](crate::ParseConfig::strict) is set.

use thiserror::Error;

/// Boxed error produced by a byte source.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core hoap error type.
#[derive(Error, Debug)]
pub enum Error {
    /// The watched-tag configuration cannot be compiled.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong with the configuration.
        reason: String,
    },

    /// The watched-tag JSON document could not be decoded.
    #[error("malformed configuration document: {0}")]
    ConfigFormat(String),

    /// A token was found before any token of its parent path had opened.
    ///
    /// The input does not match the declared grammar: a watched tag appeared
    /// before any occurrence of its declared parent.
    #[error("node parent not found for path: {path}")]
    NodeParentNotFound {
        /// Path key of the missing parent.
        path: String,
    },

    /// Strict mode: no parent candidate was open or contained the token.
    #[error("no enclosing parent for `{path}` opened at byte {open}")]
    OrphanToken {
        /// Path key of the orphaned token.
        path: String,
        /// Absolute offset of its opening tag.
        open: i64,
    },

    /// Strict mode: a closing tag was found with no pending opening tag.
    #[error("unexpected closing tag for `{path}` at byte {close}")]
    UnexpectedClose {
        /// Path key of the closing tag.
        path: String,
        /// Absolute offset one past the closing tag.
        close: i64,
    },

    /// Strict mode: the stream ended while a watched tag was still open.
    #[error("unclosed tag `{path}` opened at byte {open}")]
    UnclosedTag {
        /// Path key of the unclosed token.
        path: String,
        /// Absolute offset of its opening tag.
        open: i64,
    },

    /// The bytes retained across chunks exceeded the configured maximum.
    #[error("retained leftover of {retained} bytes exceeds maximum {max}")]
    LeftoverOverflow {
        /// Bytes that would have been retained.
        retained: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The byte source reported an error.
    #[error(transparent)]
    Source(BoxError),

    /// The configured timeout elapsed before the stream ended.
    #[error("timeout waiting for the byte stream to end")]
    Timeout,
}

impl Error {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Wrap an error raised by the byte source.
    pub fn from_source(err: impl Into<BoxError>) -> Self {
        Self::Source(err.into())
    }

    /// Returns true for errors raised by the byte source rather than the parser.
    pub fn is_source(&self) -> bool {
        matches!(self, Self::Source(_) | Self::Timeout)
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigFormat(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Source(Box::new(err))
    }
}

/// Result alias used throughout hoap.
pub type Result<T, E = Error> = core::result::Result<T, E>;
