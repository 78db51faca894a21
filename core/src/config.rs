//! Parser configuration for resource limits and behavior tuning.
//!
//! This module provides [`ParseConfig`] for controlling how strictly the
//! parser treats input that does not match the declared grammar, and how much
//! memory and time a single parse may use.
//!
//! # Example
//!
//! ```ignore
//! use hoap_core::config::ParseConfig;
//! use std::time::Duration;
//!
//! // Best-effort extraction, no limits
//! let config = ParseConfig::default();
//!
//! // Reject malformed input and bound the retained tail
//! let config = ParseConfig::new()
//!     .strict()
//!     .with_max_leftover_bytes(1 << 20)
//!     .with_timeout(Duration::from_secs(30));
//! ```

use core::time::Duration;

/// Configuration for parser behavior and resource limits.
///
/// # Default Values
///
/// | Setting | Default | Rationale |
/// |---------|---------|-----------|
/// | `strict` | `false` | Truncated responses are still inspectable |
/// | `max_leftover_bytes` | `usize::MAX` | No limit by default |
/// | `timeout` | `None` | Transport owns its own deadlines |
/// | `read_buffer_size` | 8 KiB | Typical socket read size |
///
/// # Strict Mode
///
/// In lenient mode a token with no enclosing parent is dropped, a closing tag
/// with no pending opening tag is ignored, and tokens left open at the end of
/// the stream keep `close == -1`. Strict mode turns each of these into an
/// error.
///
/// # Leftover Limit
///
/// A leaf tag whose closing tag has not arrived pins every byte from its
/// opening tag onwards. A response that opens a leaf and never closes it would
/// otherwise be buffered in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    /// Reject input that does not match the declared grammar.
    ///
    /// Default: `false`
    pub strict: bool,

    /// Maximum number of bytes retained between chunks.
    ///
    /// Default: `usize::MAX` (no limit)
    pub max_leftover_bytes: usize,

    /// Overall deadline for the async drivers.
    ///
    /// Default: `None`
    pub timeout: Option<Duration>,

    /// Chunk size used when reading from an `AsyncRead` source.
    ///
    /// Default: 8192
    pub read_buffer_size: usize,
}

impl Default for ParseConfig {
    /// Returns the default configuration.
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl ParseConfig {
    /// Default configuration, usable in const contexts.
    pub const DEFAULT: Self = Self {
        strict: false,
        max_leftover_bytes: usize::MAX,
        timeout: None,
        read_buffer_size: 8 * 1024,
    };

    /// Creates a new configuration with default values.
    #[inline]
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    /// Enables strict mode.
    #[inline]
    pub const fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Sets strict mode explicitly.
    #[inline]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets the maximum number of bytes retained between chunks.
    ///
    /// # Arguments
    ///
    /// * `max` - Byte limit. Use `usize::MAX` to disable.
    #[inline]
    pub const fn with_max_leftover_bytes(mut self, max: usize) -> Self {
        self.max_leftover_bytes = max;
        self
    }

    /// Sets the overall deadline for the async drivers.
    #[inline]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the chunk size used for `AsyncRead` sources.
    ///
    /// A size of zero is bumped to one byte.
    #[inline]
    pub const fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = if size == 0 { 1 } else { size };
        self
    }
}
