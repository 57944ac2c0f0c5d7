//! Shared error vocabulary for the mosaic render core.
//!
//! Every crate in the workspace that can fail at a cache-loader boundary
//! (segment decode, byte fetch, decompression, bias/histogram computation)
//! returns [`Error`]. The Render Controller aggregates failures at its two
//! join points; `Io` surfaces as-is, everything else becomes the caller's
//! problem via the generic render failure described in `spec.md` §7.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while decoding, fetching, or rendering a focal-plane
/// segment.
#[derive(Debug, Error, Clone)]
pub enum Error {
    /// A byte-range fetch failed in a way that is not worth retrying
    /// (file not found, permission denied, malformed URL).
    #[error("I/O error: {0}")]
    Io(String),

    /// A byte-range fetch failed transiently (connection reset, timed-out
    /// range GET). The core does not retry automatically; callers may
    /// re-request the same key once the failed entry has been discarded.
    #[error("transient I/O error: {0}")]
    TransientIo(String),

    /// A `SegmentDescriptor` string could not be parsed under either
    /// recognized dialect.
    #[error("malformed segment descriptor: {0}")]
    MalformedDescriptor(String),

    /// A required FITS header keyword was absent.
    #[error("missing header keyword: {0}")]
    MissingHeader(String),

    /// `DATASEC` was present but not parseable as `[x1:x2,y1:y2]`, or
    /// violated `1 <= x1 <= x2` / `1 <= y1 <= y2`.
    #[error("malformed DATASEC: {0}")]
    MalformedDatasec(String),

    /// `ZCMPTYPE` named a tile compression other than `RICE_1`/`GZIP_2`.
    #[error("unsupported compression: {0}")]
    UnsupportedCompression(String),

    /// A bias-correction or colormap name did not match a known registry
    /// entry.
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    /// The descriptor was well-formed but names functionality this core
    /// does not implement (the DAQ dialect).
    #[error("unsupported descriptor dialect: {0}")]
    Unsupported(String),

    /// Decompressor corruption or an arithmetic invariant was violated.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl Error {
    /// `true` for errors a caller may productively retry (after the failed
    /// cache entry has been discarded).
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::TransientIo(_))
    }
}
