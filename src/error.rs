//! Error types for the pageturn library.
//!
//! One taxonomy, two propagation styles:
//!
//! * Ingestion errors are recovered locally by the pipeline — it aborts the
//!   run, discards partial bitmaps, and keeps the previously published page
//!   list — then surfaces a single terminal [`ViewerError`] to the caller
//!   plus a reset progress snapshot.
//!
//! * Navigation never errors. Out-of-range page requests are ordinary UI
//!   states ("already on the last page") and are clamped to no-ops.
//!   [`ViewerError::OutOfRange`] exists as a named, handled case for the
//!   defensive paths that should be unreachable given that clamping.
//!
//! An invalid page aspect ratio is deliberately *not* here: it indicates a
//! configuration bug, not user input, and the layout calculator panics on it
//! (see [`crate::layout::compute_dimensions`]).

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pageturn library.
#[derive(Debug, Error)]
pub enum ViewerError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The declared media type is not an accepted document format.
    ///
    /// Rejected before any decoding work starts.
    #[error("Unsupported media type '{media_type}'\nOnly PDF documents (application/pdf) can be viewed.")]
    InvalidFormat { media_type: String },

    /// The bytes do not start with the PDF magic number.
    #[error("Data is not a valid PDF document\nFirst bytes: {magic:?}")]
    NotAPdf { magic: [u8; 4] },

    /// The document exceeds the configured size ceiling.
    #[error("Document is {size} bytes, which exceeds the {limit}-byte limit\nRaise max_document_bytes if this is intentional.")]
    DocumentTooLarge { size: u64, limit: u64 },

    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease download_timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Decode errors ─────────────────────────────────────────────────────
    /// The underlying decoding capability could not be initialised
    /// (e.g. the pdfium shared library is missing).
    #[error(
        "Page decoder is unavailable: {0}\n\n\
Set PDFIUM_DYNAMIC_LIB_PATH to the directory containing libpdfium, or\n\
install pdfium system-wide so it can be found on the library search path."
    )]
    DecoderUnavailable(String),

    /// The document as a whole could not be parsed.
    #[error("Document is corrupt and cannot be opened: {detail}")]
    CorruptDocument { detail: String },

    /// One page's raster step failed.
    ///
    /// Per the whole-document failure policy, the entire ingestion run is
    /// aborted and every bitmap it produced is discarded; the previously
    /// published page list stays active.
    #[error("Rendering failed on page {index}: {cause}")]
    PageRenderFailed { index: usize, cause: String },

    /// The ingestion run was superseded by a newer `ingest()` or `reset()`.
    #[error("Ingestion was cancelled by a newer request")]
    Cancelled,

    // ── Defensive errors ──────────────────────────────────────────────────
    /// A page index outside `0..total` reached a bounds-checked interface.
    ///
    /// Navigation commands clamp, so this should be unreachable from the
    /// public command surface; it is kept as a named case rather than a
    /// silent panic for the paths that receive indices from outside
    /// (e.g. the turn-animation capability's callbacks).
    #[error("Page index {index} is out of range (document has {total} pages)")]
    OutOfRange { index: usize, total: usize },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ViewerError {
    /// A one-line message suitable for the viewer's failure banner.
    ///
    /// The full `Display` text includes remediation hints spanning several
    /// lines; UI consumers generally want only the first.
    pub fn user_message(&self) -> String {
        self.to_string().lines().next().unwrap_or_default().to_string()
    }
}
