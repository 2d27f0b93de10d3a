//! Pipeline stages for document ingestion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different decoding backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode
//! (bytes/path/URL)  (pdfium, page by page)  (PNG/JPEG bitmap)
//! ```
//!
//! 1. [`input`]  — acquire and validate the user-supplied bytes, path, or
//!    URL; the media-type gate lives here and rejects before any decoding
//! 2. [`render`] — rasterise pages sequentially; runs in `spawn_blocking`
//!    because pdfium is not async-safe, emitting one page at a time
//! 3. [`encode`] — encode each raster into the configured bitmap format

pub mod encode;
pub mod input;
pub mod render;
