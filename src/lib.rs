//! # pageturn
//!
//! The core of an interactive flipbook viewer for PDF documents.
//!
//! ## Why this crate?
//!
//! Turning a PDF into a book you can leaf through needs three pieces of real
//! machinery: decoding the document into page bitmaps without ever showing a
//! half-rendered book, fitting those pages to whatever screen space is
//! available without thrashing during resizes, and tracking where the reader
//! is while an animation engine confirms page turns asynchronously. This
//! crate implements those three — ingestion, layout, navigation — and leaves
//! the visual chrome and the fold animation itself to the host.
//!
//! ## Architecture
//!
//! ```text
//! bytes / path / URL
//!  │
//!  ├─ 1. Input    validate media type, size, magic bytes
//!  ├─ 2. Render   rasterise pages sequentially via pdfium (spawn_blocking)
//!  ├─ 3. Encode   bitmap → PNG/JPEG
//!  └─ 4. Publish  atomic swap of the complete page list
//!
//! surface events ─▶ debounce ─▶ layout calculator ─▶ page dimensions
//! commands ─▶ navigator ─▶ turn animator (external) ─▶ confirmations
//! ```
//!
//! Every published value (page list, progress, dimensions, navigation
//! state) is a `tokio::sync::watch` channel: one writer, any number of
//! readers, snapshot via `borrow()`, subscription via `changed()`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pageturn::{IngestPipeline, SourceDocument, ViewerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = IngestPipeline::with_pdfium(ViewerConfig::default());
//!     let bytes = std::fs::read("book.pdf")?;
//!     let pages = pipeline
//!         .ingest(SourceDocument::from_bytes(bytes, "application/pdf"))
//!         .await?;
//!     println!("{} pages rendered", pages.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pageturn` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pageturn = { version = "0.4", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod ingest;
pub mod layout;
pub mod navigation;
pub mod pipeline;
pub mod progress;
pub mod resize;
pub mod viewer;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{LayoutConfig, PageImageFormat, SpreadMode, ViewerConfig, ViewerConfigBuilder};
pub use document::{DocumentPages, PageBitmap, SourceDocument};
pub use error::ViewerError;
pub use ingest::IngestPipeline;
pub use layout::{compute_dimensions, LayoutSurface, PageDimensions};
pub use navigation::{FlipEvent, FlipPhase, NavigationState, Navigator, TurnAnimator};
pub use pipeline::render::{
    CancelToken, DecodeEvent, DocumentDecoder, PageSink, PdfiumDecoder, RenderOptions,
};
pub use progress::{progress_stream, IngestProgress};
pub use resize::{ResponsiveLayout, SurfaceChange};
pub use viewer::Viewer;
