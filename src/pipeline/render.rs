//! Page rasterisation: walk a document's pages sequentially and emit one
//! bitmap at a time.
//!
//! ## Why spawn_blocking + a channel?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. The decoder therefore runs inside
//! `tokio::task::spawn_blocking`, and hands each finished page back through
//! a bounded channel. The channel's capacity of one is what makes the
//! pipeline page-sequential: page *i+1* does not begin rendering until the
//! async side has received page *i*. Memory stays bounded at one in-flight
//! page, and every hand-off is a suspension point where cancellation is
//! observed.
//!
//! ## Why a trait?
//!
//! [`DocumentDecoder`] is the seam between the pipeline and the decoding
//! capability. Production uses [`PdfiumDecoder`]; tests substitute a fake
//! that fabricates pages, injects failures at a chosen index, or stalls to
//! exercise cancellation — no pdfium required.

use crate::config::{PageImageFormat, ViewerConfig};
use crate::document::PageBitmap;
use crate::error::ViewerError;
use crate::pipeline::encode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Cooperative cancellation flag shared between an ingestion run and its
/// blocking decode task.
///
/// Cancellation is checked between pages, never mid-page: an in-flight
/// raster is allowed to finish, but its result is discarded by the receiver.
#[derive(Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel this token. Idempotent; observed by all clones.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// One step of a decode run, emitted through the page channel.
#[derive(Debug)]
pub enum DecodeEvent {
    /// The document opened successfully; `page_count` pages will follow.
    Opened { page_count: usize },
    /// One fully rendered page, in index order.
    Page(PageBitmap),
}

/// The decoder's handle for emitting pages to the async side of the
/// pipeline.
///
/// `emit` blocks until the receiver has consumed the previous page, which
/// enforces the one-in-flight-page memory bound. It fails with
/// [`ViewerError::Cancelled`] when the run has been superseded, so a decoder
/// can simply propagate the error to stop early.
pub struct PageSink {
    tx: mpsc::Sender<DecodeEvent>,
    cancel: CancelToken,
}

impl PageSink {
    pub(crate) fn new(tx: mpsc::Sender<DecodeEvent>, cancel: CancelToken) -> Self {
        Self { tx, cancel }
    }

    /// Whether the run has been cancelled. Decoders check this between
    /// pages.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Emit a decode event, blocking until the receiver is ready.
    pub fn emit(&self, event: DecodeEvent) -> Result<(), ViewerError> {
        if self.cancel.is_cancelled() {
            return Err(ViewerError::Cancelled);
        }
        self.tx
            .blocking_send(event)
            .map_err(|_| ViewerError::Cancelled)
    }
}

/// Options the renderer needs from the viewer config.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Oversampling scale applied to each page's nominal size.
    pub scale: f32,
    /// Cap on either rendered dimension.
    pub max_bitmap_edge: u32,
    /// Bitmap encoding for emitted pages.
    pub format: PageImageFormat,
    /// Password for encrypted documents.
    pub password: Option<String>,
}

impl RenderOptions {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            scale: config.render_scale,
            max_bitmap_edge: config.max_bitmap_edge,
            format: config.page_image_format,
            password: config.password.clone(),
        }
    }
}

/// The document-decoding capability.
///
/// Implementations run on a blocking thread, open `bytes` as a paginated
/// document, and emit `Opened { page_count }` followed by every page in
/// index order through `sink`. Returning an error aborts the run; the
/// pipeline maps it to the whole-document failure policy.
pub trait DocumentDecoder: Send + Sync + 'static {
    fn decode(
        &self,
        bytes: &[u8],
        options: &RenderOptions,
        sink: &PageSink,
    ) -> Result<(), ViewerError>;
}

/// Production decoder backed by pdfium.
#[derive(Debug, Default)]
pub struct PdfiumDecoder;

impl PdfiumDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentDecoder for PdfiumDecoder {
    fn decode(
        &self,
        bytes: &[u8],
        options: &RenderOptions,
        sink: &PageSink,
    ) -> Result<(), ViewerError> {
        use pdfium_render::prelude::*;

        // Try an explicitly configured library directory, then the current
        // directory, then the system search path.
        let bindings = match std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
            Ok(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
                .or_else(|_| Pdfium::bind_to_system_library()),
            Err(_) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| ViewerError::DecoderUnavailable(format!("{e:?}")))?;
        let pdfium = Pdfium::new(bindings);

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, options.password.as_deref())
            .map_err(|e| ViewerError::CorruptDocument {
                detail: format!("{e:?}"),
            })?;

        let pages = document.pages();
        let page_count = pages.len() as usize;
        debug!("Document opened: {} pages", page_count);
        sink.emit(DecodeEvent::Opened { page_count })?;

        for index in 0..page_count {
            if sink.is_cancelled() {
                return Err(ViewerError::Cancelled);
            }

            let page = pages
                .get(index as u16)
                .map_err(|e| ViewerError::PageRenderFailed {
                    index,
                    cause: format!("{e:?}"),
                })?;

            // Oversample the page's nominal point size, capped so one huge
            // page cannot exhaust memory.
            let target_width = (page.width().value * options.scale)
                .round()
                .min(options.max_bitmap_edge as f32) as i32;
            let render_config = PdfRenderConfig::new()
                .set_target_width(target_width)
                .set_maximum_height(options.max_bitmap_edge as i32);

            let bitmap =
                page.render_with_config(&render_config)
                    .map_err(|e| ViewerError::PageRenderFailed {
                        index,
                        cause: format!("{e:?}"),
                    })?;

            let image = bitmap.as_image();
            let (width, height) = (image.width() as f32, image.height() as f32);
            let encoded = encode::encode_page(&image, options.format).map_err(|e| {
                ViewerError::PageRenderFailed {
                    index,
                    cause: format!("image encoding failed: {e}"),
                }
            })?;

            debug!("Rendered page {} → {}x{} px", index, width, height);
            sink.emit(DecodeEvent::Page(PageBitmap {
                index,
                image: encoded,
                width,
                height,
                format: options.format,
            }))?;
        }

        Ok(())
    }
}
