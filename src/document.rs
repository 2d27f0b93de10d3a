//! Core data model: source documents, page bitmaps, and the published
//! page-list snapshot.
//!
//! ## Why immutable snapshots?
//!
//! The page list is replaced wholesale, never mutated in place. Readers hold
//! an `Arc<DocumentPages>` and always see a complete, consistent document;
//! the ingestion pipeline swaps in a new `Arc` in one step only after every
//! page has rendered. The `version` field makes the swap observable, so a
//! consumer can cheaply tell "same book" from "new book with the same page
//! count".

use crate::config::PageImageFormat;
use crate::error::ViewerError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// An uploaded document awaiting ingestion: opaque bytes plus the media type
/// the uploader declared.
///
/// Ephemeral — consumed by [`crate::ingest::IngestPipeline::ingest`] and
/// discarded after decoding (or on error/replacement).
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Raw document bytes.
    pub bytes: Vec<u8>,
    /// Declared media type, e.g. `application/pdf`.
    pub media_type: String,
}

impl SourceDocument {
    /// Wrap in-memory bytes with their declared media type.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, media_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
        }
    }

    /// First four bytes, zero-padded — used for magic-number diagnostics.
    pub(crate) fn magic(&self) -> [u8; 4] {
        let mut magic = [0u8; 4];
        for (slot, byte) in magic.iter_mut().zip(self.bytes.iter()) {
            *slot = *byte;
        }
        magic
    }
}

/// One rasterised page at the pipeline's fixed oversampling scale.
///
/// `width`/`height` are the *native* render dimensions, not the on-screen
/// display size — the layout engine derives display dimensions separately.
/// Immutable once produced; owned exclusively by the [`DocumentPages`] that
/// contains it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageBitmap {
    /// 0-based page index; contiguous and gap-free within a document.
    pub index: usize,
    /// Encoded raster data (PNG or JPEG per the pipeline config).
    pub image: Vec<u8>,
    /// Native render width in pixels.
    pub width: f32,
    /// Native render height in pixels.
    pub height: f32,
    /// Encoding of `image`.
    pub format: PageImageFormat,
}

impl PageBitmap {
    /// `width / height` of this page.
    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }

    /// Render the encoded image as a base64 data URI.
    ///
    /// Rendering surfaces that take image sources by URL (the common case
    /// for page-turn engines) can consume pages without any intermediate
    /// file.
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            STANDARD.encode(&self.image)
        )
    }
}

/// The ordered, fully rendered page list of one document.
///
/// Lifecycle: empty at start; populated atomically only when every page has
/// rendered; replaced wholesale by a new upload; cleared on reset or on any
/// page failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentPages {
    pages: Vec<PageBitmap>,
    version: u64,
}

impl DocumentPages {
    /// The empty snapshot published before any document has been ingested.
    pub fn empty() -> Self {
        Self {
            pages: Vec::new(),
            version: 0,
        }
    }

    /// Build a snapshot from fully rendered pages.
    ///
    /// Callers must pass pages in index order with no gaps; the ingestion
    /// pipeline is the only production caller and produces them that way.
    pub(crate) fn new(pages: Vec<PageBitmap>, version: u64) -> Self {
        debug_assert!(
            pages.iter().enumerate().all(|(i, p)| p.index == i),
            "page indices must be contiguous from 0"
        );
        Self { pages, version }
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the snapshot holds no document.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Monotonically increasing snapshot version; bumped on every publish.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Page at `index`, or [`ViewerError::OutOfRange`].
    pub fn get(&self, index: usize) -> Result<&PageBitmap, ViewerError> {
        self.pages.get(index).ok_or(ViewerError::OutOfRange {
            index,
            total: self.pages.len(),
        })
    }

    /// All pages in index order.
    pub fn iter(&self) -> impl Iterator<Item = &PageBitmap> {
        self.pages.iter()
    }

    /// Mean `width / height` across all pages.
    ///
    /// Real documents occasionally mix page sizes (a landscape foldout in a
    /// portrait book); the flip engine wants one consistent aspect ratio,
    /// and the average of the native dimensions is what the surface is
    /// configured with. Returns `None` for an empty snapshot.
    pub fn mean_aspect_ratio(&self) -> Option<f32> {
        if self.pages.is_empty() {
            return None;
        }
        let n = self.pages.len() as f32;
        let avg_width: f32 = self.pages.iter().map(|p| p.width).sum::<f32>() / n;
        let avg_height: f32 = self.pages.iter().map(|p| p.height).sum::<f32>() / n;
        Some(avg_width / avg_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitmap(index: usize, width: f32, height: f32) -> PageBitmap {
        PageBitmap {
            index,
            image: vec![0u8; 8],
            width,
            height,
            format: PageImageFormat::Png,
        }
    }

    #[test]
    fn empty_snapshot() {
        let pages = DocumentPages::empty();
        assert!(pages.is_empty());
        assert_eq!(pages.len(), 0);
        assert_eq!(pages.version(), 0);
        assert!(pages.mean_aspect_ratio().is_none());
    }

    #[test]
    fn get_out_of_range() {
        let pages = DocumentPages::new(vec![bitmap(0, 100.0, 200.0)], 1);
        assert!(pages.get(0).is_ok());
        let err = pages.get(1).unwrap_err();
        assert!(matches!(err, ViewerError::OutOfRange { index: 1, total: 1 }));
    }

    #[test]
    fn mean_aspect_ratio_averages_dimensions() {
        let pages = DocumentPages::new(
            vec![bitmap(0, 100.0, 200.0), bitmap(1, 300.0, 200.0)],
            1,
        );
        // avg width 200, avg height 200
        let ratio = pages.mean_aspect_ratio().unwrap();
        assert!((ratio - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn data_uri_has_mime_and_base64_payload() {
        let page = bitmap(0, 10.0, 10.0);
        let uri = page.to_data_uri();
        assert!(uri.starts_with("data:image/png;base64,"));
        let payload = uri.split(',').nth(1).unwrap();
        assert_eq!(STANDARD.decode(payload).unwrap(), vec![0u8; 8]);
    }

    #[test]
    fn magic_pads_short_input() {
        let doc = SourceDocument::from_bytes(vec![b'%', b'P'], "application/pdf");
        assert_eq!(doc.magic(), [b'%', b'P', 0, 0]);
    }
}
