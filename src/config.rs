//! Configuration types for the viewer core.
//!
//! All behaviour is controlled through [`ViewerConfig`], built via its
//! [`ViewerConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share configs across the pipeline, the layout engine, and tests, and to
//! diff two runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::ViewerError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the viewer core.
///
/// Built via [`ViewerConfig::builder()`] or using
/// [`ViewerConfig::default()`].
///
/// # Example
/// ```rust
/// use pageturn::ViewerConfig;
///
/// let config = ViewerConfig::builder()
///     .render_scale(2.0)
///     .resize_debounce_ms(150)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Oversampling scale applied when rasterising each page. Range: 0.5–8.0. Default: 2.5.
    ///
    /// Pages are rendered at `scale ×` their nominal point size so the turn
    /// animation can zoom and the bitmap stays sharp on high-DPI screens.
    /// 2.5 keeps body text crisp at typical viewer sizes; lower it for very
    /// large documents where memory matters more than sharpness.
    pub render_scale: f32,

    /// Maximum rendered bitmap dimension (width or height) in pixels. Default: 4096.
    ///
    /// A safety cap independent of scale. A 2.5× render of an A0 poster
    /// would produce a five-figure pixel edge and exhaust memory; this caps
    /// either dimension, scaling the other proportionally.
    pub max_bitmap_edge: u32,

    /// Encoding used for the produced page bitmaps. Default: PNG.
    ///
    /// PNG is lossless — page text stays crisp through the turn animation.
    /// JPEG trades crispness for roughly 5–10× smaller pages, which matters
    /// when the rendering surface keeps every page resident.
    pub page_image_format: PageImageFormat,

    /// Media types accepted by ingestion. Default: `["application/pdf"]`.
    ///
    /// Anything else is rejected with `InvalidFormat` before any decoding
    /// work starts.
    pub accepted_media_types: Vec<String>,

    /// Upload size ceiling in bytes. Default: 50 MB.
    ///
    /// Oversized documents are rejected up front rather than part-way
    /// through a long render.
    pub max_document_bytes: u64,

    /// Layout margins, legibility floor, and default spread mode.
    pub layout: LayoutConfig,

    /// Debounce window for ordinary surface resizes. Default: 100 ms.
    ///
    /// Drag-resizing a window emits dozens of events per second; only the
    /// final geometry matters.
    pub resize_debounce: Duration,

    /// Debounce window around sidebar open/close transitions. Default: 300 ms.
    ///
    /// The sidebar animates its width; recomputing layout mid-animation
    /// would visibly resize the page several times in flight. The window
    /// matches the animation duration so exactly one recomputation happens,
    /// at the settled geometry.
    pub sidebar_debounce: Duration,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs. Default: 120 s.
    pub download_timeout: Duration,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            render_scale: 2.5,
            max_bitmap_edge: 4096,
            page_image_format: PageImageFormat::default(),
            accepted_media_types: vec!["application/pdf".to_string()],
            max_document_bytes: 50 * 1024 * 1024,
            layout: LayoutConfig::default(),
            resize_debounce: Duration::from_millis(100),
            sidebar_debounce: Duration::from_millis(300),
            password: None,
            download_timeout: Duration::from_secs(120),
        }
    }
}

impl ViewerConfig {
    /// Create a new builder for `ViewerConfig`.
    pub fn builder() -> ViewerConfigBuilder {
        ViewerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Whether `media_type` is accepted by ingestion.
    ///
    /// Comparison ignores ASCII case and any parameters
    /// (`application/pdf; charset=binary` matches `application/pdf`).
    pub fn accepts_media_type(&self, media_type: &str) -> bool {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or(media_type)
            .trim();
        self.accepted_media_types
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(essence))
    }
}

/// Builder for [`ViewerConfig`].
#[derive(Debug)]
pub struct ViewerConfigBuilder {
    config: ViewerConfig,
}

impl ViewerConfigBuilder {
    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale.clamp(0.5, 8.0);
        self
    }

    pub fn max_bitmap_edge(mut self, px: u32) -> Self {
        self.config.max_bitmap_edge = px.max(256);
        self
    }

    pub fn page_image_format(mut self, format: PageImageFormat) -> Self {
        self.config.page_image_format = format;
        self
    }

    pub fn accepted_media_types(mut self, types: Vec<String>) -> Self {
        self.config.accepted_media_types = types;
        self
    }

    pub fn max_document_bytes(mut self, bytes: u64) -> Self {
        self.config.max_document_bytes = bytes;
        self
    }

    pub fn layout(mut self, layout: LayoutConfig) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn resize_debounce_ms(mut self, ms: u64) -> Self {
        self.config.resize_debounce = Duration::from_millis(ms);
        self
    }

    pub fn sidebar_debounce_ms(mut self, ms: u64) -> Self {
        self.config.sidebar_debounce = Duration::from_millis(ms);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout = Duration::from_secs(secs);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ViewerConfig, ViewerError> {
        let c = &self.config;
        if !(0.5..=8.0).contains(&c.render_scale) {
            return Err(ViewerError::InvalidConfig(format!(
                "render_scale must be 0.5–8.0, got {}",
                c.render_scale
            )));
        }
        if c.accepted_media_types.is_empty() {
            return Err(ViewerError::InvalidConfig(
                "accepted_media_types must not be empty".into(),
            ));
        }
        if c.max_document_bytes == 0 {
            return Err(ViewerError::InvalidConfig(
                "max_document_bytes must be ≥ 1".into(),
            ));
        }
        if let PageImageFormat::Jpeg { quality } = c.page_image_format {
            if quality == 0 || quality > 100 {
                return Err(ViewerError::InvalidConfig(format!(
                    "JPEG quality must be 1–100, got {quality}"
                )));
            }
        }
        c.layout.validate()?;
        Ok(self.config)
    }
}

// ── Enums & sub-configs ──────────────────────────────────────────────────

/// Encoding for produced page bitmaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageImageFormat {
    /// Lossless PNG. (default)
    Png,
    /// JPEG at the given quality (1–100).
    Jpeg { quality: u8 },
}

impl Default for PageImageFormat {
    fn default() -> Self {
        PageImageFormat::Png
    }
}

impl PageImageFormat {
    /// MIME type of the encoded bytes.
    pub fn mime_type(&self) -> &'static str {
        match self {
            PageImageFormat::Png => "image/png",
            PageImageFormat::Jpeg { .. } => "image/jpeg",
        }
    }
}

/// Whether the viewer displays one page or two side-by-side pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpreadMode {
    /// One page at a time. (default)
    #[default]
    Single,
    /// Two facing pages, book-style.
    Double,
}

/// Layout margins and minimum page size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Fixed margin subtracted from each surface dimension, in px. Default: 48.
    pub margin: f32,

    /// Legibility floor: pages never render narrower than this, in px. Default: 200.
    pub min_page_width: f32,

    /// Legibility floor: pages never render shorter than this, in px. Default: 280.
    pub min_page_height: f32,

    /// Spread mode used until the caller switches it. Default: Single.
    pub spread: SpreadMode,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: 48.0,
            min_page_width: 200.0,
            min_page_height: 280.0,
            spread: SpreadMode::Single,
        }
    }
}

impl LayoutConfig {
    fn validate(&self) -> Result<(), ViewerError> {
        if self.margin < 0.0 || !self.margin.is_finite() {
            return Err(ViewerError::InvalidConfig(format!(
                "layout margin must be a non-negative finite number, got {}",
                self.margin
            )));
        }
        if self.min_page_width <= 0.0 || self.min_page_height <= 0.0 {
            return Err(ViewerError::InvalidConfig(
                "minimum page dimensions must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build() {
        let config = ViewerConfig::builder().build().expect("defaults are valid");
        assert_eq!(config.render_scale, 2.5);
        assert_eq!(config.max_document_bytes, 50 * 1024 * 1024);
        assert_eq!(config.page_image_format, PageImageFormat::Png);
    }

    #[test]
    fn render_scale_is_clamped() {
        let config = ViewerConfig::builder().render_scale(100.0).build().unwrap();
        assert_eq!(config.render_scale, 8.0);
    }

    #[test]
    fn empty_media_types_rejected() {
        let err = ViewerConfig::builder()
            .accepted_media_types(vec![])
            .build()
            .unwrap_err();
        assert!(matches!(err, ViewerError::InvalidConfig(_)));
    }

    #[test]
    fn jpeg_quality_validated() {
        let err = ViewerConfig::builder()
            .page_image_format(PageImageFormat::Jpeg { quality: 0 })
            .build()
            .unwrap_err();
        assert!(matches!(err, ViewerError::InvalidConfig(_)));
    }

    #[test]
    fn media_type_match_ignores_case_and_params() {
        let config = ViewerConfig::default();
        assert!(config.accepts_media_type("application/pdf"));
        assert!(config.accepts_media_type("Application/PDF"));
        assert!(config.accepts_media_type("application/pdf; charset=binary"));
        assert!(!config.accepts_media_type("image/png"));
    }
}
