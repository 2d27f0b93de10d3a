//! The layout calculator: a pure function from viewing-surface geometry to
//! on-screen page dimensions.
//!
//! Height-first maximisation: a book reads best when pages are as tall as
//! the surface allows, so the height is fixed first and the width follows
//! from the aspect ratio. Only when a double-page spread would overflow the
//! surface horizontally does the computation flip around and derive from
//! width instead.
//!
//! Everything here is deterministic and side-effect free; the debounced
//! engine in [`crate::resize`] decides *when* to call it.

use crate::config::{LayoutConfig, SpreadMode};
use serde::{Deserialize, Serialize};

/// The observed size of the viewing surface, in device-independent pixels.
///
/// Sampled from the environment on every recomputation; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutSurface {
    pub width: f32,
    pub height: f32,
}

impl LayoutSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// The display size of one page, derived from the surface.
///
/// Whole pixels (floored), so a page never exceeds the space it was fitted
/// to. Recomputed on demand, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageDimensions {
    pub width: f32,
    pub height: f32,
}

/// Compute page display dimensions for a surface.
///
/// `aspect_ratio` is `page width / page height` and must be a positive
/// finite number — anything else indicates a configuration bug upstream and
/// panics rather than producing a garbage layout.
///
/// Algorithm:
/// 1. Subtract the configured margin from each surface dimension.
/// 2. Tentatively fill the available height; derive width from the ratio.
/// 3. In [`SpreadMode::Double`], if two pages overflow the available width,
///    derive from width instead (`width = available / 2`).
/// 4. Scale up uniformly to the legibility floor, preserving the ratio.
/// 5. Floor both dimensions to whole pixels.
///
/// A degenerate surface (nothing left after margins) yields the
/// ratio-preserved minimum dimensions — never zero or negative.
pub fn compute_dimensions(
    surface: LayoutSurface,
    aspect_ratio: f32,
    spread: SpreadMode,
    config: &LayoutConfig,
) -> PageDimensions {
    assert!(
        aspect_ratio.is_finite() && aspect_ratio > 0.0,
        "page aspect ratio must be a positive finite number, got {aspect_ratio}"
    );

    let avail_width = surface.width - 2.0 * config.margin;
    let avail_height = surface.height - 2.0 * config.margin;

    if avail_width <= 0.0 || avail_height <= 0.0 {
        return clamp_to_minimum(0.0, 0.0, aspect_ratio, config);
    }

    let mut height = avail_height;
    let mut width = height * aspect_ratio;

    let fitted_width = match spread {
        SpreadMode::Single => avail_width,
        SpreadMode::Double => avail_width / 2.0,
    };
    if width > fitted_width {
        width = fitted_width;
        height = width / aspect_ratio;
    }

    clamp_to_minimum(width, height, aspect_ratio, config)
}

/// Scale `width`×`height` up to the legibility floor with one uniform
/// factor, then floor to whole pixels.
///
/// A single factor keeps the aspect ratio exact and satisfies both minimums
/// at once; clamping each axis independently would distort the page.
fn clamp_to_minimum(
    width: f32,
    height: f32,
    aspect_ratio: f32,
    config: &LayoutConfig,
) -> PageDimensions {
    // Re-derive a consistent pair first so a degenerate input (0×0) still
    // lands on the ratio.
    let (mut width, mut height) = if width <= 0.0 || height <= 0.0 {
        (config.min_page_width, config.min_page_width / aspect_ratio)
    } else {
        (width, height)
    };

    let scale = (config.min_page_width / width)
        .max(config.min_page_height / height)
        .max(1.0);
    width *= scale;
    height *= scale;

    PageDimensions {
        width: width.floor(),
        height: height.floor(),
    }
}
