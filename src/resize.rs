//! The responsive layout engine: observes viewing-surface changes, debounces
//! them, and publishes freshly computed page dimensions.
//!
//! ## Debounce semantics
//!
//! Surface events arrive in bursts — a window drag emits dozens per second,
//! and the sidebar animates its width over hundreds of milliseconds.
//! Recomputation is therefore deferred: each observation cancels the pending
//! timer and schedules a new one, so only the most recent geometry is ever
//! applied and intermediate states are discarded, never queued.
//!
//! Sidebar transitions get a deliberately longer window than plain resizes.
//! Recomputing mid-animation would visibly resize the page several times in
//! flight; waiting out the animation produces exactly one resize, at the
//! settled geometry.
//!
//! The deferred task is a single owned `JoinHandle` per engine instance —
//! cancel-and-reschedule, no global timer state.

use crate::config::{LayoutConfig, SpreadMode, ViewerConfig};
use crate::layout::{compute_dimensions, LayoutSurface, PageDimensions};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// What kind of surface change an observation reports; selects the debounce
/// window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceChange {
    /// Window resize, orientation change, size-observer callback.
    Resize,
    /// Sidebar opened or collapsed (animated width change).
    SidebarToggle,
}

/// Geometry inputs shared with the deferred recomputation task.
struct LayoutInputs {
    surface: Option<LayoutSurface>,
    aspect_ratio: f32,
    spread: SpreadMode,
}

/// Debounced wrapper around [`compute_dimensions`].
///
/// Single writer of the published [`PageDimensions`]; consumers subscribe
/// through [`dimensions`](ResponsiveLayout::dimensions).
pub struct ResponsiveLayout {
    layout: LayoutConfig,
    resize_debounce: Duration,
    sidebar_debounce: Duration,
    dims_tx: watch::Sender<PageDimensions>,
    inputs: Arc<Mutex<LayoutInputs>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

/// Until a document is loaded there is no measured page to derive a ratio
/// from; an ISO-paper portrait page is the least surprising placeholder.
const DEFAULT_ASPECT_RATIO: f32 = 0.707;

impl ResponsiveLayout {
    pub fn new(config: &ViewerConfig) -> Self {
        let layout = config.layout.clone();
        // Before the first observation the engine publishes the legibility
        // floor — positive, ratio-consistent, and immediately usable.
        let initial = compute_dimensions(
            LayoutSurface::new(0.0, 0.0),
            DEFAULT_ASPECT_RATIO,
            layout.spread,
            &layout,
        );
        let (dims_tx, _) = watch::channel(initial);
        Self {
            resize_debounce: config.resize_debounce,
            sidebar_debounce: config.sidebar_debounce,
            dims_tx,
            inputs: Arc::new(Mutex::new(LayoutInputs {
                surface: None,
                aspect_ratio: DEFAULT_ASPECT_RATIO,
                spread: layout.spread,
            })),
            layout,
            timer: Mutex::new(None),
        }
    }

    /// Subscribe to page-dimension changes.
    ///
    /// A notification fires on every accepted recomputation that actually
    /// changed the dimensions; identical results are conflated away.
    pub fn dimensions(&self) -> watch::Receiver<PageDimensions> {
        self.dims_tx.subscribe()
    }

    /// The current page dimensions.
    pub fn current_dimensions(&self) -> PageDimensions {
        *self.dims_tx.borrow()
    }

    /// Record a surface observation and (re)schedule the debounced
    /// recomputation.
    pub fn observe(&self, surface: LayoutSurface, change: SurfaceChange) {
        self.inputs.lock().unwrap().surface = Some(surface);
        let delay = match change {
            SurfaceChange::Resize => self.resize_debounce,
            SurfaceChange::SidebarToggle => self.sidebar_debounce,
        };
        debug!(
            "Surface observed: {}x{} ({:?}), recompute in {:?}",
            surface.width, surface.height, change, delay
        );
        self.schedule(delay);
    }

    /// Update the page aspect ratio (a new document was loaded) and
    /// recompute immediately — this is not a burst source, and the book on
    /// screen already has the new pages.
    pub fn set_aspect_ratio(&self, aspect_ratio: f32) {
        self.inputs.lock().unwrap().aspect_ratio = aspect_ratio;
        self.recompute_now();
    }

    /// Switch between single-page and double-spread display and recompute
    /// immediately.
    pub fn set_spread(&self, spread: SpreadMode) {
        self.inputs.lock().unwrap().spread = spread;
        self.recompute_now();
    }

    /// Cancel the pending timer, if any, and schedule a fresh one.
    fn schedule(&self, delay: Duration) {
        let mut timer = self.timer.lock().unwrap();
        if let Some(pending) = timer.take() {
            pending.abort();
        }
        let inputs = Arc::clone(&self.inputs);
        let layout = self.layout.clone();
        let dims_tx = self.dims_tx.clone();
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            publish(&inputs, &layout, &dims_tx);
        }));
    }

    fn recompute_now(&self) {
        publish(&self.inputs, &self.layout, &self.dims_tx);
    }
}

impl Drop for ResponsiveLayout {
    fn drop(&mut self) {
        if let Some(pending) = self.timer.lock().unwrap().take() {
            pending.abort();
        }
    }
}

/// Recompute from the latest inputs and publish if the result changed.
fn publish(
    inputs: &Mutex<LayoutInputs>,
    layout: &LayoutConfig,
    dims_tx: &watch::Sender<PageDimensions>,
) {
    let (surface, aspect_ratio, spread) = {
        let guard = inputs.lock().unwrap();
        let Some(surface) = guard.surface else {
            return;
        };
        (surface, guard.aspect_ratio, guard.spread)
    };
    let dims = compute_dimensions(surface, aspect_ratio, spread, layout);
    dims_tx.send_if_modified(|current| {
        if *current == dims {
            false
        } else {
            debug!("Page dimensions: {}x{}", dims.width, dims.height);
            *current = dims;
            true
        }
    });
}
