//! Viewer composition: wires the ingestion pipeline, the responsive layout
//! engine, and the navigation state machine to the turn-animation
//! capability.
//!
//! This is deliberately a thin layer. Each subsystem owns its own state and
//! publishes through its own watch channel; the viewer forwards between
//! them at the few points where the data flows meet:
//!
//! * a successful ingest → reset navigation, reconfigure the animator with
//!   the new pages and current dimensions;
//! * an accepted layout recomputation → pass the new dimensions to the
//!   animator;
//! * a capability event → hand it to the navigator.
//!
//! The layout and navigation flows stay independent — a stale-but-valid
//! dimension update never touches navigation state.

use crate::config::{SpreadMode, ViewerConfig};
use crate::document::{DocumentPages, SourceDocument};
use crate::error::ViewerError;
use crate::ingest::IngestPipeline;
use crate::layout::{LayoutSurface, PageDimensions};
use crate::navigation::{FlipEvent, NavigationState, Navigator, TurnAnimator};
use crate::pipeline::render::DocumentDecoder;
use crate::progress::IngestProgress;
use crate::resize::{ResponsiveLayout, SurfaceChange};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// The assembled viewer core.
pub struct Viewer {
    pipeline: IngestPipeline,
    layout: ResponsiveLayout,
    navigator: Navigator,
    dims_rx: watch::Receiver<PageDimensions>,
}

impl Viewer {
    /// Assemble a viewer from explicit collaborators.
    pub fn new(
        config: ViewerConfig,
        decoder: Arc<dyn DocumentDecoder>,
        animator: Box<dyn TurnAnimator>,
    ) -> Self {
        let layout = ResponsiveLayout::new(&config);
        let dims_rx = layout.dimensions();
        Self {
            pipeline: IngestPipeline::new(config, decoder),
            layout,
            navigator: Navigator::new(animator),
            dims_rx,
        }
    }

    /// Assemble a viewer with the pdfium-backed decoder.
    pub fn with_pdfium(config: ViewerConfig, animator: Box<dyn TurnAnimator>) -> Self {
        Self::new(
            config,
            Arc::new(crate::pipeline::render::PdfiumDecoder::new()),
            animator,
        )
    }

    // ── Document lifecycle ───────────────────────────────────────────────

    /// Ingest a document and, on success, swap the book on screen.
    ///
    /// On failure the previously displayed book stays intact; the error's
    /// [`user_message`](ViewerError::user_message) (also mirrored into the
    /// progress snapshot) is the one-line banner to show, and the caller
    /// may retry with a different document.
    pub async fn load(
        &mut self,
        source: SourceDocument,
    ) -> Result<Arc<DocumentPages>, ViewerError> {
        let pages = self.pipeline.ingest(source).await?;
        self.install(&pages);
        Ok(pages)
    }

    /// Resolve a path or URL and load it.
    pub async fn load_from(&mut self, input: &str) -> Result<Arc<DocumentPages>, ViewerError> {
        let pages = self.pipeline.ingest_from(input).await?;
        self.install(&pages);
        Ok(pages)
    }

    /// Clear the current book and return to the empty state.
    pub fn reset(&mut self) {
        self.pipeline.reset();
        self.navigator.set_document(0);
        self.navigator.configure_animator(
            self.pipeline.current_pages(),
            self.layout.current_dimensions(),
        );
    }

    fn install(&mut self, pages: &Arc<DocumentPages>) {
        if let Some(ratio) = pages.mean_aspect_ratio() {
            self.layout.set_aspect_ratio(ratio);
        }
        // Accepted synchronously above, so the receiver must not re-report
        // it later as a fresh change.
        let dims = *self.dims_rx.borrow_and_update();
        self.navigator.set_document(pages.len());
        self.navigator.configure_animator(Arc::clone(pages), dims);
        info!("Book installed: {} pages at {}x{}", pages.len(), dims.width, dims.height);
    }

    // ── Surface / layout flow ────────────────────────────────────────────

    /// Report that the viewing surface changed (resize, orientation change,
    /// sidebar toggle). Recomputation is debounced per the config.
    pub fn surface_changed(&mut self, surface: LayoutSurface, change: SurfaceChange) {
        self.layout.observe(surface, change);
    }

    /// Switch single-page vs double-spread display.
    pub fn set_spread(&mut self, spread: SpreadMode) {
        self.layout.set_spread(spread);
        let dims = *self.dims_rx.borrow_and_update();
        self.navigator.update_dimensions(dims);
    }

    /// Await the next accepted layout recomputation and forward the new
    /// dimensions to the animator.
    ///
    /// Hosts with an event loop select over this alongside their other
    /// sources; each completion corresponds to one accepted recomputation.
    pub async fn dimensions_changed(&mut self) {
        if self.dims_rx.changed().await.is_ok() {
            let dims = *self.dims_rx.borrow_and_update();
            self.navigator.update_dimensions(dims);
        }
    }

    // ── Navigation flow ──────────────────────────────────────────────────

    /// Forward an event from the turn-animation capability.
    pub fn handle_flip_event(&mut self, event: FlipEvent) {
        self.navigator.handle_event(event);
    }

    pub fn next(&mut self) {
        self.navigator.next();
    }

    pub fn previous(&mut self) {
        self.navigator.previous();
    }

    pub fn first(&mut self) {
        self.navigator.first();
    }

    pub fn last(&mut self) {
        self.navigator.last();
    }

    pub fn go_to(&mut self, index: usize) {
        self.navigator.go_to(index);
    }

    // ── Snapshots & subscriptions ────────────────────────────────────────

    pub fn navigation(&self) -> watch::Receiver<NavigationState> {
        self.navigator.state()
    }

    pub fn current_navigation(&self) -> NavigationState {
        self.navigator.current()
    }

    pub fn progress(&self) -> watch::Receiver<IngestProgress> {
        self.pipeline.progress()
    }

    pub fn current_progress(&self) -> IngestProgress {
        self.pipeline.current_progress()
    }

    pub fn pages(&self) -> watch::Receiver<Arc<DocumentPages>> {
        self.pipeline.pages()
    }

    pub fn current_pages(&self) -> Arc<DocumentPages> {
        self.pipeline.current_pages()
    }

    pub fn dimensions(&self) -> watch::Receiver<PageDimensions> {
        self.layout.dimensions()
    }

    pub fn current_dimensions(&self) -> PageDimensions {
        self.layout.current_dimensions()
    }
}
