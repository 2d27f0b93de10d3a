//! The document ingestion pipeline: drives the page decoder across every
//! page of an uploaded document and publishes the result atomically.
//!
//! ## The two invariants that shape this module
//!
//! **Atomic publish.** Readers subscribe to a `watch` channel of
//! `Arc<DocumentPages>` and must never observe a partially rendered
//! document. The pipeline accumulates bitmaps in a run-local buffer and
//! performs exactly one channel send, after the last page has rendered. Any
//! page failure discards the whole buffer; the previously published
//! snapshot stays active until a fully successful run replaces it.
//!
//! **Superseding cancellation.** A new `ingest()` (or `reset()`) cancels the
//! in-flight run cooperatively: the old run's token is flipped, the decoder
//! notices at its next between-pages check, and the old run's buffer is
//! discarded. The final not-cancelled check happens under the same lock
//! that installs new runs, so a late completion can never clobber the
//! state a newer run has published.

use crate::config::ViewerConfig;
use crate::document::{DocumentPages, SourceDocument};
use crate::error::ViewerError;
use crate::pipeline::input;
use crate::pipeline::render::{
    CancelToken, DecodeEvent, DocumentDecoder, PageSink, PdfiumDecoder, RenderOptions,
};
use crate::progress::IngestProgress;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Sequentially renders a document's pages and publishes the completed page
/// list plus continuous progress.
///
/// Single writer for both published values; consumers subscribe through
/// [`pages`](IngestPipeline::pages) and
/// [`progress`](IngestPipeline::progress).
pub struct IngestPipeline {
    config: ViewerConfig,
    decoder: Arc<dyn DocumentDecoder>,
    pages_tx: watch::Sender<Arc<DocumentPages>>,
    progress_tx: watch::Sender<IngestProgress>,
    current_run: Mutex<Option<CancelToken>>,
    version: AtomicU64,
}

impl IngestPipeline {
    /// Create a pipeline with an explicit decoder.
    ///
    /// Tests inject a fake decoder here; production callers normally use
    /// [`IngestPipeline::with_pdfium`].
    pub fn new(config: ViewerConfig, decoder: Arc<dyn DocumentDecoder>) -> Self {
        let (pages_tx, _) = watch::channel(Arc::new(DocumentPages::empty()));
        let (progress_tx, _) = watch::channel(IngestProgress::default());
        Self {
            config,
            decoder,
            pages_tx,
            progress_tx,
            current_run: Mutex::new(None),
            version: AtomicU64::new(0),
        }
    }

    /// Create a pipeline backed by the pdfium decoder.
    pub fn with_pdfium(config: ViewerConfig) -> Self {
        Self::new(config, Arc::new(PdfiumDecoder::new()))
    }

    /// Subscribe to the published page list.
    pub fn pages(&self) -> watch::Receiver<Arc<DocumentPages>> {
        self.pages_tx.subscribe()
    }

    /// The currently published page list.
    pub fn current_pages(&self) -> Arc<DocumentPages> {
        self.pages_tx.borrow().clone()
    }

    /// Subscribe to ingestion progress.
    pub fn progress(&self) -> watch::Receiver<IngestProgress> {
        self.progress_tx.subscribe()
    }

    /// Subscribe to ingestion progress as a `Stream` of snapshots.
    pub fn progress_stream(&self) -> tokio_stream::wrappers::WatchStream<IngestProgress> {
        crate::progress::progress_stream(self.progress_tx.subscribe())
    }

    /// The current progress snapshot.
    pub fn current_progress(&self) -> IngestProgress {
        self.progress_tx.borrow().clone()
    }

    /// Resolve a path or URL and ingest it.
    pub async fn ingest_from(&self, input: &str) -> Result<Arc<DocumentPages>, ViewerError> {
        let source = input::resolve(input, &self.config).await?;
        self.ingest(source).await
    }

    /// Ingest an uploaded document, replacing any in-flight run.
    ///
    /// On success the new page list has been published and is returned. On
    /// failure the previously published list is untouched, progress carries
    /// the failure message, and the terminal error is returned. A run
    /// superseded by a newer `ingest`/`reset` returns
    /// [`ViewerError::Cancelled`] without touching either published value.
    pub async fn ingest(&self, source: SourceDocument) -> Result<Arc<DocumentPages>, ViewerError> {
        let started = Instant::now();

        // Media type, size ceiling, magic bytes — all before any decoding
        // work or state changes beyond the progress banner.
        if let Err(e) = input::validate(&source, &self.config) {
            self.progress_tx.send_replace(IngestProgress::failed(e.user_message()));
            return Err(e);
        }

        let token = self.begin_run();
        self.progress_tx.send_replace(IngestProgress::started());
        info!("Ingestion started: {} bytes", source.bytes.len());

        match self.run_decode(source, &token).await {
            Ok(bitmaps) => {
                let total = bitmaps.len();
                // Publish under the run lock so a completion that lost the
                // race to a newer run can never overwrite its state.
                let published = {
                    let _guard = self.current_run.lock().unwrap();
                    if token.is_cancelled() {
                        None
                    } else {
                        let version = self.version.fetch_add(1, Ordering::Relaxed) + 1;
                        let snapshot = Arc::new(DocumentPages::new(bitmaps, version));
                        self.pages_tx.send_replace(snapshot.clone());
                        self.progress_tx.send_replace(IngestProgress::finished());
                        Some(snapshot)
                    }
                };
                match published {
                    Some(snapshot) => {
                        info!(
                            "Ingestion complete: {} pages in {}ms",
                            total,
                            started.elapsed().as_millis()
                        );
                        Ok(snapshot)
                    }
                    None => {
                        debug!("Ingestion run finished after being superseded; result discarded");
                        Err(ViewerError::Cancelled)
                    }
                }
            }
            Err(ViewerError::Cancelled) => {
                debug!("Ingestion run cancelled");
                Err(ViewerError::Cancelled)
            }
            Err(e) => {
                warn!("Ingestion aborted: {}", e.user_message());
                // Whole-document failure: nothing from this run survives,
                // and the previously published snapshot stays active.
                self.progress_tx.send_replace(IngestProgress::failed(e.user_message()));
                Err(e)
            }
        }
    }

    /// Cancel any in-flight run and clear the published document.
    pub fn reset(&self) {
        let mut guard = self.current_run.lock().unwrap();
        if let Some(old) = guard.take() {
            old.cancel();
        }
        let version = self.version.fetch_add(1, Ordering::Relaxed) + 1;
        self.pages_tx
            .send_replace(Arc::new(DocumentPages::new(Vec::new(), version)));
        self.progress_tx.send_replace(IngestProgress::default());
        info!("Viewer reset: page list cleared");
    }

    /// Cancel the previous run (if any) and install a fresh token.
    fn begin_run(&self) -> CancelToken {
        let mut guard = self.current_run.lock().unwrap();
        if let Some(old) = guard.take() {
            debug!("Superseding in-flight ingestion run");
            old.cancel();
        }
        let token = CancelToken::new();
        *guard = Some(token.clone());
        token
    }

    /// Drive the decoder on a blocking thread, collecting pages in order and
    /// republishing progress after each one.
    async fn run_decode(
        &self,
        source: SourceDocument,
        token: &CancelToken,
    ) -> Result<Vec<crate::document::PageBitmap>, ViewerError> {
        // Capacity 1 keeps rendering page-sequential: the decoder blocks on
        // page i until the async side has received page i-1.
        let (tx, mut rx) = mpsc::channel(1);
        let sink = PageSink::new(tx, token.clone());
        let options = RenderOptions::from_config(&self.config);
        let decoder = Arc::clone(&self.decoder);
        let bytes = source.bytes;

        let worker =
            tokio::task::spawn_blocking(move || decoder.decode(&bytes, &options, &sink));

        let mut total_pages = 0usize;
        let mut bitmaps = Vec::new();

        // Each recv is a suspension point; the rest of the system stays
        // responsive while a page renders.
        while let Some(event) = rx.recv().await {
            if token.is_cancelled() {
                // Dropping the receiver unblocks the decoder, which then
                // observes cancellation and bails out on its own.
                drop(rx);
                return Err(ViewerError::Cancelled);
            }
            match event {
                DecodeEvent::Opened { page_count } => {
                    total_pages = page_count;
                    bitmaps.reserve(page_count);
                    self.progress_tx
                        .send_replace(IngestProgress::rendering(0, total_pages));
                    debug!("Rendering {} pages", total_pages);
                }
                DecodeEvent::Page(bitmap) => {
                    if bitmap.index != bitmaps.len() {
                        return Err(ViewerError::Internal(format!(
                            "decoder emitted page {} but page {} was expected",
                            bitmap.index,
                            bitmaps.len()
                        )));
                    }
                    bitmaps.push(bitmap);
                    self.progress_tx
                        .send_replace(IngestProgress::rendering(bitmaps.len(), total_pages));
                }
            }
        }

        // Channel closed: the decoder is done. Surface its verdict.
        worker
            .await
            .map_err(|e| ViewerError::Internal(format!("decode task panicked: {e}")))??;

        if token.is_cancelled() {
            return Err(ViewerError::Cancelled);
        }
        Ok(bitmaps)
    }
}
