//! Ingestion progress reporting.
//!
//! Progress is published through a `tokio::sync::watch` channel: consumers
//! take a read-only snapshot with `borrow()` or await changes with
//! `changed()`, and the pipeline stays the single writer. A watch channel
//! also conflates naturally — a slow consumer sees the latest state, never a
//! backlog of stale percentages.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// A point-in-time snapshot of the ingestion pipeline's progress.
///
/// Recomputed after each page; transient — a new run resets it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IngestProgress {
    /// Completed percentage, 0–100.
    pub percent: u8,
    /// Whether an ingestion run is currently in flight.
    pub is_active: bool,
    /// Human-readable message from the most recent failure, if any.
    ///
    /// Cleared when a new run starts.
    pub last_error: Option<String>,
}

impl IngestProgress {
    /// Snapshot for a run that has just started.
    pub(crate) fn started() -> Self {
        Self {
            percent: 0,
            is_active: true,
            last_error: None,
        }
    }

    /// Snapshot after `completed` of `total` pages have rendered.
    pub(crate) fn rendering(completed: usize, total: usize) -> Self {
        Self {
            percent: percent_complete(completed, total),
            is_active: true,
            last_error: None,
        }
    }

    /// Snapshot for a successfully completed run.
    pub(crate) fn finished() -> Self {
        Self {
            percent: 100,
            is_active: false,
            last_error: None,
        }
    }

    /// Snapshot for an aborted run.
    pub(crate) fn failed(message: String) -> Self {
        Self {
            percent: 0,
            is_active: false,
            last_error: Some(message),
        }
    }
}

/// `round(100 * completed / total)` as the 0–100 integer consumers display.
pub(crate) fn percent_complete(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (100.0 * completed as f64 / total as f64).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Adapt a progress subscription into a `Stream` of snapshots.
///
/// The stream yields the current snapshot immediately, then one item per
/// accepted change. Convenient for consumers already living in a
/// `StreamExt` world (the CLI progress bar drains one of these).
pub fn progress_stream(rx: watch::Receiver<IngestProgress>) -> WatchStream<IngestProgress> {
    WatchStream::new(rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_math_matches_rounding() {
        assert_eq!(percent_complete(0, 3), 0);
        assert_eq!(percent_complete(1, 3), 33);
        assert_eq!(percent_complete(2, 3), 67);
        assert_eq!(percent_complete(3, 3), 100);
    }

    #[test]
    fn percent_of_zero_total_is_complete() {
        // A zero-page document has nothing left to do.
        assert_eq!(percent_complete(0, 0), 100);
    }

    #[test]
    fn lifecycle_snapshots() {
        assert_eq!(
            IngestProgress::started(),
            IngestProgress {
                percent: 0,
                is_active: true,
                last_error: None
            }
        );
        assert_eq!(IngestProgress::finished().percent, 100);
        assert!(!IngestProgress::finished().is_active);

        let failed = IngestProgress::failed("page 3 exploded".into());
        assert_eq!(failed.percent, 0);
        assert!(!failed.is_active);
        assert_eq!(failed.last_error.as_deref(), Some("page 3 exploded"));
    }

    #[test]
    fn snapshot_serialises() {
        let p = IngestProgress::rendering(1, 2);
        let json = serde_json::to_string(&p).unwrap();
        let back: IngestProgress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
        assert_eq!(back.percent, 50);
    }
}
