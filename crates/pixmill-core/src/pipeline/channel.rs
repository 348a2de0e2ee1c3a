//! Progress events flowing from the pipeline worker to an observer.
//!
//! The worker only ever writes to a [`ProgressSink`]; it never touches the
//! observer's state. The channel is unbounded so the worker never blocks on a
//! slow reader, and events arrive in emission order.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Totals for a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
    pub cancelled: bool,
    pub elapsed_ms: u64,
}

impl RunSummary {
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    /// Jobs never started because the run was cancelled.
    pub fn skipped(&self) -> usize {
        self.total - self.succeeded - self.failed
    }
}

/// A notification from the worker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Free-form status line ("Processing: a.png", "Processing cancelled")
    Status(String),
    /// About to process job `index` (0-based) of `total`
    Progress { index: usize, total: usize },
    /// A job's output was written
    Saved { source: PathBuf, output: PathBuf },
    /// A stage was skipped for one image; the image still completes
    Warning { source: PathBuf, message: String },
    /// A job failed; the run continues with the next one
    ImageFailed { source: PathBuf, error: String },
    /// The run finished, fully or after cancellation
    Completed(RunSummary),
    /// The run could not start or continue at all
    Failed(String),
}

impl ProgressEvent {
    /// `Completed` and `Failed` end the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Completed(_) | ProgressEvent::Failed(_))
    }
}

/// Anything the worker can report progress into.
pub trait ProgressSink {
    fn emit(&mut self, event: ProgressEvent);
}

impl ProgressSink for Vec<ProgressEvent> {
    fn emit(&mut self, event: ProgressEvent) {
        self.push(event);
    }
}

/// Sending half of the progress channel.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ProgressSink for ProgressSender {
    fn emit(&mut self, event: ProgressEvent) {
        // The observer may have gone away; the run still finishes
        if self.tx.send(event).is_err() {
            tracing::trace!("Progress receiver dropped");
        }
    }
}

/// Receiving half of the progress channel.
#[derive(Debug)]
pub struct ProgressReceiver {
    rx: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl ProgressReceiver {
    /// Wait for the next event. `None` once the worker is gone and the
    /// buffer is empty.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }

    /// Blocking variant of [`recv`](Self::recv) for non-async observers.
    pub fn blocking_recv(&mut self) -> Option<ProgressEvent> {
        self.rx.blocking_recv()
    }

    /// Next buffered event, without waiting.
    pub fn try_recv(&mut self) -> Option<ProgressEvent> {
        self.rx.try_recv().ok()
    }

    /// Everything buffered so far, in order. Meant for a periodic poll.
    pub fn drain(&mut self) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Create a connected sender/receiver pair.
pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressSender { tx }, ProgressReceiver { rx })
}

/// Shared stop flag, checked by the worker between images.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. The image in flight still completes.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
