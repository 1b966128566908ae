//! Progress events and cooperative cancellation

use super::report::{OutcomeKind, UpdateReport};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// Per-run status updates emitted by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    RunStarted {
        total: usize,
    },
    ModStarted {
        index: usize,
        name: String,
    },
    ModFinished {
        index: usize,
        name: String,
        kind: OutcomeKind,
        detail: String,
    },
    RunFinished {
        updated: usize,
        up_to_date: usize,
        failed: usize,
    },
    Cancelled {
        processed: usize,
        total: usize,
    },
}

impl ProgressEvent {
    pub fn finished(report: &UpdateReport) -> Self {
        Self::RunFinished {
            updated: report.summary.updated,
            up_to_date: report.summary.up_to_date,
            failed: report.summary.missing + report.summary.unresolved + report.summary.errors,
        }
    }
}

/// Receiver of progress events; the caller owns any thread or task boundary
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Forwards events into a tokio channel for an async consumer
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    sender: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgress {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ProgressSink for ChannelProgress {
    fn emit(&self, event: ProgressEvent) {
        // A dropped receiver just means nobody is listening any more
        let _ = self.sender.send(event);
    }
}

/// Shared cancellation request, checked between mods
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    include!("progress.test.rs");
}
