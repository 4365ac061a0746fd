//! Per-event-kind subscription channels.

use crate::registry::BuildState;
use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use texpilot_log::Diagnostic;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildStarted {
    pub file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildFinished {
    pub file: PathBuf,
    /// Raw engine stdout.
    pub output: String,
    pub elapsed: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildFailed {
    pub file: PathBuf,
    pub error: String,
    pub output: String,
}

/// Published on every state transition. `file` is `None` for a global reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChanged {
    pub status: BuildState,
    pub file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticsUpdated {
    pub file: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
}

/// A fan-out channel for one kind of event.
///
/// Every [`subscribe`](Self::subscribe) call returns a new receiver that
/// sees the events published after it was created. Receivers that have
/// been dropped are pruned on the next publish.
pub struct EventChannel<T> {
    subscribers: Mutex<Vec<Sender<T>>>,
}

impl<T> Default for EventChannel<T> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Clone> EventChannel<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<T> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.lock().push(tx);
        rx
    }

    /// Delivers `event` to every live subscriber and returns how many received it.
    pub fn publish(&self, event: T) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Sender<T>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The channels a [`BuildRegistry`](crate::BuildRegistry) publishes on.
#[derive(Default)]
pub struct BuildEvents {
    pub started: EventChannel<BuildStarted>,
    pub finished: EventChannel<BuildFinished>,
    pub failed: EventChannel<BuildFailed>,
    pub status_changed: EventChannel<StatusChanged>,
    pub diagnostics_updated: EventChannel<DiagnosticsUpdated>,
}
