//! Result reporting for client sessions.

use std::sync::Mutex;

/// Where sessions report outcomes. Presentation layers plug in here.
pub trait Notifier: Send + Sync {
    fn message(&self, text: &str);
    fn error(&self, text: &str);
}

/// Reports through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn message(&self, text: &str) {
        tracing::info!(notice = text);
    }

    fn error(&self, text: &str) {
        tracing::warn!(notice = text);
    }
}

/// One reported outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Message(String),
    Error(String),
}

/// Keeps every notice until drained.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the notices recorded so far.
    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.lock())
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.lock().clone()
    }

    fn push(&self, notice: Notice) {
        self.lock().push(notice);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notice>> {
        self.notices.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Notifier for RecordingNotifier {
    fn message(&self, text: &str) {
        self.push(Notice::Message(text.to_string()));
    }

    fn error(&self, text: &str) {
        self.push(Notice::Error(text.to_string()));
    }
}
