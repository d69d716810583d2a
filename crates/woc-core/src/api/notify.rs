use std::sync::Mutex;

use tracing::warn;

/// Side channel for user-visible failure notices.
///
/// Called once for every failed logical call. Fire-and-forget: nothing the
/// notifier does can change the outcome returned to the caller.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, message: &str);
}

/// Emits failure notices as `warn` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        warn!(message, "Request failed");
    }
}

/// Keeps every notice in memory, newest last.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}

impl<N: Notifier> Notifier for std::sync::Arc<N> {
    fn notify(&self, message: &str) {
        (**self).notify(message)
    }
}
