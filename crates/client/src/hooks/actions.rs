//! Store actions wrapped for synchronous event handlers.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::api_client::OutgoingFile;
use crate::error::StoreError;
use crate::stores::{MessagingStore, Selection};

/// Minimum gap between two typing notifications.
pub const DEFAULT_TYPING_INTERVAL: Duration = Duration::from_secs(2);

/// Rate limiter for typing notifications. The store sends every
/// `emit_typing` call it gets; this keeps keystrokes from flooding the socket.
#[derive(Debug, Clone)]
pub struct TypingThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl Default for TypingThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_TYPING_INTERVAL)
    }
}

impl TypingThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Whether a notification may go out now. Records the emission if so.
    pub fn ready(&mut self) -> bool {
        let now = Instant::now();
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// Forget the last emission, e.g. after the message was sent.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Action dispatchers for UI callbacks.
///
/// Async store operations are spawned on the current tokio runtime; their
/// failures are also recorded in the store state, so callers may drop the
/// returned handles.
#[derive(Clone)]
pub struct MessagingActions {
    store: MessagingStore,
    throttle: Arc<Mutex<TypingThrottle>>,
}

impl MessagingActions {
    pub fn new(store: MessagingStore, throttle: TypingThrottle) -> Self {
        Self {
            store,
            throttle: Arc::new(Mutex::new(throttle)),
        }
    }

    pub fn select(&self, selection: Selection) -> JoinHandle<Result<(), StoreError>> {
        let store = self.store.clone();
        tokio::spawn(async move { store.select_conversation(selection).await })
    }

    pub fn leave(&self) {
        self.store.leave_conversation();
    }

    pub fn send_text(&self, body: impl Into<String>) -> JoinHandle<Result<String, StoreError>> {
        self.throttle().reset();
        let store = self.store.clone();
        let body = body.into();
        tokio::spawn(async move { store.send_text_message(&body).await })
    }

    pub fn send_file(&self, file: OutgoingFile) -> JoinHandle<Result<String, StoreError>> {
        let store = self.store.clone();
        tokio::spawn(async move { store.send_file_message(file).await })
    }

    pub fn retry(&self, client_id: impl Into<String>) -> JoinHandle<Result<(), StoreError>> {
        let store = self.store.clone();
        let client_id = client_id.into();
        tokio::spawn(async move { store.retry_message(&client_id).await })
    }

    pub fn discard(&self, client_id: &str) -> Result<(), StoreError> {
        self.store.discard_message(client_id)
    }

    pub fn load_more_conversations(&self) -> JoinHandle<Result<bool, StoreError>> {
        let store = self.store.clone();
        tokio::spawn(async move { store.load_more_conversations().await })
    }

    pub fn load_older_messages(&self) -> JoinHandle<Result<bool, StoreError>> {
        let store = self.store.clone();
        tokio::spawn(async move { store.load_older_messages().await })
    }

    pub fn mark_read(&self) -> JoinHandle<Result<(), StoreError>> {
        let store = self.store.clone();
        tokio::spawn(async move { store.mark_current_as_read().await })
    }

    pub fn refresh_unread(&self) -> JoinHandle<Result<u32, StoreError>> {
        let store = self.store.clone();
        tokio::spawn(async move { store.refresh_unread_count().await })
    }

    /// Keystroke handler: emits a typing notification at most once per
    /// throttle interval. Returns whether one was sent.
    pub fn typing(&self) -> Result<bool, StoreError> {
        if !self.throttle().ready() {
            return Ok(false);
        }
        self.store.emit_typing().map(|()| true)
    }

    fn throttle(&self) -> std::sync::MutexGuard<'_, TypingThrottle> {
        self.throttle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
