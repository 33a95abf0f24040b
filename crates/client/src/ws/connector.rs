//! Lifecycle owner of the shared messaging socket.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use souk_shared::{ClientCommand, ServerEvent, WsEnvelope};
use tokio::sync::{mpsc, watch};

use super::connection::{ConnectionSettings, ConnectionState, StatePublisher, WsConnection, WsHandle};
use super::{EventCallback, RealtimeSink};

/// Holds the one socket of the session.
///
/// `acquire` is idempotent: it hands out the existing connection's handle
/// and only opens a new socket when there is none or the previous one has
/// terminated. `release` closes the socket; the next `acquire` starts fresh.
pub struct Connector {
    settings: ConnectionSettings,
    on_event: EventCallback,
    state: Arc<watch::Sender<ConnectionState>>,
    generation: Arc<AtomicU64>,
    slot: Mutex<Option<WsConnection>>,
}

impl Connector {
    pub fn new(
        settings: ConnectionSettings,
        on_event: impl Fn(WsEnvelope<ServerEvent>) + Send + Sync + 'static,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            settings,
            on_event: Arc::new(on_event),
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            slot: Mutex::new(None),
        }
    }

    /// Connector whose inbound events are delivered, in arrival order, on
    /// the returned channel.
    pub fn with_event_channel(
        settings: ConnectionSettings,
    ) -> (Self, mpsc::UnboundedReceiver<WsEnvelope<ServerEvent>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connector = Self::new(settings, move |event| {
            if tx.send(event).is_err() {
                crate::log_debug!("Event receiver gone, dropping inbound event");
            }
        });
        (connector, rx)
    }

    /// Return the live connection's handle, opening the socket if needed.
    ///
    /// Must be called inside a tokio runtime.
    pub fn acquire(&self) -> WsHandle {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(conn) = slot.as_ref() {
            if !conn.is_terminated() {
                return conn.handle();
            }
            crate::log_info!("Previous connection to {} terminated, reopening", conn.url);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let publisher = StatePublisher::new(generation, self.generation.clone(), self.state.clone());
        crate::log_info!("Opening messaging socket to {}", self.settings.url);

        let conn = WsConnection::open(self.settings.clone(), publisher, self.on_event.clone());
        let handle = conn.handle();
        *slot = Some(conn);
        handle
    }

    /// Close and forget the socket (logout / teardown).
    pub fn release(&self) {
        let taken = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        // Retire the old generation before it reports its own shutdown.
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(conn) = taken {
            conn.close();
        }
        self.state.send_replace(ConnectionState::Disconnected);
    }

    fn live_handle(&self) -> Option<WsHandle> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|conn| !conn.is_terminated())
            .map(WsConnection::handle)
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().is_connected()
    }
}

impl RealtimeSink for Connector {
    /// Opens the socket on demand. Outside a tokio runtime only an already
    /// live connection is used; otherwise the command is refused.
    fn send(&self, command: ClientCommand) -> Result<(), String> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return self.acquire().send(command);
        }
        match self.live_handle() {
            Some(handle) => handle.send(command),
            None => Err("no tokio runtime to open the messaging socket".to_string()),
        }
    }
}
