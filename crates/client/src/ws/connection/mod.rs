//! Types shared by the messaging socket and its owner.
//!
//! This module provides the shared types; the socket loop itself lives in
//! `connection_native`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_channel::mpsc::UnboundedSender;
use souk_shared::{ClientCommand, WsEnvelope};
use tokio::sync::watch;

/// Lifecycle of the messaging socket, as published to views.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Failed { reason: String },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn is_connecting(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::Reconnecting { .. }
        )
    }
}

/// Backoff policy for transport-level reconnects.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Attempts before giving up with `Failed`; 0 retries forever.
    pub max_attempts: u32,
    pub initial_delay_ms: u32,
    /// Upper bound for a single delay.
    pub max_delay_ms: u32,
    pub backoff_multiplier: f32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_multiplier: 1.5,
        }
    }
}

impl ReconnectConfig {
    /// Delay before reconnect attempt `attempt + 1`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.initial_delay_ms as f32 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis((delay as u32).min(self.max_delay_ms) as u64)
    }
}

/// Where and how to open the messaging socket.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Full URL including the messaging namespace.
    pub url: String,
    /// Sent as `Authorization: Bearer` on the handshake.
    pub auth_token: Option<String>,
    pub reconnect: ReconnectConfig,
}

/// Publishes connection state for one connection generation.
///
/// Writes from a generation that is no longer current are dropped, so a
/// released connection winding down cannot overwrite its successor's state.
#[derive(Clone)]
pub(crate) struct StatePublisher {
    generation: u64,
    current: Arc<AtomicU64>,
    tx: Arc<watch::Sender<ConnectionState>>,
}

impl StatePublisher {
    pub(crate) fn new(
        generation: u64,
        current: Arc<AtomicU64>,
        tx: Arc<watch::Sender<ConnectionState>>,
    ) -> Self {
        Self {
            generation,
            current,
            tx,
        }
    }

    pub(crate) fn set(&self, state: ConnectionState) {
        if self.current.load(Ordering::SeqCst) == self.generation {
            self.tx.send_replace(state);
        }
    }
}

/// Cloneable command queue into the live socket.
#[derive(Clone, Debug)]
pub struct WsHandle {
    sender: UnboundedSender<WsEnvelope<ClientCommand>>,
    pub url: String,
}

impl WsHandle {
    pub(crate) fn new(sender: UnboundedSender<WsEnvelope<ClientCommand>>, url: String) -> Self {
        Self { sender, url }
    }

    /// Queue a command; it is flushed as soon as the socket is open.
    pub fn send(&self, cmd: ClientCommand) -> Result<(), String> {
        crate::log_debug!("WsHandle::send to '{}': {:?}", self.url, cmd);
        self.sender
            .unbounded_send(WsEnvelope::new(cmd))
            .map_err(|_| "messaging socket closed".to_string())
    }

    /// Whether the owning connection has shut down.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

mod connection_native;
pub use connection_native::WsConnection;
