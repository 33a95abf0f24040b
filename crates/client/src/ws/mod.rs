//! WebSocket module for the real-time messaging channel.
//!
//! This module provides:
//! - A connection with transport-level auto-reconnect
//! - The [`Connector`], sole owner of the live socket (acquire/release)
//! - The [`RealtimeSink`] seam the store emits commands through
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  Connector                   │
//! │   (owns at most one WsConnection at a time)  │
//! └──────────────────────────────────────────────┘
//!          │ WsHandle (cloneable)        ▲ inbound frames
//!          ▼                             │
//!   ┌────────────────┐          ┌──────────────────┐
//!   │ MessagingStore │◄─────────│   event pump     │
//!   │ (emits Typing, │  events  │ (session task)   │
//!   │  Subscribe…)   │          └──────────────────┘
//!   └────────────────┘
//! ```
//!
//! Nothing outside this module touches the raw socket; other code sends
//! commands through a [`WsHandle`] or the [`RealtimeSink`] trait.

use std::sync::Arc;

use souk_shared::{ClientCommand, ServerEvent, WsEnvelope};

mod connection;
mod connector;
mod hooks;

pub use connection::{ConnectionSettings, ConnectionState, ReconnectConfig, WsConnection, WsHandle};
pub use connector::Connector;
pub use hooks::use_connection_state;

/// Callback invoked for every well-formed inbound event.
pub type EventCallback = Arc<dyn Fn(WsEnvelope<ServerEvent>) + Send + Sync>;

/// Outbound side of the real-time channel as seen by the store.
pub trait RealtimeSink: Send + Sync {
    fn send(&self, command: ClientCommand) -> Result<(), String>;
}
