//! Connection-state hook.
//!
//! Views only observe the socket state; they never get the connection
//! itself. Events flow through the store.

use tokio::sync::watch;

use super::connection::ConnectionState;
use super::connector::Connector;

/// Subscribe to the connection state of the session's socket.
///
/// The receiver starts at the current state and is notified on every
/// transition, including reconnect attempts.
pub fn use_connection_state(connector: &Connector) -> watch::Receiver<ConnectionState> {
    connector.connection_state()
}
