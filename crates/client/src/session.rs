//! Per-login wiring of connector, store and event pump.

use std::sync::Arc;

use souk_shared::{ServerEvent, WsEnvelope};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api_client::{ApiClient, MessagingApi};
use crate::config::ClientConfig;
use crate::stores::MessagingStore;
use crate::ws::{ConnectionSettings, Connector, WsHandle};

/// Everything messaging needs for one signed-in user.
///
/// Inbound socket events are applied to the store by a single pump task, in
/// arrival order. Dropping the session (or calling [`logout`](Self::logout))
/// closes the socket and stops the pump.
pub struct MessagingSession {
    store: MessagingStore,
    connector: Arc<Connector>,
    pump: JoinHandle<()>,
}

impl MessagingSession {
    /// Start a session talking to the configured backend.
    ///
    /// Must be called inside a tokio runtime. The socket itself opens lazily
    /// on the first command or [`connect`](Self::connect).
    pub fn start(config: ClientConfig) -> Self {
        let api = ApiClient::new()
            .with_base_url(config.api_base_url.clone())
            .with_auth_token(config.auth_token.clone());
        Self::with_api(config, Arc::new(api))
    }

    /// Start a session over a custom REST implementation.
    pub fn with_api(config: ClientConfig, api: Arc<dyn MessagingApi>) -> Self {
        let settings = ConnectionSettings {
            url: config.messaging_ws_url(),
            auth_token: config.auth_token.clone(),
            reconnect: config.reconnect.clone(),
        };
        let (connector, events) = Connector::with_event_channel(settings);
        let connector = Arc::new(connector);
        let store = MessagingStore::new(config.store, api, connector.clone());
        let pump = tokio::spawn(pump_events(store.clone(), events));

        crate::log_info!("Messaging session started for {}", store.config().self_user_id);
        Self {
            store,
            connector,
            pump,
        }
    }

    pub fn store(&self) -> &MessagingStore {
        &self.store
    }

    pub fn connector(&self) -> &Arc<Connector> {
        &self.connector
    }

    /// Open the socket now instead of on first use.
    pub fn connect(&self) -> WsHandle {
        self.connector.acquire()
    }

    /// Tear the session down and clear all messaging state.
    pub fn logout(self) {
        crate::log_info!("Messaging session for {} logged out", self.store.config().self_user_id);
        self.store.reset();
    }
}

impl Drop for MessagingSession {
    fn drop(&mut self) {
        self.connector.release();
        self.pump.abort();
    }
}

async fn pump_events(
    store: MessagingStore,
    mut events: mpsc::UnboundedReceiver<WsEnvelope<ServerEvent>>,
) {
    while let Some(event) = events.recv().await {
        store.handle_event(event);
    }
    crate::log_debug!("Event channel closed, pump exiting");
}
