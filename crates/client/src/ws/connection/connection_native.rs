//! Native WebSocket implementation using tokio-tungstenite.

use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures_util::{SinkExt, StreamExt};
use souk_shared::{ClientCommand, ServerEvent, WsEnvelope};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderValue};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::{ConnectionSettings, ConnectionState, StatePublisher, WsHandle};
use crate::ws::EventCallback;

/// One managed socket to the messaging namespace.
///
/// Dropping or closing it stops the background loop, including any pending
/// reconnect.
pub struct WsConnection {
    pub url: String,
    /// Channel for sending commands
    sender: UnboundedSender<WsEnvelope<ClientCommand>>,
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl WsConnection {
    /// Start the connection loop. Must be called inside a tokio runtime.
    pub(crate) fn open(
        settings: ConnectionSettings,
        state: StatePublisher,
        on_event: EventCallback,
    ) -> Self {
        let (sender, receiver) = unbounded();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let url = settings.url.clone();

        let task = tokio::spawn(run_connection_loop(
            settings,
            state,
            receiver,
            on_event,
            shutdown_rx,
        ));

        Self {
            url,
            sender,
            shutdown_tx,
            task,
        }
    }

    /// Get a handle for sending commands
    pub fn handle(&self) -> WsHandle {
        WsHandle::new(self.sender.clone(), self.url.clone())
    }

    /// True once the loop has stopped for good (closed or out of retries).
    pub fn is_terminated(&self) -> bool {
        self.task.is_finished()
    }

    /// Send a close frame and stop reconnecting.
    pub fn close(&self) {
        crate::log_info!("Closing WebSocket to {}", self.url);
        let _ = self.shutdown_tx.send(());
        self.sender.close_channel();
    }
}

enum SessionEnd {
    Shutdown,
    Dropped,
}

fn build_request(settings: &ConnectionSettings) -> Result<Request, String> {
    let mut request = settings
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| format!("invalid socket url {}: {}", settings.url, e))?;

    if let Some(token) = &settings.auth_token {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| format!("invalid auth token: {e}"))?;
        request.headers_mut().insert(AUTHORIZATION, value);
    }
    Ok(request)
}

fn dispatch_frame(text: &str, on_event: &EventCallback) {
    match serde_json::from_str::<WsEnvelope<ServerEvent>>(text) {
        Ok(envelope) => on_event(envelope),
        Err(e) => crate::log_warn!("Ignoring malformed event ({}): {}", e, text),
    }
}

async fn run_connection_loop(
    settings: ConnectionSettings,
    state: StatePublisher,
    mut receiver: UnboundedReceiver<WsEnvelope<ClientCommand>>,
    on_event: EventCallback,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let reconnect = settings.reconnect.clone();
    let mut attempt = 0u32;

    loop {
        if attempt == 0 {
            state.set(ConnectionState::Connecting);
        } else {
            state.set(ConnectionState::Reconnecting { attempt });
        }

        let request = match build_request(&settings) {
            Ok(request) => request,
            Err(reason) => {
                crate::log_error!("WebSocket setup failed: {}", reason);
                state.set(ConnectionState::Failed { reason });
                return;
            }
        };

        let connected = tokio::select! {
            _ = shutdown_rx.recv() => {
                state.set(ConnectionState::Disconnected);
                return;
            }
            result = connect_async(request) => result,
        };

        match connected {
            Ok((ws_stream, _response)) => {
                state.set(ConnectionState::Connected);
                attempt = 0;
                crate::log_info!("WebSocket connected to {}", settings.url);

                let (mut write, mut read) = ws_stream.split();

                let end = loop {
                    tokio::select! {
                        _ = shutdown_rx.recv() => {
                            if let Err(e) = write.send(Message::Close(None)).await {
                                crate::log_warn!("Failed to send close frame: {}", e);
                            }
                            break SessionEnd::Shutdown;
                        }
                        outgoing = receiver.next() => match outgoing {
                            Some(envelope) => match serde_json::to_string(&envelope) {
                                Ok(json) => {
                                    if let Err(e) = write.send(Message::Text(json.into())).await {
                                        crate::log_error!("Send failed: {}", e);
                                        break SessionEnd::Dropped;
                                    }
                                }
                                Err(e) => crate::log_error!("Serialize failed: {}", e),
                            },
                            None => {
                                crate::log_info!("All handles dropped, closing socket");
                                let _ = write.send(Message::Close(None)).await;
                                break SessionEnd::Shutdown;
                            }
                        },
                        incoming = read.next() => match incoming {
                            Some(Ok(Message::Text(text))) => dispatch_frame(text.as_str(), &on_event),
                            Some(Ok(Message::Close(_))) | None => {
                                crate::log_info!("WebSocket to {} closed by server", settings.url);
                                break SessionEnd::Dropped;
                            }
                            Some(Ok(_)) => {
                                // Ping/pong are answered by tungstenite; binary is unused.
                            }
                            Some(Err(e)) => {
                                crate::log_error!("WebSocket read error: {}", e);
                                break SessionEnd::Dropped;
                            }
                        },
                    }
                };

                state.set(ConnectionState::Disconnected);
                if let SessionEnd::Shutdown = end {
                    return;
                }
            }
            Err(e) => {
                crate::log_error!("WebSocket error for {}: {}", settings.url, e);
            }
        }

        if reconnect.max_attempts > 0 && attempt >= reconnect.max_attempts {
            state.set(ConnectionState::Failed {
                reason: format!(
                    "Max reconnect attempts ({}) exceeded",
                    reconnect.max_attempts
                ),
            });
            return;
        }

        let delay = reconnect.delay_for_attempt(attempt);
        attempt += 1;
        crate::log_info!(
            "Reconnecting to {} in {:?} (attempt {})",
            settings.url,
            delay,
            attempt
        );
        tokio::select! {
            _ = shutdown_rx.recv() => {
                state.set(ConnectionState::Disconnected);
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
