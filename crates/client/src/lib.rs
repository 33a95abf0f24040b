//! Souk messaging client core.
//!
//! The real-time messaging layer of the souk front-end: a socket
//! [`Connector`](ws::Connector), the [`MessagingStore`] holding all messaging
//! state, and read-only [`hooks`] for the views. A [`MessagingSession`] wires
//! them together for one signed-in user.

#[macro_use]
pub mod logging;

pub mod api_client;
pub mod config;
pub mod error;
pub mod hooks;
pub mod session;
pub mod stores;
pub mod ws;

pub use api_client::{ApiClient, MessagingApi, OutgoingFile};
pub use config::{ClientConfig, StoreConfig};
pub use error::{StoreError, ValidationError};
pub use session::MessagingSession;
pub use stores::{MessagingState, MessagingStore, Selection};
