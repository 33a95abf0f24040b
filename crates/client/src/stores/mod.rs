//! Messaging state and the store that owns it.

pub mod conversations;
pub mod messages;
pub mod messaging;
pub mod state;
pub mod validation;

pub use messages::{reconcile_messages, AttachmentRef, DeliveryState, StoredBody, StoredMessage};
pub use messaging::MessagingStore;
pub use state::{ActiveMessages, MessagingState, Selection, TypingState};
