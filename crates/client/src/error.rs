//! Errors surfaced by the messaging store.

use souk_shared::ApiError;
use thiserror::Error;

/// Input rejected before it reaches the message list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("message is {len} characters, limit is {max}")]
    MessageTooLong { len: usize, max: usize },
    #[error("attachment has no file name")]
    MissingFileName,
    #[error("attachment is empty")]
    EmptyAttachment,
    #[error("attachment is {size} bytes, limit is {max}")]
    AttachmentTooLarge { size: u64, max: u64 },
}

/// Store-level error. Kept `Clone + PartialEq` so it can sit in the state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no conversation is selected")]
    NoActiveConversation,
    #[error("realtime connection unavailable: {0}")]
    NotConnected(String),
    #[error("no failed message with client id {0}")]
    UnknownMessage(String),
    /// An `error` event pushed by the realtime server.
    #[error("server error {code}: {message}")]
    Server { code: String, message: String },
}
