//! Real-time protocol spoken on the `/messaging` socket namespace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ChatMessage, ConversationPatch};

/// Namespace path appended to the socket base URL.
pub const MESSAGING_NAMESPACE: &str = "/messaging";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsEnvelope<T> {
    pub id: String,
    #[serde(flatten)]
    pub payload: T,
    pub ts: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl<T> WsEnvelope<T> {
    pub fn new(payload: T) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            payload,
            ts: Utc::now(),
            correlation_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientCommand {
    Subscribe {
        conversation_id: String,
    },
    Unsubscribe {
        conversation_id: String,
    },
    Typing {
        /// Absent while the conversation is still pending.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        conversation_id: Option<String>,
        recipient_id: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    #[serde(rename = "message.new")]
    MessageNew {
        conversation_id: String,
        message: ChatMessage,
    },
    Typing {
        conversation_id: String,
        user_id: String,
        #[serde(default = "default_is_typing")]
        is_typing: bool,
    },
    #[serde(rename = "conversation.updated")]
    ConversationUpdated {
        conversation_id: String,
        patch: ConversationPatch,
    },
    /// Server confirmation of a send, correlated by the client id.
    Ack {
        client_id: String,
        message: ChatMessage,
    },
    Error {
        code: String,
        message: String,
        #[serde(default)]
        correlation_id: Option<String>,
    },
}

fn default_is_typing() -> bool {
    true
}
