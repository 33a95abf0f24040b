//! Messages of the active conversation and the one merge routine that
//! touches them.
//!
//! Both REST history pages and socket pushes land in the same list, in any
//! order. Every insertion goes through [`reconcile_messages`], so the list
//! stays sorted by `created_at` ascending with no duplicate ids, and an
//! optimistic entry is replaced (never duplicated) by its confirmed copy.

use chrono::{DateTime, Utc};
use souk_shared::{ChatMessage, MessageContent};

/// Delivery state of a message as seen by this client.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeliveryState {
    /// Optimistically inserted, send in flight.
    Pending,
    /// Our own message, confirmed by the server.
    Sent,
    /// Send failed; stays visible until retried or discarded.
    Failed,
    /// Someone else's message.
    Delivered,
}

/// Attachment as shown in the list; the server fields are filled in once
/// the upload completes.
#[derive(Clone, PartialEq, Debug)]
pub struct AttachmentRef {
    pub id: Option<String>,
    pub name: String,
    pub mime: String,
    pub size: u64,
    pub url: Option<String>,
    /// Local reference used while the file is not uploaded yet.
    pub local_ref: Option<String>,
}

#[derive(Clone, PartialEq, Debug)]
pub enum StoredBody {
    Text(String),
    Attachment(AttachmentRef),
}

impl StoredBody {
    pub fn preview(&self) -> String {
        match self {
            StoredBody::Text(text) => text.clone(),
            StoredBody::Attachment(attachment) => format!("📎 {}", attachment.name),
        }
    }
}

impl From<MessageContent> for StoredBody {
    fn from(content: MessageContent) -> Self {
        match content {
            MessageContent::Text { text } => StoredBody::Text(text),
            MessageContent::File { attachment } => StoredBody::Attachment(AttachmentRef {
                id: Some(attachment.id),
                name: attachment.name,
                mime: attachment.mime,
                size: attachment.size,
                url: Some(attachment.url),
                local_ref: None,
            }),
        }
    }
}

/// A message stored in the messaging store.
/// This is a unified format for optimistic entries, REST history and socket pushes.
#[derive(Clone, PartialEq, Debug)]
pub struct StoredMessage {
    /// Server id, absent while the message is in flight.
    pub id: Option<String>,
    /// Correlation id of a message sent from this client.
    pub client_id: Option<String>,
    pub conversation_id: Option<String>,
    pub sender_id: String,
    pub body: StoredBody,
    pub created_at: DateTime<Utc>,
    pub delivery: DeliveryState,
}

impl StoredMessage {
    /// Optimistic entry for a message we are about to send.
    pub fn pending(
        client_id: impl Into<String>,
        conversation_id: Option<String>,
        sender_id: impl Into<String>,
        body: StoredBody,
    ) -> Self {
        Self {
            id: None,
            client_id: Some(client_id.into()),
            conversation_id,
            sender_id: sender_id.into(),
            body,
            created_at: Utc::now(),
            delivery: DeliveryState::Pending,
        }
    }

    pub fn from_server(message: ChatMessage, self_user_id: &str) -> Self {
        let delivery = if message.sender_id == self_user_id {
            DeliveryState::Sent
        } else {
            DeliveryState::Delivered
        };
        Self {
            id: Some(message.id),
            client_id: message.client_id,
            conversation_id: Some(message.conversation_id),
            sender_id: message.sender_id,
            body: message.content.into(),
            created_at: message.created_at,
            delivery,
        }
    }

    /// Stable key for rendering and tie-breaking: server id, else client id.
    pub fn key(&self) -> &str {
        self.id
            .as_deref()
            .or(self.client_id.as_deref())
            .unwrap_or_default()
    }

    fn same_client_id(&self, other: &StoredMessage) -> bool {
        matches!((&self.client_id, &other.client_id), (Some(a), Some(b)) if a == b)
    }

    fn same_id(&self, other: &StoredMessage) -> bool {
        matches!((&self.id, &other.id), (Some(a), Some(b)) if a == b)
    }
}

/// Merge `incoming` into `existing`.
///
/// An incoming message replaces the entry with the same client id, else the
/// entry with the same server id, else it is appended. Other entries holding
/// the server id of a replacement are dropped. The result is sorted
/// by `created_at` ascending (ties by key) regardless of arrival order.
pub fn reconcile_messages(
    existing: Vec<StoredMessage>,
    incoming: Vec<StoredMessage>,
) -> Vec<StoredMessage> {
    let mut merged = existing;

    for message in incoming {
        let slot = merged
            .iter()
            .position(|m| m.same_client_id(&message))
            .or_else(|| merged.iter().position(|m| m.same_id(&message)));

        match slot {
            Some(pos) => {
                let replacement = merge_entry(&merged[pos], message);
                let server_id = replacement.id.clone();
                merged[pos] = replacement;
                // A copy of the same message may already sit elsewhere
                // without its client id (broadcast or history page).
                if let Some(server_id) = server_id {
                    let mut index = 0;
                    merged.retain(|m| {
                        let keep = index == pos || m.id.as_deref() != Some(server_id.as_str());
                        index += 1;
                        keep
                    });
                }
            }
            None => merged.push(message),
        }
    }

    merged.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.key().cmp(b.key()))
    });
    merged
}

/// The incoming copy wins, except for client-only details the server does
/// not echo on history pages.
fn merge_entry(current: &StoredMessage, mut incoming: StoredMessage) -> StoredMessage {
    if incoming.client_id.is_none() {
        incoming.client_id = current.client_id.clone();
    }
    if incoming.id.is_none() {
        incoming.id = current.id.clone();
    }
    if let (StoredBody::Attachment(new), StoredBody::Attachment(old)) =
        (&mut incoming.body, &current.body)
    {
        if new.local_ref.is_none() {
            new.local_ref = old.local_ref.clone();
        }
    }
    incoming
}
