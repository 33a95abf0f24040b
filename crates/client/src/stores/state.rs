//! The messaging state held by the store.

use std::collections::HashMap;

use souk_shared::{Conversation, PageInfo, Participant};
use tokio::time::Instant;

use super::messages::StoredMessage;
use crate::error::StoreError;

/// Which conversation the user has open.
///
/// `conversation_id` is `None` when no conversation exists yet with this
/// participant; the first send creates it server-side.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub conversation_id: Option<String>,
    pub other_user_id: String,
    pub other_user: Option<Participant>,
}

impl Selection {
    pub fn conversation(conversation_id: impl Into<String>, other_user_id: impl Into<String>) -> Self {
        Self {
            conversation_id: Some(conversation_id.into()),
            other_user_id: other_user_id.into(),
            other_user: None,
        }
    }

    /// Selection for a participant we have not talked to yet.
    pub fn pending(other_user: Participant) -> Self {
        Self {
            conversation_id: None,
            other_user_id: other_user.id.clone(),
            other_user: Some(other_user),
        }
    }

    pub fn is_conversation(&self, conversation_id: &str) -> bool {
        self.conversation_id.as_deref() == Some(conversation_id)
    }

    /// One conversation per participant, so the participant identifies it.
    pub fn same_target(&self, other: &Selection) -> bool {
        self.other_user_id == other.other_user_id
    }
}

/// Message history of the selected conversation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveMessages {
    /// Sorted by `created_at` ascending, no duplicate ids.
    pub messages: Vec<StoredMessage>,
    pub loading: bool,
    /// Deepest history page loaded so far.
    pub page: Option<PageInfo>,
}

impl ActiveMessages {
    pub fn has_more(&self) -> bool {
        self.page.as_ref().is_some_and(|p| p.has_more)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypingState {
    pub user_id: String,
    pub expires_at: Instant,
}

impl TypingState {
    pub fn is_live(&self) -> bool {
        self.expires_at > Instant::now()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagingState {
    /// Newest activity first, one entry per participant.
    pub conversations: Vec<Conversation>,
    pub conversations_page: Option<PageInfo>,
    pub loading_conversations: bool,
    pub selection: Option<Selection>,
    pub active: ActiveMessages,
    /// Keyed by conversation id.
    pub typing: HashMap<String, TypingState>,
    /// Unread messages in conversations that are not listed yet.
    pub unlisted_unread: u32,
    pub error: Option<StoreError>,
}

impl MessagingState {
    pub fn selected_conversation_id(&self) -> Option<&str> {
        self.selection.as_ref()?.conversation_id.as_deref()
    }

    pub fn is_selected(&self, conversation_id: &str) -> bool {
        self.selected_conversation_id() == Some(conversation_id)
    }

    pub fn has_more_conversations(&self) -> bool {
        self.conversations_page
            .as_ref()
            .is_some_and(|p| p.has_more)
    }

    /// Global unread badge.
    pub fn unread_total(&self) -> u32 {
        self.conversations
            .iter()
            .fold(self.unlisted_unread, |acc, c| acc.saturating_add(c.unread_count))
    }

    /// Who is typing in a conversation, if the indicator has not expired.
    pub fn typing_in(&self, conversation_id: &str) -> Option<&TypingState> {
        self.typing.get(conversation_id).filter(|t| t.is_live())
    }
}
