//! Read-only projections for the messaging views.

use souk_shared::Conversation;

use super::selector::Selector;
use crate::error::StoreError;
use crate::stores::{MessagingState, MessagingStore, Selection, StoredMessage};

/// How many unread conversations the floating widget previews.
pub const RECENT_UNREAD_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatListView {
    pub conversations: Vec<Conversation>,
    pub loading: bool,
    pub has_more: bool,
    pub error: Option<StoreError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatView {
    pub selection: Option<Selection>,
    pub messages: Vec<StoredMessage>,
    pub loading: bool,
    pub has_more: bool,
    /// Id of the participant currently typing, if any.
    pub typing: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetView {
    pub unread_total: u32,
    pub selection: Option<Selection>,
    pub recent_unread: Vec<Conversation>,
}

/// Conversation list with its loading flags.
pub fn use_chat_list(store: &MessagingStore) -> Selector<ChatListView> {
    Selector::new(store.subscribe(), |s| ChatListView {
        conversations: s.conversations.clone(),
        loading: s.loading_conversations,
        has_more: s.has_more_conversations(),
        error: s.error.clone(),
    })
}

/// The open conversation.
pub fn use_chat_view(store: &MessagingStore) -> Selector<ChatView> {
    Selector::new(store.subscribe(), |s| ChatView {
        selection: s.selection.clone(),
        messages: s.active.messages.clone(),
        loading: s.active.loading,
        has_more: s.active.has_more(),
        typing: selected_typing(s),
    })
}

/// Global unread count.
pub fn use_unread_badge(store: &MessagingStore) -> Selector<u32> {
    Selector::new(store.subscribe(), MessagingState::unread_total)
}

pub fn use_floating_widget(store: &MessagingStore) -> Selector<WidgetView> {
    Selector::new(store.subscribe(), |s| WidgetView {
        unread_total: s.unread_total(),
        selection: s.selection.clone(),
        recent_unread: s
            .conversations
            .iter()
            .filter(|c| c.unread_count > 0)
            .take(RECENT_UNREAD_LIMIT)
            .cloned()
            .collect(),
    })
}

/// Who is typing in one conversation.
pub fn use_typing(store: &MessagingStore, conversation_id: impl Into<String>) -> Selector<Option<String>> {
    let conversation_id = conversation_id.into();
    Selector::new(store.subscribe(), move |s| {
        s.typing_in(&conversation_id).map(|t| t.user_id.clone())
    })
}

fn selected_typing(state: &MessagingState) -> Option<String> {
    let id = state.selected_conversation_id()?;
    state.typing_in(id).map(|t| t.user_id.clone())
}
