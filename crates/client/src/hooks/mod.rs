//! View binding hooks.
//!
//! Views never touch the store's state directly. They hold a [`Selector`]
//! over the slice they render and call store operations through
//! [`MessagingActions`]. No business logic lives here.

mod actions;
mod selector;
mod views;

pub use actions::{MessagingActions, TypingThrottle, DEFAULT_TYPING_INTERVAL};
pub use selector::Selector;
pub use views::{
    use_chat_list, use_chat_view, use_floating_widget, use_typing, use_unread_badge, ChatListView,
    ChatView, WidgetView, RECENT_UNREAD_LIMIT,
};

pub use crate::ws::use_connection_state;

use crate::stores::MessagingStore;

/// Action dispatchers bound to `store`, with the default typing throttle.
pub fn use_messaging_actions(store: &MessagingStore) -> MessagingActions {
    MessagingActions::new(store.clone(), TypingThrottle::default())
}
