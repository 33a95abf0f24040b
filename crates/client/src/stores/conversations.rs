//! Conversation list maintenance.
//!
//! The list holds at most one entry per other participant and is kept
//! sorted by last activity, newest first.

use chrono::{DateTime, Utc};
use souk_shared::{Conversation, ConversationPatch, Participant};

/// Newest activity first; ties broken by participant id so the order is stable.
pub fn sort_conversations(list: &mut [Conversation]) {
    list.sort_by(|a, b| {
        b.last_activity_at
            .cmp(&a.last_activity_at)
            .then_with(|| a.other_user.id.cmp(&b.other_user.id))
    });
}

/// Merge a fetched page into the list, replacing entries by participant id.
///
/// Entries missing from the page are kept. A local entry that saw newer
/// activity (from a socket push) than the fetched copy keeps its preview and
/// timestamp. The selected conversation stays read.
pub fn merge_conversations(
    list: &mut Vec<Conversation>,
    page: Vec<Conversation>,
    selected_user_id: Option<&str>,
) {
    for mut incoming in page {
        if selected_user_id == Some(incoming.other_user.id.as_str()) {
            incoming.unread_count = 0;
        }

        match list
            .iter()
            .position(|c| c.other_user.id == incoming.other_user.id)
        {
            Some(pos) => {
                let current = &list[pos];
                if current.last_activity_at > incoming.last_activity_at {
                    incoming.last_activity_at = current.last_activity_at;
                    incoming.last_message_preview = current.last_message_preview.clone();
                }
                if incoming.id.is_none() {
                    incoming.id = current.id.clone();
                }
                list[pos] = incoming;
            }
            None => list.push(incoming),
        }
    }
    sort_conversations(list);
}

/// A message seen for a conversation: what to record in the list.
pub struct Activity<'a> {
    pub conversation_id: &'a str,
    /// Needed to create the entry when the conversation is not listed yet.
    pub participant: Option<Participant>,
    pub preview: String,
    pub at: DateTime<Utc>,
    pub bump_unread: bool,
}

/// Update (or create) the entry a message belongs to and re-sort.
///
/// Returns `false` when the conversation is unknown and no participant was
/// given to create it.
pub fn record_activity(list: &mut Vec<Conversation>, activity: Activity<'_>) -> bool {
    let pos = list
        .iter()
        .position(|c| c.id.as_deref() == Some(activity.conversation_id))
        .or_else(|| {
            let participant = activity.participant.as_ref()?;
            list.iter()
                .position(|c| c.other_user.id == participant.id)
        });

    let entry = match pos {
        Some(pos) => &mut list[pos],
        None => {
            let Some(participant) = activity.participant else {
                return false;
            };
            list.push(Conversation {
                id: Some(activity.conversation_id.to_string()),
                other_user: participant,
                last_message_preview: None,
                last_activity_at: activity.at,
                unread_count: 0,
            });
            let last = list.len() - 1;
            &mut list[last]
        }
    };

    if entry.id.is_none() {
        entry.id = Some(activity.conversation_id.to_string());
    }
    if activity.at >= entry.last_activity_at || entry.last_message_preview.is_none() {
        entry.last_activity_at = entry.last_activity_at.max(activity.at);
        entry.last_message_preview = Some(activity.preview);
    }
    if activity.bump_unread {
        entry.unread_count = entry.unread_count.saturating_add(1);
    }

    sort_conversations(list);
    true
}

/// Merge a server-pushed patch into the entry. Returns `false` if unknown.
pub fn apply_patch(
    list: &mut [Conversation],
    conversation_id: &str,
    patch: ConversationPatch,
) -> bool {
    let Some(entry) = list
        .iter_mut()
        .find(|c| c.id.as_deref() == Some(conversation_id))
    else {
        return false;
    };

    if let Some(name) = patch.display_name {
        entry.other_user.display_name = name;
    }
    if let Some(avatar) = patch.avatar {
        entry.other_user.avatar = Some(avatar);
    }
    if let Some(preview) = patch.last_message_preview {
        entry.last_message_preview = Some(preview);
    }
    if let Some(unread) = patch.unread_count {
        entry.unread_count = unread;
    }
    let resort = match patch.last_activity_at {
        Some(at) if at != entry.last_activity_at => {
            entry.last_activity_at = at;
            true
        }
        _ => false,
    };

    if resort {
        sort_conversations(list);
    }
    true
}

/// Zero the unread counter of a conversation. Idempotent.
pub fn clear_unread(list: &mut [Conversation], conversation_id: &str) {
    if let Some(entry) = list
        .iter_mut()
        .find(|c| c.id.as_deref() == Some(conversation_id))
    {
        entry.unread_count = 0;
    }
}
