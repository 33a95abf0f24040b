//! souk-tail - follow souk conversations from a terminal.
//!
//! Usage: `souk-tail <user-id> [other-user-id]`
//!
//! Lists the conversations of `<user-id>`. With an `other-user-id`, opens
//! that conversation and prints messages, typing and connection changes
//! until interrupted.

use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use souk_client::hooks::{use_chat_list, use_chat_view, use_connection_state, use_unread_badge};
use souk_client::logging::init_tracing;
use souk_client::stores::{DeliveryState, StoredMessage};
use souk_client::{ClientConfig, MessagingSession, Selection};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("souk_client=info");

    let mut args = std::env::args().skip(1);
    let user_id = match args.next().or_else(|| std::env::var("SOUK_USER_ID").ok()) {
        Some(id) => id,
        None => bail!("usage: souk-tail <user-id> [other-user-id]"),
    };
    let other_user_id = args.next();

    let config = ClientConfig::from_env(user_id);
    let page_size = config.store.page_size;
    let session = MessagingSession::start(config);
    let store = session.store().clone();

    store
        .load_conversations(1, page_size)
        .await
        .context("loading conversations")?;
    let list = use_chat_list(&store);
    for conversation in &list.current().conversations {
        println!(
            "{:>4}  {:<24} {}",
            conversation.unread_count,
            conversation.other_user.display_name,
            conversation.last_message_preview.as_deref().unwrap_or("")
        );
    }
    if let Err(err) = store.refresh_unread_count().await {
        souk_client::log_warn!("Unread summary unavailable: {}", err);
    }
    println!("unread: {}", *use_unread_badge(&store).current());

    let Some(other_user_id) = other_user_id else {
        return Ok(());
    };

    session.connect();
    store
        .select_conversation(Selection {
            conversation_id: None,
            other_user_id,
            other_user: None,
        })
        .await
        .context("opening conversation")?;

    let mut chat = use_chat_view(&store);
    let mut connection = use_connection_state(session.connector());
    let mut printed = HashSet::new();
    print_new(&chat.current().messages, &mut printed);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = connection.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("-- {:?}", *connection.borrow_and_update());
            }
            view = chat.changed() => {
                let Some(view) = view else { break };
                print_new(&view.messages, &mut printed);
                if let Some(user) = view.typing {
                    println!("-- {user} is typing");
                }
            }
        }
    }

    session.logout();
    Ok(())
}

fn print_new(messages: &[StoredMessage], printed: &mut HashSet<String>) {
    for message in unseen(messages, printed) {
        let marker = match message.delivery {
            DeliveryState::Pending => "…",
            DeliveryState::Failed => "!",
            DeliveryState::Sent | DeliveryState::Delivered => " ",
        };
        println!(
            "{} [{}] {}: {}",
            marker,
            message.created_at.format("%H:%M"),
            message.sender_id,
            message.body.preview()
        );
    }
}

/// Messages not seen before, in list order. Both ids of a message are
/// remembered so a confirmed optimistic entry is not reported twice.
fn unseen<'a>(messages: &'a [StoredMessage], seen: &mut HashSet<String>) -> Vec<&'a StoredMessage> {
    messages
        .iter()
        .filter(|message| {
            let known = [message.id.as_ref(), message.client_id.as_ref()]
                .into_iter()
                .flatten()
                .any(|key| seen.contains(key));
            seen.extend(message.id.iter().chain(message.client_id.iter()).cloned());
            !known
        })
        .collect()
}
