//! The messaging store.
//!
//! One [`MessagingStore`] exists per signed-in session. It owns the
//! [`MessagingState`] inside a `watch` channel, so views subscribe to it and
//! see every committed mutation. REST calls go through [`MessagingApi`] and
//! socket commands through [`RealtimeSink`]; both are injected.
//!
//! Mutations are short synchronous closures over the state. Nothing is held
//! across an `.await`: async operations fetch first, then re-check that the
//! result is still relevant to the selection before committing it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use souk_shared::{
    ChatMessage, ClientCommand, OutgoingContent, Participant, SendMessageRequest, ServerEvent,
    WsEnvelope,
};
use tokio::sync::watch;
use tokio::time::Instant;
use uuid::Uuid;

use super::conversations::{apply_patch, clear_unread, merge_conversations, record_activity, Activity};
use super::messages::{reconcile_messages, AttachmentRef, DeliveryState, StoredBody, StoredMessage};
use super::state::{ActiveMessages, MessagingState, Selection, TypingState};
use super::validation::{validate_file, validate_text};
use crate::api_client::{MessagingApi, OutgoingFile};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::ws::RealtimeSink;

/// Session-wide messaging state container. Cheap to clone.
#[derive(Clone)]
pub struct MessagingStore {
    inner: Arc<Inner>,
}

struct Inner {
    config: StoreConfig,
    api: Arc<dyn MessagingApi>,
    sink: Arc<dyn RealtimeSink>,
    state: watch::Sender<MessagingState>,
    /// Files of unconfirmed attachment messages, kept for retry.
    pending_files: Mutex<HashMap<String, OutgoingFile>>,
}

impl MessagingStore {
    pub fn new(config: StoreConfig, api: Arc<dyn MessagingApi>, sink: Arc<dyn RealtimeSink>) -> Self {
        let (state, _) = watch::channel(MessagingState::default());
        Self {
            inner: Arc::new(Inner {
                config,
                api,
                sink,
                state,
                pending_files: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub fn snapshot(&self) -> MessagingState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MessagingState> {
        self.inner.state.subscribe()
    }

    pub fn read<R>(&self, f: impl FnOnce(&MessagingState) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    fn update(&self, f: impl FnOnce(&mut MessagingState)) {
        self.inner.state.send_modify(f);
    }

    /// Apply `f` and notify subscribers only if it reports a change.
    fn commit(&self, f: impl FnOnce(&mut MessagingState) -> bool) -> bool {
        self.inner.state.send_if_modified(f)
    }

    // ---- Conversation list ----

    /// Fetch a page of conversations and merge it into the list.
    ///
    /// On failure the list is left as it was and the error is recorded.
    pub async fn load_conversations(&self, page: u32, limit: u32) -> Result<(), StoreError> {
        self.update(|s| s.loading_conversations = true);

        match self.inner.api.list_conversations(page, limit).await {
            Ok(response) => {
                crate::log_debug!(
                    "Loaded {} conversations (page {})",
                    response.items.len(),
                    response.page.page
                );
                self.update(|s| {
                    let selected = s.selection.as_ref().map(|sel| sel.other_user_id.as_str());
                    merge_conversations(&mut s.conversations, response.items, selected);
                    s.conversations_page = Some(response.page);
                    s.loading_conversations = false;
                    s.error = None;
                });
                Ok(())
            }
            Err(err) => Err(self.fail(err, |s| s.loading_conversations = false)),
        }
    }

    /// Load the page after the last one, if the server reported more.
    /// Returns whether a page was requested.
    pub async fn load_more_conversations(&self) -> Result<bool, StoreError> {
        let next = self.read(|s| match &s.conversations_page {
            Some(p) if p.has_more && !s.loading_conversations => Some((p.page + 1, p.limit)),
            _ => None,
        });
        let Some((page, limit)) = next else {
            return Ok(false);
        };
        self.load_conversations(page, limit).await.map(|()| true)
    }

    // ---- Selection ----

    /// Open a conversation.
    ///
    /// With a conversation id the unread count is zeroed right away, the
    /// socket subscription moves over, history page 1 is loaded and the read
    /// state is acknowledged. Without one (first contact) the history starts
    /// empty; the first send creates the conversation.
    pub async fn select_conversation(&self, mut selection: Selection) -> Result<(), StoreError> {
        let mut previous = None;
        self.update(|s| {
            if selection.conversation_id.is_none() {
                // Already talked to this participant: reuse the known id.
                selection.conversation_id = s
                    .conversations
                    .iter()
                    .find(|c| c.other_user.id == selection.other_user_id)
                    .and_then(|c| c.id.clone());
            }
            if selection.other_user.is_none() {
                selection.other_user = s
                    .conversations
                    .iter()
                    .find(|c| c.other_user.id == selection.other_user_id)
                    .map(|c| c.other_user.clone());
            }

            let same = s
                .selection
                .as_ref()
                .is_some_and(|current| current.same_target(&selection));
            if !same {
                previous = s.selected_conversation_id().map(str::to_owned);
                s.active = ActiveMessages::default();
            }
            if let Some(id) = &selection.conversation_id {
                clear_unread(&mut s.conversations, id);
            }
            s.selection = Some(selection.clone());
        });

        if let Some(old) = previous.filter(|old| selection.conversation_id.as_ref() != Some(old)) {
            self.notify(ClientCommand::Unsubscribe { conversation_id: old });
        }

        let Some(conversation_id) = selection.conversation_id else {
            crate::log_debug!("Selected new conversation with {}", selection.other_user_id);
            return Ok(());
        };
        crate::log_debug!("Selected conversation {}", conversation_id);
        self.notify(ClientCommand::Subscribe {
            conversation_id: conversation_id.clone(),
        });

        let loaded = self
            .load_messages(&conversation_id, 1, self.inner.config.page_size)
            .await;
        if !self.read(|s| s.is_selected(&conversation_id)) {
            return loaded;
        }
        let acknowledged = self.acknowledge_read(&conversation_id).await;
        loaded.and(acknowledged)
    }

    /// Close the open conversation. No backend call.
    pub fn leave_conversation(&self) {
        let mut previous = None;
        self.update(|s| {
            previous = s.selection.take().and_then(|sel| sel.conversation_id);
            s.active = ActiveMessages::default();
        });
        if let Some(conversation_id) = previous {
            self.notify(ClientCommand::Unsubscribe { conversation_id });
        }
    }

    // ---- History ----

    /// Fetch a history page and merge it into the active list.
    ///
    /// The page is dropped if `conversation_id` is no longer selected when it
    /// arrives.
    pub async fn load_messages(
        &self,
        conversation_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<(), StoreError> {
        let relevant = self.commit(|s| {
            if !s.is_selected(conversation_id) {
                return false;
            }
            s.active.loading = true;
            true
        });
        if !relevant {
            crate::log_debug!("Conversation {} is not selected, skipping history load", conversation_id);
            return Ok(());
        }

        match self.inner.api.list_messages(conversation_id, page, limit).await {
            Ok(response) => {
                let self_id = &self.inner.config.self_user_id;
                let incoming: Vec<StoredMessage> = response
                    .items
                    .into_iter()
                    .map(|m| StoredMessage::from_server(m, self_id))
                    .collect();
                let info = response.page;

                let applied = self.commit(|s| {
                    if !s.is_selected(conversation_id) {
                        return false;
                    }
                    let existing = std::mem::take(&mut s.active.messages);
                    s.active.messages = reconcile_messages(existing, incoming);
                    s.active.loading = false;
                    if s.active.page.as_ref().map_or(true, |p| info.page >= p.page) {
                        s.active.page = Some(info);
                    }
                    true
                });
                if !applied {
                    crate::log_debug!(
                        "Discarding history page {} of {}: selection moved on",
                        page,
                        conversation_id
                    );
                }
                Ok(())
            }
            Err(err) => {
                let err = StoreError::from(err);
                if self.read(|s| s.is_selected(conversation_id)) {
                    Err(self.fail(err, |s| s.active.loading = false))
                } else {
                    crate::log_debug!("Ignoring failed history load of unselected {}: {}", conversation_id, err);
                    Err(err)
                }
            }
        }
    }

    /// Load the next older history page of the open conversation.
    /// Returns whether a page was requested.
    pub async fn load_older_messages(&self) -> Result<bool, StoreError> {
        let next = self.read(|s| {
            let id = s.selected_conversation_id()?;
            let page = s.active.page.as_ref().filter(|p| p.has_more && !s.active.loading)?;
            Some((id.to_string(), page.page + 1, page.limit))
        });
        let Some((conversation_id, page, limit)) = next else {
            return Ok(false);
        };
        self.load_messages(&conversation_id, page, limit).await.map(|()| true)
    }

    // ---- Sending ----

    /// Validate, insert optimistically, then send.
    ///
    /// Returns the client id correlating the optimistic entry. A failed send
    /// leaves the entry in the list as [`DeliveryState::Failed`].
    pub async fn send_text_message(&self, body: &str) -> Result<String, StoreError> {
        let text = validate_text(body, self.inner.config.max_message_len)
            .map_err(|err| self.fail(err, |_| {}))?;
        let target = self.current_selection()?;

        let client_id = Uuid::new_v4().to_string();
        self.insert_pending(StoredMessage::pending(
            client_id.clone(),
            target.conversation_id.clone(),
            self.inner.config.self_user_id.clone(),
            StoredBody::Text(text.clone()),
        ));

        self.deliver(&client_id, &target, OutgoingContent::Text { text })
            .await?;
        Ok(client_id)
    }

    /// Upload a file and send a message referencing it.
    ///
    /// The optimistic entry points at `local://{client_id}/{name}` until the
    /// upload completes.
    pub async fn send_file_message(&self, file: OutgoingFile) -> Result<String, StoreError> {
        validate_file(&file, self.inner.config.max_attachment_bytes)
            .map_err(|err| self.fail(err, |_| {}))?;
        let target = self.current_selection()?;

        let client_id = Uuid::new_v4().to_string();
        let attachment = AttachmentRef {
            id: None,
            name: file.name.clone(),
            mime: file.mime.clone(),
            size: file.size(),
            url: None,
            local_ref: Some(format!("local://{}/{}", client_id, file.name)),
        };
        self.insert_pending(StoredMessage::pending(
            client_id.clone(),
            target.conversation_id.clone(),
            self.inner.config.self_user_id.clone(),
            StoredBody::Attachment(attachment),
        ));
        self.pending_files().insert(client_id.clone(), file.clone());

        self.upload_and_deliver(&client_id, &target, file).await?;
        Ok(client_id)
    }

    /// Send a failed message again under the same client id.
    pub async fn retry_message(&self, client_id: &str) -> Result<(), StoreError> {
        let failed = self.read(|s| {
            s.active
                .messages
                .iter()
                .find(|m| m.client_id.as_deref() == Some(client_id) && m.delivery == DeliveryState::Failed)
                .map(|m| m.body.clone())
        });
        let Some(body) = failed else {
            return Err(self.fail(StoreError::UnknownMessage(client_id.to_string()), |_| {}));
        };
        let target = self.current_selection()?;

        crate::log_info!("Retrying message {}", client_id);
        self.set_delivery(client_id, DeliveryState::Failed, DeliveryState::Pending);

        match body {
            StoredBody::Text(text) => self.deliver(client_id, &target, OutgoingContent::Text { text }).await,
            StoredBody::Attachment(AttachmentRef { id: Some(attachment_id), .. }) => {
                self.deliver(client_id, &target, OutgoingContent::File { attachment_id })
                    .await
            }
            StoredBody::Attachment(_) => {
                let file = self.pending_files().get(client_id).cloned();
                match file {
                    Some(file) => self.upload_and_deliver(client_id, &target, file).await,
                    None => Err(self.mark_failed(client_id, StoreError::UnknownMessage(client_id.to_string()))),
                }
            }
        }
    }

    /// Drop a failed message from the list.
    pub fn discard_message(&self, client_id: &str) -> Result<(), StoreError> {
        let removed = self.commit(|s| {
            let before = s.active.messages.len();
            s.active
                .messages
                .retain(|m| !(m.client_id.as_deref() == Some(client_id) && m.delivery == DeliveryState::Failed));
            s.active.messages.len() != before
        });
        if !removed {
            return Err(StoreError::UnknownMessage(client_id.to_string()));
        }
        self.pending_files().remove(client_id);
        Ok(())
    }

    /// Tell the other participant we are typing. Callers rate-limit this.
    pub fn emit_typing(&self) -> Result<(), StoreError> {
        let selection = self
            .read(|s| s.selection.clone())
            .ok_or(StoreError::NoActiveConversation)?;
        self.inner
            .sink
            .send(ClientCommand::Typing {
                conversation_id: selection.conversation_id,
                recipient_id: selection.other_user_id,
            })
            .map_err(StoreError::NotConnected)
    }

    fn insert_pending(&self, message: StoredMessage) {
        self.update(|s| {
            let existing = std::mem::take(&mut s.active.messages);
            s.active.messages = reconcile_messages(existing, vec![message]);
        });
    }

    async fn upload_and_deliver(
        &self,
        client_id: &str,
        target: &Selection,
        file: OutgoingFile,
    ) -> Result<(), StoreError> {
        let attachment = match self.inner.api.upload_attachment(&file).await {
            Ok(attachment) => attachment,
            Err(err) => return Err(self.mark_failed(client_id, err.into())),
        };
        crate::log_debug!("Uploaded {} as attachment {}", attachment.name, attachment.id);

        self.update(|s| {
            let entry = s
                .active
                .messages
                .iter_mut()
                .find(|m| m.client_id.as_deref() == Some(client_id));
            if let Some(StoredMessage { body: StoredBody::Attachment(a), .. }) = entry {
                a.id = Some(attachment.id.clone());
                a.url = Some(attachment.url.clone());
            }
        });

        self.deliver(
            client_id,
            target,
            OutgoingContent::File {
                attachment_id: attachment.id,
            },
        )
        .await
    }

    async fn deliver(
        &self,
        client_id: &str,
        target: &Selection,
        content: OutgoingContent,
    ) -> Result<(), StoreError> {
        let request = SendMessageRequest {
            conversation_id: target.conversation_id.clone(),
            recipient_id: target.other_user_id.clone(),
            content,
            client_id: client_id.to_string(),
        };

        match self.inner.api.send_message(&request).await {
            Ok(mut message) => {
                message.client_id.get_or_insert_with(|| client_id.to_string());
                self.pending_files().remove(client_id);
                self.ingest_message(message, Some(counterpart_of(target)));
                Ok(())
            }
            Err(err) => Err(self.mark_failed(client_id, err.into())),
        }
    }

    // ---- Read state ----

    /// Zero the unread count of the open conversation and acknowledge it.
    pub async fn mark_current_as_read(&self) -> Result<(), StoreError> {
        let selection = self.current_selection()?;
        match selection.conversation_id {
            Some(conversation_id) => self.acknowledge_read(&conversation_id).await,
            // Nothing to acknowledge before the first message.
            None => Ok(()),
        }
    }

    async fn acknowledge_read(&self, conversation_id: &str) -> Result<(), StoreError> {
        self.commit(|s| {
            let unread = s
                .conversations
                .iter()
                .any(|c| c.id.as_deref() == Some(conversation_id) && c.unread_count > 0);
            clear_unread(&mut s.conversations, conversation_id);
            unread
        });

        self.inner
            .api
            .mark_read(conversation_id)
            .await
            .map_err(|err| self.fail(err, |_| {}))
    }

    /// Re-read the unread summary from the backend and return the badge total.
    ///
    /// Counts for conversations not in the list yet are kept aside so the
    /// badge includes them. On failure the badge falls back to the listed sum.
    pub async fn refresh_unread_count(&self) -> Result<u32, StoreError> {
        match self.inner.api.unread_summary().await {
            Ok(summary) => {
                let mut total = 0;
                self.update(|s| {
                    if summary.conversations.is_empty() {
                        let listed = s
                            .conversations
                            .iter()
                            .fold(0u32, |acc, c| acc.saturating_add(c.unread_count));
                        s.unlisted_unread = summary.total.saturating_sub(listed);
                    } else {
                        let selected = s.selected_conversation_id().map(str::to_owned);
                        for conversation in &mut s.conversations {
                            conversation.unread_count = 0;
                        }
                        let mut unlisted = 0u32;
                        for entry in summary.conversations {
                            if selected.as_deref() == Some(entry.conversation_id.as_str()) {
                                continue;
                            }
                            match s
                                .conversations
                                .iter_mut()
                                .find(|c| c.id.as_deref() == Some(entry.conversation_id.as_str()))
                            {
                                Some(conversation) => conversation.unread_count = entry.unread_count,
                                None => unlisted = unlisted.saturating_add(entry.unread_count),
                            }
                        }
                        s.unlisted_unread = unlisted;
                    }
                    total = s.unread_total();
                });
                Ok(total)
            }
            Err(err) => Err(self.fail(err, |s| s.unlisted_unread = 0)),
        }
    }

    // ---- Inbound events ----

    /// Apply one inbound socket event. Events that do not fit the current
    /// state are logged and ignored.
    pub fn handle_event(&self, envelope: WsEnvelope<ServerEvent>) {
        match envelope.payload {
            ServerEvent::MessageNew {
                conversation_id,
                message,
            } => {
                if message.conversation_id != conversation_id {
                    crate::log_warn!(
                        "Ignoring message {} filed under {} but addressed to {}",
                        message.id,
                        conversation_id,
                        message.conversation_id
                    );
                    return;
                }
                self.ingest_message(message, None);
            }
            ServerEvent::Ack { client_id, mut message } => {
                message.client_id.get_or_insert(client_id);
                self.ingest_message(message, None);
            }
            ServerEvent::Typing {
                conversation_id,
                user_id,
                is_typing,
            } => self.apply_typing(conversation_id, user_id, is_typing),
            ServerEvent::ConversationUpdated {
                conversation_id,
                patch,
            } => {
                let known = self.commit(|s| {
                    let selected = s.is_selected(&conversation_id);
                    let known = apply_patch(&mut s.conversations, &conversation_id, patch);
                    if known && selected {
                        clear_unread(&mut s.conversations, &conversation_id);
                    }
                    known
                });
                if !known {
                    crate::log_debug!("Patch for unlisted conversation {} ignored", conversation_id);
                }
            }
            ServerEvent::Error {
                code,
                message,
                correlation_id,
            } => {
                crate::log_warn!("Realtime server error {}: {}", code, message);
                let error = StoreError::Server { code, message };
                match correlation_id {
                    Some(client_id) => {
                        self.mark_failed(&client_id, error);
                    }
                    None => self.update(|s| s.error = Some(error)),
                }
            }
        }
    }

    /// Record a confirmed or pushed message everywhere it shows up.
    ///
    /// `counterpart` is the other participant when the caller knows it (our
    /// own REST send); otherwise it is derived from the message.
    fn ingest_message(&self, message: ChatMessage, counterpart: Option<Participant>) {
        let self_id = self.inner.config.self_user_id.as_str();
        let from_self = message.sender_id == self_id;
        let counterpart = counterpart.or_else(|| {
            if from_self {
                message.recipient_id.clone().map(Participant::unknown)
            } else {
                Some(Participant {
                    id: message.sender_id.clone(),
                    display_name: message
                        .sender_name
                        .clone()
                        .unwrap_or_else(|| message.sender_id.clone()),
                    avatar: None,
                })
            }
        });

        let mut adopted = None;
        self.update(|s| {
            let conversation_id = message.conversation_id.as_str();

            // First message of a new conversation: the selection learns its id.
            if let Some(selection) = s.selection.as_mut() {
                let matches_target = counterpart
                    .as_ref()
                    .is_some_and(|c| c.id == selection.other_user_id);
                let owns_pending = message.client_id.as_deref().is_some_and(|cid| {
                    s.active
                        .messages
                        .iter()
                        .any(|m| m.client_id.as_deref() == Some(cid))
                });
                if selection.conversation_id.is_none() && (matches_target || owns_pending) {
                    selection.conversation_id = Some(conversation_id.to_string());
                    for pending in &mut s.active.messages {
                        pending
                            .conversation_id
                            .get_or_insert_with(|| conversation_id.to_string());
                    }
                    adopted = Some(conversation_id.to_string());
                }
            }

            let selected = s.is_selected(conversation_id);
            let participant = match s.selection.as_ref() {
                Some(sel) if selected && sel.other_user.is_some() => sel.other_user.clone(),
                _ => counterpart.clone(),
            };
            let recorded = record_activity(
                &mut s.conversations,
                Activity {
                    conversation_id,
                    participant,
                    preview: message.content.preview(),
                    at: message.created_at,
                    bump_unread: !from_self && !selected,
                },
            );
            if !recorded {
                crate::log_debug!("No list entry for conversation {}", conversation_id);
            }

            if !from_self
                && s
                    .typing
                    .get(conversation_id)
                    .is_some_and(|t| t.user_id == message.sender_id)
            {
                s.typing.remove(conversation_id);
            }

            if selected {
                let existing = std::mem::take(&mut s.active.messages);
                s.active.messages = reconcile_messages(
                    existing,
                    vec![StoredMessage::from_server(message.clone(), self_id)],
                );
            }
        });

        if let Some(conversation_id) = adopted {
            crate::log_info!("Conversation {} created", conversation_id);
            self.notify(ClientCommand::Subscribe { conversation_id });
        }
    }

    fn apply_typing(&self, conversation_id: String, user_id: String, is_typing: bool) {
        if user_id == self.inner.config.self_user_id {
            return;
        }
        if !is_typing {
            self.commit(|s| s.typing.remove(&conversation_id).is_some());
            return;
        }

        let expires_at = Instant::now() + self.inner.config.typing_timeout;
        self.update(|s| {
            s.typing
                .insert(conversation_id.clone(), TypingState { user_id, expires_at });
        });
        self.schedule_typing_expiry(conversation_id, expires_at);
    }

    /// Clear the indicator at `expires_at` unless it was renewed meanwhile.
    fn schedule_typing_expiry(&self, conversation_id: String, expires_at: Instant) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            // Without a runtime the indicator still expires on read.
            return;
        };
        let inner = Arc::downgrade(&self.inner);
        runtime.spawn(async move {
            tokio::time::sleep_until(expires_at).await;
            let Some(inner) = inner.upgrade() else {
                return;
            };
            inner.state.send_if_modified(|s| match s.typing.get(&conversation_id) {
                Some(typing) if typing.expires_at <= expires_at => {
                    s.typing.remove(&conversation_id);
                    true
                }
                _ => false,
            });
        });
    }

    // ---- Teardown ----

    /// Forget everything (logout).
    pub fn reset(&self) {
        self.pending_files().clear();
        self.inner.state.send_replace(MessagingState::default());
    }

    // ---- Helpers ----

    fn current_selection(&self) -> Result<Selection, StoreError> {
        match self.read(|s| s.selection.clone()) {
            Some(selection) => Ok(selection),
            None => Err(self.fail(StoreError::NoActiveConversation, |_| {})),
        }
    }

    /// Best-effort socket command; the connector logs and retries transport
    /// failures on its own.
    fn notify(&self, command: ClientCommand) {
        if let Err(reason) = self.inner.sink.send(command) {
            crate::log_warn!("Realtime command dropped: {}", reason);
        }
    }

    fn set_delivery(&self, client_id: &str, from: DeliveryState, to: DeliveryState) -> bool {
        self.commit(|s| {
            match s
                .active
                .messages
                .iter_mut()
                .find(|m| m.client_id.as_deref() == Some(client_id) && m.delivery == from)
            {
                Some(message) => {
                    message.delivery = to;
                    true
                }
                None => false,
            }
        })
    }

    /// Flag a pending send as failed. If the entry is gone (the selection
    /// moved on) the error is only logged and returned.
    fn mark_failed(&self, client_id: &str, error: StoreError) -> StoreError {
        if self.set_delivery(client_id, DeliveryState::Pending, DeliveryState::Failed) {
            return self.fail(error, |_| {});
        }
        crate::log_debug!("Send {} failed after its entry left the list: {}", client_id, error);
        error
    }

    fn fail(
        &self,
        error: impl Into<StoreError>,
        cleanup: impl FnOnce(&mut MessagingState),
    ) -> StoreError {
        let error = error.into();
        crate::log_warn!("Messaging operation failed: {}", error);
        let recorded = error.clone();
        self.update(move |s| {
            cleanup(s);
            s.error = Some(recorded);
        });
        error
    }

    fn pending_files(&self) -> std::sync::MutexGuard<'_, HashMap<String, OutgoingFile>> {
        self.inner
            .pending_files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn counterpart_of(selection: &Selection) -> Participant {
    selection
        .other_user
        .clone()
        .unwrap_or_else(|| Participant::unknown(selection.other_user_id.clone()))
}
