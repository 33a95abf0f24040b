//! In-memory collaborators for driving the store in tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use souk_client::ws::RealtimeSink;
use souk_client::{MessagingApi, MessagingStore, OutgoingFile, StoreConfig};
use souk_shared::{
    ApiError, Attachment, ChatMessage, ClientCommand, Conversation, MessageContent,
    OutgoingContent, PageInfo, PagedResponse, Participant, SendMessageRequest, ServerEvent,
    UnreadSummary, WsEnvelope,
};
use tokio::sync::oneshot;

pub const ME: &str = "me";

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn conversation(id: &str, user: &str, secs: i64, unread: u32) -> Conversation {
    Conversation {
        id: Some(id.into()),
        other_user: Participant {
            id: user.into(),
            display_name: format!("User {user}"),
            avatar: None,
        },
        last_message_preview: Some(format!("earlier in {id}")),
        last_activity_at: at(secs),
        unread_count: unread,
    }
}

pub fn text_message(id: &str, conversation_id: &str, sender: &str, secs: i64) -> ChatMessage {
    ChatMessage {
        id: id.into(),
        conversation_id: conversation_id.into(),
        sender_id: sender.into(),
        sender_name: None,
        recipient_id: None,
        content: MessageContent::Text {
            text: format!("text of {id}"),
        },
        created_at: at(secs),
        client_id: None,
    }
}

pub fn event(payload: ServerEvent) -> WsEnvelope<ServerEvent> {
    WsEnvelope::new(payload)
}

pub fn new_message(message: ChatMessage) -> WsEnvelope<ServerEvent> {
    event(ServerEvent::MessageNew {
        conversation_id: message.conversation_id.clone(),
        message,
    })
}

pub fn typing(conversation_id: &str, user_id: &str) -> WsEnvelope<ServerEvent> {
    event(ServerEvent::Typing {
        conversation_id: conversation_id.into(),
        user_id: user_id.into(),
        is_typing: true,
    })
}

fn paginate<T: Clone>(items: &[T], page: u32, limit: u32) -> PagedResponse<T> {
    let limit = limit.max(1);
    let start = (page.saturating_sub(1) * limit) as usize;
    let chunk: Vec<T> = items.iter().skip(start).take(limit as usize).cloned().collect();
    PagedResponse {
        items: chunk,
        page: PageInfo {
            page,
            limit,
            total: items.len() as u64,
            has_more: start + (limit as usize) < items.len(),
        },
    }
}

/// Scriptable [`MessagingApi`] that records every call.
#[derive(Default)]
pub struct FakeApi {
    pub conversations: Mutex<Vec<Conversation>>,
    /// Full history per conversation; pages are served newest first.
    pub history: Mutex<HashMap<String, Vec<ChatMessage>>>,
    pub unread: Mutex<Option<UnreadSummary>>,
    pub fail_list: AtomicBool,
    pub fail_send: AtomicBool,
    pub fail_upload: AtomicBool,
    /// Conversation id assigned to sends without one.
    pub new_conversation_id: Mutex<Option<String>>,
    pub calls: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<SendMessageRequest>>,
    pub uploads: Mutex<Vec<OutgoingFile>>,
    pub read_acks: Mutex<Vec<String>>,
    history_gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    send_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_conversations(&self, list: Vec<Conversation>) {
        *self.conversations.lock().unwrap() = list;
    }

    pub fn set_history(&self, conversation_id: &str, messages: Vec<ChatMessage>) {
        self.history
            .lock()
            .unwrap()
            .insert(conversation_id.into(), messages);
    }

    /// Hold the next history fetch of `conversation_id` until the returned
    /// sender fires (or is dropped).
    pub fn gate_history(&self, conversation_id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.history_gates
            .lock()
            .unwrap()
            .insert(conversation_id.into(), rx);
        tx
    }

    /// Hold the next send until the returned sender fires.
    pub fn gate_send(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.send_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<SendMessageRequest> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn unavailable() -> ApiError {
        ApiError::Network("connection refused".into())
    }
}

#[async_trait]
impl MessagingApi for FakeApi {
    async fn list_conversations(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<PagedResponse<Conversation>, ApiError> {
        self.record(format!("conversations:{page}:{limit}"));
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        let list = self.conversations.lock().unwrap().clone();
        Ok(paginate(&list, page, limit))
    }

    async fn list_messages(
        &self,
        conversation_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<PagedResponse<ChatMessage>, ApiError> {
        self.record(format!("messages:{conversation_id}:{page}:{limit}"));
        let gate = self.history_gates.lock().unwrap().remove(conversation_id);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let mut history = self
            .history
            .lock()
            .unwrap()
            .get(conversation_id)
            .cloned()
            .unwrap_or_default();
        history.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(&history, page, limit))
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<ChatMessage, ApiError> {
        self.record(format!("send:{}", request.client_id));
        let gate = self.send_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.sent.lock().unwrap().push(request.clone());
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }

        let conversation_id = request
            .conversation_id
            .clone()
            .or_else(|| self.new_conversation_id.lock().unwrap().clone())
            .unwrap_or_else(|| "created".into());
        let content = match &request.content {
            OutgoingContent::Text { text } => MessageContent::Text { text: text.clone() },
            OutgoingContent::File { attachment_id } => {
                let uploads = self.uploads.lock().unwrap();
                let name = uploads
                    .last()
                    .map(|f| f.name.clone())
                    .unwrap_or_else(|| "file".into());
                MessageContent::File {
                    attachment: Attachment {
                        id: attachment_id.clone(),
                        name,
                        mime: "application/octet-stream".into(),
                        url: format!("https://cdn.test/{attachment_id}"),
                        size: 3,
                    },
                }
            }
        };

        Ok(ChatMessage {
            // Deterministic so tests can push the matching echo.
            id: format!("srv-{}", request.client_id),
            conversation_id,
            sender_id: ME.into(),
            sender_name: None,
            recipient_id: Some(request.recipient_id.clone()),
            content,
            created_at: Utc::now(),
            client_id: Some(request.client_id.clone()),
        })
    }

    async fn upload_attachment(&self, file: &OutgoingFile) -> Result<Attachment, ApiError> {
        self.record(format!("upload:{}", file.name));
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(file.clone());
        let id = format!("att-{}", uploads.len());
        Ok(Attachment {
            url: format!("https://cdn.test/{id}"),
            id,
            name: file.name.clone(),
            mime: file.mime.clone(),
            size: file.size(),
        })
    }

    async fn mark_read(&self, conversation_id: &str) -> Result<(), ApiError> {
        self.record(format!("read:{conversation_id}"));
        self.read_acks.lock().unwrap().push(conversation_id.into());
        Ok(())
    }

    async fn unread_summary(&self) -> Result<UnreadSummary, ApiError> {
        self.record("unread".into());
        self.unread
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(Self::unavailable)
    }
}

/// [`RealtimeSink`] that keeps every command.
#[derive(Default)]
pub struct RecordingSink {
    pub commands: Mutex<Vec<ClientCommand>>,
    pub offline: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn commands(&self) -> Vec<ClientCommand> {
        self.commands.lock().unwrap().clone()
    }
}

impl RealtimeSink for RecordingSink {
    fn send(&self, command: ClientCommand) -> Result<(), String> {
        if self.offline.load(Ordering::SeqCst) {
            return Err("socket closed".into());
        }
        self.commands.lock().unwrap().push(command);
        Ok(())
    }
}

pub fn store_with(api: &Arc<FakeApi>, sink: &Arc<RecordingSink>) -> MessagingStore {
    MessagingStore::new(StoreConfig::new(ME), api.clone(), sink.clone())
}

/// Poll `check` until it holds, failing the test after a second.
pub async fn wait_until(store: &MessagingStore, check: impl Fn(&souk_client::MessagingState) -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while !store.read(&check) {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Wait until the fake has seen a call starting with `prefix`.
pub async fn wait_for_call(api: &FakeApi, prefix: &str) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while !api.calls().iter().any(|c| c.starts_with(prefix)) {
        assert!(tokio::time::Instant::now() < deadline, "no call to {prefix}");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
