//! HTTP API client for the messaging endpoints.
//!
//! Every REST call the store makes goes through [`MessagingApi`]. The
//! production implementation, [`ApiClient`], forwards the session
//! credentials (cookie store plus optional bearer token) and retries a
//! request exactly once after refreshing the session on a 401.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use souk_shared::{
    ApiError, Attachment, ChatMessage, Conversation, PagedResponse, SendMessageRequest,
    UnreadSummary,
};

/// A file picked by the user, held in memory until uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl OutgoingFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// The REST surface the messaging store consumes.
#[async_trait]
pub trait MessagingApi: Send + Sync {
    async fn list_conversations(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<PagedResponse<Conversation>, ApiError>;

    async fn list_messages(
        &self,
        conversation_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<PagedResponse<ChatMessage>, ApiError>;

    async fn send_message(&self, request: &SendMessageRequest) -> Result<ChatMessage, ApiError>;

    async fn upload_attachment(&self, file: &OutgoingFile) -> Result<Attachment, ApiError>;

    async fn mark_read(&self, conversation_id: &str) -> Result<(), ApiError>;

    async fn unread_summary(&self) -> Result<UnreadSummary, ApiError>;
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    token: Option<String>,
}

/// HTTP client for the messaging backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth_token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new() -> Self {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .unwrap_or_else(|e| {
                crate::log_warn!("Falling back to a client without cookie store: {}", e);
                Client::new()
            });
        Self {
            client,
            base_url: String::new(),
            auth_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the base URL for API requests
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Forward a bearer token on every request
    pub fn with_auth_token(self, token: Option<String>) -> Self {
        *self
            .auth_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token;
        self
    }

    /// Current bearer token, if any (refreshes may replace it)
    pub fn auth_token(&self) -> Option<String> {
        self.auth_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if self.base_url.is_empty() {
            if path.starts_with('/') {
                path.to_string()
            } else {
                format!("/{path}")
            }
        } else {
            let base = self.base_url.trim_end_matches('/');
            let path = path.trim_start_matches('/');
            format!("{base}/{path}")
        }
    }

    fn authorize(&self, rb: RequestBuilder) -> RequestBuilder {
        match self.auth_token() {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    /// Send a request, refreshing the session and retrying once on 401.
    ///
    /// `build` is called again for the retry since request bodies are
    /// consumed by `send`.
    async fn execute(&self, build: impl Fn() -> RequestBuilder) -> Result<String, ApiError> {
        let resp = self
            .authorize(build())
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if resp.status() != StatusCode::UNAUTHORIZED {
            return read_body(resp).await;
        }

        crate::log_info!("Session rejected, refreshing before retry");
        self.refresh_session().await?;

        let resp = self
            .authorize(build())
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        read_body(resp).await
    }

    async fn refresh_session(&self) -> Result<(), ApiError> {
        let url = self.url("/api/auth/refresh");
        let resp = self
            .authorize(self.client.post(&url))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        let text = read_body(resp).await.map_err(|e| {
            crate::log_warn!("Session refresh failed ({}): {}", status, e);
            match e {
                ApiError::Http { body, .. } => ApiError::Unauthorized(body),
                other => other,
            }
        })?;

        if let Ok(RefreshResponse { token: Some(token) }) =
            serde_json::from_str::<RefreshResponse>(&text)
        {
            *self
                .auth_token
                .write()
                .unwrap_or_else(PoisonError::into_inner) = Some(token);
        }
        Ok(())
    }

    /// GET a JSON resource
    pub async fn get_json<TRes: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<TRes, ApiError> {
        let url = self.url(path);
        let text = self.execute(|| self.client.get(&url).query(query)).await?;
        decode(&text)
    }

    /// POST a JSON body and decode the JSON answer
    pub async fn post_json<TReq: serde::Serialize + Sync, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        let url = self.url(path);
        let text = self.execute(|| self.client.post(&url).json(body)).await?;
        decode(&text)
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_body(resp: Response) -> Result<String, ApiError> {
    let status = resp.status().as_u16();
    let is_success = resp.status().is_success();
    let text = resp
        .text()
        .await
        .map_err(|e| ApiError::Network(format!("failed to read body: {e}")))?;

    if !is_success {
        return Err(ApiError::from_status(status, text));
    }
    Ok(text)
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    let text = if text.trim().is_empty() { "null" } else { text };
    serde_json::from_str(text).map_err(|e| ApiError::Deserialize(e.to_string()))
}

fn page_query(page: u32, limit: u32) -> [(&'static str, String); 2] {
    [("page", page.to_string()), ("limit", limit.to_string())]
}

#[async_trait]
impl MessagingApi for ApiClient {
    async fn list_conversations(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<PagedResponse<Conversation>, ApiError> {
        self.get_json("/api/messaging/conversations", &page_query(page, limit))
            .await
    }

    async fn list_messages(
        &self,
        conversation_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<PagedResponse<ChatMessage>, ApiError> {
        let path = format!(
            "/api/messaging/conversations/{}/messages",
            urlencoding::encode(conversation_id)
        );
        self.get_json(&path, &page_query(page, limit)).await
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<ChatMessage, ApiError> {
        self.post_json("/api/messaging/messages", request).await
    }

    async fn upload_attachment(&self, file: &OutgoingFile) -> Result<Attachment, ApiError> {
        let url = self.url("/api/messaging/attachments");
        let text = self
            .execute(|| {
                let part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
                let part = match part.mime_str(&file.mime) {
                    Ok(part) => part,
                    Err(_) => Part::bytes(file.bytes.clone()).file_name(file.name.clone()),
                };
                self.client
                    .post(&url)
                    .multipart(Form::new().part("file", part))
            })
            .await?;
        decode(&text)
    }

    async fn mark_read(&self, conversation_id: &str) -> Result<(), ApiError> {
        let url = self.url(&format!(
            "/api/messaging/conversations/{}/read",
            urlencoding::encode(conversation_id)
        ));
        self.execute(|| self.client.post(&url)).await?;
        Ok(())
    }

    async fn unread_summary(&self) -> Result<UnreadSummary, ApiError> {
        self.get_json("/api/messaging/unread", &[]).await
    }
}
