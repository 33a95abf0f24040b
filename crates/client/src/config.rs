//! Client configuration from environment variables.

use std::time::Duration;

use souk_shared::MESSAGING_NAMESPACE;
use url::Url;

use crate::ws::ReconnectConfig;

const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Settings for the whole messaging client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST backend.
    pub api_base_url: String,
    /// Base URL of the socket server; the messaging namespace is appended.
    pub ws_base_url: String,
    /// Bearer token forwarded on REST calls and the socket handshake.
    pub auth_token: Option<String>,
    pub store: StoreConfig,
    pub reconnect: ReconnectConfig,
}

/// Knobs of the messaging store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Id of the signed-in user; decides which messages are "ours".
    pub self_user_id: String,
    pub page_size: u32,
    pub typing_timeout: Duration,
    pub max_message_len: usize,
    pub max_attachment_bytes: u64,
}

impl StoreConfig {
    pub fn new(self_user_id: impl Into<String>) -> Self {
        Self {
            self_user_id: self_user_id.into(),
            page_size: 20,
            typing_timeout: Duration::from_millis(3000),
            max_message_len: 5000,
            max_attachment_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ClientConfig {
    pub fn new(api_base_url: impl Into<String>, self_user_id: impl Into<String>) -> Self {
        let api_base_url = api_base_url.into();
        Self {
            ws_base_url: derive_ws_url(&api_base_url),
            api_base_url,
            auth_token: None,
            store: StoreConfig::new(self_user_id),
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Build the configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SOUK_API_URL`: REST base URL (default: "http://localhost:8080")
    /// - `SOUK_WS_URL`: socket base URL (default: the API URL with a ws/wss scheme)
    /// - `SOUK_AUTH_TOKEN`: bearer token (default: none, cookies only)
    /// - `SOUK_PAGE_SIZE`: page size for list calls (default: 20)
    /// - `SOUK_TYPING_TIMEOUT_MS`: typing indicator lifetime (default: 3000)
    /// - `SOUK_MAX_ATTACHMENT_BYTES`: upload size limit (default: 10 MiB)
    pub fn from_env(self_user_id: impl Into<String>) -> Self {
        let api_base_url =
            std::env::var("SOUK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let mut config = Self::new(api_base_url, self_user_id);

        if let Ok(ws) = std::env::var("SOUK_WS_URL") {
            config.ws_base_url = ws;
        }
        config.auth_token = std::env::var("SOUK_AUTH_TOKEN").ok().filter(|t| !t.is_empty());

        if let Some(size) = env_parse::<u32>("SOUK_PAGE_SIZE") {
            config.store.page_size = size.max(1);
        }
        if let Some(ms) = env_parse::<u64>("SOUK_TYPING_TIMEOUT_MS") {
            config.store.typing_timeout = Duration::from_millis(ms);
        }
        if let Some(bytes) = env_parse::<u64>("SOUK_MAX_ATTACHMENT_BYTES") {
            config.store.max_attachment_bytes = bytes;
        }

        config
    }

    /// Full URL of the messaging namespace.
    pub fn messaging_ws_url(&self) -> String {
        format!(
            "{}{}",
            self.ws_base_url.trim_end_matches('/'),
            MESSAGING_NAMESPACE
        )
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            crate::log_warn!("Ignoring invalid value for {}: {:?}", key, raw);
            None
        }
    }
}

/// Swap an http(s) URL for its ws(s) counterpart, keeping host, port and path.
pub fn derive_ws_url(api_base_url: &str) -> String {
    let Ok(mut url) = Url::parse(api_base_url) else {
        return api_base_url.to_string();
    };
    let scheme = match url.scheme() {
        "https" => "wss",
        "http" => "ws",
        _ => return api_base_url.trim_end_matches('/').to_string(),
    };
    if url.set_scheme(scheme).is_err() {
        return api_base_url.to_string();
    }
    url.to_string().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_socket_url_from_api_url() {
        assert_eq!(derive_ws_url("http://localhost:8080"), "ws://localhost:8080");
        assert_eq!(derive_ws_url("https://souk.example/"), "wss://souk.example");
        assert_eq!(derive_ws_url("not a url"), "not a url");
    }

    #[test]
    fn appends_messaging_namespace() {
        let config = ClientConfig::new("https://souk.example", "u1");
        assert_eq!(config.messaging_ws_url(), "wss://souk.example/messaging");
        assert_eq!(config.store.page_size, 20);
        assert_eq!(config.store.typing_timeout, Duration::from_secs(3));
    }
}
