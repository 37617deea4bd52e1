use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_PAGE_URL: &str = "http://localhost:5173/";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://rebuscada.db?mode=rwc";
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_STORAGE_POLL_MILLIS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub ws_url: String,
    pub page_url: String,
    pub storage_namespace: String,
    pub database_url: String,
    pub request_timeout_seconds: u64,
    pub storage_poll_millis: u64,
    pub player_name: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        let api_url = env::var("REBUSCADA_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let ws_url = env::var("REBUSCADA_WS_URL").unwrap_or_else(|_| derive_ws_url(&api_url));

        Self {
            ws_url,
            api_url,
            page_url: env::var("REBUSCADA_PAGE_URL")
                .unwrap_or_else(|_| DEFAULT_PAGE_URL.to_string()),
            storage_namespace: env::var("REBUSCADA_STORAGE_NAMESPACE")
                .unwrap_or_else(|_| "rebuscada".to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            request_timeout_seconds: env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECONDS),
            storage_poll_millis: env::var("REBUSCADA_STORAGE_POLL_MS")
                .ok()
                .and_then(|value| value.parse().ok())
                .filter(|millis| *millis > 0)
                .unwrap_or(DEFAULT_STORAGE_POLL_MILLIS),
            player_name: env::var("REBUSCADA_PLAYER_NAME")
                .ok()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn storage_poll_interval(&self) -> Duration {
        Duration::from_millis(self.storage_poll_millis)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// `http` becomes `ws` and `https` becomes `wss`; the path is kept.
pub fn derive_ws_url(api_url: &str) -> String {
    if let Some(rest) = api_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = api_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        api_url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_ws_url() {
        assert_eq!(derive_ws_url("http://localhost:8000"), "ws://localhost:8000");
        assert_eq!(
            derive_ws_url("https://api.rebuscada.cat/v1"),
            "wss://api.rebuscada.cat/v1"
        );
        assert_eq!(derive_ws_url("ws://already"), "ws://already");
    }
}
