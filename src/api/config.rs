use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for the Zeitgeist server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the Zeitgeist instance (default: http://localhost:4567)
    pub base_url: String,

    /// Request timeout in seconds, applies to listings and thumbnail downloads (default: 10)
    pub timeout_secs: u64,

    /// User agent string to use
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4567".to_string(),
            timeout_secs: 10,
            user_agent: format!("zeitgeist/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
