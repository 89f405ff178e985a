use serde::{Deserialize, Serialize};

pub const MP_ORIGIN: &str = "https://mp.weixin.qq.com";
pub const MP_REFERER: &str = "https://mp.weixin.qq.com/";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/83.0.4103.116 Safari/537.36";

/// Immutable identity of the HTTP client shared by every stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    pub cookie: Option<String>,
    pub token: Option<String>,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            cookie: None,
            token: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}
