use url::Url;

use crate::options::ClientOptions;

/// Logged-in session material for the MP console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub cookie: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("no session cookie configured")]
    MissingCookie,
    #[error("no session token configured")]
    MissingToken,
    #[error("session token `{0}` is not numeric")]
    InvalidToken(String),
}

/// Source of MP console credentials. How they are obtained is up to the implementation.
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    async fn credentials(&self) -> Result<Credentials, AuthError>;
}

/// Credentials entered by hand or read from config and environment.
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    cookie: Option<String>,
    token: Option<String>,
}

impl StaticAuth {
    pub fn new(cookie: Option<String>, token: Option<String>) -> Self {
        Self { cookie, token }
    }

    pub fn from_options(options: &ClientOptions) -> Self {
        Self::new(options.cookie.clone(), options.token.clone())
    }
}

#[async_trait::async_trait]
impl AuthProvider for StaticAuth {
    async fn credentials(&self) -> Result<Credentials, AuthError> {
        let cookie = self
            .cookie
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingCookie)?;
        let raw_token = self
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;
        let token = parse_token(raw_token)?;

        Ok(Credentials {
            cookie: cookie.to_string(),
            token,
        })
    }
}

/// Accepts a bare numeric token or a console URL carrying `token=`.
pub fn parse_token(raw: &str) -> Result<String, AuthError> {
    let raw = raw.trim();
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
        return Ok(raw.to_string());
    }
    token_from_url(raw).ok_or_else(|| AuthError::InvalidToken(raw.to_string()))
}

/// Numeric `token` query parameter of a logged-in MP console URL.
pub fn token_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_read_from_console_url() {
        let url = "https://mp.weixin.qq.com/cgi-bin/home?t=home/index&lang=zh_CN&token=123456789";
        assert_eq!(token_from_url(url).as_deref(), Some("123456789"));
        assert_eq!(token_from_url("https://mp.weixin.qq.com/?token=abc"), None);
    }

    #[tokio::test]
    async fn static_auth_requires_both_values() {
        let missing = StaticAuth::new(Some("sid=1".to_string()), None);
        assert_eq!(missing.credentials().await, Err(AuthError::MissingToken));

        let bad = StaticAuth::new(Some("sid=1".to_string()), Some("nope".to_string()));
        assert_eq!(
            bad.credentials().await,
            Err(AuthError::InvalidToken("nope".to_string()))
        );

        let ok = StaticAuth::new(Some(" sid=1 ".to_string()), Some("42".to_string()));
        assert_eq!(
            ok.credentials().await,
            Ok(Credentials {
                cookie: "sid=1".to_string(),
                token: "42".to_string(),
            })
        );
    }
}
