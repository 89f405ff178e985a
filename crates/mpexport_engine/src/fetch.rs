use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use mpexport_logging::{mp_debug, mp_warn};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE, REFERER, USER_AGENT};
use url::Url;

use crate::decode::decode_html;
use crate::options::{ClientOptions, MP_REFERER};
use crate::{EngineEvent, FailureKind, FetchError, ProgressSink};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub image_timeout: Duration,
    pub redirect_limit: usize,
    pub max_page_bytes: u64,
    pub max_image_bytes: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            image_timeout: Duration::from_secs(10),
            redirect_limit: 5,
            max_page_bytes: 10 * 1024 * 1024,
            max_image_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Exponential backoff: retry `n` (0-based) waits `base_delay * 2^n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub url: String,
    pub final_url: String,
    pub html: String,
    pub encoding: String,
}

/// Network seam shared by every stage. Implementations carry fixed headers.
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage, FetchError>;

    async fn fetch_image(&self, url: &str) -> Result<Bytes, FetchError>;

    async fn fetch_json(&self, url: &Url) -> Result<Bytes, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    settings: FetchSettings,
}

impl ReqwestClient {
    pub fn new(settings: FetchSettings, options: &ClientOptions) -> Result<Self, FetchError> {
        let headers = default_headers(options)?;
        let redirect_limit = settings.redirect_limit;
        let policy = reqwest::redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= redirect_limit {
                attempt.error("redirect limit exceeded")
            } else {
                attempt.follow()
            }
        });

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(policy)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    async fn get_bytes(
        &self,
        url: Url,
        timeout: Duration,
        max_bytes: u64,
    ) -> Result<(Bytes, Option<String>, String), FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, content_len));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, next_len));
            }
            body.extend_from_slice(&chunk);
        }

        Ok((Bytes::from(body), content_type, final_url))
    }
}

#[async_trait::async_trait]
impl HttpClient for ReqwestClient {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let parsed = parse_url(url)?;
        let (body, content_type, final_url) = self
            .get_bytes(
                parsed,
                self.settings.request_timeout,
                self.settings.max_page_bytes,
            )
            .await?;

        let decoded = decode_html(&body, content_type.as_deref());
        if decoded.had_errors {
            mp_warn!(
                "page {url} is not valid {}; malformed bytes were replaced",
                decoded.encoding_label
            );
        }
        mp_debug!("fetched {} bytes from {final_url}", body.len());

        Ok(FetchedPage {
            url: url.to_string(),
            final_url,
            html: decoded.html,
            encoding: decoded.encoding_label,
        })
    }

    async fn fetch_image(&self, url: &str) -> Result<Bytes, FetchError> {
        let parsed = parse_url(url)?;
        let timeout = self.settings.image_timeout.min(Duration::from_secs(15));
        let (body, _, _) = self
            .get_bytes(parsed, timeout, self.settings.max_image_bytes)
            .await?;
        Ok(body)
    }

    async fn fetch_json(&self, url: &Url) -> Result<Bytes, FetchError> {
        let (body, _, _) = self
            .get_bytes(
                url.clone(),
                self.settings.request_timeout,
                self.settings.max_page_bytes,
            )
            .await?;
        Ok(body)
    }
}

/// Fetch a page, retrying transient failures with exponential backoff.
///
/// Makes at most `1 + policy.max_retries` requests. Invalid URLs fail at once.
/// Every scheduled retry is reported to `sink` before the wait starts.
pub async fn fetch_page_with_retry(
    client: &dyn HttpClient,
    url: &str,
    policy: &RetryPolicy,
    sink: &dyn ProgressSink,
) -> Result<FetchedPage, FetchError> {
    let mut retries = 0;
    loop {
        match client.fetch_page(url).await {
            Ok(page) => return Ok(page),
            Err(mut err) => {
                err.attempts = retries + 1;
                if !err.is_retryable() || retries >= policy.max_retries {
                    return Err(err);
                }
                let delay = policy.delay_for(retries);
                mp_warn!(
                    "fetch of {url} failed (attempt {}): {err}; retrying in {}s",
                    retries + 1,
                    delay.as_secs()
                );
                sink.emit(EngineEvent::RetryScheduled {
                    url: url.to_string(),
                    attempt: retries + 1,
                    delay_secs: delay.as_secs(),
                });
                tokio::time::sleep(delay).await;
                retries += 1;
            }
        }
    }
}

fn default_headers(options: &ClientOptions) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, header_value(&options.user_agent)?);
    headers.insert(REFERER, HeaderValue::from_static(MP_REFERER));
    if let Some(cookie) = options.cookie.as_deref().filter(|c| !c.trim().is_empty()) {
        let mut value = header_value(cookie.trim())?;
        value.set_sensitive(true);
        headers.insert(COOKIE, value);
    }
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(value)
        .map_err(|err| FetchError::new(FailureKind::InvalidHeader, err.to_string()))
}

fn parse_url(url: &str) -> Result<Url, FetchError> {
    Url::parse(url).map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))
}

fn too_large(max_bytes: u64, actual: u64) -> FetchError {
    FetchError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
