#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};

use bytes::Bytes;
use mpexport_engine::{
    ArticleExporter, EngineEvent, FailureKind, FetchError, FetchedPage, FilterConfig, HttpClient,
    ProgressSink, RetryPolicy,
};
use tokio::time::Instant;
use url::Url;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(mpexport_logging::initialize_for_tests);
}

pub const ARTICLE_URL: &str = "https://mp.weixin.qq.com/s/article";

pub fn article_page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><head><title>ignored</title></head><body>
<div id="page-content">
  <h1 class="rich_media_title" id="activity-name">
     {title}
  </h1>
  <div class="rich_media_content js_underline_content" id="js_content" style="visibility: hidden;">{body}</div>
</div>
<script>var createTime = '1700000000';</script>
</body></html>"#
    )
}

/// In-memory `HttpClient` that records every request.
#[derive(Default)]
pub struct StubClient {
    pages: HashMap<String, String>,
    images: HashMap<String, Vec<u8>>,
    json: HashMap<String, String>,
    page_calls: Mutex<Vec<(String, Instant)>>,
    image_calls: Mutex<Vec<String>>,
}

impl StubClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    pub fn with_image(mut self, url: &str, bytes: &[u8]) -> Self {
        self.images.insert(url.to_string(), bytes.to_vec());
        self
    }

    pub fn page_calls(&self) -> Vec<(String, Instant)> {
        self.page_calls.lock().unwrap().clone()
    }

    pub fn page_urls(&self) -> Vec<String> {
        self.page_calls().into_iter().map(|(url, _)| url).collect()
    }

    pub fn image_calls(&self) -> Vec<String> {
        self.image_calls.lock().unwrap().clone()
    }
}

fn not_found(url: &str) -> FetchError {
    FetchError {
        kind: FailureKind::HttpStatus(404),
        message: format!("no stub for {url}"),
        attempts: 1,
    }
}

#[async_trait::async_trait]
impl HttpClient for StubClient {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.page_calls
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));
        let html = self.pages.get(url).ok_or_else(|| not_found(url))?;
        Ok(FetchedPage {
            url: url.to_string(),
            final_url: url.to_string(),
            html: html.clone(),
            encoding: "UTF-8".to_string(),
        })
    }

    async fn fetch_image(&self, url: &str) -> Result<Bytes, FetchError> {
        self.image_calls.lock().unwrap().push(url.to_string());
        self.images
            .get(url)
            .map(|bytes| Bytes::from(bytes.clone()))
            .ok_or_else(|| not_found(url))
    }

    async fn fetch_json(&self, url: &Url) -> Result<Bytes, FetchError> {
        self.json
            .get(url.path())
            .map(|body| Bytes::from(body.clone()))
            .ok_or_else(|| not_found(url.as_str()))
    }
}

#[derive(Default)]
pub struct TestSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn no_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 0,
        base_delay: std::time::Duration::ZERO,
    }
}

pub fn exporter(client: Arc<StubClient>, filter: FilterConfig) -> ArticleExporter {
    ArticleExporter::new(client, filter).with_retry_policy(no_retry())
}
