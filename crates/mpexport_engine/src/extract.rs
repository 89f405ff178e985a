use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::fragment::ContentFragment;

/// Title used when an article page carries none.
pub const UNTITLED_PLACEHOLDER: &str = "未命名文章";

const TITLE_SELECTORS: &[&str] = &["h1#activity-name", "h2.rich_media_title", "h1.article-title"];
const CONTENT_SELECTORS: &[&str] = &["div.rich_media_content", "div#js_content"];

static RE_CREATE_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"createTime\s*=\s*'([^']*)'").unwrap());
static RE_LEGACY_CT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"var\s+ct\s*=\s*"(\d{10})""#).unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedArticle {
    pub title: String,
    /// Raw literal from the page, normally unix seconds.
    pub publish_time: Option<String>,
    pub content: ContentFragment,
    pub source_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("article title not found")]
    TitleNotFound,
    #[error("article content container not found")]
    ContentNotFound,
    #[error("article content is empty")]
    EmptyContent,
}

pub trait Extractor: Send + Sync {
    fn extract(&self, raw_html: &str, source_url: &str) -> Result<FetchedArticle, ExtractionError>;
}

/// Extractor for the `mp.weixin.qq.com` article template.
#[derive(Debug, Clone, Default)]
pub struct WeChatExtractor {
    placeholder_title: Option<String>,
}

impl WeChatExtractor {
    /// Fails with [`ExtractionError::TitleNotFound`] when the title is missing.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_placeholder_title(title: impl Into<String>) -> Self {
        Self {
            placeholder_title: Some(title.into()),
        }
    }
}

impl Extractor for WeChatExtractor {
    fn extract(&self, raw_html: &str, source_url: &str) -> Result<FetchedArticle, ExtractionError> {
        let doc = Html::parse_document(raw_html);

        let content = first_match(&doc, CONTENT_SELECTORS)
            .map(|node| ContentFragment::parse(&node.html()))
            .ok_or(ExtractionError::ContentNotFound)?;

        let title = first_match(&doc, TITLE_SELECTORS)
            .map(|node| node.text().collect::<String>().trim().to_string())
            .filter(|title| !title.is_empty())
            .or_else(|| self.placeholder_title.clone())
            .ok_or(ExtractionError::TitleNotFound)?;

        Ok(FetchedArticle {
            title,
            publish_time: publish_time(raw_html),
            content,
            source_url: source_url.to_string(),
        })
    }
}

/// First element matching the selectors, tried in priority order.
fn first_match<'a>(doc: &'a Html, selectors: &[&str]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|raw| {
        let selector = Selector::parse(raw).ok()?;
        doc.select(&selector).next()
    })
}

fn publish_time(raw_html: &str) -> Option<String> {
    RE_CREATE_TIME
        .captures(raw_html)
        .or_else(|| RE_LEGACY_CT.captures(raw_html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}
