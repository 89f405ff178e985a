//! Article serializers: Markdown and standalone HTML.
mod html;
mod markdown;

pub use html::{clean_article_html, render_html};
pub use markdown::{render_markdown, repair_link_targets};

use crate::title::format_publish_time;

/// Values shared by both output formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleHeader {
    /// Already cleaned with `clean_title`.
    pub title: String,
    pub publish_time: Option<String>,
    pub source_url: String,
}

impl ArticleHeader {
    fn formatted_time(&self) -> Option<String> {
        self.publish_time
            .as_deref()
            .map(format_publish_time)
            .filter(|time| !time.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SerializationError {
    #[error("markdown conversion failed: {0}")]
    Converter(String),
}
