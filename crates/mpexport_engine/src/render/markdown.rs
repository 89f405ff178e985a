use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::{ArticleHeader, SerializationError};
use crate::convert::Converter;
use crate::fragment::ContentFragment;

/// Stands in for non-breaking spaces while html2md runs; it folds them into plain spaces.
const NBSP_MARKER: &str = "\u{E000}\u{E001}";

static RE_NBSP_ENTITY_RUN: Lazy<Regex> = Lazy::new(|| Regex::new("(?:&nbsp;|\u{a0})+").unwrap());
static RE_NBSP_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new("(?:\u{a0}|\u{E000}\u{E001})+").unwrap());
static RE_HTTP_TARGET: Lazy<Regex> = Lazy::new(|| Regex::new(r"\]\(http([^)]*)\)").unwrap());

/// Renders the article as Markdown. Output depends only on the inputs.
pub fn render_markdown(
    header: &ArticleHeader,
    fragment: &ContentFragment,
    converter: &dyn Converter,
) -> Result<String, SerializationError> {
    let html = RE_NBSP_ENTITY_RUN.replace_all(fragment.as_html(), NBSP_MARKER);
    let converted = converter.to_markdown(&html)?;
    let body = converted
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| format!("{line}\n"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut markdown = format!("# {}\n\n", header.title);
    if let Some(time) = header.formatted_time() {
        markdown.push_str(&format!("发布时间: {time}\n\n"));
    }
    markdown.push_str(&format!("原文链接: {}\n\n", header.source_url));
    markdown.push_str(&body);

    let markdown = RE_NBSP_RUN.replace_all(&markdown, "\n");
    Ok(repair_link_targets(&markdown))
}

/// Percent-encodes spaces inside `](http...)` link targets.
pub fn repair_link_targets(markdown: &str) -> String {
    RE_HTTP_TARGET
        .replace_all(markdown, |caps: &Captures<'_>| {
            format!("](http{})", caps[1].replace(' ', "%20"))
        })
        .into_owned()
}
