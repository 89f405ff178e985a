use scraper::ElementRef;

use super::ArticleHeader;
use crate::fragment::ContentFragment;
use crate::markup::{escape_html, serialize_fragment, ElementAction, ElementRewriter};

const REMOVED_ATTRIBUTES: &[&str] = &[
    "data-pm-slice",
    "leaf",
    "textstyle",
    "nodeleaf",
    "data-backh",
    "data-backw",
    "data-imgfileid",
    "data-ratio",
    "data-s",
    "data-type",
    "data-w",
    "type",
];

const REMOVED_CLASS_PREFIXES: &[&str] = &["js_", "rich_media_", "wxw-", "autoTypeSetting"];

const STYLE: &str = r#"        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'PingFang SC', 'Hiragino Sans GB', 'Microsoft YaHei', 'Helvetica Neue', Helvetica, Arial, sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 800px;
            margin: 0 auto;
            padding: 20px;
        }
        .article-header {
            border-bottom: 1px solid #eee;
            padding-bottom: 20px;
            margin-bottom: 30px;
        }
        .article-title {
            font-size: 24px;
            font-weight: bold;
            margin-bottom: 10px;
        }
        .article-meta {
            color: #666;
            font-size: 14px;
        }
        .article-content {
            font-size: 16px;
        }
        .article-content p {
            margin-bottom: 1em;
            line-height: 1.75em;
        }
        .article-content section {
            text-align: center;
            margin: 2em 0;
        }
        img {
            max-width: 100%;
            height: auto;
            display: block;
            margin: 10px auto;
        }
"#;

/// Strips WeChat-specific attributes, classes and hidden styles, and drops empty inline wrappers.
struct ArticleCleaner;

impl ElementRewriter for ArticleCleaner {
    fn rewrite(
        &mut self,
        element: ElementRef<'_>,
        attrs: &mut Vec<(String, String)>,
    ) -> ElementAction {
        let name = element.value().name();
        if (name == "span" || name == "font") && is_empty_wrapper(element) {
            return ElementAction::Remove;
        }

        attrs.retain(|(attr, _)| !REMOVED_ATTRIBUTES.contains(&attr.as_str()));
        attrs.retain_mut(|(attr, value)| match attr.as_str() {
            "class" => {
                *value = clean_classes(value);
                !value.is_empty()
            }
            "style" => {
                *value = unhide_style(value);
                !value.is_empty()
            }
            _ => true,
        });
        ElementAction::Keep
    }
}

fn is_empty_wrapper(element: ElementRef<'_>) -> bool {
    let has_text = element.text().any(|text| !text.trim().is_empty());
    let has_image = element
        .descendants()
        .filter_map(ElementRef::wrap)
        .any(|child| child.value().name() == "img");
    !has_text && !has_image
}

fn clean_classes(classes: &str) -> String {
    classes
        .split_whitespace()
        .filter(|class| {
            !REMOVED_CLASS_PREFIXES
                .iter()
                .any(|prefix| class.starts_with(prefix))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn unhide_style(style: &str) -> String {
    style
        .split(';')
        .map(str::trim)
        .filter(|decl| {
            let compact: String = decl
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase();
            !compact.is_empty() && compact != "visibility:hidden" && compact != "opacity:0"
        })
        .map(|decl| format!("{decl};"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Article body with WeChat markup noise removed.
pub fn clean_article_html(fragment: &ContentFragment) -> String {
    let doc = fragment.document();
    serialize_fragment(&doc, &mut ArticleCleaner)
}

/// Standalone `zh-CN` HTML document for the article.
pub fn render_html(header: &ArticleHeader, fragment: &ContentFragment) -> String {
    let title = escape_html(&header.title);
    let meta_time = header
        .formatted_time()
        .map(|time| format!("发布时间: {}", escape_html(&time)))
        .unwrap_or_default();
    let source = escape_html(&header.source_url);
    let content = clean_article_html(fragment);

    format!(
        r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
{STYLE}    </style>
</head>
<body>
    <div class="article-header">
        <h1 class="article-title">{title}</h1>
        <div class="article-meta">
            {meta_time}
            <br>
            <a href="{source}" target="_blank">原文链接</a>
        </div>
    </div>
    <div class="article-content">
        {content}
    </div>
</body>
</html>
"#
    )
}
