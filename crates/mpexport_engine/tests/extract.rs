mod common;

use common::{article_page, ARTICLE_URL};
use mpexport_engine::{ExtractionError, Extractor, WeChatExtractor, UNTITLED_PLACEHOLDER};
use pretty_assertions::assert_eq;

const FALLBACK_PAGE: &str = r#"<html><body>
<h2 class="rich_media_title">  旧版标题  </h2>
<div id="js_content"><p>旧版正文</p></div>
<script>var ct = "1600000000";</script>
</body></html>"#;

#[test]
fn primary_template_is_extracted() {
    let page = article_page("公众号文章", "<p>第一段</p><p>第二段</p>");
    let article = WeChatExtractor::new().extract(&page, ARTICLE_URL).unwrap();

    assert_eq!(article.title, "公众号文章");
    assert_eq!(article.publish_time.as_deref(), Some("1700000000"));
    assert_eq!(article.source_url, ARTICLE_URL);
    assert!(article.content.as_html().starts_with("<div"));
    assert!(article.content.text().contains("第二段"));
}

#[test]
fn fallback_selectors_are_used() {
    let article = WeChatExtractor::new()
        .extract(FALLBACK_PAGE, ARTICLE_URL)
        .unwrap();

    assert_eq!(article.title, "旧版标题");
    assert_eq!(article.publish_time.as_deref(), Some("1600000000"));
    assert_eq!(article.content.text(), "旧版正文");
}

#[test]
fn article_title_class_is_the_last_resort() {
    let page = r#"<h1 class="article-title">第三种</h1><div class="rich_media_content">x</div>"#;
    let article = WeChatExtractor::new().extract(page, ARTICLE_URL).unwrap();
    assert_eq!(article.title, "第三种");
}

#[test]
fn missing_container_is_fatal() {
    let page = r#"<h1 id="activity-name">t</h1><div class="other">x</div>"#;
    let err = WeChatExtractor::new().extract(page, ARTICLE_URL).unwrap_err();
    assert_eq!(err, ExtractionError::ContentNotFound);
}

#[test]
fn missing_title_uses_placeholder_when_configured() {
    let page = r#"<h1 id="activity-name">   </h1><div id="js_content"><p>x</p></div>"#;

    let strict = WeChatExtractor::new().extract(page, ARTICLE_URL);
    assert_eq!(strict.unwrap_err(), ExtractionError::TitleNotFound);

    let lenient = WeChatExtractor::with_placeholder_title(UNTITLED_PLACEHOLDER)
        .extract(page, ARTICLE_URL)
        .unwrap();
    assert_eq!(lenient.title, "未命名文章");
}
