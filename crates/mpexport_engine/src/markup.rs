//! Fragment re-serialization with per-element rewriting.
//!
//! `scraper` trees are read-only, so edits are applied while writing the
//! tree back out. Nodes are visited in document order; an element that is
//! removed takes its whole subtree with it.

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ElementAction {
    Keep,
    Remove,
}

pub(crate) trait ElementRewriter {
    fn rewrite(&mut self, element: ElementRef<'_>, attrs: &mut Vec<(String, String)>)
        -> ElementAction;
}

/// Leaves every element as parsed.
pub(crate) struct Unchanged;

impl ElementRewriter for Unchanged {
    fn rewrite(&mut self, _: ElementRef<'_>, _: &mut Vec<(String, String)>) -> ElementAction {
        ElementAction::Keep
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "noscript", "plaintext",
];

/// Serializes the children of a fragment's root element.
pub(crate) fn serialize_fragment(html: &Html, rewriter: &mut dyn ElementRewriter) -> String {
    let mut out = String::new();
    for child in html.root_element().children() {
        write_node(child, rewriter, &mut out);
    }
    out
}

/// `<img>` elements in document order.
pub(crate) fn images_in_order(html: &Html) -> Vec<ElementRef<'_>> {
    html.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == "img")
        .collect()
}

fn write_node(node: NodeRef<'_, Node>, rewriter: &mut dyn ElementRewriter, out: &mut String) {
    match node.value() {
        Node::Text(text) => {
            let raw = node
                .parent()
                .and_then(ElementRef::wrap)
                .map(|parent| RAW_TEXT_ELEMENTS.contains(&parent.value().name()))
                .unwrap_or(false);
            if raw {
                out.push_str(text);
            } else {
                escape_text(text, out);
            }
        }
        Node::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        Node::Element(_) => {
            if let Some(element) = ElementRef::wrap(node) {
                write_element(element, rewriter, out);
            }
        }
        _ => {}
    }
}

fn write_element(element: ElementRef<'_>, rewriter: &mut dyn ElementRewriter, out: &mut String) {
    let mut attrs: Vec<(String, String)> = element
        .value()
        .attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    if rewriter.rewrite(element, &mut attrs) == ElementAction::Remove {
        return;
    }

    let name = element.value().name();
    out.push('<');
    out.push_str(name);
    for (attr, value) in &attrs {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }
    for child in element.children() {
        write_node(child, rewriter, out);
    }
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

/// Escapes text for insertion into a hand-written HTML template.
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => escape_text(c.encode_utf8(&mut [0; 4]), &mut out),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DropSpans;

    impl ElementRewriter for DropSpans {
        fn rewrite(
            &mut self,
            element: ElementRef<'_>,
            attrs: &mut Vec<(String, String)>,
        ) -> ElementAction {
            attrs.retain(|(name, _)| name != "data-x");
            if element.value().name() == "span" {
                ElementAction::Remove
            } else {
                ElementAction::Keep
            }
        }
    }

    #[test]
    fn reserializes_without_changes() {
        let markup = r#"<div id="c"><p>a &amp; b<br>c</p><img src="x.png"></div>"#;
        let html = Html::parse_fragment(markup);
        assert_eq!(serialize_fragment(&html, &mut Unchanged), markup);
    }

    #[test]
    fn removed_elements_take_their_subtree() {
        let html = Html::parse_fragment(r#"<p data-x="1">keep<span>drop <b>me</b></span></p>"#);
        assert_eq!(serialize_fragment(&html, &mut DropSpans), "<p>keep</p>");
    }

    #[test]
    fn noscript_content_is_written_back_verbatim() {
        let markup = r#"<p>x</p><noscript><img src="y.png"></noscript>"#;
        let html = Html::parse_fragment(markup);
        assert_eq!(serialize_fragment(&html, &mut Unchanged), markup);
    }

    #[test]
    fn nbsp_and_quotes_are_escaped() {
        let html = Html::parse_fragment("<p title=\"a&quot;b\">x\u{a0}y</p>");
        assert_eq!(
            serialize_fragment(&html, &mut Unchanged),
            "<p title=\"a&quot;b\">x&nbsp;y</p>"
        );
    }

    #[test]
    fn images_follow_document_order() {
        let html = Html::parse_fragment(
            r#"<section><img src="1"><p><img src="2"></p></section><img src="3">"#,
        );
        let sources: Vec<_> = images_in_order(&html)
            .into_iter()
            .filter_map(|img| img.value().attr("src"))
            .collect();
        assert_eq!(sources, vec!["1", "2", "3"]);
    }

    #[test]
    fn template_escape_covers_quotes() {
        assert_eq!(escape_html(r#"<a "b" & 'c'>"#), "&lt;a &quot;b&quot; &amp; &#39;c&#39;&gt;");
    }
}
