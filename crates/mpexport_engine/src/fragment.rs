use scraper::Html;

use crate::markup::{images_in_order, serialize_fragment, Unchanged};

/// Article body isolated from page chrome.
///
/// Holds normalized markup; every constructor goes through the HTML parser,
/// so a fragment is always well-formed. Parse it with [`ContentFragment::document`]
/// when the tree is needed (the tree itself is not `Send`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFragment {
    markup: String,
}

impl ContentFragment {
    pub fn parse(markup: &str) -> Self {
        let html = Html::parse_fragment(markup);
        Self::from_document(&html)
    }

    pub(crate) fn from_document(html: &Html) -> Self {
        Self {
            markup: serialize_fragment(html, &mut Unchanged),
        }
    }

    pub(crate) fn from_serialized(markup: String) -> Self {
        Self { markup }
    }

    pub fn as_html(&self) -> &str {
        &self.markup
    }

    pub fn document(&self) -> Html {
        Html::parse_fragment(&self.markup)
    }

    pub fn image_count(&self) -> usize {
        images_in_order(&self.document()).len()
    }

    pub fn text(&self) -> String {
        self.document().root_element().text().collect()
    }

    /// True when there is visible text or at least one image.
    pub fn has_content(&self) -> bool {
        !self.text().trim().is_empty() || self.image_count() > 0
    }
}
