use std::collections::BTreeSet;

use mpexport_logging::mp_warn;
use serde::{Deserialize, Serialize};

const AD_KEYWORDS: &[&str] = &["广告", "推广"];
const PROMOTION_KEYWORDS: &[&str] = &["长按识别二维码", "扫码关注", "点击阅读原文"];

/// User-configured content blocklist. Read-only during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub paragraph_keywords: BTreeSet<String>,
    /// Hex SHA-256 hashes of images to drop.
    pub image_hashes: BTreeSet<String>,
    pub skip_ads: bool,
    pub skip_promotions: bool,
}

impl FilterConfig {
    /// Configured keywords plus the enabled presets.
    pub fn effective_keywords(&self) -> BTreeSet<String> {
        let mut keywords = self.paragraph_keywords.clone();
        if self.skip_ads {
            keywords.extend(AD_KEYWORDS.iter().map(|k| k.to_string()));
        }
        if self.skip_promotions {
            keywords.extend(PROMOTION_KEYWORDS.iter().map(|k| k.to_string()));
        }
        keywords
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("empty keyword would drop every paragraph")]
    EmptyKeyword,
}

/// Drops paragraphs of serialized text that mention a blocked keyword.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    keywords: BTreeSet<String>,
}

impl ContentFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            keywords: config.effective_keywords(),
        }
    }

    /// Never fails: on an internal error the input comes back unchanged.
    pub fn apply(&self, text: &str) -> String {
        match self.try_apply(text) {
            Ok(filtered) => filtered,
            Err(err) => {
                mp_warn!("content filter skipped: {err}");
                text.to_string()
            }
        }
    }

    pub fn try_apply(&self, text: &str) -> Result<String, FilterError> {
        if self.keywords.is_empty() {
            return Ok(text.to_string());
        }
        if self.keywords.iter().any(|k| k.is_empty()) {
            return Err(FilterError::EmptyKeyword);
        }

        let mut out = String::with_capacity(text.len());
        for paragraph in paragraphs(text) {
            let joined: String = paragraph.concat();
            if self.keywords.iter().any(|k| joined.contains(k.as_str())) {
                continue;
            }
            out.push_str(&paragraph.join("\n"));
            out.push_str("\n\n");
        }
        Ok(out)
    }
}

/// Runs of non-blank lines, each line trimmed.
fn paragraphs(text: &str) -> Vec<Vec<&str>> {
    let mut result = Vec::new();
    let mut current = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                result.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        result.push(current);
    }
    result
}
