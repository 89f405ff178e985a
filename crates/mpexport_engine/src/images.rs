use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use mpexport_logging::{mp_debug, mp_warn};
use scraper::ElementRef;
use sha2::{Digest, Sha256};

use crate::fetch::HttpClient;
use crate::fragment::ContentFragment;
use crate::markup::{images_in_order, serialize_fragment, ElementAction, ElementRewriter};
use crate::options::MP_ORIGIN;
use crate::persist::{ensure_output_dir, write_content_addressed, PersistError};
use crate::FetchError;

pub const IMAGES_DIR: &str = "images";
const DEFAULT_EXTENSION: &str = "jpg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalImage {
    /// Hex SHA-256 of the image bytes.
    pub content_hash: String,
    pub extension: String,
    /// Path as referenced from the article, e.g. `./images/<hash>.png`.
    pub relative_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageDownloadError {
    #[error("download of {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("could not store {path}: {message}")]
    Store { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    Localized {
        url: String,
        image: LocalImage,
        newly_written: bool,
    },
    Blocked {
        url: String,
        content_hash: String,
    },
    Failed(ImageDownloadError),
    /// No usable `data-src`/`src`; the element is left as is.
    MissingSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedFragment {
    pub fragment: ContentFragment,
    pub images: Vec<ImageOutcome>,
}

impl LocalizedFragment {
    pub fn localized_count(&self) -> usize {
        self.images
            .iter()
            .filter(|outcome| matches!(outcome, ImageOutcome::Localized { .. }))
            .count()
    }
}

/// Downloads article images into a content-addressed `images/` store and
/// points the fragment at the local copies.
pub struct ImageLocalizer<'a> {
    client: &'a dyn HttpClient,
    blocked_hashes: &'a BTreeSet<String>,
}

#[derive(Debug, Clone)]
enum Rewrite {
    Keep,
    Remove,
    Point(String),
}

struct PendingImage {
    source: Option<String>,
    data_type: Option<String>,
}

impl<'a> ImageLocalizer<'a> {
    pub fn new(client: &'a dyn HttpClient, blocked_hashes: &'a BTreeSet<String>) -> Self {
        Self {
            client,
            blocked_hashes,
        }
    }

    pub async fn localize(
        &self,
        fragment: &ContentFragment,
        output_dir: &Path,
    ) -> Result<LocalizedFragment, PersistError> {
        let images_dir = output_dir.join(IMAGES_DIR);
        ensure_output_dir(&images_dir)?;

        let pending = collect_images(fragment);
        if pending.is_empty() {
            return Ok(LocalizedFragment {
                fragment: fragment.clone(),
                images: Vec::new(),
            });
        }

        let mut rewrites = Vec::with_capacity(pending.len());
        let mut outcomes = Vec::with_capacity(pending.len());
        let mut seen: HashMap<String, (Rewrite, ImageOutcome)> = HashMap::new();

        for image in pending {
            let Some(url) = image.source.as_deref().map(normalize_image_url) else {
                rewrites.push(Rewrite::Keep);
                outcomes.push(ImageOutcome::MissingSource);
                continue;
            };
            let (rewrite, outcome) = match seen.get(&url) {
                Some(done) => done.clone(),
                None => {
                    let done = self
                        .localize_one(&url, image.data_type.as_deref(), &images_dir)
                        .await;
                    seen.insert(url, done.clone());
                    done
                }
            };
            rewrites.push(rewrite);
            outcomes.push(outcome);
        }

        let doc = fragment.document();
        let mut rewriter = ImageRewriter {
            rewrites,
            next: 0,
        };
        let markup = serialize_fragment(&doc, &mut rewriter);

        Ok(LocalizedFragment {
            fragment: ContentFragment::from_serialized(markup),
            images: outcomes,
        })
    }

    async fn localize_one(
        &self,
        url: &str,
        data_type: Option<&str>,
        images_dir: &Path,
    ) -> (Rewrite, ImageOutcome) {
        let bytes = match self.client.fetch_image(url).await {
            Ok(bytes) => bytes,
            Err(source) => {
                mp_warn!("dropping image {url}: {source}");
                let error = ImageDownloadError::Fetch {
                    url: url.to_string(),
                    source,
                };
                return (Rewrite::Remove, ImageOutcome::Failed(error));
            }
        };

        let content_hash = hash_bytes(&bytes);
        if self.blocked_hashes.contains(&content_hash) {
            mp_debug!("image {url} is blocked ({content_hash})");
            return (
                Rewrite::Remove,
                ImageOutcome::Blocked {
                    url: url.to_string(),
                    content_hash,
                },
            );
        }

        let extension = extension_from_data_type(data_type);
        let filename = format!("{content_hash}.{extension}");
        let newly_written = match write_content_addressed(images_dir, &filename, &bytes) {
            Ok(written) => written,
            Err(err) => {
                mp_warn!("dropping image {url}: {err}");
                let error = ImageDownloadError::Store {
                    path: images_dir.join(&filename),
                    message: err.to_string(),
                };
                return (Rewrite::Remove, ImageOutcome::Failed(error));
            }
        };

        let relative_path = format!("./{IMAGES_DIR}/{filename}");
        (
            Rewrite::Point(relative_path.clone()),
            ImageOutcome::Localized {
                url: url.to_string(),
                image: LocalImage {
                    content_hash,
                    extension,
                    relative_path,
                },
                newly_written,
            },
        )
    }
}

fn collect_images(fragment: &ContentFragment) -> Vec<PendingImage> {
    let doc = fragment.document();
    images_in_order(&doc)
        .into_iter()
        .map(|img| {
            let attr = |name: &str| {
                img.value()
                    .attr(name)
                    .map(str::trim)
                    .filter(|value| !value.is_empty() && !value.starts_with("data:"))
                    .map(str::to_string)
            };
            PendingImage {
                source: attr("data-src").or_else(|| attr("src")),
                data_type: img.value().attr("data-type").map(str::to_string),
            }
        })
        .collect()
}

struct ImageRewriter {
    rewrites: Vec<Rewrite>,
    next: usize,
}

impl ElementRewriter for ImageRewriter {
    fn rewrite(
        &mut self,
        element: ElementRef<'_>,
        attrs: &mut Vec<(String, String)>,
    ) -> ElementAction {
        if element.value().name() != "img" {
            return ElementAction::Keep;
        }
        let rewrite = self.rewrites.get(self.next).cloned().unwrap_or(Rewrite::Keep);
        self.next += 1;
        match rewrite {
            Rewrite::Keep => ElementAction::Keep,
            Rewrite::Remove => ElementAction::Remove,
            Rewrite::Point(path) => {
                set_attr(attrs, "data-src", &path);
                set_attr(attrs, "src", &path);
                ElementAction::Keep
            }
        }
    }
}

fn set_attr(attrs: &mut Vec<(String, String)>, name: &str, value: &str) {
    match attrs.iter_mut().find(|(attr, _)| attr == name) {
        Some((_, existing)) => *existing = value.to_string(),
        None => attrs.push((name.to_string(), value.to_string())),
    }
}

/// Absolute download URL for an image reference found in an article.
pub fn normalize_image_url(raw: &str) -> String {
    let url = raw.trim().replace(' ', "%20");
    if url.starts_with("//") {
        format!("https:{url}")
    } else if url.starts_with("http://") || url.starts_with("https://") {
        url
    } else if url.starts_with('/') {
        format!("{MP_ORIGIN}{url}")
    } else {
        format!("{MP_ORIGIN}/{url}")
    }
}

/// File extension from WeChat's `data-type` attribute (`png`, `gif`, `jpeg`...).
pub fn extension_from_data_type(data_type: Option<&str>) -> String {
    let ext: String = data_type
        .unwrap_or_default()
        .split('?')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if ext.is_empty() {
        DEFAULT_EXTENSION.to_string()
    } else {
        ext
    }
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
