use std::collections::{BTreeMap, BTreeSet, VecDeque};

use url::Url;

pub type ArticleId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    /// Stop requested while an article was in flight; finishes once it completes.
    Stopping,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedArticle {
    pub id: ArticleId,
    pub url: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleOutcome {
    Exported { filepath: String },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    pub url: String,
    pub title: Option<String>,
    pub started: bool,
    pub outcome: Option<ArticleOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchState {
    session: SessionState,
    queue: VecDeque<ArticleId>,
    articles: BTreeMap<ArticleId, ArticleRecord>,
    current: Option<ArticleId>,
    /// Dedupe keys of every queued or previously exported URL.
    seen: BTreeSet<String>,
    /// Dedupe keys of URLs exported by earlier runs or by this one.
    completed: BTreeSet<String>,
    skipped_duplicates: usize,
    stop_requested: bool,
}

impl BatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn current(&self) -> Option<ArticleId> {
        self.current
    }

    pub fn record(&self, id: ArticleId) -> Option<&ArticleRecord> {
        self.articles.get(&id)
    }

    pub fn records(&self) -> impl Iterator<Item = (ArticleId, &ArticleRecord)> {
        self.articles.iter().map(|(id, record)| (*id, record))
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    pub fn skipped_duplicates(&self) -> usize {
        self.skipped_duplicates
    }

    /// Dedupe keys of everything exported so far, including restored ones.
    pub fn completed_urls(&self) -> Vec<String> {
        self.completed.iter().cloned().collect()
    }

    pub(crate) fn set_session(&mut self, session: SessionState) {
        self.session = session;
    }

    pub(crate) fn restore_completed(&mut self, urls: Vec<String>) {
        for url in urls {
            let key = normalize_url_for_dedupe(&url);
            if key.is_empty() {
                continue;
            }
            self.seen.insert(key.clone());
            self.completed.insert(key);
        }
    }

    pub(crate) fn enqueue(&mut self, articles: Vec<QueuedArticle>) {
        for article in articles {
            let key = normalize_url_for_dedupe(&article.url);
            if key.is_empty() || self.articles.contains_key(&article.id) {
                continue;
            }
            if !self.seen.insert(key) {
                self.skipped_duplicates += 1;
                continue;
            }
            self.queue.push_back(article.id);
            self.articles.insert(
                article.id,
                ArticleRecord {
                    url: article.url,
                    title: article.title,
                    started: false,
                    outcome: None,
                },
            );
        }
    }

    /// Pops the next queued article and makes it current.
    pub(crate) fn pop_next(&mut self) -> Option<(ArticleId, String)> {
        let id = self.queue.pop_front()?;
        self.current = Some(id);
        self.articles.get(&id).map(|record| (id, record.url.clone()))
    }

    pub(crate) fn mark_started(&mut self, id: ArticleId) {
        if self.current != Some(id) {
            return;
        }
        if let Some(record) = self.articles.get_mut(&id) {
            record.started = true;
        }
    }

    pub(crate) fn current_started(&self) -> bool {
        self.current
            .and_then(|id| self.articles.get(&id))
            .map(|record| record.started)
            .unwrap_or(false)
    }

    pub(crate) fn finish_current(&mut self, outcome: ArticleOutcome) {
        let Some(id) = self.current.take() else {
            return;
        };
        if let Some(record) = self.articles.get_mut(&id) {
            if matches!(outcome, ArticleOutcome::Exported { .. }) {
                self.completed.insert(normalize_url_for_dedupe(&record.url));
            }
            record.outcome = Some(outcome);
        }
    }

    /// Puts a dispatched-but-not-started article back at the head of the queue.
    pub(crate) fn requeue_current(&mut self) {
        if let Some(id) = self.current.take() {
            self.queue.push_front(id);
        }
    }

    pub(crate) fn request_stop(&mut self) {
        self.stop_requested = true;
    }
}

/// Key used to detect the same article URL queued twice.
///
/// Drops the fragment (`#rd` on WeChat links), upgrades `http` to `https`
/// and lets `url` lowercase scheme and host. Unparseable input is only trimmed.
pub fn normalize_url_for_dedupe(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_fragment(None);
            if url.scheme() == "http" {
                let _ = url.set_scheme("https");
            }
            url.to_string()
        }
        Err(_) => trimmed.to_string(),
    }
}
