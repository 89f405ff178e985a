use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use mpexport_core::{
    update, ArticleId, ArticleOutcome, BatchState, BatchSummary, Effect, Msg, QueuedArticle,
};
use mpexport_logging::{mp_info, mp_warn};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::filename::sanitize_stem;
use crate::pace::{pause, BatchPacing};
use crate::pipeline::ArticleExporter;
use crate::title::publish_year_month;
use crate::{ArticleSource, ExportFormat, ExportResult, ProgressSink};

/// Where each article of a batch is written, relative to the output root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputLayout {
    #[default]
    Flat,
    /// `<root>/<account>`
    Account,
    /// `<root>/<account>/<year>/<month>`
    AccountByMonth,
}

impl OutputLayout {
    pub fn directory_for(self, root: &Path, source: &ArticleSource) -> PathBuf {
        let account_dir = || match source.account.as_deref() {
            Some(account) if !account.trim().is_empty() => root.join(sanitize_stem(account)),
            _ => root.to_path_buf(),
        };
        match self {
            OutputLayout::Flat => root.to_path_buf(),
            OutputLayout::Account => account_dir(),
            OutputLayout::AccountByMonth => {
                match source.publish_time.as_deref().and_then(publish_year_month) {
                    Some((year, month)) => account_dir()
                        .join(year.to_string())
                        .join(format!("{month:02}")),
                    None => account_dir().join("unknown"),
                }
            }
        }
    }
}

impl FromStr for OutputLayout {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(OutputLayout::Flat),
            "account" => Ok(OutputLayout::Account),
            "account-by-month" | "account_by_month" | "month" => Ok(OutputLayout::AccountByMonth),
            other => Err(format!("unknown output layout `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub exported: Vec<ExportResult>,
    /// Dedupe keys of every article known to be exported, restored ones included.
    pub completed_urls: Vec<String>,
}

/// Exports articles one at a time with randomized pauses in between.
///
/// Cancelling the token stops the batch before the next fetch; an article
/// already in flight is allowed to finish.
pub struct BatchRunner<'a> {
    exporter: &'a ArticleExporter,
    pacing: BatchPacing,
    cancel: CancellationToken,
}

impl<'a> BatchRunner<'a> {
    pub fn new(exporter: &'a ArticleExporter, pacing: BatchPacing, cancel: CancellationToken) -> Self {
        Self {
            exporter,
            pacing,
            cancel,
        }
    }

    pub async fn run(
        &self,
        sources: Vec<ArticleSource>,
        already_exported: Vec<String>,
        output_dir: &Path,
        format: ExportFormat,
        layout: OutputLayout,
        sink: &dyn ProgressSink,
    ) -> BatchReport {
        let mut by_id: HashMap<ArticleId, ArticleSource> = HashMap::new();
        let mut queued = Vec::with_capacity(sources.len());
        for (idx, source) in sources.into_iter().enumerate() {
            let id = idx as ArticleId + 1;
            queued.push(QueuedArticle {
                id,
                url: source.url.clone(),
                title: source.title.clone(),
            });
            by_id.insert(id, source);
        }

        let (state, _) = update(BatchState::new(), Msg::RestoreCompleted(already_exported));
        let (mut state, _) = update(state, Msg::ArticlesQueued(queued));
        let mut exported = Vec::new();
        let mut next = Some(Msg::Start);

        while let Some(msg) = next.take() {
            let (new_state, effects) = update(state, msg);
            state = new_state;

            for effect in effects {
                next = match effect {
                    Effect::ExportArticle { id, url } => {
                        if self.cancel.is_cancelled() {
                            Some(Msg::StopRequested)
                        } else {
                            state = update(state, Msg::ArticleStarted { id }).0;
                            let outcome = match by_id.get(&id) {
                                Some(source) => {
                                    let dir = layout.directory_for(output_dir, source);
                                    match self.exporter.export(source, &dir, format, sink).await {
                                        Ok(result) => {
                                            let filepath = result.filepath.display().to_string();
                                            exported.push(result);
                                            ArticleOutcome::Exported { filepath }
                                        }
                                        Err(err) => {
                                            mp_warn!("article {url} failed: {err}");
                                            ArticleOutcome::Failed {
                                                message: err.to_string(),
                                            }
                                        }
                                    }
                                }
                                None => ArticleOutcome::Failed {
                                    message: format!("no source queued for {url}"),
                                },
                            };
                            Some(Msg::ArticleFinished { id, outcome })
                        }
                    }
                    Effect::Pause { after_failure } => {
                        let range = if after_failure {
                            self.pacing.after_failure
                        } else {
                            self.pacing.after_success
                        };
                        if pause(range.sample(), &self.cancel).await {
                            Some(Msg::PauseElapsed)
                        } else {
                            Some(Msg::StopRequested)
                        }
                    }
                    Effect::Finish => None,
                };
            }
        }

        let summary = state.summary();
        mp_info!(
            "batch finished: {} exported, {} failed, {} not started{}",
            summary.succeeded,
            summary.failed,
            summary.not_started,
            if summary.stopped { " (stopped)" } else { "" }
        );
        BatchReport {
            summary,
            exported,
            completed_urls: state.completed_urls(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(account: Option<&str>, time: Option<&str>) -> ArticleSource {
        ArticleSource {
            url: "https://mp.weixin.qq.com/s/x".to_string(),
            title: None,
            publish_time: time.map(str::to_string),
            account: account.map(str::to_string),
        }
    }

    #[test]
    fn flat_layout_ignores_account() {
        let dir = OutputLayout::Flat.directory_for(Path::new("out"), &source(Some("号"), None));
        assert_eq!(dir, PathBuf::from("out"));
    }

    #[test]
    fn account_layout_sanitizes_the_name() {
        let dir = OutputLayout::Account.directory_for(Path::new("out"), &source(Some("a/b"), None));
        assert_eq!(dir, Path::new("out").join("a_b"));
    }

    #[test]
    fn month_layout_falls_back_to_unknown() {
        let layout = OutputLayout::AccountByMonth;
        let dir = layout.directory_for(Path::new("out"), &source(Some("号"), Some("n/a")));
        assert_eq!(dir, Path::new("out").join("号").join("unknown"));

        let dated = layout.directory_for(Path::new("out"), &source(None, Some("1700000000")));
        assert!(dated.starts_with(Path::new("out").join("2023")));
    }

    #[test]
    fn layout_names_parse() {
        assert_eq!(
            "account-by-month".parse::<OutputLayout>(),
            Ok(OutputLayout::AccountByMonth)
        );
        assert!("nested".parse::<OutputLayout>().is_err());
    }
}
