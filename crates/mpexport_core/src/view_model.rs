use crate::{ArticleId, ArticleOutcome, BatchState};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub not_started: usize,
    pub skipped_duplicates: usize,
    pub stopped: bool,
    pub failures: Vec<FailureRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRow {
    pub id: ArticleId,
    pub url: String,
    pub title: Option<String>,
    pub message: String,
}

impl BatchState {
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            skipped_duplicates: self.skipped_duplicates(),
            stopped: self.stop_requested(),
            ..BatchSummary::default()
        };
        for (id, record) in self.records() {
            summary.total += 1;
            match &record.outcome {
                Some(ArticleOutcome::Exported { .. }) => summary.succeeded += 1,
                Some(ArticleOutcome::Failed { message }) => {
                    summary.failed += 1;
                    summary.failures.push(FailureRow {
                        id,
                        url: record.url.clone(),
                        title: record.title.clone(),
                        message: message.clone(),
                    });
                }
                None => summary.not_started += 1,
            }
        }
        summary
    }
}
