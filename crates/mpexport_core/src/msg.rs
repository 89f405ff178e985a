#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Articles to export, in order. URLs already queued or restored are skipped.
    ArticlesQueued(Vec<crate::QueuedArticle>),
    /// URLs exported by an earlier run.
    RestoreCompleted(Vec<String>),
    /// Begin exporting the queue.
    Start,
    /// The runner began fetching the dispatched article.
    ArticleStarted { id: crate::ArticleId },
    /// The runner finished the current article.
    ArticleFinished {
        id: crate::ArticleId,
        outcome: crate::ArticleOutcome,
    },
    /// The pause between two articles ran to completion.
    PauseElapsed,
    /// Cooperative stop: no further article is started.
    StopRequested,
}
