#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ExportArticle { id: crate::ArticleId, url: String },
    /// Wait before the next article; shorter after a failure.
    Pause { after_failure: bool },
    Finish,
}
