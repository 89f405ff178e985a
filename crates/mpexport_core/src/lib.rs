//! mpexport core: pure batch-export state machine and summary helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{
    normalize_url_for_dedupe, ArticleId, ArticleOutcome, ArticleRecord, BatchState,
    QueuedArticle, SessionState,
};
pub use update::update;
pub use view_model::{BatchSummary, FailureRow};
