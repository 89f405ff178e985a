use mpexport_engine::{EngineEvent, ProgressSink, Stage};
use mpexport_logging::{mp_debug, mp_info, mp_warn};

/// Forwards engine events to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::Stage { url, stage } => match stage {
                Stage::Fetching => mp_info!("Fetching {}", url),
                other => mp_debug!("{} {}", other, url),
            },
            EngineEvent::RetryScheduled {
                url,
                attempt,
                delay_secs,
            } => {
                mp_warn!("Retry {} for {} in {}s", attempt, url, delay_secs);
            }
            EngineEvent::ImageSkipped { source, reason } => {
                mp_warn!("Image skipped {}: {}", source, reason);
            }
            EngineEvent::ArticleExported { url, filepath } => {
                mp_info!("Exported {} -> {:?}", url, filepath);
            }
            EngineEvent::ArticleFailed {
                url,
                stage,
                message,
            } => {
                mp_warn!("Failed {} while {}: {}", url, stage, message);
            }
        }
    }
}
