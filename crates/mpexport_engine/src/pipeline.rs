use std::path::Path;
use std::sync::Arc;

use mpexport_logging::{mp_debug, mp_info};

use crate::convert::{Converter, Html2MdConverter};
use crate::extract::{ExtractionError, Extractor, WeChatExtractor, UNTITLED_PLACEHOLDER};
use crate::fetch::{fetch_page_with_retry, HttpClient, RetryPolicy};
use crate::filename::article_filename;
use crate::filter::{ContentFilter, FilterConfig};
use crate::images::{ImageDownloadError, ImageLocalizer, ImageOutcome};
use crate::persist::{AtomicFileWriter, PersistError};
use crate::render::{render_html, render_markdown, ArticleHeader, SerializationError};
use crate::title::clean_title;
use crate::{
    ArticleSource, EngineEvent, ExportFormat, ExportResult, FetchError, ProgressSink, Stage,
};

#[derive(Debug, thiserror::Error)]
#[error("export failed while {stage}: {cause}")]
pub struct ExportError {
    pub stage: Stage,
    #[source]
    pub cause: ExportCause,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportCause {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

fn at_stage<E: Into<ExportCause>>(stage: Stage) -> impl FnOnce(E) -> ExportError {
    move |err| ExportError {
        stage,
        cause: err.into(),
    }
}

/// Runs one article through fetch, extract, localize, serialize, filter and write.
pub struct ArticleExporter {
    client: Arc<dyn HttpClient>,
    extractor: Box<dyn Extractor>,
    converter: Box<dyn Converter>,
    retry: RetryPolicy,
    filter: FilterConfig,
}

impl ArticleExporter {
    pub fn new(client: Arc<dyn HttpClient>, filter: FilterConfig) -> Self {
        Self {
            client,
            extractor: Box::new(WeChatExtractor::with_placeholder_title(UNTITLED_PLACEHOLDER)),
            converter: Box::new(Html2MdConverter),
            retry: RetryPolicy::default(),
            filter,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_extractor(mut self, extractor: Box<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn client(&self) -> &Arc<dyn HttpClient> {
        &self.client
    }

    pub async fn export(
        &self,
        source: &ArticleSource,
        output_dir: &Path,
        format: ExportFormat,
        sink: &dyn ProgressSink,
    ) -> Result<ExportResult, ExportError> {
        match self.run(source, output_dir, format, sink).await {
            Ok(result) => {
                mp_info!("exported {} to {}", source.url, result.filepath.display());
                sink.emit(EngineEvent::ArticleExported {
                    url: source.url.clone(),
                    filepath: result.filepath.clone(),
                });
                Ok(result)
            }
            Err(err) => {
                sink.emit(EngineEvent::ArticleFailed {
                    url: source.url.clone(),
                    stage: err.stage,
                    message: err.cause.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        source: &ArticleSource,
        output_dir: &Path,
        format: ExportFormat,
        sink: &dyn ProgressSink,
    ) -> Result<ExportResult, ExportError> {
        let stage = |stage: Stage| {
            sink.emit(EngineEvent::Stage {
                url: source.url.clone(),
                stage,
            })
        };

        stage(Stage::Fetching);
        let page = fetch_page_with_retry(self.client.as_ref(), &source.url, &self.retry, sink)
            .await
            .map_err(at_stage(Stage::Fetching))?;

        stage(Stage::Extracting);
        let article = self
            .extractor
            .extract(&page.html, &source.url)
            .map_err(at_stage(Stage::Extracting))?;
        if !article.content.has_content() {
            return Err(at_stage(Stage::Extracting)(ExtractionError::EmptyContent));
        }

        let raw_title = source.title.as_deref().unwrap_or(&article.title);
        let mut title = clean_title(raw_title);
        if title.is_empty() {
            title = UNTITLED_PLACEHOLDER.to_string();
        }
        let header = ArticleHeader {
            title,
            publish_time: source.publish_time.clone().or(article.publish_time),
            source_url: source.url.clone(),
        };

        stage(Stage::LocalizingImages);
        let localized = ImageLocalizer::new(self.client.as_ref(), &self.filter.image_hashes)
            .localize(&article.content, output_dir)
            .await
            .map_err(at_stage(Stage::LocalizingImages))?;
        for outcome in &localized.images {
            if let Some(event) = skipped_image_event(outcome) {
                sink.emit(event);
            }
        }
        mp_debug!(
            "{}: {} of {} images localized",
            source.url,
            localized.localized_count(),
            localized.images.len()
        );

        stage(Stage::Serializing);
        let content = match format {
            ExportFormat::Markdown => {
                let markdown =
                    render_markdown(&header, &localized.fragment, self.converter.as_ref())
                        .map_err(at_stage(Stage::Serializing))?;
                stage(Stage::Filtering);
                ContentFilter::new(&self.filter).apply(&markdown)
            }
            ExportFormat::Html => render_html(&header, &localized.fragment),
        };

        stage(Stage::Writing);
        let filename = article_filename(&header.title, format);
        let filepath = AtomicFileWriter::new(output_dir.to_path_buf())
            .write(&filename, &content)
            .map_err(at_stage(Stage::Writing))?;

        stage(Stage::Done);
        Ok(ExportResult { filepath, format })
    }
}

fn skipped_image_event(outcome: &ImageOutcome) -> Option<EngineEvent> {
    match outcome {
        ImageOutcome::Blocked { url, content_hash } => Some(EngineEvent::ImageSkipped {
            source: url.clone(),
            reason: format!("blocked hash {content_hash}"),
        }),
        ImageOutcome::Failed(err) => {
            let source = match err {
                ImageDownloadError::Fetch { url, .. } => url.clone(),
                ImageDownloadError::Store { path, .. } => path.display().to_string(),
            };
            Some(EngineEvent::ImageSkipped {
                source,
                reason: err.to_string(),
            })
        }
        ImageOutcome::Localized { .. } | ImageOutcome::MissingSource => None,
    }
}
