//! mpexport engine: fetching, extraction, image localization, serialization
//! and the batch runner that drives the core state machine.
mod auth;
mod batch;
mod convert;
mod decode;
mod extract;
mod fetch;
mod filename;
mod filter;
mod fragment;
mod images;
mod markup;
mod mp_api;
mod options;
mod pace;
mod persist;
mod pipeline;
mod render;
mod title;
mod types;

pub use auth::{parse_token, token_from_url, AuthError, AuthProvider, Credentials, StaticAuth};
pub use batch::{BatchReport, BatchRunner, OutputLayout};
pub use convert::{Converter, Html2MdConverter};
pub use decode::{decode_html, DecodedHtml};
pub use extract::{ExtractionError, Extractor, FetchedArticle, WeChatExtractor, UNTITLED_PLACEHOLDER};
pub use fetch::{
    fetch_page_with_retry, FetchSettings, FetchedPage, HttpClient, ReqwestClient, RetryPolicy,
};
pub use filename::{article_filename, sanitize_stem};
pub use filter::{ContentFilter, FilterConfig, FilterError};
pub use fragment::ContentFragment;
pub use images::{
    extension_from_data_type, hash_bytes, normalize_image_url, ImageDownloadError,
    ImageLocalizer, ImageOutcome, LocalImage, LocalizedFragment, IMAGES_DIR,
};
pub use mp_api::{AccountInfo, ArticleSummary, MpApi, MpApiError};
pub use options::{ClientOptions, DEFAULT_USER_AGENT, MP_ORIGIN};
pub use pace::{pause, BatchPacing, PauseRange};
pub use persist::{ensure_output_dir, write_content_addressed, AtomicFileWriter, PersistError};
pub use pipeline::{ArticleExporter, ExportCause, ExportError};
pub use render::{
    clean_article_html, render_html, render_markdown, repair_link_targets, ArticleHeader,
    SerializationError,
};
pub use title::{clean_title, format_publish_time, publish_year_month};
pub use types::{
    ArticleSource, EngineEvent, ExportFormat, ExportResult, FailureKind,
    FetchError, NullProgressSink, ProgressSink, Stage,
};
