mod common;

use std::sync::Arc;

use common::{article_page, exporter, init_logging, StubClient, TestSink};
use mpexport_engine::{
    ArticleSource, BatchPacing, BatchRunner, ExportFormat, FilterConfig, NullProgressSink,
    OutputLayout, PauseRange,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const A: &str = "https://mp.weixin.qq.com/s/a";
const B: &str = "https://mp.weixin.qq.com/s/b";
const C: &str = "https://mp.weixin.qq.com/s/c";

fn three_articles() -> StubClient {
    StubClient::new()
        .with_page(A, article_page("甲", "<p>一</p>"))
        .with_page(B, article_page("乙", "<p>二</p>"))
        .with_page(C, article_page("丙", "<p>三</p>"))
}

fn sources(urls: &[&str]) -> Vec<ArticleSource> {
    urls.iter().map(|url| ArticleSource::from_url(*url)).collect()
}

#[tokio::test(start_paused = true)]
async fn exports_every_article_in_order() {
    init_logging();
    let client = Arc::new(three_articles());
    let exporter = exporter(client.clone(), FilterConfig::default());
    let out = TempDir::new().unwrap();
    let runner = BatchRunner::new(&exporter, BatchPacing::default(), CancellationToken::new());

    let report = runner
        .run(
            sources(&[A, B, C]),
            Vec::new(),
            out.path(),
            ExportFormat::Markdown,
            OutputLayout::Flat,
            &NullProgressSink,
        )
        .await;

    assert_eq!(report.summary.succeeded, 3);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(client.page_urls(), vec![A, B, C]);
    assert!(out.path().join("甲.md").is_file());
    assert!(out.path().join("丙.md").is_file());
}

#[tokio::test(start_paused = true)]
async fn pauses_fall_between_articles() {
    let client = Arc::new(three_articles());
    let exporter = exporter(client.clone(), FilterConfig::default());
    let out = TempDir::new().unwrap();
    let pacing = BatchPacing {
        after_success: PauseRange::from_secs(3, 3),
        ..BatchPacing::default()
    };
    let runner = BatchRunner::new(&exporter, pacing, CancellationToken::new());

    runner
        .run(
            sources(&[A, B]),
            Vec::new(),
            out.path(),
            ExportFormat::Markdown,
            OutputLayout::Flat,
            &NullProgressSink,
        )
        .await;

    let calls = client.page_calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].1 - calls[0].1 >= std::time::Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn failures_are_recorded_and_the_batch_continues() {
    let client = Arc::new(three_articles());
    let exporter = exporter(client.clone(), FilterConfig::default());
    let out = TempDir::new().unwrap();
    let runner = BatchRunner::new(&exporter, BatchPacing::none(), CancellationToken::new());
    let missing = "https://mp.weixin.qq.com/s/missing";

    let report = runner
        .run(
            sources(&[A, missing, C]),
            Vec::new(),
            out.path(),
            ExportFormat::Markdown,
            OutputLayout::Flat,
            &NullProgressSink,
        )
        .await;

    assert_eq!(report.summary.succeeded, 2);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.failures[0].url, missing);
    assert_eq!(report.exported.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn duplicates_and_already_exported_urls_are_skipped() {
    let client = Arc::new(three_articles());
    let exporter = exporter(client.clone(), FilterConfig::default());
    let out = TempDir::new().unwrap();
    let runner = BatchRunner::new(&exporter, BatchPacing::none(), CancellationToken::new());

    let report = runner
        .run(
            sources(&[A, "https://mp.weixin.qq.com/s/a#rd", B, C]),
            vec![C.to_string()],
            out.path(),
            ExportFormat::Markdown,
            OutputLayout::Flat,
            &NullProgressSink,
        )
        .await;

    assert_eq!(client.page_urls(), vec![A, B]);
    assert_eq!(report.summary.skipped_duplicates, 2);
    assert_eq!(report.completed_urls.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn cancelled_batch_never_starts_another_fetch() {
    let client = Arc::new(three_articles());
    let exporter = exporter(client.clone(), FilterConfig::default());
    let out = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    let pacing = BatchPacing {
        after_success: PauseRange::from_secs(60, 60),
        ..BatchPacing::default()
    };
    let runner = BatchRunner::new(&exporter, pacing, cancel.clone());

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        trigger.cancel();
    });

    let started = tokio::time::Instant::now();
    let report = runner
        .run(
            sources(&[A, B, C]),
            Vec::new(),
            out.path(),
            ExportFormat::Markdown,
            OutputLayout::Flat,
            &TestSink::new(),
        )
        .await;

    assert!(started.elapsed() < std::time::Duration::from_secs(60));
    assert_eq!(client.page_urls(), vec![A]);
    assert!(report.summary.stopped);
    assert_eq!(report.summary.succeeded, 1);
    assert_eq!(report.summary.not_started, 2);
}

#[tokio::test(start_paused = true)]
async fn cancelled_before_start_exports_nothing() {
    let client = Arc::new(three_articles());
    let exporter = exporter(client.clone(), FilterConfig::default());
    let out = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let runner = BatchRunner::new(&exporter, BatchPacing::none(), cancel);

    let report = runner
        .run(
            sources(&[A, B]),
            Vec::new(),
            out.path(),
            ExportFormat::Markdown,
            OutputLayout::Flat,
            &NullProgressSink,
        )
        .await;

    assert!(client.page_urls().is_empty());
    assert_eq!(report.summary.not_started, 2);
    assert!(report.summary.stopped);
}

#[tokio::test(start_paused = true)]
async fn account_layout_groups_files_by_account() {
    let client = Arc::new(three_articles());
    let exporter = exporter(client, FilterConfig::default());
    let out = TempDir::new().unwrap();
    let runner = BatchRunner::new(&exporter, BatchPacing::none(), CancellationToken::new());
    let mut source = ArticleSource::from_url(A);
    source.account = Some("某公众号".to_string());

    let report = runner
        .run(
            vec![source],
            Vec::new(),
            out.path(),
            ExportFormat::Html,
            OutputLayout::Account,
            &NullProgressSink,
        )
        .await;

    assert_eq!(report.exported[0].filepath, out.path().join("某公众号").join("甲.html"));
    assert!(out.path().join("某公众号").join("images").is_dir());
}
