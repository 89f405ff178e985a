use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use mpexport_core::BatchSummary;
use mpexport_engine::{
    format_publish_time, ArticleExporter, ArticleSource, AuthProvider, BatchRunner, ClientOptions,
    FetchSettings, HttpClient, MpApi, OutputLayout, ReqwestClient, StaticAuth,
};
use mpexport_logging::{mp_info, mp_warn};
use tokio_util::sync::CancellationToken;

use crate::cli::{BatchArgs, Command};
use crate::config::Settings;
use crate::persistence::{load_completed_urls, save_completed_urls};
use crate::progress::LogProgressSink;

pub async fn run(command: Command, settings: &Settings, cancel: CancellationToken) -> Result<()> {
    match command {
        Command::Article {
            url,
            title,
            date,
            account,
        } => {
            let source = ArticleSource {
                url,
                title,
                publish_time: date,
                account,
            };
            export_one(settings, &source).await
        }
        Command::Batch { file, batch } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("reading URL list {}", file.display()))?;
            let sources = parse_url_list(&text);
            if sources.is_empty() {
                bail!("no article URLs in {}", file.display());
            }
            export_batch(settings, sources, &batch, cancel).await
        }
        Command::Search { keyword, count } => {
            let api = mp_api(settings).await?;
            let accounts = api.search_accounts(&keyword, 0, count).await?;
            if accounts.is_empty() {
                println!("no accounts match `{keyword}`");
            }
            for account in accounts {
                println!("{}\t{}\t{}", account.fakeid, account.nickname, account.alias);
            }
            Ok(())
        }
        Command::List {
            fakeid,
            page,
            count,
        } => {
            let api = mp_api(settings).await?;
            for article in api.list_articles(&fakeid, page, count).await? {
                let published = article
                    .create_time
                    .map(|t| format_publish_time(&t.to_string()))
                    .unwrap_or_default();
                println!("{}\t{}\t{}", published, article.title, article.link);
            }
            Ok(())
        }
        Command::Account {
            fakeid,
            name,
            page_size,
            batch,
        } => {
            let api = mp_api(settings).await?;
            let articles = api
                .list_all_articles(&fakeid, page_size, settings.pacing.between_pages, &cancel)
                .await
                .with_context(|| format!("listing articles of {name}"))?;
            mp_info!("{} articles listed for {}", articles.len(), name);
            let sources = articles
                .iter()
                .filter(|article| !article.link.is_empty())
                .map(|article| article.to_source(Some(&name)))
                .collect();
            export_batch(settings, sources, &batch, cancel).await
        }
    }
}

/// One `url[<TAB>title]` per line; blank lines and `#` comments are skipped.
pub fn parse_url_list(text: &str) -> Vec<ArticleSource> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let (url, title) = match line.split_once('\t') {
                Some((url, title)) => (url.trim(), Some(title.trim())),
                None => (line, None),
            };
            ArticleSource {
                url: url.to_string(),
                title: title.filter(|t| !t.is_empty()).map(str::to_string),
                ..ArticleSource::default()
            }
        })
        .collect()
}

fn http_client(options: &ClientOptions) -> Result<Arc<dyn HttpClient>> {
    let client = ReqwestClient::new(FetchSettings::default(), options)
        .context("building HTTP client")?;
    Ok(Arc::new(client))
}

fn exporter(settings: &Settings) -> Result<ArticleExporter> {
    Ok(ArticleExporter::new(
        http_client(&settings.client)?,
        settings.filter.clone(),
    ))
}

async fn mp_api(settings: &Settings) -> Result<MpApi> {
    let credentials = StaticAuth::from_options(&settings.client)
        .credentials()
        .await
        .context("the MP console needs --cookie and --token")?;
    let options = ClientOptions {
        cookie: Some(credentials.cookie),
        ..settings.client.clone()
    };
    Ok(MpApi::new(http_client(&options)?, credentials.token))
}

async fn export_one(settings: &Settings, source: &ArticleSource) -> Result<()> {
    let exporter = exporter(settings)?;
    let dir = settings.layout.directory_for(&settings.output_dir, source);
    let result = exporter
        .export(source, &dir, settings.format, &LogProgressSink)
        .await
        .with_context(|| format!("exporting {}", source.url))?;
    println!("{}", result.filepath.display());
    Ok(())
}

async fn export_batch(
    settings: &Settings,
    sources: Vec<ArticleSource>,
    args: &BatchArgs,
    cancel: CancellationToken,
) -> Result<()> {
    let exporter = exporter(settings)?;
    let layout = args.layout.map(OutputLayout::from).unwrap_or(settings.layout);
    let root = settings.output_dir.as_path();
    let already_exported = if args.resume {
        load_completed_urls(root)
    } else {
        Vec::new()
    };

    let report = BatchRunner::new(&exporter, settings.pacing.clone(), cancel)
        .run(
            sources,
            already_exported,
            root,
            settings.format,
            layout,
            &LogProgressSink,
        )
        .await;

    save_completed_urls(root, &report.completed_urls);
    print_summary(&report.summary, root);
    if report.summary.failed > 0 {
        bail!("{} of {} articles failed", report.summary.failed, report.summary.total);
    }
    Ok(())
}

fn print_summary(summary: &BatchSummary, root: &Path) {
    println!(
        "exported {} of {} articles to {}",
        summary.succeeded,
        summary.total,
        root.display()
    );
    if summary.skipped_duplicates > 0 {
        println!("skipped {} already exported or duplicate URLs", summary.skipped_duplicates);
    }
    if summary.stopped {
        mp_warn!("Batch stopped; {} articles not started", summary.not_started);
        println!("stopped early, {} articles not started", summary.not_started);
    }
    for failure in &summary.failures {
        println!(
            "failed: {} ({}): {}",
            failure.title.as_deref().unwrap_or("-"),
            failure.url,
            failure.message
        );
    }
}
