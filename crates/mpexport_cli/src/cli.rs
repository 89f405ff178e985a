use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use mpexport_engine::{ExportFormat, OutputLayout};

/// Export WeChat official-account articles to Markdown or HTML.
#[derive(Debug, Parser)]
#[command(name = "mpexport", version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// RON config file.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Session cookie of a logged-in MP console.
    #[arg(long, global = true, env = "MPEXPORT_COOKIE", hide_env_values = true)]
    pub cookie: Option<String>,

    /// Session token (digits), or a console URL containing `token=`.
    #[arg(long, global = true, env = "MPEXPORT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    /// Output directory.
    #[arg(short, long, global = true, value_name = "DIR")]
    pub output: Option<PathBuf>,

    #[arg(short, long, global = true, value_enum)]
    pub format: Option<FormatArg>,

    /// Repeat for more detail (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Also write the log to this file.
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Export a single article.
    Article {
        url: String,
        /// Use this title instead of the one on the page.
        #[arg(long)]
        title: Option<String>,
        /// Publish time (unix seconds or free text).
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        account: Option<String>,
    },
    /// Export every URL listed in a file (`url[<TAB>title]` per line).
    Batch {
        file: PathBuf,
        #[command(flatten)]
        batch: BatchArgs,
    },
    /// Search accounts by name.
    Search {
        keyword: String,
        #[arg(long, default_value_t = 5)]
        count: u32,
    },
    /// List one page of an account's articles.
    List {
        fakeid: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 5)]
        count: u32,
    },
    /// Export every article of an account.
    Account {
        fakeid: String,
        /// Account nickname, used for the output directory.
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 5)]
        page_size: u32,
        #[command(flatten)]
        batch: BatchArgs,
    },
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    #[arg(long, value_enum)]
    pub layout: Option<LayoutArg>,

    /// Skip articles recorded as exported by a previous run.
    #[arg(long)]
    pub resume: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Markdown,
    Html,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Markdown => ExportFormat::Markdown,
            FormatArg::Html => ExportFormat::Html,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    Flat,
    Account,
    AccountByMonth,
}

impl From<LayoutArg> for OutputLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Flat => OutputLayout::Flat,
            LayoutArg::Account => OutputLayout::Account,
            LayoutArg::AccountByMonth => OutputLayout::AccountByMonth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "mpexport",
            "batch",
            "urls.txt",
            "--layout",
            "account-by-month",
            "-f",
            "html",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.global.format, Some(FormatArg::Html));
        assert_eq!(cli.global.verbose, 2);
        match cli.command {
            Command::Batch { batch, .. } => {
                assert_eq!(batch.layout, Some(LayoutArg::AccountByMonth));
                assert!(!batch.resume);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
