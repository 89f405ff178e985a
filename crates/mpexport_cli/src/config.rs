use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mpexport_engine::{BatchPacing, ClientOptions, ExportFormat, FilterConfig, OutputLayout};
use serde::{Deserialize, Serialize};

use crate::cli::GlobalArgs;

/// Contents of the optional RON config file. Every key may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub cookie: Option<String>,
    pub token: Option<String>,
    pub user_agent: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub format: Option<ExportFormat>,
    pub layout: Option<OutputLayout>,
    pub filter: FilterConfig,
    pub pacing: Option<BatchPacing>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        ron::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }
}

/// Effective settings after layering flags and env over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub client: ClientOptions,
    pub output_dir: PathBuf,
    pub format: ExportFormat,
    pub layout: OutputLayout,
    pub filter: FilterConfig,
    pub pacing: BatchPacing,
}

impl Settings {
    pub fn resolve(args: &GlobalArgs, file: FileConfig) -> Self {
        let defaults = ClientOptions::default();
        let client = ClientOptions {
            cookie: args.cookie.clone().or(file.cookie),
            token: args.token.clone().or(file.token),
            user_agent: args
                .user_agent
                .clone()
                .or(file.user_agent)
                .unwrap_or(defaults.user_agent),
        };

        Self {
            client,
            output_dir: args
                .output
                .clone()
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            format: args
                .format
                .map(ExportFormat::from)
                .or(file.format)
                .unwrap_or_default(),
            layout: file.layout.unwrap_or_default(),
            filter: file.filter,
            pacing: file.pacing.unwrap_or_default(),
        }
    }
}

pub fn load_settings(args: &GlobalArgs) -> Result<Settings> {
    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    Ok(Settings::resolve(args, file))
}
