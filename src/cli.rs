//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::report::PageId;
use crate::sentiment::KeywordConfig;

/// Output format for page reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Structured payload for an interactive front end
    Json,
    /// Static report markup
    Markdown,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Markdown => "md",
        }
    }
}

/// Survey analytics: clean a questionnaire export and report on it page by page
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the survey CSV file
    #[arg(short, long, default_value = "data/survey.csv")]
    pub input: PathBuf,

    /// Page to build; all pages when omitted
    #[arg(short, long, value_enum)]
    pub page: Option<PageId>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = Format::Markdown)]
    pub format: Format,

    /// Directory to write reports into instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also render PNG charts into the output directory
    #[arg(long)]
    pub charts: bool,

    /// TOML file overriding the sentiment and barrier keyword lists
    #[arg(short, long)]
    pub keywords: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Pages selected on the command line, in navigation order.
    pub fn pages(&self) -> Vec<PageId> {
        match self.page {
            Some(page) => vec![page],
            None => PageId::ALL.to_vec(),
        }
    }

    /// Keyword lists from `--keywords`, or the built-in defaults.
    pub fn keyword_config(&self) -> crate::Result<KeywordConfig> {
        match &self.keywords {
            Some(path) => KeywordConfig::from_path(path),
            None => Ok(KeywordConfig::default()),
        }
    }

    /// Where charts go: the output directory, or `charts/` when printing to stdout.
    pub fn chart_dir(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| PathBuf::from("charts"))
    }
}
