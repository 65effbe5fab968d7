//! Command-line interface definition using clap.
//!
//! - [`Args`] - CLI argument structure
//! - [`Format`] / [`LocaleArg`] - value enums mapped onto the library types
//!
//! Flags override the values loaded from `--config`; anything left unset
//! keeps the library defaults.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{AccountConfig, AppConfig, Locale, MatchMode};
use crate::core::filter::DateRange;
use crate::error::Result;
use crate::format::OutputFormat;

/// Output path used when `--output` is not given.
pub const DEFAULT_OUTPUT: &str = "chatgrep_results.csv";

/// Export directory used when neither flags nor config name one.
pub const DEFAULT_EXPORT_DIR: &str = "exports";

/// Search Telegram groups for messages matching a keyword or regex,
/// spreading the work over several accounts.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatgrep")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    chatgrep --links groups.txt --keyword hiring
    chatgrep --link @rust_jobs --link https://t.me/+AbCdEf -k remote --cap 0
    chatgrep -l groups.txt -k 'rust|go' --regex --after 2024-01-01 -f excel
    chatgrep --config chatgrep.json --accounts 3 --stats")]
pub struct Args {
    /// File with group links, one per line
    #[arg(short, long, value_name = "FILE")]
    pub links: Option<PathBuf>,

    /// Group link (repeatable)
    #[arg(long = "link", value_name = "LINK")]
    pub link: Vec<String>,

    /// Keyword or regular expression to search for
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// Directory with Telegram Desktop JSON exports
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Treat the keyword as a regular expression
    #[arg(long)]
    pub regex: bool,

    /// Match case exactly
    #[arg(long)]
    pub case_sensitive: bool,

    /// Messages to check per group (0 = whole history)
    #[arg(long, value_name = "N")]
    pub cap: Option<usize>,

    /// Messages per history request
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Pause between history requests, in seconds
    #[arg(long, value_name = "SECS")]
    pub delay: Option<f64>,

    /// Only messages on or after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub after: Option<String>,

    /// Only messages on or before this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub before: Option<String>,

    /// Offline accounts to spread groups over, when the config has none
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub accounts: usize,

    /// JSON config file (accounts, links, search settings)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to output file
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    pub format: Format,

    /// Print activity statistics for the matches
    #[arg(long)]
    pub stats: bool,

    /// Language of placeholder names
    #[arg(long, value_enum)]
    pub locale: Option<LocaleArg>,

    /// Answer every N-th history request with a flood wait (testing aid)
    #[arg(long, value_name = "N", hide = true)]
    pub flood_every: Option<usize>,
}

impl Args {
    /// Merges the config file (if any) with the flags.
    pub fn to_app_config(&self) -> Result<AppConfig> {
        let mut app = match &self.config {
            Some(path) => AppConfig::from_json_file(path)?,
            None => AppConfig::default(),
        };

        if let Some(path) = &self.links {
            let content = std::fs::read_to_string(path)?;
            app.links.extend(content.lines().map(str::to_string));
        }
        app.links.extend(self.link.iter().cloned());

        let search = &mut app.search;
        if let Some(keyword) = &self.keyword {
            search.keyword.clone_from(keyword);
        }
        if self.regex {
            search.mode = MatchMode::Regex;
        }
        if self.case_sensitive {
            search.case_sensitive = true;
        }
        if let Some(cap) = self.cap {
            search.message_cap = cap;
        }
        if let Some(batch_size) = self.batch_size {
            search.batch_size = batch_size;
        }
        if let Some(delay) = self.delay {
            search.inter_batch_delay = delay;
        }
        if let Some(locale) = self.locale {
            search.locale = locale.into();
        }
        search.date_range = apply_dates(search.date_range, self.after.as_deref(), self.before.as_deref())?;

        if let Some(dir) = &self.export_dir {
            app.export_dir = Some(dir.clone());
        }
        if app.export_dir.is_none() {
            app.export_dir = Some(PathBuf::from(DEFAULT_EXPORT_DIR));
        }

        if app.accounts.is_empty() {
            app.accounts = offline_accounts(self.accounts);
        }

        Ok(app)
    }

    /// Output path, with the extension following `--format` when the
    /// default path is used.
    pub fn output_path(&self) -> String {
        if self.output != DEFAULT_OUTPUT {
            return self.output.clone();
        }
        let format: OutputFormat = self.format.into();
        format!("chatgrep_results.{}", format.extension())
    }
}

fn apply_dates(range: DateRange, after: Option<&str>, before: Option<&str>) -> Result<DateRange> {
    let mut range = range;
    if let Some(after) = after {
        range = range.with_date_from(after)?;
    }
    if let Some(before) = before {
        range = range.with_date_to(before)?;
    }
    Ok(range)
}

/// Placeholder credentials for providers that do not sign in.
fn offline_accounts(count: usize) -> Vec<AccountConfig> {
    (1..=count.max(1))
        .map(|i| {
            AccountConfig::new("offline", "offline", format!("offline-{}", i))
                .with_label(format!("account-{}", i))
        })
        .collect()
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Default)]
pub enum Format {
    /// Comma-separated CSV
    #[default]
    Csv,

    /// Excel workbook (.xlsx)
    #[value(alias = "xlsx")]
    Excel,

    /// JSON array
    Json,

    /// JSON Lines
    #[value(alias = "ndjson")]
    Jsonl,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> OutputFormat {
        match format {
            Format::Csv => OutputFormat::Csv,
            Format::Excel => OutputFormat::Excel,
            Format::Json => OutputFormat::Json,
            Format::Jsonl => OutputFormat::Jsonl,
        }
    }
}

/// Placeholder language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LocaleArg {
    En,
    Ru,
}

impl From<LocaleArg> for Locale {
    fn from(locale: LocaleArg) -> Locale {
        match locale {
            LocaleArg::En => Locale::En,
            LocaleArg::Ru => Locale::Ru,
        }
    }
}
