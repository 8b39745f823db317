use clap::{Args, Parser, Subcommand};

use crate::columns::ColumnStrategy;
use crate::heuristics::DurationMode;
use crate::links::UrlPattern;
use crate::output::OutputFormat;
use crate::store::StoreMode;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch a published spreadsheet tab and convert it into a course.
    Import(ImportArgs),
    /// Convert a local CSV export into a course.
    Parse(ParseArgs),
    /// Print the CSV export URL for a spreadsheet link.
    ExportUrl(ExportUrlArgs),
    /// Apply reviewer edits (rename, delete, reorder) to a course document.
    Edit(EditArgs),
    /// Hand a course document to the configured course store.
    Publish(PublishArgs),
}

#[derive(Debug, Args)]
pub struct SourceOptions {
    /// Output file (default: stdout).
    #[arg(long)]
    pub out: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// How spreadsheet columns are located.
    #[arg(long, value_enum, default_value_t = ColumnStrategy::Position)]
    pub columns: ColumnStrategy,

    /// Which URLs in the resources column are recognized.
    #[arg(long, value_enum, default_value_t = UrlPattern::Loose)]
    pub url_pattern: UrlPattern,

    /// Duration estimate bounds.
    #[arg(long, value_enum, default_value_t = DurationMode::Standard)]
    pub durations: DurationMode,

    /// Overwrite `--out` if it exists.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Spreadsheet link (…/spreadsheets/d/<id>/edit#gid=<tab>).
    #[arg(long)]
    pub url: String,

    #[command(flatten)]
    pub source: SourceOptions,
}

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// CSV file exported from the spreadsheet.
    #[arg(long)]
    pub csv: String,

    #[command(flatten)]
    pub source: SourceOptions,
}

#[derive(Debug, Args)]
pub struct ExportUrlArgs {
    /// Spreadsheet link.
    #[arg(long)]
    pub url: String,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Course document (JSON, or YAML by extension).
    #[arg(long)]
    pub input: String,

    /// Output file (default: stdout).
    #[arg(long)]
    pub out: Option<String>,

    /// Edit to apply, in order. e.g. `rename-module:2:Basics`,
    /// `delete-module:3`, `move-module:1:3`, `rename-content:1.2:Slides`,
    /// `delete-content:1.2`, `move-content:1:2:1`, `set-type:1.1:Video`,
    /// `rename-course:Onboarding`.
    #[arg(long = "op")]
    pub ops: Vec<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Overwrite `--out` if it exists.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct PublishArgs {
    /// Course document (JSON, or YAML by extension).
    #[arg(long)]
    pub input: String,

    /// Store to use (default: COURSEIMPORT_STORE, else `file`).
    #[arg(long, value_enum)]
    pub store: Option<StoreMode>,
}
