use std::path::PathBuf;

use anyhow::Context as _;

use crate::cli::{ExportUrlArgs, ImportArgs, ParseArgs, SourceOptions};
use crate::columns::{ColumnStrategy, HeaderAliasColumns, LogicalColumn};
use crate::error::ImportError;
use crate::fetch::{ExportFetcher, FetchConfig, HttpExportFetcher};
use crate::fold::{FoldOptions, fold_rows};
use crate::formats::{CourseInfo, ParsedCourseData};
use crate::heuristics::DurationMode;
use crate::links::UrlPattern;
use crate::output::write_document;
use crate::sheet_url::SheetUrl;
use crate::table::parse_table;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    pub columns: ColumnStrategy,
    pub url_pattern: UrlPattern,
    pub durations: DurationMode,
}

impl ImportOptions {
    fn fold_options(&self) -> FoldOptions<'static> {
        FoldOptions {
            resolver: self.columns.resolver(),
            url_pattern: self.url_pattern,
            durations: self.durations.policy(),
        }
    }
}

impl From<&SourceOptions> for ImportOptions {
    fn from(source: &SourceOptions) -> Self {
        Self {
            columns: source.columns,
            url_pattern: source.url_pattern,
            durations: source.durations,
        }
    }
}

/// Fetches a spreadsheet tab and folds it into a course. Never fails: every
/// error is reported inside the returned envelope.
pub async fn import_course(
    sheet_url: &str,
    fetcher: &dyn ExportFetcher,
    options: &ImportOptions,
) -> ParsedCourseData {
    into_envelope(try_import(sheet_url, fetcher, options).await)
}

async fn try_import(
    sheet_url: &str,
    fetcher: &dyn ExportFetcher,
    options: &ImportOptions,
) -> Result<ParsedCourseData, ImportError> {
    let sheet = SheetUrl::parse(sheet_url)?;
    let export_url = sheet.export_url();
    tracing::info!(
        %export_url,
        document_id = sheet.document_id(),
        gid = sheet.gid(),
        "fetch spreadsheet export"
    );
    let text = fetcher.fetch_text(&export_url).await?;
    build_course(&text, options)
}

/// Folds already-downloaded CSV text into a course.
pub fn parse_course_csv(text: &str, options: &ImportOptions) -> ParsedCourseData {
    into_envelope(build_course(text, options))
}

fn into_envelope(result: Result<ParsedCourseData, ImportError>) -> ParsedCourseData {
    match result {
        Ok(data) => {
            tracing::info!(
                modules = data.modules.len(),
                contents = data.content_count(),
                warnings = data.warnings.len(),
                "import succeeded"
            );
            data
        }
        Err(err) => {
            tracing::warn!(error = %err, "import failed");
            ParsedCourseData::failure(&err)
        }
    }
}

fn build_course(text: &str, options: &ImportOptions) -> Result<ParsedCourseData, ImportError> {
    let table = parse_table(text)?;
    if options.columns == ColumnStrategy::Header {
        for column in [
            LogicalColumn::Week,
            LogicalColumn::Topic,
            LogicalColumn::Body,
            LogicalColumn::Resources,
        ] {
            match HeaderAliasColumns::header_index(&table.headers, column) {
                Some(idx) => tracing::debug!(%column, header = %table.headers[idx], "column mapped"),
                None => tracing::debug!(%column, "column not found; treating as blank"),
            }
        }
    }

    let folded = fold_rows(&table, &options.fold_options())?;
    let course = CourseInfo {
        course_name: folded.course_name,
        course_description: course_description(folded.modules.len()),
    };

    Ok(ParsedCourseData {
        success: true,
        error: None,
        course,
        modules: folded.modules,
        warnings: folded.warnings,
    })
}

fn course_description(module_count: usize) -> String {
    let plural = if module_count == 1 { "" } else { "s" };
    format!("Imported from spreadsheet with {module_count} module{plural}")
}

pub async fn run(args: ImportArgs) -> anyhow::Result<()> {
    let config = FetchConfig::from_env().context("load fetch config")?;
    let fetcher = HttpExportFetcher::new(&config)?;
    let options = ImportOptions::from(&args.source);

    let data = import_course(&args.url, &fetcher, &options).await;
    finish(&data, &args.source)
}

pub fn parse(args: ParseArgs) -> anyhow::Result<()> {
    let csv_path = PathBuf::from(&args.csv);
    let text = std::fs::read_to_string(&csv_path)
        .with_context(|| format!("read csv: {}", csv_path.display()))?;
    let options = ImportOptions::from(&args.source);

    let data = parse_course_csv(&text, &options);
    finish(&data, &args.source)
}

pub fn export_url(args: ExportUrlArgs) -> anyhow::Result<()> {
    let sheet = SheetUrl::parse(&args.url)?;
    println!("{}", sheet.export_url());
    Ok(())
}

fn finish(data: &ParsedCourseData, source: &SourceOptions) -> anyhow::Result<()> {
    write_document(data, source.out.as_deref(), source.format, source.force)
        .context("write course")?;
    if let Some(error) = data.error.as_deref() {
        anyhow::bail!("{error}");
    }
    Ok(())
}
