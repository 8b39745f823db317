use crate::columns::{ColumnResolver, LogicalColumn, PositionalColumns};
use crate::error::ImportError;
use crate::formats::{
    ContentType, MAX_TITLE_CHARS, ParsedContentItem, ParsedModule, position, truncate_chars,
};
use crate::heuristics::{DurationPolicy, infer_content_type};
use crate::links::{ResolvedLink, UrlPattern, host_label, resolve_links};
use crate::table::{SheetRow, SheetTable};

#[derive(Clone, Copy)]
pub struct FoldOptions<'a> {
    pub resolver: &'a dyn ColumnResolver,
    pub url_pattern: UrlPattern,
    pub durations: DurationPolicy,
}

impl Default for FoldOptions<'_> {
    fn default() -> Self {
        Self {
            resolver: &PositionalColumns,
            url_pattern: UrlPattern::default(),
            durations: DurationPolicy::CONTENT_ITEM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldedCourse {
    /// Name of the first module; used as the course title.
    pub course_name: String,
    pub modules: Vec<ParsedModule>,
    pub warnings: Vec<String>,
}

/// Folds table rows into modules. A non-blank topic cell starts a module;
/// body and resources cells feed the module that is open at that row.
pub fn fold_rows(table: &SheetTable, options: &FoldOptions<'_>) -> Result<FoldedCourse, ImportError> {
    let FoldState {
        course_name,
        mut modules,
        current,
    } = table
        .rows
        .iter()
        .fold(FoldState::default(), |state, row| {
            state.step(&table.headers, row, options)
        });
    modules.extend(current);

    let Some(course_name) = course_name else {
        return Err(ImportError::NoModulesFound);
    };

    let mut warnings = Vec::new();
    for module in &mut modules {
        module.recompute_duration();
        if module.contents.is_empty() {
            tracing::warn!(
                module_order = module.module_order,
                module_name = %module.module_name,
                "module has no content items"
            );
            warnings.push(format!(
                "module {} ({:?}) has no content items",
                module.module_order, module.module_name
            ));
        }
    }

    Ok(FoldedCourse {
        course_name,
        modules,
        warnings,
    })
}

#[derive(Debug, Default)]
struct FoldState {
    course_name: Option<String>,
    modules: Vec<ParsedModule>,
    current: Option<ParsedModule>,
}

impl FoldState {
    fn step(mut self, headers: &[String], row: &SheetRow, options: &FoldOptions<'_>) -> Self {
        let cell = |column| options.resolver.resolve(headers, row, column).trim();

        let topic = cell(LogicalColumn::Topic);
        if !topic.is_empty() {
            self.modules.extend(self.current.take());
            let module_name = truncate_chars(topic, MAX_TITLE_CHARS);
            self.course_name.get_or_insert_with(|| module_name.clone());

            let week = cell(LogicalColumn::Week);
            self.current = Some(ParsedModule {
                module_name,
                module_description: String::new(),
                module_order: position(self.modules.len()),
                estimated_duration_minutes: 0,
                week: (!week.is_empty()).then(|| week.to_owned()),
                contents: Vec::new(),
            });
        }

        let body = cell(LogicalColumn::Body);
        let resources = cell(LogicalColumn::Resources);
        if body.is_empty() && resources.is_empty() {
            return self;
        }

        match self.current.as_mut() {
            Some(module) => append_row(module, body, resources, options),
            None => {
                tracing::debug!(line = row.line, "row content before first topic; ignoring");
            }
        }
        self
    }
}

fn append_row(module: &mut ParsedModule, body: &str, resources: &str, options: &FoldOptions<'_>) {
    if !body.is_empty() {
        if !module.module_description.is_empty() {
            module.module_description.push('\n');
        }
        module.module_description.push_str(body);
    }

    let links = resolve_links(resources, options.url_pattern);
    if links.is_empty() {
        // Resources text with no URL in it still carries content.
        let text = if body.is_empty() { resources } else { body };
        let order = position(module.contents.len());
        let no_urls: [&str; 0] = [];
        module.contents.push(ParsedContentItem {
            content_title: content_title(&module.module_name, order, None),
            content_description: text.to_owned(),
            content_url: String::new(),
            content_type: ContentType::Text,
            content_order: order,
            estimated_duration_minutes: options.durations.estimate(text, &no_urls),
        });
        return;
    }

    for (idx, link) in links.iter().enumerate() {
        let order = position(module.contents.len());
        let description = if idx == 0 && !body.is_empty() {
            body.to_owned()
        } else {
            link.label.clone().unwrap_or_default()
        };
        module.contents.push(ParsedContentItem {
            content_title: content_title(&module.module_name, order, Some(link)),
            content_type: infer_content_type(Some(&link.url)),
            estimated_duration_minutes: options.durations.estimate(&description, &[&link.url]),
            content_description: description,
            content_url: link.url.clone(),
            content_order: order,
        });
    }
}

/// First item of a module reuses the module name; later items prefer the
/// markdown label, then the URL host, then a positional suffix.
fn content_title(module_name: &str, order: u32, link: Option<&ResolvedLink>) -> String {
    if order == 1 {
        return truncate_chars(module_name, MAX_TITLE_CHARS);
    }
    let title = match link {
        Some(ResolvedLink {
            label: Some(label), ..
        }) => label.clone(),
        Some(ResolvedLink { url, label: None }) => match host_label(url) {
            Some(host) => format!("{module_name} - {host}"),
            None => format!("{module_name} - Part {order}"),
        },
        None => format!("{module_name} - Part {order}"),
    };
    truncate_chars(&title, MAX_TITLE_CHARS)
}
