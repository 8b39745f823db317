use std::fmt;

use crate::table::SheetRow;

/// The four logical columns the importer reads from each row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalColumn {
    /// Grouping column (week / phase).
    Week,
    /// Non-blank value starts a new module.
    Topic,
    /// Free text appended to the module description.
    Body,
    /// Free text that may embed URLs and markdown links.
    Resources,
}

impl LogicalColumn {
    fn position(self) -> usize {
        match self {
            Self::Week => 0,
            Self::Topic => 1,
            Self::Body => 2,
            Self::Resources => 3,
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Week => &["week", "weeks", "day", "phase"],
            Self::Topic => &["training topic", "topics", "topic", "module name"],
            Self::Body => &["modules", "module", "content", "description", "details"],
            Self::Resources => &["resources", "resource", "links", "materials"],
        }
    }
}

impl fmt::Display for LogicalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Week => "week",
            Self::Topic => "topic",
            Self::Body => "body",
            Self::Resources => "resources",
        };
        f.write_str(name)
    }
}

/// Decides which cell of a row backs a logical column.
pub trait ColumnResolver: Send + Sync {
    fn resolve<'r>(&self, headers: &[String], row: &'r SheetRow, column: LogicalColumn) -> &'r str;
}

/// Column-access policy selectable from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ColumnStrategy {
    #[default]
    Position,
    Header,
}

impl ColumnStrategy {
    pub fn resolver(self) -> &'static dyn ColumnResolver {
        match self {
            Self::Position => &PositionalColumns,
            Self::Header => &HeaderAliasColumns,
        }
    }
}

/// Fixed positions: 0 week, 1 topic, 2 body, 3 resources. Survives renamed headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalColumns;

impl ColumnResolver for PositionalColumns {
    fn resolve<'r>(&self, _headers: &[String], row: &'r SheetRow, column: LogicalColumn) -> &'r str {
        row.cell(column.position())
    }
}

/// Case-insensitive header matching against known aliases. Survives reordered columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderAliasColumns;

impl HeaderAliasColumns {
    pub fn header_index(headers: &[String], column: LogicalColumn) -> Option<usize> {
        let aliases = column.aliases();
        // Earlier aliases win, so "Training Topic" beats a stray "Topic" column.
        aliases.iter().find_map(|alias| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(alias))
        })
    }
}

impl ColumnResolver for HeaderAliasColumns {
    fn resolve<'r>(&self, headers: &[String], row: &'r SheetRow, column: LogicalColumn) -> &'r str {
        Self::header_index(headers, column).map_or("", |idx| row.cell(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_owned()).collect()
    }

    fn row(cells: &[&str]) -> SheetRow {
        SheetRow {
            line: 2,
            cells: cells.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    #[test]
    fn positional_ignores_header_names() {
        let headers = headers(&["A", "B", "C", "D"]);
        let row = row(&["1", "Intro", "Body", "https://x.com"]);
        let resolver = PositionalColumns;
        assert_eq!(resolver.resolve(&headers, &row, LogicalColumn::Topic), "Intro");
        assert_eq!(
            resolver.resolve(&headers, &row, LogicalColumn::Resources),
            "https://x.com"
        );
    }

    #[test]
    fn positional_treats_missing_cells_as_blank() {
        let row = row(&["1", "Intro"]);
        assert_eq!(PositionalColumns.resolve(&[], &row, LogicalColumn::Resources), "");
    }

    #[test]
    fn header_aliases_follow_reordered_columns() {
        let headers = headers(&["Resources", " topics ", "Week", "Modules"]);
        let row = row(&["https://x.com", "Intro", "1", "Body"]);
        let resolver = HeaderAliasColumns;
        assert_eq!(resolver.resolve(&headers, &row, LogicalColumn::Topic), "Intro");
        assert_eq!(resolver.resolve(&headers, &row, LogicalColumn::Week), "1");
        assert_eq!(resolver.resolve(&headers, &row, LogicalColumn::Body), "Body");
    }

    #[test]
    fn header_aliases_prefer_earlier_alias() {
        let headers = headers(&["Topic", "Training Topic"]);
        assert_eq!(
            HeaderAliasColumns::header_index(&headers, LogicalColumn::Topic),
            Some(1)
        );
    }

    #[test]
    fn unknown_headers_resolve_blank() {
        let headers = headers(&["Foo", "Bar"]);
        let row = row(&["a", "b"]);
        assert_eq!(HeaderAliasColumns.resolve(&headers, &row, LogicalColumn::Topic), "");
    }
}
