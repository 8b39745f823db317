use crate::error::ImportError;

/// A header row plus the non-empty data rows of a CSV export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<SheetRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    /// 1-based source line, for diagnostics.
    pub line: u64,
    pub cells: Vec<String>,
}

impl SheetRow {
    pub fn cell(&self, idx: usize) -> &str {
        self.cells.get(idx).map(String::as_str).unwrap_or_default()
    }
}

/// Parses CSV text with a header row. Rows whose cells are all blank are
/// skipped; any structural error fails the whole table.
pub fn parse_table(text: &str) -> Result<SheetTable, ImportError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    let mut skipped = 0_usize;
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            skipped += 1;
            continue;
        }
        rows.push(SheetRow {
            line: record.position().map_or(0, csv::Position::line),
            cells: record.iter().map(ToOwned::to_owned).collect(),
        });
    }

    tracing::debug!(
        columns = headers.len(),
        rows = rows.len(),
        skipped_blank_rows = skipped,
        "parsed csv table"
    );
    Ok(SheetTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_rows_and_keeps_quoted_newlines() -> anyhow::Result<()> {
        let csv = "Week,Training Topic,Modules,Resources\r\n\
1,Intro,\"line one\nline two\",https://example.com\r\n\
,,,\r\n\
\r\n\
2,Next,,\r\n";
        let table = parse_table(csv)?;
        assert_eq!(
            table.headers,
            vec!["Week", "Training Topic", "Modules", "Resources"]
        );
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cell(2), "line one\nline two");
        assert_eq!(table.rows[1].cell(1), "Next");
        assert_eq!(table.rows[1].cell(9), "");
        Ok(())
    }

    #[test]
    fn strips_byte_order_mark_from_first_header() -> anyhow::Result<()> {
        let table = parse_table("\u{feff}Week,Topic\n1,Intro\n")?;
        assert_eq!(table.headers[0], "Week");
        Ok(())
    }

    #[test]
    fn unequal_row_lengths_are_malformed() {
        let err = parse_table("a,b\n1,2,3\n").unwrap_err();
        assert!(matches!(err, ImportError::MalformedCsv { .. }), "{err:?}");
    }

    #[test]
    fn empty_input_yields_empty_table() -> anyhow::Result<()> {
        let table = parse_table("")?;
        assert!(table.headers.is_empty());
        assert!(table.rows.is_empty());
        Ok(())
    }
}
