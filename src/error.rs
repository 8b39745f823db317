/// Failure modes of a single import. Every variant ends up as the `error`
/// string of a failed [`crate::formats::ParsedCourseData`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    #[error(
        "invalid spreadsheet URL: expected a link like https://docs.google.com/spreadsheets/d/<id>/edit#gid=<tab> (got {0:?})"
    )]
    InvalidUrlFormat(String),

    #[error("failed to fetch spreadsheet: HTTP {status} {reason}")]
    FetchFailed { status: u16, reason: String },

    #[error(
        "spreadsheet is not publicly accessible (HTTP {status}); set sharing to \"Anyone with the link can view\" and try again"
    )]
    NotAccessible { status: u16 },

    #[error("malformed CSV: {message}")]
    MalformedCsv { message: String },

    #[error("no modules found: no row has a non-blank topic column")]
    NoModulesFound,

    #[error("import failed: {0}")]
    Unknown(String),
}

impl ImportError {
    /// Maps a non-success HTTP status onto the fetch taxonomy.
    pub fn from_status(status: u16, reason: &str) -> Self {
        match status {
            400 | 401 | 403 | 404 => Self::NotAccessible { status },
            _ => Self::FetchFailed {
                status,
                reason: reason.to_owned(),
            },
        }
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        let message = match err.position() {
            Some(pos) => format!("{err} (record {}, line {})", pos.record(), pos.line()),
            None => err.to_string(),
        };
        Self::MalformedCsv { message }
    }
}
