use std::fmt;

/// Fatal errors raised while building the series store.
///
/// Everything below the build boundary (a missing metric sheet, an
/// unmatched column, a non-numeric cell) is downgraded to a warning and
/// never reaches this type.
#[derive(Clone, PartialEq, Eq)]
pub enum FeedError {
    /// The workbook resource could not be fetched (network failure or a
    /// non-success HTTP status).
    Load(String),
    /// The fetched bytes are not a readable xlsx workbook.
    Parse(String),
    /// A sheet required by the build is missing from the workbook.
    SheetNotFound(String),
    /// A required header cell is missing from a sheet.
    Schema(String),
    /// `start_time` or `end_time` never resolved during the summary scan.
    MissingWindow(String),
    /// The resolved window has its start after its end.
    InvalidWindow(String),
    /// Local filesystem failure while reading a workbook path.
    Io(String),
}

impl FeedError {
    /// Process exit code for the CLI front-end.
    pub fn exit_code(&self) -> u8 {
        match self {
            FeedError::Load(_) | FeedError::Io(_) => 2,
            FeedError::Parse(_) => 3,
            FeedError::SheetNotFound(_)
            | FeedError::Schema(_)
            | FeedError::MissingWindow(_)
            | FeedError::InvalidWindow(_) => 4,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            FeedError::Load(_) => "load error",
            FeedError::Parse(_) => "parse error",
            FeedError::SheetNotFound(_) => "sheet not found",
            FeedError::Schema(_) => "schema error",
            FeedError::MissingWindow(_) => "missing window",
            FeedError::InvalidWindow(_) => "invalid window",
            FeedError::Io(_) => "io error",
        }
    }

    fn message(&self) -> &str {
        match self {
            FeedError::Load(m)
            | FeedError::Parse(m)
            | FeedError::SheetNotFound(m)
            | FeedError::Schema(m)
            | FeedError::MissingWindow(m)
            | FeedError::InvalidWindow(m)
            | FeedError::Io(m) => m,
        }
    }
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label(), self.message())
    }
}

impl fmt::Debug for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedError")
            .field("kind", &self.label())
            .field("message", &self.message())
            .finish()
    }
}

impl std::error::Error for FeedError {}
