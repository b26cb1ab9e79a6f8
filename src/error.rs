use thiserror::Error;

/// Failures while reading the source spreadsheet. All of them are fatal at
/// startup: the dashboard never runs on a partially loaded table.
#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("Data file not found: {0}")]
    NotFound(String),

    #[error("Cannot read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Unsupported file type: {0} (expected .csv, .xlsx, .xls or .ods)")]
    UnsupportedFormat(String),

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Workbook has no worksheets: {0}")]
    NoSheets(String),

    #[error("No usable invoice lines in {0}")]
    NoRecords(String),
}

#[derive(Error, Debug)]
pub enum RetailError {
    #[error("Could not load data: {0}")]
    DataLoad(#[from] DataLoadError),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid period range {lo}..{hi}: the index has {len} periods")]
    InvalidPeriodRange { lo: usize, hi: usize, len: usize },

    #[error("Unknown period: {0} (run `tillroll periods` to list them)")]
    UnknownPeriod(String),

    #[error("{view} is driven by the {signal} control; {flag} does not apply")]
    FilterNotApplicable {
        view: &'static str,
        signal: &'static str,
        flag: &'static str,
    },

    #[error("No data file configured: pass --file or run `tillroll init --file <PATH>`")]
    NoDataFile,

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RetailError>;

pub type LoadResult<T> = std::result::Result<T, DataLoadError>;
