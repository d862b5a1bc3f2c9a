use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("unsupported role tag '{0}' (expected one of bk, mf, fw)")]
    UnsupportedRoleTag(String),

    #[error("missing column '{column}' in {table}")]
    MissingColumn { table: String, column: String },

    #[error("target team {0} is not in the team table")]
    UnknownTargetTeam(u64),

    #[error("join '{join}' left {} key(s) unmatched: {missing:?}", .missing.len())]
    JoinInvariant { join: &'static str, missing: Vec<u64> },

    #[error("invalid value for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
