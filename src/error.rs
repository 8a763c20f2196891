use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SearchError {
    #[error("contact email is required (pass --email or set `contact` in the config file)")]
    MissingContact,

    #[error("keyword vocabulary is empty")]
    EmptyVocabulary,

    #[error("invalid keyword phrase: {0:?}")]
    InvalidKeyword(String),

    #[error("invalid record identifier: {0:?}")]
    InvalidRecordId(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("esearch request failed: {0}")]
    EsearchHttp(String),

    #[error("esearch returned status {status}: {message}")]
    #[diagnostic(help("the whole batch is aborted; no partial results were written"))]
    EsearchStatus { status: u16, message: String },

    #[error("failed to decode esearch response: {0}")]
    EsearchParse(String),

    #[error("efetch request failed: {0}")]
    EfetchHttp(String),

    #[error("efetch returned status {status}: {message}")]
    EfetchStatus { status: u16, message: String },

    #[error("failed to write CSV: {0}")]
    Csv(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl SearchError {
    /// Remote failures, as opposed to local configuration or I/O problems.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            SearchError::EsearchHttp(_)
                | SearchError::EsearchStatus { .. }
                | SearchError::EsearchParse(_)
                | SearchError::EfetchHttp(_)
                | SearchError::EfetchStatus { .. }
        )
    }
}
