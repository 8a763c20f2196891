use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Phrases searched when no vocabulary override is given.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "Faecal Microbiota Transplantation",
    "Fecal Microbiota Transplantation",
    "Fecal Microbiota Transplant",
    "Faecal Microbiota Transplant",
    "Fecal Microbiota",
    "Faecal Microbiota",
    "Fecal Microbiome",
    "Faecal Microbiome",
    "Faecal",
    "Fecal",
    "FMT",
];

pub fn default_vocabulary() -> Vec<KeywordPhrase> {
    DEFAULT_KEYWORDS
        .iter()
        .map(|value| KeywordPhrase(value.to_string()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeywordPhrase(String);

impl KeywordPhrase {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeywordPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for KeywordPhrase {
    type Err = SearchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SearchError::InvalidKeyword(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl TryFrom<String> for KeywordPhrase {
    type Error = SearchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeywordPhrase> for String {
    fn from(value: KeywordPhrase) -> Self {
        value.0
    }
}

/// Inclusive registration-date window. Bounds are passed to esearch verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: String,
    pub to: String,
}

impl DateRange {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// `2022/01/01`..`2022/08/31` becomes `2022-01-01-2022-08-31`.
    pub fn file_stamp(&self) -> String {
        format!("{}-{}", self.from.replace('/', "-"), self.to.replace('/', "-"))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.from, self.to)
    }
}

/// Internal numeric UID as returned by esearch.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = SearchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SearchError::InvalidRecordId(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// Stable public accession, e.g. `PRJNA801993`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Accession(String);

impl Accession {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn url(&self) -> String {
        format!("{BIOPROJECT_URL_BASE}{}", self.0)
    }
}

impl fmt::Display for Accession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub const BIOPROJECT_URL_BASE: &str = "https://www.ncbi.nlm.nih.gov/bioproject/";
