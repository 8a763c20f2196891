use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{DateRange, KeywordPhrase, default_vocabulary};
use crate::error::SearchError;
use crate::eutils::{DEFAULT_TIMEOUT, EutilsConfig};
use crate::resolve::RetryPolicy;
use crate::search::DEFAULT_MAX_RESULTS;

/// Optional JSON config file. Every field may be overridden on the command line.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<KeywordPhrase>>,
    #[serde(default)]
    pub max_results: Option<u64>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub retry_delay_ms: Option<u64>,
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub contact: Option<String>,
    pub from_date: String,
    pub to_date: String,
    pub keywords: Vec<String>,
    pub max_results: Option<u64>,
    pub output: Option<String>,
    pub failed: Option<String>,
    pub timeout_secs: Option<u64>,
    pub retry_delay_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub contact: String,
    pub range: DateRange,
    pub keywords: Vec<KeywordPhrase>,
    pub max_results: u64,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub output_path: Utf8PathBuf,
    pub failed_path: Utf8PathBuf,
}

impl ResolvedConfig {
    pub fn eutils(&self) -> EutilsConfig {
        EutilsConfig::new(self.contact.clone()).with_timeout(self.timeout)
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: Option<&str>) -> Result<Config, SearchError> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let config_path = PathBuf::from(path);
        let content = fs::read_to_string(&config_path)
            .map_err(|_| SearchError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| SearchError::ConfigParse(err.to_string()))
    }

    pub fn resolve(
        overrides: RunOverrides,
        config: Config,
    ) -> Result<ResolvedConfig, SearchError> {
        let contact = overrides
            .contact
            .or(config.contact)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(SearchError::MissingContact)?;

        let keywords = if !overrides.keywords.is_empty() {
            overrides
                .keywords
                .iter()
                .map(|value| value.parse())
                .collect::<Result<Vec<KeywordPhrase>, SearchError>>()?
        } else {
            config.keywords.unwrap_or_else(default_vocabulary)
        };
        if keywords.is_empty() {
            return Err(SearchError::EmptyVocabulary);
        }

        let range = DateRange::new(overrides.from_date, overrides.to_date);
        let output_path = overrides
            .output
            .map(Utf8PathBuf::from)
            .unwrap_or_else(|| default_output_path(&range));
        let failed_path = overrides
            .failed
            .map(Utf8PathBuf::from)
            .unwrap_or_else(|| default_failed_path(&range));

        let timeout = overrides
            .timeout_secs
            .or(config.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        let retry = RetryPolicy {
            delay: overrides
                .retry_delay_ms
                .or(config.retry_delay_ms)
                .map(Duration::from_millis)
                .unwrap_or(Duration::ZERO),
            ..RetryPolicy::default()
        };

        Ok(ResolvedConfig {
            contact,
            range,
            keywords,
            max_results: overrides
                .max_results
                .or(config.max_results)
                .unwrap_or(DEFAULT_MAX_RESULTS),
            timeout,
            retry,
            output_path,
            failed_path,
        })
    }
}

pub fn default_output_path(range: &DateRange) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("output-{}.csv", range.file_stamp()))
}

pub fn default_failed_path(range: &DateRange) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("failed-{}.csv", range.file_stamp()))
}
