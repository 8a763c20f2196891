use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;

use crate::domain::{DateRange, KeywordPhrase, RecordId};
use crate::error::SearchError;

pub const EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const TOOL_NAME: &str = "bioproject-search";

/// Remote boundary for both pipeline stages.
pub trait EutilsClient: Send + Sync {
    /// One esearch call. Anything other than HTTP 200 is an error.
    fn search_ids(
        &self,
        phrase: &KeywordPhrase,
        range: &DateRange,
        max_results: u64,
    ) -> Result<Vec<RecordId>, SearchError>;

    /// Text-mode efetch for a single record, returned unparsed.
    fn fetch_summary_text(&self, id: &RecordId) -> Result<String, SearchError>;
}

/// Per-process identity sent with every E-utilities request.
#[derive(Debug, Clone)]
pub struct EutilsConfig {
    pub contact: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub base_url: String,
}

impl EutilsConfig {
    pub fn new(contact: impl Into<String>) -> Self {
        let api_key = std::env::var("NCBI_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        Self {
            contact: contact.into(),
            api_key,
            timeout: DEFAULT_TIMEOUT,
            base_url: EUTILS_BASE.to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn identity_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("tool", TOOL_NAME.to_string()),
            ("email", self.contact.clone()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }
}

#[derive(Debug, Deserialize)]
struct EsearchEnvelope {
    esearchresult: EsearchResult,
}

#[derive(Debug, Deserialize)]
struct EsearchResult {
    #[serde(rename = "ERROR")]
    error: Option<String>,
    idlist: Option<Vec<String>>,
}

impl EsearchEnvelope {
    fn into_ids(self) -> Result<Vec<RecordId>, SearchError> {
        if let Some(error) = self.esearchresult.error {
            return Err(SearchError::EsearchParse(format!("esearch error: {error}")));
        }
        let idlist = self.esearchresult.idlist.ok_or_else(|| {
            SearchError::EsearchParse("missing esearchresult.idlist".to_string())
        })?;
        idlist.iter().map(|value| value.parse()).collect()
    }
}

#[derive(Clone)]
pub struct EutilsHttpClient {
    client: Client,
    config: EutilsConfig,
}

impl EutilsHttpClient {
    pub fn new(config: EutilsConfig) -> Result<Self, SearchError> {
        if config.contact.trim().is_empty() {
            return Err(SearchError::MissingContact);
        }
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("{TOOL_NAME}/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| SearchError::EsearchHttp(err.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|err| SearchError::EsearchHttp(err.to_string()))?;

        Ok(Self { client, config })
    }
}

impl EutilsClient for EutilsHttpClient {
    fn search_ids(
        &self,
        phrase: &KeywordPhrase,
        range: &DateRange,
        max_results: u64,
    ) -> Result<Vec<RecordId>, SearchError> {
        let url = build_search_url(&self.config.base_url, phrase, range, max_results);
        tracing::debug!(%url, "esearch");
        let response = self
            .client
            .get(&url)
            .query(&self.config.identity_params())
            .send()
            .map_err(|err| SearchError::EsearchHttp(err.to_string()))?;
        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "esearch request failed".to_string());
            return Err(SearchError::EsearchStatus { status, message });
        }
        let envelope: EsearchEnvelope = response
            .json()
            .map_err(|err| SearchError::EsearchParse(err.to_string()))?;
        envelope.into_ids()
    }

    fn fetch_summary_text(&self, id: &RecordId) -> Result<String, SearchError> {
        let url = format!("{}/efetch.fcgi", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("db", "bioproject"),
                ("id", id.as_str()),
                ("rettype", "acc"),
                ("retmode", "text"),
            ])
            .query(&self.config.identity_params())
            .send()
            .map_err(|err| SearchError::EfetchHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "efetch request failed".to_string());
            return Err(SearchError::EfetchStatus { status, message });
        }
        response
            .text()
            .map_err(|err| SearchError::EfetchHttp(err.to_string()))
    }
}

/// Percent-encodes everything outside the URL-unreserved set, keeping `/` so
/// date bounds stay readable.
fn encode_url_component(value: &str) -> String {
    let mut out = String::new();
    for byte in value.as_bytes() {
        let ch = *byte as char;
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '~' | '/') {
            out.push(ch);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

/// Each word encoded on its own, then joined with a literal `+`.
fn encode_term(phrase: &KeywordPhrase) -> String {
    phrase
        .as_str()
        .split(' ')
        .map(encode_url_component)
        .collect::<Vec<_>>()
        .join("+")
}

/// esearch URL with the registration-date clause in the exact shape NCBI's
/// web query builder produces.
pub fn build_search_url(
    base: &str,
    phrase: &KeywordPhrase,
    range: &DateRange,
    max_results: u64,
) -> String {
    format!(
        "{base}/esearch.fcgi?db=BioProject&term=({term})\
         +AND+(\"{from}\"[Registration%20Date]%20:%20%22{to}%22[Registration%20Date])\
         &RetMax={max_results}&retmode=json",
        term = encode_term(phrase),
        from = encode_url_component(&range.from),
        to = encode_url_component(&range.to),
    )
}

pub fn parse_esearch_ids(body: &str) -> Result<Vec<RecordId>, SearchError> {
    let envelope: EsearchEnvelope =
        serde_json::from_str(body).map_err(|err| SearchError::EsearchParse(err.to_string()))?;
    envelope.into_ids()
}
