use std::collections::BTreeMap;
use std::io::{self, Write};

use camino::Utf8Path;
use serde::Serialize;

use crate::app::RunSummary;
use crate::domain::{Accession, RecordId};
use crate::error::SearchError;

pub const RESULTS_HEADER: [&str; 3] = ["study_id", "desc", "url"];

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

/// One row per accession: `study_id, desc, url`.
pub fn write_results(
    path: &Utf8Path,
    accessions: &BTreeMap<Accession, String>,
) -> Result<(), SearchError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path.as_std_path())
        .map_err(|err| SearchError::Csv(format!("{path}: {err}")))?;
    writer
        .write_record(RESULTS_HEADER)
        .map_err(|err| SearchError::Csv(err.to_string()))?;
    for (accession, description) in accessions {
        let url = accession.url();
        writer
            .write_record([accession.as_str(), description.as_str(), url.as_str()])
            .map_err(|err| SearchError::Csv(err.to_string()))?;
    }
    writer
        .flush()
        .map_err(|err| SearchError::Filesystem(err.to_string()))?;
    tracing::info!(%path, rows = accessions.len(), "results saved");
    Ok(())
}

/// Headerless `identifier, diagnostic` rows.
pub fn write_failures(
    path: &Utf8Path,
    failures: &BTreeMap<RecordId, String>,
) -> Result<(), SearchError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path.as_std_path())
        .map_err(|err| SearchError::Csv(format!("{path}: {err}")))?;
    for (id, diagnostic) in failures {
        writer
            .write_record([id.as_str(), diagnostic.as_str()])
            .map_err(|err| SearchError::Csv(err.to_string()))?;
    }
    writer
        .flush()
        .map_err(|err| SearchError::Filesystem(err.to_string()))?;
    tracing::info!(%path, rows = failures.len(), "failures saved");
    Ok(())
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl crate::app::ProgressSink for JsonOutput {
    fn event(&self, _event: crate::app::ProgressEvent) {}
}
