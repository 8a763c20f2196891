use std::time::Duration;

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::config::ResolvedConfig;
use crate::error::SearchError;
use crate::eutils::EutilsClient;
use crate::output::{write_failures, write_results};
use crate::resolve::{AccessionResolver, Collision, Resolution};
use crate::search::{KeywordHits, KeywordSearch, SearchOutcome};

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub from_date: String,
    pub to_date: String,
    pub keywords: Vec<KeywordHits>,
    pub unique_ids: usize,
    pub resolved: usize,
    pub failed: usize,
    pub collisions: Vec<Collision>,
    pub output_path: String,
    pub failed_path: Option<String>,
    pub finished_at: String,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn event(&self, _event: ProgressEvent) {}
}

/// Prints progress lines to stderr for interactive runs.
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("{} ({} ms)", event.message, elapsed.as_millis()),
            None => eprintln!("{}", event.message),
        }
    }
}

pub struct App<C: EutilsClient> {
    client: C,
}

impl<C: EutilsClient> App<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Keyword search followed by accession resolution. The search must
    /// finish completely before any record is fetched.
    pub fn collect(
        &self,
        config: &ResolvedConfig,
        sink: &dyn ProgressSink,
    ) -> Result<(SearchOutcome, Resolution), SearchError> {
        sink.event(ProgressEvent {
            message: format!("phase=Search; searching BioProject {}", config.range),
            elapsed: None,
        });
        let outcome = KeywordSearch::new(&self.client)
            .with_max_results(config.max_results)
            .search(&config.keywords, &config.range, sink)?;

        sink.event(ProgressEvent {
            message: format!(
                "phase=Resolve; converting {} ids to accessions",
                outcome.ids.len()
            ),
            elapsed: None,
        });
        let resolution =
            AccessionResolver::new(&self.client, config.retry).resolve(&outcome.ids, sink);
        Ok((outcome, resolution))
    }

    /// Full batch: collect, then write the results file and, when anything
    /// failed, the failures file.
    pub fn run(
        &self,
        config: &ResolvedConfig,
        sink: &dyn ProgressSink,
    ) -> Result<RunSummary, SearchError> {
        let (outcome, resolution) = self.collect(config, sink)?;

        sink.event(ProgressEvent {
            message: "phase=Store; saving results".to_string(),
            elapsed: None,
        });
        write_results(&config.output_path, &resolution.accessions)?;
        let failed_path = if resolution.failures.is_empty() {
            None
        } else {
            write_failures(&config.failed_path, &resolution.failures)?;
            Some(config.failed_path.clone())
        };

        Ok(RunSummary {
            from_date: config.range.from.clone(),
            to_date: config.range.to.clone(),
            keywords: outcome.hits,
            unique_ids: outcome.ids.len(),
            resolved: resolution.accessions.len(),
            failed: resolution.failures.len(),
            collisions: resolution.collisions,
            output_path: config.output_path.to_string(),
            failed_path: failed_path.map(Utf8PathBuf::into_string),
            finished_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}
