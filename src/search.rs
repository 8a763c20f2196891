use std::collections::BTreeSet;
use std::time::Instant;

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::{DateRange, KeywordPhrase, RecordId};
use crate::error::SearchError;
use crate::eutils::EutilsClient;

/// Largest `RetMax` the esearch endpoint accepts.
pub const DEFAULT_MAX_RESULTS: u64 = 999_999;

#[derive(Debug, Clone, Serialize)]
pub struct KeywordHits {
    pub keyword: String,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub ids: BTreeSet<RecordId>,
    pub hits: Vec<KeywordHits>,
}

impl SearchOutcome {
    pub fn total_hits(&self) -> usize {
        self.hits.iter().map(|hit| hit.count).sum()
    }
}

pub struct KeywordSearch<'a, C: EutilsClient> {
    client: &'a C,
    max_results: u64,
}

impl<'a, C: EutilsClient> KeywordSearch<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self {
            client,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_max_results(mut self, max_results: u64) -> Self {
        self.max_results = max_results;
        self
    }

    /// Runs one esearch per phrase, in order, and unions the identifiers.
    ///
    /// The first failing request aborts the whole search; identifiers gathered
    /// for earlier phrases are discarded with it.
    pub fn search(
        &self,
        vocabulary: &[KeywordPhrase],
        range: &DateRange,
        sink: &dyn ProgressSink,
    ) -> Result<SearchOutcome, SearchError> {
        if vocabulary.is_empty() {
            return Err(SearchError::EmptyVocabulary);
        }

        let mut ids = BTreeSet::new();
        let mut hits = Vec::with_capacity(vocabulary.len());
        for phrase in vocabulary {
            let start = Instant::now();
            let found = self
                .client
                .search_ids(phrase, range, self.max_results)
                .inspect_err(|err| {
                    tracing::error!(keyword = %phrase, error = %err, "esearch failed, aborting");
                })?;
            tracing::info!(keyword = %phrase, count = found.len(), "esearch");
            sink.event(ProgressEvent {
                message: format!("phase=Search; found {} results for {phrase}", found.len()),
                elapsed: Some(start.elapsed()),
            });
            hits.push(KeywordHits {
                keyword: phrase.to_string(),
                count: found.len(),
            });
            ids.extend(found);
        }

        tracing::info!(unique = ids.len(), "esearch complete");
        sink.event(ProgressEvent {
            message: format!("phase=Search; found {} unique BioProjects", ids.len()),
            elapsed: None,
        });
        Ok(SearchOutcome { ids, hits })
    }
}
