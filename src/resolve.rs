use std::collections::{BTreeMap, BTreeSet};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::{Accession, RecordId};
use crate::error::SearchError;
use crate::eutils::EutilsClient;

pub const ABSTRACT_MARKER: &str = "1. ";
pub const ACCESSION_MARKER: &str = "BioProject Accession: ";
pub const FETCH_FAILED: &str = "Failed to fetch";

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::ZERO,
        }
    }
}

#[derive(Debug)]
pub enum RetryOutcome<T> {
    Success { value: T, attempts: u32 },
    Exhausted { last_error: SearchError, attempts: u32 },
}

/// Calls `op` until it succeeds or `policy.max_attempts` calls have failed.
/// `op` receives the 1-based attempt number.
pub fn retry<T, F>(policy: RetryPolicy, mut op: F) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Result<T, SearchError>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => {
                return RetryOutcome::Success {
                    value,
                    attempts: attempt,
                };
            }
            Err(err) if attempt >= max_attempts => {
                return RetryOutcome::Exhausted {
                    last_error: err,
                    attempts: attempt,
                };
            }
            Err(err) => {
                tracing::warn!(attempt, error = %err, "attempt failed, retrying");
                if !policy.delay.is_zero() {
                    thread::sleep(policy.delay);
                }
                attempt += 1;
            }
        }
    }
}

/// Non-blank lines of an efetch body, trimmed.
pub fn clean_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// True when both an abstract line and an accession line are present,
/// anywhere and in any order.
pub fn is_valid_response<S: AsRef<str>>(lines: &[S]) -> bool {
    let has_abstract = lines
        .iter()
        .any(|line| line.as_ref().starts_with(ABSTRACT_MARKER));
    let has_accession = lines
        .iter()
        .any(|line| line.as_ref().starts_with(ACCESSION_MARKER));
    has_abstract && has_accession
}

/// First abstract line and the accession taken from the first accession line.
pub fn extract_record<S: AsRef<str>>(lines: &[S]) -> Option<(Accession, String)> {
    let abstract_line = lines
        .iter()
        .map(AsRef::<str>::as_ref)
        .find(|line| line.starts_with(ABSTRACT_MARKER))?;
    let accession_line = lines
        .iter()
        .map(AsRef::<str>::as_ref)
        .find(|line| line.starts_with(ACCESSION_MARKER))?;
    let (_, accession) = accession_line.split_once(": ")?;
    Some((Accession::new(accession), abstract_line.to_string()))
}

/// Two identifiers resolved to one accession; `kept` overwrote `replaced`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub accession: Accession,
    pub replaced: RecordId,
    pub kept: RecordId,
}

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub accessions: BTreeMap<Accession, String>,
    pub failures: BTreeMap<RecordId, String>,
    pub collisions: Vec<Collision>,
}

pub struct AccessionResolver<'a, C: EutilsClient> {
    client: &'a C,
    policy: RetryPolicy,
}

impl<'a, C: EutilsClient> AccessionResolver<'a, C> {
    pub fn new(client: &'a C, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Resolves every identifier in sorted order. Never fails as a whole:
    /// unreachable or malformed records end up in `Resolution::failures`.
    pub fn resolve(&self, ids: &BTreeSet<RecordId>, sink: &dyn ProgressSink) -> Resolution {
        let mut resolution = Resolution::default();
        let mut origins: BTreeMap<Accession, RecordId> = BTreeMap::new();
        let total = ids.len();

        for (index, id) in ids.iter().enumerate() {
            let start = Instant::now();
            self.resolve_one(id, &mut resolution, &mut origins);
            sink.event(ProgressEvent {
                message: format!("phase=Resolve; [{}/{total}] {id}", index + 1),
                elapsed: Some(start.elapsed()),
            });
        }

        tracing::info!(
            resolved = resolution.accessions.len(),
            failed = resolution.failures.len(),
            "accession resolution complete"
        );
        resolution
    }

    fn resolve_one(
        &self,
        id: &RecordId,
        resolution: &mut Resolution,
        origins: &mut BTreeMap<Accession, RecordId>,
    ) {
        let raw = match retry(self.policy, |attempt| {
            tracing::debug!(%id, attempt, "efetch");
            self.client.fetch_summary_text(id)
        }) {
            RetryOutcome::Success { value, .. } => value,
            RetryOutcome::Exhausted {
                last_error,
                attempts,
            } => {
                tracing::warn!(%id, attempts, error = %last_error, "giving up on record");
                resolution
                    .failures
                    .insert(id.clone(), FETCH_FAILED.to_string());
                return;
            }
        };

        let lines = clean_lines(&raw);
        let record = if is_valid_response(lines.as_slice()) {
            extract_record(lines.as_slice())
        } else {
            None
        };
        let Some((accession, abstract_line)) = record else {
            tracing::warn!(%id, "malformed efetch response");
            resolution.failures.insert(id.clone(), format!("{lines:?}"));
            return;
        };

        if let Some(previous) = origins.insert(accession.clone(), id.clone()) {
            tracing::warn!(
                %accession,
                replaced = %previous,
                kept = %id,
                "duplicate accession, keeping the later record"
            );
            resolution.collisions.push(Collision {
                accession: accession.clone(),
                replaced: previous,
                kept: id.clone(),
            });
        }
        resolution.accessions.insert(accession, abstract_line);
    }
}
