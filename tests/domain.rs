use assert_matches::assert_matches;

use bioproject_search::domain::{Accession, DEFAULT_KEYWORDS, DateRange, KeywordPhrase, RecordId};
use bioproject_search::error::SearchError;

#[test]
fn keyword_phrase_is_trimmed() {
    let phrase: KeywordPhrase = "  Fecal Microbiome ".parse().unwrap();
    assert_eq!(phrase.as_str(), "Fecal Microbiome");
}

#[test]
fn record_id_rejects_blank() {
    let err = "".parse::<RecordId>().unwrap_err();
    assert_matches!(err, SearchError::InvalidRecordId(_));
}

#[test]
fn date_range_file_stamp() {
    let range = DateRange::new("2022/01/01", "2022/08/31");
    assert_eq!(range.file_stamp(), "2022-01-01-2022-08-31");
}

#[test]
fn accession_url() {
    let accession = Accession::new("PRJNA801993");
    assert_eq!(
        accession.url(),
        "https://www.ncbi.nlm.nih.gov/bioproject/PRJNA801993"
    );
}

#[test]
fn default_keywords_start_with_full_phrase() {
    assert_eq!(DEFAULT_KEYWORDS[0], "Faecal Microbiota Transplantation");
    assert_eq!(DEFAULT_KEYWORDS.last(), Some(&"FMT"));
}
