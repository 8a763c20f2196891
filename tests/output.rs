use std::collections::BTreeMap;

use camino::Utf8PathBuf;

use bioproject_search::domain::{Accession, RecordId};
use bioproject_search::output::{write_failures, write_results};

fn temp_path(dir: &tempfile::TempDir, name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap()
}

#[test]
fn results_file_has_header_and_urls() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp_path(&temp, "output.csv");
    let mut accessions = BTreeMap::new();
    accessions.insert(
        Accession::new("PRJNA801993"),
        "1. Faecal microbiota, transplant cohort".to_string(),
    );
    accessions.insert(Accession::new("PRJNA801992"), "1. Donor stool".to_string());

    write_results(&path, &accessions).unwrap();

    let content = std::fs::read_to_string(path.as_std_path()).unwrap();
    assert_eq!(
        content,
        "study_id,desc,url\n\
         PRJNA801992,1. Donor stool,https://www.ncbi.nlm.nih.gov/bioproject/PRJNA801992\n\
         PRJNA801993,\"1. Faecal microbiota, transplant cohort\",https://www.ncbi.nlm.nih.gov/bioproject/PRJNA801993\n"
    );
}

#[test]
fn empty_results_still_write_header() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp_path(&temp, "output.csv");
    write_results(&path, &BTreeMap::new()).unwrap();
    let content = std::fs::read_to_string(path.as_std_path()).unwrap();
    assert_eq!(content, "study_id,desc,url\n");
}

#[test]
fn failures_file_has_no_header() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp_path(&temp, "failed.csv");
    let mut failures = BTreeMap::new();
    failures.insert(
        "42".parse::<RecordId>().unwrap(),
        "Failed to fetch".to_string(),
    );

    write_failures(&path, &failures).unwrap();

    let content = std::fs::read_to_string(path.as_std_path()).unwrap();
    assert_eq!(content, "42,Failed to fetch\n");
}
