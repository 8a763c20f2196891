use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use assert_matches::assert_matches;

use bioproject_search::app::NoopSink;
use bioproject_search::domain::{DateRange, KeywordPhrase, RecordId};
use bioproject_search::error::SearchError;
use bioproject_search::eutils::{EutilsClient, EutilsConfig, EutilsHttpClient};
use bioproject_search::resolve::{AccessionResolver, FETCH_FAILED, RetryPolicy};
use bioproject_search::search::KeywordSearch;

/// Answers one connection per canned response, then stops listening.
/// The handle yields the request lines received.
fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let mut requests = Vec::new();
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 1024];
            while !received.windows(4).any(|window| window == b"\r\n\r\n") {
                let read = stream.read(&mut buf).unwrap();
                if read == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..read]);
            }
            let text = String::from_utf8_lossy(&received);
            requests.push(text.lines().next().unwrap_or_default().to_string());

            let response = format!(
                "HTTP/1.1 {status} Status\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        }
        requests
    });
    (base_url, handle)
}

fn client(base_url: String) -> EutilsHttpClient {
    let mut config = EutilsConfig::new("someone@example.org");
    config.base_url = base_url;
    EutilsHttpClient::new(config).unwrap()
}

fn range() -> DateRange {
    DateRange::new("2022/01/01", "2022/08/31")
}

fn phrase(value: &str) -> KeywordPhrase {
    value.parse().unwrap()
}

#[test]
fn esearch_500_is_a_status_error() {
    let (base_url, server) = serve(vec![(500, "Internal Server Error")]);
    let err = client(base_url)
        .search_ids(&phrase("FMT"), &range(), 999_999)
        .unwrap_err();

    assert_matches!(err, SearchError::EsearchStatus { status: 500, .. });
    server.join().unwrap();
}

#[test]
fn esearch_200_decodes_idlist_and_sends_contact() {
    let (base_url, server) = serve(vec![(
        200,
        r#"{"esearchresult":{"count":"2","idlist":["801993","801992"]}}"#,
    )]);
    let ids = client(base_url)
        .search_ids(&phrase("C&D Microbiota"), &range(), 999_999)
        .unwrap();

    let ids: Vec<&str> = ids.iter().map(RecordId::as_str).collect();
    assert_eq!(ids, vec!["801993", "801992"]);

    let requests = server.join().unwrap();
    assert!(requests[0].starts_with("GET /esearch.fcgi?db=BioProject&term=(C%26D+Microbiota)"));
    assert!(requests[0].contains("&RetMax=999999&retmode=json"));
    assert!(requests[0].contains("email=someone%40example.org"));
}

#[test]
fn esearch_error_body_with_200_is_not_empty_result() {
    let (base_url, server) = serve(vec![(
        200,
        r#"{"esearchresult":{"ERROR":"Invalid query"}}"#,
    )]);
    let err = client(base_url)
        .search_ids(&phrase("FMT"), &range(), 999_999)
        .unwrap_err();

    assert_matches!(err, SearchError::EsearchParse(_));
    server.join().unwrap();
}

#[test]
fn search_aborts_on_first_http_500() {
    let (base_url, server) = serve(vec![
        (200, r#"{"esearchresult":{"idlist":["1"]}}"#),
        (500, "Internal Server Error"),
    ]);
    let client = client(base_url);
    let vocabulary = vec![phrase("Fecal"), phrase("Faecal"), phrase("FMT")];

    let err = KeywordSearch::new(&client)
        .search(&vocabulary, &range(), &NoopSink)
        .unwrap_err();

    assert_matches!(err, SearchError::EsearchStatus { status: 500, .. });
    let requests = server.join().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].contains("term=(Faecal)"));
}

#[test]
fn efetch_502_is_a_status_error() {
    let (base_url, server) = serve(vec![(502, "Bad Gateway")]);
    let id: RecordId = "801993".parse().unwrap();

    let err = client(base_url).fetch_summary_text(&id).unwrap_err();

    assert_matches!(err, SearchError::EfetchStatus { status: 502, .. });
    let requests = server.join().unwrap();
    assert!(requests[0].starts_with("GET /efetch.fcgi?db=bioproject&id=801993&rettype=acc&retmode=text"));
}

#[test]
fn efetch_retries_after_502_then_resolves() {
    let (base_url, server) = serve(vec![
        (502, "Bad Gateway"),
        (200, "\n1. Donor stool study\nBioProject Accession: PRJNA801993\n"),
    ]);
    let client = client(base_url);
    let ids = ["801993".parse::<RecordId>().unwrap()].into_iter().collect();

    let resolution = AccessionResolver::new(&client, RetryPolicy::default()).resolve(&ids, &NoopSink);

    assert!(resolution.failures.is_empty());
    assert_eq!(
        resolution
            .accessions
            .iter()
            .map(|(acc, desc)| (acc.as_str(), desc.as_str()))
            .collect::<Vec<_>>(),
        vec![("PRJNA801993", "1. Donor stool study")]
    );
    assert_eq!(server.join().unwrap().len(), 2);
}

#[test]
fn efetch_gives_up_after_three_non_success_responses() {
    let (base_url, server) = serve(vec![
        (503, "Service Unavailable"),
        (503, "Service Unavailable"),
        (503, "Service Unavailable"),
    ]);
    let client = client(base_url);
    let ids = ["42".parse::<RecordId>().unwrap()].into_iter().collect();

    let resolution = AccessionResolver::new(&client, RetryPolicy::default()).resolve(&ids, &NoopSink);

    assert!(resolution.accessions.is_empty());
    let failure = resolution.failures.values().next().map(String::as_str);
    assert_eq!(failure, Some(FETCH_FAILED));
    assert_eq!(server.join().unwrap().len(), 3);
}
