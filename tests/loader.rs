use std::fs::{self, File};
use std::net::TcpListener;
use std::path::PathBuf;
use warp::Filter;

use nifty_heatmap::services::loader::{load_dataset, parse_dataset, DataSource};
use nifty_heatmap::services::session::SessionState;
use nifty_heatmap::services::updater::{
    merge_returns, monthly_returns, read_closes, read_existing_dataset, to_pretty_json,
    write_dataset,
};
use nifty_heatmap::{HeatmapError, Month};

fn fixture(name: &str) -> DataSource {
    DataSource::File(PathBuf::from("tests/data").join(name))
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("nifty_heatmap_{}_{}", name, std::process::id()))
}

/// Serves the sample document at `/returns.json`; every other path is a 404.
fn serve_sample() -> String {
    let route = warp::path("returns.json")
        .and(warp::path::end())
        .map(|| include_str!("data/sample_returns.json"));
    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    format!("http://{}", addr)
}

#[tokio::test]
async fn loads_sample_file() {
    let dataset = load_dataset(&fixture("sample_returns.json")).await.unwrap();
    assert_eq!(dataset.years().collect::<Vec<_>>(), vec![2008, 2009, 2020, 2024, 2025]);
    assert_eq!(dataset.value(2008, Month::Oct), Some(-26.41));
    assert_eq!(dataset.value(2024, Month::Feb), None);
    assert!(dataset.year(2025).unwrap().is_empty());
}

#[tokio::test]
async fn missing_file_is_resource_unavailable() {
    let err = load_dataset(&fixture("no_such_file.json")).await.unwrap_err();
    assert!(matches!(err, HeatmapError::ResourceUnavailable(_)));
}

#[tokio::test]
async fn loads_sample_over_http() {
    let base = serve_sample();
    let source = DataSource::parse(&format!("{}/returns.json", base));
    assert!(matches!(source, DataSource::Url(_)));

    let dataset = load_dataset(&source).await.unwrap();
    let expected = parse_dataset(include_str!("data/sample_returns.json")).unwrap();
    assert_eq!(dataset, expected);
}

#[tokio::test]
async fn http_error_status_is_resource_unavailable() {
    let base = serve_sample();
    let source = DataSource::Url(format!("{}/missing.json", base));
    let err = load_dataset(&source).await.unwrap_err();
    assert_eq!(
        err,
        HeatmapError::ResourceUnavailable("HTTP error! status: 404".to_string())
    );
}

#[tokio::test]
async fn unreachable_host_is_resource_unavailable() {
    // Bind then drop to get a local port with nothing listening.
    let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let source = DataSource::Url(format!("http://{}/returns.json", addr));
    let err = load_dataset(&source).await.unwrap_err();
    assert!(matches!(err, HeatmapError::ResourceUnavailable(_)));
}

#[tokio::test]
async fn session_fails_on_malformed_document() {
    match SessionState::open(&fixture("malformed_returns.json")).await {
        SessionState::Failed(HeatmapError::ParseFailure(_)) => {}
        other => panic!("expected parse failure, got {:?}", other),
    }
}

#[tokio::test]
async fn session_fails_on_empty_dataset() {
    match SessionState::open(&fixture("empty_returns.json")).await {
        SessionState::Failed(err) => assert_eq!(err, HeatmapError::empty_dataset()),
        other => panic!("expected empty dataset failure, got {:?}", other),
    }
}

#[tokio::test]
async fn session_is_ready_for_sample() {
    let state = SessionState::open(&fixture("sample_returns.json")).await;
    let session = state.session().unwrap();
    assert_eq!(session.yearly_returns.len(), 5);
    assert_eq!(session.yearly_return(2025), None);
    assert_eq!(session.statistics.best.month, Month::May);
}

#[test]
fn updater_merges_closes_into_dataset() {
    let mut dataset = parse_dataset(include_str!("data/sample_returns.json")).unwrap();
    let closes = read_closes(File::open("tests/data/sample_closes.csv").unwrap()).unwrap();
    assert_eq!(closes.len(), 6);

    let returns = monthly_returns(&closes);
    assert_eq!(merge_returns(&mut dataset, &returns), 3);

    // October has no prior month in the file, so it stays untouched.
    assert_eq!(dataset.value(2024, Month::Oct), None);
    assert_eq!(dataset.value(2024, Month::Nov), Some(-0.31));
    assert_eq!(dataset.value(2024, Month::Dec), Some(-2.02));
    assert_eq!(dataset.value(2025, Month::Jan), Some(-0.58));
    // Existing values survive the merge.
    assert_eq!(dataset.value(2024, Month::Jan), Some(0.0));
}

#[test]
fn updater_output_reloads_to_same_dataset() {
    let dataset = parse_dataset(include_str!("data/sample_returns.json")).unwrap();
    let json = to_pretty_json(&dataset).unwrap();
    assert!(json.contains("\n    \"2008\": {\n        \"Sep\": -9.9,"));

    let path = temp_path("reload.json");
    write_dataset(&path, &dataset).unwrap();
    let reloaded = parse_dataset(&fs::read_to_string(&path).unwrap()).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(reloaded, dataset);
}

#[test]
fn updater_starts_empty_only_when_dataset_is_missing() {
    let dataset = read_existing_dataset(temp_path("never_written.json")).unwrap();
    assert!(dataset.is_empty());
}

#[test]
fn updater_refuses_unreadable_dataset() {
    let path = temp_path("not_utf8.json");
    let bytes = b"{\"2008\": {\"Oct\": -26.41}, \"Note\": \"\xff\"}".to_vec();
    fs::write(&path, &bytes).unwrap();

    let err = read_existing_dataset(&path).unwrap_err();
    let untouched = fs::read(&path).unwrap();
    fs::remove_file(&path).ok();

    assert!(matches!(err, HeatmapError::ResourceUnavailable(_)));
    assert_eq!(untouched, bytes);
}

#[test]
fn updater_refuses_directory_as_dataset() {
    let path = temp_path("dataset_dir");
    fs::create_dir_all(&path).unwrap();
    let result = read_existing_dataset(&path);
    fs::remove_dir(&path).ok();

    assert!(matches!(result, Err(HeatmapError::ResourceUnavailable(_))));
}

#[test]
fn updater_refuses_malformed_dataset() {
    let path = PathBuf::from("tests/data/malformed_returns.json");
    let err = read_existing_dataset(&path).unwrap_err();
    assert!(matches!(err, HeatmapError::ParseFailure(_)));
}
