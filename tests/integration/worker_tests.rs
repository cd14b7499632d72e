//! Integration tests for the crawl worker
//!
//! These tests use wiremock to serve pages and robots.txt, and tempfile
//! databases shared the way separate worker processes would share them.

use domain_mapper::config::Config;
use domain_mapper::crawler::Worker;
use domain_mapper::robots::RobotsFilter;
use domain_mapper::state::QueueStatus;
use domain_mapper::storage::{
    CrawlQueue, Reporting, SettingsStore, SqliteStorage,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at a database inside `dir`
fn create_test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.store.database_path = db_path(dir).to_string_lossy().into_owned();
    config.http.page_timeout_secs = 5;
    config.http.robots_timeout_secs = 5;
    config.retry.delay_ms = 10;
    config
}

fn db_path(dir: &TempDir) -> PathBuf {
    dir.path().join("graph.db")
}

fn open(path: &Path) -> SqliteStorage {
    SqliteStorage::new(path).expect("Failed to open test database")
}

fn html_page(links: &[&str]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", anchors))
        .insert_header("content-type", "text/html")
}

#[tokio::test]
async fn test_end_to_end_single_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(&["http://b.test/page", "/local"]))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let mut storage = open(&db_path(&dir));
    let seed = format!("{}/", base_url);
    assert!(storage.enqueue(&seed).unwrap());

    let mut worker = Worker::new(storage, &config).expect("Failed to create worker");
    let summary = worker.run_once().await.expect("Seed should be claimable");

    assert_eq!(summary.status, QueueStatus::Done);
    assert_eq!(summary.links_found, 2);
    assert_eq!(summary.queued, 2);

    let store = worker.store();
    assert_eq!(
        store.get_entry(&seed).unwrap().unwrap().status,
        QueueStatus::Done
    );
    assert!(store.get_domain("127.0.0.1").unwrap().is_some());
    assert!(store.get_domain("b.test").unwrap().is_some());

    let relationships = store.list_relationships().unwrap();
    assert!(relationships.contains(&("127.0.0.1".to_string(), "b.test".to_string())));

    // Discovered links are queued in normalized form
    assert_eq!(
        store.get_entry("http://b.test/page/").unwrap().unwrap().status,
        QueueStatus::Pending
    );
    assert_eq!(
        store
            .get_entry(&format!("{}/local/", base_url))
            .unwrap()
            .unwrap()
            .status,
        QueueStatus::Pending
    );
    assert_eq!(store.get_domain("b.test").unwrap().unwrap().processed_links, 1);
}

#[tokio::test]
async fn test_run_drains_queue() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(&["/local", "/local?again=1", "/image.png"]))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/local/"))
        .respond_with(html_page(&["/"]))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let mut storage = open(&db_path(&dir));
    storage.enqueue(&format!("{}/", base_url)).unwrap();

    let mut worker = Worker::new(storage, &config).unwrap();
    assert_eq!(worker.run().await, 2);

    let counts = worker.store().count_by_status().unwrap();
    assert_eq!(counts[&QueueStatus::Done], 2);
    assert_eq!(counts[&QueueStatus::Pending], 0);
    assert_eq!(counts[&QueueStatus::Processing], 0);
}

#[tokio::test]
async fn test_unreachable_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/broken/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let mut storage = open(&db_path(&dir));
    let url = format!("{}/broken/", base_url);
    storage.enqueue(&url).unwrap();

    let mut worker = Worker::new(storage, &config).unwrap();
    let summary = worker.run_once().await.unwrap();

    assert_eq!(summary.status, QueueStatus::Unreachable);
    assert_eq!(
        worker.store().get_entry(&url).unwrap().unwrap().status,
        QueueStatus::Unreachable
    );
    // The visited host is still a node of the graph
    assert!(worker.store().get_domain("127.0.0.1").unwrap().is_some());
}

#[tokio::test]
async fn test_robots_rules() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"))
        .mount(&mock_server)
        .await;

    let config = Config::default();
    let client = reqwest::Client::new();
    let filter = RobotsFilter::new(
        client,
        &config.user_agent.user_agent_string(),
        Duration::from_secs(5),
    );

    assert!(!filter.is_allowed(&format!("{}/private/x", base_url)).await);
    assert!(filter.is_allowed(&format!("{}/public", base_url)).await);
}

#[tokio::test]
async fn test_missing_robots_allows_everything() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let filter = RobotsFilter::new(
        reqwest::Client::new(),
        &Config::default().user_agent.user_agent_string(),
        Duration::from_secs(5),
    );

    assert!(filter.is_allowed(&format!("{}/private/x", base_url)).await);
}

#[tokio::test]
async fn test_robots_failure_allows() {
    let filter = RobotsFilter::new(
        reqwest::Client::new(),
        &Config::default().user_agent.user_agent_string(),
        Duration::from_secs(2),
    );

    // Nothing listens on the discard port
    assert!(filter.is_allowed("http://127.0.0.1:9/page/").await);
}

#[tokio::test]
async fn test_robots_disallowed_page_is_unreachable() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: MapWWWBot\nDisallow: /private"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/private/"))
        .respond_with(html_page(&["http://b.test/"]))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let mut storage = open(&db_path(&dir));
    let url = format!("{}/private/", base_url);
    storage.enqueue(&url).unwrap();

    let mut worker = Worker::new(storage, &config).unwrap();
    let summary = worker.run_once().await.unwrap();

    assert_eq!(summary.status, QueueStatus::Unreachable);
    assert!(worker.store().get_domain("b.test").unwrap().is_none());
}

#[tokio::test]
async fn test_user_agent_is_sent() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let config_for_agent = Config::default();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header(
            "user-agent",
            config_for_agent.user_agent.user_agent_string().as_str(),
        ))
        .respond_with(html_page(&[]))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let mut storage = open(&db_path(&dir));
    storage.enqueue(&format!("{}/", base_url)).unwrap();

    let mut worker = Worker::new(storage, &config).unwrap();
    let summary = worker.run_once().await.unwrap();

    // Without the header the mock would not match and the page would 404
    assert_eq!(summary.status, QueueStatus::Done);
}

#[tokio::test]
async fn test_domain_link_limit() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let links: Vec<String> = (1..=5).map(|i| format!("http://c.test/{}", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(&link_refs))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let mut storage = open(&db_path(&dir));
    storage.set_domain_link_limit(2).unwrap();
    storage.enqueue(&format!("{}/", base_url)).unwrap();

    let mut worker = Worker::new(storage, &config).unwrap();
    assert_eq!(worker.domain_link_limit(), 2);

    let summary = worker.run_once().await.unwrap();
    assert_eq!(summary.links_found, 5);
    assert_eq!(summary.queued, 2);
    assert_eq!(summary.over_limit, 3);

    let store = worker.store();
    assert_eq!(store.get_domain("c.test").unwrap().unwrap().processed_links, 2);
    let to_c = store
        .list_relationships()
        .unwrap()
        .into_iter()
        .filter(|(_, child)| child == "c.test")
        .count();
    assert!(to_c <= 2);
    assert_eq!(store.count_by_status().unwrap()[&QueueStatus::Pending], 2);
}

#[tokio::test]
async fn test_domain_link_limit_across_parents_and_workers() {
    let mock_server = MockServer::start().await;
    let port = mock_server.address().port();

    for page in ["one", "two"] {
        let links: Vec<String> = (1..=4)
            .map(|i| format!("http://c.test/{}/{}", page, i))
            .collect();
        let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();

        Mock::given(method("GET"))
            .and(path(format!("/{}/", page)))
            .respond_with(html_page(&link_refs))
            .mount(&mock_server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let path = db_path(&dir);

    // Same server under two host names, so the pages have different parent domains
    let mut seeding = open(&path);
    seeding.set_domain_link_limit(3).unwrap();
    seeding.enqueue(&format!("http://127.0.0.1:{}/one/", port)).unwrap();
    seeding.enqueue(&format!("http://localhost:{}/two/", port)).unwrap();
    drop(seeding);

    let mut first = Worker::new(open(&path), &config).unwrap();
    let mut second = Worker::new(open(&path), &config).unwrap();

    let (a, b) = tokio::join!(first.run_once(), second.run_once());
    let a = a.expect("first worker should claim a page");
    let b = b.expect("second worker should claim a page");
    assert_ne!(a.url, b.url);
    assert_eq!(a.links_found + b.links_found, 8);

    let store = open(&path);
    assert!(store.get_domain("127.0.0.1").unwrap().is_some());
    assert!(store.get_domain("localhost").unwrap().is_some());

    let processed = store.get_domain("c.test").unwrap().unwrap().processed_links;
    assert!(processed <= 3, "processed_links {} exceeds the limit", processed);

    let to_c = store
        .list_relationships()
        .unwrap()
        .into_iter()
        .filter(|(_, child)| child == "c.test")
        .count();
    assert!(to_c <= 3);
    assert!(to_c >= 1);
}

#[test]
fn test_enqueue_twice_across_connections() {
    let dir = TempDir::new().unwrap();
    let path = db_path(&dir);
    let mut first = open(&path);
    let mut second = open(&path);

    assert!(first.enqueue("http://a.test/").unwrap());
    assert!(!second.enqueue("http://a.test/").unwrap());

    assert_eq!(first.count_by_status().unwrap()[&QueueStatus::Pending], 1);
}

#[test]
fn test_concurrent_claim_single_row() {
    let dir = TempDir::new().unwrap();
    let path = db_path(&dir);
    open(&path).enqueue("http://a.test/").unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            let mut storage = open(&path);
            std::thread::spawn(move || {
                barrier.wait();
                storage.claim().expect("Claim failed")
            })
        })
        .collect();

    let results: Vec<Option<String>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let claimed: Vec<_> = results.iter().flatten().collect();

    assert_eq!(claimed, vec!["http://a.test/"]);
    assert_eq!(
        open(&path).get_entry("http://a.test/").unwrap().unwrap().status,
        QueueStatus::Processing
    );
}

#[test]
fn test_concurrent_claims_are_distinct() {
    let dir = TempDir::new().unwrap();
    let path = db_path(&dir);
    {
        let mut storage = open(&path);
        for i in 0..20 {
            storage.enqueue(&format!("http://site{}.test/", i)).unwrap();
        }
    }

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let mut storage = open(&path);
            std::thread::spawn(move || {
                let mut claimed = Vec::new();
                while let Some(url) = storage.claim().expect("Claim failed") {
                    claimed.push(url);
                }
                claimed
            })
        })
        .collect();

    let mut all: Vec<String> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort();
    let total = all.len();
    all.dedup();

    assert_eq!(total, 20);
    assert_eq!(all.len(), 20);
}
