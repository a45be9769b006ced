//! End-to-end crawl tests against a mock website

use crate::{crawler_config, html};
use press_scout::crawler::{CrawlEngine, CrawlSettings, HttpFetcher};
use press_scout::output::{
    load_pagination_snapshot, JsonFileSink, PersistenceSink, PAGINATION_FILE,
};
use press_scout::CrawlPhase;
use std::collections::BTreeSet;
use std::sync::Arc;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine() -> CrawlEngine {
    let config = crawler_config();
    let fetcher = HttpFetcher::new(&config).expect("client builds");
    CrawlEngine::new(Arc::new(fetcher), CrawlSettings::from(&config))
}

async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| match request.url.query() {
            Some(query) => format!("{}?{}", request.url.path(), query),
            None => request.url.path().to_string(),
        })
        .collect()
}

#[tokio::test]
async fn test_crawl_stays_on_seed_domain() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(html(&format!(
            r#"<a href="{}/news/page2">Page 2</a>
               <a href="https://external.com/ad">Ad</a>"#,
            base
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/news/page2"))
        .respond_with(html("<h2>Second page</h2><p>More stories</p>"))
        .mount(&server)
        .await;

    let seed = Url::parse(&format!("{}/news", base)).unwrap();
    let report = engine().crawl(&seed, None).await.unwrap();

    let mut paths = requested_paths(&server).await;
    paths.sort();
    assert_eq!(paths, vec!["/news".to_string(), "/news/page2".to_string()]);

    assert_eq!(report.visited.len(), 2);
    assert_eq!(report.pagination.len(), 1);
    assert_eq!(report.pagination[&format!("{}/news", base)].page_count, 2);
    assert!(report
        .visited
        .iter()
        .all(|visited| !visited.contains("external.com")));
    assert_eq!(report.pages.len(), 2);
    assert_eq!(report.phase, CrawlPhase::Drained);
    assert!(report.failed.is_empty());
}

#[tokio::test]
async fn test_crawl_walks_pagination_and_checkpoints() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/press"))
        .respond_with(html(
            r#"<h1>Press releases</h1>
               <ul>
                 <li class="pagination"><a href="/archive?page=1">1</a></li>
                 <li class="pagination"><a href="/archive?page=2">2</a></li>
               </ul>
               <a class="next" href="/archive?page=2">Next</a>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/archive"))
        .respond_with(html(r#"<p>Older releases</p>"#))
        .mount(&server)
        .await;

    let sink = Arc::new(JsonFileSink::claim(dir.path(), true).unwrap().unwrap());
    let seed = Url::parse(&format!("{}/press", base)).unwrap();
    let report = engine()
        .crawl(&seed, Some(Arc::clone(&sink) as Arc<dyn PersistenceSink>))
        .await
        .unwrap();

    // The archive pages carry no news keyword, so only pagination reaches them
    let paths: BTreeSet<String> = requested_paths(&server).await.into_iter().collect();
    assert!(paths.contains("/archive?page=2"));

    let parent = format!("{}/press", base);
    let record = &report.pagination[&parent];
    assert!(record.page_count >= 2);
    assert_eq!(record.pagination_links[0], parent);
    assert!(record
        .pagination_links
        .contains(&format!("{}/archive?page=2", base)));

    let checkpoint = load_pagination_snapshot(&dir.path().join(PAGINATION_FILE));
    assert_eq!(checkpoint, report.pagination);
}

#[tokio::test]
async fn test_failed_pages_do_not_abort_job() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/newsroom"))
        .respond_with(html(
            r#"<div class="news-card"><a href="/newsroom/broken">Broken</a></div>
               <div class="news-card"><a href="/newsroom/ok">Fine</a></div>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/newsroom/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/newsroom/ok"))
        .respond_with(html("<p>Still here</p>"))
        .mount(&server)
        .await;

    let seed = Url::parse(&format!("{}/newsroom", base)).unwrap();
    let report = engine().crawl(&seed, None).await.unwrap();

    assert_eq!(report.pages.len(), 2);
    assert_eq!(report.failed, vec![format!("{}/newsroom/broken", base)]);
    assert_eq!(report.phase, CrawlPhase::Drained);
}

#[tokio::test]
async fn test_unreachable_seed_drains_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let seed = Url::parse(&format!("{}/news", server.uri())).unwrap();
    let report = engine().crawl(&seed, None).await.unwrap();

    assert!(report.pages.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.phase, CrawlPhase::Drained);
    assert!(report.pagination.is_empty());
}
