//! Seed Job tests: crawl, dispatch and persist against mock site and model

use crate::{completion, crawler_config, fast_retry_policy, html, llm_config};
use press_scout::crawler::{CrawlEngine, CrawlSettings, ExtractedPage, HttpFetcher};
use press_scout::llm::{ChatCompletionsClient, CredentialRotator, Dispatcher};
use press_scout::output::{
    seed_output_dir, SeedResults, SeedStatus, EXTRACTED_URLS_FILE, FILTERED_PAGINATION_FILE,
    PAGES_FILE, PAGINATION_FILE, RESULTS_FILE,
};
use press_scout::pipeline::{run_seed_jobs, JobRunner};
use press_scout::storage::{KeyPartition, MemoryCredentialStore};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn runner(llm: &MockServer, output: &Path, fresh: bool) -> JobRunner {
    let crawler = crawler_config();
    let engine = CrawlEngine::new(
        Arc::new(HttpFetcher::new(&crawler).unwrap()),
        CrawlSettings::from(&crawler),
    );

    let store = MemoryCredentialStore::new(KeyPartition::new(vec![
        "gsk_pipeline_key_one".to_string(),
        "gsk_pipeline_key_two".to_string(),
    ]));
    let rotator = Arc::new(CredentialRotator::new(Box::new(store), 30).unwrap());
    let client = ChatCompletionsClient::new(&llm_config(&llm.uri())).unwrap();
    let dispatcher = Dispatcher::new(Arc::new(client), rotator, fast_retry_policy(), 6000);

    JobRunner::new(engine, dispatcher, output, fresh)
}

async fn mount_site(site: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(html(&format!(
            r#"<h1>Newsroom</h1>
               <a href="{}/news/page2">Page 2</a>
               <a href="https://external.com/ad">Ad</a>"#,
            site.uri()
        )))
        .mount(site)
        .await;

    Mock::given(method("GET"))
        .and(path("/news/page2"))
        .respond_with(html("<h2>Acme acquires Widget Co.</h2><p>Full story.</p>"))
        .mount(site)
        .await;
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> T {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_seed_job_persists_all_documents() {
    let site = MockServer::start().await;
    let llm = MockServer::start().await;
    let output = TempDir::new().unwrap();
    mount_site(&site).await;

    Mock::given(method("POST"))
        .respond_with(completion("Here are the releases:\nAcme acquires Widget Co."))
        .mount(&llm)
        .await;

    let seed = Url::parse(&format!("{}/news", site.uri())).unwrap();
    let summary = runner(&llm, output.path(), false).run_seed(&seed).await;

    assert_eq!(summary.status, SeedStatus::Completed);
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.results, 2);
    assert_eq!(summary.failures, 0);

    let directory = seed_output_dir(output.path(), &seed);
    let pages: Vec<ExtractedPage> = read_json(&directory.join(PAGES_FILE));
    assert_eq!(pages.len(), 2);

    let results: SeedResults = read_json(&directory.join(RESULTS_FILE));
    assert_eq!(results.seed_url, seed.to_string());
    assert_eq!(results.visited_urls.len(), 2);
    assert!(results
        .results
        .iter()
        .all(|r| r.result == "Acme acquires Widget Co."));
    assert!(directory.join(PAGINATION_FILE).exists());

    let extracted: Vec<String> = read_json(&directory.join(EXTRACTED_URLS_FILE));
    assert_eq!(extracted, results.visited_urls);

    // Both pages sit under the seed's record and mention "news"
    let filtered: Vec<String> = read_json(&directory.join(FILTERED_PAGINATION_FILE));
    assert_eq!(
        filtered,
        vec![format!("{}/news", site.uri()), format!("{}/news/page2", site.uri())]
    );
}

#[tokio::test]
async fn test_dispatch_failure_is_per_item() {
    let site = MockServer::start().await;
    let llm = MockServer::start().await;
    let output = TempDir::new().unwrap();
    mount_site(&site).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&llm)
        .await;

    let seed = Url::parse(&format!("{}/news", site.uri())).unwrap();
    let summary = runner(&llm, output.path(), false).run_seed(&seed).await;

    assert_eq!(summary.status, SeedStatus::Completed);
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.failures, 2);
    assert_eq!(summary.results, 0);

    let results: SeedResults =
        read_json(&seed_output_dir(output.path(), &seed).join(RESULTS_FILE));
    assert_eq!(results.failures.len(), 2);
}

#[tokio::test]
async fn test_existing_output_is_skipped_unless_fresh() {
    let site = MockServer::start().await;
    let llm = MockServer::start().await;
    let output = TempDir::new().unwrap();
    mount_site(&site).await;

    Mock::given(method("POST"))
        .respond_with(completion("NO PRESS RELEASE CONTENT"))
        .mount(&llm)
        .await;

    let seed = Url::parse(&format!("{}/news", site.uri())).unwrap();
    std::fs::create_dir_all(seed_output_dir(output.path(), &seed)).unwrap();

    let skipped = runner(&llm, output.path(), false).run_seed(&seed).await;
    assert_eq!(skipped.status, SeedStatus::Skipped);
    assert!(site.received_requests().await.unwrap().is_empty());

    let rerun = runner(&llm, output.path(), true).run_seed(&seed).await;
    assert_eq!(rerun.status, SeedStatus::Completed);
    assert_eq!(rerun.no_content, 2);
}

#[tokio::test]
async fn test_seeds_sharing_last_segment_do_not_collide() {
    let site = MockServer::start().await;
    let llm = MockServer::start().await;
    let output = TempDir::new().unwrap();

    for (prefix, story) in [("en", "Acme english"), ("fr", "Acme francais")] {
        Mock::given(method("GET"))
            .and(path(format!("/{}/news", prefix)))
            .respond_with(html(&format!("<p>{}</p>", story)))
            .mount(&site)
            .await;
    }

    Mock::given(method("POST"))
        .respond_with(completion("Acme acquires Widget Co."))
        .mount(&llm)
        .await;

    let english = Url::parse(&format!("{}/en/news", site.uri())).unwrap();
    let french = Url::parse(&format!("{}/fr/news", site.uri())).unwrap();
    assert_ne!(
        seed_output_dir(output.path(), &english),
        seed_output_dir(output.path(), &french)
    );

    let runner = Arc::new(runner(&llm, output.path(), false));
    let summaries = run_seed_jobs(runner, vec![english.clone(), french.clone()], 2).await;
    assert!(summaries
        .iter()
        .all(|s| s.status == SeedStatus::Completed && s.pages == 1));

    for seed in [&english, &french] {
        let results: SeedResults =
            read_json(&seed_output_dir(output.path(), seed).join(RESULTS_FILE));
        assert_eq!(results.seed_url, seed.to_string());
    }
}

#[tokio::test]
async fn test_worker_pool_runs_every_seed() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    let llm = MockServer::start().await;
    let output = TempDir::new().unwrap();
    mount_site(&first).await;
    mount_site(&second).await;

    Mock::given(method("POST"))
        .respond_with(completion("Acme acquires Widget Co."))
        .mount(&llm)
        .await;

    let seeds = vec![
        Url::parse(&format!("{}/news", first.uri())).unwrap(),
        Url::parse(&format!("{}/news", second.uri())).unwrap(),
    ];
    let runner = Arc::new(runner(&llm, output.path(), false));
    let summaries = run_seed_jobs(runner, seeds, 2).await;

    assert_eq!(summaries.len(), 2);
    assert!(summaries
        .iter()
        .all(|s| s.status == SeedStatus::Completed && s.results == 2));
}
