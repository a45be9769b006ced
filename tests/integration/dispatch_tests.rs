//! Dispatcher tests against a mock chat-completions endpoint

use crate::{completion, fast_retry_policy, llm_config};
use press_scout::llm::{
    ChatCompletionsClient, CredentialRotator, DispatchError, DispatchOutcome, Dispatcher,
};
use press_scout::storage::{KeyPartition, MemoryCredentialStore};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn rotator(keys: &[&str]) -> Arc<CredentialRotator> {
    let partition = KeyPartition::new(keys.iter().map(|k| k.to_string()).collect());
    let store = MemoryCredentialStore::new(partition);
    Arc::new(CredentialRotator::new(Box::new(store), 30).unwrap())
}

fn dispatcher(server: &MockServer, rotator: Arc<CredentialRotator>) -> Dispatcher {
    let client = ChatCompletionsClient::new(&llm_config(&server.uri())).unwrap();
    Dispatcher::new(Arc::new(client), rotator, fast_retry_policy(), 6000)
}

#[tokio::test]
async fn test_recovers_after_two_rate_limited_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limit reached"))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion("Here is the press release content:\nAcme news"))
        .mount(&server)
        .await;

    let rotator = rotator(&["gsk_first_key_aaaaa", "gsk_second_key_bbbb", "gsk_third_key_ccccc"]);
    let dispatcher = dispatcher(&server, Arc::clone(&rotator));

    let text = "x".repeat(15_000);
    let dispatched = dispatcher
        .dispatch(&text, "https://example.com/news")
        .await
        .unwrap();

    assert_eq!(dispatched.attempts, 3);
    assert!(dispatched.attempts <= dispatcher.policy().max_attempts);
    assert_eq!(
        dispatched.outcome,
        DispatchOutcome::Content("Acme news Acme news Acme news".to_string())
    );

    // Two rejected chunk calls, then three chunks on the third attempt
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 5);

    let partition = rotator.partition();
    assert_eq!(partition.cooling.len(), 2);
    assert_eq!(partition.total(), 3);
}

#[tokio::test]
async fn test_exhausted_retries_are_typed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server, rotator(&["gsk_only_key_123456"]));
    let err = dispatcher
        .dispatch("Some press text", "https://example.com/press")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DispatchError::RetriesExhausted { attempts: 5, .. }
    ));
    assert_eq!(server.received_requests().await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_sentinel_reply_is_no_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(completion("NO PRESS RELEASE CONTENT"))
        .mount(&server)
        .await;

    let rotator = rotator(&["gsk_only_key_123456"]);
    let dispatcher = dispatcher(&server, Arc::clone(&rotator));
    let dispatched = dispatcher
        .dispatch("Cookie settings", "https://example.com/news")
        .await
        .unwrap();

    assert_eq!(dispatched.outcome, DispatchOutcome::NoContent);
    assert_eq!(dispatched.attempts, 1);
    assert!(rotator.partition().cooling.is_empty());
}
