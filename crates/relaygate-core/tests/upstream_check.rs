#![allow(unused_crate_dependencies)]
#![allow(clippy::tests_outside_test_module, reason = "integration tests live in tests/ dir")]
#![allow(clippy::unwrap_used, reason = "integration test: panics are the assertion mechanism")]

use relaygate_core::modules::{AccountRepository, InMemoryAccountRepository};
use relaygate_core::proxy::recovery::{
    ClearingProbe, ConnectivityProbe, HttpUpstreamCheck, ProbeError, RecoveryCoordinator,
    TimingWheel, UpstreamCheck,
};
use relaygate_types::{Account, AccountStatus, Platform, ProbeConfig, RecoveryConfig};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn account(id: &str, platform: Platform, server: &MockServer) -> Account {
    let mut account = Account::new(id, platform);
    account.credential = Some("secret-key".to_string());
    account.base_url = Some(server.uri());
    account
}

fn check() -> HttpUpstreamCheck {
    HttpUpstreamCheck::new(ProbeConfig::default()).unwrap()
}

#[tokio::test]
async fn test_claude_probe_sends_one_token_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "secret-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "msg_1"})))
        .expect(1)
        .mount(&server)
        .await;

    check().check(&account("c", Platform::Claude, &server), TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn test_openai_probe_lists_models() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .and(header("authorization", "Bearer secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    check().check(&account("o", Platform::OpenAi, &server), TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn test_gemini_probe_uses_api_key_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .and(header("x-goog-api-key", "secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"models": []})))
        .expect(1)
        .mount(&server)
        .await;

    check().check(&account("g", Platform::Gemini, &server), TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn test_antigravity_probe_loads_code_assist() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1internal:loadCodeAssist"))
        .and(header("authorization", "Bearer secret-key"))
        .and(body_json(serde_json::json!({"metadata": {"ideType": "ANTIGRAVITY"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    check().check(&account("ag", Platform::Antigravity, &server), TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn test_non_success_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let err = check().check(&account("o", Platform::OpenAi, &server), TIMEOUT).await.unwrap_err();
    assert_eq!(err, ProbeError::Upstream { status: 401, body: "invalid api key".to_string() });
}

#[tokio::test]
async fn test_missing_credential_skips_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    let mut acc = account("o", Platform::OpenAi, &server);
    acc.credential = None;
    let err = check().check(&acc, TIMEOUT).await.unwrap_err();
    assert_eq!(err, ProbeError::MissingCredential("o".to_string()));
}

#[tokio::test]
async fn test_clearing_probe_restores_account() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut acc = account("g", Platform::Gemini, &server);
    acc.set_error("403 PERMISSION_DENIED");
    let repo = Arc::new(InMemoryAccountRepository::with_accounts([acc]));
    let probe = ClearingProbe::new(repo.clone(), Arc::new(check()));

    probe.test_connection_quiet("g", TIMEOUT).await.unwrap();

    let restored = repo.get_by_id("g").await.unwrap();
    assert_eq!(restored.status, AccountStatus::Active);
    assert_eq!(restored.error_message, None);
}

#[tokio::test]
async fn test_recovery_sequence_against_flaky_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let repo = Arc::new(InMemoryAccountRepository::with_accounts([account("c", Platform::Claude, &server)]));
    let probe = Arc::new(ClearingProbe::new(repo.clone(), Arc::new(check())));
    let wheel = TimingWheel::new();
    let config = RecoveryConfig { retry_delay_secs: 0, probe_timeout_secs: 5, ..RecoveryConfig::default() };
    let coordinator = RecoveryCoordinator::new(repo.clone(), probe, wheel.clone(), config);

    repo.mark_error("c", "529 overloaded").unwrap();

    let mut recovered = false;
    for _ in 0..300 {
        if !coordinator.is_in_progress("c") {
            recovered = repo.get_by_id("c").await.unwrap().is_active();
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(recovered);

    coordinator.stop();
    wheel.shutdown();
}
