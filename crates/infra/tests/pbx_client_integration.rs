//! PBX client behaviour against a mock OpenAPI server.

mod support;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Duration as ChronoDuration;
use pbxpresence_common::{MockClock, RequestSpacer};
use pbxpresence_core::{PbxGateway, SecretCipher, SettingsRepository};
use pbxpresence_domain::{PresenceError, PresenceStatus};
use pbxpresence_infra::{PbxClient, PbxClientConfig, TokenState};
use serde_json::json;
use support::{fixed_now, TestStore};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_PATH: &str = "/openapi/v1.0/get_token";
const SEARCH_PATH: &str = "/openapi/v1.0/extension/search";
const UPDATE_PATH: &str = "/openapi/v1.0/extension/update";

struct Harness {
    server: MockServer,
    db: TestStore,
    client: PbxClient,
}

async fn harness(spacing: Duration) -> Harness {
    let server = MockServer::start().await;
    let db = TestStore::new();

    let mut settings = db.store.load_settings().unwrap();
    settings.pbx_url = Some(server.uri());
    settings.client_id = Some("client-id".into());
    settings.client_secret_encrypted = Some(db.cipher.encrypt("client-secret").unwrap());
    db.store.save_settings(&settings).unwrap();

    let client = PbxClient::new(
        PbxClientConfig::default(),
        db.store.clone(),
        db.cipher.clone(),
        Arc::new(RequestSpacer::new(spacing)),
    )
    .unwrap()
    .with_clock(Arc::new(MockClock::at(fixed_now())));

    Harness { server, db, client }
}

fn search_body() -> serde_json::Value {
    json!({
        "errcode": 0,
        "errmsg": "SUCCESS",
        "data": [
            {"id": 7, "number": "1001", "caller_id_name": "Reception", "presence_status": "lunch"},
            {"id": 8, "number": 1002, "presence_status": ""}
        ]
    })
}

#[tokio::test]
async fn cached_token_with_time_left_is_reused() {
    let h = harness(Duration::from_millis(10)).await;
    h.db.store
        .save_token(Some("cached"), Some(fixed_now() + ChronoDuration::minutes(10)))
        .unwrap();

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("access_token", "cached"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .expect(1)
        .mount(&h.server)
        .await;

    let extensions = h.client.list_extensions().await.unwrap();

    assert_eq!(extensions.len(), 2);
    assert_eq!(extensions[0].remote_id, 7);
    assert_eq!(extensions[0].name.as_deref(), Some("Reception"));
    assert_eq!(extensions[0].presence_status, Some(PresenceStatus::Lunch));
    assert_eq!(extensions[1].number, "1002");
    assert_eq!(extensions[1].presence_status, None);
    assert_eq!(h.client.token_state(), TokenState::Valid);
}

#[tokio::test]
async fn token_inside_refresh_window_is_renewed_first() {
    let h = harness(Duration::from_millis(10)).await;
    h.db.store
        .save_token(Some("stale"), Some(fixed_now() + ChronoDuration::minutes(3)))
        .unwrap();

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_json(json!({"username": "client-id", "password": "client-secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errcode": 0,
            "errmsg": "SUCCESS",
            "access_token": "fresh",
            "access_token_expire_time": 1800
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("access_token", "fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .expect(1)
        .mount(&h.server)
        .await;

    h.client.list_extensions().await.unwrap();

    let settings = h.db.store.load_settings().unwrap();
    assert_eq!(settings.access_token.as_deref(), Some("fresh"));
    assert_eq!(settings.token_expires_at, Some(fixed_now() + ChronoDuration::seconds(1800)));
}

#[tokio::test]
async fn rejected_credentials_invalidate_the_token() {
    let h = harness(Duration::from_millis(10)).await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errcode": 10004,
            "errmsg": "USER OR PASSWORD ERROR"
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    let err = h.client.list_extensions().await.unwrap_err();

    assert!(
        matches!(err, PresenceError::Authentication(ref msg) if msg.contains("USER OR PASSWORD"))
    );
    assert_eq!(h.client.token_state(), TokenState::Invalid);
    assert!(h.db.store.load_settings().unwrap().access_token.is_none());
}

#[tokio::test]
async fn unauthorized_response_drops_the_cached_token() {
    let h = harness(Duration::from_millis(10)).await;
    h.db.store
        .save_token(Some("revoked"), Some(fixed_now() + ChronoDuration::minutes(20)))
        .unwrap();

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h.client.list_extensions().await.unwrap_err();

    assert!(matches!(err, PresenceError::Authentication(_)));
    assert_eq!(h.client.token_state(), TokenState::Invalid);
    assert!(h.db.store.load_settings().unwrap().access_token.is_none());
}

#[tokio::test]
async fn missing_credentials_fail_without_contacting_the_pbx() {
    let h = harness(Duration::from_millis(10)).await;
    let mut settings = h.db.store.load_settings().unwrap();
    settings.client_secret_encrypted = None;
    h.db.store.save_settings(&settings).unwrap();

    let err = h.client.set_presence(7, &PresenceStatus::Away).await.unwrap_err();

    assert!(matches!(
        err,
        PresenceError::ConfigurationMissing(ref missing) if missing == "client_secret"
    ));
    assert!(h.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn presence_update_sends_payload_and_surfaces_errcode() {
    let h = harness(Duration::from_millis(10)).await;
    h.db.store
        .save_token(Some("cached"), Some(fixed_now() + ChronoDuration::hours(1)))
        .unwrap();

    Mock::given(method("POST"))
        .and(path(UPDATE_PATH))
        .and(body_json(json!({"id": 7, "presence_status": "lunch"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errcode": 0})))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path(UPDATE_PATH))
        .and(body_json(json!({"id": 99, "presence_status": "away"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"errcode": 40002, "errmsg": "EXTENSION NOT EXIST"})),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    h.client.set_presence(7, &PresenceStatus::Lunch).await.unwrap();
    let err = h.client.set_presence(99, &PresenceStatus::Away).await.unwrap_err();

    assert_eq!(
        err,
        PresenceError::RemoteApi { code: 40002, message: "EXTENSION NOT EXIST".into() }
    );
}

#[tokio::test]
async fn consecutive_requests_are_spaced() {
    let spacing = Duration::from_millis(150);
    let h = harness(spacing).await;
    h.db.store
        .save_token(Some("cached"), Some(fixed_now() + ChronoDuration::hours(1)))
        .unwrap();

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .expect(3)
        .mount(&h.server)
        .await;

    let started = Instant::now();
    for _ in 0..3 {
        h.client.list_extensions().await.unwrap();
    }

    assert!(started.elapsed() >= spacing * 2);
}
