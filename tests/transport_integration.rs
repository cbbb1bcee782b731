use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpscout_connector::auth::{Authenticator, Clock};
use helpscout_connector::models::RequestSpec;
use helpscout_connector::webhook::MemoryStateStore;
use helpscout_connector::{ClientConfig, Connector, ConnectorError, Credentials, HelpScoutClient};

const T0: i64 = 1_700_000_000;

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::default()
        .with_base_url(server.uri())
        .with_token_url(format!("{}/oauth2/token", server.uri()))
}

fn oauth_client(server: &MockServer) -> HelpScoutClient {
    HelpScoutClient::new(
        config(server),
        Arc::new(Credentials::oauth2("app-1", "secret-1")),
    )
    .expect("build client")
}

fn manual_clock(seconds: Arc<AtomicI64>) -> Clock {
    Arc::new(move || -> DateTime<Utc> {
        Utc.timestamp_opt(seconds.load(Ordering::SeqCst), 0)
            .single()
            .expect("valid timestamp")
    })
}

fn memory_connector(server: &MockServer) -> Connector {
    Connector::from_client(oauth_client(server), Arc::new(MemoryStateStore::new()))
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=app-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "tok-1", "expires_in": 7200 })),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn page(collection: &str, ids: &[u64], next: Option<String>) -> Value {
    let items: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
    let mut links = json!({ "self": { "href": "ignored" } });
    if let Some(next) = next {
        links["next"] = json!({ "href": next });
    }
    json!({
        "_embedded": { (collection): items },
        "_links": links,
    })
}

#[tokio::test]
async fn bearer_token_is_fetched_once_and_reused() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/mailboxes/7"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 7, "name": "Support" })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = oauth_client(&server);
    for _ in 0..2 {
        let mailbox = client
            .send(&RequestSpec::get("/mailboxes/7"))
            .await
            .expect("mailbox");
        assert_eq!(mailbox["name"], "Support");
    }
}

#[tokio::test]
async fn cached_token_goes_stale_sixty_seconds_before_expiry() {
    let server = MockServer::start().await;
    mount_token(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .mount(&server)
        .await;

    let now = Arc::new(AtomicI64::new(T0));
    let token_url = format!("{}/oauth2/token", server.uri());
    let authenticator = Authenticator::new(reqwest::Client::new(), token_url)
        .with_clock(manual_clock(now.clone()));
    let client = HelpScoutClient::with_authenticator(
        config(&server),
        Arc::new(Credentials::oauth2("app-1", "secret-1")),
        Arc::new(authenticator),
    )
    .expect("build client");
    let expiry = T0 + 7200;

    client.send(&RequestSpec::get("/users/me")).await.expect("first");

    now.store(expiry - 61, Ordering::SeqCst);
    client.send(&RequestSpec::get("/users/me")).await.expect("cached");

    now.store(expiry - 59, Ordering::SeqCst);
    client.send(&RequestSpec::get("/users/me")).await.expect("refetched");
}

#[tokio::test]
async fn unauthorized_response_evicts_cached_token() {
    let server = MockServer::start().await;
    mount_token(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
        .expect(2)
        .mount(&server)
        .await;

    let client = oauth_client(&server);
    for _ in 0..2 {
        let error = client
            .send(&RequestSpec::get("/users/me"))
            .await
            .expect_err("unauthorized");
        assert!(matches!(error, ConnectorError::Unauthorized { .. }));
    }
}

#[tokio::test]
async fn token_endpoint_without_access_token_is_an_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "expires_in": 7200 })))
        .mount(&server)
        .await;

    let error = oauth_client(&server)
        .send(&RequestSpec::get("/users/me"))
        .await
        .expect_err("no token");
    assert!(matches!(error, ConnectorError::Auth { .. }));
    assert!(error.to_string().contains("Failed to obtain access token"));
}

#[tokio::test]
async fn api_key_uses_basic_auth_without_token_request() {
    let server = MockServer::start().await;
    mount_token(&server, 0).await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Basic YWJjOlg="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 3 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HelpScoutClient::new(config(&server), Arc::new(Credentials::api_key("abc")))
        .expect("build client");
    let me = client.send(&RequestSpec::get("/users/me")).await.expect("me");
    assert_eq!(me["id"], 3);
}

#[tokio::test]
async fn error_statuses_map_to_distinct_kinds() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    for (route, status) in [("/limited", 429), ("/missing", 404), ("/broken", 500)] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .mount(&server)
            .await;
    }

    let client = oauth_client(&server);
    let limited = client.send(&RequestSpec::get("/limited")).await.expect_err("429");
    assert!(matches!(limited, ConnectorError::RateLimited { .. }));
    assert!(limited.to_string().contains("rate limit"));

    let missing = client.send(&RequestSpec::get("/missing")).await.expect_err("404");
    assert!(matches!(missing, ConnectorError::NotFound { .. }));

    let broken = client.send(&RequestSpec::get("/broken")).await.expect_err("500");
    match broken {
        ConnectorError::Api { status, body } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "nope");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_success_body_reads_as_success() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("DELETE"))
        .and(path("/conversations/55"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let response = oauth_client(&server)
        .send(&RequestSpec::delete("/conversations/55"))
        .await
        .expect("delete");
    assert_eq!(response, json!({ "success": true }));
}

#[tokio::test]
async fn collect_all_follows_next_links_in_order() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/mailboxes"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            "mailboxes",
            &[1, 2],
            Some(format!("{}/mailboxes?page=2", server.uri())),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mailboxes"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            "mailboxes",
            &[3, 4],
            Some(format!("{}/mailboxes?page=3", server.uri())),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mailboxes"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page("mailboxes", &[5], None)))
        .expect(1)
        .mount(&server)
        .await;

    let items = oauth_client(&server)
        .collect_all(&RequestSpec::get("/mailboxes"), "mailboxes")
        .await
        .expect("collect");
    let ids: Vec<u64> = items.iter().filter_map(|item| item["id"].as_u64()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn page_cap_aborts_runaway_pagination() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            "tags",
            &[1],
            Some(format!("{}/tags?page=2", server.uri())),
        )))
        .expect(2)
        .mount(&server)
        .await;

    let client = HelpScoutClient::new(
        config(&server).with_max_pages(Some(2)),
        Arc::new(Credentials::oauth2("app-1", "secret-1")),
    )
    .expect("build client");
    let error = client
        .collect_all(&RequestSpec::get("/tags"), "tags")
        .await
        .expect_err("capped");
    assert!(matches!(error, ConnectorError::PageLimitExceeded { max_pages: 2 }));
}

#[tokio::test]
async fn limited_list_requests_one_small_page() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    let ids: Vec<u64> = (1..=50).collect();
    Mock::given(method("GET"))
        .and(path("/customers"))
        .and(query_param("pageSize", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            "customers",
            &ids,
            Some(format!("{}/customers?page=2", server.uri())),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let connector = memory_connector(&server);
    let records = connector
        .execute("customer", "getAll", &[json!({ "limit": 5 })], false)
        .await
        .expect("customers");
    let ids: Vec<u64> = records.iter().filter_map(|record| record["id"].as_u64()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn continue_on_fail_records_errors_per_item() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 1, "email": "a@example.com" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/2"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .mount(&server)
        .await;

    let connector = memory_connector(&server);
    let items = [json!({ "userId": 1 }), json!({ "userId": 2 }), json!({})];

    let records = connector
        .execute("user", "get", &items, true)
        .await
        .expect("continue on fail");
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["email"], "a@example.com");
    assert!(records[1]["error"].as_str().expect("error text").contains("not found"));
    assert!(records[2].get("error").is_some());

    let error = connector
        .execute("user", "get", &items, false)
        .await
        .expect_err("aborts");
    assert!(matches!(error, ConnectorError::NotFound { .. }));
}

#[tokio::test]
async fn conversation_status_change_sends_json_patch() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("PATCH"))
        .and(path("/conversations/9"))
        .and(body_json(json!([{
            "op": "replace",
            "path": "/status",
            "value": "closed"
        }])))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let connector = memory_connector(&server);
    let records = connector
        .execute(
            "conversation",
            "changeStatus",
            &[json!({ "conversationId": "9", "status": "closed" })],
            false,
        )
        .await
        .expect("status change");
    assert_eq!(records[0]["success"], true);
}
