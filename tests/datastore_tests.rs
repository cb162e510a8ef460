//! Endpoint behavior against a recording mock transport.
//!
//! Each test queues canned responses, drives the public client API, and then
//! inspects the requests the client produced.

use async_trait::async_trait;
use opencloud::codec::compute_digest;
use opencloud::{
    DataStoreReason, Error, ErrorBodyKind, ErrorReason, HttpRequest, HttpResponse,
    ListDataStoresOptions, ListEntriesOptions, ListVersionsOptions, OpenCloud, SetOptions,
    SortOrder, Time, Transport,
};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

const UNIVERSE: u64 = 3407804942;

#[derive(Default)]
struct MockTransport {
    responses: Mutex<VecDeque<opencloud::Result<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    fn push(&self, status: u16, body: &str) {
        self.push_with_headers(status, body, HeaderMap::new());
    }

    fn push_with_headers(&self, status: u16, body: &str, headers: HeaderMap) {
        self.responses.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            headers,
            body: body.as_bytes().to_vec(),
        }));
    }

    fn push_failure(&self) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(Error::Transport("connection refused".into())));
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn last(&self) -> HttpRequest {
        self.requests().pop().expect("no request was sent")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> opencloud::Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no canned response left")
    }
}

fn setup() -> (OpenCloud, Arc<MockTransport>) {
    let transport = Arc::new(MockTransport::default());
    let cloud = OpenCloud::new("test-key", UNIVERSE).with_transport(transport.clone());
    (cloud, transport)
}

const VERSION_INFO: &str = r#"{"version":"v1","deleted":false,"contentLength":2,"createdTime":"2022-02-02T23:30:06.538Z","objectCreatedTime":"2022-02-02T23:30:06.538Z"}"#;

#[tokio::test]
async fn test_set_then_get_round_trip() -> anyhow::Result<()> {
    let (cloud, transport) = setup();
    let store = cloud.get_data_store("Test");

    transport.push(200, VERSION_INFO);
    let mut headers = HeaderMap::new();
    headers.insert("roblox-entry-version", HeaderValue::from_static("v1"));
    transport.push_with_headers(200, "42", headers);

    let written = store.set("k", &42, SetOptions::default()).await?;
    assert_eq!(written.value.version, "v1");
    assert_eq!(written.status_code, 200);

    let read = store.get::<i64>("k").await?;
    assert_eq!(read.value, 42);
    assert_eq!(read.entry_metadata().version.as_deref(), Some("v1"));

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);

    let set = &requests[0];
    assert_eq!(set.method, Method::POST);
    assert_eq!(
        set.url.path(),
        format!(
            "/datastores/v1/universes/{}/standard-datastores/datastore/entries/entry",
            UNIVERSE
        )
    );
    assert_eq!(set.url.query(), Some("datastoreName=Test&entryKey=k"));
    assert_eq!(set.body.as_deref(), Some(&b"42"[..]));
    assert_eq!(set.headers["x-api-key"], "test-key");
    assert_eq!(set.headers["content-md5"], compute_digest(b"42").as_str());
    assert_eq!(set.headers["content-type"], "application/json");
    assert_eq!(set.headers["roblox-entry-userids"], "[]");
    assert_eq!(set.headers["roblox-entry-attributes"], "{}");

    let get = &requests[1];
    assert_eq!(get.method, Method::GET);
    assert!(get.body.is_none());
    assert_eq!(get.url.query(), Some("datastoreName=Test&entryKey=k"));
    assert_eq!(get.headers["x-api-key"], "test-key");
    Ok(())
}

#[tokio::test]
async fn test_set_infinity_digests_wire_bytes() -> anyhow::Result<()> {
    let (cloud, transport) = setup();
    transport.push(200, VERSION_INFO);

    let value = opencloud::json!({ "best": opencloud::codec::INF_SENTINEL });
    cloud
        .get_data_store("Test")
        .set("k", &value, SetOptions::default())
        .await?;

    let req = transport.last();
    let body = req.body.expect("set sends a body");
    assert_eq!(body, br#"{"best":inf}"#.to_vec());
    assert_eq!(req.headers["content-md5"], compute_digest(&body).as_str());
    Ok(())
}

#[tokio::test]
async fn test_set_preconditions_and_metadata() -> anyhow::Result<()> {
    let (cloud, transport) = setup();
    transport.push(200, VERSION_INFO);
    transport.push(200, VERSION_INFO);
    let store = cloud.get_data_store("Test");

    let options = SetOptions::default()
        .user_ids(vec![1, 2])
        .attributes(opencloud::json!({"team": "red"}))
        .match_version("v0");
    store.set("k", "hello", options).await?;

    let req = transport.last();
    assert_eq!(req.url.query(), Some("datastoreName=Test&entryKey=k&matchVersion=v0"));
    assert_eq!(req.headers["roblox-entry-userids"], "[1,2]");
    assert_eq!(req.headers["roblox-entry-attributes"], r#"{"team":"red"}"#);

    store
        .set("k", "hello", SetOptions::default().exclusive_create(true))
        .await?;
    assert_eq!(
        transport.last().url.query(),
        Some("datastoreName=Test&entryKey=k&exclusiveCreate=true")
    );
    Ok(())
}

#[tokio::test]
async fn test_get_not_found_is_typed() {
    let (cloud, transport) = setup();
    transport.push(
        404,
        r#"{"message":"not found","error":"NOT_FOUND","errorDetails":[{"datastoreErrorCode":"EntryNotFound"}]}"#,
    );

    let err = cloud
        .get_data_store("Test")
        .get::<serde_json::Value>("missing")
        .await
        .unwrap_err();

    assert!(err.is_service_error());
    assert!(err.is_not_found());
    assert_eq!(err.reason(), Some(ErrorReason::NotFound));
    assert_eq!(err.fine_reason(), Some("EntryNotFound"));
    assert_eq!(err.status_code(), Some(404));
    match err {
        Error::DataStore { message, .. } => assert_eq!(message, "not found"),
        other => panic!("expected DataStore error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_bad_gateway_is_fixed_error() {
    let (cloud, transport) = setup();
    transport.push(502, "{ this is not json");

    let err = cloud
        .get_data_store("Test")
        .delete("k")
        .await
        .unwrap_err();
    assert_eq!(err.reason(), Some(ErrorReason::Internal));
    assert_eq!(err.fine_reason(), Some("Unknown"));
    assert!(err.to_string().contains("Bad Gateway"));
}

#[tokio::test]
async fn test_empty_error_details_is_decoding_failure() {
    let (cloud, transport) = setup();
    transport.push(404, r#"{"message":"x","error":"NOT_FOUND","errorDetails":[]}"#);

    let err = cloud
        .get_data_store("Test")
        .get::<serde_json::Value>("k")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::ErrorBody {
            status: 404,
            kind: ErrorBodyKind::MissingErrorDetails
        }
    ));
    assert!(!err.is_service_error());
}

#[tokio::test]
async fn test_increment_parses_infinity() -> anyhow::Result<()> {
    let (cloud, transport) = setup();
    transport.push(200, "inf");
    transport.push(200, "7");
    let store = cloud.get_data_store("Test");

    let result = store.increment("k", 5, Default::default()).await?;
    assert_eq!(result.value, f64::INFINITY);
    let req = transport.last();
    assert_eq!(req.method, Method::POST);
    assert!(req.url.path().ends_with("/entries/entry/increment"));
    assert_eq!(req.url.query(), Some("datastoreName=Test&entryKey=k&incrementBy=5"));
    assert!(req.body.is_none());
    assert!(req.headers.get("content-md5").is_none());

    // zero is falsy and never reaches the query string
    let result = store.increment("k", 0, Default::default()).await?;
    assert_eq!(result.value, 7.0);
    assert_eq!(transport.last().url.query(), Some("datastoreName=Test&entryKey=k"));
    Ok(())
}

#[tokio::test]
async fn test_delete_returns_empty_envelope() -> anyhow::Result<()> {
    let (cloud, transport) = setup();
    transport.push(204, "");

    let result = cloud.get_data_store("Test").delete("k").await?;
    assert_eq!(result.status_code, 204);
    assert_eq!(transport.last().method, Method::DELETE);
    Ok(())
}

#[tokio::test]
async fn test_list_entries_defaults() -> anyhow::Result<()> {
    let (cloud, transport) = setup();
    transport.push(
        200,
        r#"{"keys":[{"key":"a","scope":"global"},{"key":"b","scope":"global"}],"nextPageCursor":"abc"}"#,
    );

    let page = cloud
        .get_data_store("Test")
        .list_entries(ListEntriesOptions::default())
        .await?;
    assert_eq!(page.value.keys.len(), 2);
    assert_eq!(page.value.next_page_cursor.as_deref(), Some("abc"));

    let req = transport.last();
    assert!(req.url.path().ends_with("/datastore/entries"));
    assert_eq!(req.url.query(), Some("datastoreName=Test&limit=50&AllScopes=true"));
    Ok(())
}

#[tokio::test]
async fn test_list_entries_single_scope() -> anyhow::Result<()> {
    let (cloud, transport) = setup();
    transport.push(200, r#"{"keys":[]}"#);

    cloud
        .get_data_store("Test")
        .list_entries(ListEntriesOptions::default().scope("global").prefix("p").cursor("c"))
        .await?;
    assert_eq!(
        transport.last().url.query(),
        Some("datastoreName=Test&limit=50&prefix=p&cursor=c&scope=global")
    );
    Ok(())
}

#[tokio::test]
async fn test_list_versions_query() -> anyhow::Result<()> {
    let (cloud, transport) = setup();
    transport.push(200, &format!(r#"{{"versions":[{}],"nextPageCursor":""}}"#, VERSION_INFO));

    let start = Time::parse("2023-01-01T00:00:00Z").expect("valid timestamp");
    let options = ListVersionsOptions::default()
        .limit(10)
        .sort_order(SortOrder::Ascending)
        .between(Some(start), None);
    let page = cloud.get_data_store("Test").list_versions("k", options).await?;
    assert_eq!(page.value.versions[0].version, "v1");

    let req = transport.last();
    assert!(req.url.path().ends_with("/entries/entry/versions"));
    assert_eq!(
        req.url.query(),
        Some("datastoreName=Test&limit=10&sortOrder=Ascending&entryKey=k&startDate=2023-01-01T00%3A00%3A00.000Z")
    );
    Ok(())
}

#[tokio::test]
async fn test_get_version() -> anyhow::Result<()> {
    let (cloud, transport) = setup();
    transport.push(200, r#"{"coins":10}"#);

    let result = cloud
        .get_data_store("Test")
        .get_version::<serde_json::Value>("k", "v1")
        .await?;
    assert_eq!(result.value["coins"], 10);

    let req = transport.last();
    assert!(req.url.path().ends_with("/entries/entry/versions/version"));
    assert_eq!(req.url.query(), Some("datastoreName=Test&entryKey=k&versionId=v1"));
    Ok(())
}

#[tokio::test]
async fn test_list_data_stores() -> anyhow::Result<()> {
    let (cloud, transport) = setup();
    transport.push(
        200,
        r#"{"datastores":[{"name":"Test","createdTime":"2022-02-02T23:30:06.538Z"}],"nextPageCursor":"n"}"#,
    );

    let page = cloud
        .list_data_stores(ListDataStoresOptions::default().prefix("Te"))
        .await?;
    assert_eq!(page.value.datastores[0].name, "Test");

    let req = transport.last();
    assert_eq!(
        req.url.as_str(),
        format!(
            "https://apis.roblox.com/datastores/v1/universes/{}/standard-datastores?prefix=Te&limit=50",
            UNIVERSE
        )
    );
    Ok(())
}

#[tokio::test]
async fn test_list_data_stores_rate_limited() {
    let (cloud, transport) = setup();
    transport.push(
        429,
        r#"{"message":"Too many requests","error":"RESOURCE_EXHAUSTED","errorDetails":[{"datastoreErrorCode":"TooManyRequests"}]}"#,
    );

    let err = cloud
        .list_data_stores(ListDataStoresOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_rate_limited());
    assert!(matches!(
        err,
        Error::DataStore {
            reason: DataStoreReason::ResourceExhausted(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_publish_topic() -> anyhow::Result<()> {
    let (cloud, transport) = setup();
    transport.push(200, "");

    let result = cloud.publish_topic("my topic", "hello").await?;
    assert!(result.success);

    let req = transport.last();
    assert_eq!(req.method, Method::POST);
    assert_eq!(
        req.url.as_str(),
        format!(
            "https://apis.roblox.com/messaging-service/v1/universes/{}/topics/my%20topic",
            UNIVERSE
        )
    );
    assert_eq!(req.headers["content-type"], "application/json");
    assert_eq!(req.headers["x-api-key"], "test-key");
    let body: serde_json::Value = serde_json::from_slice(&req.body.expect("publish sends a body"))?;
    assert_eq!(body, opencloud::json!({"message": "hello"}));
    Ok(())
}

#[tokio::test]
async fn test_publish_topic_failure_is_plain_text() {
    let (cloud, transport) = setup();
    transport.push(
        401,
        r#"{"message":"x","error":"NOT_FOUND","errorDetails":[]}"#,
    );

    let err = cloud.publish_topic("t", "m").await.unwrap_err();
    match err {
        Error::OpenCloud { message, status } => {
            assert_eq!(status, 401);
            assert!(message.starts_with("HTTP 401: "));
        }
        other => panic!("expected OpenCloud error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_transport_failure_propagates() {
    let (cloud, transport) = setup();
    transport.push_failure();

    let err = cloud
        .get_data_store("Test")
        .get::<i64>("k")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert!(!err.is_service_error());
}

#[tokio::test]
async fn test_concurrent_calls_share_credential() -> anyhow::Result<()> {
    let (cloud, transport) = setup();
    transport.push(200, "1");
    transport.push(200, "1");

    let a = cloud.get_data_store("A");
    let b = cloud.get_data_store("B");
    let (ra, rb) = tokio::join!(a.get::<i64>("k"), b.get::<i64>("k"));
    assert_eq!(ra?.value, 1);
    assert_eq!(rb?.value, 1);

    for req in transport.requests() {
        assert_eq!(req.headers["x-api-key"], "test-key");
    }
    Ok(())
}

#[tokio::test]
#[ignore] // Run with: OPENCLOUD_API_KEY=... OPENCLOUD_UNIVERSE_ID=... cargo test -- --ignored
async fn test_live_set_get_delete() -> anyhow::Result<()> {
    let key = std::env::var("OPENCLOUD_API_KEY")?;
    let universe: u64 = std::env::var("OPENCLOUD_UNIVERSE_ID")?.parse()?;
    let cloud = OpenCloud::new(key, universe).with_config(opencloud::Config::from_env());
    let store = cloud.get_data_store("opencloud-rs-test");

    store.set("live", &1, SetOptions::default()).await?;
    let read = store.get::<i64>("live").await?;
    assert_eq!(read.value, 1);

    let bumped = store.increment("live", 2, Default::default()).await?;
    assert_eq!(bumped.value, 3.0);

    store.delete("live").await?;
    let err = store.get::<i64>("live").await.unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}
