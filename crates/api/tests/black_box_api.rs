use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};

use storewatch_api::app::{build_app, services::{self, AppServices}};
use storewatch_core::{ArtifactLocation, BaseUrl, ReportId};
use storewatch_infra::jobs::testing::{RecordingQueue, RejectingQueue};
use storewatch_infra::jobs::{InMemoryReportStore, ReportQueue, ReportStore};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(services: AppServices) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = build_app(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn services_with(store: Arc<InMemoryReportStore>, queue: Arc<dyn ReportQueue>) -> AppServices {
    AppServices::new(store, queue, None)
}

async fn get_report(client: &reqwest::Client, server: &TestServer, body: Value) -> (StatusCode, Value) {
    let res = client
        .post(server.url("/get_report"))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

#[tokio::test]
async fn health_is_ok() {
    let server = TestServer::spawn(services_with(
        InMemoryReportStore::arc(),
        Arc::new(RecordingQueue::new()),
    ))
    .await;

    let res = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn trigger_then_status_is_running() {
    let store = InMemoryReportStore::arc();
    let queue = Arc::new(RecordingQueue::new());
    let server = TestServer::spawn(services_with(store.clone(), queue.clone())).await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/trigger_report")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let id = body["report_id"].as_str().unwrap().to_string();
    assert!(id.parse::<ReportId>().is_ok());
    assert_eq!(queue.accepted().len(), 1);

    let (status, body) = get_report(&client, &server, json!({ "report_id": id })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "Running" }));
}

#[tokio::test]
async fn trigger_accepts_post() {
    let server = TestServer::spawn(services_with(
        InMemoryReportStore::arc(),
        Arc::new(RecordingQueue::new()),
    ))
    .await;

    let res = reqwest::Client::new()
        .post(server.url("/trigger_report"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn rejected_dispatch_returns_500_and_leaves_no_record() {
    let store = InMemoryReportStore::arc();
    let server = TestServer::spawn(services_with(
        store.clone(),
        Arc::new(RejectingQueue::new("Error 111 connecting to localhost:6379. Connection refused.")),
    ))
    .await;

    let res = reqwest::get(server.url("/trigger_report")).await.unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "error": "Error 111 connecting to localhost:6379. Connection refused." })
    );
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn missing_id_is_bad_request() {
    let server = TestServer::spawn(services_with(
        InMemoryReportStore::arc(),
        Arc::new(RecordingQueue::new()),
    ))
    .await;
    let client = reqwest::Client::new();
    let expected = json!({ "error": "No Valid inputs", "input parameter": { "report_id": "" } });

    for body in [json!({}), json!({ "report_id": "" }), json!({ "report_id": null })] {
        let (status, got) = get_report(&client, &server, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(got, expected);
    }

    // No body at all.
    let res = client.post(server.url("/get_report")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await.unwrap(), expected);
}

#[tokio::test]
async fn form_encoded_id_is_accepted() {
    let store = InMemoryReportStore::arc();
    let id = store.create().await.unwrap().report_id().to_string();
    let server = TestServer::spawn(services_with(store, Arc::new(RecordingQueue::new()))).await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/get_report"))
        .form(&[("report_id", id.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "status": "Running" }));

    let res = client
        .post(server.url("/get_report"))
        .form(&[("report_id", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_completion_is_rejected_and_first_result_kept() {
    let store = InMemoryReportStore::arc();
    let id = store.create().await.unwrap().report_id();
    store
        .complete(id, ArtifactLocation::new("/files/first.csv").unwrap())
        .await
        .unwrap();
    assert!(store.fail(id, "redelivered".to_string()).await.is_err());
    let server = TestServer::spawn(services_with(store, Arc::new(RecordingQueue::new()))).await;

    let (status, body) = get_report(
        &reqwest::Client::new(),
        &server,
        json!({ "report_id": id.to_string() }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"], format!("{}/files/first.csv", server.base_url));
}

#[tokio::test]
async fn malformed_id_is_bad_request() {
    let server = TestServer::spawn(services_with(
        InMemoryReportStore::arc(),
        Arc::new(RecordingQueue::new()),
    ))
    .await;

    let (status, body) = get_report(
        &reqwest::Client::new(),
        &server,
        json!({ "report_id": "not-a-uuid" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid UUID format provided." }));
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let server = TestServer::spawn(services_with(
        InMemoryReportStore::arc(),
        Arc::new(RecordingQueue::new()),
    ))
    .await;

    let (status, body) = get_report(
        &reqwest::Client::new(),
        &server,
        json!({ "report_id": ReportId::new().to_string() }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "detail": "Not found." }));
}

#[tokio::test]
async fn complete_report_url_is_absolute_for_request_host() {
    let store = InMemoryReportStore::arc();
    let id = store.create().await.unwrap().report_id();
    store
        .complete(id, ArtifactLocation::new("/files/r1.csv").unwrap())
        .await
        .unwrap();
    let server = TestServer::spawn(services_with(store, Arc::new(RecordingQueue::new()))).await;

    let (status, body) = get_report(
        &reqwest::Client::new(),
        &server,
        json!({ "report_id": id.to_string() }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "status": "Complete", "report": format!("{}/files/r1.csv", server.base_url) })
    );
}

#[tokio::test]
async fn public_base_url_overrides_request_host() {
    let store = InMemoryReportStore::arc();
    let id = store.create().await.unwrap().report_id();
    store
        .complete(id, ArtifactLocation::new("files/r1.csv").unwrap())
        .await
        .unwrap();
    let services = AppServices::new(
        store,
        Arc::new(RecordingQueue::new()),
        Some(BaseUrl::parse("https://reports.example.com/").unwrap()),
    );
    let server = TestServer::spawn(services).await;

    let (_, body) = get_report(
        &reqwest::Client::new(),
        &server,
        json!({ "report_id": id.to_string() }),
    )
    .await;

    assert_eq!(body["report"], "https://reports.example.com/files/r1.csv");
}

#[tokio::test]
async fn failed_report_exposes_error() {
    let store = InMemoryReportStore::arc();
    let id = store.create().await.unwrap().report_id();
    store.fail(id, "builder crashed".to_string()).await.unwrap();
    let server = TestServer::spawn(services_with(store, Arc::new(RecordingQueue::new()))).await;

    let (status, body) = get_report(
        &reqwest::Client::new(),
        &server,
        json!({ "report_id": id.to_string() }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "Failed", "error": "builder crashed" }));
}

#[tokio::test]
async fn request_id_is_echoed_or_generated() {
    let server = TestServer::spawn(services_with(
        InMemoryReportStore::arc(),
        Arc::new(RecordingQueue::new()),
    ))
    .await;
    let client = reqwest::Client::new();

    let res = client
        .get(server.url("/health"))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "abc-123");

    let res = client.get(server.url("/health")).send().await.unwrap();
    assert!(res.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn local_worker_completes_triggered_report() {
    let store = InMemoryReportStore::arc();
    let queue = services::spawn_local_worker(store.clone(), 8);
    let server = TestServer::spawn(services_with(store, queue)).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(server.url("/trigger_report"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = body["report_id"].as_str().unwrap().to_string();

    // The worker runs in the background; poll briefly until it records completion.
    for _ in 0..50 {
        let (status, body) = get_report(&client, &server, json!({ "report_id": id })).await;
        assert_eq!(status, StatusCode::OK);
        if body["status"] == "Complete" {
            assert_eq!(
                body["report"],
                format!("{}/files/{}.csv", server.base_url, id)
            );
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    panic!("report did not complete within timeout");
}
