#![cfg(feature = "client")]

use futures_util::StreamExt;
use stockview::client::{start_analysis, AnalysisApp, AnalysisBackend, ClientError, HttpBackend};
use stockview::protocol::TaskId;
use stockview::session::{CloseReason, SubscriptionState};
use stockview::view::{
    Document, RecordingView, ViewEvent, DEFAULT_FAILURE_TEXT, TRANSPORT_ERROR_TEXT,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMPLETED_STREAM: &str = concat!(
    ": keep-alive\n\n",
    "data: {\"task_id\":\"t1\",\"status\":\"processing\",\"message\":\"准备开始...\",\"percentage\":0}\n\n",
    "event: ping\ndata: {}\n\n",
    "data: {\"task_id\":\"t1\",\"status\":\"processing\",\"message\":\"生成图表...\",\"percentage\":60}\r\n\r\n",
    "data: {\"task_id\":\"t1\",\"status\":\"completed\",\"message\":\"分析完成\",\"percentage\":100,",
    "\"result\":{\"daily_chart\":\"/charts/d.png\",\"hourly_chart\":\"/charts/h.png\",\"analysis\":\"/reports/t1.md\"}}\n\n",
);

async fn mount_stream(server: &MockServer, task_id: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/stream/{}", task_id)))
        .and(header("accept", "text/event-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/event-stream"))
        .mount(server)
        .await;
}

fn backend(server: &MockServer) -> HttpBackend {
    HttpBackend::new(&server.uri(), 5).expect("valid base url")
}

#[tokio::test]
async fn create_task_returns_server_task_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analysis/NVDA.us"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "task_id": "NVDA_us_2024010215",
            "status": "pending",
            "created_at": "2024-01-02T15:00:00Z",
            "estimated_completion": "2024-01-02T15:02:00Z",
            "result_url": "/api/stream/NVDA_us_2024010215"
        })))
        .mount(&server)
        .await;

    let created = backend(&server).create_task("NVDA.us").await.expect("task created");
    assert_eq!(created.task_id(), Some(TaskId::new("NVDA_us_2024010215")));
    assert_eq!(created.status.as_deref(), Some("pending"));
}

#[tokio::test]
async fn create_task_maps_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analysis/NVDA"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "code": "INVALID_SYMBOL_MARKET",
            "message": "无效的股票代码和市场格式"
        })))
        .mount(&server)
        .await;

    let err = backend(&server).create_task("NVDA").await.unwrap_err();
    match err {
        ClientError::Api { status, code, .. } => {
            assert_eq!(status, 400);
            assert_eq!(code, "INVALID_SYMBOL_MARKET");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn create_task_without_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analysis/NVDA.us"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    let err = backend(&server).create_task("NVDA.us").await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 503, .. }));
}

#[tokio::test]
async fn stream_decodes_message_events() {
    let server = MockServer::start().await;
    mount_stream(&server, "t1", COMPLETED_STREAM).await;

    let events: Vec<_> = backend(&server)
        .open_stream(&TaskId::new("t1"))
        .await
        .expect("stream opened")
        .collect()
        .await;

    let events: Vec<_> = events.into_iter().map(|e| e.expect("event")).collect();
    assert_eq!(events.len(), 4);
    assert_eq!(events.iter().filter(|e| e.is_message()).count(), 3);
    assert_eq!(events[1].event.as_deref(), Some("ping"));
}

#[tokio::test]
async fn run_follows_stream_and_loads_report() {
    let server = MockServer::start().await;
    mount_stream(&server, "t1", COMPLETED_STREAM).await;
    Mock::given(method("GET"))
        .and(path("/reports/t1.md"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# NVDA\n\n持有"))
        .expect(1)
        .mount(&server)
        .await;

    let page_url = format!("{}/analysis/NVDA.us?taskId=t1", server.uri());
    let mut app = AnalysisApp::from_page_url(backend(&server), RecordingView::new(), &page_url);

    assert_eq!(app.run().await, SubscriptionState::Closed(CloseReason::Completed));

    let events = &app.view().events;
    assert_eq!(events.len(), 4);
    assert!(matches!(&events[0], ViewEvent::Progress(p) if p.fill_width.as_deref() == Some("0%")));
    assert!(matches!(&events[1], ViewEvent::Progress(p) if p.message == "生成图表..."));
    assert!(matches!(&events[2], ViewEvent::Result(r) if r.hourly_chart() == Some("/charts/h.png")));
    assert_eq!(
        events[3],
        ViewEvent::Document(Document::Loaded("# NVDA\n\n持有".to_string()))
    );
}

#[tokio::test]
async fn missing_report_is_shown_inline() {
    let server = MockServer::start().await;
    mount_stream(
        &server,
        "t2",
        "data: {\"status\":\"completed\",\"result\":{\"analysis\":\"/reports/gone.md\"}}\n\n",
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/reports/gone.md"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut app = AnalysisApp::new(backend(&server), RecordingView::new(), Some(TaskId::new("t2")));
    assert_eq!(app.run().await, SubscriptionState::Closed(CloseReason::Completed));
    assert_eq!(
        app.view().events.last(),
        Some(&ViewEvent::Document(Document::Unavailable))
    );
    assert_eq!(app.view().last_error(), None);
}

#[tokio::test]
async fn failed_task_shows_default_message() {
    let server = MockServer::start().await;
    mount_stream(&server, "t3", "data: {\"status\":\"failed\",\"error\":\"\"}\n\n").await;

    let mut app = AnalysisApp::new(backend(&server), RecordingView::new(), Some(TaskId::new("t3")));
    assert_eq!(app.run().await, SubscriptionState::Closed(CloseReason::Failed));
    assert_eq!(app.view().last_error(), Some(DEFAULT_FAILURE_TEXT));
}

#[tokio::test]
async fn unknown_task_stream_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/stream/nope"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut app = AnalysisApp::new(backend(&server), RecordingView::new(), Some(TaskId::new("nope")));
    assert_eq!(
        app.run().await,
        SubscriptionState::Closed(CloseReason::TransportError)
    );
    assert_eq!(
        app.view().events,
        vec![ViewEvent::Error(TRANSPORT_ERROR_TEXT.to_string())]
    );
}

#[tokio::test]
async fn start_analysis_follows_created_task() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analysis/600519.sh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "task_id": "600519_sh_1",
            "status": "pending"
        })))
        .mount(&server)
        .await;
    mount_stream(&server, "600519_sh_1", "data: {\"status\":\"failed\",\"error\":\"数据源不可用\"}\n\n").await;

    let mut app = start_analysis(backend(&server), RecordingView::new(), "600519.sh")
        .await
        .expect("request ok")
        .expect("task created");
    assert_eq!(app.run().await, SubscriptionState::Closed(CloseReason::Failed));
    assert_eq!(app.view().last_error(), Some("数据源不可用"));
}
