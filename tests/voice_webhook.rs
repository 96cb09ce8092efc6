//! HTTP Route Tests
//!
//! Exercises the assembled router in-process with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use tower::util::ServiceExt;

use calldove_gateway::core::realtime::OpenAIConnector;
use calldove_gateway::{ServerConfig, routes, state::AppState};

fn test_state(public_base_url: Option<&str>) -> Arc<AppState> {
    let mut config = ServerConfig::default();
    config.openai_api_key = Some("sk-test".to_string());
    config.public_base_url = public_base_url.map(str::to_string);
    AppState::with_connector(config, Arc::new(OpenAIConnector::new("sk-test")))
}

fn voice_request(uri: &str, host: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::HOST, host)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn app(state: Arc<AppState>) -> Router {
    routes::create_router(state)
}

#[tokio::test]
async fn test_voice_registers_languages_and_returns_twiml() {
    let state = test_state(None);
    let response = app(state.clone())
        .oneshot(voice_request(
            "/voice?source=fr&target=de",
            "gw.example.com",
            "CallSid=CA123&From=%2B15550001111",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/xml"
    );
    let twiml = body_string(response).await;
    assert!(twiml.contains("<Connect>"));
    assert!(twiml.contains(r#"url="wss://gw.example.com/media-stream""#));
    assert!(twiml.contains(r#"<Parameter name="callSid" value="CA123""#));

    let pair = state.call_registry.take("CA123").await.unwrap();
    assert_eq!(pair.source.code(), "fr");
    assert_eq!(pair.target.code(), "de");
}

#[tokio::test]
async fn test_voice_uses_public_base_url() {
    let state = test_state(Some("https://public.example.org"));
    let response = app(state)
        .oneshot(voice_request("/voice", "internal:3000", "CallSid=CA9"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let twiml = body_string(response).await;
    assert!(twiml.contains(r#"url="wss://public.example.org/media-stream""#));
}

#[tokio::test]
async fn test_voice_unknown_languages_fall_back_to_defaults() {
    let state = test_state(None);
    let response = app(state.clone())
        .oneshot(voice_request(
            "/voice?source=xx&target=zz",
            "gw.example.com",
            "CallSid=CA77",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let pair = state.call_registry.take("CA77").await.unwrap();
    assert_eq!(pair.source.code(), "es");
    assert_eq!(pair.target.code(), "en");
}

#[tokio::test]
async fn test_voice_without_call_sid_is_rejected() {
    let state = test_state(None);
    let response = app(state.clone())
        .oneshot(voice_request("/voice", "gw.example.com", "From=%2B15550001111"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value =
        serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["error"], "missing CallSid");
    assert_eq!(state.call_registry.pending_calls(), 0);
}

#[tokio::test]
async fn test_health_reports_counts() {
    let state = test_state(None);
    let response = app(state)
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value =
        serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["active_sessions"], 0);
    assert_eq!(body["websocket_connections"], 0);
}

#[tokio::test]
async fn test_root_banner() {
    let response = app(test_state(None))
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("running"));
}

#[tokio::test]
async fn test_voice_without_host_is_rejected() {
    let state = test_state(None);
    let request = Request::builder()
        .method("POST")
        .uri("/voice")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("CallSid=CA5"))
        .unwrap();
    let response = app(state.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(state.call_registry.take("CA5").await.is_none());
}

#[tokio::test]
async fn test_voice_with_unusable_public_base_url_is_server_error() {
    let state = test_state(Some("ftp://public.example.org"));
    let response = app(state.clone())
        .oneshot(voice_request("/voice", "gw.example.com", "CallSid=CA6"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value =
        serde_json::from_str(&body_string(response).await).unwrap();
    assert!(body["error"].as_str().unwrap().contains("ftp"));
    assert!(state.call_registry.take("CA6").await.is_none());
}
