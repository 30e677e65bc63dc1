//! `HttpAnalysisClient` against an in-process analysis service

use axum::extract::{DefaultBodyLimit, Multipart};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use dermassist::prelude::*;
use reqwest::Url;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr, timeout: Duration) -> HttpAnalysisClient {
    let base = Url::parse(&format!("http://{addr}")).unwrap();
    HttpAnalysisClient::new(&base, timeout).unwrap()
}

fn selection_of(file: CandidateFile) -> Selection {
    let mut machine = UploadStateMachine::new(BlobPreviewStore::new());
    machine.select_file(file);
    machine.state().selection().cloned().unwrap()
}

/// Answers with a result describing the multipart field it received
async fn echo(mut multipart: Multipart) -> Json<Value> {
    let field = multipart.next_field().await.unwrap().unwrap();
    let name = field.name().unwrap_or_default().to_string();
    let filename = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().unwrap_or_default().to_string();
    let data = field.bytes().await.unwrap();

    #[allow(clippy::cast_precision_loss)]
    let size_kb = data.len() as f64 / 1024.0;

    Json(json!({
        "condition": "Eczema",
        "confidence": 87,
        "description": format!("{name}|{content_type}"),
        "suggestions": ["Moisturize twice daily", "See a dermatologist"],
        "filename": filename,
        "size_kb": size_kb,
        "latency_ms": 12
    }))
}

#[tokio::test]
async fn test_success_sends_single_file_part() -> anyhow::Result<()> {
    let router = Router::new()
        .route("/analyze", post(echo))
        .layer(DefaultBodyLimit::disable());
    let client = client_for(serve(router).await, Duration::from_secs(5));
    let selection = selection_of(CandidateFile::new(
        "skin.jpg",
        "image/jpeg",
        vec![0xAB; 2 * 1024 * 1024],
    ));

    let result = client.submit(&selection).await?;

    assert_eq!(result.condition, "Eczema");
    assert_eq!(result.description, "file|image/jpeg");
    assert_eq!(result.filename, "skin.jpg");
    assert!((result.size_kb - 2048.0).abs() < f64::EPSILON);
    assert_eq!(result.suggestions.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_non_success_status_is_service_error() {
    let router = Router::new().route(
        "/analyze",
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let client = client_for(serve(router).await, Duration::from_secs(5));
    let selection = selection_of(CandidateFile::new("a.png", "image/png", vec![1; 10]));

    let err = client.submit(&selection).await.unwrap_err();

    assert_eq!(err, RequestError::Service { status: 500 });
    assert_eq!(err.to_string(), "Analysis failed (500)");
}

#[tokio::test]
async fn test_unparseable_body_is_malformed_response() {
    let router = Router::new().route("/analyze", post(|| async { "<html>oops</html>" }));
    let client = client_for(serve(router).await, Duration::from_secs(5));
    let selection = selection_of(CandidateFile::new("a.webp", "image/webp", vec![1; 10]));

    let err = client.submit(&selection).await.unwrap_err();
    assert!(matches!(err, RequestError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_out_of_range_confidence_is_malformed_response() {
    let router = Router::new().route(
        "/analyze",
        post(|| async {
            Json(json!({
                "condition": "Acne",
                "confidence": 140,
                "description": "",
                "filename": "a.jpg",
                "size_kb": 1,
                "latency_ms": 1
            }))
        }),
    );
    let client = client_for(serve(router).await, Duration::from_secs(5));
    let selection = selection_of(CandidateFile::new("a.jpg", "image/jpeg", vec![1; 10]));

    let err = client.submit(&selection).await.unwrap_err();
    assert!(matches!(err, RequestError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_missing_suggestions_are_empty() -> anyhow::Result<()> {
    let router = Router::new().route(
        "/analyze",
        post(|| async {
            Json(json!({
                "condition": "Acne",
                "confidence": 40,
                "description": "Clogged pores.",
                "filename": "a.jpg",
                "size_kb": 1,
                "latency_ms": 1
            }))
        }),
    );
    let client = client_for(serve(router).await, Duration::from_secs(5));
    let selection = selection_of(CandidateFile::new("a.jpg", "image/jpeg", vec![1; 10]));

    let result = client.submit(&selection).await?;
    assert!(result.suggestions.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let client = client_for(addr, Duration::from_secs(5));
    let selection = selection_of(CandidateFile::new("a.jpg", "image/jpeg", vec![1; 10]));

    let err = client.submit(&selection).await.unwrap_err();
    assert!(matches!(err, RequestError::Transport { .. }));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let router = Router::new().route(
        "/analyze",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            StatusCode::OK
        }),
    );
    let client = client_for(serve(router).await, Duration::from_millis(100));
    let selection = selection_of(CandidateFile::new("a.jpg", "image/jpeg", vec![1; 10]));

    let err = client.submit(&selection).await.unwrap_err();
    assert_eq!(
        err,
        RequestError::Transport {
            reason: "the request timed out".into()
        }
    );
}
