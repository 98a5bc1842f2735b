//! `HttpTransport` against a local axum server standing in for the backend.
//!
//! ```bash
//! cargo test --package meddrug-client --test test_transport_http
//! ```

mod common;

use std::collections::HashMap;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use common::RecordingNotifier;
use meddrug_client::transport::GENERIC_ERROR;
use meddrug_client::{AnalysisSession, AnalysisTransport, Endpoint, HttpTransport, MoleculeGenerator};
use meddrug_common::config::BackendConfig;
use meddrug_common::{AnalysisKind, AnalysisRequest, PathStyle, SessionError, TransportError};
use serde_json::{json, Value};
use tokio::net::TcpListener;

async fn lipinski(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    match body.get("smiles").and_then(Value::as_str) {
        Some("CCO") => (
            StatusCode::OK,
            Json(json!({ "molecular_weight": 46.07, "logP": -0.31, "HBD": 1, "HBA": 1, "drug_likeness": "Pass" })),
        ),
        _ => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": [{ "loc": ["body", "smiles"], "msg": "Invalid SMILES string" }] })),
        ),
    }
}

async fn generate(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let n: usize = params.get("num_samples").and_then(|s| s.parse().ok()).unwrap_or(0);
    Json(json!({ "generated_molecules": vec!["CCO"; n], "message": format!("Generated {n} molecules") }))
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "<html>Internal Server Error</html>")
}

/// Serve the fake backend on an ephemeral port and return its base URL.
async fn spawn_backend(trailing_slash: bool) -> String {
    let app = if trailing_slash {
        Router::new()
            .route("/lipinski/", post(lipinski))
            .route("/admet/", post(broken))
            .route("/generate/", get(generate))
    } else {
        Router::new()
            .route("/lipinski", post(lipinski))
            .route("/admet", post(broken))
            .route("/generate", get(generate))
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn config(base_url: String) -> BackendConfig {
    BackendConfig { base_url, timeout_secs: 5, ..Default::default() }
}

#[tokio::test]
async fn test_success_returns_raw_body() {
    let base = spawn_backend(false).await;
    let notifier = RecordingNotifier::new();
    let transport = HttpTransport::new(&config(base), notifier.clone()).unwrap();

    let raw = transport.send(Endpoint::Lipinski, &json!({ "smiles": "CCO" })).await.unwrap();
    assert_eq!(raw.status, 200);
    assert_eq!(raw.body["drug_likeness"], "Pass");
    assert!(notifier.all().is_empty());
}

#[tokio::test]
async fn test_validation_detail_becomes_message() {
    let base = spawn_backend(false).await;
    let notifier = RecordingNotifier::new();
    let transport = HttpTransport::new(&config(base), notifier.clone()).unwrap();

    let err = transport.send(Endpoint::Lipinski, &json!({ "smiles": "C1CC" })).await.unwrap_err();
    assert_eq!(err, TransportError::backend(422, "Invalid SMILES string"));
    assert_eq!(notifier.messages(), vec!["Invalid SMILES string".to_string()]);
}

#[tokio::test]
async fn test_non_json_error_uses_generic_message() {
    let base = spawn_backend(false).await;
    let transport = HttpTransport::new(&config(base), RecordingNotifier::new()).unwrap();

    let err = transport.send(Endpoint::Admet, &json!({ "smiles": "CCO" })).await.unwrap_err();
    assert_eq!(err.status, Some(500));
    assert_eq!(err.message, GENERIC_ERROR);
}

#[tokio::test]
async fn test_closed_port_is_network_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let notifier = RecordingNotifier::new();
    let transport = HttpTransport::new(&config(format!("http://{addr}")), notifier.clone()).unwrap();

    let err = transport.send(Endpoint::Lipinski, &json!({ "smiles": "CCO" })).await.unwrap_err();
    assert!(err.is_network());
    assert_eq!(err.message, TransportError::NETWORK_UNREACHABLE);
    assert_eq!(notifier.all().len(), 1);
}

#[tokio::test]
async fn test_trailing_slash_dialect_end_to_end() {
    let base = spawn_backend(true).await;
    let mut cfg = config(base);
    cfg.path_style = PathStyle::TrailingSlash;
    let notifier = RecordingNotifier::new();
    let transport = std::sync::Arc::new(HttpTransport::new(&cfg, notifier.clone()).unwrap());

    let session = AnalysisSession::new(transport.clone(), notifier.clone());
    session
        .submit(AnalysisRequest::new("CCO").with_kind(AnalysisKind::Lipinski))
        .await
        .unwrap();
    assert!(session.result().unwrap().druglikeness.unwrap().passes);

    let generator = MoleculeGenerator::new(transport, notifier.clone());
    let generated = generator.generate(3, None).await.unwrap();
    assert_eq!(generated.molecules.len(), 3);
}

#[tokio::test]
async fn test_session_reports_transport_error_once() {
    let base = spawn_backend(false).await;
    let notifier = RecordingNotifier::new();
    let transport = std::sync::Arc::new(HttpTransport::new(&config(base), notifier.clone()).unwrap());
    let session = AnalysisSession::new(transport, notifier.clone());

    let err = session
        .submit(AnalysisRequest::new("C1CC").with_kind(AnalysisKind::Lipinski))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Transport(_)));
    assert_eq!(notifier.all().len(), 1);
}
