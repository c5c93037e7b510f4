//! End-to-end checks of the mock routes over a loopback socket.

use std::sync::Arc;

use docdrop_mock_server::{MockConfig, MockServer, UPLOAD_FAILURES};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use tokio::net::TcpListener;

async fn start(config: MockConfig) -> (Arc<MockServer>, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let server = MockServer::new(config);
    let s = Arc::clone(&server);
    tokio::spawn(async move { s.serve(listener).await });
    (server, base)
}

fn pdf_form(name: &str, mime: &str, content: &[u8]) -> Form {
    let part = Part::bytes(content.to_vec())
        .file_name(name.to_string())
        .mime_str(mime)
        .unwrap();
    Form::new().part("file", part)
}

async fn error_of(resp: reqwest::Response) -> (StatusCode, String) {
    let status = resp.status();
    let body: Value = resp.json().await.unwrap();
    (status, body["error"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn upload_accepts_pdf() {
    let (server, base) = start(MockConfig::quiet()).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/upload"))
        .multipart(pdf_form("report q1.pdf", "application/pdf", b"%PDF-1.7 body"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["name"], "report q1.pdf");
    assert_eq!(body["size"], 13);
    assert_eq!(body["type"], "application/pdf");
    let id = body["id"].as_str().unwrap();
    assert_eq!(
        body["url"],
        format!("https://storage.example.com/uploads/{id}/report%20q1.pdf")
    );
    server.shutdown();
}

#[tokio::test]
async fn upload_rejections() {
    let (server, base) = start(MockConfig {
        max_file_size: 2048,
        ..MockConfig::quiet()
    })
    .await;
    let client = reqwest::Client::new();
    let url = format!("{base}/api/upload");

    let resp = client
        .post(&url)
        .multipart(Form::new().text("other", "x"))
        .send()
        .await
        .unwrap();
    assert_eq!(
        error_of(resp).await,
        (StatusCode::BAD_REQUEST, "No file provided".into())
    );

    let resp = client
        .post(&url)
        .multipart(pdf_form("a.txt", "text/plain", b"hi"))
        .send()
        .await
        .unwrap();
    assert_eq!(
        error_of(resp).await,
        (StatusCode::BAD_REQUEST, "Only PDF files are allowed".into())
    );

    let resp = client
        .post(&url)
        .multipart(pdf_form("big.pdf", "application/pdf", &[0u8; 2049]))
        .send()
        .await
        .unwrap();
    assert_eq!(
        error_of(resp).await,
        (
            StatusCode::BAD_REQUEST,
            "File too large. Maximum size is 2KB".into()
        )
    );
    server.shutdown();
}

#[tokio::test]
async fn upload_failure_injection() {
    let (server, base) = start(MockConfig {
        upload_failure_rate: 1.0,
        ..MockConfig::quiet()
    })
    .await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/upload"))
        .multipart(pdf_form("a.pdf", "application/pdf", b"%PDF"))
        .send()
        .await
        .unwrap();

    let (status, message) = error_of(resp).await;
    assert!(
        UPLOAD_FAILURES
            .iter()
            .any(|(s, m)| *s == status.as_u16() && *m == message),
        "{status} {message}"
    );
    server.shutdown();
}

#[tokio::test]
async fn complete_requires_file_id() {
    let (server, base) = start(MockConfig::quiet()).await;
    let client = reqwest::Client::new();
    let url = format!("{base}/api/upload/complete");

    let resp = client.post(&url).json(&json!({})).send().await.unwrap();
    assert_eq!(
        error_of(resp).await,
        (StatusCode::BAD_REQUEST, "File ID is required".into())
    );

    let resp = client
        .post(&url)
        .json(&json!({"fileId": "f-1", "chunkCount": 1, "totalSize": 4}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["fileId"], "f-1");
    assert_eq!(body["status"], "completed");
    server.shutdown();
}

#[tokio::test]
async fn submit_validation_and_success() {
    let (server, base) = start(MockConfig::quiet()).await;
    let client = reqwest::Client::new();
    let url = format!("{base}/api/submit");
    let file = json!({
        "id": "f-1",
        "name": "a.pdf",
        "size": 4,
        "type": "application/pdf",
        "url": "https://storage.example.com/uploads/f-1/a.pdf"
    });

    let no_title = json!({"description": "d", "files": [file]});
    let no_files = json!({"title": "t", "description": "d", "files": []});
    let bad_file = json!({"title": "t", "description": "d", "files": [{"id": "x"}]});
    let cases = [
        (no_title, "Title and description are required"),
        (no_files, "At least one file is required"),
        (bad_file, "Invalid file structure"),
    ];
    for (body, expected) in cases {
        let resp = client.post(&url).json(&body).send().await.unwrap();
        let expected = (StatusCode::BAD_REQUEST, expected.to_string());
        assert_eq!(error_of(resp).await, expected);
    }

    let resp = client
        .post(&url)
        .json(&json!({"title": "t", "description": "d", "files": [file]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["message"], "Form submitted successfully");
    assert!(!body["submissionId"].as_str().unwrap().is_empty());
    assert_eq!(body["data"]["files"][0]["id"], "f-1");
    assert!(chrono_like(body["timestamp"].as_str().unwrap()));
    server.shutdown();
}

fn chrono_like(ts: &str) -> bool {
    ts.len() >= 20 && ts.ends_with('Z') && ts.as_bytes()[10] == b'T'
}

#[tokio::test]
async fn submit_failure_injection() {
    let (server, base) = start(MockConfig {
        submit_failure_rate: 1.0,
        ..MockConfig::quiet()
    })
    .await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/submit"))
        .json(&json!({
            "title": "t",
            "description": "d",
            "files": [{
                "id": "1",
                "name": "a.pdf",
                "size": 1,
                "type": "application/pdf",
                "url": "u"
            }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(
        error_of(resp).await,
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Simulated server error for testing".into()
        )
    );
    server.shutdown();
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let (server, base) = start(MockConfig::quiet()).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/submit"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    let (status, message) = error_of(resp).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!message.is_empty());
    server.shutdown();
}
