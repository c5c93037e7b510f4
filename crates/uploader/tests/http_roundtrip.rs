//! Full client flow against the mock backend on a loopback socket.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use docdrop_mock_server::{MockConfig, MockServer};
use docdrop_protocol::UploadCompleteRequest;
use docdrop_transfer::{FileStatus, IncrementRange, IntakeLimits, RawFile};
use docdrop_uploader::{
    ApiError, Backend, HttpBackend, SubmitError, SubmitForm, UploadPayload, UploadSession,
    UploadSettings,
};
use tokio::net::TcpListener;

async fn start(config: MockConfig) -> (Arc<MockServer>, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let server = MockServer::new(config);
    let s = Arc::clone(&server);
    tokio::spawn(async move { s.serve(listener).await });
    (server, base)
}

fn fast_settings() -> UploadSettings {
    UploadSettings {
        step_interval: Duration::from_millis(1),
        increments: IncrementRange::new(40.0, 60.0),
        ..UploadSettings::default()
    }
}

fn pdf(name: &str) -> RawFile {
    RawFile::new(
        name,
        "application/pdf",
        Bytes::from(format!("%PDF-1.7 {name}").into_bytes()),
    )
}

#[tokio::test]
async fn upload_then_submit() {
    let (server, base) = start(MockConfig::quiet()).await;
    let backend = Arc::new(HttpBackend::new(&base).unwrap());
    let session = UploadSession::new(
        backend,
        IntakeLimits::default(),
        fast_settings(),
        "https://storage.example.com/uploads",
    );

    let report = session.add_files(vec![pdf("a.pdf"), pdf("b.pdf"), pdf("c.pdf"), pdf("d.pdf")]);
    assert_eq!(report.added.len(), 4);

    let summary = session.start_upload().await.unwrap();
    assert_eq!(summary.done, 4);
    let snapshot = session.store().snapshot();
    assert!(snapshot.iter().all(|f| f.status == FileStatus::Done));

    let resp = session
        .submit(&SubmitForm::new("Contracts", "Signed PDFs"))
        .await
        .unwrap();
    assert!(resp.ok);
    assert_eq!(resp.data.files.len(), 4);
    assert!(session.store().is_empty());

    server.shutdown();
}

#[tokio::test]
async fn injected_upload_failures_become_file_errors() {
    let (server, base) = start(MockConfig {
        upload_failure_rate: 1.0,
        ..MockConfig::quiet()
    })
    .await;
    let session = UploadSession::new(
        Arc::new(HttpBackend::new(&base).unwrap()),
        IntakeLimits::default(),
        fast_settings(),
        "https://storage.example.com/uploads",
    );
    session.add_files(vec![pdf("a.pdf"), pdf("b.pdf")]);

    let summary = session.start_upload().await.unwrap();
    assert_eq!(summary.failed, 2);
    for file in session.store().snapshot().iter() {
        assert_eq!(file.errors().len(), 1);
        assert!(!file.errors()[0].is_empty());
    }

    let err = session
        .submit(&SubmitForm::new("t", "d"))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::Pending { pending: 2 }));

    server.shutdown();
}

#[tokio::test]
async fn submit_failure_keeps_files() {
    let (server, base) = start(MockConfig {
        submit_failure_rate: 1.0,
        ..MockConfig::quiet()
    })
    .await;
    let session = UploadSession::new(
        Arc::new(HttpBackend::new(&base).unwrap()),
        IntakeLimits::default(),
        fast_settings(),
        "https://storage.example.com/uploads",
    );
    session.add_files(vec![pdf("a.pdf")]);
    session.start_upload().await.unwrap();

    let err = session
        .submit(&SubmitForm::new("t", "d"))
        .await
        .unwrap_err();
    match err {
        SubmitError::Api(api) => {
            assert_eq!(api.status(), Some(500));
            assert_eq!(api.to_string(), "Simulated server error for testing");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(session.store().len(), 1);

    let notice = session.notifier().drain().pop().unwrap();
    assert_eq!(
        notice.message.as_deref(),
        Some("Error 500: Simulated server error for testing")
    );

    server.shutdown();
}

#[tokio::test]
async fn backend_calls_directly() {
    let (server, base) = start(MockConfig::quiet()).await;
    let backend = HttpBackend::new(format!("{base}/")).unwrap();
    assert_eq!(backend.base_url(), base);

    let uploaded = backend
        .upload(UploadPayload {
            file_id: "local-1".into(),
            name: "a.pdf".into(),
            mime_type: "application/pdf".into(),
            content: Bytes::from_static(b"%PDF-1.4"),
        })
        .await
        .unwrap();
    assert_eq!(uploaded.size, 8);

    let done = backend
        .complete_upload(UploadCompleteRequest {
            file_id: uploaded.id.clone(),
            chunk_count: Some(1),
            total_size: Some(8),
        })
        .await
        .unwrap();
    assert_eq!(done.file_id, uploaded.id);
    assert_eq!(done.status, "completed");

    let rejected = backend
        .upload(UploadPayload {
            file_id: "local-2".into(),
            name: "a.txt".into(),
            mime_type: "text/plain".into(),
            content: Bytes::from_static(b"hello"),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        rejected,
        ApiError::Status { status: 400, ref message } if message == "Only PDF files are allowed"
    ));

    server.shutdown();
}
