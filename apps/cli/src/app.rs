//! Command implementations.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use docdrop_mock_server::{MockConfig, MockServer};
use docdrop_uploader::{Backend, HttpBackend, SubmitForm, UploadSession};
use tokio::net::TcpListener;

use crate::config::Config;
use crate::files;
use crate::render;

/// Runs the mock backend until Ctrl-C.
pub async fn serve(config: &Config, port: Option<u16>) -> anyhow::Result<()> {
    let mut mock = config.mock.clone();
    if let Some(port) = port {
        mock.port = port;
    }
    let addr = SocketAddr::new(mock.bind, mock.port);
    tracing::info!(
        upload_failure_rate = mock.upload_failure_rate,
        submit_failure_rate = mock.submit_failure_rate,
        "starting mock backend"
    );

    let server = MockServer::new(mock);
    let server_run = Arc::clone(&server);
    let mut handle = tokio::spawn(async move { server_run.run().await });

    tokio::select! {
        result = &mut handle => {
            result?.with_context(|| format!("mock backend on {addr} stopped"))?;
            return Ok(());
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("SIGINT received, shutting down");
        }
    }

    server.shutdown();
    handle.await??;
    Ok(())
}

/// A mock backend running inside this process.
pub struct Embedded {
    server: Arc<MockServer>,
    pub base_url: String,
}

impl Embedded {
    /// Starts the mock backend on an OS-assigned loopback port.
    pub async fn start(mock: &MockConfig) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(SocketAddr::new(mock.bind, 0)).await?;
        let base_url = format!("http://{}", listener.local_addr()?);
        let server = MockServer::new(MockConfig {
            port: 0,
            ..mock.clone()
        });
        let server_run = Arc::clone(&server);
        tokio::spawn(async move {
            if let Err(e) = server_run.serve(listener).await {
                tracing::error!("embedded backend error: {e}");
            }
        });
        tracing::info!(%base_url, "embedded mock backend started");
        Ok(Self { server, base_url })
    }
}

impl Drop for Embedded {
    fn drop(&mut self) {
        self.server.shutdown();
    }
}

/// Builds a session against the configured server, or an embedded one.
pub async fn connect(
    config: &Config,
    embedded: bool,
) -> anyhow::Result<(UploadSession, Option<Embedded>)> {
    let local = if embedded {
        Some(Embedded::start(&config.mock).await?)
    } else {
        None
    };
    let base_url = local
        .as_ref()
        .map_or(config.server_url.as_str(), |e| e.base_url.as_str());

    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(base_url)?);
    let session = UploadSession::new(
        backend,
        config.intake_limits(),
        config.upload_settings(),
        &config.storage_base_url,
    );
    Ok((session, local))
}

/// Options of the `send` command.
pub struct SendArgs {
    pub title: String,
    pub description: String,
    pub json: bool,
    pub embedded: bool,
    pub files: Vec<PathBuf>,
}

/// Adds, uploads and submits in one go.
pub async fn send(config: &Config, args: SendArgs) -> anyhow::Result<()> {
    let raw = files::read_files(&args.files)?;
    let (session, _local) = connect(config, args.embedded).await?;

    let report = session.add_files(raw);
    render::print_notices(&session.notifier().drain());
    if report.added.is_empty() {
        bail!("no files were accepted");
    }

    let mut updates = session.subscribe();
    let watcher = tokio::spawn(async move {
        let mut labels = render::StatusLabels::default();
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            for line in labels.transitions(&snapshot) {
                eprintln!("{line}");
            }
        }
    });

    let summary = session.start_upload().await;
    watcher.abort();
    if let Some(summary) = summary {
        eprintln!("{} of {} file(s) uploaded", summary.done, summary.total());
    }

    let snapshot = session.store().snapshot();
    if args.json {
        println!("{}", serde_json::to_string_pretty(snapshot.as_slice())?);
    } else {
        println!("{}", render::file_table(&snapshot));
    }

    let failed = snapshot.iter().filter(|f| !f.is_done()).count();
    if failed > 0 {
        bail!("{failed} file(s) did not upload; nothing was submitted");
    }

    let form = SubmitForm::new(args.title, args.description);
    let result = session.submit(&form).await;
    render::print_notices(&session.notifier().drain());
    let response = result.context("submission failed")?;

    if !args.json {
        println!(
            "Submitted {} file(s). Reference: {}",
            response.data.files.len(),
            response.submission_id
        );
    }
    Ok(())
}
