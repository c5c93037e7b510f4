//! Server lifecycle: bind, serve until cancelled.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::ServerError;
use crate::config::MockConfig;
use crate::handlers::router;

/// The mock HTTP backend.
pub struct MockServer {
    config: MockConfig,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
    running: AtomicBool,
}

impl MockServer {
    pub fn new(config: MockConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
            running: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    /// Returns the local address the server is listening on.
    ///
    /// Only available once [`run`](Self::run) or [`serve`](Self::serve)
    /// has a socket.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Token cancelled by [`shutdown`](Self::shutdown).
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Gracefully shuts down the server.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Binds the configured address and serves until cancellation.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        let addr = SocketAddr::new(self.config.bind, self.config.port);
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serves on an already bound listener until cancellation.
    pub async fn serve(self: &Arc<Self>, listener: TcpListener) -> Result<(), ServerError> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(ServerError::AlreadyRunning);
        }

        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        tracing::info!("mock server listening on http://{local_addr}");

        let app = router(self.config.clone());
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.clone().cancelled_owned())
            .await;

        tracing::info!("server shutting down");
        *self.local_addr.lock().await = None;
        self.running.store(false, Ordering::Release);
        result.map_err(ServerError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn serve_reports_address_and_stops() {
        let server = MockServer::new(MockConfig::quiet());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn({
            let server = Arc::clone(&server);
            async move { server.serve(listener).await }
        });

        let mut addr = None;
        for _ in 0..50 {
            addr = server.local_addr().await;
            if addr.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(addr.map(|a| a.port()), Some(port));

        server.shutdown();
        handle.await.unwrap().unwrap();
        assert!(server.local_addr().await.is_none());
    }

    #[tokio::test]
    async fn run_twice_is_rejected() {
        let server = MockServer::new(MockConfig::quiet());
        let handle = tokio::spawn({
            let server = Arc::clone(&server);
            async move { server.run().await }
        });
        while server.local_addr().await.is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let second = TcpListener::bind("127.0.0.1:0").await.unwrap();
        assert!(matches!(
            server.serve(second).await,
            Err(ServerError::AlreadyRunning)
        ));

        server.shutdown();
        handle.await.unwrap().unwrap();
    }
}
