//! End-to-end test harness for SessionLink
//!
//! Binds the session and health routers to an ephemeral local port so tests
//! can drive them over real HTTP with `reqwest`.

use sessionlink_core::{CodecConfig, SessionUrlCodec};
use sessionlink_ingress::{CodecReadinessChecker, SessionState};
use sessionlink_observability::{HealthState, Metrics, health_router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A running server, aborted on drop
pub struct TestServer {
    pub addr: SocketAddr,
    pub metrics: Arc<Metrics>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with the default codec configuration
    pub async fn spawn() -> std::io::Result<Self> {
        Self::spawn_with(CodecConfig::default()).await
    }

    pub async fn spawn_with(config: CodecConfig) -> std::io::Result<Self> {
        let codec = SessionUrlCodec::new(&config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let codec = Arc::new(codec);
        let metrics = Arc::new(Metrics::new().map_err(|e| std::io::Error::other(e.to_string()))?);

        let session = SessionState::new(codec.clone()).with_metrics(metrics.clone());
        let health = HealthState::with_readiness_checker(
            metrics.clone(),
            Arc::new(CodecReadinessChecker::new(codec)),
        );
        let app = sessionlink_ingress::router(session).merge(health_router(health));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Test server stopped: {}", e);
            }
        });

        Ok(Self {
            addr,
            metrics,
            handle,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
