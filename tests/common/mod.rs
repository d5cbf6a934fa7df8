//! Shared utilities for integration tests.

use axum::extract::connect_info::MockConnectInfo;
use axum::Router;
use report_intake::lifecycle::Shutdown;
use report_intake::{HttpServer, IntakeConfig};
use std::net::SocketAddr;
use std::path::Path;
use tempfile::TempDir;

/// Config writing into `dir`, everything else default.
pub fn config_for(dir: &Path) -> IntakeConfig {
    let mut config = IntakeConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.store.destination = dir.to_string_lossy().into_owned();
    config
}

/// In-process router that sees every request as coming from `peer`.
#[allow(dead_code)]
pub fn router(config: IntakeConfig, peer: SocketAddr) -> Router {
    HttpServer::new(config)
        .unwrap()
        .into_router()
        .layer(MockConnectInfo(peer))
}

/// A live server bound to an ephemeral port.
#[allow(dead_code)]
pub struct LiveServer {
    pub addr: SocketAddr,
    pub dir: TempDir,
    shutdown: Shutdown,
}

#[allow(dead_code)]
impl LiveServer {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Start with the default test config adjusted by `tweak`.
    pub async fn start_with(tweak: impl FnOnce(&mut IntakeConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_for(dir.path());
        tweak(&mut config);
        let server = HttpServer::new(config).unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        Self { addr, dir, shutdown }
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }
}

impl Drop for LiveServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Names of stored records in `dir`, sorted. Staging files are excluded.
pub fn report_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("report_"))
        .collect();
    names.sort();
    names
}

/// Every entry in `dir`, staging files included.
#[allow(dead_code)]
pub fn all_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
