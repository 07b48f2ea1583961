//! In-process server harness shared by the integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::oneshot;

use pail_server::{ApiConfig, Storage, router};

/// Error response from the server.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: String,
}

/// Test server handle that manages the server lifecycle.
pub struct TestServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    runtime: Arc<tokio::runtime::Runtime>,
}

impl TestServer {
    /// Start a server over `storage` on a random local port.
    pub fn start<S: Storage>(storage: S, config: ApiConfig) -> Self {
        let runtime = Arc::new(tokio::runtime::Runtime::new().unwrap());

        let app = router(storage, &config);

        // Bind to a random available port
        let listener = runtime.block_on(async {
            tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind")
        });
        let addr = listener.local_addr().expect("Failed to get local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        // Spawn server in background
        let rt = Arc::clone(&runtime);
        std::thread::spawn(move || {
            rt.block_on(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = shutdown_rx.await;
                    })
                    .await
                    .expect("Server error");
            });
        });

        // Give server a moment to start
        std::thread::sleep(std::time::Duration::from_millis(50));

        TestServer {
            addr,
            shutdown_tx: Some(shutdown_tx),
            runtime,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
