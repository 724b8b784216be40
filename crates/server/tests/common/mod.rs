#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use kaas_client::{ClientConfig, KeystoreClient};
use kaas_server::config::{BackendKind, KeystoreConfig, Protocol, SecretString, ServerConfig};
use kaas_server::lifecycle::Lifecycle;
use kaas_server::store::Keystore;
use kaas_server::{KeystoreServer, ServerError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tonic::transport::Channel;

pub const TOKEN: &str = "integration-token";

pub fn config() -> ServerConfig {
    ServerConfig {
        listen_addr: "127.0.0.1:0".into(),
        protocol: Protocol::Tcp,
        auth_key: SecretString::new(TOKEN),
        tls: None,
        keystore: KeystoreConfig {
            backend: BackendKind::Memory,
            ..Default::default()
        },
        grace_period_secs: 2,
        request_timeout_secs: 10,
        log_format: Default::default(),
    }
}

pub struct TestServer {
    pub addr: std::net::SocketAddr,
    pub lifecycle: Lifecycle,
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<Result<(), ServerError>>>,
}

impl TestServer {
    pub async fn start(backend: Arc<dyn Keystore>) -> Self {
        Self::start_with(config(), backend).await
    }

    pub async fn start_with(cfg: ServerConfig, backend: Arc<dyn Keystore>) -> Self {
        let server = KeystoreServer::bind(&cfg, backend).await.unwrap();
        let addr = server.local_addr().unwrap();
        let lifecycle = server.lifecycle();

        let (stop, stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve_with_shutdown(async move {
            let _ = stopped.await;
        }));

        tokio::time::sleep(Duration::from_millis(100)).await;

        Self {
            addr,
            lifecycle,
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn client(&self) -> KeystoreClient {
        self.client_with_token(TOKEN).await
    }

    pub async fn client_with_token(&self, token: &str) -> KeystoreClient {
        KeystoreClient::connect(ClientConfig::new(self.endpoint(), token))
            .await
            .unwrap()
    }

    pub async fn channel(&self) -> Channel {
        Channel::from_shared(self.endpoint())
            .unwrap()
            .connect()
            .await
            .unwrap()
    }

    /// Fires the shutdown signal and waits for drain and backend close.
    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let handle = self.handle.take().unwrap();
        tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .expect("server did not stop")
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}
