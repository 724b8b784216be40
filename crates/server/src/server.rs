use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use kaas_common::proto::keystore_service_server::KeystoreServiceServer;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_stream::StreamExt;
use tonic::transport::Server;

use crate::config::{Protocol, ServerConfig};
use crate::grpc::{Backend, KeystoreServiceImpl};
use crate::incoming::Terminable;
use crate::lifecycle::Lifecycle;
use crate::middleware::{AuthInterceptor, Pipeline};
use crate::store::{Keystore, StoreError};
use crate::tls::{TlsIdentity, TlsLoadError};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("protocol {0:?} is not supported on this platform")]
    UnsupportedProtocol(Protocol),
    #[error(transparent)]
    Tls(#[from] TlsLoadError),
    #[error("transport: {0}")]
    Transport(#[from] tonic::transport::Error),
    #[error("closing keystore: {0}")]
    BackendClose(#[source] StoreError),
}

enum Listener {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix {
        listener: tokio::net::UnixListener,
        path: PathBuf,
    },
}

type ServeFuture = Pin<Box<dyn Future<Output = Result<(), tonic::transport::Error>> + Send>>;

/// How long connection tasks get to notice termination before the serve
/// future is dropped.
const TERMINATE_WAIT: Duration = Duration::from_secs(1);

/// A bound keystore server.
///
/// Created by [`KeystoreServer::bind`] in the `Serving` phase. Serving ends
/// when the shutdown signal fires or the [`Lifecycle`] handle is moved to
/// `Draining`; in-flight calls then get `grace_period` to finish. Past that
/// the lifecycle is terminated: open connections fail and waiting calls end
/// with `CANCELLED`. The backend is closed once no backend call is running.
pub struct KeystoreServer {
    listener: Listener,
    backend: Arc<dyn Keystore>,
    lifecycle: Lifecycle,
    auth_key: String,
    server: Server,
    grace_period: Duration,
}

impl KeystoreServer {
    pub async fn bind(config: &ServerConfig, backend: Arc<dyn Keystore>) -> Result<Self, ServerError> {
        let mut server = Server::builder().timeout(config.request_timeout());
        let tls = config.tls.as_ref().map(TlsIdentity::load).transpose()?;
        if let Some(identity) = &tls {
            server = identity.apply(server)?;
        }

        let listener = bind_listener(config.protocol, &config.listen_addr).await?;
        tracing::info!(
            addr = %config.listen_addr,
            protocol = ?config.protocol,
            tls = tls.is_some(),
            "listener bound"
        );

        Ok(Self {
            listener,
            backend,
            lifecycle: Lifecycle::new(),
            auth_key: config.auth_key.expose().to_string(),
            server,
            grace_period: config.grace_period(),
        })
    }

    /// Bound TCP address; `None` for Unix sockets.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.listener {
            Listener::Tcp(l) => l.local_addr().ok(),
            #[cfg(unix)]
            Listener::Unix { .. } => None,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    /// Serves until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        self.serve_with_shutdown(crate::shutdown::wait_for_signal())
            .await
    }

    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let Self {
            listener,
            backend,
            lifecycle,
            auth_key,
            mut server,
            grace_period,
        } = self;

        let served: Result<(), ServerError> = async {
            let pipeline = Pipeline::new(lifecycle.clone(), AuthInterceptor::new(&auth_key));
            let service = KeystoreServiceServer::with_interceptor(
                KeystoreServiceImpl::new(Backend::new(Arc::clone(&backend), lifecycle.clone())),
                pipeline,
            );
            let router = server.add_service(service);

            let stopped = {
                let lifecycle = lifecycle.clone();
                async move { lifecycle.draining().await }
            };
            let token = lifecycle.termination_token();
            let (mut serve, socket_path): (ServeFuture, Option<PathBuf>) = match listener {
                Listener::Tcp(l) => {
                    let incoming = TcpListenerStream::new(l)
                        .map(move |conn| conn.map(|io| Terminable::new(io, token.clone())));
                    (Box::pin(router.serve_with_incoming_shutdown(incoming, stopped)), None)
                }
                #[cfg(unix)]
                Listener::Unix { listener, path } => {
                    let incoming = tokio_stream::wrappers::UnixListenerStream::new(listener)
                        .map(move |conn| conn.map(|io| Terminable::new(io, token.clone())));
                    (
                        Box::pin(router.serve_with_incoming_shutdown(incoming, stopped)),
                        Some(path),
                    )
                }
            };

            tracing::info!("keystore service serving");

            let drain_requested = async {
                tokio::select! {
                    _ = signal => { lifecycle.begin_drain(); }
                    _ = lifecycle.draining() => {}
                }
            };

            let result = tokio::select! {
                res = &mut serve => res.map_err(ServerError::from),
                _ = drain_requested => {
                    tracing::info!(grace_secs = grace_period.as_secs(), "draining in-flight calls");
                    match tokio::time::timeout(grace_period, &mut serve).await {
                        Ok(res) => res.map_err(ServerError::from),
                        Err(_) => {
                            tracing::warn!("grace period expired, terminating remaining connections");
                            lifecycle.terminate();
                            match tokio::time::timeout(TERMINATE_WAIT, &mut serve).await {
                                Ok(Err(e)) => tracing::debug!(error = %e, "transport error after termination"),
                                Ok(Ok(())) => {}
                                Err(_) => tracing::warn!("connections still open after termination"),
                            }
                            Ok(())
                        }
                    }
                }
            };
            drop(serve);

            if let Some(path) = socket_path {
                let _ = std::fs::remove_file(path);
            }
            result
        }
        .await;

        lifecycle.terminate();
        let pending = lifecycle.backend_calls();
        if pending > 0 {
            tracing::info!(pending, "waiting for backend calls to return");
        }
        lifecycle.backend_idle().await;

        tracing::info!("closing keystore");
        let closed = backend.close();

        served?;
        closed.map_err(ServerError::BackendClose)?;
        tracing::info!("shutdown complete");
        Ok(())
    }
}

async fn bind_listener(protocol: Protocol, addr: &str) -> Result<Listener, ServerError> {
    let bind_err = |source| ServerError::Bind {
        addr: addr.to_string(),
        source,
    };
    match protocol {
        Protocol::Tcp => TcpListener::bind(addr)
            .await
            .map(Listener::Tcp)
            .map_err(bind_err),
        #[cfg(unix)]
        Protocol::Unix => {
            let path = PathBuf::from(addr);
            tokio::net::UnixListener::bind(&path)
                .map(|listener| Listener::Unix { listener, path })
                .map_err(bind_err)
        }
        #[cfg(not(unix))]
        Protocol::Unix => Err(ServerError::UnsupportedProtocol(protocol)),
    }
}
