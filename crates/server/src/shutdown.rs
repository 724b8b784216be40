/// Resolves on SIGINT, or SIGTERM on Unix.
///
/// If no handler can be installed the future never resolves; the server then
/// only stops through its [`Lifecycle`](crate::lifecycle::Lifecycle) handle.
pub async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for ctrl-c");
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;

    tracing::info!("shutdown signal received");
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}
