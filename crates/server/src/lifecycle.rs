use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Serving,
    Draining,
}

/// Shared view of the server's lifecycle phase. Cloning yields another
/// handle on the same state.
///
/// Besides the phase it carries the hard-stop token fired when the grace
/// period runs out, and tracks every backend call so the backend is closed
/// only once none is running.
#[derive(Clone)]
pub struct Lifecycle {
    phase: Arc<watch::Sender<Phase>>,
    terminate: CancellationToken,
    calls: TaskTracker,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Phase::Serving);
        Self {
            phase: Arc::new(tx),
            terminate: CancellationToken::new(),
            calls: TaskTracker::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    pub fn is_draining(&self) -> bool {
        self.phase() == Phase::Draining
    }

    /// Moves to `Draining`. Returns false if already draining.
    pub fn begin_drain(&self) -> bool {
        self.phase.send_if_modified(|phase| {
            if *phase == Phase::Draining {
                return false;
            }
            *phase = Phase::Draining;
            true
        })
    }

    /// Resolves once the phase is `Draining`.
    pub async fn draining(&self) {
        let mut rx = self.phase.subscribe();
        let _ = rx.wait_for(|phase| *phase == Phase::Draining).await;
    }

    /// Hard stop: implies `Draining`, aborts calls waiting on the backend and
    /// fails open connections.
    pub fn terminate(&self) {
        self.begin_drain();
        self.terminate.cancel();
    }

    pub fn is_terminated(&self) -> bool {
        self.terminate.is_cancelled()
    }

    pub async fn terminated(&self) {
        self.terminate.cancelled().await
    }

    pub(crate) fn termination_token(&self) -> CancellationToken {
        self.terminate.clone()
    }

    /// Runs a backend call on the blocking pool, tracked until it returns.
    pub(crate) fn spawn_backend_call<F, T>(&self, call: F) -> JoinHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.calls.spawn_blocking(call)
    }

    /// Number of backend calls still running.
    pub fn backend_calls(&self) -> usize {
        self.calls.len()
    }

    /// Resolves once every tracked backend call has returned.
    pub async fn backend_idle(&self) {
        self.calls.close();
        self.calls.wait().await;
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn starts_serving() {
        let lc = Lifecycle::new();
        assert_eq!(lc.phase(), Phase::Serving);
        assert!(!lc.is_draining());
    }

    #[test]
    fn drain_is_one_way() {
        let lc = Lifecycle::new();
        assert!(lc.begin_drain());
        assert!(!lc.begin_drain());
        assert!(lc.clone().is_draining());
    }

    #[tokio::test]
    async fn draining_wakes_waiters() {
        let lc = Lifecycle::new();
        let waiter = {
            let lc = lc.clone();
            tokio::spawn(async move { lc.draining().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        lc.begin_drain();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn terminate_implies_draining() {
        let lc = Lifecycle::new();
        assert!(!lc.is_terminated());
        lc.clone().terminate();
        assert!(lc.is_terminated());
        assert!(lc.is_draining());
    }

    #[tokio::test]
    async fn backend_idle_waits_for_running_calls() {
        let lc = Lifecycle::new();
        let (release, gate) = std::sync::mpsc::channel::<()>();
        let call = lc.spawn_backend_call(move || gate.recv().is_ok());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(lc.backend_calls(), 1);

        let idle = {
            let lc = lc.clone();
            tokio::spawn(async move { lc.backend_idle().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!idle.is_finished());

        release.send(()).unwrap();
        assert!(call.await.unwrap());
        tokio::time::timeout(Duration::from_secs(1), idle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lc.backend_calls(), 0);
    }

    #[tokio::test]
    async fn draining_returns_immediately_when_already_drained() {
        let lc = Lifecycle::new();
        lc.begin_drain();
        tokio::time::timeout(Duration::from_millis(100), lc.draining())
            .await
            .unwrap();
    }
}
