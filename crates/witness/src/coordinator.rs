//! The check scheduler.

use std::{collections::HashSet, time::Duration};

use futures::future::BoxFuture;
use tokio::{runtime::Handle, sync::mpsc, time::Instant};
use tracing::*;

use crate::error::{CheckError, WitnessError};

/// One attempt of a verification check.
pub type CheckFuture = BoxFuture<'static, Result<(), CheckError>>;

/// Outcome of a resolved check, queued for the tick path.
#[derive(Debug)]
struct Resolution {
    id: String,
    ok: bool,
}

/// Schedules verification checks off the deterministic path and hands
/// their outcomes back to it.
///
/// Each domain verifier owns one coordinator; results never cross
/// verifier boundaries. `drain_resolved` must only be called from the
/// tick path.
#[derive(Debug)]
pub struct WitnessCoordinator {
    runtime: Handle,
    backoff: Duration,
    pending: HashSet<String>,
    results_tx: mpsc::UnboundedSender<Resolution>,
    results_rx: mpsc::UnboundedReceiver<Resolution>,
}

impl WitnessCoordinator {
    /// Creates a coordinator spawning its checks on the given runtime.
    /// `backoff` is the constant delay between retries of a transiently
    /// failing check.
    pub fn new(runtime: Handle, backoff: Duration) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            backoff,
            pending: HashSet::new(),
            results_tx,
            results_rx,
        }
    }

    /// Number of checks still in flight.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Schedules a check for the resource. `check` produces one attempt
    /// per call; attempts are retried with constant backoff on
    /// transient failure until success, permanent failure, or the
    /// `timeout` window (measured on this node's clock from
    /// registration) closes, whichever is first. Every attempt is
    /// bounded by the remaining window, so a hung client call cannot
    /// leave the resource unresolved. Window expiry resolves the
    /// resource as rejected so it never blocks a later restore.
    pub fn start_check<F>(
        &mut self,
        id: &str,
        timeout: Duration,
        check: F,
    ) -> Result<(), WitnessError>
    where
        F: Fn() -> CheckFuture + Send + Sync + 'static,
    {
        if !self.pending.insert(id.to_owned()) {
            return Err(WitnessError::DuplicateResource(id.to_owned()));
        }

        let id = id.to_owned();
        let tx = self.results_tx.clone();
        let backoff = self.backoff;
        self.runtime.spawn(async move {
            let ok = run_check(&id, timeout, backoff, check).await;
            // The receiver only drops when the coordinator does, at
            // which point the outcome is moot.
            let _ = tx.send(Resolution { id, ok });
        });
        Ok(())
    }

    /// Re-registers a pending check after a checkpoint restore, with a
    /// fresh `timeout` window. The closure is a fresh one rebuilt from
    /// the persisted claim data; client handles are never serialized.
    pub fn restore_check<F>(
        &mut self,
        id: &str,
        timeout: Duration,
        check: F,
    ) -> Result<(), WitnessError>
    where
        F: Fn() -> CheckFuture + Send + Sync + 'static,
    {
        debug!(%id, "re-registering restored witness check");
        self.start_check(id, timeout, check)
    }

    /// Drains every check that has resolved since the last call,
    /// in completion order. Tick path only.
    pub fn drain_resolved(&mut self) -> Vec<(String, bool)> {
        let mut out = Vec::new();
        while let Ok(res) = self.results_rx.try_recv() {
            self.pending.remove(&res.id);
            out.push((res.id, res.ok));
        }
        out
    }
}

/// Runs attempts of a single check until it resolves or its window
/// closes.
async fn run_check<F>(id: &str, timeout: Duration, backoff: Duration, check: F) -> bool
where
    F: Fn() -> CheckFuture + Send + Sync + 'static,
{
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            warn!(%id, "witness check window expired");
            return false;
        }
        match tokio::time::timeout(remaining, check()).await {
            Ok(Ok(())) => {
                debug!(%id, "witness check succeeded");
                return true;
            }
            Ok(Err(CheckError::Failed(reason))) => {
                debug!(%id, %reason, "witness check failed");
                return false;
            }
            Ok(Err(CheckError::Transient(reason))) => {
                trace!(%id, %reason, "witness check retrying");
                tokio::time::sleep(backoff).await;
            }
            Err(_) => {
                warn!(%id, "witness check attempt outlived its window");
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    use super::*;

    const WINDOW: Duration = Duration::from_secs(3600);

    fn coordinator() -> WitnessCoordinator {
        WitnessCoordinator::new(Handle::current(), Duration::from_millis(1))
    }

    /// Polls the coordinator until `n` results have landed.
    async fn wait_resolved(w: &mut WitnessCoordinator, n: usize) -> Vec<(String, bool)> {
        let mut out = Vec::new();
        for _ in 0..500 {
            out.extend(w.drain_resolved());
            if out.len() >= n {
                return out;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("checks did not resolve in time: got {}", out.len());
    }

    #[tokio::test]
    async fn test_success_resolves_true() {
        let mut w = coordinator();
        w.start_check("r1", WINDOW, || Box::pin(async { Ok(()) }))
            .unwrap();
        assert_eq!(w.pending_len(), 1);
        let res = wait_resolved(&mut w, 1).await;
        assert_eq!(res, vec![("r1".to_owned(), true)]);
        assert_eq!(w.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_permanent_failure_resolves_false() {
        let mut w = coordinator();
        w.start_check("r1", WINDOW, || {
            Box::pin(async { Err(CheckError::failed("not found")) })
        })
        .unwrap();
        let res = wait_resolved(&mut w, 1).await;
        assert_eq!(res, vec![("r1".to_owned(), false)]);
    }

    #[tokio::test]
    async fn test_transient_retries_then_succeeds() {
        let mut w = coordinator();
        let attempts = Arc::new(AtomicU32::new(0));
        let a = attempts.clone();
        w.start_check("r1", WINDOW, move || {
            let n = a.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if n < 3 {
                    Err(CheckError::transient("down"))
                } else {
                    Ok(())
                }
            })
        })
        .unwrap();
        let res = wait_resolved(&mut w, 1).await;
        assert_eq!(res, vec![("r1".to_owned(), true)]);
        assert!(attempts.load(Ordering::SeqCst) >= 4);
    }

    #[tokio::test]
    async fn test_window_expiry_resolves_false() {
        let mut w = coordinator();
        // A short window against a client that never recovers.
        w.start_check("r1", Duration::from_millis(20), || {
            Box::pin(async { Err(CheckError::transient("down")) })
        })
        .unwrap();
        let res = wait_resolved(&mut w, 1).await;
        assert_eq!(res, vec![("r1".to_owned(), false)]);
    }

    #[tokio::test]
    async fn test_hung_attempt_resolves_at_window() {
        let mut w = coordinator();
        // An attempt that never returns must not pin the resource.
        w.start_check("r1", Duration::from_millis(20), || {
            Box::pin(std::future::pending::<Result<(), CheckError>>())
        })
        .unwrap();
        let res = wait_resolved(&mut w, 1).await;
        assert_eq!(res, vec![("r1".to_owned(), false)]);
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let mut w = coordinator();
        w.start_check("r1", WINDOW, || Box::pin(async { Ok(()) }))
            .unwrap();
        let err = w
            .start_check("r1", WINDOW, || Box::pin(async { Ok(()) }))
            .unwrap_err();
        assert_eq!(err, WitnessError::DuplicateResource("r1".to_owned()));
    }

    #[tokio::test]
    async fn test_multiple_checks_all_resolve() {
        let mut w = coordinator();
        for i in 0..5 {
            let ok = i % 2 == 0;
            w.start_check(&format!("r{i}"), WINDOW, move || {
                Box::pin(async move {
                    if ok {
                        Ok(())
                    } else {
                        Err(CheckError::failed("nope"))
                    }
                })
            })
            .unwrap();
        }
        let mut res = wait_resolved(&mut w, 5).await;
        res.sort();
        assert_eq!(res.iter().filter(|(_, ok)| *ok).count(), 3);
        assert_eq!(w.pending_len(), 0);
    }
}
