// tasks.rs - Background task spawning
// Fire-and-forget work goes through spawn_supervised so a panic or abort in
// one request is logged instead of disappearing with the task.

use log::{debug, error, warn};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Spawn `work` on the runtime. The returned handle resolves once the work
/// has finished, panicked or been cancelled; it never propagates the panic.
pub fn spawn_supervised<F>(label: String, work: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let inner = tokio::spawn(work);
    tokio::spawn(async move {
        match inner.await {
            Ok(()) => debug!("[TASK] {} finished", label),
            Err(e) if e.is_panic() => error!("[TASK] {} panicked: {}", label, e),
            Err(e) => warn!("[TASK] {} was cancelled: {}", label, e),
        }
    })
}

/// Counts work in flight. The guard decrements on drop, including on panic.
#[derive(Debug, Clone, Default)]
pub struct InFlight(Arc<AtomicUsize>);

pub struct InFlightGuard(Arc<AtomicUsize>);

impl InFlight {
    pub fn enter(&self) -> InFlightGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(self.0.clone())
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
