//! WorkerPool - tracked task executor with drain-then-cancel shutdown

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, instrument, warn};

/// Executor for dispatch and report tasks
///
/// Optionally bounds how many tasks run at once; the rest wait for a slot.
/// Shutdown closes the pool, waits for running work up to a grace period and
/// then cancels whatever is left.
#[derive(Clone)]
pub struct WorkerPool {
    name: Arc<str>,
    tracker: TaskTracker,
    token: CancellationToken,
    parallelism: Option<Arc<Semaphore>>,
}

impl WorkerPool {
    /// Pool without a parallelism bound
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            tracker: TaskTracker::new(),
            token: CancellationToken::new(),
            parallelism: None,
        }
    }

    /// Pool running at most `max_workers` tasks at once
    pub fn with_parallelism(name: impl Into<Arc<str>>, max_workers: usize) -> Self {
        Self {
            parallelism: Some(Arc::new(Semaphore::new(max_workers.max(1)))),
            ..Self::new(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Submit a task
    ///
    /// The handle yields `None` if the task was cancelled by shutdown before
    /// it finished. Panics surface as a `JoinError`.
    pub fn spawn<F, T>(&self, task: F) -> JoinHandle<Option<T>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let token = self.token.clone();
        let limiter = self.parallelism.clone();

        self.tracker.spawn(async move {
            let _slot = match limiter {
                Some(limiter) => tokio::select! {
                    _ = token.cancelled() => return None,
                    permit = limiter.acquire_owned() => permit.ok(),
                },
                None => None,
            };

            tokio::select! {
                biased;
                _ = token.cancelled() => None,
                output = task => Some(output),
            }
        })
    }

    /// Tasks submitted and not yet finished
    pub fn active(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_closed(&self) -> bool {
        self.tracker.is_closed()
    }

    /// Stop accepting work, drain within `grace`, then cancel the rest
    ///
    /// Returns `true` if every task finished within the grace period.
    #[instrument(name = "worker_pool_shutdown", skip(self), fields(pool = %self.name))]
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.tracker.close();

        if tokio::time::timeout(grace, self.tracker.wait()).await.is_ok() {
            debug!(pool = %self.name, "worker pool drained");
            return true;
        }

        warn!(
            pool = %self.name,
            remaining = self.tracker.len(),
            grace_ms = grace.as_millis() as u64,
            "grace period exceeded, cancelling remaining tasks"
        );
        self.token.cancel();
        self.tracker.wait().await;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_spawn_returns_output() {
        let pool = WorkerPool::new("test");
        let handle = pool.spawn(async { 40 + 2 });
        assert_eq!(handle.await.unwrap(), Some(42));
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let pool = WorkerPool::new("test");
        let handle = pool.spawn(async {
            if pool_should_panic() {
                panic!("processor blew up");
            }
            0u8
        });
        let err = handle.await.unwrap_err();
        assert!(err.is_panic());

        // Pool keeps working
        assert_eq!(pool.spawn(async { 1 }).await.unwrap(), Some(1));
    }

    fn pool_should_panic() -> bool {
        true
    }

    #[tokio::test]
    async fn test_parallelism_bound() {
        let pool = WorkerPool::with_parallelism("bounded", 2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let running = running.clone();
                let peak = peak.clone();
                pool.spawn(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_shutdown_drains_in_time() {
        let pool = WorkerPool::new("drain");
        pool.spawn(tokio::time::sleep(Duration::from_millis(10)));

        assert!(pool.shutdown(Duration::from_secs(1)).await);
        assert!(pool.is_closed());
        assert_eq!(pool.active(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_after_grace() {
        let pool = WorkerPool::new("stuck");
        let handle = pool.spawn(tokio::time::sleep(Duration::from_secs(60)));

        assert!(!pool.shutdown(Duration::from_millis(20)).await);
        assert_eq!(handle.await.unwrap(), None);
    }
}
