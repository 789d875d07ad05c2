//! Host-runtime capabilities consumed by the time- and pool-driven combinators
//!
//! The crate does not schedule anything itself. Buffering takes a [`Timer`]
//! and the parallel transforms take a [`WorkerPool`]; both are passed in
//! explicitly so tests can substitute their own. [`TokioTimer`] and
//! [`TokioWorkerPool`] adapt the ambient tokio runtime.

use async_trait::async_trait;
use futures::channel::oneshot;
use futures_util::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::config::WorkerPoolConfig;
use crate::error::{SeqError, SeqResult};

/// One-shot wake-up service
#[async_trait]
pub trait Timer: Send + Sync {
    /// Complete after `duration` has elapsed
    async fn sleep(&self, duration: Duration);
}

/// Timer backed by `tokio::time`, so it follows a paused test clock
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

#[async_trait]
impl Timer for TokioTimer {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// A unit of work submitted to a pool
pub type Job = BoxFuture<'static, ()>;

/// Bounded concurrent executor for transform jobs
pub trait WorkerPool: Send + Sync {
    /// Start `job`; the handle resolves when it finishes. Dropping the handle
    /// before completion abandons the job.
    fn execute(&self, job: Job) -> JobHandle;

    /// Number of jobs the pool runs at the same time
    fn capacity(&self) -> usize;
}

/// Completion handle for a submitted job
pub struct JobHandle {
    completion: BoxFuture<'static, SeqResult<()>>,
    on_abandon: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl JobHandle {
    pub fn new<F>(completion: F) -> Self
    where
        F: Future<Output = SeqResult<()>> + Send + 'static,
    {
        JobHandle {
            completion: Box::pin(completion),
            on_abandon: None,
        }
    }

    /// Run `abort` if the handle is dropped before the job completes
    pub fn on_abandon<F>(mut self, abort: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_abandon = Some(Box::new(abort));
        self
    }
}

impl Future for JobHandle {
    type Output = SeqResult<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match this.completion.as_mut().poll(cx) {
            Poll::Ready(result) => {
                this.on_abandon = None;
                Poll::Ready(result)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for JobHandle {
    fn drop(&mut self) {
        if let Some(abort) = self.on_abandon.take() {
            abort();
        }
    }
}

impl fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHandle")
            .field("pending", &self.on_abandon.is_some())
            .finish()
    }
}

/// Worker pool that spawns onto the current tokio runtime, bounded by a semaphore
#[derive(Debug, Clone)]
pub struct TokioWorkerPool {
    permits: Arc<Semaphore>,
    workers: usize,
}

impl TokioWorkerPool {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn with_config(config: WorkerPoolConfig) -> Self {
        Self::new(config.workers)
    }
}

impl Default for TokioWorkerPool {
    fn default() -> Self {
        Self::with_config(WorkerPoolConfig::default())
    }
}

impl WorkerPool for TokioWorkerPool {
    fn execute(&self, job: Job) -> JobHandle {
        let permits = Arc::clone(&self.permits);
        let task = tokio::spawn(async move {
            let _permit = permits.acquire_owned().await;
            job.await;
        });
        let abort = task.abort_handle();
        JobHandle::new(async move { task.await.map_err(SeqError::from) })
            .on_abandon(move || abort.abort())
    }

    fn capacity(&self) -> usize {
        self.workers
    }
}

/// Run a fallible future on `pool` and hand back its result
///
/// Dropping the returned future abandons the job.
pub fn run_on<T, Fut>(pool: &dyn WorkerPool, fut: Fut) -> impl Future<Output = SeqResult<T>> + Send + 'static
where
    T: Send + 'static,
    Fut: Future<Output = SeqResult<T>> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let handle = pool.execute(Box::pin(async move {
        let _ = tx.send(fut.await);
    }));
    async move {
        handle.await?;
        rx.await
            .map_err(|_| SeqError::Worker("job finished without a result".to_string()))?
    }
}

/// Timer and worker pool bundled for the combinators that need them
#[derive(Clone)]
pub struct ExecutionContext {
    timer: Arc<dyn Timer>,
    pool: Arc<dyn WorkerPool>,
}

impl ExecutionContext {
    pub fn new(timer: Arc<dyn Timer>, pool: Arc<dyn WorkerPool>) -> Self {
        Self { timer, pool }
    }

    /// Tokio timer plus a tokio pool sized by the CPU count
    pub fn tokio() -> Self {
        Self::new(Arc::new(TokioTimer), Arc::new(TokioWorkerPool::default()))
    }

    pub fn timer(&self) -> Arc<dyn Timer> {
        Arc::clone(&self.timer)
    }

    pub fn pool(&self) -> Arc<dyn WorkerPool> {
        Arc::clone(&self.pool)
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::tokio()
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("pool_capacity", &self.pool.capacity())
            .finish()
    }
}
