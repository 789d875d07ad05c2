#![allow(dead_code)]

use aseq::{AsyncSeq, Job, JobHandle, SeqError, Step, TokioWorkerPool, WorkerPool};
use async_stream::try_stream;
use futures_util::stream::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Counts how many enumerations of a tracked sequence started and were disposed
#[derive(Debug, Clone, Default)]
pub struct Probe {
    started: Arc<AtomicUsize>,
    disposed: Arc<AtomicUsize>,
    pulled: Arc<AtomicUsize>,
}

impl Probe {
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Values handed downstream across all enumerations
    pub fn pulled(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }
}

struct DisposeGuard(Arc<AtomicUsize>);

impl Drop for DisposeGuard {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Wrap `seq` so every enumeration is counted when created and when released
pub fn tracked<T>(seq: AsyncSeq<T>) -> (AsyncSeq<T>, Probe)
where
    T: Send + 'static,
{
    let probe = Probe::default();
    let counters = probe.clone();
    let tracked = AsyncSeq::new(move || {
        counters.started.fetch_add(1, Ordering::SeqCst);
        let guard = DisposeGuard(Arc::clone(&counters.disposed));
        let pulled = Arc::clone(&counters.pulled);
        let mut e = seq.enumerate();
        try_stream! {
            let _guard = guard;
            while let Step::Value(item) = e.advance().await? {
                pulled.fetch_add(1, Ordering::SeqCst);
                yield item;
            }
        }
        .boxed()
    });
    (tracked, probe)
}

/// Emit `items`, sleeping `delay` on the tokio clock before each one
pub fn delayed<T>(items: Vec<T>, delay: Duration) -> AsyncSeq<T>
where
    T: Clone + Send + Sync + 'static,
{
    AsyncSeq::new(move || {
        let items = items.clone();
        try_stream! {
            for item in items {
                tokio::time::sleep(delay).await;
                yield item;
            }
        }
        .boxed()
    })
}

/// A sequence that never produces and never ends
pub fn never<T>() -> AsyncSeq<T>
where
    T: Send + 'static,
{
    AsyncSeq::new(|| futures_util::stream::pending().boxed())
}

/// Emit `items`, then fail with `message`
pub fn failing_after<T>(items: Vec<T>, message: &str) -> AsyncSeq<T>
where
    T: Clone + Send + Sync + 'static,
{
    let err = SeqError::upstream(message);
    AsyncSeq::new(move || {
        let items = items.clone();
        let err = err.clone();
        try_stream! {
            for item in items {
                yield item;
            }
            Err::<(), SeqError>(err)?;
        }
        .boxed()
    })
}

/// Worker pool that records every submitted job and advertises a fixed capacity
///
/// Jobs run on a roomy tokio pool, so any bound on concurrency has to come
/// from the caller honouring `capacity`.
#[derive(Debug, Clone)]
pub struct CountingPool {
    inner: TokioWorkerPool,
    capacity: usize,
    executed: Arc<AtomicUsize>,
}

impl CountingPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: TokioWorkerPool::new(64),
            capacity,
            executed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn executed(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }
}

impl WorkerPool for CountingPool {
    fn execute(&self, job: Job) -> JobHandle {
        self.executed.fetch_add(1, Ordering::SeqCst);
        self.inner.execute(job)
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
