//! Bounded parallel transforms and grouping
//!
//! The parallel maps run each transform as a job on an injected
//! [`WorkerPool`], with at most `max_in_flight` jobs outstanding per
//! enumeration. Dropping the enumeration drops the pending job handles, which
//! abandons the jobs.

use async_stream::try_stream;
use futures::stream::{FuturesOrdered, FuturesUnordered};
use futures_util::future::{self, BoxFuture, FutureExt};
use futures_util::stream::{self, StreamExt};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::cache::cache;
use crate::config::ParallelConfig;
use crate::enumerator::{AsyncSeq, Step};
use crate::error::{SeqError, SeqResult};
use crate::runtime::{run_on, WorkerPool};

enum Event<I, O> {
    Input(SeqResult<Step<I>>),
    Output(SeqResult<O>),
    Drained,
}

fn warn_on_failure<O>(result: &SeqResult<O>) {
    if let Err(err) = result {
        log::warn!("parallel: transform job failed: {}", err);
    }
}

/// Apply `f` to every value on `pool`, emitting results in input order
///
/// Transforms for later values start before earlier ones finish, up to
/// `config.max_in_flight` at a time and never more than the pool's capacity.
/// A result that completes early is held until every earlier one has been
/// emitted.
pub fn map_async_parallel<T, U, F, Fut>(
    source: AsyncSeq<T>,
    f: F,
    pool: Arc<dyn WorkerPool>,
    config: ParallelConfig,
) -> AsyncSeq<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = U> + Send + 'static,
{
    try_map_async_parallel(source, move |item| f(item).map(Ok), pool, config)
}

/// Fallible [`map_async_parallel`]; the first failure in input order ends the sequence
pub fn try_map_async_parallel<T, U, F, Fut>(
    source: AsyncSeq<T>,
    f: F,
    pool: Arc<dyn WorkerPool>,
    config: ParallelConfig,
) -> AsyncSeq<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = SeqResult<U>> + Send + 'static,
{
    let f = Arc::new(f);
    let limit = config.effective_limit(pool.capacity());
    AsyncSeq::new(move || {
        let f = Arc::clone(&f);
        let pool = Arc::clone(&pool);
        let mut e = source.enumerate();
        try_stream! {
            let mut in_flight: FuturesOrdered<BoxFuture<'static, SeqResult<U>>> = FuturesOrdered::new();
            let mut input_done = false;
            loop {
                let event = tokio::select! {
                    biased;
                    Some(out) = in_flight.next(), if !in_flight.is_empty() => Event::Output(out),
                    next = e.advance(), if !input_done && in_flight.len() < limit => Event::Input(next),
                    else => Event::Drained,
                };
                match event {
                    Event::Output(out) => {
                        warn_on_failure(&out);
                        yield out?;
                    }
                    Event::Input(next) => match next? {
                        Step::Value(item) => in_flight.push_back(run_on(&*pool, f(item)).boxed()),
                        Step::End => input_done = true,
                    },
                    Event::Drained => break,
                }
            }
        }
        .boxed()
    })
}

/// Like [`map_async_parallel`] but emits results as they complete
pub fn map_async_unordered<T, U, F, Fut>(
    source: AsyncSeq<T>,
    f: F,
    pool: Arc<dyn WorkerPool>,
    config: ParallelConfig,
) -> AsyncSeq<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = SeqResult<U>> + Send + 'static,
{
    let f = Arc::new(f);
    let limit = config.effective_limit(pool.capacity());
    AsyncSeq::new(move || {
        let f = Arc::clone(&f);
        let pool = Arc::clone(&pool);
        let mut e = source.enumerate();
        try_stream! {
            let mut in_flight: FuturesUnordered<BoxFuture<'static, SeqResult<U>>> = FuturesUnordered::new();
            let mut input_done = false;
            loop {
                let event = tokio::select! {
                    biased;
                    Some(out) = in_flight.next(), if !in_flight.is_empty() => Event::Output(out),
                    next = e.advance(), if !input_done && in_flight.len() < limit => Event::Input(next),
                    else => Event::Drained,
                };
                match event {
                    Event::Output(out) => {
                        warn_on_failure(&out);
                        yield out?;
                    }
                    Event::Input(next) => match next? {
                        Step::Value(item) => in_flight.push(run_on(&*pool, f(item)).boxed()),
                        Step::End => input_done = true,
                    },
                    Event::Drained => break,
                }
            }
        }
        .boxed()
    })
}

/// Run `f` for every value on `pool` and wait for all of them
pub async fn iter_async_parallel<T, F, Fut>(
    source: &AsyncSeq<T>,
    f: F,
    pool: Arc<dyn WorkerPool>,
    config: ParallelConfig,
) -> SeqResult<()>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let effects = map_async_unordered(source.clone(), move |item| f(item).map(Ok), pool, config);
    let mut e = effects.enumerate();
    while let Step::Value(()) = e.advance().await? {}
    Ok(())
}

// A channel receiver exposed as a sequence; only the first enumeration
// drains it, which is all `cache` ever asks for.
fn channel_seq<T>(rx: mpsc::UnboundedReceiver<SeqResult<T>>) -> AsyncSeq<T>
where
    T: Send + 'static,
{
    let rx = Arc::new(Mutex::new(Some(rx)));
    AsyncSeq::new(move || {
        let taken = rx.lock().unwrap_or_else(PoisonError::into_inner).take();
        match taken {
            Some(rx) => UnboundedReceiverStream::new(rx).boxed(),
            None => stream::empty().boxed(),
        }
    })
}

/// Partition values by an asynchronously computed key
///
/// Emits one `(key, group)` pair per distinct key, in order of first
/// appearance. Each group only makes progress while the parent sequence is
/// being advanced, so groups must be consumed concurrently with the parent.
/// A parent failure is delivered to every open group; when the parent ends or
/// is dropped, open groups end. Groups are cached and can be enumerated again.
pub fn group_by_async<T, K, F, Fut>(source: AsyncSeq<T>, key_fn: F) -> AsyncSeq<(K, AsyncSeq<T>)>
where
    T: Clone + Send + Sync + 'static,
    K: Clone + Eq + Hash + Send + Sync + 'static,
    F: Fn(&T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = K> + Send + 'static,
{
    let key_fn = Arc::new(key_fn);
    AsyncSeq::new(move || {
        let key_fn = Arc::clone(&key_fn);
        let mut e = source.enumerate();
        try_stream! {
            let mut groups: HashMap<K, mpsc::UnboundedSender<SeqResult<T>>> = HashMap::new();
            loop {
                match e.advance().await {
                    Ok(Step::Value(item)) => {
                        let key = key_fn(&item).await;
                        if let Some(group) = groups.get(&key) {
                            // A group nobody reads any more just drops its values.
                            let _ = group.send(Ok(item));
                            continue;
                        }
                        let (tx, rx) = mpsc::unbounded_channel();
                        let _ = tx.send(Ok(item));
                        groups.insert(key.clone(), tx);
                        log::debug!("group_by: opened group {}", groups.len());
                        yield (key, cache(channel_seq(rx)));
                    }
                    Ok(Step::End) => break,
                    Err(err) => {
                        for group in groups.values() {
                            let _ = group.send(Err(err.clone()));
                        }
                        Err::<(), SeqError>(err)?;
                    }
                }
            }
        }
        .boxed()
    })
}

/// [`group_by_async`] with a synchronous key function
pub fn group_by<T, K, F>(source: AsyncSeq<T>, key_fn: F) -> AsyncSeq<(K, AsyncSeq<T>)>
where
    T: Clone + Send + Sync + 'static,
    K: Clone + Eq + Hash + Send + Sync + 'static,
    F: Fn(&T) -> K + Send + Sync + 'static,
{
    group_by_async(source, move |item| future::ready(key_fn(item)))
}
