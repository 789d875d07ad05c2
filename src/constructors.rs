//! Ways to obtain a sequence
//!
//! Every constructor is cold: each enumeration starts over, re-running any
//! side effect the constructor was given.

use async_stream::{stream, try_stream};
use futures_core::Stream;
use futures_util::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::enumerator::AsyncSeq;
use crate::error::{SeqError, SeqResult};
use crate::runtime::Timer;

/// A sequence that ends immediately
pub fn empty<T>() -> AsyncSeq<T>
where
    T: Send + 'static,
{
    AsyncSeq::new(|| stream::empty().boxed())
}

/// A sequence of exactly one value
pub fn singleton<T>(item: T) -> AsyncSeq<T>
where
    T: Clone + Send + Sync + 'static,
{
    AsyncSeq::new(move || stream::once(futures_util::future::ready(Ok(item.clone()))).boxed())
}

/// A sequence that fails on its first advance
pub fn fail<T>(err: SeqError) -> AsyncSeq<T>
where
    T: Send + 'static,
{
    AsyncSeq::new(move || stream::once(futures_util::future::ready(Err(err.clone()))).boxed())
}

/// Create a sequence from an iterator
///
/// # Examples
/// ```
/// use aseq::constructors::from_iter;
/// use aseq::sequential::to_vec;
///
/// # async fn example() {
/// let seq = from_iter(vec![1, 2, 3]);
/// assert_eq!(to_vec(&seq).await, Ok(vec![1, 2, 3]));
/// # }
/// ```
pub fn from_iter<I>(iter: I) -> AsyncSeq<I::Item>
where
    I: IntoIterator + Clone + Send + Sync + 'static,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    AsyncSeq::new(move || stream::iter(iter.clone().into_iter().map(Ok)).boxed())
}

/// Wrap a factory of infallible streams
pub fn from_stream<T, F, S>(factory: F) -> AsyncSeq<T>
where
    T: Send + 'static,
    F: Fn() -> S + Send + Sync + 'static,
    S: Stream<Item = T> + Send + 'static,
{
    AsyncSeq::from_stream_fn(move || factory().map(Ok))
}

/// Evaluate a future per enumeration and emit its output
pub fn from_async<T, F, Fut>(f: F) -> AsyncSeq<T>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = SeqResult<T>> + Send + 'static,
{
    AsyncSeq::new(move || stream::once(f()).boxed())
}

/// Build the sequence lazily, once per enumeration
pub fn defer<T, F>(f: F) -> AsyncSeq<T>
where
    T: Send + 'static,
    F: Fn() -> AsyncSeq<T> + Send + Sync + 'static,
{
    AsyncSeq::new(move || f().into_stream())
}

/// `count` copies of `item`
pub fn replicate<T>(count: u64, item: T) -> AsyncSeq<T>
where
    T: Clone + Send + Sync + 'static,
{
    AsyncSeq::new(move || {
        let item = item.clone();
        stream! {
            for _ in 0..count {
                yield Ok(item.clone());
            }
        }
        .boxed()
    })
}

/// `item` forever
pub fn replicate_infinite<T>(item: T) -> AsyncSeq<T>
where
    T: Clone + Send + Sync + 'static,
{
    AsyncSeq::new(move || stream::repeat(item.clone()).map(Ok).boxed())
}

/// `f(0), f(1), ..., f(count - 1)`
pub fn init<T, F>(count: u64, f: F) -> AsyncSeq<T>
where
    T: Send + 'static,
    F: Fn(u64) -> T + Send + Sync + 'static,
{
    let f = Arc::new(f);
    AsyncSeq::new(move || {
        let f = Arc::clone(&f);
        stream! {
            for i in 0..count {
                yield Ok(f(i));
            }
        }
        .boxed()
    })
}

/// `f(0), f(1), ...` without end
pub fn init_infinite<T, F>(f: F) -> AsyncSeq<T>
where
    T: Send + 'static,
    F: Fn(u64) -> T + Send + Sync + 'static,
{
    let f = Arc::new(f);
    AsyncSeq::new(move || {
        let f = Arc::clone(&f);
        stream! {
            let mut i = 0u64;
            loop {
                yield Ok(f(i));
                i += 1;
            }
        }
        .boxed()
    })
}

/// Like [`init`], with an asynchronous generator
pub fn init_async<T, F, Fut>(count: u64, f: F) -> AsyncSeq<T>
where
    T: Send + 'static,
    F: Fn(u64) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let f = Arc::new(f);
    AsyncSeq::new(move || {
        let f = Arc::clone(&f);
        stream! {
            for i in 0..count {
                yield Ok(f(i).await);
            }
        }
        .boxed()
    })
}

/// Generate a sequence from a seed and a step function
///
/// The sequence ends when `f` returns `None`. The seed is cloned for each
/// enumeration.
///
/// # Examples
/// ```
/// use aseq::constructors::unfold;
/// use aseq::sequential::{take, to_vec};
///
/// # async fn example() {
/// let fibonacci = unfold((0u64, 1u64), |(a, b)| async move { Some((a, (b, a + b))) });
/// let first = to_vec(&take(fibonacci, 7)).await;
/// assert_eq!(first, Ok(vec![0, 1, 1, 2, 3, 5, 8]));
/// # }
/// ```
pub fn unfold<S, T, F, Fut>(init: S, f: F) -> AsyncSeq<T>
where
    S: Clone + Send + Sync + 'static,
    T: Send + 'static,
    F: Fn(S) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<(T, S)>> + Send + 'static,
{
    try_unfold(init, move |state| {
        let next = f(state);
        async move { Ok(next.await) }
    })
}

/// [`unfold`] with a fallible step; a failure ends the sequence
pub fn try_unfold<S, T, F, Fut>(init: S, f: F) -> AsyncSeq<T>
where
    S: Clone + Send + Sync + 'static,
    T: Send + 'static,
    F: Fn(S) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = SeqResult<Option<(T, S)>>> + Send + 'static,
{
    let f = Arc::new(f);
    AsyncSeq::new(move || {
        let f = Arc::clone(&f);
        let mut state = init.clone();
        try_stream! {
            loop {
                match f(state).await? {
                    Some((item, next)) => {
                        yield item;
                        state = next;
                    }
                    None => break,
                }
            }
        }
        .boxed()
    })
}

/// Emit 0, 1, 2, ... with `period` between values, forever
pub fn interval(period: Duration, timer: Arc<dyn Timer>) -> AsyncSeq<u64> {
    AsyncSeq::new(move || {
        let timer = Arc::clone(&timer);
        stream! {
            let mut tick = 0u64;
            loop {
                yield Ok(tick);
                timer.sleep(period).await;
                tick += 1;
            }
        }
        .boxed()
    })
}
