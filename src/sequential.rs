//! Single-producer combinators and terminal operations
//!
//! Each combinator owns exactly one upstream enumerator per enumeration and
//! advances it on demand. Short-circuiting combinators (`take`, `take_while`,
//! `take_until_signal`) dispose the upstream as soon as they know they are
//! done instead of waiting for the consumer to drop them.

use async_stream::try_stream;
use futures_util::future::FutureExt;
use futures_util::stream::StreamExt;
use std::future::Future;
use std::sync::Arc;

use crate::enumerator::{AsyncSeq, Step};
use crate::error::{SeqError, SeqResult};

// ================================
// Transformations
// ================================

/// Apply `f` to every value
pub fn map<T, U, F>(source: AsyncSeq<T>, f: F) -> AsyncSeq<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> U + Send + Sync + 'static,
{
    let f = Arc::new(f);
    AsyncSeq::new(move || {
        let f = Arc::clone(&f);
        source.enumerate().map(move |item| item.map(|v| f(v))).boxed()
    })
}

/// Apply a fallible `f` to every value; the first failure ends the sequence
pub fn try_map<T, U, F>(source: AsyncSeq<T>, f: F) -> AsyncSeq<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> SeqResult<U> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    AsyncSeq::new(move || {
        let f = Arc::clone(&f);
        let mut e = source.enumerate();
        try_stream! {
            while let Step::Value(item) = e.advance().await? {
                yield f(item)?;
            }
        }
        .boxed()
    })
}

/// Apply an asynchronous `f` to every value, one at a time
pub fn map_async<T, U, F, Fut>(source: AsyncSeq<T>, f: F) -> AsyncSeq<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = U> + Send + 'static,
{
    try_map_async(source, move |item| f(item).map(Ok))
}

/// Fallible [`map_async`]
pub fn try_map_async<T, U, F, Fut>(source: AsyncSeq<T>, f: F) -> AsyncSeq<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = SeqResult<U>> + Send + 'static,
{
    let f = Arc::new(f);
    AsyncSeq::new(move || {
        let f = Arc::clone(&f);
        let mut e = source.enumerate();
        try_stream! {
            while let Step::Value(item) = e.advance().await? {
                yield f(item).await?;
            }
        }
        .boxed()
    })
}

/// Keep values matching `predicate`
pub fn filter<T, F>(source: AsyncSeq<T>, predicate: F) -> AsyncSeq<T>
where
    T: Send + 'static,
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    let predicate = Arc::new(predicate);
    AsyncSeq::new(move || {
        let predicate = Arc::clone(&predicate);
        let mut e = source.enumerate();
        try_stream! {
            while let Step::Value(item) = e.advance().await? {
                if predicate(&item) {
                    yield item;
                }
            }
        }
        .boxed()
    })
}

/// Keep values matching an asynchronous predicate
pub fn filter_async<T, F, Fut>(source: AsyncSeq<T>, predicate: F) -> AsyncSeq<T>
where
    T: Send + 'static,
    F: Fn(&T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    let predicate = Arc::new(predicate);
    AsyncSeq::new(move || {
        let predicate = Arc::clone(&predicate);
        let mut e = source.enumerate();
        try_stream! {
            while let Step::Value(item) = e.advance().await? {
                if predicate(&item).await {
                    yield item;
                }
            }
        }
        .boxed()
    })
}

/// Filter and map in one pass
pub fn choose<T, U, F>(source: AsyncSeq<T>, f: F) -> AsyncSeq<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Option<U> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    AsyncSeq::new(move || {
        let f = Arc::clone(&f);
        let mut e = source.enumerate();
        try_stream! {
            while let Step::Value(item) = e.advance().await? {
                if let Some(chosen) = f(item) {
                    yield chosen;
                }
            }
        }
        .boxed()
    })
}

/// [`choose`] with an asynchronous chooser
pub fn choose_async<T, U, F, Fut>(source: AsyncSeq<T>, f: F) -> AsyncSeq<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<U>> + Send + 'static,
{
    let f = Arc::new(f);
    AsyncSeq::new(move || {
        let f = Arc::clone(&f);
        let mut e = source.enumerate();
        try_stream! {
            while let Step::Value(item) = e.advance().await? {
                if let Some(chosen) = f(item).await {
                    yield chosen;
                }
            }
        }
        .boxed()
    })
}

/// Pair every value with its zero-based position
pub fn indexed<T>(source: AsyncSeq<T>) -> AsyncSeq<(u64, T)>
where
    T: Send + 'static,
{
    AsyncSeq::new(move || {
        let mut e = source.enumerate();
        try_stream! {
            let mut index = 0u64;
            while let Step::Value(item) = e.advance().await? {
                yield (index, item);
                index += 1;
            }
        }
        .boxed()
    })
}

// ================================
// Slicing
// ================================

/// First `count` values
///
/// `take(0)` never advances the upstream, and the upstream is disposed right
/// after the last wanted value instead of being advanced once more.
pub fn take<T>(source: AsyncSeq<T>, count: u64) -> AsyncSeq<T>
where
    T: Send + 'static,
{
    AsyncSeq::new(move || {
        let mut e = source.enumerate();
        try_stream! {
            let mut remaining = count;
            while remaining > 0 {
                match e.advance().await? {
                    Step::Value(item) => {
                        remaining -= 1;
                        if remaining == 0 {
                            e.dispose();
                        }
                        yield item;
                    }
                    Step::End => break,
                }
            }
            e.dispose();
        }
        .boxed()
    })
}

/// Everything after the first `count` values
pub fn skip<T>(source: AsyncSeq<T>, count: u64) -> AsyncSeq<T>
where
    T: Send + 'static,
{
    AsyncSeq::new(move || {
        let mut e = source.enumerate();
        try_stream! {
            let mut skipped = 0u64;
            while let Step::Value(item) = e.advance().await? {
                if skipped < count {
                    skipped += 1;
                    continue;
                }
                yield item;
            }
        }
        .boxed()
    })
}

/// Values up to (not including) the first one failing `predicate`
///
/// # Examples
/// ```
/// use aseq::constructors::from_iter;
/// use aseq::sequential::{take_while, to_vec};
///
/// # async fn example() {
/// let seq = take_while(from_iter(vec![1, 2, 3, 4, 1]), |x| *x < 3);
/// assert_eq!(to_vec(&seq).await, Ok(vec![1, 2]));
/// # }
/// ```
pub fn take_while<T, F>(source: AsyncSeq<T>, predicate: F) -> AsyncSeq<T>
where
    T: Send + 'static,
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    let predicate = Arc::new(predicate);
    AsyncSeq::new(move || {
        let predicate = Arc::clone(&predicate);
        let mut e = source.enumerate();
        try_stream! {
            while let Step::Value(item) = e.advance().await? {
                if !predicate(&item) {
                    e.dispose();
                    break;
                }
                yield item;
            }
        }
        .boxed()
    })
}

/// Like [`take_while`], but also emits the first failing value
pub fn take_while_inclusive<T, F>(source: AsyncSeq<T>, predicate: F) -> AsyncSeq<T>
where
    T: Send + 'static,
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    let predicate = Arc::new(predicate);
    AsyncSeq::new(move || {
        let predicate = Arc::clone(&predicate);
        let mut e = source.enumerate();
        try_stream! {
            while let Step::Value(item) = e.advance().await? {
                let keep_going = predicate(&item);
                if !keep_going {
                    e.dispose();
                }
                yield item;
                if !keep_going {
                    break;
                }
            }
        }
        .boxed()
    })
}

/// Drop values while `predicate` holds, then pass everything through
pub fn skip_while<T, F>(source: AsyncSeq<T>, predicate: F) -> AsyncSeq<T>
where
    T: Send + 'static,
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    let predicate = Arc::new(predicate);
    AsyncSeq::new(move || {
        let predicate = Arc::clone(&predicate);
        let mut e = source.enumerate();
        try_stream! {
            let mut skipping = true;
            while let Step::Value(item) = e.advance().await? {
                if skipping && predicate(&item) {
                    continue;
                }
                skipping = false;
                yield item;
            }
        }
        .boxed()
    })
}

/// End the sequence once `signal` completes
///
/// Each advance races the upstream against the signal. The signal is shared by
/// every enumeration, so it fires once for all of them. If both are ready the
/// signal wins.
pub fn take_until_signal<T, S>(source: AsyncSeq<T>, signal: S) -> AsyncSeq<T>
where
    T: Send + 'static,
    S: Future<Output = ()> + Send + 'static,
{
    let signal = signal.boxed().shared();
    AsyncSeq::new(move || {
        let mut e = source.enumerate();
        let mut signal = signal.clone();
        try_stream! {
            loop {
                let next = tokio::select! {
                    biased;
                    _ = &mut signal => None,
                    next = e.advance() => Some(next),
                };
                match next {
                    None => {
                        e.dispose();
                        break;
                    }
                    Some(next) => match next? {
                        Step::Value(item) => yield item,
                        Step::End => break,
                    },
                }
            }
        }
        .boxed()
    })
}

/// Discard values until `signal` completes, then pass everything through
pub fn skip_until_signal<T, S>(source: AsyncSeq<T>, signal: S) -> AsyncSeq<T>
where
    T: Send + 'static,
    S: Future<Output = ()> + Send + 'static,
{
    let signal = signal.boxed().shared();
    AsyncSeq::new(move || {
        let mut e = source.enumerate();
        let mut signal = signal.clone();
        try_stream! {
            let mut fired = false;
            loop {
                if fired {
                    match e.advance().await? {
                        Step::Value(item) => yield item,
                        Step::End => break,
                    }
                    continue;
                }
                let next = tokio::select! {
                    biased;
                    _ = &mut signal => None,
                    next = e.advance() => Some(next),
                };
                match next {
                    None => fired = true,
                    Some(next) => {
                        if next?.is_end() {
                            break;
                        }
                    }
                }
            }
        }
        .boxed()
    })
}

// ================================
// Stateful transformations
// ================================

/// Drop values equal to their predecessor
pub fn distinct_until_changed<T>(source: AsyncSeq<T>) -> AsyncSeq<T>
where
    T: PartialEq + Clone + Send + 'static,
{
    AsyncSeq::new(move || {
        let mut e = source.enumerate();
        try_stream! {
            let mut prev: Option<T> = None;
            while let Step::Value(item) = e.advance().await? {
                if prev.as_ref() == Some(&item) {
                    continue;
                }
                prev = Some(item.clone());
                yield item;
            }
        }
        .boxed()
    })
}

/// Consecutive pairs: `[a, b, c]` becomes `[(a, b), (b, c)]`
pub fn pairwise<T>(source: AsyncSeq<T>) -> AsyncSeq<(T, T)>
where
    T: Clone + Send + 'static,
{
    AsyncSeq::new(move || {
        let mut e = source.enumerate();
        try_stream! {
            let mut prev: Option<T> = None;
            while let Step::Value(item) = e.advance().await? {
                if let Some(p) = prev.replace(item.clone()) {
                    yield (p, item);
                }
            }
        }
        .boxed()
    })
}

/// Running accumulation; emits every intermediate state but not the seed
pub fn scan<T, S, F>(source: AsyncSeq<T>, init: S, f: F) -> AsyncSeq<S>
where
    T: Send + 'static,
    S: Clone + Send + Sync + 'static,
    F: Fn(S, T) -> S + Send + Sync + 'static,
{
    let f = Arc::new(f);
    scan_async(source, init, move |acc, item| {
        let f = Arc::clone(&f);
        async move { f(acc, item) }
    })
}

/// [`scan`] with an asynchronous step
pub fn scan_async<T, S, F, Fut>(source: AsyncSeq<T>, init: S, f: F) -> AsyncSeq<S>
where
    T: Send + 'static,
    S: Clone + Send + Sync + 'static,
    F: Fn(S, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = S> + Send + 'static,
{
    let f = Arc::new(f);
    AsyncSeq::new(move || {
        let f = Arc::clone(&f);
        let mut e = source.enumerate();
        let mut acc = init.clone();
        try_stream! {
            while let Step::Value(item) = e.advance().await? {
                acc = f(acc, item).await;
                yield acc.clone();
            }
        }
        .boxed()
    })
}

// ================================
// Sequencing
// ================================

/// All of `first`, then all of `second`
pub fn append<T>(first: AsyncSeq<T>, second: AsyncSeq<T>) -> AsyncSeq<T>
where
    T: Send + 'static,
{
    AsyncSeq::new(move || {
        let mut head = first.enumerate();
        let second = second.clone();
        try_stream! {
            while let Step::Value(item) = head.advance().await? {
                yield item;
            }
            let mut tail = second.enumerate();
            while let Step::Value(item) = tail.advance().await? {
                yield item;
            }
        }
        .boxed()
    })
}

/// Flatten a sequence of sequences, in order
pub fn concat<T>(sources: AsyncSeq<AsyncSeq<T>>) -> AsyncSeq<T>
where
    T: Send + 'static,
{
    collect(sources, |inner| inner)
}

/// Map each value to a sequence and drain it before advancing the upstream again
pub fn collect<T, U, F>(source: AsyncSeq<T>, f: F) -> AsyncSeq<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> AsyncSeq<U> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    AsyncSeq::new(move || {
        let f = Arc::clone(&f);
        let mut outer = source.enumerate();
        try_stream! {
            while let Step::Value(item) = outer.advance().await? {
                let mut inner = f(item).enumerate();
                while let Step::Value(value) = inner.advance().await? {
                    yield value;
                }
            }
        }
        .boxed()
    })
}

// ================================
// Terminal operations
// ================================

/// Drain the sequence into a vector
pub async fn to_vec<T>(source: &AsyncSeq<T>) -> SeqResult<Vec<T>>
where
    T: Send + 'static,
{
    let mut e = source.enumerate();
    let mut out = Vec::new();
    while let Step::Value(item) = e.advance().await? {
        out.push(item);
    }
    Ok(out)
}

/// Run `f` on every value
pub async fn iter<T, F>(source: &AsyncSeq<T>, mut f: F) -> SeqResult<()>
where
    T: Send + 'static,
    F: FnMut(T),
{
    let mut e = source.enumerate();
    while let Step::Value(item) = e.advance().await? {
        f(item);
    }
    Ok(())
}

/// Run an asynchronous `f` on every value, one at a time
pub async fn iter_async<T, F, Fut>(source: &AsyncSeq<T>, mut f: F) -> SeqResult<()>
where
    T: Send + 'static,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut e = source.enumerate();
    while let Step::Value(item) = e.advance().await? {
        f(item).await;
    }
    Ok(())
}

/// Fold operation that accumulates a value over a sequence
pub async fn fold<T, A, F>(source: &AsyncSeq<T>, init: A, mut f: F) -> SeqResult<A>
where
    T: Send + 'static,
    F: FnMut(A, T) -> A,
{
    let mut e = source.enumerate();
    let mut acc = init;
    while let Step::Value(item) = e.advance().await? {
        acc = f(acc, item);
    }
    Ok(acc)
}

/// [`fold`] with an asynchronous step
pub async fn fold_async<T, A, F, Fut>(source: &AsyncSeq<T>, init: A, mut f: F) -> SeqResult<A>
where
    T: Send + 'static,
    F: FnMut(A, T) -> Fut,
    Fut: Future<Output = A>,
{
    let mut e = source.enumerate();
    let mut acc = init;
    while let Step::Value(item) = e.advance().await? {
        acc = f(acc, item).await;
    }
    Ok(acc)
}

/// Combine all values with `f`; fails with [`SeqError::Empty`] on an empty sequence
pub async fn reduce<T, F>(source: &AsyncSeq<T>, mut f: F) -> SeqResult<T>
where
    T: Send + 'static,
    F: FnMut(T, T) -> T,
{
    let mut e = source.enumerate();
    let mut acc = match e.advance().await? {
        Step::Value(first) => first,
        Step::End => return Err(SeqError::Empty),
    };
    while let Step::Value(item) = e.advance().await? {
        acc = f(acc, item);
    }
    Ok(acc)
}

/// Number of values
pub async fn length<T>(source: &AsyncSeq<T>) -> SeqResult<u64>
where
    T: Send + 'static,
{
    fold(source, 0u64, |n, _| n + 1).await
}

/// True if any value matches; stops at the first match
pub async fn exists<T, F>(source: &AsyncSeq<T>, mut predicate: F) -> SeqResult<bool>
where
    T: Send + 'static,
    F: FnMut(&T) -> bool,
{
    Ok(try_find(source, |item| predicate(item)).await?.is_some())
}

/// True if every value matches; stops at the first mismatch
pub async fn forall<T, F>(source: &AsyncSeq<T>, mut predicate: F) -> SeqResult<bool>
where
    T: Send + 'static,
    F: FnMut(&T) -> bool,
{
    Ok(!exists(source, |item| !predicate(item)).await?)
}

pub async fn contains<T>(source: &AsyncSeq<T>, value: &T) -> SeqResult<bool>
where
    T: PartialEq + Send + 'static,
{
    exists(source, |item| item == value).await
}

/// First value matching `predicate`, if any
pub async fn try_find<T, F>(source: &AsyncSeq<T>, mut predicate: F) -> SeqResult<Option<T>>
where
    T: Send + 'static,
    F: FnMut(&T) -> bool,
{
    let mut e = source.enumerate();
    while let Step::Value(item) = e.advance().await? {
        if predicate(&item) {
            return Ok(Some(item));
        }
    }
    Ok(None)
}

/// First value, or `None` for an empty sequence
pub async fn try_first<T>(source: &AsyncSeq<T>) -> SeqResult<Option<T>>
where
    T: Send + 'static,
{
    let mut e = source.enumerate();
    Ok(e.advance().await?.into_option())
}

/// First value; fails with [`SeqError::Empty`] for an empty sequence
pub async fn first<T>(source: &AsyncSeq<T>) -> SeqResult<T>
where
    T: Send + 'static,
{
    try_first(source).await?.ok_or(SeqError::Empty)
}

/// Last value, or `None` for an empty sequence
pub async fn try_last<T>(source: &AsyncSeq<T>) -> SeqResult<Option<T>>
where
    T: Send + 'static,
{
    fold(source, None, |_, item| Some(item)).await
}

/// Last value; fails with [`SeqError::Empty`] for an empty sequence
pub async fn last<T>(source: &AsyncSeq<T>) -> SeqResult<T>
where
    T: Send + 'static,
{
    try_last(source).await?.ok_or(SeqError::Empty)
}

/// First `Some` produced by `chooser`, or `None` if it never produces one
pub async fn try_pick<T, U, F>(source: &AsyncSeq<T>, mut chooser: F) -> SeqResult<Option<U>>
where
    T: Send + 'static,
    F: FnMut(T) -> Option<U>,
{
    let mut e = source.enumerate();
    while let Step::Value(item) = e.advance().await? {
        if let Some(chosen) = chooser(item) {
            return Ok(Some(chosen));
        }
    }
    Ok(None)
}

/// Like [`try_pick`], failing with [`SeqError::Empty`] when nothing is chosen
pub async fn pick<T, U, F>(source: &AsyncSeq<T>, chooser: F) -> SeqResult<U>
where
    T: Send + 'static,
    F: FnMut(T) -> Option<U>,
{
    try_pick(source, chooser).await?.ok_or(SeqError::Empty)
}
