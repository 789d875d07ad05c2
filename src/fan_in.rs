//! Fan-in combinators: merge, combine-latest, zip and interleave
//!
//! Every combinator here holds one private enumerator per source. Because the
//! generator owns those enumerators, a failure (which ends the generator) or a
//! downstream disposal (which drops it) releases every remaining source
//! before control returns to the caller. Pending advances that lose a race
//! are simply dropped; advancing is cancel-safe, so the losing source keeps
//! its position.

use async_stream::try_stream;
use either::Either;
use futures_util::future;
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;

use crate::enumerator::{AsyncSeq, Enumerator, Step};
use crate::sequential::map;

/// Merge two sequences of the same type
///
/// Values are emitted as soon as either source produces one. Order across the
/// two sources is unspecified; order within each source is kept. The result
/// ends once both sources have ended and fails as soon as either fails.
pub fn merge<T>(first: AsyncSeq<T>, second: AsyncSeq<T>) -> AsyncSeq<T>
where
    T: Send + 'static,
{
    merge_all(vec![first, second])
}

/// Merge any number of sequences of the same type
pub fn merge_all<T>(sources: Vec<AsyncSeq<T>>) -> AsyncSeq<T>
where
    T: Send + 'static,
{
    AsyncSeq::new(move || {
        let enumerators: Vec<Enumerator<T>> = sources.iter().map(AsyncSeq::enumerate).collect();
        // Each source is re-armed individually once its value is taken;
        // exhausted sources are dropped from the set right away.
        let mut pending = stream::select_all(enumerators);
        try_stream! {
            while let Some(item) = pending.next().await {
                yield item?;
            }
        }
        .boxed()
    })
}

/// Merge two sequences of different types, tagging each value with its side
pub fn merge_choice<A, B>(left: AsyncSeq<A>, right: AsyncSeq<B>) -> AsyncSeq<Either<A, B>>
where
    A: Send + 'static,
    B: Send + 'static,
{
    merge_all(vec![map(left, Either::Left), map(right, Either::Right)])
}

/// Pair the latest value of each source whenever either one updates
pub fn combine_latest<A, B>(left: AsyncSeq<A>, right: AsyncSeq<B>) -> AsyncSeq<(A, B)>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
{
    combine_latest_with(left, right, |a, b| (a, b))
}

/// Combine the latest value of each source whenever either one updates
///
/// Nothing is emitted until both sources have produced a value. If either
/// source ends before that happens the result ends empty. Once both have
/// produced, the result keeps following whichever source is still running and
/// ends when both have ended.
pub fn combine_latest_with<A, B, C, F>(left: AsyncSeq<A>, right: AsyncSeq<B>, f: F) -> AsyncSeq<C>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    C: Send + 'static,
    F: Fn(A, B) -> C + Send + Sync + 'static,
{
    let f = Arc::new(f);
    AsyncSeq::new(move || {
        let f = Arc::clone(&f);
        let mut lhs = left.enumerate();
        let mut rhs = right.enumerate();
        try_stream! {
            let mut latest_left: Option<A> = None;
            let mut latest_right: Option<B> = None;
            let mut left_done = false;
            let mut right_done = false;

            while !(left_done && right_done) {
                let next = tokio::select! {
                    next = lhs.advance(), if !left_done => Either::Left(next),
                    next = rhs.advance(), if !right_done => Either::Right(next),
                };
                let ended = match next {
                    Either::Left(next) => match next? {
                        Step::Value(value) => {
                            latest_left = Some(value);
                            false
                        }
                        Step::End => {
                            left_done = true;
                            lhs.dispose();
                            true
                        }
                    },
                    Either::Right(next) => match next? {
                        Step::Value(value) => {
                            latest_right = Some(value);
                            false
                        }
                        Step::End => {
                            right_done = true;
                            rhs.dispose();
                            true
                        }
                    },
                };
                let primed = latest_left.is_some() && latest_right.is_some();
                if ended {
                    if !primed {
                        lhs.dispose();
                        rhs.dispose();
                        break;
                    }
                    continue;
                }
                if let (Some(a), Some(b)) = (&latest_left, &latest_right) {
                    yield f(a.clone(), b.clone());
                }
            }
        }
        .boxed()
    })
}

/// Pair values positionally; ends with the shorter source
pub fn zip<A, B>(left: AsyncSeq<A>, right: AsyncSeq<B>) -> AsyncSeq<(A, B)>
where
    A: Send + 'static,
    B: Send + 'static,
{
    zip_with(left, right, |a, b| (a, b))
}

/// Combine values positionally with `f`; ends with the shorter source
///
/// Within a step the left source is advanced first and the right one only if
/// the left produced a value, so once the left side ends the right side is
/// disposed without being advanced again.
pub fn zip_with<A, B, C, F>(left: AsyncSeq<A>, right: AsyncSeq<B>, f: F) -> AsyncSeq<C>
where
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    F: Fn(A, B) -> C + Send + Sync + 'static,
{
    let f = Arc::new(f);
    AsyncSeq::new(move || {
        let f = Arc::clone(&f);
        let mut lhs = left.enumerate();
        let mut rhs = right.enumerate();
        try_stream! {
            loop {
                let a = match lhs.advance().await? {
                    Step::Value(a) => a,
                    Step::End => {
                        rhs.dispose();
                        break;
                    }
                };
                match rhs.advance().await? {
                    Step::Value(b) => yield f(a, b),
                    Step::End => {
                        lhs.dispose();
                        break;
                    }
                }
            }
        }
        .boxed()
    })
}

/// [`zip`] advancing both sources concurrently within each step
pub fn zip_parallel<A, B>(left: AsyncSeq<A>, right: AsyncSeq<B>) -> AsyncSeq<(A, B)>
where
    A: Send + 'static,
    B: Send + 'static,
{
    zip_with_parallel(left, right, |a, b| (a, b))
}

/// [`zip_with`] advancing both sources concurrently within each step
///
/// A failure on either side is raised as soon as it is observed without
/// waiting for the other advance.
pub fn zip_with_parallel<A, B, C, F>(left: AsyncSeq<A>, right: AsyncSeq<B>, f: F) -> AsyncSeq<C>
where
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    F: Fn(A, B) -> C + Send + Sync + 'static,
{
    let f = Arc::new(f);
    AsyncSeq::new(move || {
        let f = Arc::clone(&f);
        let mut lhs = left.enumerate();
        let mut rhs = right.enumerate();
        try_stream! {
            loop {
                let step = future::try_join(lhs.advance(), rhs.advance()).await?;
                match step {
                    (Step::Value(a), Step::Value(b)) => yield f(a, b),
                    _ => {
                        lhs.dispose();
                        rhs.dispose();
                        break;
                    }
                }
            }
        }
        .boxed()
    })
}

/// Alternate between the two sources, left first; ends when either ends
pub fn interleave<T>(left: AsyncSeq<T>, right: AsyncSeq<T>) -> AsyncSeq<T>
where
    T: Send + 'static,
{
    AsyncSeq::new(move || {
        let mut lhs = left.enumerate();
        let mut rhs = right.enumerate();
        try_stream! {
            loop {
                match lhs.advance().await? {
                    Step::Value(item) => yield item,
                    Step::End => {
                        rhs.dispose();
                        break;
                    }
                }
                match rhs.advance().await? {
                    Step::Value(item) => yield item,
                    Step::End => {
                        lhs.dispose();
                        break;
                    }
                }
            }
        }
        .boxed()
    })
}

/// [`interleave`] for sources of different types
pub fn interleave_choice<A, B>(left: AsyncSeq<A>, right: AsyncSeq<B>) -> AsyncSeq<Either<A, B>>
where
    A: Send + 'static,
    B: Send + 'static,
{
    interleave(map(left, Either::Left), map(right, Either::Right))
}
