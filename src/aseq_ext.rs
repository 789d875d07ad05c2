use either::Either;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use crate::buffering::{buffer_by_count, buffer_by_count_and_time, buffer_by_time, buffer_with_config};
use crate::cache::cache;
use crate::config::{BufferConfig, ParallelConfig};
use crate::enumerator::AsyncSeq;
use crate::error::SeqResult;
use crate::fan_in::{
    combine_latest, combine_latest_with, interleave, interleave_choice, merge, merge_choice, zip,
    zip_parallel, zip_with, zip_with_parallel,
};
use crate::parallel::{
    group_by, group_by_async, iter_async_parallel, map_async_parallel, map_async_unordered,
    try_map_async_parallel,
};
use crate::runtime::{Timer, WorkerPool};
use crate::sequential;

/// Extension trait exposing the combinators as methods on [`AsyncSeq`]
///
/// Every method delegates to the free function of the same name.
pub trait AsyncSeqExt<T>: Sized
where
    T: Send + 'static,
{
    fn into_seq(self) -> AsyncSeq<T>;

    fn seq_ref(&self) -> &AsyncSeq<T>;

    // ---- sequential transforms ----

    fn map<U, F>(self, f: F) -> AsyncSeq<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        sequential::map(self.into_seq(), f)
    }

    fn try_map<U, F>(self, f: F) -> AsyncSeq<U>
    where
        U: Send + 'static,
        F: Fn(T) -> SeqResult<U> + Send + Sync + 'static,
    {
        sequential::try_map(self.into_seq(), f)
    }

    fn map_async<U, F, Fut>(self, f: F) -> AsyncSeq<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = U> + Send + 'static,
    {
        sequential::map_async(self.into_seq(), f)
    }

    fn try_map_async<U, F, Fut>(self, f: F) -> AsyncSeq<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SeqResult<U>> + Send + 'static,
    {
        sequential::try_map_async(self.into_seq(), f)
    }

    fn filter<F>(self, predicate: F) -> AsyncSeq<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        sequential::filter(self.into_seq(), predicate)
    }

    fn filter_async<F, Fut>(self, predicate: F) -> AsyncSeq<T>
    where
        F: Fn(&T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        sequential::filter_async(self.into_seq(), predicate)
    }

    fn choose<U, F>(self, f: F) -> AsyncSeq<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Option<U> + Send + Sync + 'static,
    {
        sequential::choose(self.into_seq(), f)
    }

    fn choose_async<U, F, Fut>(self, f: F) -> AsyncSeq<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<U>> + Send + 'static,
    {
        sequential::choose_async(self.into_seq(), f)
    }

    fn indexed(self) -> AsyncSeq<(u64, T)> {
        sequential::indexed(self.into_seq())
    }

    fn take(self, count: u64) -> AsyncSeq<T> {
        sequential::take(self.into_seq(), count)
    }

    fn skip(self, count: u64) -> AsyncSeq<T> {
        sequential::skip(self.into_seq(), count)
    }

    fn take_while<F>(self, predicate: F) -> AsyncSeq<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        sequential::take_while(self.into_seq(), predicate)
    }

    fn take_while_inclusive<F>(self, predicate: F) -> AsyncSeq<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        sequential::take_while_inclusive(self.into_seq(), predicate)
    }

    fn skip_while<F>(self, predicate: F) -> AsyncSeq<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        sequential::skip_while(self.into_seq(), predicate)
    }

    fn take_until_signal<S>(self, signal: S) -> AsyncSeq<T>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        sequential::take_until_signal(self.into_seq(), signal)
    }

    fn skip_until_signal<S>(self, signal: S) -> AsyncSeq<T>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        sequential::skip_until_signal(self.into_seq(), signal)
    }

    fn distinct_until_changed(self) -> AsyncSeq<T>
    where
        T: PartialEq + Clone,
    {
        sequential::distinct_until_changed(self.into_seq())
    }

    fn pairwise(self) -> AsyncSeq<(T, T)>
    where
        T: Clone,
    {
        sequential::pairwise(self.into_seq())
    }

    fn scan<S, F>(self, init: S, f: F) -> AsyncSeq<S>
    where
        S: Clone + Send + Sync + 'static,
        F: Fn(S, T) -> S + Send + Sync + 'static,
    {
        sequential::scan(self.into_seq(), init, f)
    }

    fn scan_async<S, F, Fut>(self, init: S, f: F) -> AsyncSeq<S>
    where
        S: Clone + Send + Sync + 'static,
        F: Fn(S, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = S> + Send + 'static,
    {
        sequential::scan_async(self.into_seq(), init, f)
    }

    fn append(self, next: AsyncSeq<T>) -> AsyncSeq<T> {
        sequential::append(self.into_seq(), next)
    }

    fn collect<U, F>(self, f: F) -> AsyncSeq<U>
    where
        U: Send + 'static,
        F: Fn(T) -> AsyncSeq<U> + Send + Sync + 'static,
    {
        sequential::collect(self.into_seq(), f)
    }

    // ---- fan-in ----

    fn merge(self, other: AsyncSeq<T>) -> AsyncSeq<T> {
        merge(self.into_seq(), other)
    }

    fn merge_choice<B>(self, other: AsyncSeq<B>) -> AsyncSeq<Either<T, B>>
    where
        B: Send + 'static,
    {
        merge_choice(self.into_seq(), other)
    }

    fn combine_latest<B>(self, other: AsyncSeq<B>) -> AsyncSeq<(T, B)>
    where
        T: Clone,
        B: Clone + Send + 'static,
    {
        combine_latest(self.into_seq(), other)
    }

    fn combine_latest_with<B, C, F>(self, other: AsyncSeq<B>, f: F) -> AsyncSeq<C>
    where
        T: Clone,
        B: Clone + Send + 'static,
        C: Send + 'static,
        F: Fn(T, B) -> C + Send + Sync + 'static,
    {
        combine_latest_with(self.into_seq(), other, f)
    }

    fn zip<B>(self, other: AsyncSeq<B>) -> AsyncSeq<(T, B)>
    where
        B: Send + 'static,
    {
        zip(self.into_seq(), other)
    }

    fn zip_with<B, C, F>(self, other: AsyncSeq<B>, f: F) -> AsyncSeq<C>
    where
        B: Send + 'static,
        C: Send + 'static,
        F: Fn(T, B) -> C + Send + Sync + 'static,
    {
        zip_with(self.into_seq(), other, f)
    }

    fn zip_parallel<B>(self, other: AsyncSeq<B>) -> AsyncSeq<(T, B)>
    where
        B: Send + 'static,
    {
        zip_parallel(self.into_seq(), other)
    }

    fn zip_with_parallel<B, C, F>(self, other: AsyncSeq<B>, f: F) -> AsyncSeq<C>
    where
        B: Send + 'static,
        C: Send + 'static,
        F: Fn(T, B) -> C + Send + Sync + 'static,
    {
        zip_with_parallel(self.into_seq(), other, f)
    }

    fn interleave(self, other: AsyncSeq<T>) -> AsyncSeq<T> {
        interleave(self.into_seq(), other)
    }

    fn interleave_choice<B>(self, other: AsyncSeq<B>) -> AsyncSeq<Either<T, B>>
    where
        B: Send + 'static,
    {
        interleave_choice(self.into_seq(), other)
    }

    // ---- buffering ----

    fn buffer_by_count(self, size: usize) -> AsyncSeq<Vec<T>> {
        buffer_by_count(self.into_seq(), size)
    }

    fn buffer_by_count_and_time(self, size: usize, timeout: Duration, timer: Arc<dyn Timer>) -> AsyncSeq<Vec<T>> {
        buffer_by_count_and_time(self.into_seq(), size, timeout, timer)
    }

    fn buffer_by_time(self, timeout: Duration, timer: Arc<dyn Timer>) -> AsyncSeq<Vec<T>> {
        buffer_by_time(self.into_seq(), timeout, timer)
    }

    fn buffer_with_config(self, config: BufferConfig, timer: Arc<dyn Timer>) -> AsyncSeq<Vec<T>> {
        buffer_with_config(self.into_seq(), config, timer)
    }

    // ---- sharing and parallelism ----

    fn cache(self) -> AsyncSeq<T>
    where
        T: Clone + Sync,
    {
        cache(self.into_seq())
    }

    fn map_async_parallel<U, F, Fut>(self, f: F, pool: Arc<dyn WorkerPool>, config: ParallelConfig) -> AsyncSeq<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = U> + Send + 'static,
    {
        map_async_parallel(self.into_seq(), f, pool, config)
    }

    fn try_map_async_parallel<U, F, Fut>(self, f: F, pool: Arc<dyn WorkerPool>, config: ParallelConfig) -> AsyncSeq<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SeqResult<U>> + Send + 'static,
    {
        try_map_async_parallel(self.into_seq(), f, pool, config)
    }

    fn map_async_unordered<U, F, Fut>(self, f: F, pool: Arc<dyn WorkerPool>, config: ParallelConfig) -> AsyncSeq<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SeqResult<U>> + Send + 'static,
    {
        map_async_unordered(self.into_seq(), f, pool, config)
    }

    fn group_by<K, F>(self, key_fn: F) -> AsyncSeq<(K, AsyncSeq<T>)>
    where
        T: Clone + Sync,
        K: Clone + Eq + Hash + Send + Sync + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        group_by(self.into_seq(), key_fn)
    }

    fn group_by_async<K, F, Fut>(self, key_fn: F) -> AsyncSeq<(K, AsyncSeq<T>)>
    where
        T: Clone + Sync,
        K: Clone + Eq + Hash + Send + Sync + 'static,
        F: Fn(&T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = K> + Send + 'static,
    {
        group_by_async(self.into_seq(), key_fn)
    }

    // ---- terminals ----

    fn to_vec(&self) -> impl Future<Output = SeqResult<Vec<T>>> {
        sequential::to_vec(self.seq_ref())
    }

    fn fold<A, F>(&self, init: A, f: F) -> impl Future<Output = SeqResult<A>>
    where
        F: FnMut(A, T) -> A,
    {
        sequential::fold(self.seq_ref(), init, f)
    }

    fn reduce<F>(&self, f: F) -> impl Future<Output = SeqResult<T>>
    where
        F: FnMut(T, T) -> T,
    {
        sequential::reduce(self.seq_ref(), f)
    }

    fn length(&self) -> impl Future<Output = SeqResult<u64>> {
        sequential::length(self.seq_ref())
    }

    fn first(&self) -> impl Future<Output = SeqResult<T>> {
        sequential::first(self.seq_ref())
    }

    fn last(&self) -> impl Future<Output = SeqResult<T>> {
        sequential::last(self.seq_ref())
    }

    fn iter_async_parallel<F, Fut>(
        &self,
        f: F,
        pool: Arc<dyn WorkerPool>,
        config: ParallelConfig,
    ) -> impl Future<Output = SeqResult<()>>
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        iter_async_parallel(self.seq_ref(), f, pool, config)
    }
}

impl<T> AsyncSeqExt<T> for AsyncSeq<T>
where
    T: Send + 'static,
{
    fn into_seq(self) -> AsyncSeq<T> {
        self
    }

    fn seq_ref(&self) -> &AsyncSeq<T> {
        self
    }
}
