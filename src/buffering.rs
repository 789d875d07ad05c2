//! Count- and time-windowed buffering
//!
//! Time-driven variants race the next upstream advance against a timer from
//! the injected [`Timer`]. The timer is re-armed after every flush and after
//! every idle tick. An idle tick on an empty group emits nothing, so these
//! combinators never produce an empty group. When a value and a tick are
//! ready together the tick is handled first, so a busy upstream cannot starve
//! the timer.

use async_stream::try_stream;
use futures_util::stream::StreamExt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::BufferConfig;
use crate::constructors::fail;
use crate::enumerator::{AsyncSeq, Step};
use crate::error::{SeqError, SeqResult};
use crate::runtime::Timer;

// What woke a time-windowed buffer.
enum Wake<T> {
    Item(SeqResult<Step<T>>),
    Tick,
}

/// Group values into vectors of `size`; the last group may be shorter
///
/// # Examples
/// ```
/// use aseq::buffering::buffer_by_count;
/// use aseq::constructors::from_iter;
/// use aseq::sequential::to_vec;
///
/// # async fn example() {
/// let groups = buffer_by_count(from_iter(vec![1, 2, 3, 4, 5]), 2);
/// assert_eq!(to_vec(&groups).await, Ok(vec![vec![1, 2], vec![3, 4], vec![5]]));
/// # }
/// ```
pub fn buffer_by_count<T>(source: AsyncSeq<T>, size: usize) -> AsyncSeq<Vec<T>>
where
    T: Send + 'static,
{
    if size == 0 {
        return fail(zero_size());
    }
    AsyncSeq::new(move || {
        let mut e = source.enumerate();
        try_stream! {
            let mut group = Vec::with_capacity(size);
            while let Step::Value(item) = e.advance().await? {
                group.push(item);
                if group.len() == size {
                    yield std::mem::replace(&mut group, Vec::with_capacity(size));
                }
            }
            if !group.is_empty() {
                yield group;
            }
        }
        .boxed()
    })
}

/// Group values by count, also flushing a partial group when `timeout` elapses
///
/// Whichever comes first, a full group or the timeout, triggers the flush,
/// and the timer restarts after each flush.
pub fn buffer_by_count_and_time<T>(
    source: AsyncSeq<T>,
    size: usize,
    timeout: Duration,
    timer: Arc<dyn Timer>,
) -> AsyncSeq<Vec<T>>
where
    T: Send + 'static,
{
    if size == 0 {
        return fail(zero_size());
    }
    windowed(source, Some(size), timeout, timer)
}

/// Flush whatever has accumulated every `timeout`; never emits empty groups
pub fn buffer_by_time<T>(source: AsyncSeq<T>, timeout: Duration, timer: Arc<dyn Timer>) -> AsyncSeq<Vec<T>>
where
    T: Send + 'static,
{
    windowed(source, None, timeout, timer)
}

/// Buffer according to a [`BufferConfig`]
pub fn buffer_with_config<T>(source: AsyncSeq<T>, config: BufferConfig, timer: Arc<dyn Timer>) -> AsyncSeq<Vec<T>>
where
    T: Send + 'static,
{
    match config.timeout {
        Some(timeout) => buffer_by_count_and_time(source, config.max_items, timeout, timer),
        None => buffer_by_count(source, config.max_items),
    }
}

fn zero_size() -> SeqError {
    SeqError::InvalidArgument("buffer size must be greater than zero".to_string())
}

fn windowed<T>(
    source: AsyncSeq<T>,
    size: Option<usize>,
    timeout: Duration,
    timer: Arc<dyn Timer>,
) -> AsyncSeq<Vec<T>>
where
    T: Send + 'static,
{
    AsyncSeq::new(move || {
        let mut e = source.enumerate();
        let timer = Arc::clone(&timer);
        try_stream! {
            let mut group = Vec::new();
            let mut deadline = timer.sleep(timeout);
            loop {
                let wake = tokio::select! {
                    biased;
                    _ = &mut deadline => Wake::Tick,
                    next = e.advance() => Wake::Item(next),
                };
                match wake {
                    Wake::Item(next) => match next? {
                        Step::Value(item) => {
                            group.push(item);
                            if size.is_some_and(|size| group.len() >= size) {
                                yield std::mem::take(&mut group);
                                deadline = timer.sleep(timeout);
                            }
                        }
                        Step::End => {
                            if !group.is_empty() {
                                yield std::mem::take(&mut group);
                            }
                            break;
                        }
                    },
                    Wake::Tick => {
                        if !group.is_empty() {
                            yield std::mem::take(&mut group);
                        }
                        deadline = timer.sleep(timeout);
                    }
                }
            }
        }
        .boxed()
    })
}
