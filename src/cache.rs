//! Single-evaluation caching
//!
//! [`cache`] turns a cold sequence into a shared one. The upstream is
//! enumerated at most once; every value and the terminal outcome are appended
//! to a log that any number of enumerations replay from their own position.
//!
//! Two locks keep this consistent:
//!
//! - the log sits behind a read-write lock (one writer, many readers), so
//!   consumers that are behind the tail never wait on the upstream;
//! - the upstream enumerator sits behind a mutex, and only the holder of that
//!   mutex may advance it, so exactly one upstream advance is ever in flight.
//!
//! A consumer at the tail takes the producer mutex, re-checks the log (another
//! consumer may have produced in the meantime) and only then advances the
//! upstream. Abandoning a consumer mid-advance is harmless: the advance is
//! cancel-safe and the next consumer to reach the tail picks it up again.

use async_stream::try_stream;
use futures_util::stream::StreamExt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::enumerator::{AsyncSeq, Enumerator, Step};
use crate::error::SeqResult;

struct CacheLog<T> {
    items: Vec<T>,
    outcome: Option<SeqResult<()>>,
}

enum Producer<T> {
    Idle,
    Running(Enumerator<T>),
    Done,
}

enum Slot<T> {
    Item(T),
    Tail,
    End,
}

struct CacheState<T> {
    source: AsyncSeq<T>,
    log: RwLock<CacheLog<T>>,
    producer: Mutex<Producer<T>>,
}

impl<T> CacheState<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn new(source: AsyncSeq<T>) -> Self {
        Self {
            source,
            log: RwLock::new(CacheLog {
                items: Vec::new(),
                outcome: None,
            }),
            producer: Mutex::new(Producer::Idle),
        }
    }

    async fn read_at(&self, position: usize) -> SeqResult<Slot<T>> {
        let log = self.log.read().await;
        if let Some(item) = log.items.get(position) {
            return Ok(Slot::Item(item.clone()));
        }
        match &log.outcome {
            Some(Ok(())) => Ok(Slot::End),
            Some(Err(err)) => Err(err.clone()),
            None => Ok(Slot::Tail),
        }
    }

    fn caught_up(log: &CacheLog<T>, position: usize) -> bool {
        log.items.len() <= position && log.outcome.is_none()
    }

    /// Advance the upstream once, unless someone already produced past `position`
    async fn produce(&self, position: usize) {
        let mut producer = self.producer.lock().await;
        if !Self::caught_up(&*self.log.read().await, position) {
            return;
        }

        if let Producer::Idle = *producer {
            log::debug!("cache: starting upstream evaluation");
            *producer = Producer::Running(self.source.enumerate());
        }
        let step = match &mut *producer {
            Producer::Running(upstream) => upstream.advance().await,
            // Done always comes with a recorded outcome, checked above.
            Producer::Idle | Producer::Done => return,
        };

        let mut log = self.log.write().await;
        match step {
            Ok(Step::Value(item)) => log.items.push(item),
            Ok(Step::End) => {
                log::debug!("cache: upstream ended after {} items", log.items.len());
                log.outcome = Some(Ok(()));
                *producer = Producer::Done;
            }
            Err(err) => {
                log::debug!("cache: upstream failed after {} items: {}", log.items.len(), err);
                log.outcome = Some(Err(err));
                *producer = Producer::Done;
            }
        }
    }
}

/// Share one evaluation of `source` between every enumeration
///
/// All enumerations, concurrent or later, see the same values and the same
/// terminal outcome, and the upstream's side effects run once.
pub fn cache<T>(source: AsyncSeq<T>) -> AsyncSeq<T>
where
    T: Clone + Send + Sync + 'static,
{
    let state = Arc::new(CacheState::new(source));
    AsyncSeq::new(move || {
        let state = Arc::clone(&state);
        try_stream! {
            let mut position = 0usize;
            loop {
                match state.read_at(position).await? {
                    Slot::Item(item) => {
                        position += 1;
                        yield item;
                    }
                    Slot::Tail => state.produce(position).await,
                    Slot::End => break,
                }
            }
        }
        .boxed()
    })
}
