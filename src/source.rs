//! Hot broadcast source
//!
//! A [`Source`] is pushed to from outside (`put`, `close`, `error`) and read
//! through subscriptions. Every subscription sees the puts made after it was
//! created, in order, followed by the terminal signal. Nothing is replayed to
//! late subscribers except the terminal state itself.

use futures_util::future;
use futures_util::stream::{self, StreamExt};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::enumerator::{AsyncSeq, Enumerator, SeqStream};
use crate::error::{SeqError, SeqResult};

/// Lifecycle of a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceState {
    Open,
    Closed,
    Errored(SeqError),
}

// Subscriber registration and broadcast share one lock, so a subscription is
// either registered before a put (and sees it) or after (and does not).
struct SourceInner<T> {
    subscribers: Vec<mpsc::UnboundedSender<SeqResult<T>>>,
    state: SourceState,
    puts: u64,
}

/// Multicast point for externally produced values
pub struct Source<T> {
    inner: Arc<Mutex<SourceInner<T>>>,
}

impl<T> Clone for Source<T> {
    fn clone(&self) -> Self {
        Source {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Source<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Source<T>
where
    T: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Source {
            inner: Arc::new(Mutex::new(SourceInner {
                subscribers: Vec::new(),
                state: SourceState::Open,
                puts: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SourceInner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver `item` to every live subscription. No-op once terminated.
    pub fn put(&self, item: T) {
        let mut inner = self.lock();
        if inner.state != SourceState::Open {
            log::warn!("source: put ignored after termination");
            return;
        }
        inner.puts += 1;
        // Subscriptions whose consumers are gone are pruned here.
        inner
            .subscribers
            .retain(|subscriber| subscriber.send(Ok(item.clone())).is_ok());
    }

    /// End every live and future subscription. First terminal signal wins.
    pub fn close(&self) {
        let mut inner = self.lock();
        if inner.state != SourceState::Open {
            return;
        }
        log::debug!("source: closing {} subscriptions", inner.subscribers.len());
        inner.state = SourceState::Closed;
        inner.subscribers.clear();
    }

    /// Fail every live and future subscription with `err`. First terminal signal wins.
    pub fn error(&self, err: SeqError) {
        let mut inner = self.lock();
        if inner.state != SourceState::Open {
            return;
        }
        log::debug!("source: failing {} subscriptions: {}", inner.subscribers.len(), err);
        for subscriber in inner.subscribers.drain(..) {
            let _ = subscriber.send(Err(err.clone()));
        }
        inner.state = SourceState::Errored(err);
    }

    /// Subscribe now; the enumerator sees only puts made from here on
    pub fn subscribe(&self) -> Enumerator<T> {
        Enumerator::new(self.subscription())
    }

    /// A sequence that subscribes afresh on every enumeration
    pub fn as_seq(&self) -> AsyncSeq<T> {
        let source = self.clone();
        AsyncSeq::new(move || source.subscription())
    }

    fn subscription(&self) -> SeqStream<T> {
        let mut inner = self.lock();
        match &inner.state {
            SourceState::Closed => stream::empty().boxed(),
            SourceState::Errored(err) => stream::once(future::ready(Err(err.clone()))).boxed(),
            SourceState::Open => {
                let (tx, rx) = mpsc::unbounded_channel();
                inner.subscribers.push(tx);
                UnboundedReceiverStream::new(rx).boxed()
            }
        }
    }

    /// Number of registered subscriptions (disposed ones linger until the next put)
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    pub fn is_terminated(&self) -> bool {
        self.lock().state != SourceState::Open
    }

    pub fn state(&self) -> SourceState {
        self.lock().state.clone()
    }

    /// Snapshot for monitoring
    pub fn stats(&self) -> SourceStats {
        let inner = self.lock();
        SourceStats {
            subscribers: inner.subscribers.len(),
            puts: inner.puts,
            state: inner.state.clone(),
        }
    }
}

/// Source statistics for monitoring and debugging
#[derive(Debug, Clone)]
pub struct SourceStats {
    pub subscribers: usize,
    pub puts: u64,
    pub state: SourceState,
}

impl fmt::Display for SourceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            SourceState::Open => "open".to_string(),
            SourceState::Closed => "closed".to_string(),
            SourceState::Errored(err) => format!("errored: {}", err),
        };
        write!(
            f,
            "Source({} subscribers, {} puts, {})",
            self.subscribers, self.puts, state
        )
    }
}

impl<T> fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Source")
            .field("subscribers", &inner.subscribers.len())
            .field("puts", &inner.puts)
            .field("state", &inner.state)
            .finish()
    }
}
