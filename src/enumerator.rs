//! The enumerator protocol
//!
//! An [`AsyncSeq`] is a cold factory: every call to [`AsyncSeq::enumerate`]
//! produces a fresh [`Enumerator`] that re-runs the sequence from scratch.
//! Enumerators are single-owner cursors with two operations:
//!
//! - [`Enumerator::advance`] resolves to a [`Step::Value`], [`Step::End`] or a
//!   [`SeqError`]. End and failure are terminal and sticky.
//! - [`Enumerator::dispose`] releases everything the enumerator holds. It is
//!   idempotent and is also run on drop, so abandoning an enumerator at any
//!   point (including mid-advance) releases its upstreams.
//!
//! Internally each enumerator owns a boxed generator. Generators own the
//! enumerators of their upstreams, so dropping one tears down the whole chain
//! synchronously.

use futures_core::stream::{FusedStream, Stream};
use futures_util::stream::{BoxStream, StreamExt};
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::error::{SeqError, SeqResult};

/// The boxed generator that backs an enumerator
pub type SeqStream<T> = BoxStream<'static, SeqResult<T>>;

/// Outcome of a successful advance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    /// The sequence produced a value and may continue
    Value(T),
    /// The sequence is exhausted
    End,
}

impl<T> Step<T> {
    pub fn is_end(&self) -> bool {
        matches!(self, Step::End)
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Step::Value(v) => Some(v),
            Step::End => None,
        }
    }

    pub fn map<U, F>(self, f: F) -> Step<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Step::Value(v) => Step::Value(f(v)),
            Step::End => Step::End,
        }
    }
}

impl<T> From<Option<T>> for Step<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Step::Value(v),
            None => Step::End,
        }
    }
}

/// A cold, restartable asynchronous sequence
pub struct AsyncSeq<T> {
    factory: Arc<dyn Fn() -> SeqStream<T> + Send + Sync + 'static>,
}

impl<T> Clone for AsyncSeq<T> {
    fn clone(&self) -> Self {
        AsyncSeq {
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<T> fmt::Debug for AsyncSeq<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncSeq").finish_non_exhaustive()
    }
}

impl<T> AsyncSeq<T>
where
    T: Send + 'static,
{
    /// Create a sequence from a generator factory
    ///
    /// The factory is called once per enumeration and must return a fresh
    /// generator each time.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> SeqStream<T> + Send + Sync + 'static,
    {
        AsyncSeq {
            factory: Arc::new(factory),
        }
    }

    /// Create a sequence from a factory of any `Stream` of results
    pub fn from_stream_fn<F, S>(factory: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: Stream<Item = SeqResult<T>> + Send + 'static,
    {
        AsyncSeq::new(move || factory().boxed())
    }

    /// Obtain a fresh, independent enumerator
    pub fn enumerate(&self) -> Enumerator<T> {
        Enumerator::new((self.factory)())
    }

    /// Enumerate once and expose the enumerator as a boxed stream
    pub fn into_stream(self) -> SeqStream<T> {
        self.enumerate().boxed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumeratorState {
    Active,
    Finished,
    Disposed,
}

/// A single-owner cursor over one run of an [`AsyncSeq`]
pub struct Enumerator<T> {
    inner: Option<SeqStream<T>>,
    state: EnumeratorState,
}

impl<T> Enumerator<T> {
    /// Wrap a generator as an enumerator
    pub fn new(stream: SeqStream<T>) -> Self {
        Enumerator {
            inner: Some(stream),
            state: EnumeratorState::Active,
        }
    }

    /// Advance to the next step
    ///
    /// After `End` or a failure every further call returns `End`. Advancing a
    /// disposed enumerator returns [`SeqError::Disposed`].
    pub async fn advance(&mut self) -> SeqResult<Step<T>> {
        match self.state {
            EnumeratorState::Disposed => return Err(SeqError::Disposed),
            EnumeratorState::Finished => return Ok(Step::End),
            EnumeratorState::Active => {}
        }
        match self.next().await {
            Some(Ok(value)) => Ok(Step::Value(value)),
            Some(Err(err)) => Err(err),
            None => Ok(Step::End),
        }
    }

    /// Release the generator and everything it owns. Idempotent.
    pub fn dispose(&mut self) {
        if self.state == EnumeratorState::Disposed {
            return;
        }
        if self.inner.take().is_some() {
            log::trace!("disposing active enumerator");
        }
        self.state = EnumeratorState::Disposed;
    }

    /// True once End or a failure has been observed
    pub fn is_finished(&self) -> bool {
        self.state == EnumeratorState::Finished
    }

    pub fn is_disposed(&self) -> bool {
        self.state == EnumeratorState::Disposed
    }

    // Terminal outcome reached: release upstreams right away.
    fn finish(&mut self) {
        self.inner = None;
        if self.state == EnumeratorState::Active {
            self.state = EnumeratorState::Finished;
        }
    }
}

impl<T> Stream for Enumerator<T> {
    type Item = SeqResult<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };
        match inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(value))) => Poll::Ready(Some(Ok(value))),
            Poll::Ready(Some(Err(err))) => {
                this.finish();
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.finish();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> FusedStream for Enumerator<T> {
    fn is_terminated(&self) -> bool {
        self.inner.is_none()
    }
}

impl<T> Drop for Enumerator<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T> fmt::Debug for Enumerator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enumerator")
            .field("state", &self.state)
            .finish()
    }
}
