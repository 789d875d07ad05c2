//! Blocking drain of a sequence from synchronous code

use tokio::runtime::{Handle, RuntimeFlavor};

use crate::enumerator::{AsyncSeq, Enumerator, Step};
use crate::error::{SeqError, SeqResult};

/// Iterator that blocks the calling thread on each advance
///
/// Must not be driven from inside the runtime it blocks on.
pub struct BlockingIter<T> {
    enumerator: Enumerator<T>,
    handle: Handle,
    rejected: Option<SeqError>,
    exhausted: bool,
}

/// Enumerate `source` and drain it synchronously on `handle`
///
/// A failure is yielded once as `Err`, after which the iterator is exhausted.
///
/// `handle` must belong to a multi-threaded runtime. A current-thread runtime
/// only drives its timers and spawned tasks from `Runtime::block_on`, so such
/// a handle is rejected: the first `next` yields
/// [`SeqError::InvalidArgument`] and nothing is pulled from `source`.
pub fn to_blocking_iter<T>(source: &AsyncSeq<T>, handle: Handle) -> BlockingIter<T>
where
    T: Send + 'static,
{
    let rejected = match handle.runtime_flavor() {
        RuntimeFlavor::CurrentThread => Some(SeqError::InvalidArgument(
            "to_blocking_iter needs a multi-threaded runtime handle".to_string(),
        )),
        _ => None,
    };
    let _guard = handle.enter();
    BlockingIter {
        enumerator: source.enumerate(),
        handle,
        exhausted: false,
        rejected,
    }
}

impl<T> Iterator for BlockingIter<T> {
    type Item = SeqResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        if let Some(err) = self.rejected.take() {
            self.exhausted = true;
            return Some(Err(err));
        }
        match self.handle.block_on(self.enumerator.advance()) {
            Ok(Step::Value(item)) => Some(Ok(item)),
            Ok(Step::End) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

impl<T> Drop for BlockingIter<T> {
    fn drop(&mut self) {
        // Upstream teardown may touch runtime resources such as timers.
        let _guard = self.handle.enter();
        self.enumerator.dispose();
    }
}
