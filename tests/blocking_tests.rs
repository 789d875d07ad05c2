mod common;

use aseq::constructors::{from_iter, init_infinite};
use aseq::sequential::take;
use aseq::parallel::map_async_parallel;
use aseq::{to_blocking_iter, ParallelConfig, SeqError, TokioWorkerPool};
use common::{delayed, failing_after, tracked};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

#[test]
fn test_blocking_drain_in_order() {
    let rt = Runtime::new().unwrap();
    let seq = from_iter(vec![1, 2, 3]);
    let drained: Vec<_> = to_blocking_iter(&seq, rt.handle().clone()).collect();
    assert_eq!(drained, vec![Ok(1), Ok(2), Ok(3)]);
}

#[test]
fn test_blocking_drain_with_timers() {
    let rt = Runtime::new().unwrap();
    let seq = delayed(vec!["a", "b"], Duration::from_millis(5));
    let drained: Result<Vec<_>, SeqError> = to_blocking_iter(&seq, rt.handle().clone()).collect();
    assert_eq!(drained, Ok(vec!["a", "b"]));
}

#[test]
fn test_blocking_failure_is_yielded_once() {
    let rt = Runtime::new().unwrap();
    let seq = failing_after(vec![1], "blocked failure");
    let mut iter = to_blocking_iter(&seq, rt.handle().clone());
    assert_eq!(iter.next(), Some(Ok(1)));
    assert_eq!(iter.next(), Some(Err(SeqError::upstream("blocked failure"))));
    assert_eq!(iter.next(), None);
}

#[test]
fn test_dropping_blocking_iter_disposes_sequence() {
    let rt = Runtime::new().unwrap();
    let (seq, probe) = tracked(init_infinite(|i| i));
    let firsts: Vec<_> = to_blocking_iter(&seq, rt.handle().clone())
        .take(3)
        .map(Result::unwrap)
        .collect();
    assert_eq!(firsts, vec![0, 1, 2]);
    assert_eq!(probe.disposed(), 1);

    let limited = take(seq, 2);
    assert_eq!(to_blocking_iter(&limited, rt.handle().clone()).count(), 2);
}

#[test]
fn test_blocking_drain_of_parallel_map() {
    let rt = Runtime::new().unwrap();
    let squares = map_async_parallel(
        from_iter(vec![1u32, 2, 3]),
        |x| async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            x * x
        },
        Arc::new(TokioWorkerPool::new(2)),
        ParallelConfig::new().max_in_flight(2),
    );
    let drained: Result<Vec<_>, SeqError> = to_blocking_iter(&squares, rt.handle().clone()).collect();
    assert_eq!(drained, Ok(vec![1, 4, 9]));
}

#[test]
fn test_current_thread_handle_is_rejected() {
    let rt = Builder::new_current_thread().enable_all().build().unwrap();
    let (seq, probe) = tracked(delayed(vec![1, 2], Duration::from_millis(5)));

    let mut iter = to_blocking_iter(&seq, rt.handle().clone());
    assert!(matches!(iter.next(), Some(Err(SeqError::InvalidArgument(_)))));
    assert_eq!(iter.next(), None);
    assert_eq!(probe.pulled(), 0);

    drop(iter);
    assert_eq!(probe.disposed(), 1);
}
