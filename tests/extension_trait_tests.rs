use aseq::constructors::{from_iter, init_infinite};
use aseq::{AsyncSeqExt, ParallelConfig, SeqError, Step, TokioTimer, TokioWorkerPool};
use either::Either;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_method_chain() {
    let result = init_infinite(|i| i as i64)
        .filter(|x| x % 2 == 1)
        .map(|x| x * 10)
        .skip(1)
        .take(3)
        .scan(0, |acc, x| acc + x)
        .to_vec()
        .await;
    assert_eq!(result, Ok(vec![30, 80, 150]));
}

#[tokio::test]
async fn test_fan_in_methods() {
    let zipped = from_iter(vec![1, 2, 3]).zip(from_iter(vec!["a", "b"])).to_vec().await;
    assert_eq!(zipped, Ok(vec![(1, "a"), (2, "b")]));

    let tagged = from_iter(vec![1]).interleave_choice(from_iter(vec!['z'])).to_vec().await;
    assert_eq!(tagged, Ok(vec![Either::Left(1), Either::Right('z')]));

    let total = from_iter(vec![1, 2]).merge(from_iter(vec![3])).fold(0, |a, b| a + b).await;
    assert_eq!(total, Ok(6));
}

#[tokio::test]
async fn test_terminal_methods() {
    let seq = from_iter(vec![4, 8, 15]);
    assert_eq!(seq.length().await, Ok(3));
    assert_eq!(seq.first().await, Ok(4));
    assert_eq!(seq.last().await, Ok(15));
    assert_eq!(seq.reduce(|a, b| a + b).await, Ok(27));
    assert_eq!(from_iter(Vec::<i32>::new()).first().await, Err(SeqError::Empty));
}

#[tokio::test(start_paused = true)]
async fn test_buffering_and_parallel_methods() {
    let groups = from_iter(vec![1, 2, 3])
        .buffer_by_count_and_time(2, Duration::from_millis(50), Arc::new(TokioTimer))
        .to_vec()
        .await;
    assert_eq!(groups, Ok(vec![vec![1, 2], vec![3]]));

    let squares = from_iter(vec![1u32, 2, 3])
        .map_async_parallel(
            |x| async move { x * x },
            Arc::new(TokioWorkerPool::new(2)),
            ParallelConfig::new().max_in_flight(2),
        )
        .to_vec()
        .await;
    assert_eq!(squares, Ok(vec![1, 4, 9]));
}

#[tokio::test]
async fn test_cache_and_group_methods() {
    let cached = from_iter(vec![("x", 1), ("y", 2), ("x", 3)]).cache();
    let mut parent = cached.clone().group_by(|pair: &(&'static str, i32)| pair.0).enumerate();
    let mut keys = Vec::new();
    while let Ok(Step::Value((key, _))) = parent.advance().await {
        keys.push(key);
    }
    assert_eq!(keys, vec!["x", "y"]);
    assert_eq!(cached.length().await, Ok(3));
}
