use aseq::sequential::{take, to_vec};
use aseq::{SeqError, Source, SourceState, Step};
use std::time::Duration;

#[tokio::test]
async fn test_subscribers_see_only_later_puts() {
    let source = Source::new();
    source.put(1);

    let mut early = source.subscribe();
    source.put(2);
    let mut late = source.subscribe();
    source.put(3);
    source.close();

    assert_eq!(early.advance().await, Ok(Step::Value(2)));
    assert_eq!(early.advance().await, Ok(Step::Value(3)));
    assert_eq!(early.advance().await, Ok(Step::End));

    assert_eq!(late.advance().await, Ok(Step::Value(3)));
    assert_eq!(late.advance().await, Ok(Step::End));
}

#[tokio::test]
async fn test_put_wakes_pending_subscriber() {
    let source = Source::new();
    let mut subscription = source.subscribe();

    let producer = source.clone();
    let handle = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        producer.put("hello");
        producer.close();
    });

    assert_eq!(subscription.advance().await, Ok(Step::Value("hello")));
    assert_eq!(subscription.advance().await, Ok(Step::End));
    handle.await.unwrap();
}

#[tokio::test]
async fn test_error_is_broadcast_and_sticky() {
    let source = Source::new();
    let mut a = source.subscribe();
    let mut b = source.subscribe();

    source.put(7);
    source.error(SeqError::custom("feed lost"));
    // First terminal signal wins
    source.close();
    source.put(8);

    for e in [&mut a, &mut b] {
        assert_eq!(e.advance().await, Ok(Step::Value(7)));
        assert_eq!(e.advance().await, Err(SeqError::custom("feed lost")));
        assert_eq!(e.advance().await, Ok(Step::End));
    }
    assert_eq!(source.state(), SourceState::Errored(SeqError::custom("feed lost")));
}

#[tokio::test]
async fn test_subscribing_after_termination() {
    let closed: Source<i32> = Source::new();
    closed.close();
    assert!(closed.is_terminated());
    assert_eq!(to_vec(&closed.as_seq()).await, Ok(vec![]));

    let failed: Source<i32> = Source::new();
    failed.error(SeqError::custom("gone"));
    let mut e = failed.subscribe();
    assert_eq!(e.advance().await, Err(SeqError::custom("gone")));
}

#[tokio::test]
async fn test_as_seq_subscribes_per_enumeration() {
    let source = Source::new();
    let seq = source.as_seq();
    assert_eq!(source.subscriber_count(), 0);

    let mut first = seq.enumerate();
    let mut second = seq.enumerate();
    assert_eq!(source.subscriber_count(), 2);

    source.put(1);
    assert_eq!(first.advance().await, Ok(Step::Value(1)));
    assert_eq!(second.advance().await, Ok(Step::Value(1)));
}

#[tokio::test]
async fn test_disposed_subscriptions_are_pruned_on_put() {
    let source = Source::new();
    let keep = source.subscribe();
    let gone = source.subscribe();
    drop(gone);
    assert_eq!(source.subscriber_count(), 2);

    source.put(1);
    assert_eq!(source.subscriber_count(), 1);
    drop(keep);

    let stats = source.stats();
    assert_eq!(stats.puts, 1);
    assert_eq!(stats.state, SourceState::Open);
    assert!(stats.to_string().contains("1 puts"));
}

#[tokio::test]
async fn test_combinators_over_a_source() {
    let source = Source::new();
    let firsts = take(source.as_seq(), 2);

    let producer = source.clone();
    let feeder = tokio::spawn(async move {
        for i in 0..5 {
            tokio::time::sleep(Duration::from_millis(1)).await;
            producer.put(i);
        }
    });

    // Subscription happens when to_vec enumerates, before the first put lands
    let collected = to_vec(&firsts).await;
    feeder.await.unwrap();
    assert_eq!(collected, Ok(vec![0, 1]));
}
