//! Integration tests for the core-async facade.

use core_async::sync::{mpsc, watch, CancellationToken, Mutex};
use core_async::{task, time};
use std::sync::Arc;

#[tokio::test]
async fn test_task_spawn() {
    let handle = task::spawn(async { 42 });
    assert_eq!(handle.await.unwrap(), 42);
}

#[tokio::test]
async fn test_aborted_task_reports_cancellation() {
    let handle = task::spawn(async {
        time::sleep(time::Duration::from_secs(60)).await;
    });
    handle.abort();
    let err = handle.await.unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_timeout_failure() {
    let result = time::timeout(time::Duration::from_millis(10), async {
        time::sleep(time::Duration::from_millis(200)).await;
    })
    .await;
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_token_interrupts_sleep() {
    let token = CancellationToken::new();
    let child = token.child_token();

    let handle = task::spawn(async move {
        tokio::select! {
            _ = child.cancelled() => true,
            _ = time::sleep(time::Duration::from_secs(3600)) => false,
        }
    });

    token.cancel();
    assert!(handle.await.unwrap());
}

#[tokio::test]
async fn test_watch_channel_delivers_latest_snapshot() {
    let (tx, mut rx) = watch::channel(0u32);
    tx.send_replace(1);
    tx.send_replace(2);
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), 2);
}

#[tokio::test]
async fn test_mpsc_preserves_order() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    for i in 0..5 {
        tx.send(i).unwrap();
    }
    drop(tx);

    let mut seen = Vec::new();
    while let Some(v) = rx.recv().await {
        seen.push(v);
    }
    assert_eq!(seen, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_mutex_serializes_writers() {
    let counter = Arc::new(Mutex::new(0));
    let mut handles = Vec::new();
    for _ in 0..10 {
        let counter = Arc::clone(&counter);
        handles.push(task::spawn(async move {
            let mut guard = counter.lock().await;
            *guard += 1;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(*counter.lock().await, 10);
}

#[test]
fn test_block_on_outside_runtime() {
    let value = core_async::runtime::block_on(async { 7 });
    assert_eq!(value, 7);
}
