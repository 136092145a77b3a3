use std::{error::Error, thread, time::Duration};

use tokio::sync::mpsc;

use crate::sync::{join_timeout, ReceiveTimeoutError, TimeoutReceiver};

#[tokio::test]
async fn test_recv_timeout() -> Result<(), Box<dyn Error>> {
    let (tx, mut rx) = mpsc::channel(1);

    let result = rx.recv_timeout(Duration::from_millis(10)).await;
    assert!(matches!(result, Err(ReceiveTimeoutError::Timeout)));

    tx.send(42).await?;
    assert_eq!(rx.recv_timeout(Duration::from_millis(10)).await?, 42);

    drop(tx);
    let result = rx.recv_timeout(Duration::from_secs(1)).await;
    assert!(matches!(result, Err(ReceiveTimeoutError::Closed)));

    Ok(())
}

#[test]
fn test_blocking_recv_timeout() -> Result<(), Box<dyn Error>> {
    let (tx, mut rx) = mpsc::channel(1);

    let result = rx.blocking_recv_timeout(Duration::from_millis(10));
    assert!(matches!(result, Err(ReceiveTimeoutError::Timeout)));

    let sender = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        tx.blocking_send("ack")
    });
    assert_eq!(rx.blocking_recv_timeout(Duration::from_secs(5))?, "ack");
    sender.join().map_err(|_| "sender panicked")??;

    let result = rx.blocking_recv_timeout(Duration::from_secs(5));
    assert!(matches!(result, Err(ReceiveTimeoutError::Closed)));

    Ok(())
}

#[test]
fn test_join_timeout() {
    let handle = thread::spawn(|| 7);
    assert_eq!(join_timeout(handle, Duration::from_secs(1)).ok(), Some(7));

    let handle = thread::spawn(|| thread::sleep(Duration::from_millis(300)));
    let Err((error, Some(handle))) = join_timeout(handle, Duration::from_millis(20)) else {
        panic!("expected the join to time out");
    };
    assert!(matches!(error, ReceiveTimeoutError::Timeout));
    // The handle can still be joined later
    assert!(join_timeout(handle, Duration::from_secs(5)).is_ok());

    let handle = thread::spawn(|| panic!("worker failed"));
    let result = join_timeout(handle, Duration::from_secs(1));
    assert!(matches!(result, Err((ReceiveTimeoutError::Closed, None))));
}
