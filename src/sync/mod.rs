#[cfg(test)]
pub mod mod_test;

use std::{
    future::Future,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Interval used to poll a worker thread while waiting for it to exit
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(10);
/// Interval used to poll a channel from a blocking thread
const RECV_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Error, Debug)]
pub enum ReceiveTimeoutError {
    #[error("timed out waiting for message")]
    Timeout,
    #[error("channel closed")]
    Closed,
}

/// Channel receivers that can timeout when receiving messages
pub trait TimeoutReceiver<T> {
    fn recv_timeout(
        &mut self,
        timeout: Duration,
    ) -> impl Future<Output = Result<T, ReceiveTimeoutError>> + Send;

    /// Blocking variant for threads outside the async runtime
    fn blocking_recv_timeout(&mut self, timeout: Duration) -> Result<T, ReceiveTimeoutError>;
}

/// Wait up to `timeout` for the given thread to finish. On timeout the handle
/// is handed back so the caller can decide whether to keep waiting.
/// A worker that panicked is reported as [ReceiveTimeoutError::Closed].
pub fn join_timeout<T>(
    handle: JoinHandle<T>,
    timeout: Duration,
) -> Result<T, (ReceiveTimeoutError, Option<JoinHandle<T>>)> {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return Err((ReceiveTimeoutError::Timeout, Some(handle)));
        }
        thread::sleep(JOIN_POLL_INTERVAL);
    }
    handle
        .join()
        .map_err(|_| (ReceiveTimeoutError::Closed, None))
}

impl<T: Send> TimeoutReceiver<T> for mpsc::Receiver<T> {
    async fn recv_timeout(&mut self, timeout: Duration) -> Result<T, ReceiveTimeoutError> {
        tokio::time::timeout(timeout, self.recv())
            .await
            .map_err(|_| ReceiveTimeoutError::Timeout)?
            .ok_or(ReceiveTimeoutError::Closed)
    }

    fn blocking_recv_timeout(&mut self, timeout: Duration) -> Result<T, ReceiveTimeoutError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.try_recv() {
                Ok(value) => return Ok(value),
                Err(TryRecvError::Disconnected) => return Err(ReceiveTimeoutError::Closed),
                Err(TryRecvError::Empty) if Instant::now() >= deadline => {
                    return Err(ReceiveTimeoutError::Timeout)
                }
                Err(TryRecvError::Empty) => thread::sleep(RECV_POLL_INTERVAL),
            }
        }
    }
}
