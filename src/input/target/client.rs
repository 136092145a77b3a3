use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::{
    channel,
    error::SendError,
    Receiver, Sender,
};

use crate::{
    drivers::digitizer::{DigitizerError, DigitizerState},
    protocol::ButtonId,
    sync::{ReceiveTimeoutError, TimeoutReceiver},
};

use super::command::TargetCommand;

/// Default time to wait for the device to acknowledge a command. Long enough
/// to cover a click hold.
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Possible errors for a digitizer client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("failed to send command to device")]
    SendError(SendError<TargetCommand>),
    #[error("device no longer exists")]
    ChannelClosed,
    #[error("timed out waiting for device")]
    Timeout,
    #[error(transparent)]
    Device(#[from] DigitizerError),
}

impl From<SendError<TargetCommand>> for ClientError {
    fn from(err: SendError<TargetCommand>) -> Self {
        Self::SendError(err)
    }
}

impl From<ReceiveTimeoutError> for ClientError {
    fn from(err: ReceiveTimeoutError) -> Self {
        match err {
            ReceiveTimeoutError::Timeout => Self::Timeout,
            ReceiveTimeoutError::Closed => Self::ChannelClosed,
        }
    }
}

/// A client for communicating with a digitizer device. Cloned handles can be
/// used from the serial command loop and the capture loop at the same time;
/// the device executes their commands one at a time.
///
/// The `blocking_*` methods must not be called from an async context.
#[derive(Debug, Clone)]
pub struct DigitizerClient {
    tx: Sender<TargetCommand>,
    reply_timeout: Duration,
}

impl From<Sender<TargetCommand>> for DigitizerClient {
    fn from(tx: Sender<TargetCommand>) -> Self {
        DigitizerClient::new(tx)
    }
}

impl DigitizerClient {
    /// Create a new [DigitizerClient] from the given channel
    pub fn new(tx: Sender<TargetCommand>) -> Self {
        Self {
            tx,
            reply_timeout: REPLY_TIMEOUT,
        }
    }

    /// Change how long to wait for each acknowledgement
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// Move the cursor to the given absolute position
    pub async fn move_to(&self, x: u16, y: u16) -> Result<(), ClientError> {
        let (tx, rx) = channel(1);
        self.tx.send(TargetCommand::Move(x, y, tx)).await?;
        self.wait(rx).await
    }

    /// Press and release the given button at the current position
    pub async fn click(&self, button: ButtonId) -> Result<(), ClientError> {
        let (tx, rx) = channel(1);
        self.tx.send(TargetCommand::Click(button, tx)).await?;
        self.wait(rx).await
    }

    /// Release all buttons
    pub async fn release(&self) -> Result<(), ClientError> {
        let (tx, rx) = channel(1);
        self.tx.send(TargetCommand::Release(tx)).await?;
        self.wait(rx).await
    }

    /// Move to the origin and release all buttons
    pub async fn reset(&self) -> Result<(), ClientError> {
        let (tx, rx) = channel(1);
        self.tx.send(TargetCommand::Reset(tx)).await?;
        self.wait(rx).await
    }

    /// Returns the last state successfully written to the device
    pub async fn get_state(&self) -> Result<DigitizerState, ClientError> {
        let (tx, mut rx) = channel(1);
        self.tx.send(TargetCommand::GetState(tx)).await?;
        Ok(rx.recv_timeout(self.reply_timeout).await?)
    }

    /// Stop the device. It resets the digitizer before exiting.
    pub async fn stop(&self) -> Result<(), ClientError> {
        self.tx.send(TargetCommand::Stop).await?;
        Ok(())
    }

    async fn wait(&self, mut rx: Receiver<Result<(), DigitizerError>>) -> Result<(), ClientError> {
        rx.recv_timeout(self.reply_timeout).await??;
        Ok(())
    }

    pub fn blocking_move_to(&self, x: u16, y: u16) -> Result<(), ClientError> {
        let (tx, rx) = channel(1);
        self.tx.blocking_send(TargetCommand::Move(x, y, tx))?;
        self.blocking_wait(rx)
    }

    pub fn blocking_click(&self, button: ButtonId) -> Result<(), ClientError> {
        let (tx, rx) = channel(1);
        self.tx.blocking_send(TargetCommand::Click(button, tx))?;
        self.blocking_wait(rx)
    }

    /// Click a button by name. The device logs and ignores unknown names.
    pub fn blocking_click_named(&self, name: &str) -> Result<(), ClientError> {
        let (tx, rx) = channel(1);
        self.tx
            .blocking_send(TargetCommand::ClickNamed(name.to_string(), tx))?;
        self.blocking_wait(rx)
    }

    pub fn blocking_release(&self) -> Result<(), ClientError> {
        let (tx, rx) = channel(1);
        self.tx.blocking_send(TargetCommand::Release(tx))?;
        self.blocking_wait(rx)
    }

    pub fn blocking_reset(&self) -> Result<(), ClientError> {
        let (tx, rx) = channel(1);
        self.tx.blocking_send(TargetCommand::Reset(tx))?;
        self.blocking_wait(rx)
    }

    pub fn blocking_get_state(&self) -> Result<DigitizerState, ClientError> {
        let (tx, mut rx) = channel(1);
        self.tx.blocking_send(TargetCommand::GetState(tx))?;
        Ok(rx.blocking_recv_timeout(self.reply_timeout)?)
    }

    fn blocking_wait(&self, mut rx: Receiver<Result<(), DigitizerError>>) -> Result<(), ClientError> {
        rx.blocking_recv_timeout(self.reply_timeout)??;
        Ok(())
    }
}
