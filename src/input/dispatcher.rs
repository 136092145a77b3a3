use thiserror::Error;

use crate::protocol::{self, Command, ProtocolError, Response};

use super::{
    source::camera::{CaptureError, GestureControl},
    target::client::{ClientError, DigitizerClient},
};

/// Message sent back when gesture recognition was not configured
pub const GESTURE_UNAVAILABLE: &str = "Gesture recognition unavailable";
/// Message sent back for failures that are not the host's fault
pub const INTERNAL_ERROR: &str = "Internal error";

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("digitizer error: {0}")]
    Device(#[from] ClientError),
    #[error("gesture control error: {0}")]
    Gesture(#[from] CaptureError),
    #[error("{GESTURE_UNAVAILABLE}")]
    GestureUnavailable,
}

impl DispatchError {
    /// Message reported to the host for this error
    pub fn response_message(&self) -> String {
        match self {
            DispatchError::Protocol(e) => e.to_string(),
            DispatchError::GestureUnavailable => GESTURE_UNAVAILABLE.to_string(),
            DispatchError::Device(_) | DispatchError::Gesture(_) => INTERNAL_ERROR.to_string(),
        }
    }
}

/// Routes parsed commands to the digitizer or the gesture subsystem and
/// turns the outcome into a response line. Runs on the serial thread and
/// uses the blocking digitizer client.
pub struct CommandDispatcher {
    client: DigitizerClient,
    gesture: Option<Box<dyn GestureControl>>,
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("client", &self.client)
            .field("gesture", &self.gesture.is_some())
            .finish()
    }
}

impl CommandDispatcher {
    pub fn new(client: DigitizerClient, gesture: Option<Box<dyn GestureControl>>) -> Self {
        if gesture.is_none() {
            log::info!("Gesture recognition not available");
        }
        Self { client, gesture }
    }

    pub fn has_gesture_control(&self) -> bool {
        self.gesture.is_some()
    }

    /// Parse, execute and acknowledge a single command line
    pub fn handle_command(&mut self, line: &str) -> String {
        let result = protocol::parse(line)
            .map_err(DispatchError::from)
            .and_then(|command| self.execute(command));

        match result {
            Ok(response) => response.to_string(),
            Err(e) => {
                match &e {
                    DispatchError::Protocol(ProtocolError::InvalidCoordinate(msg)) => {
                        log::warn!("Invalid coordinates: {msg}")
                    }
                    DispatchError::Protocol(ProtocolError::InvalidButton(msg)) => {
                        log::warn!("Invalid button: {msg}")
                    }
                    DispatchError::Protocol(e) => log::warn!("Protocol error: {e}"),
                    DispatchError::GestureUnavailable => {
                        log::warn!("Gesture command received but recognition is unavailable")
                    }
                    e => log::error!("Error handling command: {e}"),
                }
                Response::error(e.response_message()).to_string()
            }
        }
    }

    /// Execute a parsed command
    pub fn execute(&mut self, command: Command) -> Result<Response, DispatchError> {
        match command {
            Command::Move { x, y } => {
                log::info!("Executing MOVE to ({x}, {y})");
                self.client.blocking_move_to(x, y)?;
            }
            Command::Click { button } => {
                log::info!("Executing CLICK {button}");
                self.client.blocking_click(button)?;
            }
            Command::Release => {
                log::info!("Executing RELEASE");
                self.client.blocking_release()?;
            }
            Command::GestureStart => {
                log::info!("Executing GESTURE_START");
                let gesture = self
                    .gesture
                    .as_mut()
                    .ok_or(DispatchError::GestureUnavailable)?;
                gesture.start()?;
            }
            Command::GestureStop => {
                log::info!("Executing GESTURE_STOP");
                let gesture = self
                    .gesture
                    .as_mut()
                    .ok_or(DispatchError::GestureUnavailable)?;
                gesture.stop()?;
            }
        }
        Ok(Response::Ok)
    }

    /// Stop the gesture subsystem if it is running
    pub fn shutdown(&mut self) {
        let Some(gesture) = self.gesture.as_mut() else {
            return;
        };
        if let Err(e) = gesture.stop() {
            log::error!("Failed to stop gesture recognition: {e}");
        }
    }
}
