use tokio::sync::mpsc::Sender;

use crate::{
    drivers::digitizer::{DigitizerError, DigitizerState},
    protocol::ButtonId,
};

/// Channel used by the device to report the outcome of a command
pub type ReplySender = Sender<Result<(), DigitizerError>>;

/// A [TargetCommand] is a message that can be sent to a
/// [super::digitizer::DigitizerDevice] over a channel.
#[derive(Debug, Clone)]
pub enum TargetCommand {
    Move(u16, u16, ReplySender),
    Click(ButtonId, ReplySender),
    ClickNamed(String, ReplySender),
    Release(ReplySender),
    Reset(ReplySender),
    GetState(Sender<DigitizerState>),
    Stop,
}
