use std::{error::Error, time::Duration};

use clap::Subcommand;

use crate::client::SerialClient;

#[derive(Subcommand, Debug, Clone)]
pub enum SendCommand {
    /// Move the cursor to an absolute position (0-32767)
    Move {
        #[arg(allow_negative_numbers = true)]
        x: i64,
        #[arg(allow_negative_numbers = true)]
        y: i64,
    },
    /// Click a button ("left" or "right")
    Click { button: String },
    /// Release all buttons
    Release,
    /// Start gesture recognition on the digitizer
    GestureStart,
    /// Stop gesture recognition on the digitizer
    GestureStop,
}

pub fn handle_send(
    port: &str,
    baud_rate: u32,
    timeout: Duration,
    cmd: SendCommand,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut client = SerialClient::connect(port, baud_rate, timeout)?;
    let (success, error) = match cmd {
        SendCommand::Move { x, y } => client.move_to(x, y)?,
        SendCommand::Click { button } => client.click(&button)?,
        SendCommand::Release => client.release()?,
        SendCommand::GestureStart => client.gesture_start()?,
        SendCommand::GestureStop => client.gesture_stop()?,
    };

    if success {
        println!("OK");
        return Ok(());
    }
    let message = error.unwrap_or_else(|| "Unknown error".to_string());
    Err(format!("Command failed: {message}").into())
}
