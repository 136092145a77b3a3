//! ASCII command protocol spoken between the host and the digitizer.
//!
//! Commands are case-insensitive, one per line:
//!
//! ```text
//! MOVE <x> <y>
//! CLICK <left|right>
//! RELEASE
//! GESTURE_START
//! GESTURE_STOP
//! ```
//!
//! The digitizer answers every line with `OK`, `ERROR` or `ERROR <message>`.

use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::constants::{MAX_COORDINATE, MIN_COORDINATE, SERIAL_TERMINATOR};

pub const CMD_MOVE: &str = "MOVE";
pub const CMD_CLICK: &str = "CLICK";
pub const CMD_RELEASE: &str = "RELEASE";
pub const CMD_GESTURE_START: &str = "GESTURE_START";
pub const CMD_GESTURE_STOP: &str = "GESTURE_STOP";

pub const RESPONSE_OK: &str = "OK";
pub const RESPONSE_ERROR: &str = "ERROR";

pub const BUTTON_LEFT: &str = "left";
pub const BUTTON_RIGHT: &str = "right";

/// Errors produced while parsing or formatting protocol commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("{0}")]
    InvalidCommand(String),
    #[error("{0}")]
    InvalidCoordinate(String),
    #[error("{0}")]
    InvalidButton(String),
}

/// Buttons addressable over the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    Left,
    Right,
}

impl ButtonId {
    /// Returns the button for the given case-insensitive name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            BUTTON_LEFT => Some(ButtonId::Left),
            BUTTON_RIGHT => Some(ButtonId::Right),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonId::Left => BUTTON_LEFT,
            ButtonId::Right => BUTTON_RIGHT,
        }
    }
}

impl Display for ButtonId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed protocol command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move { x: u16, y: u16 },
    Click { button: ButtonId },
    Release,
    GestureStart,
    GestureStop,
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Move { x, y } => write!(f, "{CMD_MOVE} {x} {y}"),
            Command::Click { button } => write!(f, "{CMD_CLICK} {button}"),
            Command::Release => write!(f, "{CMD_RELEASE}"),
            Command::GestureStart => write!(f, "{CMD_GESTURE_START}"),
            Command::GestureStop => write!(f, "{CMD_GESTURE_STOP}"),
        }
    }
}

/// Acknowledgement sent back for every command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ok,
    Error { message: Option<String> },
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        let message: String = message.into();
        if message.is_empty() {
            return Response::Error { message: None };
        }
        Response::Error {
            message: Some(message),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok)
    }
}

impl Display for Response {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let line = match self {
            Response::Ok => format_response(true, ""),
            Response::Error { message } => format_response(false, message.as_deref().unwrap_or("")),
        };
        write!(f, "{line}")
    }
}

/// Parse a single command line (without terminator) into a [Command].
pub fn parse(line: &str) -> Result<Command, ProtocolError> {
    let line = line.trim().to_ascii_uppercase();
    if line.is_empty() {
        return Err(ProtocolError::InvalidCommand("Empty command".into()));
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        [CMD_MOVE, x, y] if is_unsigned_integer(x) && is_unsigned_integer(y) => {
            let (x, y) = validate_coordinates(parse_axis("X", x)?, parse_axis("Y", y)?)?;
            Ok(Command::Move { x, y })
        }
        [CMD_CLICK, button] => {
            let button = validate_button(button)?;
            Ok(Command::Click { button })
        }
        [CMD_RELEASE] => Ok(Command::Release),
        [CMD_GESTURE_START] => Ok(Command::GestureStart),
        [CMD_GESTURE_STOP] => Ok(Command::GestureStop),
        _ => Err(ProtocolError::InvalidCommand(format!(
            "Unknown command: {line}"
        ))),
    }
}

fn is_unsigned_integer(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Digit strings too long for an i64 are still out of range, not malformed.
fn parse_axis(axis: &str, token: &str) -> Result<i64, ProtocolError> {
    token
        .parse::<i64>()
        .map_err(|_| out_of_range(axis, token))
}

fn out_of_range(axis: &str, value: impl Display) -> ProtocolError {
    ProtocolError::InvalidCoordinate(format!(
        "{axis} coordinate {value} out of range [{MIN_COORDINATE}, {MAX_COORDINATE}]"
    ))
}

/// Validate that both coordinates lie in digitizer space. X is checked first.
pub fn validate_coordinates(x: i64, y: i64) -> Result<(u16, u16), ProtocolError> {
    let range = MIN_COORDINATE as i64..=MAX_COORDINATE as i64;
    if !range.contains(&x) {
        return Err(out_of_range("X", x));
    }
    if !range.contains(&y) {
        return Err(out_of_range("Y", y));
    }
    Ok((x as u16, y as u16))
}

/// Validate a case-insensitive button name
pub fn validate_button(name: &str) -> Result<ButtonId, ProtocolError> {
    ButtonId::from_name(name).ok_or_else(|| {
        ProtocolError::InvalidButton(format!(
            "Invalid button '{name}'. Must be one of: {BUTTON_LEFT}, {BUTTON_RIGHT}"
        ))
    })
}

/// Format a MOVE command, validating the coordinates like [parse] does
pub fn format_move(x: i64, y: i64) -> Result<String, ProtocolError> {
    let (x, y) = validate_coordinates(x, y)?;
    Ok(Command::Move { x, y }.to_string())
}

/// Format a CLICK command. The button name is written lowercase.
pub fn format_click(button: &str) -> Result<String, ProtocolError> {
    let button = validate_button(button)?;
    Ok(Command::Click { button }.to_string())
}

pub fn format_release() -> String {
    Command::Release.to_string()
}

pub fn format_gesture_start() -> String {
    Command::GestureStart.to_string()
}

pub fn format_gesture_stop() -> String {
    Command::GestureStop.to_string()
}

/// Format an acknowledgement line (without terminator)
pub fn format_response(success: bool, message: &str) -> String {
    if success {
        return RESPONSE_OK.to_string();
    }
    if message.is_empty() {
        return RESPONSE_ERROR.to_string();
    }
    format!("{RESPONSE_ERROR} {message}")
}

/// Parse an acknowledgement line into `(success, error_message)`
pub fn parse_response(text: &str) -> (bool, Option<String>) {
    let text = text.trim();
    if text == RESPONSE_OK {
        return (true, None);
    }

    if let Some(message) = text.strip_prefix(RESPONSE_ERROR) {
        let message = message.trim();
        if message.is_empty() {
            return (false, None);
        }
        return (false, Some(message.to_string()));
    }

    (false, Some(format!("Unknown response: {text}")))
}

/// Append the line terminator for transmission
pub fn format_command_for_send(command: &str) -> String {
    format!("{command}{SERIAL_TERMINATOR}")
}
