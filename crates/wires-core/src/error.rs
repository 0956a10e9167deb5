//! Error type shared by the composer crates.

use crate::id::Pid;
use thiserror::Error;

/// Errors raised by the graph model and its collaborators.
///
/// None of these are fatal to the editor; callers log them and carry on.
#[derive(Debug, Error)]
pub enum WiresError {
    #[error("a component with pid {0} is already on the canvas")]
    DuplicatePid(Pid),
    #[error("no component with pid {0}")]
    UnknownComponent(Pid),
    #[error("invalid port name: {0:?}")]
    InvalidPortName(String),
    #[error("malformed push message: {0:?}")]
    MalformedPushMessage(String),
    #[error("live channel unavailable: {0}")]
    ChannelUnavailable(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
