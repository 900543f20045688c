use crate::engine::EngineError;
use snafu::prelude::*;

#[derive(Snafu, Debug)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Cannot {command} while {state}"))]
    InvalidStateTransition {
        command: &'static str,
        state: &'static str,
    },
    #[snafu(display("No entry {index} in a playlist of {len}"))]
    EntryOutOfRange { index: usize, len: usize },
    #[snafu(display("{source}"))]
    Engine { source: EngineError },
    #[snafu(display("Playback session is no longer running"))]
    SessionClosed,
}

impl From<EngineError> for Error {
    fn from(source: EngineError) -> Self {
        Error::Engine { source }
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for Error {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Error::SessionClosed
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for Error {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Error::SessionClosed
    }
}
