use std::{fmt::Display, time::Duration};

use snafu::prelude::*;
use tokio::sync::mpsc;

use crate::time::Time;

/// Identity of one `start` request. Every `play` gets a fresh id and engine
/// events carry the id they belong to, so callbacks from a superseded source
/// can be told apart from current ones.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Debug, Hash)]
pub struct LoadId(u64);

impl LoadId {
    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for LoadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Snafu, Debug, Clone, PartialEq, Eq)]
#[snafu(visibility(pub))]
pub enum EngineError {
    #[snafu(display("{message}"))]
    Playback { message: String },
    #[snafu(display("Track did not start within {} seconds", timeout.as_secs()))]
    LoadTimeout { timeout: Duration },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEventKind {
    /// Source is buffered and playback has started.
    Ready,
    Position(Time),
    Duration(Time),
    Completed,
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineEvent {
    pub load: LoadId,
    pub kind: EngineEventKind,
}

/// The audio backend driven by a [`PlaybackSession`](crate::session::PlaybackSession).
///
/// Calls are imperative and return quickly; progress is reported back through
/// the [`EngineEventSender`] the engine was built with.
pub trait PlaybackEngine {
    /// Release whatever is playing and begin loading `media_url`.
    fn start(&mut self, load: LoadId, media_url: &str) -> Result<(), EngineError>;
    fn pause(&mut self) -> Result<(), EngineError>;
    fn resume(&mut self) -> Result<(), EngineError>;
    fn seek(&mut self, position: Time) -> Result<(), EngineError>;
    fn stop(&mut self);
}

pub type EngineEventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

#[derive(Debug, Clone)]
pub struct EngineEventSender {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

pub fn channel() -> (EngineEventSender, EngineEventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EngineEventSender { tx }, rx)
}

impl EngineEventSender {
    /// Returns false once the session is gone.
    pub fn send(&self, load: LoadId, kind: EngineEventKind) -> bool {
        self.tx.send(EngineEvent { load, kind }).is_ok()
    }

    pub fn ready(&self, load: LoadId) -> bool {
        self.send(load, EngineEventKind::Ready)
    }

    pub fn position(&self, load: LoadId, position: Time) -> bool {
        self.send(load, EngineEventKind::Position(position))
    }

    pub fn duration(&self, load: LoadId, duration: Time) -> bool {
        self.send(load, EngineEventKind::Duration(duration))
    }

    pub fn completed(&self, load: LoadId) -> bool {
        self.send(load, EngineEventKind::Completed)
    }

    pub fn error(&self, load: LoadId, message: impl Into<String>) -> bool {
        self.send(load, EngineEventKind::Error(message.into()))
    }
}
