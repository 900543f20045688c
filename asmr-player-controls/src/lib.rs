use error::Error;

pub mod controls;
pub mod engine;
pub mod error;
pub mod notification;
pub mod session;
#[cfg(feature = "rodio")]
pub mod sink;
pub mod time;
pub mod track_tree;

pub use controls::Controls;
pub use session::{PlaybackSession, PlaybackState, SessionConfig, Snapshot};

pub type Result<T, E = Error> = std::result::Result<T, E>;
