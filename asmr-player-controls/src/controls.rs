use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::{
    Result,
    time::Time,
    track_tree::{PlayableEntry, Playlist},
};

pub type Reply = oneshot::Sender<Result<()>>;

#[derive(Debug)]
pub enum ControlCommand {
    LoadPlaylist {
        playlist: Playlist,
        start: Option<usize>,
        reply: Reply,
    },
    Play {
        entry: Arc<PlayableEntry>,
        reply: Reply,
    },
    PlayIndex {
        index: usize,
        reply: Reply,
    },
    Pause {
        reply: Reply,
    },
    Resume {
        reply: Reply,
    },
    Toggle {
        reply: Reply,
    },
    Seek {
        position: Time,
        reply: Reply,
    },
    Next {
        reply: Reply,
    },
    Previous {
        reply: Reply,
    },
    Stop {
        reply: Reply,
    },
}

pub type CommandReceiver = mpsc::UnboundedReceiver<ControlCommand>;

/// Cloneable handle to a running [`PlaybackSession`](crate::session::PlaybackSession).
///
/// The session loop exits once every handle is dropped.
#[derive(Debug, Clone)]
pub struct Controls {
    tx: mpsc::UnboundedSender<ControlCommand>,
}

pub fn channel() -> (Controls, CommandReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Controls { tx }, rx)
}

impl Controls {
    async fn request(&self, command: impl FnOnce(Reply) -> ControlCommand) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.tx.send(command(reply))?;
        response.await?
    }

    pub async fn load_playlist(&self, playlist: Playlist, start: Option<usize>) -> Result<()> {
        self.request(|reply| ControlCommand::LoadPlaylist {
            playlist,
            start,
            reply,
        })
        .await
    }

    pub async fn play(&self, entry: Arc<PlayableEntry>) -> Result<()> {
        self.request(|reply| ControlCommand::Play { entry, reply })
            .await
    }

    pub async fn play_index(&self, index: usize) -> Result<()> {
        self.request(|reply| ControlCommand::PlayIndex { index, reply })
            .await
    }

    pub async fn pause(&self) -> Result<()> {
        self.request(|reply| ControlCommand::Pause { reply }).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.request(|reply| ControlCommand::Resume { reply }).await
    }

    pub async fn toggle(&self) -> Result<()> {
        self.request(|reply| ControlCommand::Toggle { reply }).await
    }

    pub async fn seek(&self, position: Time) -> Result<()> {
        self.request(|reply| ControlCommand::Seek { position, reply })
            .await
    }

    pub async fn next(&self) -> Result<()> {
        self.request(|reply| ControlCommand::Next { reply }).await
    }

    pub async fn previous(&self) -> Result<()> {
        self.request(|reply| ControlCommand::Previous { reply })
            .await
    }

    pub async fn stop(&self) -> Result<()> {
        self.request(|reply| ControlCommand::Stop { reply }).await
    }
}
