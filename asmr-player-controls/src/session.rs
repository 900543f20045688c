use std::{sync::Arc, time::Duration};

use futures::future;
use snafu::prelude::*;
use tokio::{
    select,
    sync::{broadcast, watch},
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::{
    Result,
    controls::{CommandReceiver, ControlCommand},
    engine::{EngineError, EngineEvent, EngineEventKind, EngineEventReceiver, LoadId, PlaybackEngine},
    error::{EntryOutOfRangeSnafu, InvalidStateTransitionSnafu},
    notification::{Notification, NotificationBroadcast},
    time::{Progress, Time},
    track_tree::{PlayableEntry, Playlist},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading(Arc<PlayableEntry>),
    Playing {
        entry: Arc<PlayableEntry>,
        position: Time,
    },
    Paused {
        entry: Arc<PlayableEntry>,
        position: Time,
    },
    Completed(Arc<PlayableEntry>),
    Failed {
        entry: Arc<PlayableEntry>,
        error: EngineError,
    },
}

impl PlaybackState {
    pub fn name(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Loading(_) => "loading",
            PlaybackState::Playing { .. } => "playing",
            PlaybackState::Paused { .. } => "paused",
            PlaybackState::Completed(_) => "completed",
            PlaybackState::Failed { .. } => "failed",
        }
    }

    pub fn entry(&self) -> Option<&Arc<PlayableEntry>> {
        match self {
            PlaybackState::Idle => None,
            PlaybackState::Loading(entry)
            | PlaybackState::Playing { entry, .. }
            | PlaybackState::Paused { entry, .. }
            | PlaybackState::Completed(entry)
            | PlaybackState::Failed { entry, .. } => Some(entry),
        }
    }

    pub fn position(&self) -> Option<Time> {
        match self {
            PlaybackState::Playing { position, .. } | PlaybackState::Paused { position, .. } => {
                Some(*position)
            }
            _ => None,
        }
    }
}

/// What observers see after every state change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub state: PlaybackState,
    pub duration: Option<Time>,
}

impl Snapshot {
    pub fn progress(&self) -> Option<Progress> {
        self.state.entry()?;

        let position = match &self.state {
            PlaybackState::Completed(_) => self.duration.unwrap_or_default(),
            state => state.position().unwrap_or_default(),
        };

        Some(Progress {
            position,
            duration: self.duration,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Start the next playlist entry when the current one completes.
    pub auto_advance: bool,
    pub load_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_advance: true,
            load_timeout: Duration::from_secs(10),
        }
    }
}

/// Single owner of the playback state.
///
/// Commands are plain `&mut self` calls; engine callbacks arrive through
/// [`handle_engine_event`](Self::handle_engine_event) and only the ones tagged
/// with the current [`LoadId`] are applied. [`run`](Self::run) drives both from
/// a [`Controls`](crate::controls::Controls) handle and the engine channel.
pub struct PlaybackSession<E> {
    engine: E,
    events: EngineEventReceiver,
    config: SessionConfig,
    playlist: Playlist,
    state: PlaybackState,
    engine_duration: Option<Time>,
    load: LoadId,
    load_deadline: Option<Instant>,
    snapshot_tx: watch::Sender<Snapshot>,
    notifications: NotificationBroadcast,
}

impl<E: PlaybackEngine> PlaybackSession<E> {
    pub fn new(engine: E, events: EngineEventReceiver, config: SessionConfig) -> Self {
        let (snapshot_tx, _) = watch::channel(Snapshot::default());

        Self {
            engine,
            events,
            config,
            playlist: Default::default(),
            state: Default::default(),
            engine_duration: None,
            load: LoadId::default(),
            load_deadline: None,
            snapshot_tx,
            notifications: NotificationBroadcast::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_tx.borrow().clone()
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn current_load(&self) -> LoadId {
        self.load
    }

    /// Engine-reported duration, else the catalog's.
    pub fn duration(&self) -> Option<Time> {
        self.engine_duration
            .or_else(|| self.state.entry().and_then(|entry| entry.duration()))
    }

    pub fn load_playlist(&mut self, playlist: Playlist, start: Option<usize>) -> Result<()> {
        debug!("Loaded playlist of {} entries", playlist.len());
        self.playlist = playlist;

        match start {
            Some(index) => self.play_index(index),
            None => Ok(()),
        }
    }

    pub fn play_index(&mut self, index: usize) -> Result<()> {
        let entry = self
            .playlist
            .get(index)
            .cloned()
            .context(EntryOutOfRangeSnafu {
                index,
                len: self.playlist.len(),
            })?;

        self.play(entry)
    }

    /// Loads `entry`, replacing the playlist when it is not part of it.
    pub fn play(&mut self, entry: Arc<PlayableEntry>) -> Result<()> {
        if self.state.entry().is_some_and(|current| **current == *entry) {
            if matches!(self.state, PlaybackState::Paused { .. }) {
                return self.resume();
            }
            if matches!(
                self.state,
                PlaybackState::Loading(_) | PlaybackState::Playing { .. }
            ) {
                return Ok(());
            }
        }

        if !self.playlist.contains(&entry) {
            self.playlist = Playlist::single(entry.clone());
        }

        self.start(entry);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        match self.state.clone() {
            PlaybackState::Playing { entry, position } => {
                if let Err(error) = self.engine.pause() {
                    self.fail(entry, error.clone());
                    return Err(error.into());
                }
                self.state = PlaybackState::Paused { entry, position };
                self.publish();
                Ok(())
            }
            PlaybackState::Paused { .. } => Ok(()),
            state => InvalidStateTransitionSnafu {
                command: "pause",
                state: state.name(),
            }
            .fail(),
        }
    }

    pub fn resume(&mut self) -> Result<()> {
        match self.state.clone() {
            PlaybackState::Paused { entry, position } => {
                if let Err(error) = self.engine.resume() {
                    self.fail(entry, error.clone());
                    return Err(error.into());
                }
                self.state = PlaybackState::Playing { entry, position };
                self.publish();
                Ok(())
            }
            PlaybackState::Playing { .. } => Ok(()),
            state => InvalidStateTransitionSnafu {
                command: "resume",
                state: state.name(),
            }
            .fail(),
        }
    }

    pub fn toggle(&mut self) -> Result<()> {
        match self.state {
            PlaybackState::Playing { .. } => self.pause(),
            PlaybackState::Paused { .. } => self.resume(),
            _ => InvalidStateTransitionSnafu {
                command: "toggle",
                state: self.state.name(),
            }
            .fail(),
        }
    }

    /// Seeks within the current entry, clamped to its duration when known.
    pub fn seek(&mut self, position: Time) -> Result<()> {
        let (entry, paused) = match &self.state {
            PlaybackState::Playing { entry, .. } => (entry.clone(), false),
            PlaybackState::Paused { entry, .. } => (entry.clone(), true),
            state => {
                return InvalidStateTransitionSnafu {
                    command: "seek",
                    state: state.name(),
                }
                .fail();
            }
        };

        let position = match self.duration() {
            Some(duration) if position > duration => {
                self.notifications.send_warning(format!(
                    "{position} is past the end of {}, seeking to {duration}",
                    entry.title
                ));
                duration
            }
            _ => position,
        };

        if let Err(error) = self.engine.seek(position) {
            self.fail(entry, error.clone());
            return Err(error.into());
        }

        self.state = if paused {
            PlaybackState::Paused { entry, position }
        } else {
            PlaybackState::Playing { entry, position }
        };
        self.publish();
        Ok(())
    }

    pub fn next(&mut self) -> Result<()> {
        let current = self.current_entry("skip forward")?;

        match self.playlist.next_after(&current).cloned() {
            Some(next) => self.start(next),
            None => self
                .notifications
                .send_info(format!("{} is the last entry", current.title)),
        }
        Ok(())
    }

    pub fn previous(&mut self) -> Result<()> {
        let current = self.current_entry("skip back")?;

        match self.playlist.previous_before(&current).cloned() {
            Some(previous) => self.start(previous),
            None => self
                .notifications
                .send_info(format!("{} is the first entry", current.title)),
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.state == PlaybackState::Idle {
            return;
        }

        self.engine.stop();
        self.load = self.load.next();
        self.load_deadline = None;
        self.engine_duration = None;
        self.state = PlaybackState::Idle;
        info!("Stopped");
        self.publish();
    }

    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        if event.load != self.load {
            debug!(
                "Ignoring {:?} from load {}, current is {}",
                event.kind, event.load, self.load
            );
            return;
        }

        match (event.kind, self.state.clone()) {
            (EngineEventKind::Ready, PlaybackState::Loading(entry)) => {
                info!("Playing {}", entry.title);
                self.load_deadline = None;
                self.state = PlaybackState::Playing {
                    entry,
                    position: Time::ZERO,
                };
            }
            (EngineEventKind::Position(position), PlaybackState::Playing { entry, .. }) => {
                self.state = PlaybackState::Playing { entry, position };
            }
            (EngineEventKind::Position(position), PlaybackState::Paused { entry, .. }) => {
                self.state = PlaybackState::Paused { entry, position };
            }
            (EngineEventKind::Duration(duration), _) if duration > Time::ZERO => {
                self.engine_duration = Some(duration);
            }
            (
                EngineEventKind::Completed,
                PlaybackState::Playing { entry, .. } | PlaybackState::Paused { entry, .. },
            ) => {
                self.complete(entry);
                return;
            }
            (
                EngineEventKind::Error(message),
                PlaybackState::Loading(entry)
                | PlaybackState::Playing { entry, .. }
                | PlaybackState::Paused { entry, .. },
            ) => {
                self.fail(entry, EngineError::Playback { message });
                return;
            }
            (kind, state) => {
                debug!("Ignoring {kind:?} while {}", state.name());
                return;
            }
        }

        self.publish();
    }

    /// Fails the entry of `load` if it is still loading.
    pub fn handle_load_timeout(&mut self, load: LoadId) {
        self.load_deadline = None;

        if load != self.load {
            return;
        }

        if let PlaybackState::Loading(entry) = self.state.clone() {
            warn!("{} did not start in time", entry.title);
            self.engine.stop();
            self.fail(
                entry,
                EngineError::LoadTimeout {
                    timeout: self.config.load_timeout,
                },
            );
        }
    }

    /// Applies engine events that are already queued, without waiting.
    pub fn process_engine_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_engine_event(event);
        }
    }

    /// Serves `commands` until every [`Controls`](crate::controls::Controls)
    /// handle is dropped, then stops the engine.
    pub async fn run(mut self, mut commands: CommandReceiver) {
        loop {
            let load = self.load;
            let deadline = self.load_deadline;
            let load_timeout = async move {
                match deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => future::pending::<()>().await,
                }
            };

            select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = self.events.recv() => self.handle_engine_event(event),
                _ = load_timeout => self.handle_load_timeout(load),
            }
        }

        self.stop();
    }

    fn handle_command(&mut self, command: ControlCommand) {
        let (reply, result) = match command {
            ControlCommand::LoadPlaylist {
                playlist,
                start,
                reply,
            } => (reply, self.load_playlist(playlist, start)),
            ControlCommand::Play { entry, reply } => (reply, self.play(entry)),
            ControlCommand::PlayIndex { index, reply } => (reply, self.play_index(index)),
            ControlCommand::Pause { reply } => (reply, self.pause()),
            ControlCommand::Resume { reply } => (reply, self.resume()),
            ControlCommand::Toggle { reply } => (reply, self.toggle()),
            ControlCommand::Seek { position, reply } => (reply, self.seek(position)),
            ControlCommand::Next { reply } => (reply, self.next()),
            ControlCommand::Previous { reply } => (reply, self.previous()),
            ControlCommand::Stop { reply } => {
                self.stop();
                (reply, Ok(()))
            }
        };

        _ = reply.send(result);
    }

    fn current_entry(&self, command: &'static str) -> Result<Arc<PlayableEntry>> {
        self.state
            .entry()
            .cloned()
            .context(InvalidStateTransitionSnafu {
                command,
                state: self.state.name(),
            })
    }

    fn start(&mut self, entry: Arc<PlayableEntry>) {
        if self.state != PlaybackState::Idle {
            self.engine.stop();
        }

        self.load = self.load.next();
        self.engine_duration = None;
        self.load_deadline = Some(Instant::now() + self.config.load_timeout);
        self.state = PlaybackState::Loading(entry.clone());
        info!("Loading {} ({})", entry.title, self.load);

        if let Err(error) = self.engine.start(self.load, &entry.media_url) {
            self.fail(entry, error);
            return;
        }

        self.publish();
    }

    fn complete(&mut self, entry: Arc<PlayableEntry>) {
        info!("Finished {}", entry.title);
        self.state = PlaybackState::Completed(entry.clone());
        self.publish();

        if self.config.auto_advance
            && let Some(next) = self.playlist.next_after(&entry).cloned()
        {
            self.start(next);
        }
    }

    fn fail(&mut self, entry: Arc<PlayableEntry>, error: EngineError) {
        self.load_deadline = None;
        self.notifications
            .send_error(format!("Unable to play {}: {error}", entry.title));
        self.state = PlaybackState::Failed { entry, error };
        self.publish();
    }

    fn publish(&self) {
        let snapshot = Snapshot {
            state: self.state.clone(),
            duration: self.duration(),
        };

        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}
