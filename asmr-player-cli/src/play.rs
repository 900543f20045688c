#![cfg_attr(not(feature = "audio"), allow(dead_code))]

use std::time::Duration;

use asmr_player_controls::{
    Controls, SessionConfig, Snapshot,
    notification::Notification,
    time::Time,
    track_tree::Playlist,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    select,
    sync::{broadcast, watch},
};

use crate::cli::Error;

const HELP: &str = "p: play/pause  n: next  b: previous  s <secs>: seek  x: stop  q: quit";

/// Whole files are fetched before playback starts, so the load timeout has
/// to cover the download.
pub fn session_config(load_timeout_secs: u64) -> SessionConfig {
    SessionConfig {
        load_timeout: Duration::from_secs(load_timeout_secs.max(1)),
        ..Default::default()
    }
}

#[cfg(feature = "audio")]
pub async fn play(
    client: &asmr_player_client::Client,
    id: u64,
    index: usize,
    config: SessionConfig,
) -> Result<(), Error> {
    use asmr_player_controls::{PlaybackSession, controls, engine, sink::Sink, track_tree};
    use snafu::prelude::*;

    use crate::cli::NothingPlayableSnafu;

    let nodes = client.track_tree(id).await?;
    let tree = track_tree::flatten(&nodes);
    ensure!(!tree.playlist.is_empty(), NothingPlayableSnafu { id });

    for row in &tree.outline {
        println!("{row}");
    }

    let (events, receiver) = engine::channel();
    let sink = Sink::new(events)?;
    tracing::debug!("Audio output at {} Hz", sink.sample_rate());

    let session = PlaybackSession::new(sink, receiver, config);
    let snapshots = session.subscribe();
    let notifications = session.notifications();
    let (controls, commands) = controls::channel();

    let interaction = tokio::spawn(interact(
        controls,
        tree.playlist,
        index.saturating_sub(1),
        snapshots,
        notifications,
    ));

    session.run(commands).await;

    interaction.await.map_err(|error| Error::TerminalError {
        error: error.to_string(),
    })?
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Input {
    Toggle,
    Next,
    Previous,
    Seek(Time),
    Stop,
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let mut words = line.split_whitespace();
    let input = match words.next()? {
        "p" => Input::Toggle,
        "n" => Input::Next,
        "b" => Input::Previous,
        "s" => Input::Seek(Time::from_seconds_f64(words.next()?.parse().ok()?)),
        "x" => Input::Stop,
        "q" => Input::Quit,
        _ => return None,
    };

    Some(input)
}

async fn interact(
    controls: Controls,
    playlist: Playlist,
    start: usize,
    mut snapshots: watch::Receiver<Snapshot>,
    mut notifications: broadcast::Receiver<Notification>,
) -> Result<(), Error> {
    controls.load_playlist(playlist, Some(start)).await?;
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shown: Option<String> = None;

    loop {
        select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };

                let result = match parse_input(&line) {
                    Some(Input::Toggle) => controls.toggle().await,
                    Some(Input::Next) => controls.next().await,
                    Some(Input::Previous) => controls.previous().await,
                    Some(Input::Seek(position)) => controls.seek(position).await,
                    Some(Input::Stop) => controls.stop().await,
                    Some(Input::Quit) => break,
                    None => {
                        println!("{HELP}");
                        Ok(())
                    }
                };

                if let Err(error) = result {
                    eprintln!("{error}");
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }

                let status = status_line(&snapshots.borrow_and_update());
                if shown.as_ref() != Some(&status.0) {
                    println!("{}", status.1);
                    shown = Some(status.0);
                }
            }
            Ok(notification) = notifications.recv() => {
                eprintln!("{}", notification.message());
            }
        }
    }

    Ok(())
}

/// A key that only changes with the state or entry, and the line to print.
fn status_line(snapshot: &Snapshot) -> (String, String) {
    let state = snapshot.state.name();

    match (snapshot.state.entry(), snapshot.progress()) {
        (Some(entry), Some(progress)) => {
            let mut line = format!("[{state}] {}  {progress}", entry.title);
            if let Some(ratio) = progress.ratio() {
                line.push_str(&format!(" ({:.0}%)", ratio * 100.0));
            }
            (format!("{state} {}", entry.flat_index), line)
        }
        _ => (state.to_string(), format!("[{state}]")),
    }
}
