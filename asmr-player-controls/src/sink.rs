use std::fmt::Display;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use rodio::{Source, decoder::DecoderBuilder, queue::queue};
use tokio::task::JoinHandle;

use crate::engine::{EngineError, EngineEventSender, LoadId, PlaybackEngine};
use crate::time::Time;

const POSITION_INTERVAL: Duration = Duration::from_millis(500);

/// [`PlaybackEngine`] on the default audio output.
///
/// Media is downloaded whole, decoded in memory and queued on a rodio sink.
pub struct Sink {
    stream_handle: rodio::OutputStream,
    sink: Arc<rodio::Sink>,
    http: reqwest::Client,
    events: EngineEventSender,
    current_download: Option<JoinHandle<()>>,
    position_ticker: Option<JoinHandle<()>>,
}

impl Sink {
    pub fn new(events: EngineEventSender) -> Result<Self, EngineError> {
        let mut stream_handle =
            rodio::OutputStreamBuilder::open_default_stream().map_err(playback_error)?;
        stream_handle.log_on_drop(false);

        let sink = rodio::Sink::connect_new(stream_handle.mixer());

        Ok(Self {
            stream_handle,
            sink: Arc::new(sink),
            http: reqwest::Client::new(),
            events,
            current_download: None,
            position_ticker: None,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.stream_handle.config().sample_rate()
    }

    fn release(&mut self) {
        if let Some(handle) = self.current_download.take() {
            handle.abort();
        }
        if let Some(handle) = self.position_ticker.take() {
            handle.abort();
        }

        self.sink.clear();
    }
}

impl PlaybackEngine for Sink {
    fn start(&mut self, load: LoadId, media_url: &str) -> Result<(), EngineError> {
        self.release();
        self.sink.play();

        let url = media_url.to_string();
        let http = self.http.clone();
        let sink = self.sink.clone();
        let events = self.events.clone();

        self.current_download = Some(tokio::spawn(async move {
            let bytes = match fetch(&http, &url).await {
                Ok(bytes) => bytes,
                Err(error) => {
                    events.error(load, format!("Unable to get audio file: {error}"));
                    return;
                }
            };

            let source = match DecoderBuilder::new()
                .with_data(Cursor::new(bytes))
                .with_seekable(true)
                .build()
            {
                Ok(source) => source,
                Err(error) => {
                    events.error(load, format!("Unable to decode audio file: {error}"));
                    return;
                }
            };

            if let Some(duration) = source.total_duration() {
                events.duration(load, duration.into());
            }

            let (sender, receiver) = queue(false);
            let signal = sender.append_with_signal(source);
            sink.append(receiver);

            tracing::debug!("Buffered {url}");
            events.ready(load);

            tokio::task::spawn_blocking(move || {
                if signal.recv().is_ok() {
                    events.completed(load);
                }
            });
        }));

        let sink = self.sink.clone();
        let events = self.events.clone();
        self.position_ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(POSITION_INTERVAL);
            loop {
                interval.tick().await;
                if sink.is_paused() || sink.empty() {
                    continue;
                }
                if !events.position(load, sink.get_pos().into()) {
                    break;
                }
            }
        }));

        Ok(())
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        self.sink.pause();
        Ok(())
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        self.sink.play();
        Ok(())
    }

    fn seek(&mut self, position: Time) -> Result<(), EngineError> {
        self.sink.try_seek(position.into()).map_err(playback_error)
    }

    fn stop(&mut self) {
        self.release();
    }
}

impl Drop for Sink {
    fn drop(&mut self) {
        self.release();
    }
}

async fn fetch(http: &reqwest::Client, url: &str) -> reqwest::Result<Vec<u8>> {
    let response = http.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

fn playback_error(error: impl Display) -> EngineError {
    EngineError::Playback {
        message: error.to_string(),
    }
}
