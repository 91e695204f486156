//! Playback engine abstraction and implementations.
//!
//! An engine holds an ordered list of stream URLs and a cursor into it, plays/pauses,
//! seeks between entries and reports what happened on an event channel. The playback
//! service owns exactly one engine.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::EngineError;

/// What the engine does after the last entry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    Off,
    #[default]
    All,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Buffering,
    Ready,
    Ended,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    /// The engine moved to another entry, by seek or because the previous one finished
    MediaItemTransition { index: usize },
    StateChanged(EngineState),
    IsPlayingChanged(bool),
    Error(String),
}

pub type EngineEventSender = mpsc::UnboundedSender<EngineEvent>;
pub type EngineEventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

pub fn event_channel() -> (EngineEventSender, EngineEventReceiver) {
    mpsc::unbounded_channel()
}

pub trait PlaybackEngine: Send {
    /// Replace the playlist and position the cursor at `start_index`
    fn set_media_items(&mut self, urls: Vec<String>, start_index: usize) -> Result<(), EngineError>;
    fn set_repeat_mode(&mut self, mode: RepeatMode);
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
    fn has_next(&self) -> bool;
    fn has_previous(&self) -> bool;
    fn seek_to_next(&mut self);
    fn seek_to_previous(&mut self);
    fn current_index(&self) -> Option<usize>;
    fn release(&mut self);
}

/// Playlist cursor shared by the engines
#[derive(Clone, Debug, Default)]
pub struct MediaList {
    urls: Vec<String>,
    index: usize,
    repeat: RepeatMode,
    generation: u64,
}

impl MediaList {
    pub fn set(&mut self, urls: Vec<String>, start_index: usize) {
        self.index = start_index.min(urls.len().saturating_sub(1));
        self.urls = urls;
        self.generation += 1;
    }

    pub fn clear(&mut self) {
        self.urls.clear();
        self.index = 0;
        self.generation += 1;
    }

    pub fn set_repeat(&mut self, repeat: RepeatMode) {
        self.repeat = repeat;
    }

    pub fn current(&self) -> Option<(usize, &str)> {
        self.urls.get(self.index).map(|u| (self.index, u.as_str()))
    }

    /// Bumped whenever the list is replaced or the cursor moves
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn next_index(&self) -> Option<usize> {
        if self.urls.is_empty() {
            return None;
        }
        if self.index + 1 < self.urls.len() {
            Some(self.index + 1)
        } else if self.repeat == RepeatMode::All {
            Some(0)
        } else {
            None
        }
    }

    pub fn previous_index(&self) -> Option<usize> {
        if self.urls.is_empty() {
            return None;
        }
        if self.index > 0 {
            Some(self.index - 1)
        } else if self.repeat == RepeatMode::All {
            Some(self.urls.len() - 1)
        } else {
            None
        }
    }

    pub fn move_to(&mut self, index: usize) -> bool {
        if index < self.urls.len() {
            self.index = index;
            self.generation += 1;
            true
        } else {
            false
        }
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Engine without audio output. Keeps the cursor and reports transitions, but never
/// finishes a track on its own.
pub struct SilentEngine {
    media: MediaList,
    playing: bool,
    events: EngineEventSender,
}

impl SilentEngine {
    pub fn new(events: EngineEventSender) -> Self {
        Self {
            media: MediaList::default(),
            playing: false,
            events,
        }
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }

    fn set_playing(&mut self, playing: bool) {
        if self.playing != playing {
            self.playing = playing;
            self.emit(EngineEvent::IsPlayingChanged(playing));
        }
    }

    fn move_to(&mut self, index: Option<usize>) {
        if let Some(index) = index {
            if self.media.move_to(index) {
                self.emit(EngineEvent::MediaItemTransition { index });
            }
        }
    }
}

impl PlaybackEngine for SilentEngine {
    fn set_media_items(&mut self, urls: Vec<String>, start_index: usize) -> Result<(), EngineError> {
        self.media.set(urls, start_index);
        if let Some((index, _)) = self.media.current() {
            self.emit(EngineEvent::MediaItemTransition { index });
            self.emit(EngineEvent::StateChanged(EngineState::Ready));
        }
        Ok(())
    }

    fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.media.set_repeat(mode);
    }

    fn play(&mut self) {
        if !self.media.is_empty() {
            self.set_playing(true);
        }
    }

    fn pause(&mut self) {
        self.set_playing(false);
    }

    fn stop(&mut self) {
        self.set_playing(false);
        self.media.clear();
        self.emit(EngineEvent::StateChanged(EngineState::Idle));
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn has_next(&self) -> bool {
        self.media.next_index().is_some()
    }

    fn has_previous(&self) -> bool {
        self.media.previous_index().is_some()
    }

    fn seek_to_next(&mut self) {
        let next = self.media.next_index();
        self.move_to(next);
    }

    fn seek_to_previous(&mut self) {
        let previous = self.media.previous_index();
        self.move_to(previous);
    }

    fn current_index(&self) -> Option<usize> {
        self.media.current().map(|(i, _)| i)
    }

    fn release(&mut self) {
        self.stop();
    }
}

#[cfg(feature = "audio")]
pub use rodio_engine::RodioEngine;

#[cfg(feature = "audio")]
mod rodio_engine {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc::{self as std_mpsc, RecvTimeoutError};
    use std::sync::{Arc, Mutex};
    use std::thread::JoinHandle;
    use std::time::Duration;

    use rodio::{Decoder, OutputStream, Sink};

    use super::{EngineEvent, EngineEventSender, EngineState, MediaList, PlaybackEngine, RepeatMode};
    use crate::error::EngineError;

    const POLL_INTERVAL: Duration = Duration::from_millis(200);

    enum AudioCommand {
        /// Fetch and decode the entry under the cursor
        Load,
        Play,
        Pause,
        Stop,
        Shutdown,
    }

    /// Where the worker gets the bytes of a track
    trait StreamFetcher: Send {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, EngineError>;
    }

    struct HttpFetcher {
        http: reqwest::blocking::Client,
    }

    impl StreamFetcher for HttpFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, EngineError> {
            self.http
                .get(url)
                .send()
                .and_then(|r| r.error_for_status())
                .and_then(|r| r.bytes())
                .map(|bytes| bytes.to_vec())
                .map_err(|e| EngineError::Stream(format!("Could not fetch track: {}", e)))
        }
    }

    struct Shared {
        media: Mutex<MediaList>,
        playing: AtomicBool,
    }

    impl Shared {
        fn media(&self) -> std::sync::MutexGuard<'_, MediaList> {
            self.media.lock().unwrap_or_else(|e| e.into_inner())
        }
    }

    /// rodio output on a dedicated thread; `OutputStream` cannot leave the thread
    /// that opened it.
    pub struct RodioEngine {
        commands: std_mpsc::Sender<AudioCommand>,
        shared: Arc<Shared>,
        events: EngineEventSender,
        worker: Option<JoinHandle<()>>,
    }

    impl RodioEngine {
        pub fn new(events: EngineEventSender, timeout: Duration) -> Result<Self, EngineError> {
            let (tx, rx) = std_mpsc::channel();
            let shared = Arc::new(Shared {
                media: Mutex::new(MediaList::default()),
                playing: AtomicBool::new(false),
            });

            let worker_shared = shared.clone();
            let worker_events = events.clone();
            let (ready_tx, ready_rx) = std_mpsc::channel();

            let worker = std::thread::Builder::new()
                .name("audio".to_string())
                .spawn(move || run_worker(rx, worker_shared, worker_events, timeout, ready_tx))
                .map_err(|e| EngineError::Output(e.to_string()))?;

            match ready_rx.recv() {
                Ok(Ok(())) => {}
                Ok(Err(reason)) => {
                    let _ = worker.join();
                    return Err(EngineError::Output(reason));
                }
                Err(_) => return Err(EngineError::Closed),
            }

            tracing::info!("rodio engine initialized");

            Ok(Self {
                commands: tx,
                shared,
                events,
                worker: Some(worker),
            })
        }

        fn send(&self, command: AudioCommand) {
            if self.commands.send(command).is_err() {
                tracing::warn!("Audio worker is gone, command dropped");
            }
        }

        fn set_playing(&self, playing: bool) {
            if self.shared.playing.swap(playing, Ordering::SeqCst) != playing {
                let _ = self.events.send(EngineEvent::IsPlayingChanged(playing));
            }
        }

        fn seek_to(&mut self, index: Option<usize>) {
            let Some(index) = index else { return };
            if self.shared.media().move_to(index) {
                let _ = self.events.send(EngineEvent::MediaItemTransition { index });
                self.send(AudioCommand::Load);
            }
        }
    }

    impl PlaybackEngine for RodioEngine {
        fn set_media_items(&mut self, urls: Vec<String>, start_index: usize) -> Result<(), EngineError> {
            let index = {
                let mut media = self.shared.media();
                media.set(urls, start_index);
                media.current().map(|(i, _)| i)
            };
            if let Some(index) = index {
                let _ = self.events.send(EngineEvent::MediaItemTransition { index });
                self.commands.send(AudioCommand::Load).map_err(|_| EngineError::Closed)?;
            }
            Ok(())
        }

        fn set_repeat_mode(&mut self, mode: RepeatMode) {
            self.shared.media().set_repeat(mode);
        }

        fn play(&mut self) {
            if self.shared.media().is_empty() {
                return;
            }
            self.set_playing(true);
            self.send(AudioCommand::Play);
        }

        fn pause(&mut self) {
            self.set_playing(false);
            self.send(AudioCommand::Pause);
        }

        fn stop(&mut self) {
            self.set_playing(false);
            self.shared.media().clear();
            self.send(AudioCommand::Stop);
        }

        fn is_playing(&self) -> bool {
            self.shared.playing.load(Ordering::SeqCst)
        }

        fn has_next(&self) -> bool {
            self.shared.media().next_index().is_some()
        }

        fn has_previous(&self) -> bool {
            self.shared.media().previous_index().is_some()
        }

        fn seek_to_next(&mut self) {
            let next = self.shared.media().next_index();
            self.seek_to(next);
        }

        fn seek_to_previous(&mut self) {
            let previous = self.shared.media().previous_index();
            self.seek_to(previous);
        }

        fn current_index(&self) -> Option<usize> {
            self.shared.media().current().map(|(i, _)| i)
        }

        fn release(&mut self) {
            let _ = self.commands.send(AudioCommand::Shutdown);
            if let Some(worker) = self.worker.take() {
                if worker.join().is_err() {
                    tracing::error!("Audio worker panicked");
                }
            }
            tracing::info!("rodio engine released");
        }
    }

    impl Drop for RodioEngine {
        fn drop(&mut self) {
            if self.worker.is_some() {
                self.release();
            }
        }
    }

    fn run_worker(
        rx: std_mpsc::Receiver<AudioCommand>,
        shared: Arc<Shared>,
        events: EngineEventSender,
        timeout: Duration,
        ready: std_mpsc::Sender<Result<(), String>>,
    ) {
        // The blocking client owns a runtime of its own, so it is built off the tokio threads
        let http = match reqwest::blocking::Client::builder().timeout(timeout).build() {
            Ok(http) => http,
            Err(e) => {
                let _ = ready.send(Err(e.to_string()));
                return;
            }
        };
        let (_stream, handle) = match OutputStream::try_default() {
            Ok(output) => output,
            Err(e) => {
                let _ = ready.send(Err(e.to_string()));
                return;
            }
        };
        let sink = match Sink::try_new(&handle) {
            Ok(sink) => sink,
            Err(e) => {
                let _ = ready.send(Err(e.to_string()));
                return;
            }
        };
        let _ = ready.send(Ok(()));

        Worker {
            sink,
            fetcher: Box::new(HttpFetcher { http }),
            shared,
            events,
            loaded: None,
        }
        .run(rx);
    }

    struct Worker {
        sink: Sink,
        fetcher: Box<dyn StreamFetcher>,
        shared: Arc<Shared>,
        events: EngineEventSender,
        /// Media list generation the sink contents were loaded from
        loaded: Option<u64>,
    }

    impl Worker {
        fn run(mut self, rx: std_mpsc::Receiver<AudioCommand>) {
            loop {
                match rx.recv_timeout(POLL_INTERVAL) {
                    Ok(AudioCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                    Ok(command) => self.handle(command),
                    Err(RecvTimeoutError::Timeout) => {}
                }

                if self.sink.empty() {
                    self.on_track_finished();
                }
            }

            self.sink.stop();
            tracing::debug!("Audio worker exiting");
        }

        fn emit(&self, event: EngineEvent) {
            let _ = self.events.send(event);
        }

        fn is_playing(&self) -> bool {
            self.shared.playing.load(Ordering::SeqCst)
        }

        fn handle(&mut self, command: AudioCommand) {
            match command {
                AudioCommand::Load => self.load_current(),
                AudioCommand::Play => {
                    if self.loaded.is_some() {
                        self.sink.play();
                    } else if self.is_playing() {
                        // Empty sink, e.g. resumed after the end of the queue
                        let index = self.shared.media().current().map(|(i, _)| i);
                        if let Some(index) = index {
                            self.emit(EngineEvent::MediaItemTransition { index });
                            self.load_current();
                        }
                    }
                }
                AudioCommand::Pause => self.sink.pause(),
                AudioCommand::Stop => {
                    self.sink.clear();
                    self.loaded = None;
                    self.emit(EngineEvent::StateChanged(EngineState::Idle));
                }
                AudioCommand::Shutdown => {}
            }
        }

        fn load_current(&mut self) {
            self.sink.clear();
            self.loaded = None;

            let (generation, url) = {
                let media = self.shared.media();
                (media.generation(), media.current().map(|(_, u)| u.to_string()))
            };
            let Some(url) = url else { return };

            self.emit(EngineEvent::StateChanged(EngineState::Buffering));
            match self.fetcher.fetch(&url).and_then(decode) {
                Ok(source) => {
                    self.sink.append(source);
                    self.loaded = Some(generation);
                    self.emit(EngineEvent::StateChanged(EngineState::Ready));
                    if self.is_playing() {
                        self.sink.play();
                    } else {
                        self.sink.pause();
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, url = %url, "Could not load track");
                    self.emit(EngineEvent::Error(e.to_string()));
                    if self.shared.playing.swap(false, Ordering::SeqCst) {
                        self.emit(EngineEvent::IsPlayingChanged(false));
                    }
                    self.emit(EngineEvent::StateChanged(EngineState::Idle));
                }
            }
        }

        /// The sink ran dry. Advance to the next entry unless the list moved on since
        /// the entry was loaded.
        fn on_track_finished(&mut self) {
            let Some(generation) = self.loaded else { return };
            if !self.is_playing() {
                return;
            }

            let next = {
                let mut media = self.shared.media();
                if media.generation() != generation {
                    drop(media);
                    self.loaded = None;
                    return;
                }
                let next = media.next_index();
                // Past the end the cursor rewinds so a resume starts over
                media.move_to(next.unwrap_or(0));
                next
            };

            match next {
                Some(index) => {
                    self.emit(EngineEvent::MediaItemTransition { index });
                    self.load_current();
                }
                None => {
                    self.loaded = None;
                    if self.shared.playing.swap(false, Ordering::SeqCst) {
                        self.emit(EngineEvent::IsPlayingChanged(false));
                    }
                    self.emit(EngineEvent::StateChanged(EngineState::Ended));
                }
            }
        }
    }

    fn decode(bytes: Vec<u8>) -> Result<Decoder<Cursor<Vec<u8>>>, EngineError> {
        Decoder::new(Cursor::new(bytes)).map_err(|e| EngineError::Stream(format!("Could not decode track: {}", e)))
    }

}
