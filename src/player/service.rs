//! The task that owns the playback engine

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::audio::{EngineEvent, EngineEventReceiver, EngineState, PlaybackEngine, RepeatMode};
use crate::model::{Item, PlayQueue};

use super::lifecycle::{ForegroundLifecycle, ForegroundNotifier};
use super::{PlayerCommand, PlayerHandle, PlayerSnapshot, StreamResolver};

/// Keeps the queue and the engine in step.
///
/// The queue index only ever moves in response to engine events; `next`/`previous`
/// just ask the engine to seek.
pub struct PlaybackService {
    engine: Box<dyn PlaybackEngine>,
    queue: PlayQueue,
    lifecycle: ForegroundLifecycle,
    repeat: RepeatMode,
    commands: mpsc::UnboundedReceiver<PlayerCommand>,
    engine_events: EngineEventReceiver,
    snapshot_tx: watch::Sender<PlayerSnapshot>,
    last_error: Option<String>,
}

impl PlaybackService {
    pub fn spawn(
        engine: Box<dyn PlaybackEngine>,
        engine_events: EngineEventReceiver,
        notifier: Box<dyn ForegroundNotifier>,
        repeat: RepeatMode,
    ) -> (PlayerHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(PlayerSnapshot::default());

        let service = PlaybackService {
            engine,
            queue: PlayQueue::new(),
            lifecycle: ForegroundLifecycle::new(notifier),
            repeat,
            commands: command_rx,
            engine_events,
            snapshot_tx,
            last_error: None,
        };

        let task = tokio::spawn(service.run());
        let handle = PlayerHandle {
            commands: command_tx,
            snapshot: snapshot_rx,
        };
        (handle, task)
    }

    async fn run(mut self) {
        tracing::info!(repeat = ?self.repeat, "Playback service started");

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(PlayerCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(event) = self.engine_events.recv() => self.handle_engine_event(event),
            }
            self.publish();
        }

        self.teardown();
        self.publish();
        tracing::info!("Playback service stopped");
    }

    fn handle_command(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::Start {
                tracks,
                start_index,
                shuffle,
                resolver,
            } => self.start(tracks, start_index, shuffle, resolver),
            PlayerCommand::Pause => {
                tracing::debug!("Pause");
                self.engine.pause();
            }
            PlayerCommand::Resume => {
                tracing::debug!("Resume");
                self.engine.play();
            }
            PlayerCommand::Next => {
                if self.engine.has_next() {
                    tracing::debug!("Seeking to next item");
                    self.engine.seek_to_next();
                }
            }
            PlayerCommand::Previous => {
                if self.engine.has_previous() {
                    tracing::debug!("Seeking to previous item");
                    self.engine.seek_to_previous();
                }
            }
            PlayerCommand::Stop => {
                tracing::info!("Stopping playback and clearing queue");
                self.engine.stop();
                self.queue.clear();
            }
            PlayerCommand::Bind => self.lifecycle.on_bind(),
            PlayerCommand::Unbind => {
                let is_playing = self.engine.is_playing();
                self.lifecycle.on_unbind(is_playing, self.queue.current());
            }
            // Handled by the run loop
            PlayerCommand::Shutdown => {}
        }
    }

    fn start(&mut self, tracks: Vec<Item>, start_index: usize, shuffle: bool, resolver: Arc<dyn StreamResolver>) {
        self.last_error = None;

        let order = self.queue.replace(tracks, start_index, shuffle).to_vec();
        if order.is_empty() {
            tracing::info!("Start requested with no tracks, stopping");
            self.engine.stop();
            return;
        }

        let urls: Result<Vec<String>, _> = order.iter().map(|track| resolver.stream_url(track)).collect();
        let urls = match urls {
            Ok(urls) => urls,
            Err(e) => {
                tracing::error!(error = %e, "Could not resolve stream URLs");
                self.last_error = Some(format!("Could not start playback: {}", e));
                self.queue.clear();
                self.engine.stop();
                return;
            }
        };

        let start = self.queue.current_index();
        tracing::info!(tracks = urls.len(), start, shuffle, "Starting playback");

        if let Err(e) = self.engine.set_media_items(urls, start) {
            tracing::error!(error = %e, "Engine rejected the queue");
            self.last_error = Some(e.to_string());
            self.queue.clear();
            return;
        }
        self.engine.set_repeat_mode(self.repeat);
        self.engine.play();
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::MediaItemTransition { index } => {
                tracing::debug!(index, "Engine moved to item");
                self.queue.sync_to(index);
            }
            EngineEvent::StateChanged(EngineState::Ended) => {
                tracing::debug!("Engine reached end of queue");
                self.queue.reset_to_start();
            }
            EngineEvent::StateChanged(state) => {
                tracing::trace!(state = ?state, "Engine state changed");
            }
            EngineEvent::IsPlayingChanged(playing) => {
                tracing::debug!(playing, "Engine playing state changed");
            }
            EngineEvent::Error(message) => {
                tracing::warn!(message = %message, "Engine reported an error");
                self.last_error = Some(message);
            }
        }
    }

    fn publish(&self) {
        let snapshot = PlayerSnapshot {
            current: self.queue.current().cloned(),
            index: self.queue.current_index(),
            queue_len: self.queue.len(),
            is_playing: self.engine.is_playing(),
            ui_bound: self.lifecycle.ui_attached(),
            lifecycle: self.lifecycle.state(),
            last_error: self.last_error.clone(),
        };
        self.snapshot_tx.send_if_modified(|current| {
            if *current != snapshot {
                *current = snapshot;
                true
            } else {
                false
            }
        });
    }

    fn teardown(&mut self) {
        self.lifecycle.teardown();
        self.engine.release();
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{event_channel, EngineEventSender, SilentEngine};
    use crate::error::ClientError;
    use crate::player::lifecycle::tests::RecordingNotifier;
    use crate::player::LifecycleState;
    use std::time::Duration;

    struct FakeResolver;

    impl StreamResolver for FakeResolver {
        fn stream_url(&self, item: &Item) -> Result<String, ClientError> {
            Ok(format!("http://h/Audio/{}/stream", item.id))
        }
    }

    struct FailingResolver;

    impl StreamResolver for FailingResolver {
        fn stream_url(&self, _item: &Item) -> Result<String, ClientError> {
            Err(ClientError::NotAuthenticated)
        }
    }

    fn track(id: &str) -> Item {
        serde_json::from_value(serde_json::json!({ "Id": id, "Name": format!("Track {}", id) })).unwrap()
    }

    fn tracks(n: usize) -> Vec<Item> {
        (0..n).map(|i| track(&i.to_string())).collect()
    }

    fn spawn(repeat: RepeatMode) -> (PlayerHandle, EngineEventSender, RecordingNotifier) {
        let (events_tx, events_rx) = event_channel();
        let engine = SilentEngine::new(events_tx.clone());
        let notifier = RecordingNotifier::default();
        let (handle, _task) = PlaybackService::spawn(Box::new(engine), events_rx, Box::new(notifier.clone()), repeat);
        (handle, events_tx, notifier)
    }

    async fn wait_for(handle: &PlayerHandle, pred: impl FnMut(&PlayerSnapshot) -> bool) -> PlayerSnapshot {
        let mut rx = handle.subscribe();
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(pred))
            .await
            .expect("timed out waiting for snapshot")
            .expect("service gone")
            .clone()
    }

    #[tokio::test]
    async fn fresh_service_is_unbound_and_empty() {
        let (handle, _events, _) = spawn(RepeatMode::All);
        let snap = handle.snapshot();
        assert!(!snap.ui_bound);
        assert!(snap.current.is_none());
        assert_eq!(
            crate::model::initial_screen(true, snap.ui_bound, snap.current.is_some()),
            crate::model::Screen::Loading
        );
    }

    #[tokio::test]
    async fn start_plays_from_start_index() {
        let (handle, _events, _) = spawn(RepeatMode::Off);
        handle.start(tracks(3), 1, false, Arc::new(FakeResolver));

        let snap = wait_for(&handle, |s| s.is_playing).await;
        assert_eq!(snap.current.unwrap().id, "1");
        assert_eq!(snap.queue_len, 3);
    }

    #[tokio::test]
    async fn next_and_previous_follow_engine_transitions() {
        let (handle, _events, _) = spawn(RepeatMode::Off);
        handle.start(tracks(3), 0, false, Arc::new(FakeResolver));
        wait_for(&handle, |s| s.is_playing).await;

        handle.next();
        let snap = wait_for(&handle, |s| s.index == 1).await;
        assert_eq!(snap.current.unwrap().id, "1");

        handle.next();
        wait_for(&handle, |s| s.index == 2).await;

        // No next item with repeat off: stays put
        handle.next();
        handle.previous();
        let snap = wait_for(&handle, |s| s.index == 1).await;
        assert_eq!(snap.current.unwrap().id, "1");
    }

    #[tokio::test]
    async fn ended_resets_to_first_track() {
        let (handle, events, _) = spawn(RepeatMode::Off);
        handle.start(tracks(3), 0, false, Arc::new(FakeResolver));
        wait_for(&handle, |s| s.is_playing).await;

        events.send(EngineEvent::MediaItemTransition { index: 2 }).unwrap();
        wait_for(&handle, |s| s.index == 2).await;

        events.send(EngineEvent::StateChanged(EngineState::Ended)).unwrap();
        let snap = wait_for(&handle, |s| s.index == 0).await;
        assert_eq!(snap.current.unwrap().id, "0");
    }

    #[tokio::test]
    async fn out_of_range_transition_is_ignored() {
        let (handle, events, _) = spawn(RepeatMode::Off);
        handle.start(tracks(2), 1, false, Arc::new(FakeResolver));
        wait_for(&handle, |s| s.is_playing).await;

        events.send(EngineEvent::MediaItemTransition { index: 7 }).unwrap();
        events.send(EngineEvent::Error("marker".to_string())).unwrap();
        let snap = wait_for(&handle, |s| s.last_error.is_some()).await;
        assert_eq!(snap.index, 1);
    }

    #[tokio::test]
    async fn shuffled_start_keeps_every_track() {
        let (handle, _events, _) = spawn(RepeatMode::All);
        handle.start(tracks(10), 0, true, Arc::new(FakeResolver));
        let snap = wait_for(&handle, |s| s.is_playing).await;
        assert_eq!(snap.queue_len, 10);
        assert!(snap.current.is_some());
    }

    #[tokio::test]
    async fn stop_clears_queue() {
        let (handle, _events, _) = spawn(RepeatMode::All);
        handle.start(tracks(2), 0, false, Arc::new(FakeResolver));
        wait_for(&handle, |s| s.is_playing).await;

        handle.stop();
        let snap = wait_for(&handle, |s| !s.is_playing && s.queue_len == 0).await;
        assert!(snap.current.is_none());
        assert!(handle.current_song().is_none());
    }

    #[tokio::test]
    async fn empty_start_has_no_current_song() {
        let (handle, _events, _) = spawn(RepeatMode::All);
        handle.start(Vec::new(), 0, false, Arc::new(FakeResolver));
        handle.bind();
        let snap = wait_for(&handle, |s| s.ui_bound).await;
        assert!(snap.current.is_none());
        assert!(!snap.is_playing);
    }

    #[tokio::test]
    async fn resolver_failure_is_reported() {
        let (handle, _events, _) = spawn(RepeatMode::All);
        handle.start(tracks(2), 0, false, Arc::new(FailingResolver));
        let snap = wait_for(&handle, |s| s.last_error.is_some()).await;
        assert_eq!(snap.queue_len, 0);
        assert!(snap.last_error.unwrap().contains("Not authenticated"));
    }

    #[tokio::test]
    async fn pause_and_resume() {
        let (handle, _events, _) = spawn(RepeatMode::All);
        handle.start(tracks(2), 0, false, Arc::new(FakeResolver));
        wait_for(&handle, |s| s.is_playing).await;

        handle.pause();
        wait_for(&handle, |s| !s.is_playing).await;
        handle.resume();
        let snap = wait_for(&handle, |s| s.is_playing).await;
        assert_eq!(snap.index, 0);
    }

    #[tokio::test]
    async fn unbind_while_playing_goes_foreground() {
        let (handle, _events, notifier) = spawn(RepeatMode::All);
        handle.bind();
        handle.start(tracks(2), 0, false, Arc::new(FakeResolver));
        wait_for(&handle, |s| s.is_playing).await;

        handle.unbind();
        let snap = wait_for(&handle, |s| s.lifecycle == LifecycleState::Foreground).await;
        assert!(!snap.ui_bound);
        assert_eq!(
            notifier.calls.lock().unwrap().first().unwrap(),
            "show:Track 0 - Tap to open media controls"
        );

        handle.bind();
        wait_for(&handle, |s| s.lifecycle == LifecycleState::Bound && s.ui_bound).await;
    }

    #[tokio::test]
    async fn shutdown_ends_the_task() {
        let (events_tx, events_rx) = event_channel();
        let engine = SilentEngine::new(events_tx);
        let (handle, task) = PlaybackService::spawn(
            Box::new(engine),
            events_rx,
            Box::new(RecordingNotifier::default()),
            RepeatMode::All,
        );
        handle.shutdown();
        tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
    }
}
