//! Listener for snapshots published by the playback service

use tokio::task::JoinHandle;

use super::AppController;

impl AppController {
    /// Mirror every snapshot into the model. Ends when the service goes away.
    pub fn start_player_event_listener(&self) -> JoinHandle<()> {
        let model = self.model.clone();
        let mut snapshots = self.player.subscribe();
        tracing::info!("Starting playback snapshot listener");

        tokio::spawn(async move {
            let mut last_error: Option<String> = None;

            loop {
                let snapshot = snapshots.borrow_and_update().clone();

                if snapshot.last_error != last_error {
                    if let Some(message) = &snapshot.last_error {
                        tracing::warn!(error = %message, "Playback service reported an error");
                        model.set_error(message.clone()).await;
                    }
                    last_error = snapshot.last_error.clone();
                }

                tracing::trace!(
                    index = snapshot.index,
                    queue_len = snapshot.queue_len,
                    is_playing = snapshot.is_playing,
                    lifecycle = ?snapshot.lifecycle,
                    "Player snapshot"
                );
                model.apply_snapshot(snapshot).await;

                if snapshots.changed().await.is_err() {
                    tracing::debug!("Playback service closed, listener shutting down");
                    break;
                }
            }
        })
    }
}
