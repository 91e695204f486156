//! Playback control methods

use std::sync::Arc;

use crate::model::{Item, Screen};
use crate::player::StreamResolver;

use super::AppController;

impl AppController {
    /// Play the open library starting at the selected track
    pub async fn play_selected_track(&self) {
        let Some((tracks, selected)) = self.model.get_track_selection().await else {
            return;
        };
        self.start_playback(tracks, selected, false).await;
    }

    /// Play every track of the open library in random order
    pub async fn shuffle_open_library(&self) {
        let Some((tracks, _)) = self.model.get_track_selection().await else {
            return;
        };
        self.start_playback(tracks, 0, true).await;
    }

    /// Fetch a library and play it shuffled without opening its track list
    pub async fn shuffle_library(&self, library: Item) {
        if let Some(tracks) = self.fetch_tracks(&library).await {
            self.start_playback(tracks, 0, true).await;
        }
    }

    async fn start_playback(&self, tracks: Vec<Item>, start_index: usize, shuffle: bool) {
        if tracks.is_empty() {
            tracing::info!("Nothing to play");
            return;
        }

        let client = match self.client().await {
            Ok(client) => client,
            Err(e) => {
                self.report_error("start_playback", e.into()).await;
                return;
            }
        };

        tracing::info!(tracks = tracks.len(), start_index, shuffle, "Starting playback");
        let resolver: Arc<dyn StreamResolver> = Arc::new(client);
        self.player.start(tracks, start_index, shuffle, resolver);
        self.model.navigate_to(Screen::NowPlaying).await;
    }

    pub async fn toggle_playback(&self) {
        let is_playing = self.model.is_playing().await;
        tracing::debug!(is_playing, "Toggling playback");

        if is_playing {
            self.player.pause();
        } else {
            self.player.resume();
        }
    }

    pub fn next_track(&self) {
        tracing::debug!("Skipping to next track");
        self.player.next();
    }

    pub fn previous_track(&self) {
        tracing::debug!("Skipping to previous track");
        self.player.previous();
    }

    /// Stop, clear the queue and go back to the library list
    pub async fn stop_playback(&self) {
        tracing::info!("Stopping playback");
        self.player.stop();
        self.model.pop_to(Screen::Libraries).await;
    }

    /// Jump to now-playing from a list when something is queued
    pub async fn show_now_playing(&self) {
        if self.player.current_song().is_some() {
            self.model.navigate_to(Screen::NowPlaying).await;
        }
    }
}
