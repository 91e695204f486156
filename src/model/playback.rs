//! Playback-related types and state management

use std::time::Instant;

use crate::player::{LifecycleState, PlayerSnapshot};
use super::content::Item;

pub const NO_SONG: &str = "No Song";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Metadata about the currently playing track
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackMetadata {
    pub id: Option<String>,
    pub name: String,
    pub artist: String,
    pub album: String,
    pub duration_ms: u32,
}

impl Default for TrackMetadata {
    fn default() -> Self {
        Self {
            id: None,
            name: NO_SONG.to_string(),
            artist: UNKNOWN_ARTIST.to_string(),
            album: String::new(),
            duration_ms: 0,
        }
    }
}

impl TrackMetadata {
    pub fn from_item(item: Option<&Item>) -> Self {
        match item {
            Some(item) => Self {
                id: Some(item.id.clone()),
                name: item.display_name().to_string(),
                artist: item
                    .album_artist
                    .clone()
                    .filter(|a| !a.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
                album: item.album.clone().unwrap_or_default(),
                duration_ms: item.duration_ms().unwrap_or(0),
            },
            None => Self::default(),
        }
    }
}

/// Local clock for the progress bar; the engine does not report positions
#[derive(Clone, Debug)]
pub struct PlaybackTiming {
    pub position_ms: u32,
    pub last_update: Instant,
    pub is_playing: bool,
    pub duration_ms: u32,
}

impl Default for PlaybackTiming {
    fn default() -> Self {
        Self {
            position_ms: 0,
            last_update: Instant::now(),
            is_playing: false,
            duration_ms: 0,
        }
    }
}

impl PlaybackTiming {
    pub fn current_position_ms(&self) -> u32 {
        if self.is_playing && self.duration_ms > 0 {
            let elapsed = self.last_update.elapsed().as_millis().min(u32::MAX as u128) as u32;
            self.position_ms.saturating_add(elapsed).min(self.duration_ms)
        } else {
            self.position_ms.min(self.duration_ms)
        }
    }

    /// New track: start counting from zero
    pub fn restart(&mut self, duration_ms: u32, is_playing: bool) {
        self.position_ms = 0;
        self.duration_ms = duration_ms;
        self.is_playing = is_playing;
        self.last_update = Instant::now();
    }

    pub fn set_playing(&mut self, is_playing: bool) {
        if self.is_playing != is_playing {
            self.position_ms = self.current_position_ms();
            self.is_playing = is_playing;
            self.last_update = Instant::now();
        }
    }
}

/// Complete playback information for rendering the UI
#[derive(Clone, Debug, Default)]
pub struct PlaybackInfo {
    pub track: TrackMetadata,
    pub progress_ms: u32,
    pub duration_ms: u32,
    pub is_playing: bool,
    pub has_song: bool,
    pub index: usize,
    pub queue_len: usize,
    pub lifecycle: LifecycleState,
}

impl PlaybackInfo {
    pub fn from_snapshot(snapshot: &PlayerSnapshot, timing: &PlaybackTiming) -> Self {
        let track = TrackMetadata::from_item(snapshot.current.as_ref());
        Self {
            duration_ms: track.duration_ms,
            track,
            progress_ms: timing.current_position_ms(),
            is_playing: snapshot.is_playing,
            has_song: snapshot.current.is_some(),
            index: snapshot.index,
            queue_len: snapshot.queue_len,
            lifecycle: snapshot.lifecycle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn missing_song_uses_placeholders() {
        let meta = TrackMetadata::from_item(None);
        assert_eq!(meta.name, "No Song");
        assert_eq!(meta.artist, "Unknown Artist");
    }

    #[test]
    fn missing_artist_uses_placeholder() {
        let item: Item = serde_json::from_str(r#"{"Id": "1", "Name": "Song", "RunTimeTicks": 1800000000}"#).unwrap();
        let meta = TrackMetadata::from_item(Some(&item));
        assert_eq!(meta.name, "Song");
        assert_eq!(meta.artist, "Unknown Artist");
        assert_eq!(meta.duration_ms, 180_000);

        let item: Item = serde_json::from_str(r#"{"Id": "1", "Name": "Song", "AlbumArtist": "Band"}"#).unwrap();
        assert_eq!(TrackMetadata::from_item(Some(&item)).artist, "Band");
    }

    #[test]
    fn paused_clock_stands_still() {
        let mut timing = PlaybackTiming::default();
        timing.restart(10_000, false);
        timing.last_update -= Duration::from_secs(3);
        assert_eq!(timing.current_position_ms(), 0);
    }

    #[test]
    fn playing_clock_is_capped_at_duration() {
        let mut timing = PlaybackTiming::default();
        timing.restart(1_000, true);
        timing.last_update -= Duration::from_secs(5);
        assert_eq!(timing.current_position_ms(), 1_000);

        timing.set_playing(false);
        assert_eq!(timing.current_position_ms(), 1_000);
    }
}
