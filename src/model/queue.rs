//! Play queue: ordered tracks plus the index of the one being played

use rand::seq::SliceRandom;
use rand::Rng;

use super::content::Item;

/// Ordered tracks and a current position.
///
/// `current_index < tracks.len()` whenever the queue is non-empty; an empty queue
/// always has index 0 and no current track.
#[derive(Clone, Debug, Default)]
pub struct PlayQueue {
    tracks: Vec<Item>,
    current_index: usize,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue wholesale, optionally shuffling first.
    ///
    /// `start_index` is clamped into range. An empty `tracks` leaves the queue empty.
    /// Returns the stored order.
    pub fn replace(&mut self, tracks: Vec<Item>, start_index: usize, shuffle: bool) -> &[Item] {
        self.replace_with_rng(tracks, start_index, shuffle, &mut rand::thread_rng())
    }

    pub fn replace_with_rng<R: Rng + ?Sized>(
        &mut self,
        mut tracks: Vec<Item>,
        start_index: usize,
        shuffle: bool,
        rng: &mut R,
    ) -> &[Item] {
        if tracks.is_empty() {
            self.clear();
            return &self.tracks;
        }

        if shuffle {
            tracks.shuffle(rng);
        }

        self.current_index = start_index.min(tracks.len() - 1);
        self.tracks = tracks;
        &self.tracks
    }

    /// Move forward one track. No wraparound.
    pub fn advance(&mut self) -> bool {
        if self.current_index + 1 < self.tracks.len() {
            self.current_index += 1;
            true
        } else {
            false
        }
    }

    /// Move back one track. No wraparound.
    pub fn retreat(&mut self) -> bool {
        if self.current_index > 0 && !self.tracks.is_empty() {
            self.current_index -= 1;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<&Item> {
        self.tracks.get(self.current_index)
    }

    /// Adopt an index reported by the engine. Out-of-range reports are ignored.
    pub fn sync_to(&mut self, index: usize) -> bool {
        if index < self.tracks.len() {
            self.current_index = index;
            true
        } else {
            tracing::warn!(index, len = self.tracks.len(), "Ignoring out-of-range queue index");
            false
        }
    }

    /// Natural end of the queue: point back at the first track
    pub fn reset_to_start(&mut self) {
        self.current_index = 0;
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.current_index = 0;
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn tracks(&self) -> &[Item] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
