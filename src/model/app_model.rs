//! Main application model with state management

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::player::PlayerSnapshot;
use super::content::Item;
use super::playback::{PlaybackInfo, PlaybackTiming};
use super::types::{LibraryEntry, LoginField, LoginForm, Screen, UiState};

const ERROR_DISPLAY_SECS: u64 = 5;

/// Main application model containing all state
pub struct AppModel {
    pub ui_state: Arc<Mutex<UiState>>,
    snapshot: Arc<Mutex<PlayerSnapshot>>,
    playback_timing: Arc<Mutex<PlaybackTiming>>,
    pub should_quit: Arc<Mutex<bool>>,
}

impl AppModel {
    pub fn new(screen: Screen) -> Self {
        Self {
            ui_state: Arc::new(Mutex::new(UiState::new(screen))),
            snapshot: Arc::new(Mutex::new(PlayerSnapshot::default())),
            playback_timing: Arc::new(Mutex::new(PlaybackTiming::default())),
            should_quit: Arc::new(Mutex::new(false)),
        }
    }

    // ========================================================================
    // Playback state
    // ========================================================================

    /// Take in what the playback service published
    pub async fn apply_snapshot(&self, snapshot: PlayerSnapshot) {
        let mut current = self.snapshot.lock().await;
        let mut timing = self.playback_timing.lock().await;

        let track_changed = current.current.as_ref().map(|i| &i.id) != snapshot.current.as_ref().map(|i| &i.id)
            || current.index != snapshot.index;
        if track_changed {
            let duration_ms = snapshot.current.as_ref().and_then(Item::duration_ms).unwrap_or(0);
            timing.restart(duration_ms, snapshot.is_playing);
        } else {
            timing.set_playing(snapshot.is_playing);
        }

        *current = snapshot;
    }

    pub async fn get_playback_info(&self) -> PlaybackInfo {
        let snapshot = self.snapshot.lock().await;
        let timing = self.playback_timing.lock().await;
        PlaybackInfo::from_snapshot(&snapshot, &timing)
    }

    pub async fn is_playing(&self) -> bool {
        self.snapshot.lock().await.is_playing
    }

    pub async fn should_quit(&self) -> bool {
        *self.should_quit.lock().await
    }

    pub async fn set_should_quit(&self, quit: bool) {
        *self.should_quit.lock().await = quit;
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub async fn get_ui_state(&self) -> UiState {
        self.ui_state.lock().await.clone()
    }

    pub async fn current_screen(&self) -> Screen {
        self.ui_state.lock().await.screen
    }

    /// Push the current screen and show `screen`
    pub async fn navigate_to(&self, screen: Screen) {
        let mut state = self.ui_state.lock().await;
        if state.screen != screen {
            let previous = state.screen;
            state.navigation_stack.push(previous);
            state.screen = screen;
        }
    }

    /// Show `screen` with nothing to go back to
    pub async fn reset_to(&self, screen: Screen) {
        let mut state = self.ui_state.lock().await;
        state.navigation_stack.clear();
        state.screen = screen;
    }

    /// Pop back to where we were. Returns false at the root.
    pub async fn navigate_back(&self) -> bool {
        let mut state = self.ui_state.lock().await;
        match state.navigation_stack.pop() {
            Some(previous) => {
                state.screen = previous;
                true
            }
            None => false,
        }
    }

    /// Drop everything above the topmost `screen` on the stack and show it
    pub async fn pop_to(&self, screen: Screen) {
        let mut state = self.ui_state.lock().await;
        if state.screen == screen {
            return;
        }
        while let Some(previous) = state.navigation_stack.pop() {
            if previous == screen {
                break;
            }
        }
        state.screen = screen;
    }

    pub async fn set_content_loading(&self, loading: bool) {
        self.ui_state.lock().await.is_loading = loading;
    }

    // ========================================================================
    // Lists
    // ========================================================================

    pub async fn set_libraries(&self, libraries: Vec<Item>) {
        let mut state = self.ui_state.lock().await;
        state.libraries = libraries;
        state.library_selected = 0;
        state.is_loading = false;
    }

    pub async fn set_tracks(&self, library: Item, tracks: Vec<Item>) {
        let mut state = self.ui_state.lock().await;
        state.current_library = Some(library);
        state.tracks = tracks;
        state.track_selected = 0;
        state.is_loading = false;
    }

    pub async fn move_selection_up(&self) {
        let mut state = self.ui_state.lock().await;
        match state.screen {
            Screen::Libraries => {
                state.library_selected = state.library_selected.saturating_sub(1);
            }
            Screen::Tracks => {
                state.track_selected = state.track_selected.saturating_sub(1);
            }
            _ => {}
        }
    }

    pub async fn move_selection_down(&self) {
        let mut state = self.ui_state.lock().await;
        match state.screen {
            // One extra row for Logout
            Screen::Libraries => {
                if state.library_selected < state.libraries.len() {
                    state.library_selected += 1;
                }
            }
            Screen::Tracks => {
                if state.track_selected < state.tracks.len().saturating_sub(1) {
                    state.track_selected += 1;
                }
            }
            _ => {}
        }
    }

    pub async fn get_selected_library_entry(&self) -> LibraryEntry {
        self.ui_state.lock().await.selected_library_entry()
    }

    /// Tracks of the open library and the selected row
    pub async fn get_track_selection(&self) -> Option<(Vec<Item>, usize)> {
        let state = self.ui_state.lock().await;
        if state.tracks.is_empty() {
            None
        } else {
            Some((state.tracks.clone(), state.track_selected))
        }
    }

    // ========================================================================
    // Login form
    // ========================================================================

    pub async fn set_login_form(&self, form: LoginForm) {
        self.ui_state.lock().await.login = form;
    }

    pub async fn get_login_form(&self) -> LoginForm {
        self.ui_state.lock().await.login.clone()
    }

    pub async fn login_focus_next(&self) {
        let mut state = self.ui_state.lock().await;
        state.login.focused = state.login.focused.next();
    }

    pub async fn login_focus_prev(&self) {
        let mut state = self.ui_state.lock().await;
        state.login.focused = state.login.focused.prev();
    }

    pub async fn login_focused_field(&self) -> LoginField {
        self.ui_state.lock().await.login.focused
    }

    pub async fn login_push_char(&self, c: char) {
        self.ui_state.lock().await.login.push_char(c);
    }

    pub async fn login_backspace(&self) {
        self.ui_state.lock().await.login.backspace();
    }

    // ========================================================================
    // Overlays
    // ========================================================================

    pub async fn set_error(&self, message: String) {
        let mut state = self.ui_state.lock().await;
        state.error_message = Some(message);
        state.error_timestamp = Some(Instant::now());
    }

    pub async fn clear_error(&self) {
        let mut state = self.ui_state.lock().await;
        state.error_message = None;
        state.error_timestamp = None;
    }

    pub async fn has_error(&self) -> bool {
        self.ui_state.lock().await.error_message.is_some()
    }

    pub async fn auto_clear_old_errors(&self) {
        let mut state = self.ui_state.lock().await;
        if let Some(timestamp) = state.error_timestamp {
            if timestamp.elapsed().as_secs() > ERROR_DISPLAY_SECS {
                state.error_message = None;
                state.error_timestamp = None;
            }
        }
    }

    pub async fn show_help_popup(&self) {
        self.ui_state.lock().await.show_help_popup = true;
    }

    pub async fn hide_help_popup(&self) {
        self.ui_state.lock().await.show_help_popup = false;
    }

    pub async fn is_help_popup_open(&self) -> bool {
        self.ui_state.lock().await.show_help_popup
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> Item {
        serde_json::from_value(serde_json::json!({ "Id": id, "Name": id })).unwrap()
    }

    #[tokio::test]
    async fn navigation_stack_round_trip() {
        let model = AppModel::new(Screen::Libraries);
        model.navigate_to(Screen::Tracks).await;
        model.navigate_to(Screen::NowPlaying).await;
        assert_eq!(model.current_screen().await, Screen::NowPlaying);

        assert!(model.navigate_back().await);
        assert_eq!(model.current_screen().await, Screen::Tracks);
        assert!(model.navigate_back().await);
        assert!(!model.navigate_back().await);
        assert_eq!(model.current_screen().await, Screen::Libraries);
    }

    #[tokio::test]
    async fn pop_to_unwinds_stack() {
        let model = AppModel::new(Screen::Libraries);
        model.navigate_to(Screen::Tracks).await;
        model.navigate_to(Screen::NowPlaying).await;

        model.pop_to(Screen::Libraries).await;
        assert_eq!(model.current_screen().await, Screen::Libraries);
        assert!(model.get_ui_state().await.navigation_stack.is_empty());
    }

    #[tokio::test]
    async fn library_selection_reaches_logout() {
        let model = AppModel::new(Screen::Libraries);
        model.set_libraries(vec![item("a"), item("b")]).await;

        for _ in 0..5 {
            model.move_selection_down().await;
        }
        assert_eq!(model.get_selected_library_entry().await, LibraryEntry::Logout);

        model.move_selection_up().await;
        assert!(matches!(model.get_selected_library_entry().await, LibraryEntry::Library(i) if i.id == "b"));
    }

    #[tokio::test]
    async fn track_selection_is_clamped() {
        let model = AppModel::new(Screen::Tracks);
        assert!(model.get_track_selection().await.is_none());

        model.set_tracks(item("lib"), vec![item("1"), item("2")]).await;
        for _ in 0..5 {
            model.move_selection_down().await;
        }
        let (tracks, selected) = model.get_track_selection().await.unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(selected, 1);
    }

    #[tokio::test]
    async fn snapshot_drives_playback_info() {
        let model = AppModel::new(Screen::NowPlaying);
        assert_eq!(model.get_playback_info().await.track.name, "No Song");

        model
            .apply_snapshot(PlayerSnapshot {
                current: Some(item("Song")),
                queue_len: 1,
                is_playing: true,
                ..PlayerSnapshot::default()
            })
            .await;
        let info = model.get_playback_info().await;
        assert_eq!(info.track.name, "Song");
        assert!(info.is_playing);
        assert!(info.has_song);
    }

    #[tokio::test]
    async fn error_can_be_cleared() {
        let model = AppModel::new(Screen::Login);
        model.set_error("boom".to_string()).await;
        assert!(model.has_error().await);
        model.auto_clear_old_errors().await;
        assert!(model.has_error().await);
        model.clear_error().await;
        assert!(!model.has_error().await);
    }
}
