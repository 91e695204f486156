//! View module - UI rendering
//!
//! - `utils`: shared formatting helpers and the scrollable list
//! - `layout`: top bar with screen title and server/user info
//! - `login`: the login form
//! - `content`: loading screen, library list and track list
//! - `now_playing`: the now-playing screen with transport controls
//! - `progress`: bottom progress bar
//! - `overlays`: modal overlays (error, help)

mod utils;
mod layout;
mod login;
mod content;
mod now_playing;
mod progress;
mod overlays;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::model::{PlaybackInfo, Screen, UiState};

pub struct AppView;

impl AppView {
    pub fn render(frame: &mut Frame, playback: &PlaybackInfo, ui_state: &UiState) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title + status
                Constraint::Min(0),    // Current screen
                Constraint::Length(3), // Progress bar
            ])
            .split(frame.area());

        layout::render_top_bar(frame, chunks[0], ui_state, playback);

        match ui_state.screen {
            Screen::Loading => content::render_loading(frame, chunks[1]),
            Screen::Login => login::render_login(frame, chunks[1], ui_state),
            Screen::Libraries => content::render_libraries(frame, chunks[1], ui_state),
            Screen::Tracks => content::render_tracks(frame, chunks[1], ui_state, playback),
            Screen::NowPlaying => now_playing::render_now_playing(frame, chunks[1], playback),
        }

        progress::render_progress_bar(frame, chunks[2], playback);

        if ui_state.error_message.is_some() {
            overlays::render_error_notification(frame, ui_state);
        }

        if ui_state.show_help_popup {
            overlays::render_help_popup(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn render_to_string(playback: &PlaybackInfo, ui_state: &UiState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| AppView::render(f, playback, ui_state)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn now_playing_without_song_shows_placeholders() {
        let ui_state = UiState::new(Screen::NowPlaying);
        let text = render_to_string(&PlaybackInfo::default(), &ui_state);
        assert!(text.contains("No Song"));
        assert!(text.contains("Unknown Artist"));
    }

    #[test]
    fn libraries_screen_lists_logout() {
        let mut ui_state = UiState::new(Screen::Libraries);
        ui_state.libraries = vec![serde_json::from_str(r#"{"Id": "1", "Name": "My Music"}"#).unwrap()];
        let text = render_to_string(&PlaybackInfo::default(), &ui_state);
        assert!(text.contains("My Music"));
        assert!(text.contains("Logout"));
    }

    #[test]
    fn login_masks_password() {
        let mut ui_state = UiState::new(Screen::Login);
        ui_state.login.password = "secret".to_string();
        let text = render_to_string(&PlaybackInfo::default(), &ui_state);
        assert!(!text.contains("secret"));
        assert!(text.contains("Password"));
    }

    #[test]
    fn error_overlay_is_drawn() {
        let mut ui_state = UiState::new(Screen::Libraries);
        ui_state.error_message = Some("Could not reach".to_string());
        let text = render_to_string(&PlaybackInfo::default(), &ui_state);
        assert!(text.contains("Could not reach"));
    }
}
