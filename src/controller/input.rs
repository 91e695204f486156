//! Key and focus event handling

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::model::{LibraryEntry, LoginField, Screen};
use super::AppController;

impl AppController {
    pub async fn handle_key_event(&self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        let model = &self.model;

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            model.set_should_quit(true).await;
            return Ok(());
        }

        // Error message blocks all other interactions
        if model.has_error().await {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                model.clear_error().await;
            }
            return Ok(());
        }

        if model.is_help_popup_open().await {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
                model.hide_help_popup().await;
            }
            return Ok(());
        }

        let ui_state = model.get_ui_state().await;

        // The login form takes printable keys as text
        if ui_state.screen == Screen::Login {
            self.handle_login_key(key).await;
            return Ok(());
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                model.set_should_quit(true).await;
                return Ok(());
            }
            KeyCode::Char('?') => {
                model.show_help_popup().await;
                return Ok(());
            }
            KeyCode::Esc | KeyCode::Backspace => {
                self.go_back().await;
                return Ok(());
            }
            _ => {}
        }

        // Ignore list actions while a request is in flight
        if ui_state.is_loading {
            return Ok(());
        }

        match ui_state.screen {
            Screen::Libraries => match key.code {
                KeyCode::Up | KeyCode::Char('k') => model.move_selection_up().await,
                KeyCode::Down | KeyCode::Char('j') => model.move_selection_down().await,
                KeyCode::Enter => match model.get_selected_library_entry().await {
                    LibraryEntry::Library(library) => {
                        let controller = self.clone();
                        tokio::spawn(async move { controller.open_library(library).await });
                    }
                    LibraryEntry::Logout => self.logout().await,
                },
                KeyCode::Char('s') | KeyCode::Char('S') => {
                    if let LibraryEntry::Library(library) = model.get_selected_library_entry().await {
                        let controller = self.clone();
                        tokio::spawn(async move { controller.shuffle_library(library).await });
                    }
                }
                KeyCode::Char('r') | KeyCode::Char('R') => {
                    let controller = self.clone();
                    tokio::spawn(async move {
                        controller.load_libraries().await;
                    });
                }
                KeyCode::Char('n') | KeyCode::Char('N') => self.show_now_playing().await,
                _ => {}
            },
            Screen::Tracks => match key.code {
                KeyCode::Up | KeyCode::Char('k') => model.move_selection_up().await,
                KeyCode::Down | KeyCode::Char('j') => model.move_selection_down().await,
                KeyCode::Enter => self.play_selected_track().await,
                KeyCode::Char('s') | KeyCode::Char('S') => self.shuffle_open_library().await,
                KeyCode::Char('n') | KeyCode::Char('N') => self.show_now_playing().await,
                _ => {}
            },
            Screen::NowPlaying => match key.code {
                KeyCode::Char(' ') | KeyCode::Enter => self.toggle_playback().await,
                KeyCode::Right | KeyCode::Char('n') | KeyCode::Char('N') => self.next_track(),
                KeyCode::Left | KeyCode::Char('p') | KeyCode::Char('P') => self.previous_track(),
                KeyCode::Char('x') | KeyCode::Char('X') => self.stop_playback().await,
                _ => {}
            },
            Screen::Loading | Screen::Login => {}
        }

        Ok(())
    }

    async fn handle_login_key(&self, key: KeyEvent) {
        let model = &self.model;
        if model.get_ui_state().await.is_loading {
            return;
        }

        match key.code {
            KeyCode::Tab | KeyCode::Down => model.login_focus_next().await,
            KeyCode::BackTab | KeyCode::Up => model.login_focus_prev().await,
            KeyCode::Enter => {
                if model.login_focused_field().await == LoginField::Password || model.get_login_form().await.can_submit()
                {
                    // Network bound; the render loop keeps drawing meanwhile
                    let controller = self.clone();
                    tokio::spawn(async move { controller.submit_login().await });
                } else {
                    model.login_focus_next().await;
                }
            }
            KeyCode::Backspace => model.login_backspace().await,
            KeyCode::Esc => self.go_back().await,
            KeyCode::Char(c) => model.login_push_char(c).await,
            _ => {}
        }
    }

    /// Terminal focus stands in for the UI binding to the playback service
    pub fn handle_focus_change(&self, gained: bool) {
        if gained {
            tracing::debug!("Terminal focus gained, binding");
            self.player.bind();
        } else {
            tracing::debug!("Terminal focus lost, unbinding");
            self.player.unbind();
        }
    }
}
