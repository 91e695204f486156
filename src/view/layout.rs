//! Top bar rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use ratatui::widgets::Padding;

use crate::model::{PlaybackInfo, Screen, UiState};
use crate::player::LifecycleState;

fn screen_title(ui_state: &UiState) -> String {
    match ui_state.screen {
        Screen::Loading => "Loading".to_string(),
        Screen::Login => "Login".to_string(),
        Screen::Libraries => "Libraries".to_string(),
        Screen::Tracks => ui_state
            .current_library
            .as_ref()
            .map(|l| l.display_name().to_string())
            .unwrap_or_else(|| "Tracks".to_string()),
        Screen::NowPlaying => "Now Playing".to_string(),
    }
}

pub fn render_top_bar(frame: &mut Frame, area: Rect, ui_state: &UiState, playback: &PlaybackInfo) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Screen title
            Constraint::Length(24), // Service status
        ])
        .split(area);

    let depth = ui_state.navigation_stack.len();
    let breadcrumb = if depth > 0 {
        format!("{}  (Esc: back)", screen_title(ui_state))
    } else {
        screen_title(ui_state)
    };

    let title = Paragraph::new(breadcrumb)
        .style(Style::default().fg(Color::Green))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Jellyfin ")
                .padding(Padding::horizontal(1)),
        );
    frame.render_widget(title, chunks[0]);

    let status = match (playback.lifecycle, playback.queue_len) {
        (LifecycleState::Foreground, _) => "● background".to_string(),
        (_, 0) => "idle".to_string(),
        (_, len) => format!("track {}/{}", playback.index + 1, len),
    };
    let status = Paragraph::new(status)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL).title(" Queue "));
    frame.render_widget(status, chunks[1]);
}
