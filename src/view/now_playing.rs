//! Now-playing screen

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::model::PlaybackInfo;

pub fn render_now_playing(frame: &mut Frame, area: Rect, playback: &PlaybackInfo) {
    let block = Block::default().borders(Borders::ALL).title(" Now Playing ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(2), // Title
            Constraint::Length(2), // Artist
            Constraint::Length(2), // Controls
            Constraint::Min(0),
        ])
        .split(inner);

    let title = Paragraph::new(playback.track.name.as_str())
        .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    frame.render_widget(title, chunks[1]);

    let artist = Paragraph::new(playback.track.artist.as_str())
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
    frame.render_widget(artist, chunks[2]);

    let play_pause = if playback.is_playing { "⏸ Pause" } else { "▶ Play" };
    let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let controls = Line::from(vec![
        Span::styled("←", key),
        Span::raw(" ⏮ Previous   "),
        Span::styled("Space", key),
        Span::raw(format!(" {}   ", play_pause)),
        Span::styled("→", key),
        Span::raw(" Next ⏭   "),
        Span::styled("x", key),
        Span::raw(" ⏹ Stop"),
    ]);
    frame.render_widget(Paragraph::new(controls).alignment(Alignment::Center), chunks[3]);
}
