//! Progress bar rendering

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Gauge},
    Frame,
};

use crate::model::PlaybackInfo;
use super::utils::format_duration;

pub fn render_progress_bar(frame: &mut Frame, area: Rect, playback: &PlaybackInfo) {
    let status_text = if !playback.has_song {
        " Nothing playing".to_string()
    } else if playback.is_playing {
        format!(" ▶ {} | {}", playback.track.name, playback.track.artist)
    } else {
        format!(" ⏸ {} | {}", playback.track.name, playback.track.artist)
    };

    let time_str = if playback.duration_ms > 0 {
        format!(
            "{} / {}",
            format_duration(playback.progress_ms),
            format_duration(playback.duration_ms)
        )
    } else {
        String::new()
    };

    let progress_ratio = if playback.duration_ms > 0 {
        (playback.progress_ms as f64 / playback.duration_ms as f64).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let queue_info = if playback.queue_len > 0 {
        format!(" {} of {} | ? help ", playback.index + 1, playback.queue_len)
    } else {
        " ? help ".to_string()
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} ", status_text))
                .title_bottom(Line::from(queue_info).right_aligned()),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(progress_ratio)
        .label(time_str);

    frame.render_widget(gauge, area);
}
