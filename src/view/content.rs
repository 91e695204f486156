//! List screens (loading, libraries, tracks)

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, ListItem, Paragraph},
    Frame,
};
use ratatui::widgets::Padding;

use crate::model::{PlaybackInfo, UiState};
use super::utils::{calculate_num_width, format_duration, render_scrollable_list, truncate_string};

fn row_style(selected: bool) -> Style {
    if selected {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn list_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding::horizontal(1))
        .border_style(Style::default().fg(Color::Green))
}

pub fn render_loading(frame: &mut Frame, area: Rect) {
    let loading = Paragraph::new("Loading...")
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).padding(Padding::horizontal(1)));
    frame.render_widget(loading, area);
}

pub fn render_libraries(frame: &mut Frame, area: Rect, ui_state: &UiState) {
    if ui_state.is_loading {
        render_loading(frame, area);
        return;
    }

    let mut items: Vec<ListItem> = ui_state
        .libraries
        .iter()
        .enumerate()
        .map(|(i, library)| {
            ListItem::new(library.display_name().to_string()).style(row_style(i == ui_state.library_selected))
        })
        .collect();

    let logout_selected = ui_state.library_selected >= ui_state.libraries.len();
    items.push(
        ListItem::new("Logout").style(if logout_selected {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Red)
        }),
    );

    let title = if ui_state.libraries.is_empty() {
        " Libraries (no music libraries) "
    } else {
        " Libraries (Enter: open, s: shuffle) "
    };

    render_scrollable_list(frame, area, items, ui_state.library_selected, list_block(title));
}

pub fn render_tracks(frame: &mut Frame, area: Rect, ui_state: &UiState, playback: &PlaybackInfo) {
    if ui_state.is_loading {
        render_loading(frame, area);
        return;
    }

    if ui_state.tracks.is_empty() {
        let empty = Paragraph::new("This library has no tracks")
            .style(Style::default().fg(Color::DarkGray))
            .block(list_block(" Tracks "));
        frame.render_widget(empty, area);
        return;
    }

    let content_width = area.width.saturating_sub(4) as usize;
    let num_width = calculate_num_width(ui_state.tracks.len());
    let duration_width = 6;
    let remaining = content_width.saturating_sub(num_width + duration_width + 6);
    let title_width = (remaining * 60) / 100;
    let artist_width = remaining.saturating_sub(title_width);

    let playing_id = playback.track.id.as_deref();

    let items: Vec<ListItem> = ui_state
        .tracks
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let is_current = playing_id == Some(track.id.as_str());
            let marker = if is_current { "▶" } else { " " };
            let duration = track.duration_ms().map(format_duration).unwrap_or_default();

            let line = Line::from(vec![
                Span::raw(format!("{:>width$} {} ", i + 1, marker, width = num_width)),
                Span::raw(truncate_string(track.display_name(), title_width)),
                Span::raw("  "),
                Span::styled(
                    truncate_string(track.album_artist.as_deref().unwrap_or(""), artist_width),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(format!("{:>width$}", duration, width = duration_width)),
            ]);

            let style = if is_current && i != ui_state.track_selected {
                Style::default().fg(Color::Cyan)
            } else {
                row_style(i == ui_state.track_selected)
            };
            ListItem::new(line).style(style)
        })
        .collect();

    render_scrollable_list(
        frame,
        area,
        items,
        ui_state.track_selected,
        list_block(" Tracks (Enter: play, s: shuffle all) "),
    );
}
