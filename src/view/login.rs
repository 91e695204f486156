//! Login form rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use ratatui::widgets::Padding;

use crate::model::{LoginField, UiState};

fn render_field(frame: &mut Frame, area: Rect, label: &str, value: &str, focused: bool) {
    let border_style = if focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };
    let text = if focused { format!("{}_", value) } else { value.to_string() };

    let field = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", label))
            .padding(Padding::horizontal(1))
            .border_style(border_style),
    );
    frame.render_widget(field, area);
}

pub fn render_login(frame: &mut Frame, area: Rect, ui_state: &UiState) {
    let form = &ui_state.login;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Hostname
            Constraint::Length(3), // Username
            Constraint::Length(3), // Password
            Constraint::Length(3), // Submit
            Constraint::Min(0),
        ])
        .split(area);

    render_field(frame, chunks[0], "Hostname", &form.hostname, form.focused == LoginField::Hostname);
    render_field(frame, chunks[1], "Username", &form.username, form.focused == LoginField::Username);
    render_field(
        frame,
        chunks[2],
        "Password",
        &form.masked_password(),
        form.focused == LoginField::Password,
    );

    let (label, style) = if ui_state.is_loading {
        ("Logging in...", Style::default().fg(Color::Yellow))
    } else if form.can_submit() {
        (
            "[ Login ]  Enter",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )
    } else {
        ("[ Login ]  fill in all fields", Style::default().fg(Color::DarkGray))
    };

    let submit = Paragraph::new(label)
        .style(style)
        .block(Block::default().borders(Borders::ALL).padding(Padding::horizontal(1)));
    frame.render_widget(submit, chunks[3]);

    let hint = Paragraph::new("Tab / ↑↓ to move between fields, Ctrl+C to quit")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().padding(Padding::horizontal(1)));
    frame.render_widget(hint, chunks[4]);
}
