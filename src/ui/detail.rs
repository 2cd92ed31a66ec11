use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, DetailMode, DetailState, EditField};
use crate::ui::components;

pub fn render_user_detail(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(detail) = app.detail.as_ref() else {
        return;
    };
    match detail.mode {
        DetailMode::Loading => render_notice(f, area, app, "Loading user..."),
        DetailMode::NotFound => render_notice(f, area, app, "User not found"),
        DetailMode::Viewing => render_record(f, area, app, detail),
        DetailMode::Editing => render_form(f, area, app, detail),
    }
}

fn render_notice(f: &mut Frame, area: Rect, app: &AppState, message: &str) {
    let rect = components::centered_rect(28, 3, area);
    let p = Paragraph::new(message.to_string()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(p, rect);
}

fn render_record(f: &mut Frame, area: Rect, app: &AppState, detail: &DetailState) {
    let Some(u) = detail.record.as_ref() else {
        return;
    };
    let text = format!(
        "Name: {}\nEmail: {}\nUsername: {}\nPhone: {}\nWebsite: {}",
        u.name, u.email, u.username, u.phone, u.website
    );
    let p = Paragraph::new(text)
        .style(Style::default().fg(app.theme.text))
        .block(
            Block::default()
                .title("User Details")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(p, area);
}

fn render_form(f: &mut Frame, area: Rect, app: &AppState, detail: &DetailState) {
    let name_marker = if detail.focus == EditField::Name { "▶" } else { " " };
    let email_marker = if detail.focus == EditField::Email { "▶" } else { " " };
    let text = format!(
        "{} Name:  {}\n{} Email: {}\n\nEnter: save changes  Esc: cancel",
        name_marker, detail.form.name, email_marker, detail.form.email
    );
    let p = Paragraph::new(text)
        .style(Style::default().fg(app.theme.text))
        .block(
            Block::default()
                .title("Edit user")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(p, area);
}
