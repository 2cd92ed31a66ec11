pub mod components;
pub mod detail;
pub mod listing;

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, DetailMode, ModalState, Screen};

pub fn render(f: &mut Frame, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)].as_ref())
        .split(f.area());

    render_header(f, root[0], app);

    match app.screen {
        Screen::Home => render_home(f, root[1], app),
        Screen::Listing => listing::render_users_table(f, root[1], app),
        Screen::Detail => detail::render_user_detail(f, root[1], app),
    }

    components::render_status_bar(f, root[2], app);

    if app.modal.is_some() {
        render_modal(f, f.area(), app);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &AppState) {
    let hints = match app.screen {
        Screen::Home => "Enter: view all users; q: quit",
        Screen::Listing => "j/k: move; Enter: details; Esc: home; q: quit",
        Screen::Detail => match app.detail.as_ref().map(|d| d.mode) {
            Some(DetailMode::Editing) => "Tab: switch field; Enter: save changes; Esc: cancel",
            _ => "e: edit; d: delete; Esc: back to users; q: quit",
        },
    };
    let p = Paragraph::new(format!(
        "userdir-manager  users:{}  — {hints}",
        app.listing.users.len()
    ))
    .block(
        Block::default()
            .title("userdir-manager")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    )
    .style(Style::default().fg(app.theme.header_fg).bg(app.theme.header_bg));
    f.render_widget(p, area);
}

fn render_home(f: &mut Frame, area: Rect, app: &AppState) {
    let rect = components::centered_rect(48, 7, area);
    let text = "User Directory\n\nManage users with full CRUD functionality\n\nPress Enter to view all users";
    let p = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(app.theme.text))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(p, rect);
}

fn render_modal(f: &mut Frame, area: Rect, app: &mut AppState) {
    if let Some(state) = app.modal.clone() {
        match state {
            ModalState::DeleteConfirm { .. } => {
                components::render_delete_modal(f, area, app, &state);
            }
            ModalState::Info { .. } => {
                components::render_info_modal(f, area, app, &state);
            }
        }
    }
}
