use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::sync::mpsc;
use std::time::Duration;
use tracing::info;

use crate::api::DirectoryClient;
use crate::api::dispatch::{ApiEvent, Command, Dispatcher};
use crate::app::{
    AppState, DetailMode, DetailState, EditField, FormBuffer, ModalState, PendingUpdate, Screen,
};
use crate::ui;

pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    client: DirectoryClient,
) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let dispatcher = Dispatcher::new(client, tx);
    let mut app = AppState::new();

    loop {
        terminal.draw(|f| {
            ui::render(f, &mut app);
        })?;

        while let Ok(api_event) = rx.try_recv() {
            handle_api_event(&mut app, api_event);
        }

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    for command in handle_key(&mut app, key.code) {
                        dispatcher.execute(command);
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Enter the listing screen and start a fresh collection fetch. The previous
/// snapshot is discarded; every entry re-fetches from the service.
pub fn open_listing(app: &mut AppState) -> Command {
    let token = app.next_token();
    app.screen = Screen::Listing;
    app.detail = None;
    app.listing.loading = true;
    app.listing.users.clear();
    app.listing.selected = 0;
    app.listing.token = token;
    Command::LoadUsers { token }
}

/// Enter the detail screen for `id` and start its fetch.
pub fn open_detail(app: &mut AppState, id: u64) -> Command {
    let token = app.next_token();
    app.screen = Screen::Detail;
    app.detail = Some(DetailState::loading(id, token));
    Command::LoadUser { token, id }
}

/// Map a key press to state changes plus any requests to issue.
pub fn handle_key(app: &mut AppState, code: KeyCode) -> Vec<Command> {
    if app.modal.is_some() {
        return handle_modal_key(app, code);
    }
    match app.screen {
        Screen::Home => match code {
            KeyCode::Char('q') => {
                app.should_quit = true;
                Vec::new()
            }
            KeyCode::Enter => vec![open_listing(app)],
            _ => Vec::new(),
        },
        Screen::Listing => handle_listing_key(app, code),
        Screen::Detail => handle_detail_key(app, code),
    }
}

fn handle_listing_key(app: &mut AppState, code: KeyCode) -> Vec<Command> {
    match code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            Vec::new()
        }
        KeyCode::Esc => {
            app.screen = Screen::Home;
            Vec::new()
        }
        KeyCode::Up | KeyCode::Char('k') => {
            if app.listing.selected > 0 {
                app.listing.selected -= 1;
            }
            Vec::new()
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.listing.selected + 1 < app.listing.users.len() {
                app.listing.selected += 1;
            }
            Vec::new()
        }
        KeyCode::Left | KeyCode::Char('h') => {
            let rpp = app.rows_per_page.max(1);
            if app.listing.selected >= rpp {
                app.listing.selected -= rpp;
            } else {
                app.listing.selected = 0;
            }
            Vec::new()
        }
        KeyCode::Right | KeyCode::Char('l') => {
            let rpp = app.rows_per_page.max(1);
            let new_idx = app.listing.selected.saturating_add(rpp);
            app.listing.selected = new_idx.min(app.listing.users.len().saturating_sub(1));
            Vec::new()
        }
        KeyCode::Enter => match app.selected_user().map(|u| u.id) {
            Some(id) => vec![open_detail(app, id)],
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn handle_detail_key(app: &mut AppState, code: KeyCode) -> Vec<Command> {
    let Some(mode) = app.detail.as_ref().map(|d| d.mode) else {
        return Vec::new();
    };
    match mode {
        DetailMode::Loading | DetailMode::NotFound => match code {
            KeyCode::Char('q') => {
                app.should_quit = true;
                Vec::new()
            }
            KeyCode::Esc | KeyCode::Backspace => vec![open_listing(app)],
            _ => Vec::new(),
        },
        DetailMode::Viewing => match code {
            KeyCode::Char('q') => {
                app.should_quit = true;
                Vec::new()
            }
            KeyCode::Esc | KeyCode::Backspace => vec![open_listing(app)],
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(d) = app.detail.as_mut() {
                    if d.record.is_some() {
                        d.mode = DetailMode::Editing;
                        d.focus = EditField::Name;
                    }
                }
                Vec::new()
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if app.detail.as_ref().is_some_and(|d| d.record.is_some()) {
                    app.modal = Some(ModalState::DeleteConfirm { selected: 1 });
                }
                Vec::new()
            }
            _ => Vec::new(),
        },
        DetailMode::Editing => handle_edit_key(app, code),
    }
}

fn handle_edit_key(app: &mut AppState, code: KeyCode) -> Vec<Command> {
    match code {
        KeyCode::Enter => submit_update(app).into_iter().collect(),
        KeyCode::Esc => {
            cancel_edit(app);
            Vec::new()
        }
        KeyCode::Tab | KeyCode::Up | KeyCode::Down => {
            if let Some(d) = app.detail.as_mut() {
                d.focus = match d.focus {
                    EditField::Name => EditField::Email,
                    EditField::Email => EditField::Name,
                };
            }
            Vec::new()
        }
        KeyCode::Backspace => {
            if let Some(d) = app.detail.as_mut() {
                match d.focus {
                    EditField::Name => {
                        d.form.name.pop();
                    }
                    EditField::Email => {
                        d.form.email.pop();
                    }
                }
            }
            Vec::new()
        }
        KeyCode::Char(c) => {
            if let Some(d) = app.detail.as_mut() {
                match d.focus {
                    EditField::Name => d.form.name.push(c),
                    EditField::Email => d.form.email.push(c),
                }
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn handle_modal_key(app: &mut AppState, code: KeyCode) -> Vec<Command> {
    match &mut app.modal {
        Some(ModalState::DeleteConfirm { selected }) => match code {
            KeyCode::Esc => {
                app.modal = None;
                Vec::new()
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                *selected = if *selected == 0 { 1 } else { 0 };
                Vec::new()
            }
            KeyCode::Enter => {
                if *selected == 0 {
                    confirm_delete(app)
                } else {
                    app.modal = None;
                    Vec::new()
                }
            }
            _ => Vec::new(),
        },
        Some(ModalState::Info { .. }) => match code {
            KeyCode::Esc | KeyCode::Enter => {
                app.modal = None;
                Vec::new()
            }
            _ => Vec::new(),
        },
        None => Vec::new(),
    }
}

/// Submit the edit form: capture the pre-image, apply the form onto the
/// displayed record, leave edit mode, and issue the replace request. The
/// screen shows the new values before the response resolves.
fn submit_update(app: &mut AppState) -> Option<Command> {
    let ready = matches!(
        app.detail.as_ref(),
        Some(d) if d.mode == DetailMode::Editing
            && d.record.is_some()
            && !d.form.name.is_empty()
            && !d.form.email.is_empty()
    );
    if !ready {
        // Presence of name and email is the only validation.
        return None;
    }

    let token = app.next_token();
    let detail = app.detail.as_mut()?;
    let previous = detail.record.as_ref()?.clone();

    let mut updated = previous.clone();
    updated.name = detail.form.name.clone();
    updated.email = detail.form.email.clone();

    detail.pending = Some(PendingUpdate {
        token,
        form: FormBuffer::from_record(&previous),
        record: previous,
    });
    detail.record = Some(updated.clone());
    detail.mode = DetailMode::Viewing;

    Some(Command::SubmitUpdate {
        token,
        record: updated,
    })
}

/// Leave edit mode without mutating; the form buffer snaps back to the
/// displayed record.
fn cancel_edit(app: &mut AppState) {
    if let Some(d) = app.detail.as_mut() {
        if let Some(record) = d.record.as_ref() {
            d.form = FormBuffer::from_record(record);
        }
        d.mode = DetailMode::Viewing;
    }
}

/// Confirmed delete: navigate to the listing first, then fire the delete in
/// the background. Its outcome never reaches the screen.
fn confirm_delete(app: &mut AppState) -> Vec<Command> {
    app.modal = None;
    let Some(id) = app.detail.as_ref().map(|d| d.id) else {
        return Vec::new();
    };
    let load = open_listing(app);
    vec![load, Command::SubmitDelete { id }]
}

/// Apply a finished request to the state it was issued for. Events whose
/// token no longer matches are dropped without touching anything.
pub fn handle_api_event(app: &mut AppState, api_event: ApiEvent) {
    match api_event {
        ApiEvent::UsersListed { token, users } => {
            // The listing snapshot is updated even if another screen is on
            // top of it; only a stale generation is dropped.
            if app.listing.token != token {
                return;
            }
            app.listing.loading = false;
            app.listing.users = users.unwrap_or_default();
            if app.listing.selected >= app.listing.users.len() {
                app.listing.selected = app.listing.users.len().saturating_sub(1);
            }
        }
        ApiEvent::UserFetched { token, id: _, user } => {
            let Some(detail) = app.detail.as_mut() else {
                return;
            };
            if detail.token != token || detail.mode != DetailMode::Loading {
                return;
            }
            match user {
                Some(record) => {
                    detail.form = FormBuffer::from_record(&record);
                    detail.record = Some(record);
                    detail.mode = DetailMode::Viewing;
                }
                None => detail.mode = DetailMode::NotFound,
            }
        }
        ApiEvent::UserUpdated { token, id, ok } => {
            let Some(detail) = app.detail.as_mut() else {
                return;
            };
            let Some(pending) = detail.pending.take() else {
                return;
            };
            if pending.token != token {
                detail.pending = Some(pending);
                return;
            }
            if ok {
                // Already applied optimistically; nothing visible changes.
                return;
            }
            detail.record = Some(pending.record);
            detail.form = pending.form;
            detail.mode = DetailMode::Viewing;
            app.modal = Some(ModalState::Info {
                message: format!("Failed to update user {id}"),
            });
        }
        ApiEvent::UserDeleted { id, ok } => {
            // Navigation already happened; the outcome is only worth a log
            // line (failure detail is logged where the request ran).
            if ok {
                info!("user {id} deleted");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UserRecord;

    fn mk_record(id: u64, name: &str, email: &str) -> UserRecord {
        UserRecord {
            id,
            name: name.to_string(),
            username: format!("user{id}"),
            email: email.to_string(),
            phone: "1-770-736-8031".to_string(),
            website: "hildegard.org".to_string(),
        }
    }

    fn load_users_token(command: &Command) -> u64 {
        match command {
            Command::LoadUsers { token } => *token,
            other => panic!("expected LoadUsers, got {other:?}"),
        }
    }

    fn load_user_token(command: &Command) -> u64 {
        match command {
            Command::LoadUser { token, .. } => *token,
            other => panic!("expected LoadUser, got {other:?}"),
        }
    }

    /// App sitting on the detail screen in `Viewing` with a fetched record.
    fn app_viewing(record: UserRecord) -> AppState {
        let mut app = AppState::new();
        let command = open_detail(&mut app, record.id);
        let token = load_user_token(&command);
        handle_api_event(
            &mut app,
            ApiEvent::UserFetched {
                token,
                id: record.id,
                user: Some(record),
            },
        );
        app
    }

    #[test]
    fn open_listing_starts_collection_fetch() {
        let mut app = AppState::new();
        let command = open_listing(&mut app);

        assert_eq!(app.screen, Screen::Listing);
        assert!(app.listing.loading);
        assert_eq!(command, Command::LoadUsers { token: app.listing.token });
    }

    #[test]
    fn listing_fills_one_row_per_record_in_order() {
        let mut app = AppState::new();
        let token = load_users_token(&open_listing(&mut app));

        let users = vec![
            mk_record(3, "Clementine Bauch", "Nathan@yesenia.net"),
            mk_record(1, "Leanne Graham", "Sincere@april.biz"),
            mk_record(2, "Ervin Howell", "Shanna@melissa.tv"),
        ];
        handle_api_event(
            &mut app,
            ApiEvent::UsersListed {
                token,
                users: Some(users.clone()),
            },
        );

        assert!(!app.listing.loading);
        assert_eq!(app.listing.users, users);
    }

    #[test]
    fn failed_listing_falls_back_to_empty() {
        let mut app = AppState::new();
        let token = load_users_token(&open_listing(&mut app));

        handle_api_event(&mut app, ApiEvent::UsersListed { token, users: None });

        assert!(!app.listing.loading, "loading clears on failure too");
        assert!(app.listing.users.is_empty());
        assert_eq!(app.screen, Screen::Listing);
        assert!(app.modal.is_none(), "listing failures are silent");
    }

    #[test]
    fn stale_listing_result_is_dropped() {
        let mut app = AppState::new();
        let stale = load_users_token(&open_listing(&mut app));
        // Re-entering the listing issues a new generation.
        let fresh = load_users_token(&open_listing(&mut app));
        assert_ne!(stale, fresh);

        handle_api_event(
            &mut app,
            ApiEvent::UsersListed {
                token: stale,
                users: Some(vec![mk_record(1, "Leanne Graham", "Sincere@april.biz")]),
            },
        );

        assert!(app.listing.loading, "stale result must not clear loading");
        assert!(app.listing.users.is_empty());
    }

    #[test]
    fn listing_result_lands_while_detail_is_on_top() {
        let mut app = AppState::new();
        let token = load_users_token(&open_listing(&mut app));

        // Navigate onto a detail before the collection fetch resolves.
        app.screen = Screen::Detail;
        app.detail = Some(DetailState::loading(1, 99));

        handle_api_event(
            &mut app,
            ApiEvent::UsersListed {
                token,
                users: Some(vec![
                    mk_record(1, "Leanne Graham", "Sincere@april.biz"),
                    mk_record(2, "Ervin Howell", "Shanna@melissa.tv"),
                ]),
            },
        );

        // Wasted work, not an error: the hidden listing state absorbed it.
        assert_eq!(app.screen, Screen::Detail);
        assert_eq!(app.listing.users.len(), 2);
    }

    #[test]
    fn fetched_record_prefills_form_buffer() {
        let record = mk_record(42, "Ervin Howell", "Shanna@melissa.tv");
        let app = app_viewing(record.clone());

        let detail = app.detail.as_ref().unwrap();
        assert_eq!(detail.mode, DetailMode::Viewing);
        assert_eq!(detail.record.as_ref().unwrap(), &record);
        assert_eq!(detail.form.name, "Ervin Howell");
        assert_eq!(detail.form.email, "Shanna@melissa.tv");
    }

    #[test]
    fn fetch_failure_collapses_into_not_found() {
        let mut app = AppState::new();
        let token = load_user_token(&open_detail(&mut app, 9999));

        handle_api_event(
            &mut app,
            ApiEvent::UserFetched {
                token,
                id: 9999,
                user: None,
            },
        );

        assert_eq!(app.detail.as_ref().unwrap().mode, DetailMode::NotFound);
        assert!(app.modal.is_none(), "initial fetch failures show no notice");
    }

    #[test]
    fn edit_keys_mutate_only_the_focused_field() {
        let mut app = app_viewing(mk_record(1, "Leanne Graham", "Sincere@april.biz"));
        handle_key(&mut app, KeyCode::Char('e'));
        assert_eq!(app.detail.as_ref().unwrap().mode, DetailMode::Editing);

        handle_key(&mut app, KeyCode::Char('!'));
        handle_key(&mut app, KeyCode::Tab);
        handle_key(&mut app, KeyCode::Backspace);

        let detail = app.detail.as_ref().unwrap();
        assert_eq!(detail.form.name, "Leanne Graham!");
        assert_eq!(detail.form.email, "Sincere@april.bi");
    }

    #[test]
    fn submit_applies_before_the_response_resolves() {
        let mut app = app_viewing(mk_record(1, "Leanne Graham", "Sincere@april.biz"));
        handle_key(&mut app, KeyCode::Char('e'));
        {
            let detail = app.detail.as_mut().unwrap();
            detail.form.name = "Leanne G. Graham".to_string();
            detail.form.email = "leanne@april.biz".to_string();
        }

        let commands = handle_key(&mut app, KeyCode::Enter);

        let detail = app.detail.as_ref().unwrap();
        assert_eq!(detail.mode, DetailMode::Viewing, "edit mode left immediately");
        let shown = detail.record.as_ref().unwrap();
        assert_eq!(shown.name, "Leanne G. Graham");
        assert_eq!(shown.email, "leanne@april.biz");

        // The request carries the full previous record with name/email
        // overwritten; untouched fields ride along unchanged.
        assert_eq!(commands.len(), 1);
        match &commands[0] {
            Command::SubmitUpdate { record, .. } => {
                assert_eq!(record.id, 1);
                assert_eq!(record.name, "Leanne G. Graham");
                assert_eq!(record.email, "leanne@april.biz");
                assert_eq!(record.username, "user1");
                assert_eq!(record.phone, "1-770-736-8031");
            }
            other => panic!("expected SubmitUpdate, got {other:?}"),
        }
    }

    #[test]
    fn accepted_update_keeps_the_applied_values() {
        let mut app = app_viewing(mk_record(1, "Leanne Graham", "Sincere@april.biz"));
        handle_key(&mut app, KeyCode::Char('e'));
        app.detail.as_mut().unwrap().form.name = "Leanne G. Graham".to_string();
        let commands = handle_key(&mut app, KeyCode::Enter);
        let token = match &commands[0] {
            Command::SubmitUpdate { token, .. } => *token,
            other => panic!("expected SubmitUpdate, got {other:?}"),
        };

        handle_api_event(&mut app, ApiEvent::UserUpdated { token, id: 1, ok: true });

        let detail = app.detail.as_ref().unwrap();
        assert_eq!(detail.record.as_ref().unwrap().name, "Leanne G. Graham");
        assert_eq!(detail.mode, DetailMode::Viewing);
        assert!(detail.pending.is_none());
        assert!(app.modal.is_none(), "success is invisible");
    }

    #[test]
    fn rejected_update_rolls_back_record_and_form() {
        let before = mk_record(1, "Leanne Graham", "Sincere@april.biz");
        let mut app = app_viewing(before.clone());
        handle_key(&mut app, KeyCode::Char('e'));
        {
            let detail = app.detail.as_mut().unwrap();
            detail.form.name = "Someone Else".to_string();
            detail.form.email = "someone@else.test".to_string();
        }
        let commands = handle_key(&mut app, KeyCode::Enter);
        let token = match &commands[0] {
            Command::SubmitUpdate { token, .. } => *token,
            other => panic!("expected SubmitUpdate, got {other:?}"),
        };

        handle_api_event(&mut app, ApiEvent::UserUpdated { token, id: 1, ok: false });

        let detail = app.detail.as_ref().unwrap();
        assert_eq!(detail.record.as_ref().unwrap(), &before);
        assert_eq!(detail.form, FormBuffer::from_record(&before));
        assert_eq!(detail.mode, DetailMode::Viewing);
        assert!(detail.pending.is_none());
        assert!(
            matches!(app.modal, Some(ModalState::Info { .. })),
            "the user is notified of the failure"
        );
    }

    #[test]
    fn update_result_after_navigation_is_discarded() {
        let mut app = app_viewing(mk_record(1, "Leanne Graham", "Sincere@april.biz"));
        handle_key(&mut app, KeyCode::Char('e'));
        app.detail.as_mut().unwrap().form.name = "Leanne G. Graham".to_string();
        let commands = handle_key(&mut app, KeyCode::Enter);
        let token = match &commands[0] {
            Command::SubmitUpdate { token, .. } => *token,
            other => panic!("expected SubmitUpdate, got {other:?}"),
        };

        // Back to the listing before the response lands.
        handle_key(&mut app, KeyCode::Esc);
        assert!(app.detail.is_none());

        handle_api_event(&mut app, ApiEvent::UserUpdated { token, id: 1, ok: false });
        assert!(app.modal.is_none(), "late update outcomes are silent");
    }

    #[test]
    fn blank_fields_block_submit() {
        let mut app = app_viewing(mk_record(1, "Leanne Graham", "Sincere@april.biz"));
        handle_key(&mut app, KeyCode::Char('e'));
        app.detail.as_mut().unwrap().form.email.clear();

        let commands = handle_key(&mut app, KeyCode::Enter);

        assert!(commands.is_empty());
        assert_eq!(app.detail.as_ref().unwrap().mode, DetailMode::Editing);
        assert!(app.detail.as_ref().unwrap().pending.is_none());
    }

    #[test]
    fn cancel_resets_buffer_from_displayed_record() {
        let mut app = app_viewing(mk_record(1, "Leanne Graham", "Sincere@april.biz"));
        handle_key(&mut app, KeyCode::Char('e'));
        app.detail.as_mut().unwrap().form.name = "Half-typed".to_string();

        handle_key(&mut app, KeyCode::Esc);

        let detail = app.detail.as_ref().unwrap();
        assert_eq!(detail.mode, DetailMode::Viewing);
        assert_eq!(detail.form.name, "Leanne Graham");
    }

    #[test]
    fn confirmed_delete_navigates_before_the_outcome() {
        let mut app = app_viewing(mk_record(2, "Ervin Howell", "Shanna@melissa.tv"));
        handle_key(&mut app, KeyCode::Char('d'));
        assert!(matches!(app.modal, Some(ModalState::DeleteConfirm { selected: 1 })));

        handle_key(&mut app, KeyCode::Left); // move onto Yes
        let commands = handle_key(&mut app, KeyCode::Enter);

        assert_eq!(app.screen, Screen::Listing);
        assert!(app.detail.is_none());
        assert!(app.modal.is_none());
        assert_eq!(commands.len(), 2);
        assert!(matches!(commands[0], Command::LoadUsers { .. }));
        assert_eq!(commands[1], Command::SubmitDelete { id: 2 });

        // The background outcome changes nothing either way.
        handle_api_event(&mut app, ApiEvent::UserDeleted { id: 2, ok: false });
        assert_eq!(app.screen, Screen::Listing);
        assert!(app.modal.is_none());
        handle_api_event(&mut app, ApiEvent::UserDeleted { id: 2, ok: true });
        assert_eq!(app.screen, Screen::Listing);
        assert!(app.modal.is_none());
    }

    #[test]
    fn declined_delete_stays_on_the_record() {
        let mut app = app_viewing(mk_record(2, "Ervin Howell", "Shanna@melissa.tv"));
        handle_key(&mut app, KeyCode::Char('d'));

        // Default answer is No.
        handle_key(&mut app, KeyCode::Enter);

        assert!(app.modal.is_none());
        assert_eq!(app.screen, Screen::Detail);
        assert!(app.detail.is_some());
    }
}
