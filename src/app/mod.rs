//! Application state types and entry glue.
//!
//! Defines enums and structs that model the TUI state, as well as helpers
//! to construct defaults and to run the application loop (re-exported as `run`).
//!
pub mod update;

use ratatui::style::Color;

use crate::api::UserRecord;

/// Which screen is currently shown.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    Home,
    Listing,
    Detail,
}

/// Detail screen state machine: `Loading → Viewing ⇄ Editing`, with
/// `NotFound` terminal. A failed fetch and an absent record both collapse
/// into `NotFound`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DetailMode {
    Loading,
    Viewing,
    Editing,
    NotFound,
}

/// Which form field owns keyboard input while editing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EditField {
    Name,
    Email,
}

/// Editable buffer for the two mutable record fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormBuffer {
    pub name: String,
    pub email: String,
}

impl FormBuffer {
    pub fn from_record(record: &UserRecord) -> Self {
        Self {
            name: record.name.clone(),
            email: record.email.clone(),
        }
    }
}

/// Pre-image captured when an edit is submitted optimistically.
///
/// Restored wholesale on rollback, so the revert stays complete no matter
/// which fields a submit overwrote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingUpdate {
    pub token: u64,
    pub record: UserRecord,
    pub form: FormBuffer,
}

/// Modal dialogs layered over the current screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModalState {
    /// Blocking delete confirmation; `selected` is 0 = Yes, 1 = No.
    DeleteConfirm { selected: usize },
    /// Blocking notice dismissed with Enter or Esc.
    Info { message: String },
}

/// Listing screen state: a transient snapshot of the collection.
#[derive(Clone, Debug, Default)]
pub struct ListingState {
    pub loading: bool,
    pub users: Vec<UserRecord>,
    pub selected: usize,
    pub token: u64,
}

/// Detail screen state: one record snapshot plus the edit machinery.
#[derive(Clone, Debug)]
pub struct DetailState {
    pub id: u64,
    pub token: u64,
    pub mode: DetailMode,
    pub record: Option<UserRecord>,
    pub form: FormBuffer,
    pub focus: EditField,
    pub pending: Option<PendingUpdate>,
}

impl DetailState {
    pub fn loading(id: u64, token: u64) -> Self {
        Self {
            id,
            token,
            mode: DetailMode::Loading,
            record: None,
            form: FormBuffer::default(),
            focus: EditField::Name,
            pending: None,
        }
    }
}

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub text: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
}

impl Theme {
    /// Dark default theme.
    #[allow(dead_code)]
    pub fn dark() -> Self {
        Self {
            text: Color::Gray,
            title: Color::Cyan,
            border: Color::Gray,
            header_bg: Color::Black,
            header_fg: Color::Cyan,
            status_bg: Color::DarkGray,
            status_fg: Color::Black,
            highlight_fg: Color::Yellow,
            highlight_bg: Color::Reset,
        }
    }

    /// Catppuccin Mocha theme defaults.
    pub fn mocha() -> Self {
        // Palette reference: https://github.com/catppuccin/catppuccin
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),
            title: Color::Rgb(0xcb, 0xa6, 0xf7),
            border: Color::Rgb(0x58, 0x5b, 0x70),
            header_bg: Color::Rgb(0x31, 0x32, 0x44),
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf),
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a),
        }
    }
}

pub struct AppState {
    pub screen: Screen,
    pub listing: ListingState,
    pub detail: Option<DetailState>,
    pub modal: Option<ModalState>,
    pub theme: Theme,
    pub rows_per_page: usize,
    pub should_quit: bool,
    pub request_seq: u64,
}

impl AppState {
    /// Create a fresh `AppState` showing the home screen. Nothing is fetched
    /// until the listing is opened.
    pub fn new() -> Self {
        Self {
            screen: Screen::Home,
            listing: ListingState::default(),
            detail: None,
            modal: None,
            theme: Theme::mocha(),
            rows_per_page: 10,
            should_quit: false,
            request_seq: 0,
        }
    }

    /// Hand out the next request token. Late events whose token no longer
    /// matches the issuing screen are discarded.
    pub fn next_token(&mut self) -> u64 {
        self.request_seq += 1;
        self.request_seq
    }

    pub fn selected_user(&self) -> Option<&UserRecord> {
        self.listing.users.get(self.listing.selected)
    }

    /// Short mode label for the status bar.
    pub fn mode_label(&self) -> &'static str {
        if self.modal.is_some() {
            return "MODAL";
        }
        match self.screen {
            Screen::Home => "HOME",
            Screen::Listing => "LIST",
            Screen::Detail => match self.detail.as_ref().map(|d| d.mode) {
                Some(DetailMode::Editing) => "EDIT",
                _ => "VIEW",
            },
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
