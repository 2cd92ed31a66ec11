//! Background bridge between the event loop and the directory client.
//!
//! Every user action maps to at most one outstanding request. Each command
//! runs its blocking HTTP call on a spawned thread and delivers the outcome
//! back over a channel drained by the event loop. Requests are never
//! cancelled; a late event whose token no longer matches the issuing screen
//! is dropped by the handler.

use super::{DirectoryClient, UserRecord};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use tracing::{debug, error};

/// A network request the update loop wants issued.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    LoadUsers { token: u64 },
    LoadUser { token: u64, id: u64 },
    SubmitUpdate { token: u64, record: UserRecord },
    SubmitDelete { id: u64 },
}

/// Outcome of a finished request.
///
/// Failure detail is logged where it happens; events carry only what the
/// screens need (a payload or a success flag), never an error value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiEvent {
    UsersListed { token: u64, users: Option<Vec<UserRecord>> },
    UserFetched { token: u64, id: u64, user: Option<UserRecord> },
    UserUpdated { token: u64, id: u64, ok: bool },
    UserDeleted { id: u64, ok: bool },
}

/// Runs commands on worker threads and feeds events back to the loop.
pub struct Dispatcher {
    client: Arc<DirectoryClient>,
    tx: Sender<ApiEvent>,
}

impl Dispatcher {
    pub fn new(client: DirectoryClient, tx: Sender<ApiEvent>) -> Self {
        Self {
            client: Arc::new(client),
            tx,
        }
    }

    /// Run `command` on its own thread; the result arrives as an [`ApiEvent`].
    pub fn execute(&self, command: Command) {
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let event = run_command(&client, command);
            // The loop may already have exited; nothing left to notify then.
            let _ = tx.send(event);
        });
    }
}

fn run_command(client: &DirectoryClient, command: Command) -> ApiEvent {
    match command {
        Command::LoadUsers { token } => {
            let users = match client.list_users() {
                Ok(users) => Some(users),
                Err(e) => {
                    error!("error fetching users: {e}");
                    None
                }
            };
            ApiEvent::UsersListed { token, users }
        }
        Command::LoadUser { token, id } => {
            let user = match client.fetch_user(id) {
                Ok(user) => Some(user),
                Err(e) => {
                    error!("error fetching user {id}: {e}");
                    None
                }
            };
            ApiEvent::UserFetched { token, id, user }
        }
        Command::SubmitUpdate { token, record } => {
            let id = record.id;
            let ok = match client.update_user(&record) {
                Ok(updated) => {
                    debug!("update success: {updated:?}");
                    true
                }
                Err(e) => {
                    error!("error updating user {id}: {e}");
                    false
                }
            };
            ApiEvent::UserUpdated { token, id, ok }
        }
        Command::SubmitDelete { id } => {
            let ok = match client.delete_user(id) {
                Ok(()) => true,
                Err(e) => {
                    error!("error deleting user {id}: {e}");
                    false
                }
            };
            ApiEvent::UserDeleted { id, ok }
        }
    }
}
