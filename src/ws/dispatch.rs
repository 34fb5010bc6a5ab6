//! Maps a decoded [`Command`] to a store operation and a [`Reply`].

use super::messages::{Command, Reply};
use crate::store::StoreClient;

/// Reply text for a successful update.
pub const UPDATE_OK: &str = "Data updated successfully";
/// Reply text for a failed update.
pub const UPDATE_FAILED: &str = "Failed to update data";
/// Reply text for any unrecognized action.
pub const UNKNOWN_ACTION: &str = "Unknown action";

/// Action named by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    /// Upsert `data.key` to `data.value`.
    Update,
    /// Anything else, kept verbatim for logging.
    Unknown(&'a str),
}

impl<'a> Action<'a> {
    /// Classifies an action name. Case-sensitive, no trimming.
    #[must_use]
    pub fn parse(name: &'a str) -> Self {
        match name {
            "update" => Self::Update,
            other => Self::Unknown(other),
        }
    }
}

/// Routes commands for one session to the store.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    store: StoreClient,
}

impl Dispatcher {
    /// Creates a dispatcher writing through `store`.
    #[must_use]
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }

    /// Applies `command` and returns the single reply for it.
    ///
    /// Store failures are logged here and surface to the client only as
    /// [`UPDATE_FAILED`].
    pub async fn dispatch(&self, command: &Command) -> Reply {
        match Action::parse(&command.action) {
            Action::Update => match self.store.upsert(&command.data.key, &command.data.value).await {
                Ok(()) => {
                    tracing::debug!(key = %command.data.key, "record updated");
                    Reply::success(UPDATE_OK)
                }
                Err(e) => {
                    tracing::error!(key = %command.data.key, error = %e, "error updating data");
                    Reply::error(UPDATE_FAILED)
                }
            },
            Action::Unknown(name) => {
                tracing::warn!(action = name, "unknown action");
                Reply::error(UNKNOWN_ACTION)
            }
        }
    }
}
