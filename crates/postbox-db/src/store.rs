//! Storage seams used by the HTTP handlers.
//!
//! "Not found" is never an error here: lookups return `Ok(None)` and deletes
//! report whether a row went away. `Err` always means the backend failed.

use anyhow::Result;

use postbox_types::ids::{MessageId, UserId};

use crate::models::{MessageChanges, MessageRow, NewMessage, UserRow};

pub trait UserStore: Send + Sync {
    /// Inserts a user with a store-generated id. `password_hash` must already
    /// be hashed. Returns `None` when the username is already taken.
    fn create_user(&self, username: &str, password_hash: &str) -> Result<Option<UserRow>>;

    fn get_user_by_id(&self, id: UserId) -> Result<Option<UserRow>>;

    fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>>;

    /// Removes every user. Fails while any message still references one.
    fn delete_all_users(&self) -> Result<usize>;
}

pub trait MessageStore: Send + Sync {
    fn create_message(&self, new: &NewMessage) -> Result<MessageRow>;

    fn get_message(&self, id: MessageId) -> Result<Option<MessageRow>>;

    /// First message with exactly this title, oldest first.
    fn find_message_by_title(&self, title: &str) -> Result<Option<MessageRow>>;

    fn list_messages(&self) -> Result<Vec<MessageRow>>;

    /// Applies `changes` and returns the updated row, or `None` if `id` is unknown.
    fn update_message(&self, id: MessageId, changes: &MessageChanges) -> Result<Option<MessageRow>>;

    fn delete_message(&self, id: MessageId) -> Result<bool>;

    fn delete_all_messages(&self) -> Result<usize>;
}

/// Everything the API needs from persistence.
pub trait Store: UserStore + MessageStore {}

impl<T: UserStore + MessageStore> Store for T {}
