//! Database row types — these map directly to SQLite rows.
//! Distinct from postbox-types API models to keep the DB layer independent.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use postbox_types::ids::UserId;
use postbox_types::models::{Message, User};

pub struct UserRow {
    pub id: String,
    pub username: String,
    /// Argon2 PHC string.
    pub password: String,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub title: String,
    pub body: String,
    pub author_id: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct NewMessage {
    pub title: String,
    pub body: String,
    pub author: UserId,
}

/// Fields to overwrite on an existing message; `None` leaves the column as is.
#[derive(Default)]
pub struct MessageChanges {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl UserRow {
    pub fn into_model(self) -> Result<User> {
        let id = self.id.clone();
        self.convert()
            .inspect_err(|e| warn!("Corrupt user row '{}': {:#}", id, e))
    }

    fn convert(self) -> Result<User> {
        Ok(User {
            id: self
                .id
                .parse()
                .with_context(|| format!("corrupt user id '{}'", self.id))?,
            created_at: parse_timestamp(&self.created_at)
                .with_context(|| format!("corrupt created_at on user '{}'", self.id))?,
            username: self.username,
        })
    }
}

impl MessageRow {
    pub fn into_model(self) -> Result<Message> {
        let id = self.id.clone();
        self.convert()
            .inspect_err(|e| warn!("Corrupt message row '{}': {:#}", id, e))
    }

    fn convert(self) -> Result<Message> {
        Ok(Message {
            id: self
                .id
                .parse()
                .with_context(|| format!("corrupt message id '{}'", self.id))?,
            author: self.author_id.parse().with_context(|| {
                format!("corrupt author_id '{}' on message '{}'", self.author_id, self.id)
            })?,
            created_at: parse_timestamp(&self.created_at)
                .with_context(|| format!("corrupt created_at on message '{}'", self.id))?,
            updated_at: parse_timestamp(&self.updated_at)
                .with_context(|| format!("corrupt updated_at on message '{}'", self.id))?,
            title: self.title,
            body: self.body,
        })
    }
}

/// Timestamps written by the store are RFC 3339. Rows that fell back to the
/// column default carry SQLite's "YYYY-MM-DD HH:MM:SS" (UTC, no zone).
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")?;
    Ok(naive.and_utc())
}

pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
