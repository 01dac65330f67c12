use crate::models::{now_timestamp, MessageChanges, MessageRow, NewMessage, UserRow};
use crate::store::{MessageStore, UserStore};
use crate::Database;
use anyhow::Result;
use postbox_types::ids::{MessageId, UserId};
use rusqlite::{Connection, ErrorCode, Row};

const USER_COLUMNS: &str = "id, username, password, created_at";
const MESSAGE_COLUMNS: &str = "id, title, body, author_id, created_at, updated_at";

impl UserStore for Database {
    fn create_user(&self, username: &str, password_hash: &str) -> Result<Option<UserRow>> {
        let row = UserRow {
            id: UserId::new().to_string(),
            username: username.to_string(),
            password: password_hash.to_string(),
            created_at: now_timestamp(),
        };

        let inserted = self.with_conn(|conn| {
            let res = conn.execute(
                "INSERT INTO users (id, username, password, created_at) VALUES (?1, ?2, ?3, ?4)",
                (&row.id, &row.username, &row.password, &row.created_at),
            );
            match res {
                Ok(_) => Ok(true),
                Err(e) if is_constraint_violation(&e) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })?;

        Ok(inserted.then_some(row))
    }

    fn get_user_by_id(&self, id: UserId) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", &id.to_string()))
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    fn delete_all_users(&self) -> Result<usize> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM users", [])?))
    }
}

impl MessageStore for Database {
    fn create_message(&self, new: &NewMessage) -> Result<MessageRow> {
        let now = now_timestamp();
        let row = MessageRow {
            id: MessageId::new().to_string(),
            title: new.title.clone(),
            body: new.body.clone(),
            author_id: new.author.to_string(),
            created_at: now.clone(),
            updated_at: now,
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, title, body, author_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    row.id,
                    row.title,
                    row.body,
                    row.author_id,
                    row.created_at,
                    row.updated_at
                ],
            )?;
            Ok(())
        })?;

        Ok(row)
    }

    fn get_message(&self, id: MessageId) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message_by_id(conn, &id.to_string()))
    }

    fn find_message_by_title(&self, title: &str) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE title = ?1
                 ORDER BY created_at ASC, rowid ASC LIMIT 1"
            );
            let row = conn.query_row(&sql, [title], map_message).optional()?;
            Ok(row)
        })
    }

    fn list_messages(&self) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql =
                format!("SELECT {MESSAGE_COLUMNS} FROM messages ORDER BY created_at ASC, rowid ASC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn update_message(&self, id: MessageId, changes: &MessageChanges) -> Result<Option<MessageRow>> {
        let id = id.to_string();

        // Update and re-read under one lock so the returned row is the one we wrote.
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE messages
                 SET title = COALESCE(?2, title),
                     body = COALESCE(?3, body),
                     updated_at = ?4
                 WHERE id = ?1",
                rusqlite::params![id, changes.title, changes.body, now_timestamp()],
            )?;

            if updated == 0 {
                return Ok(None);
            }
            query_message_by_id(conn, &id)
        })
    }

    fn delete_message(&self, id: MessageId) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM messages WHERE id = ?1", [id.to_string()])?;
            Ok(deleted > 0)
        })
    }

    fn delete_all_messages(&self) -> Result<usize> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM messages", [])?))
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let row = conn
        .query_row(&sql, [value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_message_by_id(conn: &Connection, id: &str) -> Result<Option<MessageRow>> {
    let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1");
    let row = conn.query_row(&sql, [id], map_message).optional()?;
    Ok(row)
}

fn map_message(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        author_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (Database, UserRow, MessageRow, MessageRow) {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("testuser", "hash").unwrap().unwrap();
        let author: UserId = user.id.parse().unwrap();

        let first = db
            .create_message(&NewMessage {
                title: "Test Message 1".into(),
                body: "Test Body 1".into(),
                author,
            })
            .unwrap();
        let second = db
            .create_message(&NewMessage {
                title: "Test Message 2".into(),
                body: "Test Body 2".into(),
                author,
            })
            .unwrap();

        (db, user, first, second)
    }

    fn message_id(row: &MessageRow) -> MessageId {
        row.id.parse().unwrap()
    }

    #[test]
    fn lists_messages_in_creation_order() {
        let (db, _, first, second) = seeded();
        let ids: Vec<String> = db.list_messages().unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn gets_message_by_id() {
        let (db, user, first, _) = seeded();
        let found = db.get_message(message_id(&first)).unwrap().unwrap();
        assert_eq!(found.title, "Test Message 1");
        assert_eq!(found.body, "Test Body 1");
        assert_eq!(found.author_id, user.id);

        assert!(db.get_message(MessageId::new()).unwrap().is_none());
    }

    #[test]
    fn finds_message_by_title() {
        let (db, _, _, second) = seeded();
        let found = db.find_message_by_title("Test Message 2").unwrap().unwrap();
        assert_eq!(found.id, second.id);
        assert!(db.find_message_by_title("missing").unwrap().is_none());
    }

    #[test]
    fn partial_update_leaves_other_fields_alone() {
        let (db, _, first, _) = seeded();
        let changes = MessageChanges {
            title: Some("Updated Title".into()),
            body: None,
        };

        let updated = db.update_message(message_id(&first), &changes).unwrap().unwrap();
        assert_eq!(updated.title, "Updated Title");
        assert_eq!(updated.body, "Test Body 1");
        assert_eq!(updated.author_id, first.author_id);
        assert_eq!(updated.created_at, first.created_at);

        let reloaded = db.get_message(message_id(&first)).unwrap().unwrap();
        assert_eq!(reloaded.title, "Updated Title");
    }

    #[test]
    fn update_of_unknown_message_is_none() {
        let (db, _, _, _) = seeded();
        let changes = MessageChanges {
            title: Some("x".into()),
            body: None,
        };
        assert!(db.update_message(MessageId::new(), &changes).unwrap().is_none());
    }

    #[test]
    fn delete_reports_whether_a_row_was_removed() {
        let (db, _, first, _) = seeded();
        assert!(db.delete_message(message_id(&first)).unwrap());
        assert!(!db.delete_message(message_id(&first)).unwrap());
        assert_eq!(db.list_messages().unwrap().len(), 1);
    }

    #[test]
    fn rejects_message_for_unknown_author() {
        let db = Database::open_in_memory().unwrap();
        let res = db.create_message(&NewMessage {
            title: "t".into(),
            body: "b".into(),
            author: UserId::new(),
        });
        assert!(res.is_err());
        assert!(db.list_messages().unwrap().is_empty());
    }

    #[test]
    fn usernames_are_unique() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.create_user("testuser", "hash").unwrap().is_some());
        assert!(db.create_user("testuser", "other").unwrap().is_none());
    }

    #[test]
    fn bulk_cleanup_empties_the_store() {
        let (db, user, _, _) = seeded();

        // Messages first: they reference users.
        assert!(db.delete_all_users().is_err());
        assert_eq!(db.delete_all_messages().unwrap(), 2);
        assert_eq!(db.delete_all_users().unwrap(), 1);

        assert!(db.list_messages().unwrap().is_empty());
        assert!(db.get_user_by_username(&user.username).unwrap().is_none());
    }

    #[test]
    fn rows_convert_to_models() {
        let (db, user, first, _) = seeded();
        let message = db.get_message(message_id(&first)).unwrap().unwrap().into_model().unwrap();
        assert_eq!(message.author.to_string(), user.id);

        let model = db.get_user_by_username("testuser").unwrap().unwrap().into_model().unwrap();
        assert_eq!(model.username, "testuser");
    }
}
