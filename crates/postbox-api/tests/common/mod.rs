use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use postbox_api::{AppStateInner, router};
use postbox_db::models::{MessageRow, NewMessage, UserRow};
use postbox_db::{Database, MessageStore, UserStore};
use postbox_types::ids::UserId;

/// Router over a private in-memory store, seeded with one user and two
/// messages. Every test builds its own, so nothing leaks between tests.
pub struct Fixture {
    pub db: Arc<Database>,
    pub router: Router,
    pub user: UserRow,
    pub message1: MessageRow,
    pub message2: MessageRow,
}

impl Fixture {
    pub fn new() -> Self {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let router = router(AppStateInner::new(db.clone()));

        let user = db.create_user("testuser", "$argon2id$seeded").unwrap().unwrap();
        let author: UserId = user.id.parse().unwrap();
        let message1 = db
            .create_message(&NewMessage {
                title: "Test Message 1".into(),
                body: "Test Body 1".into(),
                author,
            })
            .unwrap();
        let message2 = db
            .create_message(&NewMessage {
                title: "Test Message 2".into(),
                body: "Test Body 2".into(),
                author,
            })
            .unwrap();

        Self {
            db,
            router,
            user,
            message1,
            message2,
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send("DELETE", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body.to_string())).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("PUT", uri, Some(body.to_string())).await
    }

    /// Sends a raw string body, for malformed-JSON cases.
    pub async fn send(&self, method: &str, uri: &str, body: Option<String>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(raw) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(raw))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Same cleanup the store offers to callers: messages first, then users.
    pub fn teardown(&self) {
        self.db.delete_all_messages().unwrap();
        self.db.delete_all_users().unwrap();
    }
}
