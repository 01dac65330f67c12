pub mod error;
pub mod health;
pub mod messages;
pub mod state;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};

pub use error::ApiError;
pub use state::{AppState, AppStateInner};

/// Every route the service exposes. Cross-cutting layers (CORS, tracing)
/// are added by the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/messages",
            get(messages::list_messages).post(messages::create_message),
        )
        .route(
            "/messages/{message_id}",
            get(messages::get_message)
                .put(messages::update_message)
                .delete(messages::delete_message),
        )
        .route("/users", post(users::create_user))
        .route("/users/{user_id}", get(users::get_user))
        .route("/health", get(health::health))
        .with_state(state)
}

/// Parses a path segment into a typed id, naming the entity in the error.
pub(crate) fn parse_id<T: std::str::FromStr>(raw: &str, entity: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::Validation(format!("invalid {} id '{}'", entity, raw)))
}
