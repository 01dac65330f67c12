use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use rand_core::OsRng;
use tracing::info;

use postbox_types::api::{CreateUserRequest, UserEnvelope};
use postbox_types::ids::UserId;

use crate::error::ApiError;
use crate::parse_id;
use crate::state::{AppState, run_blocking};

/// POST /users — signup. Stores an Argon2id hash, never the password itself.
pub async fn create_user(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<CreateUserRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    let username = req.username.trim().to_string();
    let name_len = username.chars().count();
    if !(3..=32).contains(&name_len) {
        return Err(ApiError::Validation(
            "username must be between 3 and 32 characters".into(),
        ));
    }
    if req.password.chars().count() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }

    let name = username.clone();
    let row = run_blocking(&state, move |store| {
        // Fast path; the UNIQUE constraint still settles concurrent signups.
        if store.get_user_by_username(&name)?.is_some() {
            return Ok(None);
        }

        // Hashing is CPU-bound, so it stays on the blocking pool too.
        let password_hash = hash_password(&req.password)?;
        store.create_user(&name, &password_hash)
    })
    .await?
    .ok_or_else(|| ApiError::Conflict(format!("username '{}' is already taken", username)))?;

    info!("User {} registered as {}", row.id, row.username);

    Ok(Json(UserEnvelope {
        user: row.into_model()?,
    }))
}

/// GET /users/{user_id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: UserId = parse_id(&raw_id, "user")?;

    let row = run_blocking(&state, move |store| store.get_user_by_id(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {} not found", id)))?;

    Ok(Json(UserEnvelope {
        user: row.into_model()?,
    }))
}

fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}
