use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{self, MaybeAuthUser};
use crate::codec::Encrypted;
use crate::db::tables;
use crate::error::{AppError, Result};
use crate::models::UserRecord;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user: Credentials,
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Log a user in and issue a token
///
/// Blank fields are reported individually before any lookup happens. A
/// wrong password and an unknown username produce the same response, so
/// the two cases cannot be told apart from outside.
pub async fn login_user(
    State(state): State<AppState>,
    MaybeAuthUser(session): MaybeAuthUser,
    Encrypted(body): Encrypted<LoginRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    if let Some(claims) = &session {
        tracing::debug!("Login request from already-authenticated user {}", claims.id);
    }

    let Credentials { username, password } = body.user;

    if username.trim().is_empty() {
        return Err(AppError::MissingField("username"));
    }
    if password.trim().is_empty() {
        return Err(AppError::MissingField("password"));
    }

    let db = state.db.clone();
    let (user_id, record) = tokio::task::spawn_blocking(move || {
        let read_txn = db.begin_read()?;

        let usernames = read_txn.open_table(tables::USERNAMES)?;
        let user_id = match usernames.get(username.as_str())? {
            Some(id) => id.value().to_string(),
            None => {
                tracing::info!("Login failed: unknown username");
                return Err(AppError::InvalidCredentials);
            }
        };

        let users = read_txn.open_table(tables::USERS)?;
        let record: UserRecord = match users.get(user_id.as_str())? {
            Some(bytes) => bincode::deserialize(bytes.value())?,
            None => {
                // Index row pointing at a missing document
                tracing::error!("Username index points at missing user {}", user_id);
                return Err(AppError::InvalidCredentials);
            }
        };

        // Password verification stays on the blocking pool with the reads
        if !record.verify_password(&password) {
            tracing::info!("Login failed: wrong password for user {}", user_id);
            return Err(AppError::InvalidCredentials);
        }

        Ok((user_id, record))
    })
    .await??;

    let token = auth::issue_token(
        &user_id,
        &record.username,
        &state.config.token_secret,
        state.config.token_ttl_secs,
    )?;

    tracing::info!("User {} logged in", user_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": record.auth_view(Some(token)) })),
    ))
}
