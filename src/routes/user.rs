use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use redb::ReadableTable;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::db::{self, tables};
use crate::error::{AppError, FieldError, Result};
use crate::models::UserRecord;
use crate::routes::validation::blank_violations;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub user: UserPatch,
}

/// Partial update: absent fields keep their stored values
#[derive(Debug, Deserialize)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Fetch a user's profile
///
/// Unknown ids answer 401 rather than 404, so probing ids with a stolen
/// token reveals nothing about which ones exist.
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    _auth: AuthUser,
) -> Result<Json<Value>> {
    let db = state.db.clone();
    let record = tokio::task::spawn_blocking(move || {
        let read_txn = db.begin_read()?;
        let users = read_txn.open_table(tables::USERS)?;

        let record: UserRecord = match users.get(user_id.as_str())? {
            Some(bytes) => bincode::deserialize(bytes.value())?,
            None => return Err(AppError::Unauthorized),
        };

        Ok(record)
    })
    .await??;

    Ok(Json(json!({ "user": record.auth_view(None) })))
}

/// Update a user's profile
///
/// Only the fields present in the request change. Username and email
/// changes re-check uniqueness, excluding the user's own index rows so an
/// unchanged value never conflicts with itself.
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    _auth: AuthUser,
    Json(body): Json<UpdateRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let UserPatch {
        username,
        email,
        password,
    } = body.user;

    let blank = blank_violations([
        ("username", username.as_deref()),
        ("email", email.as_deref()),
        ("password", password.as_deref()),
    ]);
    if !blank.is_empty() {
        tracing::warn!("Update rejected: blank fields for user {}", user_id);
        return Err(AppError::Validation(blank));
    }

    let db = state.db.clone();
    let view = tokio::task::spawn_blocking(move || {
        let write_txn = db.begin_write()?;
        let view = {
            let mut users = write_txn.open_table(tables::USERS)?;
            let mut usernames = write_txn.open_table(tables::USERNAMES)?;
            let mut emails = write_txn.open_table(tables::EMAILS)?;

            let mut record: UserRecord = match users.get(user_id.as_str())? {
                Some(bytes) => bincode::deserialize(bytes.value())?,
                None => return Err(AppError::Unauthorized),
            };

            let mut conflicts = Vec::new();
            if let Some(new_username) = &username {
                if db::index_conflict(&usernames, new_username, Some(&user_id))? {
                    conflicts.push(FieldError::unique("username", new_username));
                }
            }
            if let Some(new_email) = &email {
                if db::index_conflict(&emails, new_email, Some(&user_id))? {
                    conflicts.push(FieldError::unique("email", new_email));
                }
            }
            if !conflicts.is_empty() {
                tracing::info!("Update rejected: username or email already taken");
                return Err(AppError::Validation(conflicts));
            }

            if let Some(new_username) = username {
                if new_username != record.username {
                    usernames.remove(record.username.as_str())?;
                    usernames.insert(new_username.as_str(), user_id.as_str())?;
                    record.username = new_username;
                }
            }
            if let Some(new_email) = email {
                if new_email != record.email {
                    emails.remove(record.email.as_str())?;
                    emails.insert(new_email.as_str(), user_id.as_str())?;
                    record.email = new_email;
                }
            }
            if let Some(new_password) = password {
                record.set_password(&new_password)?;
            }

            let bytes = bincode::serialize(&record)?;
            users.insert(user_id.as_str(), bytes.as_slice())?;

            record.auth_view(None)
        };
        write_txn.commit()?;

        tracing::info!("User {} updated", user_id);
        Ok(view)
    })
    .await??;

    Ok((StatusCode::CREATED, Json(json!({ "user": view }))))
}

/// Delete a user along with both uniqueness index rows
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    _auth: AuthUser,
) -> Result<StatusCode> {
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || {
        let write_txn = db.begin_write()?;
        {
            let mut users = write_txn.open_table(tables::USERS)?;
            let record: UserRecord = match users.remove(user_id.as_str())? {
                Some(bytes) => bincode::deserialize(bytes.value())?,
                None => return Err(AppError::Unauthorized),
            };

            let mut usernames = write_txn.open_table(tables::USERNAMES)?;
            usernames.remove(record.username.as_str())?;
            let mut emails = write_txn.open_table(tables::EMAILS)?;
            emails.remove(record.email.as_str())?;
        }
        write_txn.commit()?;

        tracing::info!("User {} deleted", user_id);
        Ok(())
    })
    .await??;

    Ok(StatusCode::NO_CONTENT)
}
