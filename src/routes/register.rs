use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::MaybeAuthUser;
use crate::codec::Encrypted;
use crate::db::{self, tables};
use crate::error::{AppError, FieldError, Result};
use crate::models::UserRecord;
use crate::routes::validation::blank_violations;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub user: NewUser,
}

#[derive(Debug, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Register a new user
///
/// The body arrives through the payload codec. All three fields are
/// required; username and email must each be unused, and when both are
/// taken the response reports both violations at once. The created user's
/// view carries no token; clients log in separately.
pub async fn register_user(
    State(state): State<AppState>,
    _auth: MaybeAuthUser,
    Encrypted(body): Encrypted<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let NewUser {
        username,
        email,
        password,
    } = body.user;

    let blank = blank_violations([
        ("username", Some(username.as_str())),
        ("email", Some(email.as_str())),
        ("password", Some(password.as_str())),
    ]);
    if !blank.is_empty() {
        tracing::warn!("Registration rejected: blank required fields");
        return Err(AppError::Validation(blank));
    }

    let mut record = UserRecord::new(username, email);
    record.set_password(&password)?;
    let user_id = Uuid::new_v4().to_string();

    let db = state.db.clone();
    let view = tokio::task::spawn_blocking(move || {
        let write_txn = db.begin_write()?;
        let view = {
            let mut users = write_txn.open_table(tables::USERS)?;
            let mut usernames = write_txn.open_table(tables::USERNAMES)?;
            let mut emails = write_txn.open_table(tables::EMAILS)?;

            // Uniqueness is decided inside the same transaction that
            // inserts, so two racing registrations cannot both win.
            let mut conflicts = Vec::new();
            if db::index_conflict(&usernames, &record.username, None)? {
                conflicts.push(FieldError::unique("username", &record.username));
            }
            if db::index_conflict(&emails, &record.email, None)? {
                conflicts.push(FieldError::unique("email", &record.email));
            }
            if !conflicts.is_empty() {
                tracing::info!("Registration rejected: username or email already taken");
                return Err(AppError::Validation(conflicts));
            }

            let bytes = bincode::serialize(&record)?;
            users.insert(user_id.as_str(), bytes.as_slice())?;
            usernames.insert(record.username.as_str(), user_id.as_str())?;
            emails.insert(record.email.as_str(), user_id.as_str())?;

            record.auth_view(None)
        };
        write_txn.commit()?;

        tracing::info!("New user registered: {}", user_id);
        Ok(view)
    })
    .await??;

    Ok((StatusCode::CREATED, Json(json!({ "user": view }))))
}
