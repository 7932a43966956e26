use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use redb::ReadableTable;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::auth::AuthUser;
use crate::db::tables;
use crate::error::{AppError, Result};
use crate::models::{HistoryEntry, HistoryKind, UserRecord};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Deserialize)]
pub struct AnnotationRequest {
    #[serde(default)]
    pub annotation: String,
}

/// List a user's recent searches, newest last
pub async fn list_searches(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    _auth: AuthUser,
) -> Result<Json<Value>> {
    let entries = list_entries(&state, user_id, HistoryKind::Searches).await?;
    Ok(Json(collection_body(HistoryKind::Searches, &entries, None)?))
}

/// Record a search, evicting the oldest entry once the cap is passed
pub async fn record_search(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    _auth: AuthUser,
    Json(body): Json<SearchRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let (entries, evicted) =
        push_entry(&state, user_id, HistoryKind::Searches, body.search).await?;
    let response = collection_body(HistoryKind::Searches, &entries, evicted.as_ref())?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Drop a user's entire search history
pub async fn clear_searches(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    _auth: AuthUser,
) -> Result<StatusCode> {
    clear_entries(&state, user_id, HistoryKind::Searches).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List a user's annotations, newest last
pub async fn list_annotations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    _auth: AuthUser,
) -> Result<Json<Value>> {
    let entries = list_entries(&state, user_id, HistoryKind::Annotations).await?;
    Ok(Json(collection_body(
        HistoryKind::Annotations,
        &entries,
        None,
    )?))
}

/// Record an annotation, evicting the oldest entry once the cap is passed
pub async fn record_annotation(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    _auth: AuthUser,
    Json(body): Json<AnnotationRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let (entries, evicted) =
        push_entry(&state, user_id, HistoryKind::Annotations, body.annotation).await?;
    let response = collection_body(HistoryKind::Annotations, &entries, evicted.as_ref())?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Drop a user's entire annotation history
pub async fn clear_annotations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    _auth: AuthUser,
) -> Result<StatusCode> {
    clear_entries(&state, user_id, HistoryKind::Annotations).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Load one history collection inside a read transaction
async fn list_entries(
    state: &AppState,
    user_id: String,
    kind: HistoryKind,
) -> Result<Vec<HistoryEntry>> {
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || {
        let read_txn = db.begin_read()?;
        let users = read_txn.open_table(tables::USERS)?;

        let record: UserRecord = match users.get(user_id.as_str())? {
            Some(bytes) => bincode::deserialize(bytes.value())?,
            None => return Err(AppError::Unauthorized),
        };

        Ok(record.history(kind).entries().to_vec())
    })
    .await?
}

/// Append an entry and apply the capacity rule
///
/// The whole read-modify-write runs inside one write transaction, so
/// concurrent inserts against the same user serialize and the cap holds.
async fn push_entry(
    state: &AppState,
    user_id: String,
    kind: HistoryKind,
    payload: String,
) -> Result<(Vec<HistoryEntry>, Option<HistoryEntry>)> {
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || {
        let write_txn = db.begin_write()?;
        let result = {
            let mut users = write_txn.open_table(tables::USERS)?;

            let mut record: UserRecord = match users.get(user_id.as_str())? {
                Some(bytes) => bincode::deserialize(bytes.value())?,
                None => return Err(AppError::Unauthorized),
            };

            let evicted = record.history_mut(kind).insert(HistoryEntry::new(payload));
            let bytes = bincode::serialize(&record)?;
            users.insert(user_id.as_str(), bytes.as_slice())?;

            (record.history(kind).entries().to_vec(), evicted)
        };
        write_txn.commit()?;

        if let Some(evicted) = &result.1 {
            tracing::debug!(
                "Evicted oldest {} entry {} for user {}",
                kind.key(),
                evicted.id,
                user_id
            );
        }
        Ok(result)
    })
    .await?
}

/// Empty one history collection
async fn clear_entries(state: &AppState, user_id: String, kind: HistoryKind) -> Result<()> {
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || {
        let write_txn = db.begin_write()?;
        {
            let mut users = write_txn.open_table(tables::USERS)?;

            let mut record: UserRecord = match users.get(user_id.as_str())? {
                Some(bytes) => bincode::deserialize(bytes.value())?,
                None => return Err(AppError::Unauthorized),
            };

            record.history_mut(kind).clear();
            let bytes = bincode::serialize(&record)?;
            users.insert(user_id.as_str(), bytes.as_slice())?;
        }
        write_txn.commit()?;

        tracing::info!("Cleared {} for user {}", kind.key(), user_id);
        Ok(())
    })
    .await?
}

/// Build the response body: the collection under its kind key, plus the
/// entry the insert pushed out when there was one
fn collection_body(
    kind: HistoryKind,
    entries: &[HistoryEntry],
    evicted: Option<&HistoryEntry>,
) -> Result<Value> {
    let mut body = Map::new();
    body.insert(kind.key().to_string(), serde_json::to_value(entries)?);
    if let Some(evicted) = evicted {
        body.insert("oldestRemoved".to_string(), serde_json::to_value(evicted)?);
    }
    Ok(Value::Object(body))
}
