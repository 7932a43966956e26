pub mod tables;

use redb::{Database, Error as RedbError, ReadableTable, Table};
use std::path::Path;
use std::sync::Arc;

/// Database handle type (Arc-wrapped for sharing across handlers)
pub type Db = Arc<Database>;

/// Open or create the redb database at the given path
///
/// Creates all required tables on first run.
#[allow(clippy::result_large_err)]
pub fn open_database(path: impl AsRef<Path>) -> Result<Db, RedbError> {
    tracing::info!("Opening database at: {:?}", path.as_ref());

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.as_ref().parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                tracing::error!("Failed to create database directory: {}", e);
                RedbError::Io(e)
            })?;
        }
    }

    let db = Database::create(path)?;

    // Initialize tables on first run
    let write_txn = db.begin_write()?;
    {
        // Create tables if they don't exist by opening them
        let _ = write_txn.open_table(tables::USERS)?;
        let _ = write_txn.open_table(tables::USERNAMES)?;
        let _ = write_txn.open_table(tables::EMAILS)?;
    }
    write_txn.commit()?;

    tracing::info!("Database initialized successfully");

    Ok(Arc::new(db))
}

/// Check whether `value` is already claimed in a uniqueness index by a user
/// other than `exclude_id`
///
/// Register passes no exclusion; update excludes the user being updated so
/// re-submitting an unchanged username or email is not a conflict.
pub fn index_conflict(
    index: &Table<'_, &'static str, &'static str>,
    value: &str,
    exclude_id: Option<&str>,
) -> Result<bool, redb::StorageError> {
    match index.get(value)? {
        Some(existing) => Ok(exclude_id != Some(existing.value())),
        None => Ok(false),
    }
}
