use serde::{Deserialize, Serialize};

use crate::models::history::{BoundedHistory, HistoryEntry, HistoryKind};
use crate::security;

/// User document stored in redb, keyed by user id (UUID v4)
/// Uses Unix timestamps for compact storage with bincode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub email: String,
    /// PBKDF2 password hash (hex encoded)
    pub password_hash: String,
    /// Per-user password salt (hex encoded)
    pub password_salt: String,
    /// When the user registered (Unix timestamp, milliseconds)
    pub created_at: i64,
    /// Recent search history, capped
    pub searches: BoundedHistory<HistoryEntry>,
    /// Recent annotation history, capped
    pub annotations: BoundedHistory<HistoryEntry>,
}

impl UserRecord {
    /// Create a record with no credential set yet
    pub fn new(username: String, email: String) -> Self {
        UserRecord {
            username,
            email,
            password_hash: String::new(),
            password_salt: String::new(),
            created_at: chrono::Utc::now().timestamp_millis(),
            searches: BoundedHistory::default(),
            annotations: BoundedHistory::default(),
        }
    }

    /// Salt and hash `password`, replacing any previous credential
    pub fn set_password(&mut self, password: &str) -> Result<(), ring::error::Unspecified> {
        let salt = security::generate_salt()?;
        let hash = security::hash_password(password, &salt);
        self.password_salt = hex::encode(salt);
        self.password_hash = hex::encode(hash);
        Ok(())
    }

    /// Check `password` against the stored salt and hash
    pub fn verify_password(&self, password: &str) -> bool {
        security::verify_password(password, &self.password_salt, &self.password_hash)
    }

    /// The history collection for `kind`
    pub fn history(&self, kind: HistoryKind) -> &BoundedHistory<HistoryEntry> {
        match kind {
            HistoryKind::Searches => &self.searches,
            HistoryKind::Annotations => &self.annotations,
        }
    }

    /// Mutable access to the history collection for `kind`
    pub fn history_mut(&mut self, kind: HistoryKind) -> &mut BoundedHistory<HistoryEntry> {
        match kind {
            HistoryKind::Searches => &mut self.searches,
            HistoryKind::Annotations => &mut self.annotations,
        }
    }

    /// Outward representation of this user; never carries the hash or salt
    pub fn auth_view(&self, token: Option<String>) -> AuthView {
        AuthView {
            username: self.username.clone(),
            email: self.email.clone(),
            token,
        }
    }
}

/// User model for API responses
#[derive(Debug, Clone, Serialize)]
pub struct AuthView {
    pub username: String,
    pub email: String,
    /// Present only on responses that issue a token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_record() -> UserRecord {
        UserRecord::new("user40".to_string(), "user40@example.com".to_string())
    }

    #[test]
    fn test_set_and_verify_password() {
        let mut record = test_record();
        record.set_password("rightpassword").unwrap();

        assert!(record.verify_password("rightpassword"));
        assert!(!record.verify_password("wrongpassword"));
    }

    #[test]
    fn test_set_password_rotates_salt() {
        let mut record = test_record();
        record.set_password("hunter2").unwrap();
        let first_salt = record.password_salt.clone();
        let first_hash = record.password_hash.clone();

        record.set_password("hunter2").unwrap();

        assert_ne!(record.password_salt, first_salt);
        assert_ne!(record.password_hash, first_hash);
        assert!(record.verify_password("hunter2"));
    }

    #[test]
    fn test_verify_fails_before_password_set() {
        let record = test_record();
        assert!(!record.verify_password("anything"));
    }

    #[test]
    fn test_auth_view_excludes_credentials() {
        let mut record = test_record();
        record.set_password("hunter2").unwrap();

        let value = serde_json::to_value(record.auth_view(None)).unwrap();

        assert_eq!(value["username"], "user40");
        assert_eq!(value["email"], "user40@example.com");
        assert!(value.get("password_hash").is_none());
        assert!(value.get("password_salt").is_none());
        assert!(value.get("token").is_none());
    }

    #[test]
    fn test_auth_view_carries_issued_token() {
        let record = test_record();

        let value = serde_json::to_value(record.auth_view(Some("abc.def.ghi".to_string()))).unwrap();

        assert_eq!(value["token"], "abc.def.ghi");
    }

    #[test]
    fn test_history_accessors_pick_the_right_collection() {
        let mut record = test_record();
        record
            .history_mut(HistoryKind::Searches)
            .insert(HistoryEntry::with_timestamp("front door", 1));
        record
            .history_mut(HistoryKind::Annotations)
            .insert(HistoryEntry::with_timestamp("false alarm", 2));

        assert_eq!(record.history(HistoryKind::Searches).len(), 1);
        assert_eq!(record.history(HistoryKind::Annotations).len(), 1);
        assert_eq!(
            record.history(HistoryKind::Searches).entries()[0].payload,
            "front door"
        );
        assert_eq!(
            record.history(HistoryKind::Annotations).entries()[0].payload,
            "false alarm"
        );
    }

    #[test]
    fn test_record_round_trips_through_bincode() {
        let mut record = test_record();
        record.set_password("hunter2").unwrap();
        record
            .history_mut(HistoryKind::Searches)
            .insert(HistoryEntry::with_timestamp("garage", 7));

        let bytes = bincode::serialize(&record).unwrap();
        let decoded: UserRecord = bincode::deserialize(&bytes).unwrap();

        assert_eq!(decoded.username, record.username);
        assert_eq!(decoded.email, record.email);
        assert_eq!(decoded.password_hash, record.password_hash);
        assert_eq!(decoded.searches.len(), 1);
        assert_eq!(decoded.searches.entries()[0].payload, "garage");
        assert!(decoded.verify_password("hunter2"));
    }
}
