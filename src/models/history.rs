use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::HISTORY_CAPACITY;

/// Which of a user's history collections an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    Searches,
    Annotations,
}

impl HistoryKind {
    /// JSON key the collection is reported under
    pub fn key(self) -> &'static str {
        match self {
            HistoryKind::Searches => "searches",
            HistoryKind::Annotations => "annotations",
        }
    }
}

/// Access to the identity and creation time of a stored entry
pub trait Timestamped {
    fn id(&self) -> &str;
    fn created_at(&self) -> i64;
}

/// A single history entry
/// Uses millisecond Unix timestamps for compact storage with bincode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Entry ID (UUID v4)
    pub id: String,
    /// User-supplied text
    pub payload: String,
    /// When the entry was recorded (Unix timestamp, milliseconds)
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

impl HistoryEntry {
    /// Create an entry stamped with the current time
    pub fn new(payload: impl Into<String>) -> Self {
        Self::with_timestamp(payload, chrono::Utc::now().timestamp_millis())
    }

    /// Create an entry with an explicit timestamp
    pub fn with_timestamp(payload: impl Into<String>, created_at: i64) -> Self {
        HistoryEntry {
            id: Uuid::new_v4().to_string(),
            payload: payload.into(),
            created_at,
        }
    }
}

impl Timestamped for HistoryEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }
}

/// A capacity-bounded list of timestamped entries
///
/// Entries keep insertion order for display. Inserting past the cap evicts
/// the entry with the minimum creation time, so the list never holds more
/// than the capacity after an insert. Both of a user's collections share
/// this one implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundedHistory<T> {
    entries: Vec<T>,
}

impl<T> Default for BoundedHistory<T> {
    fn default() -> Self {
        BoundedHistory {
            entries: Vec::new(),
        }
    }
}

impl<T> BoundedHistory<T> {
    /// Drop all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries in insertion order
    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Timestamped> BoundedHistory<T> {
    /// Append `entry`, evicting the oldest entry if the collection now
    /// exceeds [`HISTORY_CAPACITY`]. Returns the evicted entry, if any.
    pub fn insert(&mut self, entry: T) -> Option<T> {
        self.insert_capped(entry, HISTORY_CAPACITY)
    }

    /// Append `entry`, evicting the oldest entry if the collection now
    /// exceeds `capacity`
    pub fn insert_capped(&mut self, entry: T, capacity: usize) -> Option<T> {
        self.entries.push(entry);
        if self.entries.len() <= capacity {
            return None;
        }

        let oldest_id = match self.oldest() {
            Some(oldest) => oldest.id().to_owned(),
            None => return None,
        };
        self.remove(&oldest_id)
    }

    /// The entry with the minimum creation time
    ///
    /// The strict comparison keeps the first entry in stored order when
    /// timestamps tie, so repeated scans pick the same entry.
    pub fn oldest(&self) -> Option<&T> {
        let mut oldest: Option<&T> = None;
        for entry in &self.entries {
            let is_older = match oldest {
                Some(current) => entry.created_at() < current.created_at(),
                None => true,
            };
            if is_older {
                oldest = Some(entry);
            }
        }
        oldest
    }

    /// Remove the entry with the given id, returning it
    pub fn remove(&mut self, id: &str) -> Option<T> {
        let position = self.entries.iter().position(|entry| entry.id() == id)?;
        Some(self.entries.remove(position))
    }
}
