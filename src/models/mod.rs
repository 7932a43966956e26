pub mod history;
pub mod user;

pub use history::{BoundedHistory, HistoryEntry, HistoryKind, Timestamped};
pub use user::{AuthView, UserRecord};
