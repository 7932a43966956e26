/// Maximum number of entries kept in each per-user history collection
/// Inserting past the cap evicts the oldest entry
pub const HISTORY_CAPACITY: usize = 10;

/// Default token lifetime in seconds (60 days)
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 5_184_000;

// =============================================================================
// Error Messages
// =============================================================================

/// Validation message for a required field that is missing or blank
pub const ERR_CANT_BE_BLANK: &str = "can't be blank";

/// Validation message for a username or email that is already registered
pub const ERR_ALREADY_TAKEN: &str = "is already taken";

/// Validation message for a failed login attempt
pub const ERR_IS_INVALID: &str = "is invalid";

/// Field name reported on a failed login
/// Deployed clients key off this exact string
pub const LOGIN_FAILURE_FIELD: &str = "username or password";

/// Sanitized message returned for internal faults
pub const ERR_INTERNAL: &str = "Internal server error";

/// Message returned for authentication failures
pub const ERR_UNAUTHORIZED: &str = "unauthorized";
