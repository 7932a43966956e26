use redb::TableDefinition;

/// Users table: user_id (UUID v4) -> UserRecord (serialized)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Username uniqueness index: username -> user_id
pub const USERNAMES: TableDefinition<&str, &str> = TableDefinition::new("usernames");

/// Email uniqueness index: email -> user_id
/// Maintained in the same transaction as the USERS row it points at
pub const EMAILS: TableDefinition<&str, &str> = TableDefinition::new("emails");
