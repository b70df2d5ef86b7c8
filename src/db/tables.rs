use redb::TableDefinition;

/// Profiles table: share_token -> ProfileRecord (serialized)
pub const PROFILES: TableDefinition<&str, &[u8]> = TableDefinition::new("profiles");

/// Owner index: owner_id -> share_token
/// One profile per owner; used for idempotent creation and account deletion
pub const OWNER_PROFILES: TableDefinition<&str, &str> = TableDefinition::new("owner_profiles");

/// Measurements table: share_token -> MeasurementsRecord (serialized)
pub const MEASUREMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("measurements");
