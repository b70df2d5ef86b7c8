/// Random bytes behind a generated share token (288 bits)
/// Encodes to 48 URL-safe base64 characters without padding
pub const SHARE_TOKEN_BYTES: usize = 36;

/// Shortest share token accepted on inbound requests
pub const MIN_SHARE_TOKEN_LEN: usize = 40;

/// Longest share token accepted on inbound requests
pub const MAX_SHARE_TOKEN_LEN: usize = 100;

/// Number of digits in an edit PIN
pub const PIN_LENGTH: usize = 4;

/// bcrypt work factor for stored PIN hashes
pub const PIN_HASH_COST: u32 = 12;

/// PIN checks allowed per share token within one window
pub const PIN_MAX_ATTEMPTS: u32 = 5;

/// Length of the PIN rate limit window in seconds (15 minutes)
pub const PIN_WINDOW_SECS: u64 = 900;

/// Prefix of the rate limit key for PIN checks
pub const PIN_RATE_LIMIT_PREFIX: &str = "pin:";

/// Lifetime of an edit session credential in seconds (1 hour)
pub const EDIT_SESSION_TTL_SECS: u64 = 3600;

/// Interval between rate limit eviction sweeps in seconds
pub const RATE_LIMIT_SWEEP_SECS: u64 = 60;

/// Cookie name prefix for edit session credentials, suffixed by the share token
pub const EDIT_SESSION_COOKIE_PREFIX: &str = "edit_session_";

/// Minimum length of the session signing secret in bytes
pub const MIN_SESSION_SECRET_LEN: usize = 32;

// =============================================================================
// Profile Limits
// =============================================================================

/// Display name bounds (characters, after sanitising)
pub const MIN_DISPLAY_NAME_LEN: usize = 2;
pub const MAX_DISPLAY_NAME_LEN: usize = 60;

/// Maximum notes length (characters)
pub const MAX_NOTES_LEN: usize = 500;

/// Largest accepted measurement value
pub const MAX_MEASUREMENT_VALUE: f64 = 999.0;

/// Maximum length of an owner id supplied by the authentication layer
pub const MAX_OWNER_ID_LEN: usize = 128;

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for a malformed share token
pub const ERR_INVALID_TOKEN: &str = "Invalid share token";

/// Error message for a malformed PIN
pub const ERR_INVALID_PIN: &str = "PIN must be exactly 4 digits";

/// Error message when PIN and confirmation differ
pub const ERR_PIN_MISMATCH: &str = "PINs do not match";

/// Error message for a display name that is too short
pub const ERR_DISPLAY_NAME: &str = "Name must be at least 2 characters";

/// Error message for an unknown gender value
pub const ERR_INVALID_GENDER: &str = "Invalid gender selection";
