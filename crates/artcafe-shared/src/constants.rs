/// Application name
pub const APP_NAME: &str = "ArtCafe";

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Trailing window in which an identical notification is suppressed (5 minutes)
pub const NOTIFICATION_DEDUP_WINDOW_SECS: i64 = 5 * 60;

/// Unread notifications flipped per "mark all as read" call
pub const MARK_ALL_READ_BATCH: u32 = 100;

/// Read notifications deleted per "clear read" call
pub const CLEAR_READ_BATCH: u32 = 500;

/// Page size used when the client does not send one
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound on any client-requested page size
pub const MAX_PAGE_SIZE: u32 = 100;

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LEN: usize = 6;

/// Post titles are cut to this many characters inside notification text
pub const TITLE_PREVIEW_CHARS: usize = 30;

/// Argon2 salt length, in bytes
pub const PASSWORD_SALT_SIZE: usize = 16;

/// Session token length, in bytes (hex-encoded on the wire)
pub const SESSION_TOKEN_SIZE: usize = 32;

/// Maximum image upload size in bytes (10 MiB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Role granted to every registered account
pub const ROLE_USER: &str = "ROLE_USER";

/// BLAKE3 key derivation context for session token digests
pub const KDF_CONTEXT_SESSION: &str = "artcafe-session-token-v1";
