// LogViewer - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "LogViewer";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "LogViewer";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Input conventions
// =============================================================================

/// Conventional extension of uploadable log files. Advisory only: the parser
/// accepts any text regardless of where it came from.
pub const LOG_FILE_EXTENSION: &str = "slg";

/// Maximum number of characters of a skipped line echoed into trace logs.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Storage layout
// =============================================================================

/// Name of the directory (under the platform data dir) holding collections.
pub const STORE_DIR_NAME: &str = "logs";

/// Prefix that marks a file in the store directory as a log collection.
/// Stripped before names are handed back to callers.
pub const COLLECTION_PREFIX: &str = "log_";

/// Marks a collection file named by the SHA-256 of its collection name
/// instead of the hex-encoded name itself.
pub const COLLECTION_DIGEST_MARKER: &str = "sha256_";

/// Longest hex-encoded name used directly in a file name (64 name bytes).
/// Longer names are stored under their digest so every collection file name
/// stays well below common filesystem limits (255 bytes).
pub const MAX_HEX_NAME_LEN: usize = 128;

/// Extension of a persisted collection (one JSON record per line).
pub const COLLECTION_EXTENSION: &str = "jsonl";

/// Extension of the sibling temp file a collection is written to before
/// being renamed into place.
pub const COLLECTION_TEMP_EXTENSION: &str = "jsonl.tmp";

/// Upper bound on `_N` suffixes tried when making a name unique. Reaching it
/// means the store holds an implausible number of same-named uploads.
pub const MAX_NAME_SUFFIX: u32 = 100_000;

// =============================================================================
// Session
// =============================================================================

/// How long an alignment highlight stays visible (ms).
pub const DEFAULT_HIGHLIGHT_DWELL_MS: u64 = 5_000;

/// Minimum user-configurable highlight dwell (ms).
pub const MIN_HIGHLIGHT_DWELL_MS: u64 = 100;

/// Maximum user-configurable highlight dwell (ms).
pub const MAX_HIGHLIGHT_DWELL_MS: u64 = 60_000;

// =============================================================================
// Logging
// =============================================================================

/// Default tracing filter when neither RUST_LOG, --debug, nor config set one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log levels accepted in `[logging] level`.
pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// =============================================================================
// File names
// =============================================================================

/// Configuration file name, looked up next to the platform config dir.
pub const CONFIG_FILE_NAME: &str = "config.toml";
