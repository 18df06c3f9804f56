// LogViewer - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation. Lines that fail to parse are not
// errors at all: the parser counts and skips them.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all LogViewer operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum LogViewerError {
    /// Persistent store operation failed.
    Store(StoreError),

    /// Session (view orchestration) operation failed.
    Session(SessionError),

    /// Upload pipeline failed.
    Ingest(IngestError),

    /// Configuration loading or validation failed.
    Config(ConfigError),
}

impl fmt::Display for LogViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "Storage error: {e}"),
            Self::Session(e) => write!(f, "Session error: {e}"),
            Self::Ingest(e) => write!(f, "Upload error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for LogViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Session(e) => Some(e),
            Self::Ingest(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Errors raised by a [`crate::app::store::LogStore`] implementation.
#[derive(Debug)]
pub enum StoreError {
    /// The backing storage cannot perform `operation` at all (e.g. the store
    /// directory cannot be enumerated). Callers should present this as
    /// "file list unavailable" and allow a retry.
    Unsupported {
        operation: &'static str,
        source: Option<io::Error>,
    },

    /// No collection is persisted under `name`.
    NotFound { name: String },

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },

    /// A record could not be serialised for persistence.
    Serialize {
        name: String,
        source: serde_json::Error,
    },

    /// Every `_N` suffix up to `max` is already taken for `name`.
    NameExhausted { name: String, max: u32 },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { operation, source } => match source {
                Some(source) => write!(f, "storage does not support {operation}: {source}"),
                None => write!(f, "storage does not support {operation}"),
            },
            Self::NotFound { name } => write!(f, "no stored log file named '{name}'"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
            Self::Serialize { name, source } => {
                write!(f, "cannot serialise records of '{name}': {source}")
            }
            Self::NameExhausted { name, max } => write!(
                f,
                "cannot find a free name for '{name}' after {max} suffixes"
            ),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unsupported {
                source: Some(source),
                ..
            } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::Serialize { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<StoreError> for LogViewerError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

/// Errors raised by [`crate::app::session::Session`] operations.
#[derive(Debug)]
pub enum SessionError {
    /// The named file is not part of the current session.
    NotOpen { file: String },

    /// `index` is outside the file's displayed sequence.
    IndexOutOfRange {
        file: String,
        index: usize,
        len: usize,
    },

    /// The selected record's timestamp does not resolve to an instant, so
    /// there is nothing meaningful to align against.
    AlignmentUnresolvable {
        file: String,
        index: usize,
        raw_timestamp: String,
    },

    /// Search stepping was requested while the file's highlight is not one
    /// of its search matches.
    NoActiveMatch { file: String },

    /// Some files of an `open_files`/`filter` batch could not be loaded.
    /// The remaining files were loaded normally.
    PartialLoadFailure { failures: Vec<(String, StoreError)> },

    /// Some files of a batch delete could not be deleted. Successful
    /// deletions in the same batch are not rolled back.
    PartialDeleteFailure { failures: Vec<(String, StoreError)> },

    /// A single store call failed.
    Store(StoreError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotOpen { file } => write!(f, "'{file}' is not open in this session"),
            Self::IndexOutOfRange { file, index, len } => write!(
                f,
                "index {index} is out of range for '{file}' ({len} records displayed)"
            ),
            Self::AlignmentUnresolvable {
                file,
                index,
                raw_timestamp,
            } => write!(
                f,
                "record {index} of '{file}' has unresolvable timestamp '{raw_timestamp}'"
            ),
            Self::NoActiveMatch { file } => {
                write!(f, "'{file}' has no highlighted search match to step from")
            }
            Self::PartialLoadFailure { failures } => {
                write!(f, "{} file(s) failed to load:", failures.len())?;
                for (name, e) in failures {
                    write!(f, " [{name}: {e}]")?;
                }
                Ok(())
            }
            Self::PartialDeleteFailure { failures } => {
                write!(f, "{} file(s) failed to delete:", failures.len())?;
                for (name, e) in failures {
                    write!(f, " [{name}: {e}]")?;
                }
                Ok(())
            }
            Self::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PartialLoadFailure { failures } | Self::PartialDeleteFailure { failures } => {
                failures
                    .first()
                    .map(|(_, e)| e as &(dyn std::error::Error + 'static))
            }
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<SessionError> for LogViewerError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

// ---------------------------------------------------------------------------
// Ingest errors
// ---------------------------------------------------------------------------

/// Errors raised while uploading a log file into the store.
#[derive(Debug)]
pub enum IngestError {
    /// The uploaded file could not be read.
    Read { path: PathBuf, source: io::Error },

    /// The path has no usable file name to store the collection under.
    NoFileName { path: PathBuf },

    /// The parsed records could not be saved.
    Store { name: String, source: StoreError },
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "cannot read '{}': {source}", path.display())
            }
            Self::NoFileName { path } => {
                write!(f, "'{}' has no file name to store it under", path.display())
            }
            Self::Store { name, source } => write!(f, "cannot save '{name}': {source}"),
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Store { source, .. } => Some(source),
            Self::NoFileName { .. } => None,
        }
    }
}

impl From<IngestError> for LogViewerError {
    fn from(e: IngestError) -> Self {
        Self::Ingest(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for LogViewerError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
