// LogViewer - core/model.rs
//
// Core data model types. Pure data definitions with no I/O, no UI,
// no platform dependencies.
//
// These types are the shared vocabulary across all layers.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Log Record (output of parsing)
// =============================================================================

/// A single parsed log line.
///
/// Records have no identity beyond their position in a sequence. The
/// timestamp is kept exactly as written in the source; it is resolved to an
/// instant only when records are compared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogRecord {
    /// Source timestamp token, verbatim.
    pub timestamp: RawTimestamp,

    /// Severity keyword of the line.
    pub severity: Severity,

    /// Remainder of the line after the severity keyword.
    pub message: String,
}

impl LogRecord {
    pub fn new(timestamp: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: RawTimestamp::new(timestamp),
            severity,
            message: message.into(),
        }
    }

    /// Resolve this record's timestamp against `reference`.
    /// `None` when the token does not denote a real date/time.
    pub fn instant(&self, reference: NaiveDate) -> Option<NaiveDateTime> {
        self.timestamp.resolve(reference)
    }
}

// =============================================================================
// Timestamps
// =============================================================================

/// chrono format of the full `YYYY-MM-DD HH:MM:SS,mmm` shape.
const FULL_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// chrono format of the time-only `HH:MM:SS,mmm` shape.
const TIME_ONLY_FORMAT: &str = "%H:%M:%S,%3f";

/// Which of the two accepted token shapes a timestamp has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampShape {
    /// `YYYY-MM-DD HH:MM:SS,mmm`
    Full,
    /// `HH:MM:SS,mmm`, dated by the reference date at comparison time.
    TimeOnly,
}

/// A timestamp token exactly as it appeared in the log line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTimestamp(String);

impl RawTimestamp {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classify the token by length. Parsing decides validity.
    pub fn shape(&self) -> TimestampShape {
        // "HH:MM:SS,mmm" is 12 bytes; anything longer must carry a date.
        if self.0.len() > 12 {
            TimestampShape::Full
        } else {
            TimestampShape::TimeOnly
        }
    }

    /// Resolve the token to an instant.
    ///
    /// Time-only tokens take their date from `reference`, so the same record
    /// resolves differently on different days. Records loaded before and
    /// compared after midnight can therefore sort inconsistently against
    /// full-shape records; callers that need stable results pass a fixed
    /// reference date.
    pub fn resolve(&self, reference: NaiveDate) -> Option<NaiveDateTime> {
        match self.shape() {
            TimestampShape::Full => NaiveDateTime::parse_from_str(&self.0, FULL_FORMAT).ok(),
            TimestampShape::TimeOnly => NaiveTime::parse_from_str(&self.0, TIME_ONLY_FORMAT)
                .ok()
                .map(|time| reference.and_time(time)),
        }
    }
}

impl fmt::Display for RawTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The date used to resolve time-only timestamps.
///
/// Passed explicitly into every sort and comparison instead of being read
/// from an ambient clock deep inside the aligner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceDate {
    /// The local calendar date at the moment of resolution.
    #[default]
    Today,
    /// A fixed date, for reproducible ordering.
    Fixed(NaiveDate),
}

impl ReferenceDate {
    pub fn resolve(&self) -> NaiveDate {
        match self {
            Self::Today => Local::now().date_naive(),
            Self::Fixed(date) => *date,
        }
    }
}

// =============================================================================
// Severity
// =============================================================================

/// The severity keywords recognised in log lines. Case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "INFO")]
    Info,
    #[serde(rename = "WARN")]
    Warn,
    #[serde(rename = "ERROR")]
    Error,
}

impl Severity {
    /// Returns all variants in display order.
    pub fn all() -> &'static [Severity] {
        &[Severity::Info, Severity::Warn, Severity::Error]
    }

    /// The keyword as written in log files.
    pub fn keyword(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Error returned when a string is not one of the severity keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSeverity(pub String);

impl fmt::Display for UnknownSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown severity '{}' (expected INFO, WARN or ERROR)", self.0)
    }
}

impl std::error::Error for UnknownSeverity {}

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::all()
            .iter()
            .copied()
            .find(|sev| sev.keyword() == s)
            .ok_or_else(|| UnknownSeverity(s.to_string()))
    }
}
