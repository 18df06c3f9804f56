// LogViewer - core/parser.rs
//
// Line-oriented log parsing.
// Core layer: takes text the caller already read, never touches the
// filesystem directly. Lines that do not match are skipped, never an error.

use crate::core::model::{LogRecord, Severity};
use crate::util::constants::DEBUG_MAX_LINE_PREVIEW;
use regex::Regex;
use std::sync::OnceLock;

/// Result of parsing one file's text.
#[derive(Debug, Default)]
pub struct ParseResult {
    /// Records in source line order.
    pub records: Vec<LogRecord>,
    /// Physical lines seen.
    pub lines_processed: u64,
    /// Non-blank lines that did not match the line shape.
    pub lines_skipped: u64,
}

/// Line shape: `<timestamp> <INFO|WARN|ERROR> <message>`.
///
/// The timestamp is either `YYYY-MM-DD HH:MM:SS,mmm` or `HH:MM:SS,mmm`.
/// The match is not anchored, so text before the timestamp is tolerated.
fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?P<timestamp>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d{3}|\d{2}:\d{2}:\d{2},\d{3}) (?P<level>INFO|WARN|ERROR) (?P<message>.+)",
        )
        .expect("line pattern is a valid constant regex")
    })
}

/// Parse `content` into records, discarding statistics.
pub fn parse(content: &str) -> Vec<LogRecord> {
    parse_content(content).records
}

/// Parse `content` into records in source line order.
pub fn parse_content(content: &str) -> ParseResult {
    let pattern = line_pattern();
    let mut result = ParseResult::default();

    for (line_idx, line) in physical_lines(content).enumerate() {
        result.lines_processed += 1;

        match parse_line(pattern, line) {
            Some(record) => result.records.push(record),
            None => {
                if line.trim().is_empty() {
                    continue;
                }
                result.lines_skipped += 1;
                tracing::trace!(
                    line_number = line_idx + 1,
                    preview = %preview(line),
                    "Skipping line that does not match the log shape"
                );
            }
        }
    }

    tracing::debug!(
        records = result.records.len(),
        skipped = result.lines_skipped,
        lines = result.lines_processed,
        "Parsing complete"
    );

    result
}

/// Split on `\r\n`, `\n` or a bare `\r`. A trailing terminator does not
/// start another line.
fn physical_lines(content: &str) -> impl Iterator<Item = &str> {
    content.split_inclusive('\n').flat_map(|chunk| {
        let chunk = chunk.strip_suffix('\n').unwrap_or(chunk);
        let chunk = chunk.strip_suffix('\r').unwrap_or(chunk);
        chunk.split('\r')
    })
}

fn parse_line(pattern: &Regex, line: &str) -> Option<LogRecord> {
    let caps = pattern.captures(line)?;
    let severity: Severity = caps.name("level")?.as_str().parse().ok()?;
    Some(LogRecord::new(
        caps.name("timestamp")?.as_str(),
        severity,
        caps.name("message")?.as_str(),
    ))
}

fn preview(line: &str) -> &str {
    match line.char_indices().nth(DEBUG_MAX_LINE_PREVIEW) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::TimestampShape;

    #[test]
    fn test_parse_basic_lines() {
        let text = "2024-01-01 10:00:00,000 INFO start\n\
                    2024-01-01 10:00:05,500 ERROR fail\n\
                    malformed line\n";
        let result = parse_content(text);
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.lines_processed, 3);
        assert_eq!(result.lines_skipped, 1);

        let second = &result.records[1];
        assert_eq!(second.severity, Severity::Error);
        assert_eq!(second.message, "fail");
        assert_eq!(second.timestamp.as_str(), "2024-01-01 10:00:05,500");
    }

    #[test]
    fn test_parse_time_only_shape() {
        let records = parse("12:30:00,250 WARN disk {\"free\": 3}");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].timestamp.shape(), TimestampShape::TimeOnly);
        assert_eq!(records[0].message, "disk {\"free\": 3}");
    }

    #[test]
    fn test_parse_keeps_source_order() {
        let text = "10:00:05,000 INFO later\n10:00:01,000 INFO earlier\n";
        let records = parse(text);
        assert_eq!(records[0].message, "later");
        assert_eq!(records[1].message, "earlier");
    }

    #[test]
    fn test_parse_empty_content() {
        let result = parse_content("");
        assert!(result.records.is_empty());
        assert_eq!(result.lines_processed, 0);
    }

    #[test]
    fn test_parse_rejects_unknown_or_lowercase_levels() {
        let text = "10:00:00,000 DEBUG nope\n10:00:00,000 info nope\n10:00:00,000 ERROR\n";
        assert!(parse(text).is_empty());
    }

    #[test]
    fn test_parse_requires_millisecond_precision() {
        assert!(parse("2024-01-01 10:00:00 INFO no millis").is_empty());
        assert!(parse("10:00:00.000 INFO dot separator").is_empty());
    }

    #[test]
    fn test_parse_tolerates_prefix_and_crlf() {
        let records = parse("[node-1] 2024-02-02 08:00:00,001 INFO ready\r\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].timestamp.as_str(), "2024-02-02 08:00:00,001");
        assert_eq!(records[0].message, "ready");
    }

    #[test]
    fn test_parse_bare_carriage_return_lines() {
        let text = "10:00:00,000 INFO first\r10:00:01,000 WARN second\rnoise\r10:00:02,000 ERROR third\r";
        let result = parse_content(text);
        let messages: Vec<_> = result.records.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
        assert_eq!(result.lines_processed, 4);
        assert_eq!(result.lines_skipped, 1);
    }

    #[test]
    fn test_physical_lines_mixed_endings() {
        let lines: Vec<_> = physical_lines("a\r\nb\nc\rd\r\n").collect();
        assert_eq!(lines, vec!["a", "b", "c", "d"]);
        assert_eq!(physical_lines("").count(), 0);
        assert_eq!(physical_lines("x").collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn test_output_never_exceeds_line_count() {
        let text = "10:00:00,000 INFO a 10:00:01,000 INFO b\nnoise\n10:00:02,000 WARN c\n";
        let result = parse_content(text);
        assert!(result.records.len() as u64 <= result.lines_processed);
        assert_eq!(result.records[0].message, "a 10:00:01,000 INFO b");
        assert!(result
            .records
            .iter()
            .all(|r| Severity::all().contains(&r.severity)));
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "é".repeat(DEBUG_MAX_LINE_PREVIEW + 10);
        assert_eq!(preview(&long).chars().count(), DEBUG_MAX_LINE_PREVIEW);
    }
}
