// LogViewer - core/aligner.rs
//
// Chronological ordering and closest-instant lookup.
// Core layer: pure logic. The reference date for time-only timestamps is
// always passed in, never read here.

use crate::core::model::LogRecord;
use chrono::{NaiveDate, NaiveDateTime};

/// Sort `records` ascending by resolved instant.
///
/// Stable: records with equal instants keep their storage order.
/// Records whose timestamp does not resolve go last, in storage order.
pub fn sort_chronologically(records: &mut [LogRecord], reference: NaiveDate) {
    records.sort_by_cached_key(|record| {
        let instant = record.instant(reference);
        (instant.is_none(), instant)
    });
}

/// Index of the record in `sorted` whose instant is closest to `target`.
///
/// `sorted` must already be in the order produced by
/// [`sort_chronologically`] with the same `reference`; this is not checked.
/// Returns `None` only for an empty slice.
pub fn closest_index(
    sorted: &[LogRecord],
    target: NaiveDateTime,
    reference: NaiveDate,
) -> Option<usize> {
    closest_index_by(sorted.len(), |i| sorted[i].instant(reference), target)
}

/// Binary search for the instant closest to `target` over `len` positions.
///
/// `instant_at(i)` must be ascending in `i`, with unresolvable (`None`)
/// positions only at the end. Those positions are treated as lying after
/// any target and are never chosen, unless nothing resolves, in which case
/// the first position is returned.
///
/// The best candidate seen so far is replaced only by a strictly closer one,
/// so on equal distances the candidate visited first wins. An exact match
/// returns immediately.
pub fn closest_index_by<F>(len: usize, instant_at: F, target: NaiveDateTime) -> Option<usize>
where
    F: Fn(usize) -> Option<NaiveDateTime>,
{
    if len == 0 {
        return None;
    }

    let mut low = 0usize;
    let mut high = len; // exclusive
    let mut best: Option<(usize, i64)> = None;

    while low < high {
        // Lower midpoint of the inclusive range [low, high - 1].
        let mid = low + (high - 1 - low) / 2;
        let Some(instant) = instant_at(mid) else {
            high = mid;
            continue;
        };

        let diff = distance_ms(instant, target);
        if best.map_or(true, |(_, smallest)| diff < smallest) {
            best = Some((mid, diff));
        }

        if instant < target {
            low = mid + 1;
        } else if instant > target {
            high = mid;
        } else {
            return Some(mid);
        }
    }

    Some(best.map_or(0, |(idx, _)| idx))
}

fn distance_ms(a: NaiveDateTime, b: NaiveDateTime) -> i64 {
    a.signed_duration_since(b).num_milliseconds().abs()
}
