// LogViewer - core/search.rs
//
// Free-text search over a displayed record sequence, with wrap-around
// stepping between matches.

use crate::core::model::LogRecord;

/// Direction for [`SearchState::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Next,
    Previous,
}

/// Active query and the indices of matching records, ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    query: String,
    matches: Vec<usize>,
}

impl SearchState {
    /// Run `query` over `records`. An empty query matches nothing.
    pub fn run(query: &str, records: &[LogRecord]) -> Self {
        let mut state = Self {
            query: query.to_string(),
            matches: Vec::new(),
        };
        state.refresh(records);
        state
    }

    pub fn matches(&self) -> &[usize] {
        &self.matches
    }

    /// Whether a non-empty query is set, matched or not.
    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    /// Recompute matches after the underlying sequence changed.
    pub fn refresh(&mut self, records: &[LogRecord]) {
        self.matches.clear();
        if !self.is_active() {
            return;
        }
        let needle = self.query.to_lowercase();
        self.matches.extend(
            records
                .iter()
                .enumerate()
                .filter(|(_, r)| r.message.to_lowercase().contains(&needle))
                .map(|(idx, _)| idx),
        );
    }

    /// Mirror match indices after the sequence of length `len` was reversed.
    pub fn mirror(&mut self, len: usize) {
        for idx in &mut self.matches {
            *idx = len - 1 - *idx;
        }
        self.matches.reverse();
    }

    /// The match after (or before) `current`, wrapping at both ends.
    /// `None` when `current` is not itself a match.
    pub fn step(&self, current: usize, direction: SearchDirection) -> Option<usize> {
        let pos = self.matches.binary_search(&current).ok()?;
        let len = self.matches.len();
        let next = match direction {
            SearchDirection::Next => (pos + 1) % len,
            SearchDirection::Previous => (pos + len - 1) % len,
        };
        Some(self.matches[next])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Severity;

    fn records(messages: &[&str]) -> Vec<LogRecord> {
        messages
            .iter()
            .map(|m| LogRecord::new("10:00:00,000", Severity::Info, *m))
            .collect()
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let recs = records(&["Connection FAILED", "ok", "retry failed"]);
        let state = SearchState::run("failed", &recs);
        assert_eq!(state.matches(), &[0, 2]);
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        let state = SearchState::run("", &records(&["a", "b"]));
        assert!(state.matches().is_empty());
        assert!(!state.is_active());
    }

    #[test]
    fn test_step_wraps_both_ways() {
        let state = SearchState::run("x", &records(&["x", "-", "x", "x"]));
        assert_eq!(state.step(0, SearchDirection::Next), Some(2));
        assert_eq!(state.step(3, SearchDirection::Next), Some(0));
        assert_eq!(state.step(0, SearchDirection::Previous), Some(3));
        assert_eq!(state.step(1, SearchDirection::Next), None);
    }

    #[test]
    fn test_single_match_steps_to_itself() {
        let state = SearchState::run("only", &records(&["only", "other"]));
        assert_eq!(state.step(0, SearchDirection::Next), Some(0));
    }

    #[test]
    fn test_mirror_keeps_ascending_order() {
        let mut state = SearchState::run("x", &records(&["x", "-", "x", "-"]));
        state.mirror(4);
        assert_eq!(state.matches(), &[1, 3]);
    }
}
