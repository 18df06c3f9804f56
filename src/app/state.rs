// LogViewer - app/state.rs
//
// Per-file view state held by a session: the displayed record sequence,
// its load status, active filter and search, and the highlighted row.
// Never persisted; rebuilt from the store whenever files are (re)opened.

use crate::core::filter::FilterState;
use crate::core::model::LogRecord;
use crate::core::search::SearchState;
use tokio::time::Instant;

/// Load lifecycle of one open file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Named in the session but no load started yet.
    Unloaded,
    /// A store read is in flight.
    Loading,
    /// Records are sorted and displayable.
    Ready,
    /// The last load failed; the message is for display.
    Failed(String),
}

impl LoadState {
    /// Whether the file has reached a state the display can settle on.
    pub fn is_settled(&self) -> bool {
        matches!(self, LoadState::Ready | LoadState::Failed(_))
    }
}

/// An emphasised row. Alignment highlights expire; search highlights stay
/// until the search changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub index: usize,
    pub expires_at: Option<Instant>,
}

impl Highlight {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// Everything the session knows about one open file.
#[derive(Debug, Clone)]
pub struct FileView {
    /// Store name of the file.
    pub name: String,

    pub state: LoadState,

    /// Displayed records: chronological, possibly filtered, possibly reversed.
    pub records: Vec<LogRecord>,

    /// Whether `records` is in reverse chronological order.
    pub reversed: bool,

    /// Filter that produced `records` (empty = unfiltered).
    pub filter: FilterState,

    /// Active search over `records`.
    pub search: SearchState,

    pub highlight: Option<Highlight>,
}

impl FileView {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: LoadState::Unloaded,
            records: Vec::new(),
            reversed: false,
            filter: FilterState::default(),
            search: SearchState::default(),
            highlight: None,
        }
    }

    /// Replace the displayed records with a freshly sorted sequence.
    ///
    /// Resets reversal and highlight; re-runs any active search so match
    /// indices refer to the new sequence.
    pub fn install(&mut self, records: Vec<LogRecord>, filter: FilterState) {
        self.records = records;
        self.filter = filter;
        self.reversed = false;
        self.highlight = None;
        self.search.refresh(&self.records);
        self.state = LoadState::Ready;
    }

    /// Mark a failed load; the previous records are dropped.
    pub fn fail(&mut self, reason: String) {
        self.records.clear();
        self.reversed = false;
        self.highlight = None;
        self.search.refresh(&self.records);
        self.state = LoadState::Failed(reason);
    }

    /// Flip display order, keeping highlight and matches on the same records.
    pub fn reverse(&mut self) {
        let len = self.records.len();
        self.records.reverse();
        self.reversed = !self.reversed;
        self.search.mirror(len);
        if let Some(highlight) = self.highlight.as_mut() {
            highlight.index = len - 1 - highlight.index;
        }
    }

    /// The highlighted index at `now`, hiding an elapsed alignment highlight.
    pub fn highlighted_at(&self, now: Instant) -> Option<usize> {
        self.highlight
            .filter(|h| !h.is_expired(now))
            .map(|h| h.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Severity;
    use std::time::Duration;

    fn view_with(messages: &[&str]) -> FileView {
        let mut view = FileView::new("v.slg");
        let records = messages
            .iter()
            .enumerate()
            .map(|(i, m)| LogRecord::new(format!("10:00:0{i},000"), Severity::Info, *m))
            .collect();
        view.install(records, FilterState::default());
        view
    }

    #[test]
    fn test_new_view_is_unloaded() {
        let view = FileView::new("x");
        assert_eq!(view.state, LoadState::Unloaded);
        assert!(!view.state.is_settled());
    }

    #[test]
    fn test_reverse_mirrors_highlight_and_matches() {
        let mut view = view_with(&["a", "hit", "b", "hit"]);
        view.search = SearchState::run("hit", &view.records);
        view.highlight = Some(Highlight {
            index: 1,
            expires_at: None,
        });

        view.reverse();
        assert!(view.reversed);
        assert_eq!(view.records[0].message, "hit");
        assert_eq!(view.search.matches(), &[0, 2]);
        assert_eq!(view.highlight.map(|h| h.index), Some(2));
        assert_eq!(view.records[2].message, "hit");

        view.reverse();
        assert!(!view.reversed);
        assert_eq!(view.highlight.map(|h| h.index), Some(1));
    }

    #[test]
    fn test_install_resets_view_flags() {
        let mut view = view_with(&["a", "b"]);
        view.reverse();
        view.highlight = Some(Highlight {
            index: 0,
            expires_at: None,
        });
        view.install(Vec::new(), FilterState::default());
        assert!(!view.reversed);
        assert!(view.highlight.is_none());
        assert_eq!(view.state, LoadState::Ready);
    }

    #[test]
    fn test_expired_highlight_is_hidden() {
        let mut view = view_with(&["a"]);
        let now = Instant::now();
        view.highlight = Some(Highlight {
            index: 0,
            expires_at: Some(now + Duration::from_secs(5)),
        });
        assert_eq!(view.highlighted_at(now), Some(0));
        assert_eq!(view.highlighted_at(now + Duration::from_secs(5)), None);
    }

    #[test]
    fn test_fail_clears_records() {
        let mut view = view_with(&["a"]);
        view.fail("gone".to_string());
        assert!(view.records.is_empty());
        assert_eq!(view.state, LoadState::Failed("gone".to_string()));
        assert!(view.state.is_settled());
    }
}
