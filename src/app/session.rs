// LogViewer - app/session.rs
//
// Multi-file view orchestration: open, align, search, filter, reverse and
// delete across the files a user has open side by side.
//
// Design principles:
// - The store is injected; the session owns no global handle.
// - Every mutating operation takes `&mut self`, so operations on one session
//   are serialised and a stale load can never overwrite a newer one.
// - Views are rebuilt from the store on open and filter; reversal, search
//   and highlights are view state only and never reach the store.
// - Alignment highlights expire after a dwell. Expiry is a deadline checked
//   on read (and by `expire_highlights`), so a newer selection supersedes
//   the older clear by overwriting it instead of stacking timers.

use crate::app::state::{FileView, Highlight, LoadState};
use crate::app::store::LogStore;
use crate::core::aligner::{closest_index, closest_index_by, sort_chronologically};
use crate::core::filter::FilterState;
use crate::core::model::{LogRecord, ReferenceDate, Severity};
use crate::core::search::{SearchDirection, SearchState};
use crate::platform::config::AppConfig;
use crate::util::constants::DEFAULT_HIGHLIGHT_DWELL_MS;
use crate::util::error::{SessionError, StoreError};
use chrono::{NaiveDate, NaiveDateTime};
use futures::future::join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Tunables for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long alignment highlights stay visible.
    pub highlight_dwell: Duration,

    /// Date used to resolve time-only timestamps when sorting and aligning.
    pub reference_date: ReferenceDate,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            highlight_dwell: Duration::from_millis(DEFAULT_HIGHLIGHT_DWELL_MS),
            reference_date: ReferenceDate::Today,
        }
    }
}

impl SessionConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            highlight_dwell: config.highlight_dwell,
            ..Self::default()
        }
    }
}

/// Outcome of a cross-file selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    /// File the user selected in.
    pub source_file: String,

    /// Index selected in the source file's displayed sequence.
    pub source_index: usize,

    /// Resolved instant of the selected record.
    pub instant: NaiveDateTime,

    /// Closest index in every other open file, in open order.
    /// `None` for files with nothing displayed.
    pub targets: Vec<(String, Option<usize>)>,
}

/// The set of open files and their views.
pub struct Session {
    store: Arc<dyn LogStore>,
    config: SessionConfig,
    views: Vec<FileView>,
}

impl Session {
    pub fn new(store: Arc<dyn LogStore>, config: SessionConfig) -> Self {
        Self {
            store,
            config,
            views: Vec::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Change the date time-only stamps resolve against. Takes effect on the
    /// next open/filter (ordering) and selection (alignment).
    pub fn set_reference_date(&mut self, reference_date: ReferenceDate) {
        self.config.reference_date = reference_date;
    }

    // =========================================================================
    // Store-facing operations
    // =========================================================================

    /// Names of every stored file, for the file chooser.
    pub async fn list_files(&self) -> Result<BTreeSet<String>, SessionError> {
        Ok(self.store.list_names().await?)
    }

    /// Make `names` the open set and load each file from the store.
    ///
    /// Files not named are closed. Every named file is reloaded, even if it
    /// was already open, which discards its reversal, filter, search and
    /// highlight. Loads run concurrently; when some fail, the others are
    /// still displayed and every failure is returned together.
    pub async fn open_files<I, S>(&mut self, names: I) -> Result<(), SessionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut requested: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !requested.contains(&name) {
                requested.push(name);
            }
        }

        self.views = requested.iter().map(FileView::new).collect();
        tracing::debug!(files = ?requested, "Opening files");

        let targets = requested
            .into_iter()
            .map(|name| (name, FilterState::default()))
            .collect();
        self.reload(targets).await
    }

    /// Re-load `files` from the store keeping only records that match.
    ///
    /// Always filters the stored sequence, never the currently displayed
    /// one. Passing `None` for both predicates clears the filter.
    pub async fn filter<I, S>(
        &mut self,
        files: I,
        severity: Option<Severity>,
        content: Option<&str>,
    ) -> Result<(), SessionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let files = self.require_open(files)?;
        let filter = FilterState::new(severity, content);
        tracing::debug!(files = ?files, ?filter, "Filtering files");

        let targets = files.into_iter().map(|name| (name, filter.clone())).collect();
        self.reload(targets).await
    }

    /// Delete every named file from the store and close it.
    ///
    /// Each deletion is attempted even after an earlier one fails; files
    /// that were deleted stay deleted and every failure is reported.
    pub async fn delete_files<I, S>(&mut self, names: I) -> Result<(), SessionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut failures: Vec<(String, StoreError)> = Vec::new();
        for name in names {
            let name = name.into();
            match self.store.delete(&name).await {
                Ok(()) => self.views.retain(|view| view.name != name),
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "Delete failed");
                    failures.push((name, e));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(SessionError::PartialDeleteFailure { failures })
        }
    }

    /// Load, sort, filter and install each target view.
    async fn reload(&mut self, targets: Vec<(String, FilterState)>) -> Result<(), SessionError> {
        let reference = self.config.reference_date.resolve();

        for (name, _) in &targets {
            if let Some(view) = self.views.iter_mut().find(|v| &v.name == name) {
                view.state = LoadState::Loading;
            }
        }

        let store = self.store.as_ref();
        let results = join_all(targets.iter().map(|(name, filter)| async move {
            load_sorted(store, name, reference)
                .await
                .map(|records| filter.apply(records))
        }))
        .await;

        let mut failures: Vec<(String, StoreError)> = Vec::new();
        for ((name, filter), result) in targets.into_iter().zip(results) {
            let Some(view) = self.views.iter_mut().find(|v| v.name == name) else {
                continue;
            };
            match result {
                Ok(records) => {
                    tracing::debug!(file = %name, records = records.len(), "File ready");
                    view.install(records, filter);
                }
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "File failed to load");
                    view.fail(e.to_string());
                    failures.push((name, e));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(SessionError::PartialLoadFailure { failures })
        }
    }

    // =========================================================================
    // View operations
    // =========================================================================

    /// Align every other open file to the record at `index` of `file`.
    ///
    /// Each other file's highlight moves to its record closest in time and
    /// expires after the configured dwell. Alignment is by timestamp value,
    /// so reversed views are handled too. If the selected record's timestamp
    /// does not resolve, nothing changes and `AlignmentUnresolvable` is
    /// returned.
    pub fn select_record(&mut self, file: &str, index: usize) -> Result<Alignment, SessionError> {
        let reference = self.config.reference_date.resolve();
        let source = self.view(file)?;
        let record = source
            .records
            .get(index)
            .ok_or_else(|| SessionError::IndexOutOfRange {
                file: file.to_string(),
                index,
                len: source.records.len(),
            })?;
        let instant =
            record
                .instant(reference)
                .ok_or_else(|| SessionError::AlignmentUnresolvable {
                    file: file.to_string(),
                    index,
                    raw_timestamp: record.timestamp.to_string(),
                })?;

        let expires_at = Instant::now() + self.config.highlight_dwell;
        let mut targets = Vec::with_capacity(self.views.len().saturating_sub(1));
        for view in self.views.iter_mut().filter(|v| v.name != file) {
            let found = closest_in_view(view, instant, reference);
            view.highlight = found.map(|index| Highlight {
                index,
                expires_at: Some(expires_at),
            });
            targets.push((view.name.clone(), found));
        }

        tracing::debug!(file, index, %instant, targets = ?targets, "Aligned files");
        Ok(Alignment {
            source_file: file.to_string(),
            source_index: index,
            instant,
            targets,
        })
    }

    /// Search `file`'s displayed messages for `query`, case-insensitively.
    ///
    /// Highlights the first match. An empty query clears the matches and
    /// the file's highlight; a query with no matches leaves the highlight
    /// as it was.
    pub fn search(&mut self, file: &str, query: &str) -> Result<&[usize], SessionError> {
        let view = self.view_mut(file)?;
        view.search = SearchState::run(query, &view.records);
        if !view.search.is_active() {
            view.highlight = None;
        } else if let Some(&index) = view.search.matches().first() {
            view.highlight = Some(Highlight {
                index,
                expires_at: None,
            });
        }
        tracing::debug!(file, query, matches = view.search.matches().len(), "Search updated");
        Ok(view.search.matches())
    }

    /// Move the highlight to the next or previous search match, wrapping.
    ///
    /// Fails with `NoActiveMatch` when the current highlight is not a match.
    pub fn step_search(
        &mut self,
        file: &str,
        direction: SearchDirection,
    ) -> Result<usize, SessionError> {
        let now = Instant::now();
        let view = self.view_mut(file)?;
        let no_match = || SessionError::NoActiveMatch {
            file: file.to_string(),
        };
        let current = view.highlighted_at(now).ok_or_else(no_match)?;
        let next = view.search.step(current, direction).ok_or_else(no_match)?;
        view.highlight = Some(Highlight {
            index: next,
            expires_at: None,
        });
        Ok(next)
    }

    /// Flip the display order of `files` in memory.
    pub fn reverse<I, S>(&mut self, files: I) -> Result<(), SessionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in self.require_open(files)? {
            if let Some(view) = self.views.iter_mut().find(|v| v.name == name) {
                view.reverse();
            }
        }
        Ok(())
    }

    // =========================================================================
    // Highlight expiry
    // =========================================================================

    /// Clear every alignment highlight whose dwell has elapsed.
    /// Returns the names of the files that lost their highlight.
    pub fn expire_highlights(&mut self) -> Vec<String> {
        let now = Instant::now();
        let mut cleared = Vec::new();
        for view in &mut self.views {
            if view.highlight.is_some_and(|h| h.is_expired(now)) {
                view.highlight = None;
                cleared.push(view.name.clone());
            }
        }
        if !cleared.is_empty() {
            tracing::debug!(files = ?cleared, "Highlights expired");
        }
        cleared
    }

    /// Earliest pending highlight deadline, if any.
    pub fn next_highlight_expiry(&self) -> Option<Instant> {
        self.views
            .iter()
            .filter_map(|v| v.highlight.and_then(|h| h.expires_at))
            .min()
    }

    /// Sleep until the earliest highlight deadline, then expire.
    /// Returns immediately with nothing when no highlight is pending.
    pub async fn wait_for_highlight_expiry(&mut self) -> Vec<String> {
        match self.next_highlight_expiry() {
            Some(deadline) => {
                tokio::time::sleep_until(deadline).await;
                self.expire_highlights()
            }
            None => Vec::new(),
        }
    }

    // =========================================================================
    // Rendering accessors
    // =========================================================================

    /// Open file names, in open order.
    pub fn file_names(&self) -> Vec<&str> {
        self.views.iter().map(|v| v.name.as_str()).collect()
    }

    pub fn file(&self, name: &str) -> Option<&FileView> {
        self.views.iter().find(|v| v.name == name)
    }

    /// Number of displayed records for `file` (0 if not open).
    pub fn len(&self, file: &str) -> usize {
        self.file(file).map_or(0, |v| v.records.len())
    }

    /// Row count of the tallest open pane.
    pub fn max_len(&self) -> usize {
        self.views.iter().map(|v| v.records.len()).max().unwrap_or(0)
    }

    pub fn record_at(&self, file: &str, index: usize) -> Option<&LogRecord> {
        self.file(file).and_then(|v| v.records.get(index))
    }

    /// The row to emphasise in `file`, if any. Elapsed highlights are hidden
    /// even before `expire_highlights` runs.
    pub fn highlighted_index(&self, file: &str) -> Option<usize> {
        self.file(file)
            .and_then(|v| v.highlighted_at(Instant::now()))
    }

    pub fn load_state(&self, file: &str) -> Option<&LoadState> {
        self.file(file).map(|v| &v.state)
    }

    /// True once every open file has finished loading or failed.
    pub fn is_ready(&self) -> bool {
        self.views.iter().all(|v| v.state.is_settled())
    }

    pub fn search_matches(&self, file: &str) -> &[usize] {
        match self.file(file) {
            Some(view) => view.search.matches(),
            None => &[],
        }
    }

    pub fn is_reversed(&self, file: &str) -> bool {
        self.file(file).is_some_and(|v| v.reversed)
    }

    pub fn active_filter(&self, file: &str) -> Option<&FilterState> {
        self.file(file).map(|v| &v.filter)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn view(&self, file: &str) -> Result<&FileView, SessionError> {
        self.file(file).ok_or_else(|| SessionError::NotOpen {
            file: file.to_string(),
        })
    }

    fn view_mut(&mut self, file: &str) -> Result<&mut FileView, SessionError> {
        self.views
            .iter_mut()
            .find(|v| v.name == file)
            .ok_or_else(|| SessionError::NotOpen {
                file: file.to_string(),
            })
    }

    /// Collect `files`, failing before any change if one is not open.
    fn require_open<I, S>(&self, files: I) -> Result<Vec<String>, SessionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let files: Vec<String> = files.into_iter().map(Into::into).collect();
        if let Some(missing) = files.iter().find(|f| self.file(f).is_none()) {
            return Err(SessionError::NotOpen {
                file: missing.clone(),
            });
        }
        Ok(files)
    }
}

async fn load_sorted(
    store: &dyn LogStore,
    name: &str,
    reference: NaiveDate,
) -> Result<Vec<LogRecord>, StoreError> {
    let mut records = store.load_all(name).await?;
    sort_chronologically(&mut records, reference);
    Ok(records)
}

/// Closest displayed index to `instant`, searching reversed views through a
/// mirrored accessor so the search always runs over ascending instants.
fn closest_in_view(view: &FileView, instant: NaiveDateTime, reference: NaiveDate) -> Option<usize> {
    if !view.reversed {
        return closest_index(&view.records, instant, reference);
    }
    let len = view.records.len();
    closest_index_by(len, |i| view.records[len - 1 - i].instant(reference), instant)
        .map(|i| len - 1 - i)
}
