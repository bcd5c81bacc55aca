use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::record::PersonnelRecord;
use crate::view::{DivisionFilter, SummaryStats, divisions_of, render_summary_stats};

/// Outcome of the last read from the sheet
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    /// Nothing has been fetched yet
    #[default]
    Pending,
    Loaded,
    /// The read failed; the table shows nothing
    Failed(String),
}

/// Everything the dashboard page is rendered from
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    /// Records currently in the table
    pub records: Vec<PersonnelRecord>,
    /// Overview counts from the last full render
    pub stats: SummaryStats,
    /// Division entry carrying the active marker
    pub active_division: Option<String>,
    /// Search term of the last search, cleared by a full render
    pub search_term: Option<String>,
    pub load_status: LoadStatus,
    /// Divisions seen in the last successful full fetch
    pub known_divisions: Vec<String>,
    pub fetched_at: Option<DateTime<Utc>>,
    /// Generation of the request that produced this state
    pub generation: u64,
}

/// Ticket handed to a fetch-and-render cycle when it starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// View produced by one fetch-and-render cycle
#[derive(Debug, Clone)]
pub struct Commit {
    /// State built from this request's own fetch
    pub view: DashboardState,
    /// Whether the view replaced the stored state
    pub stored: bool,
}

/// Dashboard state of one client, sequenced by request generation
///
/// Every user action takes a token with [`Dashboard::begin`] before it
/// fetches. Only the holder of the most recent token may store its view; a
/// fetch that completes after a newer one started still gets its own view
/// back but never overwrites the stored state, so the dashboard always ends
/// on the last action the user took.
#[derive(Debug, Default)]
pub struct Dashboard {
    state: RwLock<DashboardState>,
    latest: AtomicU64,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new fetch-and-render cycle
    pub fn begin(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `token` is still the most recent one handed out
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> DashboardState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mark `division` as the selected entry of the division list
    pub fn select_division(&self, division: &str) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.active_division = Some(division.to_string());
    }

    /// Drop the active marker from the division list
    pub fn clear_division(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.active_division = None;
    }

    /// Commit a full render of a freshly fetched sheet
    ///
    /// `filter` decides whether the active division restricts the rows; the
    /// overview counts follow the rows that are shown.
    pub fn commit_full(
        &self,
        token: RequestToken,
        records: Vec<PersonnelRecord>,
        filter: DivisionFilter,
    ) -> Commit {
        self.commit(token, |state| {
            state.known_divisions = divisions_of(&records);
            let shown = filter.apply(records, state.active_division.as_deref());
            state.stats = render_summary_stats(&shown);
            state.records = shown;
            state.search_term = None;
            state.load_status = LoadStatus::Loaded;
        })
    }

    /// Commit search results: only the table changes, the counts stay
    pub fn commit_search(
        &self,
        token: RequestToken,
        term: &str,
        matches: Vec<PersonnelRecord>,
    ) -> Commit {
        self.commit(token, |state| {
            state.records = matches;
            state.search_term = Some(term.to_string());
            state.load_status = LoadStatus::Loaded;
        })
    }

    /// Commit a failed read: the table empties, the counts stay
    pub fn commit_failure(&self, token: RequestToken, reason: &str) -> Commit {
        self.commit(token, |state| {
            state.records.clear();
            state.load_status = LoadStatus::Failed(reason.to_string());
        })
    }

    fn commit<F>(&self, token: RequestToken, update: F) -> Commit
    where
        F: FnOnce(&mut DashboardState),
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        let mut view = state.clone();
        update(&mut view);
        view.generation = token.0;
        view.fetched_at = Some(Utc::now());

        // Checked under the write lock so two commits cannot interleave.
        if !self.is_current(token) || token.0 < state.generation {
            log::debug!(
                "Discarding stale response for request {} (latest {})",
                token.0,
                self.latest.load(Ordering::SeqCst)
            );
            return Commit {
                view,
                stored: false,
            };
        }

        *state = view.clone();
        Commit { view, stored: true }
    }
}
