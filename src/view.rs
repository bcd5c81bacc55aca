use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::record::PersonnelRecord;

/// Label of the per-row action button
pub const VIEW_ACTION_LABEL: &str = "View";

/// One rendered row of the personnel table
///
/// `cells` holds ID, Name, Rank, Division and Status in that order. The
/// action column is the `action` label; it has no handler attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub cells: [String; 5],
    pub action: &'static str,
}

/// Build the table rows for `records`
///
/// Rows keep the order the sheet returned them in and duplicates are kept.
///
/// # Arguments
/// * `records` - Records to display
///
/// # Returns
/// * `Vec<TableRow>` - Exactly one row per record
///
/// # Examples
/// ```
/// use personnel_dashboard::record::PersonnelRecord;
/// use personnel_dashboard::view::render_personnel_table;
///
/// let records = vec![PersonnelRecord::new("P1", "Kovacs", "Ensign", "Ops", "Active")];
/// let rows = render_personnel_table(&records);
/// assert_eq!(rows.len(), 1);
/// assert_eq!(rows[0].cells[1], "Kovacs");
/// ```
pub fn render_personnel_table(records: &[PersonnelRecord]) -> Vec<TableRow> {
    records
        .iter()
        .map(|record| TableRow {
            cells: [
                record.id.clone(),
                record.name.clone(),
                record.rank.clone(),
                record.division.clone(),
                record.status.clone(),
            ],
            action: VIEW_ACTION_LABEL,
        })
        .collect()
}

/// Counts shown on the Personnel Overview card
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total: usize,
    pub active: usize,
    pub on_deployment: usize,
    /// Not tracked by the sheet; always zero
    pub new_recruits: usize,
}

/// Compute the overview counts for `records`
///
/// Status matching is exact and case-sensitive.
///
/// # Examples
/// ```
/// use personnel_dashboard::record::PersonnelRecord;
/// use personnel_dashboard::view::render_summary_stats;
///
/// let records = vec![
///     PersonnelRecord::new("P1", "Kovacs", "Ensign", "Ops", "Active"),
///     PersonnelRecord::new("P2", "Reyes", "Ensign", "Ops", "On Deployment"),
/// ];
/// let stats = render_summary_stats(&records);
/// assert_eq!((stats.total, stats.active, stats.on_deployment, stats.new_recruits), (2, 1, 1, 0));
/// ```
pub fn render_summary_stats(records: &[PersonnelRecord]) -> SummaryStats {
    SummaryStats {
        total: records.len(),
        active: records.iter().filter(|r| r.is_active()).count(),
        on_deployment: records.iter().filter(|r| r.is_on_deployment()).count(),
        new_recruits: 0,
    }
}

/// Keep the records matching a search term
///
/// A record matches when its Name, Rank, Division or ID contains `term`,
/// ignoring case. The term is not trimmed, and the empty term matches
/// every record.
pub fn filter_by_search(records: &[PersonnelRecord], term: &str) -> Vec<PersonnelRecord> {
    let term = term.to_lowercase();
    records
        .iter()
        .filter(|record| {
            [&record.name, &record.rank, &record.division, &record.id]
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
        })
        .cloned()
        .collect()
}

/// What a click on a division entry does to the table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DivisionFilter {
    /// Mark the entry active and redraw everything
    #[default]
    Highlight,
    /// Mark the entry active and show only that division's records
    Exact,
}

impl DivisionFilter {
    /// Apply the selection to a freshly fetched record set
    pub fn apply(&self, records: Vec<PersonnelRecord>, selected: Option<&str>) -> Vec<PersonnelRecord> {
        match (self, selected) {
            (DivisionFilter::Exact, Some(division)) => records
                .into_iter()
                .filter(|record| record.division == division)
                .collect(),
            _ => records,
        }
    }
}

impl FromStr for DivisionFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "highlight" => Ok(DivisionFilter::Highlight),
            "exact" => Ok(DivisionFilter::Exact),
            other => Err(format!(
                "unknown division filter '{}' (expected 'highlight' or 'exact')",
                other
            )),
        }
    }
}

/// Entry of the division list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DivisionEntry {
    pub name: String,
    pub active: bool,
}

/// Distinct non-empty divisions of `records`, in first-seen order
pub fn divisions_of(records: &[PersonnelRecord]) -> Vec<String> {
    let mut divisions: Vec<String> = Vec::new();
    for record in records {
        if !record.division.is_empty() && !divisions.contains(&record.division) {
            divisions.push(record.division.clone());
        }
    }
    divisions
}

/// Build the division list with the active marker on `selected`
pub fn division_entries(divisions: &[String], selected: Option<&str>) -> Vec<DivisionEntry> {
    divisions
        .iter()
        .map(|name| DivisionEntry {
            name: name.clone(),
            active: selected == Some(name.as_str()),
        })
        .collect()
}
