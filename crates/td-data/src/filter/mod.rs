//! Row filtering
//!
//! Filters are keyed by column and combined with AND. Each filter value
//! carries its own semantics (categorical set, substring, date range,
//! derived status), so the engine needs no column definitions.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use td_core::enrollment::EnrollmentProgress;
use td_core::{EnrollmentStatus, Row};

/// Inclusive date bounds. A missing bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// A bound is only enforced when both the bound and the row date are
    /// present; a row without a parseable date passes.
    pub fn admits(&self, date: Option<NaiveDate>) -> bool {
        let Some(date) = date else {
            return true;
        };
        if matches!(self.from, Some(from) if date < from) {
            return false;
        }
        if matches!(self.to, Some(to) if date > to) {
            return false;
        }
        true
    }
}

/// Filter value for one column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnFilter {
    /// Accepted categorical values; empty accepts everything
    Values(BTreeSet<String>),
    /// Case-insensitive substring
    Text(String),
    DateRange(DateRange),
    /// Accepted derived enrollment statuses; empty accepts everything
    Status(BTreeSet<EnrollmentStatus>),
    /// Minimum derived enrollment percentage; 0 accepts everything
    MinPercent(u32),
}

impl ColumnFilter {
    /// Whether this value restricts anything at all
    pub fn is_active(&self) -> bool {
        match self {
            ColumnFilter::Values(set) => !set.is_empty(),
            ColumnFilter::Text(text) => !text.is_empty(),
            ColumnFilter::DateRange(range) => !range.is_open(),
            ColumnFilter::Status(set) => !set.is_empty(),
            ColumnFilter::MinPercent(p) => *p > 0,
        }
    }

    pub fn matches(&self, row: &Row, key: &str, today: NaiveDate) -> bool {
        match self {
            ColumnFilter::Values(set) => {
                set.is_empty() || row.text(key).map(|v| set.contains(&v)).unwrap_or(false)
            }
            ColumnFilter::Text(needle) => {
                if needle.is_empty() {
                    return true;
                }
                match row.text(key) {
                    Some(value) => value.to_lowercase().contains(&needle.to_lowercase()),
                    None => false,
                }
            }
            ColumnFilter::DateRange(range) => range.admits(row.date(key)),
            ColumnFilter::Status(set) => {
                set.is_empty() || set.contains(&EnrollmentProgress::from_row(row, today).status)
            }
            ColumnFilter::MinPercent(min) => {
                *min == 0 || EnrollmentProgress::from_row(row, today).percent >= *min
            }
        }
    }
}

/// Filter values by column key
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterState {
    filters: BTreeMap<String, ColumnFilter>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column's filter. An inactive value removes the entry.
    pub fn set(&mut self, key: impl Into<String>, filter: ColumnFilter) {
        let key = key.into();
        if filter.is_active() {
            self.filters.insert(key, filter);
        } else {
            self.filters.remove(&key);
        }
    }

    pub fn with(mut self, key: impl Into<String>, filter: ColumnFilter) -> Self {
        self.set(key, filter);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ColumnFilter> {
        self.filters.get(key)
    }

    pub fn clear_column(&mut self, key: &str) {
        self.filters.remove(key);
    }

    pub fn clear_all(&mut self) {
        self.filters.clear();
    }

    /// No active constraint on any column
    pub fn is_empty(&self) -> bool {
        self.filters.values().all(|f| !f.is_active())
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.filters.get(key).map(ColumnFilter::is_active).unwrap_or(false)
    }

    pub fn active_columns(&self) -> impl Iterator<Item = &str> {
        self.filters
            .iter()
            .filter(|(_, f)| f.is_active())
            .map(|(k, _)| k.as_str())
    }

    /// Accepted values of a categorical filter (empty when unset)
    pub fn selected_values(&self, key: &str) -> BTreeSet<String> {
        match self.filters.get(key) {
            Some(ColumnFilter::Values(set)) => set.clone(),
            _ => BTreeSet::new(),
        }
    }

    /// Add or remove one value of a categorical checklist
    pub fn toggle_value(&mut self, key: &str, value: &str) {
        let mut set = self.selected_values(key);
        if !set.remove(value) {
            set.insert(value.to_string());
        }
        self.set(key, ColumnFilter::Values(set));
    }

    pub fn selected_statuses(&self, key: &str) -> BTreeSet<EnrollmentStatus> {
        match self.filters.get(key) {
            Some(ColumnFilter::Status(set)) => set.clone(),
            _ => BTreeSet::new(),
        }
    }

    /// Add or remove one status of the enrollment checklist
    pub fn toggle_status(&mut self, key: &str, status: EnrollmentStatus) {
        let mut set = self.selected_statuses(key);
        if !set.remove(&status) {
            set.insert(status);
        }
        self.set(key, ColumnFilter::Status(set));
    }

    pub fn text(&self, key: &str) -> String {
        match self.filters.get(key) {
            Some(ColumnFilter::Text(text)) => text.clone(),
            _ => String::new(),
        }
    }

    pub fn date_range(&self, key: &str) -> DateRange {
        match self.filters.get(key) {
            Some(ColumnFilter::DateRange(range)) => *range,
            _ => DateRange::default(),
        }
    }

    pub fn min_percent(&self, key: &str) -> u32 {
        match self.filters.get(key) {
            Some(ColumnFilter::MinPercent(p)) => *p,
            _ => 0,
        }
    }

    /// Whether `row` passes every active filter
    pub fn matches(&self, row: &Row, today: NaiveDate) -> bool {
        self.filters
            .iter()
            .all(|(key, filter)| filter.matches(row, key, today))
    }
}

/// Indices of the rows passing `state`, in their original order.
pub fn filter_indices(rows: &[Row], state: &FilterState, today: NaiveDate) -> Vec<usize> {
    if state.is_empty() {
        return (0..rows.len()).collect();
    }
    rows.iter()
        .enumerate()
        .filter(|(_, row)| state.matches(row, today))
        .map(|(idx, _)| idx)
        .collect()
}
