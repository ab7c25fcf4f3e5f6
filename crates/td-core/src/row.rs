//! Row model: one flat clinical-trial record per row

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dates::parse_cell_date;
use crate::value::CellValue;

/// Field names of the known clinical-trial columns
pub mod fields {
    pub const STUDY_ID: &str = "studyId";
    pub const TITLE: &str = "title";
    pub const PHASE: &str = "phase";
    pub const STATUS: &str = "status";
    pub const CURRENT_ENROLLMENT: &str = "currentEnrollment";
    pub const ENROLLMENT_TARGET: &str = "enrollmentTarget";
    pub const START_DATE: &str = "startDate";
    pub const PLANNED_END_DATE: &str = "plannedEndDate";
    /// Virtual column computed from enrollment counts and the end date.
    pub const ENROLLMENT: &str = "enrollment";
}

static NULL: CellValue = CellValue::Null;

/// A flat mapping of field name to cell value.
///
/// Field order is the order of the source header (or JSON object), which
/// is what the generic table uses to derive its columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: IndexMap<String, CellValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: CellValue) {
        self.fields.insert(key.into(), value);
    }

    /// Raw cell, `None` when the field is absent
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields.get(key)
    }

    /// Cell or null when absent
    pub fn value(&self, key: &str) -> &CellValue {
        self.fields.get(key).unwrap_or(&NULL)
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.value(key).display()
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.value(key).as_f64()
    }

    pub fn date(&self, key: &str) -> Option<NaiveDate> {
        parse_cell_date(self.value(key))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for Row {
    fn from_iter<T: IntoIterator<Item = (K, CellValue)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

/// An immutable, shared set of rows.
///
/// Every set built with [`RowSet::new`] gets a fresh revision number, so
/// caches can key on the revision instead of hashing the rows.
#[derive(Debug, Clone)]
pub struct RowSet {
    rows: Arc<Vec<Row>>,
    revision: u64,
}

impl RowSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: Arc::new(rows),
            revision: NEXT_REVISION.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl Default for RowSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<Row>> for RowSet {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_accessors() {
        let row = Row::new()
            .with(fields::STUDY_ID, "NCT-001")
            .with(fields::CURRENT_ENROLLMENT, 40.0)
            .with(fields::ENROLLMENT_TARGET, "80")
            .with(fields::START_DATE, "1/5/2023");

        assert_eq!(row.text(fields::STUDY_ID).as_deref(), Some("NCT-001"));
        assert_eq!(row.number(fields::CURRENT_ENROLLMENT), Some(40.0));
        assert_eq!(row.number(fields::ENROLLMENT_TARGET), Some(80.0));
        assert_eq!(row.date(fields::START_DATE), NaiveDate::from_ymd_opt(2023, 1, 5));
        assert!(row.value("missing").is_null());
    }

    #[test]
    fn test_row_keeps_key_order() {
        let row: Row = serde_json::from_str(r#"{"b": 1, "a": "x", "c": null}"#).unwrap();
        let keys: Vec<&str> = row.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_row_sets_get_distinct_revisions() {
        let a = RowSet::new(vec![Row::new()]);
        let b = RowSet::new(vec![Row::new()]);
        assert_ne!(a.revision(), b.revision());
        assert_eq!(a.clone().revision(), a.revision());
    }
}
