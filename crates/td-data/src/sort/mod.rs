//! Stable multi-key row sorting

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use td_core::enrollment::enrollment_ratio;
use td_core::{compare_optional_dates, fields, CellValue, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

/// How a column's cells compare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortKind {
    /// Null < number < text
    #[default]
    Default,
    /// Parsed calendar dates, unparseable first
    Date,
    /// `currentEnrollment / enrollmentTarget`, whatever the column key
    EnrollmentRatio,
}

/// Resolves the comparator kind for a column key
pub trait SortKindLookup {
    fn sort_kind(&self, column: &str) -> SortKind;
}

impl<F> SortKindLookup for F
where
    F: Fn(&str) -> SortKind,
{
    fn sort_kind(&self, column: &str) -> SortKind {
        self(column)
    }
}

/// Every column compares with the default comparator
pub struct DefaultSortKinds;

impl SortKindLookup for DefaultSortKinds {
    fn sort_kind(&self, _column: &str) -> SortKind {
        SortKind::Default
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Ordered sort keys; later keys break ties of earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SortState {
    keys: Vec<SortKey>,
}

impl SortState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by(key: SortKey) -> Self {
        Self { keys: vec![key] }
    }

    pub fn then_by(mut self, key: SortKey) -> Self {
        self.keys.retain(|k| k.column != key.column);
        self.keys.push(key);
        self
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn direction_of(&self, column: &str) -> Option<SortDirection> {
        self.keys
            .iter()
            .find(|k| k.column == column)
            .map(|k| k.direction)
    }

    /// Header click: ascending → descending → unsorted for the same
    /// column; a different column starts over ascending.
    pub fn toggle(&mut self, column: &str) {
        let next = match self.keys.first() {
            Some(key) if key.column == column => match key.direction {
                SortDirection::Ascending => Some(SortKey::descending(column)),
                SortDirection::Descending => None,
            },
            _ => Some(SortKey::ascending(column)),
        };
        self.keys = next.into_iter().collect();
    }
}

/// Default cell ordering: null < number < text. Text compares
/// case-insensitively with an exact tie-break.
pub fn compare_cells(a: &CellValue, b: &CellValue) -> Ordering {
    fn rank(v: &CellValue) -> u8 {
        match v {
            CellValue::Null => 0,
            CellValue::Number(_) => 1,
            CellValue::Text(_) => 2,
        }
    }

    match (a, b) {
        (CellValue::Number(x), CellValue::Number(y)) => x.total_cmp(y),
        (CellValue::Text(x), CellValue::Text(y)) => x
            .to_lowercase()
            .cmp(&y.to_lowercase())
            .then_with(|| x.cmp(y)),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Precomputed comparison key for one cell
enum SortValue<'a> {
    Cell(&'a CellValue),
    Date(Option<NaiveDate>),
    Ratio(f64),
}

impl SortValue<'_> {
    fn extract<'a>(row: &'a Row, column: &str, kind: SortKind) -> SortValue<'a> {
        match kind {
            SortKind::Default => SortValue::Cell(row.value(column)),
            SortKind::Date => SortValue::Date(row.date(column)),
            SortKind::EnrollmentRatio => SortValue::Ratio(enrollment_ratio(
                row.number(fields::CURRENT_ENROLLMENT),
                row.number(fields::ENROLLMENT_TARGET),
            )),
        }
    }

    fn compare(&self, other: &SortValue<'_>) -> Ordering {
        match (self, other) {
            (SortValue::Cell(a), SortValue::Cell(b)) => compare_cells(a, b),
            (SortValue::Date(a), SortValue::Date(b)) => compare_optional_dates(*a, *b),
            (SortValue::Ratio(a), SortValue::Ratio(b)) => a.total_cmp(b),
            // Keys at the same position always share a kind.
            _ => Ordering::Equal,
        }
    }
}

/// Reorder `indices` (into `rows`) by `state`. The sort is stable, and
/// an empty state returns the input unchanged.
pub fn sort_indices(
    rows: &[Row],
    indices: Vec<usize>,
    state: &SortState,
    kinds: &dyn SortKindLookup,
) -> Vec<usize> {
    if state.is_empty() {
        return indices;
    }

    let resolved: Vec<(&SortKey, SortKind)> = state
        .keys()
        .iter()
        .map(|key| (key, kinds.sort_kind(&key.column)))
        .collect();

    let mut decorated: Vec<(usize, Vec<SortValue<'_>>)> = indices
        .into_iter()
        .filter(|&idx| idx < rows.len())
        .map(|idx| {
            let row = &rows[idx];
            let values = resolved
                .iter()
                .map(|(key, kind)| SortValue::extract(row, &key.column, *kind))
                .collect();
            (idx, values)
        })
        .collect();

    decorated.sort_by(|(_, a), (_, b)| {
        for (pos, (key, _)) in resolved.iter().enumerate() {
            let ord = a[pos].compare(&b[pos]);
            let ord = match key.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });

    decorated.into_iter().map(|(idx, _)| idx).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(column: &str) -> SortKind {
        match column {
            fields::START_DATE => SortKind::Date,
            fields::ENROLLMENT => SortKind::EnrollmentRatio,
            _ => SortKind::Default,
        }
    }

    fn all(rows: &[Row]) -> Vec<usize> {
        (0..rows.len()).collect()
    }

    #[test]
    fn test_toggle_cycle() {
        let mut state = SortState::new();
        state.toggle("title");
        assert_eq!(state.direction_of("title"), Some(SortDirection::Ascending));
        state.toggle("title");
        assert_eq!(state.direction_of("title"), Some(SortDirection::Descending));
        state.toggle("title");
        assert!(state.is_empty());

        state.toggle("title");
        state.toggle("phase");
        assert_eq!(state.keys(), &[SortKey::ascending("phase")]);
    }

    #[test]
    fn test_default_comparator_orders_null_number_text() {
        let rows = vec![
            Row::new().with("v", "beta"),
            Row::new().with("v", 10.0),
            Row::new(),
            Row::new().with("v", "Alpha"),
            Row::new().with("v", 2.0),
        ];
        let state = SortState::by(SortKey::ascending("v"));
        assert_eq!(sort_indices(&rows, all(&rows), &state, &kinds), vec![2, 4, 1, 3, 0]);
    }

    #[test]
    fn test_descending_is_stable() {
        let rows = vec![
            Row::new().with("k", 1.0).with("id", "a"),
            Row::new().with("k", 2.0).with("id", "b"),
            Row::new().with("k", 1.0).with("id", "c"),
            Row::new().with("k", 2.0).with("id", "d"),
        ];
        let state = SortState::by(SortKey::descending("k"));
        assert_eq!(sort_indices(&rows, all(&rows), &state, &kinds), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_date_kind_puts_unparseable_first() {
        let rows = vec![
            Row::new().with(fields::START_DATE, "03/01/2024"),
            Row::new().with(fields::START_DATE, "n/a"),
            Row::new().with(fields::START_DATE, "2023-12-31"),
            Row::new().with(fields::START_DATE, "1/5/2024"),
        ];
        let state = SortState::by(SortKey::ascending(fields::START_DATE));
        assert_eq!(sort_indices(&rows, all(&rows), &state, &kinds), vec![1, 2, 3, 0]);
    }

    #[test]
    fn test_invalid_calendar_date_sorts_first() {
        let values = ["13/40/2024", "01/01/2023", "02/01/2023"];
        let state = SortState::by(SortKey::ascending(fields::START_DATE));

        let rows: Vec<Row> = values
            .iter()
            .map(|v| Row::new().with(fields::START_DATE, *v))
            .collect();
        assert_eq!(sort_indices(&rows, all(&rows), &state, &kinds), vec![0, 1, 2]);

        let reversed: Vec<Row> = rows.iter().rev().cloned().collect();
        assert_eq!(sort_indices(&reversed, all(&reversed), &state, &kinds), vec![2, 1, 0]);
    }

    #[test]
    fn test_enrollment_ratio_kind() {
        let rows = vec![
            Row::new()
                .with(fields::CURRENT_ENROLLMENT, 50.0)
                .with(fields::ENROLLMENT_TARGET, 100.0),
            Row::new().with(fields::CURRENT_ENROLLMENT, 10.0),
            Row::new()
                .with(fields::CURRENT_ENROLLMENT, 90.0)
                .with(fields::ENROLLMENT_TARGET, 100.0),
        ];
        let state = SortState::by(SortKey::descending(fields::ENROLLMENT));
        assert_eq!(sort_indices(&rows, all(&rows), &state, &kinds), vec![2, 0, 1]);
    }

    #[test]
    fn test_later_keys_break_ties() {
        let rows = vec![
            Row::new().with("phase", "Phase 2").with("title", "b"),
            Row::new().with("phase", "Phase 1").with("title", "z"),
            Row::new().with("phase", "Phase 2").with("title", "a"),
        ];
        let state = SortState::by(SortKey::ascending("phase")).then_by(SortKey::ascending("title"));
        assert_eq!(sort_indices(&rows, all(&rows), &state, &DefaultSortKinds), vec![1, 2, 0]);
    }

    #[test]
    fn test_empty_state_keeps_subset_order() {
        let rows = vec![Row::new(), Row::new(), Row::new()];
        assert_eq!(
            sort_indices(&rows, vec![2, 0], &SortState::new(), &DefaultSortKinds),
            vec![2, 0]
        );
    }
}
