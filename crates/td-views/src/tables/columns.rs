//! Column definitions for the trial table and the generic table

use td_core::{fields, Row};
use td_data::schema::generic_columns;
use td_data::sort::{SortKind, SortKindLookup};

/// What a column holds, which decides its cell renderer and filter control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Free text with a substring search
    Text,
    /// Small set of values with a checklist
    Categorical,
    /// Date with a from/to range
    Date,
    /// Derived enrollment progress
    Enrollment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub key: String,
    pub header: String,
    pub min_width: f32,
    pub width: f32,
    pub max_width: f32,
    pub kind: ColumnKind,
    pub sort_kind: SortKind,
}

impl ColumnDef {
    pub fn new(key: &str, header: &str, kind: ColumnKind) -> Self {
        let sort_kind = match kind {
            ColumnKind::Date => SortKind::Date,
            ColumnKind::Enrollment => SortKind::EnrollmentRatio,
            _ => SortKind::Default,
        };
        Self {
            key: key.to_string(),
            header: header.to_string(),
            min_width: 80.0,
            width: 150.0,
            max_width: 400.0,
            kind,
            sort_kind,
        }
    }

    /// Width bounds as `(min, default, max)`
    pub fn sized(mut self, min: f32, width: f32, max: f32) -> Self {
        self.min_width = min;
        self.width = width;
        self.max_width = max;
        self
    }

    pub fn clamp_width(&self, width: f32) -> f32 {
        width.clamp(self.min_width, self.max_width)
    }

    /// Width of this column's filter popover
    pub fn popover_width(&self) -> f32 {
        match self.kind {
            ColumnKind::Date => 220.0,
            _ => 180.0,
        }
    }
}

/// The trial table's fixed columns
pub fn clinical_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new(fields::STUDY_ID, "Study ID", ColumnKind::Text).sized(80.0, 120.0, 180.0),
        ColumnDef::new(fields::TITLE, "Title", ColumnKind::Text).sized(120.0, 240.0, 360.0),
        ColumnDef::new(fields::PHASE, "Phase", ColumnKind::Categorical).sized(80.0, 120.0, 180.0),
        ColumnDef::new(fields::STATUS, "Status", ColumnKind::Categorical)
            .sized(100.0, 140.0, 180.0),
        ColumnDef::new(fields::ENROLLMENT, "Enrollment", ColumnKind::Enrollment)
            .sized(160.0, 220.0, 300.0),
        ColumnDef::new(fields::START_DATE, "Start Date", ColumnKind::Date)
            .sized(100.0, 130.0, 180.0),
        ColumnDef::new(fields::PLANNED_END_DATE, "Planned End Date", ColumnKind::Date)
            .sized(100.0, 150.0, 200.0),
    ]
}

/// Text columns read off the first row's keys
pub fn columns_from_rows(rows: &[Row]) -> Vec<ColumnDef> {
    generic_columns(rows)
        .into_iter()
        .map(|(key, header)| ColumnDef::new(&key, &header, ColumnKind::Text))
        .collect()
}

/// Sort kind lookup over a column list; unknown keys sort by default.
pub struct ColumnSortKinds<'a>(pub &'a [ColumnDef]);

impl SortKindLookup for ColumnSortKinds<'_> {
    fn sort_kind(&self, column: &str) -> SortKind {
        self.0
            .iter()
            .find(|c| c.key == column)
            .map(|c| c.sort_kind)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clinical_column_layout() {
        let columns = clinical_columns();
        let keys: Vec<_> = columns.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["studyId", "title", "phase", "status", "enrollment", "startDate", "plannedEndDate"]
        );
        let enrollment = &columns[4];
        assert_eq!(enrollment.sort_kind, SortKind::EnrollmentRatio);
        assert_eq!(
            (enrollment.min_width, enrollment.width, enrollment.max_width),
            (160.0, 220.0, 300.0)
        );
        assert_eq!(columns[5].popover_width(), 220.0);
        assert_eq!(columns[2].popover_width(), 180.0);
    }

    #[test]
    fn test_generic_columns() {
        let rows = vec![Row::new().with("site", "A").with("visits", 3.0)];
        let columns = columns_from_rows(&rows);
        assert_eq!(columns[0].header, "Site");
        assert_eq!(columns[1].kind, ColumnKind::Text);
        assert_eq!(columns[1].clamp_width(1_000.0), 400.0);
        assert_eq!(columns[1].clamp_width(10.0), 80.0);
    }

    #[test]
    fn test_sort_kind_lookup() {
        let columns = clinical_columns();
        let kinds = ColumnSortKinds(&columns);
        assert_eq!(kinds.sort_kind("startDate"), SortKind::Date);
        assert_eq!(kinds.sort_kind("nope"), SortKind::Default);
    }
}
