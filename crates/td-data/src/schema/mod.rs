//! Schema inspection for schema-on-read rows
//!
//! Rows carry no declared schema. Columns of the generic table and the
//! field choices of the widget editor are read off the first row; option
//! lists of categorical filters are collected from every row.

use indexmap::IndexSet;
use td_core::{CellValue, Row};

/// Header label for a raw key: first letter upper-cased, rest untouched.
pub fn header_label(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `(key, header)` pairs in the first row's key order
pub fn generic_columns(rows: &[Row]) -> Vec<(String, String)> {
    rows.first()
        .map(|row| {
            row.keys()
                .map(|key| (key.to_string(), header_label(key)))
                .collect()
        })
        .unwrap_or_default()
}

/// Keys of the first row grouped by the kind of value they hold
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyClasses {
    /// Keys holding text or a number
    pub data_keys: Vec<String>,
    /// Keys holding text
    pub string_keys: Vec<String>,
    /// Keys holding a number
    pub numeric_keys: Vec<String>,
}

impl KeyClasses {
    pub fn detect(rows: &[Row]) -> Self {
        let mut classes = Self::default();
        let Some(first) = rows.first() else {
            return classes;
        };

        for (key, value) in first.iter() {
            match value {
                CellValue::Text(_) => {
                    classes.data_keys.push(key.to_string());
                    classes.string_keys.push(key.to_string());
                }
                CellValue::Number(_) => {
                    classes.data_keys.push(key.to_string());
                    classes.numeric_keys.push(key.to_string());
                }
                CellValue::Null => {}
            }
        }
        classes
    }

    pub fn is_empty(&self) -> bool {
        self.data_keys.is_empty()
    }
}

/// Distinct non-empty display values of `key`, in first-seen order.
pub fn unique_values(rows: &[Row], key: &str) -> Vec<String> {
    let mut seen = IndexSet::new();
    for row in rows {
        if let Some(value) = row.text(key) {
            if !value.is_empty() {
                seen.insert(value);
            }
        }
    }
    seen.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_label() {
        assert_eq!(header_label("studyId"), "StudyId");
        assert_eq!(header_label("élan"), "Élan");
        assert_eq!(header_label(""), "");
    }

    #[test]
    fn test_generic_columns_follow_first_row() {
        let rows = vec![
            Row::new().with("site", "Boston").with("count", 4.0),
            Row::new().with("other", "ignored"),
        ];
        assert_eq!(
            generic_columns(&rows),
            vec![
                ("site".to_string(), "Site".to_string()),
                ("count".to_string(), "Count".to_string())
            ]
        );
        assert!(generic_columns(&[]).is_empty());
    }

    #[test]
    fn test_key_classes() {
        let rows = vec![Row::new()
            .with("studyId", "NCT-1")
            .with("currentEnrollment", 12.0)
            .with("notes", CellValue::Null)];
        let classes = KeyClasses::detect(&rows);
        assert_eq!(classes.data_keys, vec!["studyId", "currentEnrollment"]);
        assert_eq!(classes.string_keys, vec!["studyId"]);
        assert_eq!(classes.numeric_keys, vec!["currentEnrollment"]);
    }

    #[test]
    fn test_unique_values_first_seen_non_empty() {
        let rows = vec![
            Row::new().with("phase", "Phase 2"),
            Row::new().with("phase", ""),
            Row::new().with("phase", "Phase 1"),
            Row::new(),
            Row::new().with("phase", "Phase 2"),
        ];
        assert_eq!(unique_values(&rows, "phase"), vec!["Phase 2", "Phase 1"]);
    }
}
