//! Cell values as they arrive from uploaded files

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single cell of a row: text, number or nothing.
///
/// Rows are schema-on-read, so every accessor that needs a particular
/// shape goes through one of the `as_*` conversions below rather than
/// matching on the variant directly.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Text(String),
    Number(f64),
    #[default]
    Null,
}

impl CellValue {
    /// Type a raw text cell the way CSV and spreadsheet readers do:
    /// empty → null, numeric → number, anything else stays text.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::Text(raw.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, CellValue::Number(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, CellValue::Text(_))
    }

    /// Numeric reading of the cell. Numeric text is accepted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
                }
            }
            CellValue::Null => None,
        }
    }

    /// Text as written in the source, `None` for non-text cells.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Display string, `None` for null.
    pub fn display(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Lenient numeric reading used when ordering chart axes: null and
    /// blank text read as zero.
    pub fn as_axis_number(&self) -> Option<f64> {
        match self {
            CellValue::Null => Some(0.0),
            CellValue::Text(s) if s.trim().is_empty() => Some(0.0),
            other => other.as_f64(),
        }
    }
}

/// Format a number the way it is shown in cells and captions: whole
/// numbers without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => f.write_str(&format_number(*n)),
            CellValue::Null => Ok(()),
        }
    }
}

impl From<serde_json::Value> for CellValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Null,
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(CellValue::Number)
                .unwrap_or_else(|| CellValue::Text(n.to_string())),
            serde_json::Value::String(s) => CellValue::Text(s),
            serde_json::Value::Bool(b) => CellValue::Text(b.to_string()),
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Null => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_types_cells() {
        assert_eq!(CellValue::infer(""), CellValue::Null);
        assert_eq!(CellValue::infer("  "), CellValue::Null);
        assert_eq!(CellValue::infer("42"), CellValue::Number(42.0));
        assert_eq!(CellValue::infer("Phase 2"), CellValue::Text("Phase 2".into()));
    }

    #[test]
    fn test_display_whole_numbers() {
        assert_eq!(CellValue::Number(120.0).to_string(), "120");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Null.display(), None);
    }

    #[test]
    fn test_json_coercion() {
        let parsed: Vec<CellValue> = serde_json::from_str(r#"["a", 3, null, true, [1]]"#).unwrap();
        assert_eq!(parsed[0], CellValue::Text("a".into()));
        assert_eq!(parsed[1], CellValue::Number(3.0));
        assert_eq!(parsed[2], CellValue::Null);
        assert_eq!(parsed[3], CellValue::Text("true".into()));
        assert_eq!(parsed[4], CellValue::Text("[1]".into()));
    }

    #[test]
    fn test_axis_number_reads_blank_as_zero() {
        assert_eq!(CellValue::Null.as_axis_number(), Some(0.0));
        assert_eq!(CellValue::Text("".into()).as_axis_number(), Some(0.0));
        assert_eq!(CellValue::Text("7".into()).as_axis_number(), Some(7.0));
        assert_eq!(CellValue::Text("x".into()).as_axis_number(), None);
    }
}
