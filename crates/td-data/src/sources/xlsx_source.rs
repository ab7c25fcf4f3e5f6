use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use chrono::{Duration, NaiveDate};
use td_core::{CellValue, Row};

use crate::DataError;

/// Read the first worksheet; its first row is the header.
pub fn read_xlsx(bytes: &[u8]) -> Result<Vec<Row>, DataError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))?;
    let first_sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| DataError::SchemaDetection("Workbook contains no sheets".to_string()))?;

    let range = workbook.worksheet_range(&first_sheet)?;
    let mut sheet_rows = range.rows();
    let Some(header_row) = sheet_rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();

    let rows = sheet_rows
        .filter(|cells| cells.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .filter(|(_, header)| !header.is_empty())
                .map(|(idx, header)| {
                    let value = cells.get(idx).map(cell_value).unwrap_or_default();
                    (header.clone(), value)
                })
                .collect::<Row>()
        })
        .collect();
    Ok(rows)
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => CellValue::infer(s),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::Error(e) => CellValue::Text(format!("{:?}", e)),
        Data::DateTime(dt) => serial_to_date(dt.as_f64())
            .map(|d| CellValue::Text(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

/// Excel serial day number (1900 system) to a calendar date
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(serial.trunc() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_dates() {
        assert_eq!(serial_to_date(45292.0), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(serial_to_date(0.0), None);
    }

    #[test]
    fn test_cell_typing() {
        assert_eq!(cell_value(&Data::Empty), CellValue::Null);
        assert_eq!(cell_value(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(cell_value(&Data::String("12".into())), CellValue::Number(12.0));
        assert_eq!(
            cell_value(&Data::String("Recruiting".into())),
            CellValue::Text("Recruiting".into())
        );
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(matches!(read_xlsx(b"not a zip"), Err(DataError::Xlsx(_))));
    }
}
