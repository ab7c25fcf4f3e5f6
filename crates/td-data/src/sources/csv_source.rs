use csv::ReaderBuilder;
use td_core::{CellValue, Row};

use crate::DataError;

/// Parse CSV text with a header row. Cells are typed on read; short
/// records leave the trailing keys null.
pub fn read_csv(bytes: &[u8]) -> Result<Vec<Row>, DataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(String::is_empty) {
        return Err(DataError::SchemaDetection("CSV file has no header row".to_string()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let value = record.get(idx).map(CellValue::infer).unwrap_or_default();
                (header.clone(), value)
            })
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_are_typed() {
        let csv = "studyId,title,currentEnrollment,startDate\n\
                   NCT-1,Heart study,42,01/15/2023\n\
                   NCT-2,,7.5,\n";
        let rows = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value("currentEnrollment"), &CellValue::Number(42.0));
        assert_eq!(rows[0].value("startDate"), &CellValue::Text("01/15/2023".into()));
        assert!(rows[1].value("title").is_null());
        assert!(rows[1].value("startDate").is_null());
        assert_eq!(rows[1].number("currentEnrollment"), Some(7.5));
    }

    #[test]
    fn test_header_order_is_kept() {
        let rows = read_csv(b"b,a,c\n1,2,3\n").unwrap();
        assert_eq!(rows[0].keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_short_records_fill_null() {
        let rows = read_csv(b"a,b\n1\n").unwrap();
        assert!(rows[0].value("b").is_null());
    }
}
