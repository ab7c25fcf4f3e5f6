//! Chart data shaping
//!
//! Turns raw rows into the series each chart kind draws. All functions
//! are pure; grouping keys on a value's display text and keeps groups
//! in first-seen order.

mod chart;

use std::cmp::Ordering;

use indexmap::IndexMap;
use td_core::{CellValue, Row};

pub use chart::{ChartKind, ChartSpec};

/// Series name used when a chart counts rows instead of plotting a field
pub const FREQUENCY_KEY: &str = "frequency";

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
}

/// One x position with a value per series. `None` leaves a gap.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub x: CellValue,
    pub values: Vec<Option<f64>>,
}

impl SeriesPoint {
    pub fn label(&self) -> String {
        self.x.display().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    pub x_key: String,
    pub y_keys: Vec<String>,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Values of one series, in point order
    pub fn column(&self, series: usize) -> impl Iterator<Item = Option<f64>> + '_ {
        self.points.iter().map(move |p| p.values.get(series).copied().flatten())
    }
}

/// What a widget draws
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    /// Not enough configuration or data to draw the chart
    Placeholder(ChartKind),
    Pie(Vec<PieSlice>),
    Bar(Series),
    Line(Series),
    Area(Series),
    Scatter {
        x_key: String,
        y_key: String,
        points: Vec<[f64; 2]>,
    },
    Radar(Series),
    Text {
        header: String,
        body: String,
    },
}

fn group_label(value: &CellValue) -> String {
    value.display().unwrap_or_default()
}

fn nonempty(key: &str) -> Option<&str> {
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Pie slices per distinct group value. Without a value key each row
/// counts once; with one, only numeric values are summed. Largest
/// slice first, ties by name.
pub fn pie_slices(rows: &[Row], group_key: &str, value_key: Option<&str>) -> Vec<PieSlice> {
    if group_key.is_empty() {
        return Vec::new();
    }
    let value_key = value_key.and_then(nonempty);

    let mut groups: IndexMap<String, f64> = IndexMap::new();
    for row in rows {
        let group = row.value(group_key);
        if group.is_null() {
            continue;
        }
        let amount = match value_key {
            None => 1.0,
            Some(key) => match row.value(key) {
                CellValue::Number(n) => *n,
                _ => continue,
            },
        };
        *groups.entry(group_label(group)).or_insert(0.0) += amount;
    }

    let mut slices: Vec<PieSlice> = groups
        .into_iter()
        .map(|(name, value)| PieSlice { name, value })
        .collect();
    slices.sort_by(|a, b| {
        b.value
            .total_cmp(&a.value)
            .then_with(|| compare_labels(&a.name, &b.name))
    });
    slices
}

/// Row count per distinct non-null x value
pub fn frequency_series(rows: &[Row], x_key: &str) -> Series {
    let mut counts: IndexMap<String, (CellValue, f64)> = IndexMap::new();
    if !x_key.is_empty() {
        for row in rows {
            let x = row.value(x_key);
            if x.is_null() {
                continue;
            }
            counts.entry(group_label(x)).or_insert_with(|| (x.clone(), 0.0)).1 += 1.0;
        }
    }

    Series {
        x_key: x_key.to_string(),
        y_keys: vec![FREQUENCY_KEY.to_string()],
        points: counts
            .into_values()
            .map(|(x, count)| SeriesPoint {
                x,
                values: vec![Some(count)],
            })
            .collect(),
    }
}

/// Sum of the numeric `y_key` values per x. Rows whose y is null or
/// not numeric contribute nothing.
pub fn grouped_sum(rows: &[Row], x_key: &str, y_key: &str) -> Series {
    let mut sums: IndexMap<String, (CellValue, f64)> = IndexMap::new();
    if !y_key.is_empty() {
        for row in rows {
            let Some(y) = row.number(y_key) else {
                continue;
            };
            let x = row.value(x_key);
            sums.entry(group_label(x)).or_insert_with(|| (x.clone(), 0.0)).1 += y;
        }
    }

    Series {
        x_key: x_key.to_string(),
        y_keys: vec![y_key.to_string()],
        points: sums
            .into_values()
            .map(|(x, sum)| SeriesPoint {
                x,
                values: vec![Some(sum)],
            })
            .collect(),
    }
}

/// Per x, the sum of every y key; non-numeric values count as 0.
pub fn merge_stacked(rows: &[Row], x_key: &str, y_keys: &[String]) -> Series {
    let mut groups: IndexMap<String, (CellValue, Vec<f64>)> = IndexMap::new();
    for row in rows {
        let x = row.value(x_key);
        let entry = groups
            .entry(group_label(x))
            .or_insert_with(|| (x.clone(), vec![0.0; y_keys.len()]));
        for (slot, key) in entry.1.iter_mut().zip(y_keys) {
            *slot += row.number(key).unwrap_or(0.0);
        }
    }

    Series {
        x_key: x_key.to_string(),
        y_keys: y_keys.to_vec(),
        points: groups
            .into_values()
            .map(|(x, sums)| SeriesPoint {
                x,
                values: sums.into_iter().map(Some).collect(),
            })
            .collect(),
    }
}

/// One point per row, unaggregated
pub fn passthrough(rows: &[Row], x_key: &str, y_keys: &[String]) -> Series {
    Series {
        x_key: x_key.to_string(),
        y_keys: y_keys.to_vec(),
        points: rows
            .iter()
            .map(|row| SeriesPoint {
                x: row.value(x_key).clone(),
                values: y_keys.iter().map(|k| row.number(k)).collect(),
            })
            .collect(),
    }
}

fn compare_labels(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Order points by x: numerically when every x reads as a number (null
/// and blank read as 0), otherwise by case-insensitive text.
pub fn sort_by_x(points: &mut [SeriesPoint]) {
    let numeric: Option<Vec<f64>> = points.iter().map(|p| p.x.as_axis_number()).collect();
    match numeric {
        Some(_) => points.sort_by(|a, b| {
            let x = a.x.as_axis_number().unwrap_or(0.0);
            let y = b.x.as_axis_number().unwrap_or(0.0);
            x.total_cmp(&y)
        }),
        None => points.sort_by(|a, b| compare_labels(&a.label(), &b.label())),
    }
}

/// Numeric `(x, y)` pairs; rows where either value is not a number are
/// dropped.
pub fn scatter_points(rows: &[Row], x_key: &str, y_key: &str) -> Vec<[f64; 2]> {
    rows.iter()
        .filter_map(|row| Some([row.number(x_key)?, row.number(y_key)?]))
        .collect()
}

/// Whether `spec` has enough bindings and `rows` enough data to draw
pub fn has_valid_config(spec: &ChartSpec, rows: &[Row]) -> bool {
    if rows.is_empty() {
        return false;
    }
    match spec {
        ChartSpec::Pie { group_key, .. } => !group_key.is_empty(),
        ChartSpec::Bar { x_key, .. }
        | ChartSpec::Line { x_key, .. }
        | ChartSpec::Area { x_key, .. }
        | ChartSpec::Radar { x_key, .. } => !x_key.is_empty(),
        ChartSpec::Scatter { x_key, y_key } => !x_key.is_empty() && !y_key.is_empty(),
        ChartSpec::Text { body, .. } => !body.is_empty(),
    }
}

fn line_like(rows: &[Row], x_key: &str, y_key: &str, merge: bool) -> Series {
    let mut series = if y_key.is_empty() {
        frequency_series(rows, x_key)
    } else if merge {
        grouped_sum(rows, x_key, y_key)
    } else {
        passthrough(rows, x_key, &[y_key.to_string()])
    };
    sort_by_x(&mut series.points);
    series
}

/// Shape `rows` for the widget described by `spec`
pub fn shape_widget(spec: &ChartSpec, rows: &[Row]) -> ChartData {
    if !has_valid_config(spec, rows) {
        return ChartData::Placeholder(spec.kind());
    }

    match spec {
        ChartSpec::Pie { group_key, value_key } => {
            ChartData::Pie(pie_slices(rows, group_key, Some(value_key.as_str())))
        }
        ChartSpec::Bar {
            x_key,
            y_keys,
            merge_duplicates,
        } => {
            let y_keys: Vec<String> = y_keys.iter().filter(|k| !k.is_empty()).cloned().collect();
            let mut series = if y_keys.is_empty() {
                frequency_series(rows, x_key)
            } else if *merge_duplicates {
                merge_stacked(rows, x_key, &y_keys)
            } else {
                passthrough(rows, x_key, &y_keys)
            };
            sort_by_x(&mut series.points);
            ChartData::Bar(series)
        }
        ChartSpec::Line {
            x_key,
            y_key,
            merge_duplicates,
        } => ChartData::Line(line_like(rows, x_key, y_key, *merge_duplicates)),
        ChartSpec::Area {
            x_key,
            y_key,
            merge_duplicates,
        } => ChartData::Area(line_like(rows, x_key, y_key, *merge_duplicates)),
        ChartSpec::Scatter { x_key, y_key } => ChartData::Scatter {
            x_key: x_key.clone(),
            y_key: y_key.clone(),
            points: scatter_points(rows, x_key, y_key),
        },
        ChartSpec::Radar { x_key, y_key } => ChartData::Radar(grouped_sum(rows, x_key, y_key)),
        ChartSpec::Text { header, body } => ChartData::Text {
            header: header.clone(),
            body: body.clone(),
        },
    }
}
