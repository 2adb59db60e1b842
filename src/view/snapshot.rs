//! Result materialization.
//!
//! A [`Snapshot`] is built once per executed query and then only read. It
//! keeps the formatted text of every cell next to its typed value, so a
//! re-render never needs the database again.

use tracing::debug;

use super::format::{display_width, format_int, format_int_plain, format_real};
use super::kind::{ColumnKind, classify};
use super::state::{ExclusionSet, VisualizationState};
use super::stats::RunningStats;
use crate::source::{QueryError, RowCursor, SqlValue};

/// Typed cell value after coercion to its column kind.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
}

impl CellValue {
    /// Magnitude used for extrema and bar length; `None` for non-numeric values.
    pub fn magnitude(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(v.saturating_abs() as f64),
            Self::Real(v) => Some(v.abs()),
            Self::Bool(_) | Self::Text(_) => None,
        }
    }
}

/// One cell: display text plus typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub display: String,
    pub value: CellValue,
}

/// Immutable description of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: ColumnKind,
    pub excluded: bool,
}

impl ColumnDescriptor {
    /// Numeric and not excluded: gets a bar and statistics.
    pub fn is_visualized(&self) -> bool {
        !self.excluded && self.kind.is_numeric()
    }
}

/// Smallest and largest absolute value seen in a numeric column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extrema {
    Int { min: i64, max: i64 },
    Real { min: f64, max: f64 },
    Untracked,
}

impl Extrema {
    fn for_kind(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Integer => Self::Int {
                min: i64::MAX,
                max: i64::MIN,
            },
            ColumnKind::Real => Self::Real {
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
            },
            _ => Self::Untracked,
        }
    }

    fn observe(&mut self, value: &CellValue) {
        match (self, value) {
            (Self::Int { min, max }, CellValue::Int(v)) => {
                let abs = v.saturating_abs();
                *min = (*min).min(abs);
                *max = (*max).max(abs);
            }
            (Self::Real { min, max }, CellValue::Real(v)) => {
                let abs = v.abs();
                *min = min.min(abs);
                *max = max.max(abs);
            }
            _ => {}
        }
    }

    /// `(min, max)` as floats; `None` before any value or when untracked.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match *self {
            Self::Int { min, max } if min <= max => Some((min as f64, max as f64)),
            Self::Real { min, max } if min <= max => Some((min, max)),
            _ => None,
        }
    }
}

/// A fully materialized query result.
#[derive(Debug, Clone)]
pub struct Snapshot {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Vec<Cell>>,
    data_width: Vec<usize>,
    extrema: Vec<Extrema>,
    interval: Vec<Option<f64>>,
    stats: Vec<Option<RunningStats>>,
}

impl Snapshot {
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Widest of the header and every cell's text.
    pub fn data_width(&self, column: usize) -> usize {
        self.data_width[column]
    }

    pub fn extrema(&self, column: usize) -> Extrema {
        self.extrema[column]
    }

    /// Normalization unit for bar length: `(max − min) / rows`.
    pub fn interval(&self, column: usize) -> Option<f64> {
        self.interval[column]
    }

    pub fn stats(&self, column: usize) -> Option<&RunningStats> {
        self.stats[column].as_ref()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        self.columns.iter().position(|c| c.name == name)
    }
}

/// Drain `cursor` into a [`Snapshot`].
///
/// Shared state is only touched once every row has been read: on a cursor
/// error the exclusion set and the visualization state are left as they were.
pub fn materialize(
    cursor: &mut dyn RowCursor,
    exclusions: &mut ExclusionSet,
    state: &mut VisualizationState,
) -> Result<Snapshot, QueryError> {
    let columns: Vec<ColumnDescriptor> = cursor
        .columns()
        .iter()
        .map(|meta| {
            let name = meta.name.to_lowercase();
            let kind = classify(&meta.sql_type);
            let excluded = !kind.is_numeric() || exclusions.contains(&name);
            ColumnDescriptor {
                name,
                kind,
                excluded,
            }
        })
        .collect();

    let mut data_width: Vec<usize> = columns.iter().map(|c| display_width(&c.name)).collect();
    let mut extrema: Vec<Extrema> = columns.iter().map(|c| Extrema::for_kind(c.kind)).collect();
    let mut stats: Vec<Option<RunningStats>> = columns
        .iter()
        .map(|c| c.is_visualized().then(RunningStats::new))
        .collect();

    let mut rows = Vec::new();
    while let Some(raw) = cursor.next_row()? {
        let mut row = Vec::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            let value = coerce(raw.get(idx).unwrap_or(&SqlValue::Null), column.kind);
            let display = display_text(&value, column.excluded);

            data_width[idx] = data_width[idx].max(display_width(&display));
            extrema[idx].observe(&value);
            if let Some(acc) = stats[idx].as_mut() {
                match value {
                    CellValue::Int(v) => acc.add(v as f64),
                    CellValue::Real(v) => acc.add(v),
                    _ => {}
                }
            }
            row.push(Cell { display, value });
        }
        rows.push(row);
    }

    for column in &columns {
        if !column.kind.is_numeric() {
            exclusions.insert(&column.name);
        }
    }
    state.adopt_columns(columns.iter().map(|c| (c.name.as_str(), c.excluded)));

    let row_count = rows.len();
    let interval = columns
        .iter()
        .zip(&extrema)
        .map(|(column, ext)| {
            if !column.is_visualized() || row_count == 0 {
                return None;
            }
            ext.bounds().map(|(min, max)| (max - min) / row_count as f64)
        })
        .collect();

    debug!(
        columns = columns.len(),
        rows = row_count,
        "materialized result"
    );

    Ok(Snapshot {
        columns,
        rows,
        data_width,
        extrema,
        interval,
        stats,
    })
}

/// Coerce a driver value to the column's kind. Nulls become the kind's zero.
fn coerce(value: &SqlValue, kind: ColumnKind) -> CellValue {
    match kind {
        ColumnKind::Boolean => CellValue::Bool(match value {
            SqlValue::Integer(i) => *i != 0,
            SqlValue::Real(f) => *f != 0.0,
            SqlValue::Text(s) => {
                let s = s.trim();
                s.eq_ignore_ascii_case("true") || s == "1"
            }
            SqlValue::Blob(b) => b.iter().any(|byte| *byte != 0),
            SqlValue::Null => false,
        }),
        ColumnKind::Integer => CellValue::Int(match value {
            SqlValue::Integer(i) => *i,
            SqlValue::Real(f) => *f as i64,
            SqlValue::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                    .unwrap_or(0)
            }
            SqlValue::Blob(_) | SqlValue::Null => 0,
        }),
        ColumnKind::Real => CellValue::Real(match value {
            SqlValue::Integer(i) => *i as f64,
            SqlValue::Real(f) => *f,
            SqlValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            SqlValue::Blob(_) | SqlValue::Null => 0.0,
        }),
        ColumnKind::Text | ColumnKind::Other => CellValue::Text(match value {
            SqlValue::Null => String::new(),
            SqlValue::Integer(i) => i.to_string(),
            SqlValue::Real(f) => f.to_string(),
            SqlValue::Text(s) => s.clone(),
            SqlValue::Blob(b) => format!("x'{}'", hex::encode(b)),
        }),
    }
}

fn display_text(value: &CellValue, excluded: bool) -> String {
    match value {
        CellValue::Bool(b) => b.to_string(),
        CellValue::Int(v) if excluded => format_int_plain(*v),
        CellValue::Int(v) => format_int(*v),
        CellValue::Real(v) => format_real(*v),
        CellValue::Text(s) => s.clone(),
    }
}
