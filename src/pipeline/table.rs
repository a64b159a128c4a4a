//! In-memory table model and the cleaning transforms.
//!
//! Tables are row-major: each row holds exactly one [`Cell`] per column.
//! Column types are fixed at parse time and the cleaning transforms never
//! change them (forward-fill only copies values already in the column).

use crate::config::CleanOp;
use crate::output::TablePreview;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// One table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Missing,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Numeric value, for Int and Float cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Hashable identity used for duplicate detection. Missing equals
    /// Missing; floats compare by bit pattern with `-0.0` folded into `0.0`.
    fn key(&self) -> CellKey<'_> {
        match self {
            Cell::Missing => CellKey::Missing,
            Cell::Int(i) => CellKey::Int(*i),
            Cell::Float(f) => CellKey::Float(if *f == 0.0 { 0 } else { f.to_bits() }),
            Cell::Bool(b) => CellKey::Bool(*b),
            Cell::Text(s) => CellKey::Text(s),
        }
    }
}

#[derive(PartialEq, Eq, Hash)]
enum CellKey<'a> {
    Missing,
    Int(i64),
    Float(u64),
    Bool(bool),
    Text(&'a str),
}

impl fmt::Display for Cell {
    /// Text form used by CSV output and previews. Whole floats keep a
    /// trailing `.0` and booleans print as `True`/`False`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Float(v) => {
                if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
                    write!(f, "{v:.1}")
                } else {
                    write!(f, "{v}")
                }
            }
            Cell::Bool(true) => f.write_str("True"),
            Cell::Bool(false) => f.write_str("False"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Column type, inferred when the table is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Int,
    Float,
    Bool,
    Text,
    /// Every cell is missing.
    Empty,
}

impl ColumnType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Int | ColumnType::Float)
    }

    /// Narrowest type that holds every cell of `cells`.
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> Self {
        let mut ty = ColumnType::Empty;
        for cell in cells {
            let cell_ty = match cell {
                Cell::Missing => continue,
                Cell::Int(_) => ColumnType::Int,
                Cell::Float(_) => ColumnType::Float,
                Cell::Bool(_) => ColumnType::Bool,
                Cell::Text(_) => ColumnType::Text,
            };
            ty = match (ty, cell_ty) {
                (ColumnType::Empty, t) => t,
                (a, b) if a == b => a,
                (ColumnType::Int, ColumnType::Float) | (ColumnType::Float, ColumnType::Int) => {
                    ColumnType::Float
                }
                _ => ColumnType::Text,
            };
        }
        ty
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub dtype: ColumnType,
}

/// A parsed table with unique column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table from a raw header and rows.
    ///
    /// Header names are made unique (empty names become `Unnamed: <i>`,
    /// repeats get `.1`, `.2`, … suffixes), short rows are padded with
    /// [`Cell::Missing`], and each column's type is inferred. In a Float
    /// column, Int cells are widened so the column stays homogeneous.
    pub fn from_raw(header: Vec<String>, mut rows: Vec<Vec<Cell>>) -> Self {
        let names = unique_names(header);
        let width = names.len();
        for row in &mut rows {
            row.resize(width, Cell::Missing);
        }

        let columns: Vec<Column> = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Column {
                name,
                dtype: ColumnType::infer(rows.iter().map(|r| &r[i])),
            })
            .collect();

        for (i, col) in columns.iter().enumerate() {
            if col.dtype == ColumnType::Float {
                for row in &mut rows {
                    if let Cell::Int(v) = row[i] {
                        row[i] = Cell::Float(v as f64);
                    }
                }
            }
        }

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Names of Int and Float columns, in column order.
    pub fn numeric_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|c| c.dtype.is_numeric())
            .map(|c| c.name.as_str())
    }

    /// Cells of column `idx`, top to bottom.
    pub fn column_cells(&self, idx: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().map(move |r| &r[idx])
    }

    /// Remove every row whose cells are all missing. Returns how many went.
    pub fn drop_empty_rows(&mut self) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| row.iter().any(|c| !c.is_missing()));
        before - self.rows.len()
    }

    /// Remove rows equal to an earlier row across all columns, keeping the
    /// first occurrence. Returns how many went.
    pub fn remove_duplicates(&mut self) -> usize {
        let before = self.rows.len();
        let mut seen: HashSet<Vec<CellKey<'_>>> = HashSet::with_capacity(before);
        let keep: Vec<bool> = self
            .rows
            .iter()
            .map(|row| seen.insert(row.iter().map(Cell::key).collect()))
            .collect();
        drop(seen);

        let mut flags = keep.into_iter();
        self.rows.retain(|_| flags.next().unwrap_or(true));
        before - self.rows.len()
    }

    /// Replace each missing cell with the nearest non-missing value above it
    /// in the same column. Leading missing cells stay missing. Returns how
    /// many cells were filled.
    pub fn fill_forward(&mut self) -> usize {
        let mut filled = 0;
        let mut last: Vec<Option<Cell>> = vec![None; self.columns.len()];
        for row in &mut self.rows {
            for (cell, prev) in row.iter_mut().zip(last.iter_mut()) {
                if cell.is_missing() {
                    if let Some(v) = prev {
                        *cell = v.clone();
                        filled += 1;
                    }
                } else {
                    *prev = Some(cell.clone());
                }
            }
        }
        filled
    }

    /// Apply one cleaning transform. Returns the number of rows or cells changed.
    pub fn clean(&mut self, op: CleanOp) -> usize {
        match op {
            CleanOp::None => 0,
            CleanOp::RemoveDuplicates => self.remove_duplicates(),
            CleanOp::FillMissingForward => self.fill_forward(),
        }
    }

    /// First `n` rows rendered as text.
    pub fn preview(&self, n: usize) -> TablePreview {
        TablePreview {
            columns: self.columns.iter().map(|c| c.name.clone()).collect(),
            rows: self
                .rows
                .iter()
                .take(n)
                .map(|r| r.iter().map(ToString::to_string).collect())
                .collect(),
            total_rows: self.rows.len(),
        }
    }
}

/// Make header names unique the way spreadsheet readers usually do.
fn unique_names(header: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(header.len());
    let mut out = Vec::with_capacity(header.len());
    for (i, raw) in header.into_iter().enumerate() {
        let base = if raw.trim().is_empty() {
            format!("Unnamed: {i}")
        } else {
            raw
        };
        let mut name = base.clone();
        let mut n = 1;
        while seen.contains(&name) {
            name = format!("{base}.{n}");
            n += 1;
        }
        seen.insert(name.clone());
        out.push(name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(vals: &[Option<i64>]) -> Vec<Cell> {
        vals.iter()
            .map(|v| v.map_or(Cell::Missing, Cell::Int))
            .collect()
    }

    fn sample() -> Table {
        Table::from_raw(
            vec!["a".into(), "b".into(), "c".into()],
            vec![
                ints(&[Some(1), None, Some(3)]),
                ints(&[None, None, None]),
                ints(&[Some(4), Some(5), Some(6)]),
            ],
        )
    }

    #[test]
    fn drop_empty_rows_removes_all_missing() {
        let mut t = sample();
        assert_eq!(t.drop_empty_rows(), 1);
        assert_eq!(t.row_count(), 2);
        assert!(t.rows().iter().all(|r| r.iter().any(|c| !c.is_missing())));
    }

    #[test]
    fn fill_forward_keeps_leading_missing() {
        let mut t = sample();
        t.drop_empty_rows();
        assert_eq!(t.fill_forward(), 0);
        assert_eq!(t.rows()[0], ints(&[Some(1), None, Some(3)]));
        assert_eq!(t.rows()[1], ints(&[Some(4), Some(5), Some(6)]));
    }

    #[test]
    fn fill_forward_copies_value_down() {
        let mut t = Table::from_raw(
            vec!["x".into()],
            vec![
                ints(&[None]),
                ints(&[Some(7)]),
                ints(&[None]),
                ints(&[None]),
                ints(&[Some(2)]),
            ],
        );
        assert_eq!(t.fill_forward(), 2);
        let col: Vec<_> = t.column_cells(0).cloned().collect();
        assert_eq!(col, ints(&[None, Some(7), Some(7), Some(7), Some(2)]));
    }

    #[test]
    fn remove_duplicates_keeps_first_and_is_idempotent() {
        let mut t = Table::from_raw(
            vec!["k".into(), "v".into()],
            vec![
                vec![Cell::Text("a".into()), Cell::Int(1)],
                vec![Cell::Text("b".into()), Cell::Missing],
                vec![Cell::Text("a".into()), Cell::Int(1)],
                vec![Cell::Text("b".into()), Cell::Missing],
                vec![Cell::Text("a".into()), Cell::Int(2)],
            ],
        );
        assert_eq!(t.remove_duplicates(), 2);
        let once = t.clone();
        assert_eq!(t.remove_duplicates(), 0);
        assert_eq!(t, once);
        assert_eq!(t.rows()[0][0], Cell::Text("a".into()));
        assert_eq!(t.rows()[1][0], Cell::Text("b".into()));
        assert_eq!(t.rows()[2][1], Cell::Int(2));
    }

    #[test]
    fn duplicate_floats_fold_signed_zero() {
        let mut t = Table::from_raw(
            vec!["f".into()],
            vec![vec![Cell::Float(0.0)], vec![Cell::Float(-0.0)]],
        );
        assert_eq!(t.remove_duplicates(), 1);
    }

    #[test]
    fn header_names_made_unique() {
        let t = Table::from_raw(
            vec!["a".into(), "".into(), "a".into(), "a".into()],
            vec![],
        );
        let names: Vec<_> = t.column_names().collect();
        assert_eq!(names, vec!["a", "Unnamed: 1", "a.1", "a.2"]);
    }

    #[test]
    fn short_rows_padded() {
        let t = Table::from_raw(
            vec!["a".into(), "b".into()],
            vec![vec![Cell::Int(1)]],
        );
        assert_eq!(t.rows()[0], vec![Cell::Int(1), Cell::Missing]);
    }

    #[test]
    fn mixed_int_float_widened() {
        let t = Table::from_raw(
            vec!["n".into()],
            vec![vec![Cell::Int(1)], vec![Cell::Float(2.5)]],
        );
        assert_eq!(t.columns()[0].dtype, ColumnType::Float);
        assert_eq!(t.rows()[0][0], Cell::Float(1.0));
    }

    #[test]
    fn infer_types() {
        assert_eq!(ColumnType::infer(&[Cell::Missing]), ColumnType::Empty);
        assert_eq!(
            ColumnType::infer(&[Cell::Int(1), Cell::Missing]),
            ColumnType::Int
        );
        assert_eq!(
            ColumnType::infer(&[Cell::Bool(true), Cell::Int(1)]),
            ColumnType::Text
        );
    }

    #[test]
    fn display_forms() {
        assert_eq!(Cell::Float(3.0).to_string(), "3.0");
        assert_eq!(Cell::Float(2.25).to_string(), "2.25");
        assert_eq!(Cell::Bool(false).to_string(), "False");
        assert_eq!(Cell::Missing.to_string(), "");
    }

    #[test]
    fn preview_takes_head() {
        let t = sample();
        let p = t.preview(2);
        assert_eq!(p.columns, vec!["a", "b", "c"]);
        assert_eq!(p.rows.len(), 2);
        assert_eq!(p.rows[0], vec!["1", "", "3"]);
        assert_eq!(p.total_rows, 3);
    }
}
