//! Whitespace-separated control tables.
//!
//! The first non-comment line names the columns; each following line holds
//! one cell per column, with `-` for a null cell. A column's type is the
//! narrowest of `Integer`, `Real` and `Text` that accepts all of its
//! non-null cells.

use crate::error::{Result, SomkitError};
use std::fmt;
use std::fs;
use std::path::Path;

/// Type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every cell parses as an integer.
    Integer,
    /// Every cell parses as a real number.
    Real,
    /// Anything else.
    Text,
}

/// A typed cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Missing value (`-`).
    Null,
    /// Integer cell.
    Integer(i64),
    /// Real cell.
    Real(f64),
    /// Text cell.
    Text(String),
}

impl Cell {
    /// Text content, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value of an integer or real cell.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(i) => Some(*i as f64),
            Cell::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Whether the cell is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("-"),
            Cell::Integer(i) => write!(f, "{}", i),
            Cell::Real(r) => write!(f, "{}", r),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name from the header.
    pub name: String,
    /// Inferred type.
    pub kind: ColumnKind,
}

/// A parsed control table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Parses table text.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

        let (_, header) = lines
            .next()
            .ok_or_else(|| SomkitError::parse(1, "table has no header line"))?;
        let names: Vec<String> = header.split_whitespace().map(str::to_string).collect();

        let mut raw: Vec<Vec<&str>> = Vec::new();
        for (line_no, line) in lines {
            let cells: Vec<&str> = line.split_whitespace().collect();
            if cells.len() != names.len() {
                return Err(SomkitError::parse(
                    line_no,
                    format!("expected {} cells, found {}", names.len(), cells.len()),
                ));
            }
            raw.push(cells);
        }

        let columns: Vec<Column> = names
            .into_iter()
            .enumerate()
            .map(|(c, name)| Column {
                name,
                kind: infer_kind(raw.iter().map(|row| row[c])),
            })
            .collect();

        let rows = raw
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&columns)
                    .map(|(text, column)| typed_cell(text, column.kind))
                    .collect()
            })
            .collect();

        Ok(Self { columns, rows })
    }

    /// Loads a table file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SomkitError::FileNotFound(path.to_path_buf()));
        }
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Columns in header order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Rows in file order.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 0-based index of the named column.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| SomkitError::NotFound(format!("column '{}'", name)))
    }

    /// Cell at 0-based `row` of the named column.
    pub fn get(&self, row: usize, column: &str) -> Result<&Cell> {
        let c = self.column_index(column)?;
        self.rows
            .get(row)
            .map(|r| &r[c])
            .ok_or_else(|| SomkitError::NotFound(format!("row {}", row)))
    }

    /// Text of every row in the named column; null cells are an error.
    pub fn text_column(&self, column: &str) -> Result<Vec<String>> {
        let c = self.column_index(column)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| match &row[c] {
                Cell::Null => Err(SomkitError::InvalidArgument(format!(
                    "null '{}' in row {}",
                    column,
                    i + 1
                ))),
                cell => Ok(cell.to_string()),
            })
            .collect()
    }
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind = ColumnKind::Integer;
    for text in cells.filter(|t| *t != "-") {
        if kind == ColumnKind::Integer && text.parse::<i64>().is_err() {
            kind = ColumnKind::Real;
        }
        if kind == ColumnKind::Real && text.parse::<f64>().is_err() {
            return ColumnKind::Text;
        }
    }
    kind
}

fn typed_cell(text: &str, kind: ColumnKind) -> Cell {
    if text == "-" {
        return Cell::Null;
    }
    match kind {
        ColumnKind::Integer => text.parse().map(Cell::Integer).unwrap_or(Cell::Null),
        ColumnKind::Real => text.parse().map(Cell::Real).unwrap_or(Cell::Null),
        ColumnKind::Text => Cell::Text(text.to_string()),
    }
}
