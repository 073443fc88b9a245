use crate::utils::error::{EtlError, Result};
use std::fmt;

/// A single cell. Mirrors the SQLite storage classes, which is also enough for scraped text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Real(f)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Rectangular table whose shape is only known at runtime (scraped HTML, query results).
///
/// Column names are unique and every row holds exactly one cell per column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].contains(column) {
                return Err(EtlError::ProcessingError {
                    message: format!("duplicate column name '{}'", column),
                });
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(EtlError::ProcessingError {
                message: format!(
                    "row {} has {} cells but the table has {} columns",
                    self.rows.len() + 1,
                    row.len(),
                    self.columns.len()
                ),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(index))
    }

    /// Removes a column if present. Returns whether anything was dropped.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(index) = self.column_index(name) else {
            return false;
        };
        self.columns.remove(index);
        for row in &mut self.rows {
            row.remove(index);
        }
        true
    }

    /// Renames a column if present. Returns whether anything was renamed.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<bool> {
        let Some(index) = self.column_index(from) else {
            return Ok(false);
        };
        if from != to && self.column_index(to).is_some() {
            return Err(EtlError::ProcessingError {
                message: format!(
                    "cannot rename '{}' to '{}': column already exists",
                    from, to
                ),
            });
        }
        self.columns[index] = to.to_string();
        Ok(true)
    }
}

impl fmt::Display for Table {
    /// Plain-text grid with a leading row index, right-aligned.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();

        let index_width = self.rows.len().saturating_sub(1).to_string().len();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:index_width$}", "")?;
        for (name, width) in self.columns.iter().zip(&widths) {
            write!(f, "  {:>width$}", name)?;
        }

        for (i, row) in cells.iter().enumerate() {
            write!(f, "\n{:<index_width$}", i)?;
            for (cell, width) in row.iter().zip(&widths) {
                write!(f, "  {:>width$}", cell)?;
            }
        }
        Ok(())
    }
}
