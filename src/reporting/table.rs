use crate::error::{Error, Result};

/// Marker for a cell without a value.
pub const EMPTY_CELL: &str = "-";

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub name: String,
    pub values: Vec<String>,
}

/// A small report table: named rows, ordered columns, preformatted cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Table { columns: columns.into_iter().map(Into::into).collect(), rows: Vec::new() }
    }

    /// Appends a row; it needs exactly one value per column.
    pub fn push_row(&mut self, name: impl Into<String>, values: Vec<String>) -> Result<()> {
        let name = name.into();
        if values.len() != self.columns.len() {
            return Err(Error::ModelConstructionError(format!("row '{}' has {} values for {} columns", name, values.len(), self.columns.len())));
        }
        self.rows.push(Row { name, values });
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn cell(&self, row: &str, column: &str) -> Option<&str> {
        let column = self.columns.iter().position(|c| c == column)?;
        self.rows.iter().find(|r| r.name == row).map(|r| r.values[column].as_str())
    }

    /// Removes columns in which every cell is empty or `EMPTY_CELL`.
    pub fn drop_empty_columns(&mut self) {
        let keep: Vec<bool> = (0..self.columns.len())
            .map(|i| self.rows.iter().any(|row| !row.values[i].is_empty() && row.values[i] != EMPTY_CELL))
            .collect();

        let mut flags = keep.iter();
        self.columns.retain(|_| *flags.next().unwrap_or(&true));

        for row in &mut self.rows {
            let mut flags = keep.iter();
            row.values.retain(|_| *flags.next().unwrap_or(&true));
        }
    }
}
