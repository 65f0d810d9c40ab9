use crate::error::{Result, ScrapeError};
use crate::models::TableRow;

#[derive(Debug, Clone)]
struct Column {
    name: &'static str,
    values: Vec<Option<String>>,
}

/// Columnar accumulator for the neighborhood being scraped.
///
/// Extractors append into it; the persister drains it after every
/// neighborhood. Columns must all have the same length when drained.
#[derive(Debug, Clone)]
pub struct ColumnTable {
    columns: Vec<Column>,
}

impl ColumnTable {
    pub fn new(names: &[&'static str]) -> Self {
        Self {
            columns: names
                .iter()
                .map(|name| Column {
                    name,
                    values: Vec::new(),
                })
                .collect(),
        }
    }

    /// Table with the columns of record type `R`
    pub fn for_rows<R: TableRow>() -> Self {
        Self::new(R::COLUMNS)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<String>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Append a single value to the named column. Returns `false` for an
    /// unknown column.
    pub fn push(&mut self, name: &str, value: Option<String>) -> bool {
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(column) => {
                column.values.push(value);
                true
            }
            None => false,
        }
    }

    /// Append a whole record, one cell per column
    pub fn append<R: TableRow>(&mut self, row: &R) {
        for (column, cell) in self.columns.iter_mut().zip(row.cells()) {
            column.values.push(cell);
        }
    }

    /// Number of rows, or `RaggedTable` if the columns disagree
    pub fn row_count(&self) -> Result<usize> {
        let Some(first) = self.columns.first() else {
            return Ok(0);
        };
        let expected = first.values.len();
        for column in &self.columns[1..] {
            if column.values.len() != expected {
                return Err(ScrapeError::RaggedTable {
                    column: column.name.to_string(),
                    expected,
                    found: column.values.len(),
                });
            }
        }
        Ok(expected)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(|c| c.values.is_empty())
    }

    /// Drain the table into rows. The table is left empty on success and
    /// untouched when it is ragged.
    pub fn take_rows(&mut self) -> Result<Vec<Vec<Option<String>>>> {
        let count = self.row_count()?;
        let mut rows: Vec<Vec<Option<String>>> = (0..count)
            .map(|_| Vec::with_capacity(self.columns.len()))
            .collect();
        for column in &mut self.columns {
            for (row, value) in rows.iter_mut().zip(column.values.drain(..)) {
                row.push(value);
            }
        }
        Ok(rows)
    }

    pub fn clear(&mut self) {
        for column in &mut self.columns {
            column.values.clear();
        }
    }
}
