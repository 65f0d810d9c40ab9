use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::replace_atomically;
use super::table::ColumnTable;
use crate::error::{Result, ScrapeError};

type Row = Vec<Option<String>>;

/// Durable side of the flush cycle.
///
/// Holds every row flushed so far and rewrites the whole CSV file on each
/// flush, so the file on disk always reflects all completed neighborhoods.
#[derive(Debug)]
pub struct Persister {
    path: PathBuf,
    columns: Vec<String>,
    index_column: bool,
    rows: Vec<Row>,
    flushes: usize,
}

impl Persister {
    /// `index_column` prepends an unnamed running row number
    pub fn new(path: impl Into<PathBuf>, columns: &[&str], index_column: bool) -> Self {
        Self {
            path: path.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            index_column,
            rows: Vec::new(),
            flushes: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Load rows written by an earlier run. Returns the number of rows read;
    /// a missing file counts as zero.
    pub fn load_existing(&mut self) -> Result<usize> {
        if !self.path.exists() {
            return Ok(0);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)?;

        let skip = usize::from(self.index_column);
        let headers: Vec<String> = reader.headers()?.iter().skip(skip).map(str::to_string).collect();
        if headers != self.columns {
            return Err(ScrapeError::Checkpoint {
                path: self.path.clone(),
                expected: self.columns.join(","),
            });
        }

        let mut loaded = 0;
        for record in reader.records() {
            let record = record?;
            let row = record
                .iter()
                .skip(skip)
                .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                .collect();
            self.rows.push(row);
            loaded += 1;
        }

        info!("Loaded {} existing rows from {}", loaded, self.path.display());
        Ok(loaded)
    }

    /// Move the accumulator's rows into the durable table, rewrite the output
    /// file and leave the accumulator empty. Returns the number of rows
    /// appended by this flush.
    pub fn flush(&mut self, table: &mut ColumnTable) -> Result<usize> {
        let rows = table.take_rows()?;
        let appended = rows.len();
        self.rows.extend(rows);
        self.write()?;
        self.flushes += 1;
        debug!(
            "Flush #{}: +{} rows, {} total",
            self.flushes,
            appended,
            self.rows.len()
        );
        Ok(appended)
    }

    /// Write the full durable table. The file is replaced atomically so an
    /// interrupted write leaves the previous version in place.
    pub fn write(&self) -> Result<()> {
        replace_atomically(&self.path, |tmp| -> Result<()> {
            let mut writer = csv::Writer::from_path(tmp)?;

            let mut header: Vec<&str> = Vec::with_capacity(self.columns.len() + 1);
            if self.index_column {
                header.push("");
            }
            header.extend(self.columns.iter().map(String::as_str));
            writer.write_record(&header)?;

            for (i, row) in self.rows.iter().enumerate() {
                let mut record: Vec<String> = Vec::with_capacity(row.len() + 1);
                if self.index_column {
                    record.push(i.to_string());
                }
                record.extend(row.iter().map(|cell| cell.clone().unwrap_or_default()));
                writer.write_record(&record)?;
            }
            writer.flush()?;
            Ok(())
        })
    }
}
