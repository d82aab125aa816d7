//! Flat CSV tables exchanged between pipeline stages.
//!
//! Rows are kept as plain string cells in file order; stages add or replace
//! whole columns and never reorder rows. An empty cell is a null.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;

use crate::models::TrackRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Read a CSV file with a header row. A missing file is a configuration error.
    pub fn read_csv(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("{} not found", path.display());
        }
        info!("Loading dataset: {}", path.display());
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        // Short rows are padded later; cells past the header have no column to live in.
        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            if record.len() > headers.len() {
                let line = record.position().map_or(0, |p| p.line());
                bail!(
                    "Row at line {} has {} cells but the header has {} columns",
                    line,
                    record.len(),
                    headers.len()
                );
            }
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        self.to_writer(file)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(writer);
        csv_writer.write_record(&self.headers)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Resolve the title/artist columns by name, falling back to the first
    /// and second column respectively when a name is absent.
    pub fn resolve_columns(&self, title_column: &str, artist_column: &str) -> Result<(usize, usize)> {
        if self.headers.len() < 2 {
            bail!("Dataset must contain at least track and artist columns.");
        }
        let title = self.column_index(title_column).unwrap_or(0);
        let artist = self.column_index(artist_column).unwrap_or(1);
        info!(
            "Using columns -> track: '{}', artist: '{}'",
            self.headers[title], self.headers[artist]
        );
        Ok((title, artist))
    }

    /// One `TrackRecord` per row, in file order.
    pub fn track_records(&self, title_index: usize, artist_index: usize) -> Vec<TrackRecord> {
        self.rows
            .iter()
            .map(|row| TrackRecord {
                track_name: row.get(title_index).cloned(),
                artist_names: row.get(artist_index).cloned(),
                fields: row.clone(),
            })
            .collect()
    }

    /// Add `name` as the last column, or overwrite it in place if it exists.
    /// `None` cells are written empty. `values` must have one cell per row.
    pub fn set_column(&mut self, name: &str, values: Vec<Option<String>>) -> Result<()> {
        if values.len() != self.rows.len() {
            bail!(
                "Column '{}' has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            );
        }

        let index = match self.column_index(name) {
            Some(index) => index,
            None => {
                self.headers.push(name.to_string());
                self.headers.len() - 1
            }
        };

        let width = self.headers.len();
        for (row, value) in self.rows.iter_mut().zip(values) {
            if row.len() < width {
                row.resize(width, String::new());
            }
            row[index] = value.unwrap_or_default();
        }
        Ok(())
    }
}
