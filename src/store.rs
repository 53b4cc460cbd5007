//! The record store: load and persist one flat-file collection.
//!
//! Each operation runs load → mutate/aggregate → persist to completion
//! within a single invocation. There is no lock between the read and the
//! rewrite, so two overlapping invocations race and the later persist wins,
//! dropping the earlier mutation. That matches the single-process,
//! low-concurrency target; a concurrent embedding must wrap
//! read-modify-persist in a single-writer mutex.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::debug;
use serde_json::Value as JsonValue;

use crate::{
    io_utils,
    record::{Collection, Record},
    schema::Schema,
};

#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    schema: Schema,
    delimiter: u8,
    json_mirror: Option<PathBuf>,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>, schema: Schema) -> Self {
        let path = path.into();
        let delimiter = io_utils::resolve_delimiter(&path, None);
        RecordStore {
            path,
            schema,
            delimiter,
            json_mirror: None,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Configures a JSON mirror rewritten on every persist and consulted on
    /// load when the CSV is absent.
    pub fn with_json_mirror(mut self, mirror: Option<PathBuf>) -> Self {
        self.json_mirror = mirror;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Reads the backing file into a fully normalized collection. A missing
    /// file is not an error: the mirror is consulted if configured, and an
    /// empty collection is the final fallback.
    pub fn load(&self) -> Result<Collection> {
        if !self.path.exists() {
            if let Some(mirror) = self.json_mirror.as_deref()
                && mirror.exists()
            {
                return self.load_mirror(mirror);
            }
            debug!(
                "Backing file {:?} absent; starting from an empty collection",
                self.path
            );
            return Ok(Collection::default());
        }

        let mut reader = io_utils::open_csv_reader(&self.path, self.delimiter)?;
        let headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("Reading header row of {:?}", self.path))?
            .iter()
            .map(str::to_string)
            .collect();
        let header_map = self.schema.reconcile_headers(&headers);

        let mut records = Vec::new();
        let mut defaulted_cells = 0usize;
        for (row_idx, result) in reader.records().enumerate() {
            let row = result
                .with_context(|| format!("Reading row {} in {:?}", row_idx + 2, self.path))?;
            let raw: Vec<String> = row.iter().map(str::to_string).collect();
            let (record, defaulted) = self.schema.normalize_row(&header_map, &raw);
            defaulted_cells += defaulted;
            records.push(record);
        }
        if defaulted_cells > 0 {
            debug!(
                "Defaulted {defaulted_cells} cell(s) while loading {:?}",
                self.path
            );
        }
        Ok(Collection::new(records))
    }

    fn load_mirror(&self, mirror: &Path) -> Result<Collection> {
        let file =
            File::open(mirror).with_context(|| format!("Opening JSON mirror {mirror:?}"))?;
        let parsed: JsonValue =
            serde_json::from_reader(BufReader::new(file)).context("Parsing JSON mirror")?;
        let rows = parsed
            .as_array()
            .with_context(|| format!("JSON mirror {mirror:?} is not an array of objects"))?;

        let mut records: Vec<Record> = Vec::with_capacity(rows.len());
        let mut defaulted_cells = 0usize;
        for row in rows {
            let Some(object) = row.as_object() else {
                continue;
            };
            let (record, defaulted) = self.schema.normalize_json_object(object);
            defaulted_cells += defaulted;
            records.push(record);
        }
        debug!(
            "Loaded {} record(s) from JSON mirror {:?} ({defaulted_cells} defaulted cell(s))",
            records.len(),
            mirror
        );
        Ok(Collection::new(records))
    }

    /// Serializes the whole collection back to disk, overwriting the backing
    /// file entirely with the canonical field order as the header. No
    /// partial or append writes.
    pub fn persist(&self, collection: &Collection) -> Result<()> {
        let mut writer = io_utils::open_csv_writer(&self.path, self.delimiter)?;
        writer
            .write_record(self.schema.headers())
            .with_context(|| format!("Writing header row to {:?}", self.path))?;
        for record in &collection.records {
            writer
                .write_record(record.to_csv_row())
                .with_context(|| format!("Writing record to {:?}", self.path))?;
        }
        writer
            .flush()
            .with_context(|| format!("Flushing {:?}", self.path))?;

        if let Some(mirror) = self.json_mirror.as_deref() {
            let file = File::create(mirror)
                .with_context(|| format!("Creating JSON mirror {mirror:?}"))?;
            serde_json::to_writer_pretty(file, &collection.to_json(&self.schema))
                .context("Writing JSON mirror")?;
        }
        debug!(
            "Persisted {} record(s) to {:?}",
            collection.len(),
            self.path
        );
        Ok(())
    }
}
