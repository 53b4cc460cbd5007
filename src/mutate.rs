//! Create/update/delete operations over a record store.
//!
//! Records are addressed either by persistent identity or by ordinal
//! position ([`KeyMode`]). Every mutation triggers a full rewrite of the
//! backing file; there is no append-only log.

use anyhow::Result;
use log::{debug, info};

use crate::{
    data::{Value, parse_numeric_or_default},
    error::StoreError,
    record::{Collection, Record},
    schema::{ColumnType, Schema},
    store::RecordStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    /// Address records by the persistent `id` column.
    Identity,
    /// Address records by their current ordinal position. Deleting a record
    /// shifts every later position down by one, so cached positions go
    /// stale across deletes.
    Position,
}

/// Locates the record a key refers to under the given mode.
pub fn resolve_key(
    collection: &Collection,
    schema: &Schema,
    mode: KeyMode,
    key: i64,
) -> Result<usize, StoreError> {
    match mode {
        KeyMode::Identity => collection
            .position_of_id(schema, key)
            .ok_or(StoreError::IdNotFound(key)),
        KeyMode::Position => match usize::try_from(key) {
            Ok(position) if position < collection.len() => Ok(position),
            _ => Err(StoreError::PositionNotFound(key)),
        },
    }
}

/// Applies `field=value` assignments onto a record. Unknown fields are
/// ignored, the `skip` column (the identity) is preserved, and malformed
/// numeric values fall back to column defaults. Returns the number of
/// defaulted assignments.
pub fn apply_assignments(
    schema: &Schema,
    record: &mut Record,
    fields: &[(String, String)],
    skip: Option<usize>,
) -> usize {
    let mut defaulted = 0usize;
    for (name, raw) in fields {
        let Some(index) = schema.column_index(name) else {
            debug!("Ignoring unknown field '{name}'");
            continue;
        };
        if Some(index) == skip {
            debug!("Preserving identity field '{name}'");
            continue;
        }
        let column = &schema.columns[index];
        match column.datatype {
            ColumnType::String => record.set(index, Value::String(raw.trim().to_string())),
            _ => {
                let (value, was_defaulted) =
                    parse_numeric_or_default(raw, &column.datatype, column.default_value());
                if was_defaulted {
                    debug!("Defaulted field '{name}' from malformed value '{raw}'");
                    defaulted += 1;
                }
                record.set(index, value);
            }
        }
    }
    defaulted
}

pub struct Mutator<'a> {
    store: &'a RecordStore,
    key_mode: KeyMode,
}

impl<'a> Mutator<'a> {
    pub fn new(store: &'a RecordStore, key_mode: KeyMode) -> Self {
        Mutator { store, key_mode }
    }

    /// Merges the assignments over schema defaults, assigns the next
    /// identity (`max(existing) + 1`, 1 when empty) when the schema carries
    /// one, appends, and persists. A caller-supplied id is ignored.
    pub fn create(&self, fields: &[(String, String)]) -> Result<Record> {
        let schema = self.store.schema();
        let mut collection = self.store.load()?;

        let identity_index = schema.identity_index();
        let mut record = schema.record_from_defaults();
        apply_assignments(schema, &mut record, fields, identity_index);
        if let Some(index) = identity_index {
            let next = collection.max_identity(schema).unwrap_or(0) + 1;
            record.set(index, Value::Integer(next));
        }

        collection.records.push(record.clone());
        self.store.persist(&collection)?;
        info!(
            "Created record; collection now holds {} record(s)",
            collection.len()
        );
        Ok(record)
    }

    /// Overwrites only the supplied fields on the matching record, leaving
    /// the identity and untouched fields unchanged, then persists.
    pub fn update(&self, key: i64, fields: &[(String, String)]) -> Result<Record> {
        let schema = self.store.schema();
        let mut collection = self.store.load()?;
        let position = resolve_key(&collection, schema, self.key_mode, key)?;

        let identity_index = schema.identity_index();
        let record = &mut collection.records[position];
        apply_assignments(schema, record, fields, identity_index);
        let updated = record.clone();

        self.store.persist(&collection)?;
        info!("Updated record at position {position}");
        Ok(updated)
    }

    /// Removes the matching record and persists. Under position keying the
    /// removal re-indexes every later record; callers must not reuse cached
    /// positions afterwards.
    pub fn delete(&self, key: i64) -> Result<Record> {
        let schema = self.store.schema();
        let mut collection = self.store.load()?;
        let position = resolve_key(&collection, schema, self.key_mode, key)?;
        let removed = collection.records.remove(position);

        self.store.persist(&collection)?;
        info!(
            "Deleted record at position {position}; {} record(s) remain",
            collection.len()
        );
        Ok(removed)
    }

    /// Read-only lookup by key; no persist.
    pub fn fetch(&self, key: i64) -> Result<Record> {
        let collection = self.store.load()?;
        let position = resolve_key(&collection, self.store.schema(), self.key_mode, key)?;
        Ok(collection.records[position].clone())
    }
}
