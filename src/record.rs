//! Fixed-shape records and the in-memory collection.
//!
//! A [`Record`] always carries exactly one [`Value`] per canonical schema
//! column, in schema order. The open-ended per-row mappings of the source
//! data live only at the normalization boundary; past it, every record has
//! the declared shape.

use serde_json::{Map, Value as JsonValue};

use crate::{data::Value, schema::Schema};

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Record { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn set(&mut self, index: usize, value: Value) {
        if index < self.values.len() {
            self.values[index] = value;
        }
    }

    /// Numeric view of one cell; text cells read as 0.
    pub fn numeric(&self, index: usize) -> f64 {
        self.values.get(index).map_or(0.0, Value::as_f64)
    }

    pub fn identity(&self, schema: &Schema) -> Option<i64> {
        let index = schema.identity_index()?;
        match self.values.get(index) {
            Some(Value::Integer(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn to_json(&self, schema: &Schema) -> JsonValue {
        let mut object = Map::new();
        for (column, value) in schema.columns.iter().zip(&self.values) {
            object.insert(column.name.clone(), value.to_json());
        }
        JsonValue::Object(object)
    }

    pub fn to_csv_row(&self) -> Vec<String> {
        self.values.iter().map(Value::as_display).collect()
    }
}

/// Ordered in-memory sequence of records; row order is insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    pub records: Vec<Record>,
}

impl Collection {
    pub fn new(records: Vec<Record>) -> Self {
        Collection { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Highest identity currently in the collection. Deleted ids are never
    /// reused: assignment is `max(existing) + 1`, not gap-filling.
    pub fn max_identity(&self, schema: &Schema) -> Option<i64> {
        self.records
            .iter()
            .filter_map(|record| record.identity(schema))
            .max()
    }

    pub fn position_of_id(&self, schema: &Schema, id: i64) -> Option<usize> {
        self.records
            .iter()
            .position(|record| record.identity(schema) == Some(id))
    }

    pub fn to_json(&self, schema: &Schema) -> JsonValue {
        JsonValue::Array(
            self.records
                .iter()
                .map(|record| record.to_json(schema))
                .collect(),
        )
    }
}
