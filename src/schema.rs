//! Canonical schema definitions and row normalization.
//!
//! A [`Schema`] is an ordered list of columns with declared types and
//! defaults. Raw CSV headers and JSON keys are reconciled against the
//! canonical names after trimming, case-folding, and snake-casing, so
//! `"Clean sheets"`, `" SAVES "`, and `"High Claims"` all land on their
//! canonical columns. Canonical fields missing from the input are
//! synthesized from defaults; malformed numeric cells coerce to the
//! default instead of failing the load.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, anyhow};
use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::{
    data::{Value, parse_numeric_or_default},
    record::Record,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Integer,
    Float,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    pub datatype: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ColumnMeta {
    fn text(name: &str) -> Self {
        ColumnMeta {
            name: name.to_string(),
            datatype: ColumnType::String,
            default: None,
        }
    }

    fn integer(name: &str) -> Self {
        ColumnMeta {
            name: name.to_string(),
            datatype: ColumnType::Integer,
            default: None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.datatype, ColumnType::Integer | ColumnType::Float)
    }

    pub fn default_value(&self) -> Value {
        match &self.default {
            Some(value) => value.clone(),
            None => match self.datatype {
                ColumnType::String => Value::String(String::new()),
                ColumnType::Integer => Value::Integer(0),
                ColumnType::Float => Value::Float(0.0),
            },
        }
    }
}

/// Canonical form of a field name: trimmed, snake-cased, lowercase.
pub fn canonical_field_name(name: &str) -> String {
    name.trim().to_snake_case()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<ColumnMeta>,
    /// Canonical name of the persistent identity column, when the schema
    /// carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

impl Schema {
    /// The player table from the roster variant: identity, descriptive
    /// fields, and the per-position stat columns.
    pub fn roster() -> Self {
        let mut columns = vec![
            ColumnMeta::integer("id"),
            ColumnMeta::text("name"),
            ColumnMeta::integer("age"),
            ColumnMeta::text("position"),
        ];
        for stat in [
            "goals",
            "assists",
            "stamina",
            "games",
            "clean_sheets",
            "saves",
            "high_claims",
            "catches",
            "tackles",
            "clearances",
            "blocks",
            "interceptions",
            "passes_completed",
            "key_passes",
            "ball_recoveries",
            "dribbles",
            "shots",
            "shots_on_target",
            "chances_created",
        ] {
            columns.push(ColumnMeta::integer(stat));
        }
        Schema {
            columns,
            identity: Some("id".to_string()),
        }
    }

    /// The student-records table.
    pub fn students() -> Self {
        Schema {
            columns: vec![
                ColumnMeta::integer("id"),
                ColumnMeta::text("name"),
                ColumnMeta::integer("age"),
                ColumnMeta::text("grade"),
            ],
            identity: Some("id".to_string()),
        }
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Index of a column by canonical-insensitive name match.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = canonical_field_name(name);
        self.columns
            .iter()
            .position(|c| canonical_field_name(&c.name) == wanted)
    }

    pub fn identity_index(&self) -> Option<usize> {
        self.identity
            .as_deref()
            .and_then(|name| self.column_index(name))
    }

    /// Names of numeric columns excluding the identity column, in schema
    /// order. The default field list for statistics and comparisons.
    pub fn metric_field_names(&self) -> Vec<String> {
        let identity = self.identity_index();
        self.columns
            .iter()
            .enumerate()
            .filter(|(idx, column)| column.is_numeric() && Some(*idx) != identity)
            .map(|(_, column)| column.name.clone())
            .collect()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Creating schema file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing schema YAML")
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing schema to YAML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
        let reader = BufReader::new(file);
        let mut schema: Schema = serde_yaml::from_reader(reader).context("Parsing schema YAML")?;
        for column in &mut schema.columns {
            column.name = canonical_field_name(&column.name);
        }
        schema.validate()?;
        Ok(schema)
    }

    fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(anyhow!("Schema must declare at least one column"));
        }
        if let Some(identity) = self.identity.as_deref() {
            let index = self
                .column_index(identity)
                .ok_or_else(|| anyhow!("Identity column '{identity}' is not declared"))?;
            if self.columns[index].datatype != ColumnType::Integer {
                return Err(anyhow!("Identity column '{identity}' must be an integer"));
            }
        }
        Ok(())
    }

    /// Maps every canonical column onto the position of its raw header, or
    /// `None` when the input file lacks the column entirely.
    pub fn reconcile_headers(&self, raw_headers: &[String]) -> Vec<Option<usize>> {
        self.columns
            .iter()
            .map(|column| {
                let wanted = canonical_field_name(&column.name);
                raw_headers
                    .iter()
                    .position(|raw| canonical_field_name(raw) == wanted)
            })
            .collect()
    }

    /// Produces a fully populated [`Record`] from one raw row. Returns the
    /// record together with the number of cells that fell back to defaults.
    pub fn normalize_row(&self, header_map: &[Option<usize>], raw: &[String]) -> (Record, usize) {
        let mut defaulted = 0usize;
        let values = self
            .columns
            .iter()
            .zip(header_map)
            .map(|(column, source)| {
                let cell = source.and_then(|idx| raw.get(idx)).map(String::as_str);
                match cell {
                    Some(cell) => {
                        let (value, was_defaulted) = self.normalize_cell(column, cell);
                        if was_defaulted {
                            defaulted += 1;
                        }
                        value
                    }
                    None => {
                        defaulted += 1;
                        column.default_value()
                    }
                }
            })
            .collect();
        (Record::new(values), defaulted)
    }

    /// Normalizes one JSON object (a mirror row or a request payload) into
    /// a canonical record. Key matching follows the same canonical fold as
    /// CSV headers.
    pub fn normalize_json_object(&self, object: &Map<String, JsonValue>) -> (Record, usize) {
        let mut defaulted = 0usize;
        let values = self
            .columns
            .iter()
            .map(|column| {
                let wanted = canonical_field_name(&column.name);
                let cell = object
                    .iter()
                    .find(|(key, _)| canonical_field_name(key) == wanted)
                    .map(|(_, value)| json_cell_to_raw(value));
                match cell {
                    Some(cell) => {
                        let (value, was_defaulted) = self.normalize_cell(column, &cell);
                        if was_defaulted {
                            defaulted += 1;
                        }
                        value
                    }
                    None => {
                        defaulted += 1;
                        column.default_value()
                    }
                }
            })
            .collect();
        (Record::new(values), defaulted)
    }

    fn normalize_cell(&self, column: &ColumnMeta, cell: &str) -> (Value, bool) {
        match column.datatype {
            ColumnType::String => (Value::String(cell.trim().to_string()), false),
            _ => parse_numeric_or_default(cell, &column.datatype, column.default_value()),
        }
    }

    pub fn record_from_defaults(&self) -> Record {
        Record::new(self.columns.iter().map(ColumnMeta::default_value).collect())
    }
}

fn json_cell_to_raw(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}
