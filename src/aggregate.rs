//! Summary statistics, rankings, and 0-100 metric scaling.
//!
//! Every aggregate is a single pass over the in-memory collection. Leaders
//! (argmax records) fall back to an `"N/A"` placeholder when a column sums
//! to zero, and metric scaling guards the all-zero column with a divisor of
//! 1, so an empty or zeroed collection never faults.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use itertools::Itertools;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::{
    data::{fold_name, round_to},
    error::StoreError,
    record::{Collection, Record},
    schema::Schema,
};

/// Position spellings the source data uses for goalkeepers, folded.
const GOALKEEPER_ALIASES: &[&str] = &["gk", "goalkeeper", "goal keeper", "goal-keeper", "thu mon"];

#[derive(Debug, Serialize)]
pub struct Summary {
    pub count: usize,
    pub means: BTreeMap<String, f64>,
    pub leaders: BTreeMap<String, JsonValue>,
}

#[derive(Debug, Serialize)]
pub struct Comparison {
    pub fields: Vec<String>,
    pub a: ComparisonSide,
    pub b: ComparisonSide,
}

#[derive(Debug, Serialize)]
pub struct ComparisonSide {
    pub name: String,
    pub metrics: BTreeMap<String, f64>,
}

/// Per-field mean and argmax record over the collection. Means round to two
/// decimal places; the first record holding the maximum wins ties. An empty
/// collection yields `count: 0` with zero means and placeholder leaders.
pub fn summary(collection: &Collection, schema: &Schema, fields: &[String]) -> Result<Summary> {
    let resolved = resolve_metric_fields(schema, fields)?;
    let mut means = BTreeMap::new();
    let mut leaders = BTreeMap::new();

    for (index, name) in &resolved {
        let mut sum = 0.0;
        let mut best: Option<(usize, f64)> = None;
        for (position, record) in collection.records.iter().enumerate() {
            let metric = record.numeric(*index);
            sum += metric;
            if best.is_none_or(|(_, current)| metric > current) {
                best = Some((position, metric));
            }
        }

        let mean = if collection.is_empty() {
            0.0
        } else {
            round_to(sum / collection.len() as f64, 2)
        };
        means.insert(name.clone(), mean);

        let leader = match best {
            Some((position, _)) if sum > 0.0 => collection.records[position].to_json(schema),
            _ => placeholder_leader(name),
        };
        leaders.insert(name.clone(), leader);
    }

    Ok(Summary {
        count: collection.len(),
        means,
        leaders,
    })
}

/// Summary restricted to records whose position matches `position`.
/// Goalkeeper queries accept the source data's spelling variants.
pub fn position_summary(
    collection: &Collection,
    schema: &Schema,
    position: &str,
    fields: &[String],
) -> Result<Summary> {
    let filtered = filter_by_position(collection, schema, position)?;
    summary(&filtered, schema, fields)
}

pub fn filter_by_position(
    collection: &Collection,
    schema: &Schema,
    position: &str,
) -> Result<Collection> {
    let index = schema
        .column_index("position")
        .ok_or_else(|| StoreError::UnknownColumn("position".to_string()))?;
    let folded = fold_name(position);
    let want_goalkeeper = GOALKEEPER_ALIASES.contains(&folded.as_str());

    let records = collection
        .records
        .iter()
        .filter(|record| {
            let cell = fold_name(&record.values()[index].as_display());
            if want_goalkeeper {
                GOALKEEPER_ALIASES.contains(&cell.as_str())
            } else {
                cell == folded
            }
        })
        .cloned()
        .collect();
    Ok(Collection::new(records))
}

/// Stable ranking by one column. Ties keep the original collection order,
/// which callers rely on for deterministic output.
pub fn top_n<'a>(
    collection: &'a Collection,
    schema: &Schema,
    field: &str,
    limit: usize,
    ascending: bool,
) -> Result<Vec<&'a Record>> {
    let index = schema
        .column_index(field)
        .ok_or_else(|| StoreError::UnknownColumn(field.to_string()))?;
    let limit = if limit == 0 { collection.len() } else { limit };
    let ordered = collection
        .records
        .iter()
        .sorted_by(|a, b| {
            let ordering = a.values()[index].sort_cmp(&b.values()[index]);
            if ascending { ordering } else { ordering.reverse() }
        })
        .take(limit)
        .collect();
    Ok(ordered)
}

/// Scales each field to 0-100 relative to the collection maximum, keyed by
/// record identity (ordinal position when the schema has no identity).
/// An all-zero column scales to 0 for every record.
pub fn normalize(
    collection: &Collection,
    schema: &Schema,
    fields: &[String],
) -> Result<BTreeMap<String, BTreeMap<String, f64>>> {
    let resolved = resolve_metric_fields(schema, fields)?;
    let scaled = scaled_rows(collection, &resolved);

    let mut result = BTreeMap::new();
    for (position, metrics) in scaled.into_iter().enumerate() {
        result.insert(record_key(&collection.records[position], schema, position), metrics);
    }
    Ok(result)
}

/// Case- and diacritic-insensitive name lookup; the fold is applied to both
/// the stored value and the query.
pub fn match_by_normalized_name<'a>(
    collection: &'a Collection,
    schema: &Schema,
    query: &str,
) -> Result<&'a Record> {
    let position = position_by_normalized_name(collection, schema, query)?;
    Ok(&collection.records[position])
}

pub fn position_by_normalized_name(
    collection: &Collection,
    schema: &Schema,
    query: &str,
) -> Result<usize> {
    let index = schema
        .column_index("name")
        .ok_or_else(|| StoreError::UnknownColumn("name".to_string()))?;
    let folded = fold_name(query);
    collection
        .records
        .iter()
        .position(|record| fold_name(&record.values()[index].as_display()) == folded)
        .ok_or_else(|| StoreError::NameNotFound(query.to_string()).into())
}

/// Two normalized metric vectors for a head-to-head view; NotFound when
/// either name fails to match.
pub fn compare(
    collection: &Collection,
    schema: &Schema,
    a: &str,
    b: &str,
    fields: &[String],
) -> Result<Comparison> {
    let position_a = position_by_normalized_name(collection, schema, a)?;
    let position_b = position_by_normalized_name(collection, schema, b)?;
    let resolved = resolve_metric_fields(schema, fields)?;
    let scaled = scaled_rows(collection, &resolved);

    let name_index = schema
        .column_index("name")
        .ok_or_else(|| StoreError::UnknownColumn("name".to_string()))?;
    let side = |position: usize| ComparisonSide {
        name: collection.records[position].values()[name_index].as_display(),
        metrics: scaled[position].clone(),
    };

    Ok(Comparison {
        a: side(position_a),
        b: side(position_b),
        fields: resolved.into_iter().map(|(_, name)| name).collect(),
    })
}

fn scaled_rows(
    collection: &Collection,
    resolved: &[(usize, String)],
) -> Vec<BTreeMap<String, f64>> {
    let maxima: Vec<f64> = resolved
        .iter()
        .map(|(index, _)| {
            let max = collection
                .records
                .iter()
                .map(|record| record.numeric(*index))
                .fold(0.0f64, f64::max);
            if max == 0.0 { 1.0 } else { max }
        })
        .collect();

    collection
        .records
        .iter()
        .map(|record| {
            resolved
                .iter()
                .zip(&maxima)
                .map(|((index, name), max)| {
                    (name.clone(), round_to(record.numeric(*index) / max * 100.0, 1))
                })
                .collect()
        })
        .collect()
}

fn resolve_metric_fields(schema: &Schema, fields: &[String]) -> Result<Vec<(usize, String)>> {
    let names = if fields.is_empty() {
        schema.metric_field_names()
    } else {
        fields.to_vec()
    };
    names
        .into_iter()
        .map(|name| {
            let index = schema
                .column_index(&name)
                .ok_or_else(|| StoreError::UnknownColumn(name.clone()))?;
            let column = &schema.columns[index];
            if !column.is_numeric() {
                return Err(anyhow!(
                    "Column '{}' is type {:?} and cannot be aggregated",
                    column.name,
                    column.datatype
                ));
            }
            Ok((index, column.name.clone()))
        })
        .collect()
}

fn record_key(record: &Record, schema: &Schema, position: usize) -> String {
    match record.identity(schema) {
        Some(id) => id.to_string(),
        None => position.to_string(),
    }
}

fn placeholder_leader(field: &str) -> JsonValue {
    let mut object = Map::new();
    object.insert("name".to_string(), JsonValue::from("N/A"));
    object.insert(field.to_string(), JsonValue::from(0));
    JsonValue::Object(object)
}
