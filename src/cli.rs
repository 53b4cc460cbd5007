use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{mutate::KeyMode, schema::Schema};

#[derive(Debug, Parser)]
#[command(author, version, about = "Manage flat-file roster records", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print every record as a JSON array
    List(ListArgs),
    /// Fetch one record by key or by name
    Get(GetArgs),
    /// Create a record from field assignments and persist it
    Add(AddArgs),
    /// Overwrite fields on an existing record
    Update(UpdateArgs),
    /// Remove a record by key
    Delete(DeleteArgs),
    /// Produce summary statistics for numeric columns
    Stats(StatsArgs),
    /// Rank records by a column value
    Top(TopArgs),
    /// Compare two records as 0-100 scaled metric vectors
    Compare(CompareArgs),
    /// Write or display a canonical schema definition
    Schema(SchemaArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum Profile {
    Roster,
    Students,
}

impl Profile {
    pub fn schema(&self) -> Schema {
        match self {
            Profile::Roster => Schema::roster(),
            Profile::Students => Schema::students(),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum KeyModeArg {
    Identity,
    Position,
}

impl From<KeyModeArg> for KeyMode {
    fn from(arg: KeyModeArg) -> Self {
        match arg {
            KeyModeArg::Identity => KeyMode::Identity,
            KeyModeArg::Position => KeyMode::Position,
        }
    }
}

#[derive(Debug, Args)]
pub struct StoreOpts {
    /// Backing CSV file
    #[arg(short = 'i', long = "data")]
    pub data: PathBuf,
    /// Schema YAML file describing the canonical columns
    #[arg(long)]
    pub schema: Option<PathBuf>,
    /// Built-in schema profile used when no schema file is given
    #[arg(long, value_enum, default_value = "roster")]
    pub profile: Profile,
    /// JSON mirror rewritten on every persist and read when the CSV is absent
    #[arg(long = "json-mirror")]
    pub json_mirror: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub store: StoreOpts,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    #[command(flatten)]
    pub store: StoreOpts,
    /// Record key: the id, or the ordinal position with `--key-mode position`
    pub key: Option<i64>,
    /// Look the record up by name (case- and accent-insensitive) instead
    #[arg(long, conflicts_with = "key")]
    pub name: Option<String>,
    /// How keys address records
    #[arg(long = "key-mode", value_enum, default_value = "identity")]
    pub key_mode: KeyModeArg,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[command(flatten)]
    pub store: StoreOpts,
    /// Field assignment such as `name=Ana` or `goals=7` (repeatable)
    #[arg(short = 's', long = "set", value_parser = parse_assignment, action = clap::ArgAction::Append, required = true)]
    pub sets: Vec<(String, String)>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub store: StoreOpts,
    /// Record key: the id, or the ordinal position with `--key-mode position`
    pub key: i64,
    /// Field assignment such as `goals=9` (repeatable)
    #[arg(short = 's', long = "set", value_parser = parse_assignment, action = clap::ArgAction::Append, required = true)]
    pub sets: Vec<(String, String)>,
    /// How keys address records
    #[arg(long = "key-mode", value_enum, default_value = "identity")]
    pub key_mode: KeyModeArg,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub store: StoreOpts,
    /// Record key: the id, or the ordinal position with `--key-mode position`
    pub key: i64,
    /// How keys address records
    #[arg(long = "key-mode", value_enum, default_value = "identity")]
    pub key_mode: KeyModeArg,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[command(flatten)]
    pub store: StoreOpts,
    /// Columns to summarize (defaults to every numeric column)
    #[arg(short = 'C', long = "columns", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub columns: Vec<String>,
    /// Restrict the summary to records at this position (e.g. Goalkeeper)
    #[arg(long)]
    pub position: Option<String>,
}

#[derive(Debug, Args)]
pub struct TopArgs {
    #[command(flatten)]
    pub store: StoreOpts,
    /// Column to rank by
    #[arg(short = 'C', long = "column")]
    pub column: String,
    /// Number of records to emit (0 = all)
    #[arg(long, default_value_t = 5)]
    pub limit: usize,
    /// Rank lowest-first instead of highest-first
    #[arg(long)]
    pub ascending: bool,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    #[command(flatten)]
    pub store: StoreOpts,
    /// First record name
    pub a: String,
    /// Second record name
    pub b: String,
    /// Metric columns to scale (defaults to every numeric column)
    #[arg(short = 'C', long = "columns", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub columns: Vec<String>,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Built-in profile to materialize
    #[arg(long, value_enum, default_value = "roster")]
    pub profile: Profile,
    /// Destination .yml file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

pub fn parse_assignment(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((name, raw)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), raw.to_string()))
        }
        _ => Err(format!("Expected `field=value`, got '{value}'")),
    }
}
