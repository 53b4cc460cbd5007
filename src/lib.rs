pub mod aggregate;
pub mod cli;
pub mod data;
pub mod error;
pub mod io_utils;
pub mod mutate;
pub mod record;
pub mod schema;
pub mod store;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, info};
use serde::Serialize;

use crate::{
    cli::{Cli, Commands},
    mutate::Mutator,
    schema::Schema,
    store::RecordStore,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("rosterbase", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::List(args) => handle_list(&args),
        Commands::Get(args) => handle_get(&args),
        Commands::Add(args) => handle_add(&args),
        Commands::Update(args) => handle_update(&args),
        Commands::Delete(args) => handle_delete(&args),
        Commands::Stats(args) => handle_stats(&args),
        Commands::Top(args) => handle_top(&args),
        Commands::Compare(args) => handle_compare(&args),
        Commands::Schema(args) => handle_schema(&args),
    }
}

fn open_store(opts: &cli::StoreOpts) -> Result<RecordStore> {
    let schema = match &opts.schema {
        Some(path) => {
            Schema::load(path).with_context(|| format!("Loading schema from {path:?}"))?
        }
        None => opts.profile.schema(),
    };
    let delimiter = io_utils::resolve_delimiter(&opts.data, opts.delimiter);
    Ok(RecordStore::new(&opts.data, schema)
        .with_delimiter(delimiter)
        .with_json_mirror(opts.json_mirror.clone()))
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Serializing response JSON")?;
    println!("{rendered}");
    Ok(())
}

fn handle_list(args: &cli::ListArgs) -> Result<()> {
    let store = open_store(&args.store)?;
    let collection = store.load()?;
    emit(&collection.to_json(store.schema()))?;
    info!(
        "Listed {} record(s) from {:?}",
        collection.len(),
        store.path()
    );
    Ok(())
}

fn handle_get(args: &cli::GetArgs) -> Result<()> {
    let store = open_store(&args.store)?;
    let record = if let Some(name) = &args.name {
        let collection = store.load()?;
        aggregate::match_by_normalized_name(&collection, store.schema(), name)?.clone()
    } else {
        let key = args
            .key
            .ok_or_else(|| anyhow!("Provide a record key or --name"))?;
        Mutator::new(&store, args.key_mode.into()).fetch(key)?
    };
    emit(&record.to_json(store.schema()))
}

fn handle_add(args: &cli::AddArgs) -> Result<()> {
    let store = open_store(&args.store)?;
    let record = Mutator::new(&store, mutate::KeyMode::Identity).create(&args.sets)?;
    emit(&record.to_json(store.schema()))
}

fn handle_update(args: &cli::UpdateArgs) -> Result<()> {
    let store = open_store(&args.store)?;
    let record = Mutator::new(&store, args.key_mode.into()).update(args.key, &args.sets)?;
    emit(&record.to_json(store.schema()))
}

fn handle_delete(args: &cli::DeleteArgs) -> Result<()> {
    let store = open_store(&args.store)?;
    let record = Mutator::new(&store, args.key_mode.into()).delete(args.key)?;
    emit(&record.to_json(store.schema()))
}

fn handle_stats(args: &cli::StatsArgs) -> Result<()> {
    let store = open_store(&args.store)?;
    let collection = store.load()?;
    let summary = match &args.position {
        Some(position) => {
            aggregate::position_summary(&collection, store.schema(), position, &args.columns)?
        }
        None => aggregate::summary(&collection, store.schema(), &args.columns)?,
    };
    emit(&summary)?;
    info!("Computed summary over {} record(s)", summary.count);
    Ok(())
}

fn handle_top(args: &cli::TopArgs) -> Result<()> {
    let store = open_store(&args.store)?;
    let collection = store.load()?;
    let ranked = aggregate::top_n(
        &collection,
        store.schema(),
        &args.column,
        args.limit,
        args.ascending,
    )?;
    let rows: Vec<serde_json::Value> = ranked
        .iter()
        .map(|record| record.to_json(store.schema()))
        .collect();
    emit(&rows)?;
    info!("Ranked {} record(s) by '{}'", rows.len(), args.column);
    Ok(())
}

fn handle_compare(args: &cli::CompareArgs) -> Result<()> {
    let store = open_store(&args.store)?;
    let collection = store.load()?;
    let comparison =
        aggregate::compare(&collection, store.schema(), &args.a, &args.b, &args.columns)?;
    emit(&comparison)
}

fn handle_schema(args: &cli::SchemaArgs) -> Result<()> {
    let schema = args.profile.schema();
    match &args.output {
        Some(path) => {
            schema
                .save(path)
                .with_context(|| format!("Writing schema to {path:?}"))?;
            info!(
                "Wrote schema with {} column(s) to {:?}",
                schema.columns.len(),
                path
            );
        }
        None => print!("{}", schema.to_yaml_string()?),
    }
    Ok(())
}
