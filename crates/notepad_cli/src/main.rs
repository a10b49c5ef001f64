//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open a store from `NOTEPAD_*` environment configuration.
//! - Run one create/read/update/delete cycle per collection and print
//!   deterministic `key=value` lines.

use log::info;
use notepad_core::{
    core_version, fields, init_logging, open_store, FieldValues, LogConfig, ReadQuery,
    SqliteContentService, StoreConfig,
};
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("notepad_cli error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    if let Some(log_config) = LogConfig::from_env()? {
        init_logging(&log_config)?;
    }
    let config = StoreConfig::from_env()?;
    let store = open_store(&config)?;
    info!("event=cli_smoke module=cli status=start");

    println!("notepad_core version={}", core_version());
    store.subscribe(
        "/notes",
        Arc::new(|path: &str| println!("notify path={path}")),
    )?;

    note_cycle(&store)?;
    todo_cycle(&store)?;

    info!("event=cli_smoke module=cli status=ok");
    Ok(())
}

fn note_cycle(store: &SqliteContentService) -> Result<(), Box<dyn Error>> {
    let path = store.create(
        "/notes",
        &FieldValues::new().with(fields::BODY, "smoke test note body for the cli run"),
    )?;
    println!("note created={}", !path.is_empty());

    let rows = store.read(&path, &ReadQuery::all())?;
    let title = rows
        .first()
        .and_then(|row| row.text(fields::TITLE))
        .unwrap_or_default();
    println!("note title={title}");

    let updated = store.update(
        &path,
        &FieldValues::new().with(fields::CATEGORY, "Smoke"),
        None,
    )?;
    println!("note updated={updated}");
    println!("note categories={}", store.note_categories()?.join(","));
    println!("note deleted={}", store.delete(&path, None)?);
    Ok(())
}

fn todo_cycle(store: &SqliteContentService) -> Result<(), Box<dyn Error>> {
    let path = store.create("/todos", &FieldValues::new().with(fields::TEXT, "Buy milk"))?;
    let rows = store.read(&path, &ReadQuery::all())?;
    let color = rows
        .first()
        .and_then(|row| row.text(fields::COLOR))
        .unwrap_or_default();
    println!("todo color={color}");

    let updated = store.update(
        &path,
        &FieldValues::new().with(fields::COMPLETED, true),
        None,
    )?;
    println!("todo updated={updated}");
    println!("todo deleted={}", store.delete(&path, None)?);
    Ok(())
}
