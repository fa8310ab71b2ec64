// UI layer: the interactive menu and its prompt flows, built on
// `dialoguer`. Each flow collects input, calls the record manager, and
// prints the outcome; errors bubble up to the menu loop, which reports
// them and keeps running.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use crate::ops::{BatchReport, RecordManager, RecordStore};
use crate::schema::{record_id, Kind, Record};

/// Main interactive menu. Receives the record manager and runs a select
/// loop until the user chooses "Exit".
///
/// This is the recovery boundary: a failed flow prints a one-line
/// diagnostic and the loop continues, an interrupted prompt counts as a
/// cancellation, and only the Exit entry leaves the loop.
pub fn main_menu<S: RecordStore>(manager: &RecordManager<S>) -> Result<()> {
    let items = [
        "List records",
        "Search records",
        "Create record",
        "Update record",
        "Delete record",
        "Batch insert",
        "Export / import",
        "Clear table",
        "Exit",
    ];

    loop {
        println!();
        let selection = match Select::new()
            .with_prompt("refshelf")
            .items(&items)
            .default(0)
            .interact()
        {
            Ok(selection) => selection,
            Err(err) => {
                report_error(err.into());
                continue;
            }
        };

        if selection == items.len() - 1 {
            println!("Goodbye!");
            return Ok(());
        }

        let outcome = match selection {
            0 => handle_list(manager),
            1 => handle_search(manager),
            2 => handle_create(manager),
            3 => handle_update(manager),
            4 => handle_delete(manager),
            5 => handle_batch(manager),
            6 => handle_transfer(manager),
            7 => handle_clear(manager),
            _ => Ok(()),
        };
        if let Err(err) = outcome {
            report_error(err);
        }
    }
}

/// Distinguish "the user bailed out of a prompt" from real failures.
fn report_error(err: anyhow::Error) {
    let interrupted = err
        .downcast_ref::<io::Error>()
        .is_some_and(|io_err| io_err.kind() == io::ErrorKind::Interrupted);
    if interrupted {
        println!("Operation cancelled.");
    } else {
        println!("Error: {err:#}");
    }
}

/// Pick one of the two tables.
fn prompt_kind() -> Result<Kind> {
    let names: Vec<&str> = Kind::ALL.iter().map(|kind| kind.table()).collect();
    let choice = Select::new()
        .with_prompt("Table")
        .items(&names)
        .default(0)
        .interact()?;
    Ok(Kind::ALL[choice])
}

fn handle_list<S: RecordStore>(manager: &RecordManager<S>) -> Result<()> {
    let kind = prompt_kind()?;
    let limit: String = Input::new()
        .with_prompt("Limit (blank for all)")
        .allow_empty(true)
        .interact_text()?;
    let limit = limit.trim().parse::<usize>().ok();

    let sp = spinner("Fetching records...");
    let records = manager.list_all(kind, limit);
    sp.finish_and_clear();

    display_records(kind, &records?);
    Ok(())
}

fn handle_search<S: RecordStore>(manager: &RecordManager<S>) -> Result<()> {
    let kind = prompt_kind()?;
    let fields = kind.fields();
    let field = fields[Select::new()
        .with_prompt("Field to search")
        .items(&fields)
        .default(0)
        .interact()?];
    let needle: String = Input::new().with_prompt("Search value").interact_text()?;

    let sp = spinner("Searching...");
    let hits = manager.search(kind, field, &needle);
    sp.finish_and_clear();

    let hits = hits?;
    println!("\nSearch results for {needle:?} in {field}:");
    display_records(kind, &hits);
    Ok(())
}

fn handle_create<S: RecordStore>(manager: &RecordManager<S>) -> Result<()> {
    let kind = prompt_kind()?;
    let record = collect_record(kind)?;

    let sp = spinner("Creating record...");
    let stored = manager.create(kind, &record);
    sp.finish_and_clear();

    let stored = stored?;
    println!(
        "Created record {} in {}",
        record_id(&stored).unwrap_or_else(|| "?".into()),
        kind.table()
    );
    Ok(())
}

fn handle_update<S: RecordStore>(manager: &RecordManager<S>) -> Result<()> {
    let kind = prompt_kind()?;
    let id: String = Input::new()
        .with_prompt("Record ID to update")
        .interact_text()?;
    let id = id.trim();

    let sp = spinner("Fetching record...");
    let current = manager.fetch(kind, id);
    sp.finish_and_clear();

    let Some(current) = current? else {
        println!("No record found with ID: {id}");
        return Ok(());
    };
    println!("\nCurrent record:");
    display_records(kind, std::slice::from_ref(&current));

    // Blank keeps the current value; only changed fields go out.
    let mut changes = Record::new();
    for field in kind.fields() {
        let existing = current.get(field).and_then(Value::as_str).unwrap_or("");
        let value: String = Input::new()
            .with_prompt(format!("{} [{existing}]", field.to_uppercase()))
            .allow_empty(true)
            .interact_text()?;
        if !value.is_empty() {
            changes.insert(field.to_string(), Value::String(value));
        }
    }
    if changes.is_empty() {
        println!("Nothing to update.");
        return Ok(());
    }

    let sp = spinner("Updating record...");
    let updated = manager.update(kind, id, &changes);
    sp.finish_and_clear();

    match updated? {
        Some(_) => println!("Updated record {id} in {}", kind.table()),
        None => println!("No record found with ID: {id}"),
    }
    Ok(())
}

fn handle_delete<S: RecordStore>(manager: &RecordManager<S>) -> Result<()> {
    let kind = prompt_kind()?;
    let id: String = Input::new()
        .with_prompt("Record ID to delete")
        .interact_text()?;
    let id = id.trim();

    let sp = spinner("Fetching record...");
    let current = manager.fetch(kind, id);
    sp.finish_and_clear();

    let Some(current) = current? else {
        println!("No record found with ID: {id}");
        return Ok(());
    };
    println!("\nRecord to delete:");
    display_records(kind, std::slice::from_ref(&current));

    if !Confirm::new()
        .with_prompt("Confirm deletion?")
        .default(false)
        .interact()?
    {
        println!("Deletion cancelled.");
        return Ok(());
    }

    let sp = spinner("Deleting record...");
    let outcome = manager.delete(kind, id);
    sp.finish_and_clear();

    outcome?;
    println!("Deleted record {id} from {}", kind.table());
    Ok(())
}

fn handle_batch<S: RecordStore>(manager: &RecordManager<S>) -> Result<()> {
    let modes = ["Import from JSON file", "Enter records manually"];
    let mode = Select::new()
        .with_prompt("Batch insert")
        .items(&modes)
        .default(0)
        .interact()?;
    let kind = prompt_kind()?;

    if mode == 0 {
        return import_flow(manager, kind);
    }

    let mut records = Vec::new();
    loop {
        println!("\nRecord {}:", records.len() + 1);
        records.push(collect_record(kind)?);
        if !Confirm::new()
            .with_prompt("Add another record?")
            .default(false)
            .interact()?
        {
            break;
        }
    }

    println!("\nRecords to insert:");
    display_records(kind, &records);
    if !Confirm::new()
        .with_prompt("Proceed with insertion?")
        .default(true)
        .interact()?
    {
        println!("Batch cancelled.");
        return Ok(());
    }

    let sp = spinner("Inserting records...");
    let report = manager.batch_insert(kind, &records);
    sp.finish_and_clear();

    print_batch_report(kind, &report?);
    Ok(())
}

fn handle_transfer<S: RecordStore>(manager: &RecordManager<S>) -> Result<()> {
    let modes = ["Export table to JSON", "Import from JSON file"];
    let mode = Select::new()
        .with_prompt("Export / import")
        .items(&modes)
        .default(0)
        .interact()?;
    let kind = prompt_kind()?;

    if mode == 1 {
        return import_flow(manager, kind);
    }

    let output: String = Input::new()
        .with_prompt("Output file (blank for auto-generated)")
        .allow_empty(true)
        .interact_text()?;
    let path = match output.trim() {
        "" => None,
        name => Some(PathBuf::from(name)),
    };

    let sp = spinner("Exporting...");
    let summary = manager.export_table(kind, path);
    sp.finish_and_clear();

    let summary = summary?;
    println!(
        "Exported {} records from {} to {}",
        summary.exported,
        kind.table(),
        summary.path.display()
    );
    Ok(())
}

fn handle_clear<S: RecordStore>(manager: &RecordManager<S>) -> Result<()> {
    let kind = prompt_kind()?;
    if !Confirm::new()
        .with_prompt(format!("Delete ALL records from {}?", kind.table()))
        .default(false)
        .interact()?
    {
        println!("Operation cancelled.");
        return Ok(());
    }

    let sp = spinner("Clearing table...");
    let deleted = manager.clear_table(kind);
    sp.finish_and_clear();

    println!("Deleted {} records from {}", deleted?, kind.table());
    Ok(())
}

/// Shared tail of both import entry points.
fn import_flow<S: RecordStore>(manager: &RecordManager<S>, kind: Kind) -> Result<()> {
    let path: String = Input::new().with_prompt("JSON file path").interact_text()?;

    let sp = spinner("Importing...");
    let report = manager.import_from_json(kind, Path::new(path.trim()));
    sp.finish_and_clear();

    print_batch_report(kind, &report?);
    Ok(())
}

/// Prompt for every schema field of the kind: required fields reject
/// empty input at the prompt, optional fields are skipped when blank.
fn collect_record(kind: Kind) -> Result<Record> {
    let schema = kind.schema();
    println!("Required fields: {}", schema.required.join(", "));
    println!("Optional fields: {}", schema.optional.join(", "));

    let mut record = Record::new();
    for field in schema.required {
        let value: String = Input::new()
            .with_prompt(field.to_uppercase())
            .validate_with(|input: &String| {
                if input.trim().is_empty() {
                    Err("this field is required")
                } else {
                    Ok(())
                }
            })
            .interact_text()?;
        record.insert(field.to_string(), Value::String(value));
    }
    for field in schema.optional {
        let value: String = Input::new()
            .with_prompt(format!("{} (optional)", field.to_uppercase()))
            .allow_empty(true)
            .interact_text()?;
        if !value.is_empty() {
            record.insert(field.to_string(), Value::String(value));
        }
    }
    Ok(record)
}

fn print_batch_report(kind: Kind, report: &BatchReport) {
    println!(
        "Inserted {}/{} records into {}",
        report.inserted,
        report.total(),
        kind.table()
    );
    for failure in &report.failures {
        println!("  record {}: {}", failure.index, failure.error);
    }
}

/// Print records with the kind's display fields, numbered, long values
/// truncated.
fn display_records(kind: Kind, records: &[Record]) {
    if records.is_empty() {
        println!("No records found in {}", kind.table());
        return;
    }

    println!("\n{} ({} records):", kind.table().to_uppercase(), records.len());
    println!("{}", "-".repeat(80));
    for (i, record) in records.iter().enumerate() {
        println!(
            "\n{}. ID: {}",
            i + 1,
            record_id(record).unwrap_or_else(|| "N/A".into())
        );
        for field in kind.schema().display {
            println!("   {}: {}", field.to_uppercase(), preview(record.get(*field)));
        }
    }
}

fn preview(value: Option<&Value>) -> String {
    let text = match value {
        None | Some(Value::Null) => "N/A".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    if text.chars().count() > 100 {
        let prefix: String = text.chars().take(100).collect();
        format!("{prefix}...")
    } else {
        text
    }
}

/// indicatif spinner shown while a blocking remote call is in flight.
fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn preview_truncates_long_values() {
        let long = json!("x".repeat(150));
        let shown = preview(Some(&long));
        assert_eq!(shown.chars().count(), 103);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn preview_renders_missing_values_as_na() {
        assert_eq!(preview(None), "N/A");
        assert_eq!(preview(Some(&Value::Null)), "N/A");
    }

    #[test]
    fn preview_renders_numbers_verbatim() {
        assert_eq!(preview(Some(&json!(2017))), "2017");
    }
}
