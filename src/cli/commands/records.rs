//! Record commands: add, import, export and the read-only views.

use std::io::Read;
use std::path::Path;

use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{Context, runtime};
use crate::cli::FilterArgs;
use crate::error::{Error, Result};
use crate::model::{Content, Record};
use crate::store::file::write_json;
use crate::store::{AddOutcome, ImportEntry};

#[derive(Serialize)]
struct AddOutput<'a> {
    record: &'a Record,
    duplicate: bool,
}

/// Add one quote. Online, the record is posted right away.
pub fn add(ctx: &Context, text: &str, category: &str) -> Result<()> {
    let content = Content::new(text, category);

    let (outcome, current) = if ctx.offline {
        let mut store = ctx.open_store()?;
        let outcome = store.add(content.clone())?;
        store.persist()?;
        let current = latest_with_content(store.records(), &content);
        (outcome, current)
    } else {
        let orchestrator = ctx.orchestrator()?;
        runtime()?.block_on(async {
            let outcome = orchestrator.add(content.clone()).await?;
            let store = orchestrator.store().lock().await;
            let current = latest_with_content(store.records(), &content);
            Ok::<_, Error>((outcome, current))
        })?
    };

    let record = current.unwrap_or_else(|| outcome.record().clone());
    let duplicate = matches!(outcome, AddOutcome::Duplicate(_));

    if ctx.json {
        let output = AddOutput {
            record: &record,
            duplicate,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if duplicate {
        println!("Already queued: \"{}\" ({})", record.content.text, record.id);
    } else if record.synced {
        println!("{} \"{}\" (id {})", "Added".green(), record.content.text, record.id);
    } else {
        println!(
            "{} \"{}\" (queued, will post on next sync)",
            "Added".green(),
            record.content.text
        );
    }

    Ok(())
}

fn latest_with_content(records: &[Record], content: &Content) -> Option<Record> {
    records.iter().rev().find(|r| r.content == *content).cloned()
}

/// Parse an import payload: a JSON array of `{text, category}` objects.
///
/// Entries that do not decode become empty entries, which the store counts
/// as invalid; the rest of the batch is kept.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` if the payload is not a JSON array.
pub fn parse_import(payload: &str) -> Result<Vec<ImportEntry>> {
    let values: Vec<Value> = serde_json::from_str(payload).map_err(|e| {
        Error::InvalidArgument(format!(
            "import data must be a JSON array of {{\"text\", \"category\"}} objects: {e}"
        ))
    })?;

    Ok(values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value).unwrap_or_else(|e| {
                debug!(index, error = %e, "Malformed import entry");
                ImportEntry::default()
            })
        })
        .collect())
}

fn read_input(file: &Path) -> Result<String> {
    if file.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }

    std::fs::read_to_string(file).map_err(|e| {
        Error::InvalidArgument(format!("cannot read {}: {e}", file.display()))
    })
}

/// Import quotes from a file or stdin.
pub fn import(ctx: &Context, file: &Path) -> Result<()> {
    let entries = parse_import(&read_input(file)?)?;

    let stats = if ctx.offline {
        let mut store = ctx.open_store()?;
        let stats = store.import(entries);
        if stats.added > 0 {
            store.persist()?;
        }
        stats
    } else {
        let orchestrator = ctx.orchestrator()?;
        runtime()?.block_on(orchestrator.import(entries))?
    };

    if ctx.json {
        println!("{}", serde_json::to_string(&stats)?);
    } else {
        println!(
            "Imported {} of {} entries ({} duplicate, {} invalid)",
            stats.added,
            stats.total(),
            stats.duplicates,
            stats.invalid
        );
    }

    Ok(())
}

/// Export every quote as `{text, category}` objects.
pub fn export(ctx: &Context, output: Option<&Path>) -> Result<()> {
    let store = ctx.open_store()?;
    let contents: Vec<&Content> = store.records().iter().map(|r| &r.content).collect();

    let Some(path) = output else {
        println!("{}", serde_json::to_string_pretty(&contents)?);
        return Ok(());
    };

    write_json(path, &contents)?;
    if ctx.json {
        let output = serde_json::json!({
            "exported": contents.len(),
            "path": path.display().to_string(),
        });
        println!("{output}");
    } else {
        println!("Exported {} quotes to {}", contents.len(), path.display());
    }

    Ok(())
}

fn print_record(record: &Record) {
    let marker = if record.synced {
        " ".normal()
    } else {
        "*".yellow()
    };
    println!(
        "{marker} \"{}\" - {}",
        record.content.text,
        record.content.category.cyan()
    );
}

/// List quotes matching the filter.
pub fn list(ctx: &Context, filter: &FilterArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let records = store.filter(filter.keyword.as_deref(), filter.category.as_deref());

    if ctx.json {
        println!("{}", serde_json::to_string(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No quotes match.");
        return Ok(());
    }

    for record in &records {
        print_record(record);
    }
    let pending = records.iter().filter(|r| !r.synced).count();
    if pending > 0 {
        println!();
        println!("{} {pending} waiting to be posted", "*".yellow());
    }

    Ok(())
}

/// Show one random quote from the filtered view.
pub fn random(ctx: &Context, filter: &FilterArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let mut rng = rand::thread_rng();
    let record = store.random(
        filter.keyword.as_deref(),
        filter.category.as_deref(),
        &mut rng,
    );

    if ctx.json {
        println!("{}", serde_json::to_string(&record)?);
        return Ok(());
    }

    match record {
        Some(record) => {
            println!("\"{}\"", record.content.text.bold());
            println!("  - {}", record.content.category);
        }
        None => println!("No quotes match."),
    }

    Ok(())
}

/// List distinct categories.
pub fn categories(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let categories = store.categories();

    if ctx.json {
        println!("{}", serde_json::to_string(&categories)?);
    } else {
        for category in categories {
            println!("{category}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import_accepts_aliases() {
        let entries = parse_import(
            r#"[{"text": "A", "category": "X"}, {"quote": "B", "author": "Y"}, {"text": "C"}]"#,
        )
        .unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1], ImportEntry::new("B", "Y"));
        assert_eq!(entries[2].category, None);
    }

    #[test]
    fn test_parse_import_keeps_batch_with_non_object_entry() {
        let entries = parse_import(r#"[{"text": "A", "category": "X"}, 42, null]"#).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], ImportEntry::new("A", "X"));
        assert_eq!(entries[1], ImportEntry::default());
        assert_eq!(entries[2], ImportEntry::default());
    }

    #[test]
    fn test_parse_import_keeps_batch_with_wrong_field_type() {
        let entries =
            parse_import(r#"[{"text": "A", "category": "X"}, {"text": 5, "category": "Y"}]"#)
                .unwrap();
        assert_eq!(entries.len(), 2);

        let sink = std::sync::Arc::new(crate::status::MemorySink::new());
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut store =
            crate::store::RecordStore::open(temp_dir.path().join("records.json"), sink).unwrap();
        let before = store.records().len();

        let stats = store.import(entries);
        assert_eq!(stats.added, 1);
        assert_eq!(stats.invalid, 1);
        assert_eq!(store.records().len(), before + 1);
    }

    #[test]
    fn test_parse_import_rejects_non_array() {
        let err = parse_import(r#"{"text": "A"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_latest_with_content_prefers_last_slot() {
        let content = Content::new("A", "X");
        let first = Record::from_remote(1, content.clone(), chrono::Utc::now());
        let second = Record::new_local(content.clone());

        let found = latest_with_content(&[first, second.clone()], &content).unwrap();
        assert_eq!(found.id, second.id);
    }
}
