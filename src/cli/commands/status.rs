//! Status command implementation.

use serde::Serialize;

use super::Context;
use crate::error::Result;

/// Output for status command.
#[derive(Serialize)]
struct StatusOutput<'a> {
    store_path: String,
    snapshot_exists: bool,
    endpoint: &'a str,
    record_count: usize,
    unsynced_count: usize,
    pending_ids: Vec<String>,
    category_count: usize,
    interval_secs: u64,
}

/// Execute status command.
pub fn execute(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let unsynced: Vec<String> = store
        .records()
        .iter()
        .filter(|r| !r.synced)
        .map(|r| r.id.to_string())
        .collect();

    let output = StatusOutput {
        store_path: store.path().display().to_string(),
        snapshot_exists: store.path().exists(),
        endpoint: &ctx.settings.endpoint,
        record_count: store.records().len(),
        unsynced_count: unsynced.len(),
        pending_ids: unsynced,
        category_count: store.categories().len(),
        interval_secs: ctx.settings.interval.as_secs(),
    };

    if ctx.json {
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("quotesync Status");
    println!("================");
    println!();
    println!("Store:    {}", output.store_path);
    if !output.snapshot_exists {
        println!("          (not written yet, showing default quotes)");
    }
    println!("Endpoint: {}", output.endpoint);
    println!("Interval: {}s", output.interval_secs);
    println!();
    println!("Records:    {}", output.record_count);
    println!("Categories: {}", output.category_count);
    if output.unsynced_count == 0 {
        println!("Everything is synced.");
    } else {
        println!("Waiting to be posted: {}", output.unsynced_count);
        for id in &output.pending_ids {
            println!("  {id}");
        }
        println!();
        println!("Post them with: qsync sync");
    }

    Ok(())
}
