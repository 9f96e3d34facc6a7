//! Sync command implementations.
//!
//! `sync` runs a single cycle against the configured endpoint. `watch` keeps
//! a periodic schedule running until Ctrl-C and then runs a final cycle so
//! nothing queued is left behind.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use super::{Context, runtime};
use crate::error::{Error, Result};
use crate::sync::{ChangeReport, CycleOutcome};

#[derive(Serialize)]
struct SyncOutput<'a> {
    endpoint: &'a str,
    skipped: bool,
    report: Option<ChangeReport>,
    unsynced: usize,
}

/// Run one cycle now.
pub fn execute(ctx: &Context) -> Result<()> {
    ctx.require_online("sync")?;

    let orchestrator = ctx.orchestrator()?;
    let (outcome, unsynced) = runtime()?.block_on(async {
        let outcome = orchestrator.sync_now().await;
        let unsynced = orchestrator.store().lock().await.unsynced_count();
        (outcome, unsynced)
    });

    if ctx.json {
        let output = SyncOutput {
            endpoint: &ctx.settings.endpoint,
            skipped: outcome == CycleOutcome::Skipped,
            report: outcome.report().copied(),
            unsynced,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if unsynced > 0 {
        println!("{unsynced} record(s) still waiting to be posted");
    }

    Ok(())
}

/// Sync every `interval` seconds until Ctrl-C.
pub fn watch(ctx: &Context, interval: Option<u64>) -> Result<()> {
    ctx.require_online("watch")?;

    let interval = interval
        .map_or(ctx.settings.interval, |secs| Duration::from_secs(secs.max(1)));
    let orchestrator = Arc::new(ctx.orchestrator()?);

    runtime()?.block_on(async {
        orchestrator.sync_now().await;
        orchestrator.start_periodic(interval);
        if !ctx.json {
            println!(
                "Watching {} every {}s (Ctrl-C to stop)",
                ctx.settings.endpoint,
                interval.as_secs()
            );
        }

        tokio::signal::ctrl_c()
            .await
            .map_err(|e| Error::Other(format!("Failed to listen for Ctrl-C: {e}")))?;

        info!("Interrupted, running final sync");
        orchestrator.stop_periodic();
        orchestrator.sync_now().await;
        Ok::<(), Error>(())
    })
}
