//! Sync cycle driver.
//!
//! A cycle fetches the remote listing, merges it into the store, persists
//! if anything changed, posts every unsynced record and reports one summary.
//! At most one cycle runs at a time; triggers arriving while one is in
//! flight are skipped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::merge::merge;
use super::types::{ChangeReport, ConflictPolicy, CycleOutcome, SyncState};
use crate::error::Result;
use crate::model::Content;
use crate::remote::{RemoteEndpoint, RemoteGateway};
use crate::status::StatusSink;
use crate::store::{AddOutcome, ImportEntry, ImportStats, RecordStore};

/// Releases the in-flight flag and resets the state when a cycle ends,
/// including on early return.
struct CycleGuard<'a> {
    in_flight: &'a AtomicBool,
    state: &'a std::sync::Mutex<SyncState>,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            *state = SyncState::Idle;
        }
        self.in_flight.store(false, Ordering::Release);
    }
}

/// A running periodic schedule.
struct Periodic {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Coordinates the store, the remote gateway and the status sink.
pub struct SyncOrchestrator<E> {
    store: Mutex<RecordStore>,
    gateway: RemoteGateway<E>,
    sink: Arc<dyn StatusSink>,
    policy: ConflictPolicy,
    in_flight: AtomicBool,
    state: std::sync::Mutex<SyncState>,
    periodic: std::sync::Mutex<Option<Periodic>>,
}

impl<E: RemoteEndpoint> SyncOrchestrator<E> {
    /// Build an orchestrator over an opened store.
    pub fn new(
        store: RecordStore,
        endpoint: E,
        sink: Arc<dyn StatusSink>,
        policy: ConflictPolicy,
    ) -> Self {
        Self {
            store: Mutex::new(store),
            gateway: RemoteGateway::new(endpoint, Arc::clone(&sink)),
            sink,
            policy,
            in_flight: AtomicBool::new(false),
            state: std::sync::Mutex::new(SyncState::Idle),
            periodic: std::sync::Mutex::new(None),
        }
    }

    /// The store, for read-only views. Holding the lock blocks cycles.
    pub const fn store(&self) -> &Mutex<RecordStore> {
        &self.store
    }

    /// The wrapped endpoint.
    pub const fn endpoint(&self) -> &E {
        self.gateway.endpoint()
    }

    /// Current phase.
    pub fn state(&self) -> SyncState {
        self.state.lock().map(|s| *s).unwrap_or_default()
    }

    fn set_state(&self, next: SyncState) {
        if let Ok(mut state) = self.state.lock() {
            let from = *state;
            debug!(%from, to = %next, "Sync state");
            *state = next;
        }
    }

    fn try_begin(&self) -> Option<CycleGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| CycleGuard {
                in_flight: &self.in_flight,
                state: &self.state,
            })
    }

    /// Run one full cycle.
    ///
    /// Returns [`CycleOutcome::Skipped`] without doing anything if another
    /// cycle is in flight. Remote and persistence failures are reported to
    /// the sink; the cycle still completes.
    pub async fn sync_now(&self) -> CycleOutcome {
        let Some(_guard) = self.try_begin() else {
            debug!("Sync already running, ignoring trigger");
            self.sink
                .notify("Sync already in progress; skipping this trigger", false);
            return CycleOutcome::Skipped;
        };

        let mut store = self.store.lock().await;

        self.set_state(SyncState::Fetching);
        let fetched = self.gateway.fetch_all().await;

        self.set_state(SyncState::Merging);
        let outcome = merge(store.records(), &fetched.records, self.policy);
        for conflict in &outcome.conflicts {
            self.sink.notify(
                &format!(
                    "Conflict: local record {} and remote record {} share the same content; resolve manually",
                    conflict.local_id, conflict.remote_id
                ),
                false,
            );
        }
        let mut report = ChangeReport {
            fetch_failed: fetched.failed,
            ..outcome.report
        };

        self.set_state(SyncState::Persisting);
        let changed = store.replace(outcome.records);
        if changed || store.is_dirty() {
            // Failures are already reported by the store.
            let _ = store.persist();
        } else {
            debug!("Merged collection unchanged, skipping persist");
        }

        self.set_state(SyncState::Posting);
        let (posted, failed) = self.post_unsynced(&mut store).await;
        report.posted = posted;
        report.failed_posts = failed;
        if posted > 0 {
            let _ = store.persist();
        }
        drop(store);

        self.set_state(SyncState::Reporting);
        info!(
            added = report.added,
            updated = report.updated,
            posted = report.posted,
            conflicts = report.conflicts,
            failed_posts = report.failed_posts,
            "Sync cycle finished"
        );
        self.sink.notify(&report.summary(), false);

        CycleOutcome::Completed(report)
    }

    /// Post every unsynced record sequentially. Returns `(posted, failed)`.
    ///
    /// The store is marked dirty as soon as a record is confirmed.
    async fn post_unsynced(&self, store: &mut RecordStore) -> (usize, usize) {
        let mut posted = 0;
        let mut failed = 0;
        for index in 0..store.records().len() {
            if store.records()[index].synced {
                continue;
            }
            if self.gateway.post_one(&mut store.records_mut()[index]).await {
                store.mark_dirty();
                posted += 1;
            } else {
                failed += 1;
            }
        }
        (posted, failed)
    }

    /// Post pending records without fetching.
    ///
    /// Returns the number of records posted; zero if a cycle is in flight,
    /// since that cycle posts them anyway.
    pub async fn push_pending(&self) -> usize {
        let Some(_guard) = self.try_begin() else {
            debug!("Sync running, leaving pending records to it");
            return 0;
        };

        let mut store = self.store.lock().await;
        if store.unsynced_count() == 0 {
            return 0;
        }

        self.set_state(SyncState::Posting);
        let (posted, failed) = self.post_unsynced(&mut store).await;
        if posted > 0 {
            let _ = store.persist();
            self.sink.notify(&format!("Posted {posted} record(s)"), false);
        }
        if failed > 0 {
            warn!(failed, "Some records could not be posted");
        }
        posted
    }

    /// Add one record, persist it and try to post it.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is invalid or the snapshot cannot be
    /// written. Post failures are not errors; the record stays queued.
    pub async fn add(&self, content: Content) -> Result<AddOutcome> {
        let outcome = {
            let mut store = self.store.lock().await;
            let outcome = store.add(content)?;
            if let AddOutcome::Added(record) = &outcome {
                self.sink
                    .notify(&format!("Added \"{}\"", record.content.text), false);
                store.persist()?;
            }
            outcome
        };

        if matches!(outcome, AddOutcome::Added(_)) {
            self.push_pending().await;
        }
        Ok(outcome)
    }

    /// Add a batch of entries, persist and try to post them.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    pub async fn import(&self, entries: Vec<ImportEntry>) -> Result<ImportStats> {
        let stats = {
            let mut store = self.store.lock().await;
            let stats = store.import(entries);
            self.sink.notify(
                &format!(
                    "Imported {} record(s) ({} duplicate, {} invalid)",
                    stats.added, stats.duplicates, stats.invalid
                ),
                false,
            );
            if stats.added > 0 {
                store.persist()?;
            }
            stats
        };

        if stats.added > 0 {
            self.push_pending().await;
        }
        Ok(stats)
    }
}

impl<E: RemoteEndpoint + 'static> SyncOrchestrator<E> {
    /// Run a cycle every `interval`, starting one interval from now.
    ///
    /// Replaces any previously started schedule; a cycle the old schedule
    /// is running finishes first. The task holds only a weak reference and
    /// ends once the orchestrator is dropped.
    pub fn start_periodic(self: &Arc<Self>, interval: Duration) {
        self.stop_periodic();

        let (stop, mut stopped) = watch::channel(false);
        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = stopped.changed() => break,
                    _ = ticker.tick() => {}
                }
                let Some(orchestrator) = weak.upgrade() else {
                    break;
                };
                orchestrator.sync_now().await;
            }
            debug!("Periodic sync loop ended");
        });

        info!(interval_secs = interval.as_secs_f64(), "Periodic sync started");
        if let Ok(mut slot) = self.periodic.lock() {
            *slot = Some(Periodic { stop, handle });
        }
    }
}

impl<E> SyncOrchestrator<E> {
    /// Stop the periodic schedule, if any. No further cycle starts; one
    /// already running completes normally.
    pub fn stop_periodic(&self) {
        if let Ok(mut slot) = self.periodic.lock() {
            if let Some(periodic) = slot.take() {
                let _ = periodic.stop.send(true);
                debug!("Periodic sync stopped");
            }
        }
    }

    /// True while a periodic schedule is active.
    pub fn is_periodic(&self) -> bool {
        self.periodic
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|p| !p.handle.is_finished()))
            .unwrap_or(false)
    }
}

impl<E> Drop for SyncOrchestrator<E> {
    fn drop(&mut self) {
        self.stop_periodic();
    }
}
