//! Local-remote synchronization.
//!
//! - **Merge**: reconcile the local collection against a remote listing
//! - **Orchestrator**: run fetch/merge/persist/post cycles, on demand or on
//!   a schedule, one at a time
//!
//! # Cycle
//!
//! ```text
//! Idle -> Fetching -> Merging -> Persisting -> Posting -> Reporting -> Idle
//! ```
//!
//! Remote failures never abort a cycle: a failed fetch counts as "no remote
//! data" and a failed post leaves the record queued for the next cycle.
//!
//! # Example
//!
//! ```ignore
//! use qsync::remote::HttpEndpoint;
//! use qsync::sync::{ConflictPolicy, SyncOrchestrator};
//!
//! let endpoint = HttpEndpoint::new(&settings.endpoint, settings.timeout)?;
//! let orchestrator = SyncOrchestrator::new(store, endpoint, sink, ConflictPolicy::Flag);
//! let outcome = orchestrator.sync_now().await;
//! ```

mod merge;
mod orchestrator;
mod types;

pub use merge::{MergeOutcome, merge};
pub use orchestrator::SyncOrchestrator;
pub use types::{ChangeReport, Conflict, ConflictPolicy, CycleOutcome, SyncState};
