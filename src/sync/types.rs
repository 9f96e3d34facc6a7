//! Sync types: policies, reports and cycle state.

use serde::{Deserialize, Serialize};

use crate::model::{Content, RecordId};

/// How to resolve a local record that is content-equal to a remote record
/// but already carries a different remote id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Leave the local record untouched and report the pair as a conflict
    /// needing manual resolution.
    #[default]
    Flag,
    /// Keep the identity of whichever side was modified last (`updated_at`).
    LastWriteWins,
}

impl std::fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flag => write!(f, "flag"),
            Self::LastWriteWins => write!(f, "last_write_wins"),
        }
    }
}

impl std::str::FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "flag" => Ok(Self::Flag),
            "last_write_wins" | "lww" => Ok(Self::LastWriteWins),
            _ => Err(format!(
                "Unknown conflict policy: {s} (expected flag or last_write_wins)"
            )),
        }
    }
}

/// A same-content, different-identity pair left for manual resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    /// Id of the untouched local record.
    pub local_id: RecordId,
    /// Id of the remote record with the same content.
    pub remote_id: u64,
    /// The shared content.
    pub content: Content,
}

/// Counts for one sync cycle. Never persisted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
    /// Remote records appended locally.
    pub added: usize,
    /// Local records whose fields changed to match the remote.
    pub updated: usize,
    /// Local records successfully created on the remote.
    pub posted: usize,
    /// Same-content pairs left unresolved.
    pub conflicts: usize,
    /// Duplicate pending records folded into their first occurrence.
    pub collapsed: usize,
    /// Posts that failed and stay queued.
    pub failed_posts: usize,
    /// The fetch step failed and was treated as "no remote data".
    pub fetch_failed: bool,
}

impl ChangeReport {
    /// True if nothing was added, updated or posted.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.added == 0 && self.updated == 0 && self.posted == 0
    }

    /// One-line summary for the status sink.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut message = if self.is_empty() {
            "Sync complete: no changes".to_string()
        } else {
            format!(
                "Sync complete: {} added, {} updated, {} posted",
                self.added, self.updated, self.posted
            )
        };

        if self.failed_posts > 0 {
            message.push_str(&format!("; {} waiting to retry", self.failed_posts));
        }
        if self.conflicts > 0 {
            message.push_str(&format!("; {} conflict(s) need attention", self.conflicts));
        }
        if self.fetch_failed {
            message.push_str(" (remote fetch failed)");
        }
        message
    }
}

/// Phase of the orchestrator's cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    #[default]
    Idle,
    Fetching,
    Merging,
    Persisting,
    Posting,
    Reporting,
}

impl SyncState {
    /// True while a cycle is running.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Merging => "merging",
            Self::Persisting => "persisting",
            Self::Posting => "posting",
            Self::Reporting => "reporting",
        };
        write!(f, "{name}")
    }
}

/// Result of a triggered cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The cycle ran to completion.
    Completed(ChangeReport),
    /// Another cycle was in flight; this trigger was ignored.
    Skipped,
}

impl CycleOutcome {
    /// The report, if the cycle ran.
    #[must_use]
    pub const fn report(&self) -> Option<&ChangeReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Skipped => None,
        }
    }
}
