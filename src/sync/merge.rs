//! Reconciliation of the local collection against a remote listing.
//!
//! [`merge`] is pure: it reads both sides and returns the reconciled
//! collection together with the counts for the cycle report. Persisting and
//! posting are left to the orchestrator.

use tracing::{debug, warn};

use super::types::{ChangeReport, Conflict, ConflictPolicy};
use crate::model::Record;

/// Result of one merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// The reconciled collection, local slot order first, remote additions
    /// appended.
    pub records: Vec<Record>,
    /// Counts for the cycle report. `posted` is always zero here.
    pub report: ChangeReport,
    /// Same-content pairs left unresolved under [`ConflictPolicy::Flag`].
    pub conflicts: Vec<Conflict>,
}

impl MergeOutcome {
    /// Indices of records still waiting to be posted.
    #[must_use]
    pub fn pending(&self) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.synced)
            .map(|(i, _)| i)
            .collect()
    }
}

/// How a remote record pairs with a local slot.
enum Pairing {
    /// Same id, same content.
    Reconciled(usize),
    /// Same content, local id never confirmed.
    Pending(usize),
    /// Same id, content changed on one side.
    Edited(usize),
    /// Same content, different confirmed id.
    Ambiguous(usize),
    Unmatched,
}

/// First unclaimed slot satisfying `matches`.
fn find_open(
    records: &[Record],
    claimed: &[bool],
    matches: impl Fn(&Record) -> bool,
) -> Option<usize> {
    records
        .iter()
        .enumerate()
        .find(|(i, r)| !claimed[*i] && matches(r))
        .map(|(i, _)| i)
}

fn pair(records: &[Record], claimed: &[bool], remote: &Record) -> Pairing {
    if let Some(i) = find_open(records, claimed, |l| {
        l.id == remote.id && l.content == remote.content
    }) {
        return Pairing::Reconciled(i);
    }
    if let Some(i) = find_open(records, claimed, |l| {
        l.id.is_pending() && l.content == remote.content
    }) {
        return Pairing::Pending(i);
    }
    if let Some(i) = find_open(records, claimed, |l| l.id == remote.id) {
        return Pairing::Edited(i);
    }
    if let Some(i) = find_open(records, claimed, |l| l.content == remote.content) {
        return Pairing::Ambiguous(i);
    }
    Pairing::Unmatched
}

/// Reconcile `local` against `remote`.
///
/// Each local slot pairs with at most one remote record. Remote records
/// without a remote id are ignored. After pairing, unsynced local-pending
/// records with identical content are collapsed into the first one.
#[must_use]
pub fn merge(local: &[Record], remote: &[Record], policy: ConflictPolicy) -> MergeOutcome {
    let mut records = local.to_vec();
    let mut claimed = vec![false; records.len()];
    let mut report = ChangeReport::default();
    let mut conflicts = Vec::new();

    for incoming in remote {
        let Some(remote_id) = incoming.id.remote() else {
            debug!(id = %incoming.id, "Ignoring remote record without a remote id");
            continue;
        };

        match pair(&records, &claimed, incoming) {
            Pairing::Reconciled(i) => {
                claimed[i] = true;
                records[i].synced = true;
            }
            Pairing::Pending(i) => {
                claimed[i] = true;
                let slot = &mut records[i];
                debug!(local = %slot.id, remote = remote_id, "Adopting remote id");
                slot.id = incoming.id.clone();
                slot.synced = true;
            }
            Pairing::Edited(i) => {
                claimed[i] = true;
                let slot = &mut records[i];
                if slot.synced || incoming.updated_at >= slot.updated_at {
                    slot.content = incoming.content.clone();
                    slot.updated_at = incoming.updated_at;
                    slot.synced = true;
                    report.updated += 1;
                } else {
                    debug!(id = %slot.id, "Local edit is newer, keeping it");
                }
            }
            Pairing::Ambiguous(i) => {
                claimed[i] = true;
                let slot = &mut records[i];
                match policy {
                    ConflictPolicy::Flag => {
                        warn!(local = %slot.id, remote = remote_id, "Same content under different ids");
                        conflicts.push(Conflict {
                            local_id: slot.id.clone(),
                            remote_id,
                            content: slot.content.clone(),
                        });
                    }
                    ConflictPolicy::LastWriteWins => {
                        if incoming.updated_at >= slot.updated_at {
                            slot.id = incoming.id.clone();
                            slot.updated_at = incoming.updated_at;
                            slot.synced = true;
                            report.updated += 1;
                        }
                    }
                }
            }
            Pairing::Unmatched => {
                let mut added = incoming.clone();
                added.synced = true;
                records.push(added);
                claimed.push(true);
                report.added += 1;
            }
        }
    }

    report.collapsed = collapse_pending(&mut records);
    report.conflicts = conflicts.len();

    MergeOutcome {
        records,
        report,
        conflicts,
    }
}

/// Drop later unsynced local-pending records whose content repeats an
/// earlier one. Returns how many were dropped.
fn collapse_pending(records: &mut Vec<Record>) -> usize {
    let before = records.len();
    let mut seen = std::collections::HashSet::new();
    records.retain(|r| !r.is_pending_post() || seen.insert(r.content.clone()));
    before - records.len()
}
