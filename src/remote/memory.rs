//! In-process endpoint.
//!
//! Holds the remote collection in memory. Failure toggles and call counters
//! make it suitable for exercising the sync core without a server.

use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;

use super::{RemoteEndpoint, RemoteError, RemoteResult};
use crate::model::{Content, Record};

#[derive(Debug)]
struct MemoryState {
    records: Vec<Record>,
    next_id: u64,
    fail_list: bool,
    fail_create: bool,
    list_calls: usize,
    create_calls: usize,
    delay: Duration,
}

/// A remote collection living in this process.
#[derive(Debug)]
pub struct MemoryEndpoint {
    state: Mutex<MemoryState>,
}

impl Default for MemoryEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEndpoint {
    /// An empty remote assigning ids from 1.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// An empty remote assigning ids from `first_id`.
    #[must_use]
    pub const fn starting_at(first_id: u64) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                records: Vec::new(),
                next_id: first_id,
                fail_list: false,
                fail_create: false,
                list_calls: 0,
                create_calls: 0,
                delay: Duration::ZERO,
            }),
        }
    }

    /// A remote pre-populated with `records`; new ids continue after the
    /// highest existing one.
    #[must_use]
    pub fn with_records(records: Vec<Record>) -> Self {
        let next_id = records
            .iter()
            .filter_map(|r| r.id.remote())
            .max()
            .map_or(1, |max| max + 1);
        let endpoint = Self::starting_at(next_id);
        endpoint.with_state(|s| s.records = records);
        endpoint
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> T {
        let mut guard = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }

    /// Make `list` fail until reset.
    pub fn set_fail_list(&self, fail: bool) {
        self.with_state(|s| s.fail_list = fail);
    }

    /// Make `create` fail until reset.
    pub fn set_fail_create(&self, fail: bool) {
        self.with_state(|s| s.fail_create = fail);
    }

    /// Delay every call by `delay`, simulating a slow network.
    pub fn set_delay(&self, delay: Duration) {
        self.with_state(|s| s.delay = delay);
    }

    /// Add a record directly on the remote side.
    pub fn insert(&self, record: Record) {
        self.with_state(|s| {
            if let Some(id) = record.id.remote() {
                s.next_id = s.next_id.max(id + 1);
            }
            s.records.push(record);
        });
    }

    /// Current remote records.
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.with_state(|s| s.records.clone())
    }

    /// Number of `list` calls so far.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.with_state(|s| s.list_calls)
    }

    /// Number of `create` calls so far.
    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.with_state(|s| s.create_calls)
    }

    fn delay(&self) -> Duration {
        self.with_state(|s| s.delay)
    }
}

impl RemoteEndpoint for MemoryEndpoint {
    fn location(&self) -> &str {
        "memory://"
    }

    async fn list(&self) -> RemoteResult<Vec<Record>> {
        let delay = self.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.with_state(|s| {
            s.list_calls += 1;
            if s.fail_list {
                Err(RemoteError::Unavailable("list disabled".into()))
            } else {
                Ok(s.records.clone())
            }
        })
    }

    async fn create(&self, content: &Content) -> RemoteResult<u64> {
        let delay = self.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.with_state(|s| {
            s.create_calls += 1;
            if s.fail_create {
                return Err(RemoteError::Unavailable("create disabled".into()));
            }
            let id = s.next_id;
            s.next_id += 1;
            s.records
                .push(Record::from_remote(id, content.clone(), Utc::now()));
            Ok(id)
        })
    }
}
