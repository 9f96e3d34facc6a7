//! Remote collection access.
//!
//! Two layers:
//!
//! - [`RemoteEndpoint`] - the fallible transport: list every remote record,
//!   create one record. Implemented by [`HttpEndpoint`] and [`MemoryEndpoint`].
//! - [`RemoteGateway`] - wraps an endpoint with the recovery contract the sync
//!   core relies on: `fetch_all` and `post_one` never fail past this boundary.
//!   Transport errors are reported to the [`StatusSink`] and degrade to "no
//!   remote data this cycle" or "record stays unsynced".

mod http;
mod memory;

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::model::{Content, Record};
use crate::status::StatusSink;

pub use http::HttpEndpoint;
pub use memory::MemoryEndpoint;

/// Transport-level failures. Never escapes [`RemoteGateway`].
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The request could not be sent or timed out.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("{message} ({status})")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error text extracted from the body.
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The endpoint is not reachable (used by in-process endpoints).
    #[error("endpoint unavailable: {0}")]
    Unavailable(String),
}

/// Result type for endpoint operations.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// A remote collection supporting "list all" and "create one".
///
/// Implementations translate their wire representation into [`Record`]s; the
/// rest of the crate never sees raw payloads.
pub trait RemoteEndpoint: Send + Sync {
    /// Human-readable location, used in status messages.
    fn location(&self) -> &str;

    /// Fetch every record the remote holds.
    fn list(&self) -> impl Future<Output = RemoteResult<Vec<Record>>> + Send;

    /// Create a record with `content`, returning the remote-assigned id.
    fn create(&self, content: &Content) -> impl Future<Output = RemoteResult<u64>> + Send;
}

impl<E: RemoteEndpoint> RemoteEndpoint for Arc<E> {
    fn location(&self) -> &str {
        (**self).location()
    }

    fn list(&self) -> impl Future<Output = RemoteResult<Vec<Record>>> + Send {
        (**self).list()
    }

    fn create(&self, content: &Content) -> impl Future<Output = RemoteResult<u64>> + Send {
        (**self).create(content)
    }
}

/// Result of [`RemoteGateway::fetch_all`].
///
/// An empty `records` with `failed == true` means "no remote data available
/// this cycle", not "the remote is empty".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Records translated from the remote payload.
    pub records: Vec<Record>,
    /// True if the fetch failed and was recovered.
    pub failed: bool,
}

/// Endpoint wrapper implementing the never-fail fetch/post contract.
pub struct RemoteGateway<E> {
    endpoint: E,
    sink: Arc<dyn StatusSink>,
}

impl<E: RemoteEndpoint> RemoteGateway<E> {
    /// Wrap `endpoint`, reporting recovered failures to `sink`.
    pub fn new(endpoint: E, sink: Arc<dyn StatusSink>) -> Self {
        Self { endpoint, sink }
    }

    /// The wrapped endpoint.
    pub const fn endpoint(&self) -> &E {
        &self.endpoint
    }

    /// Fetch all remote records.
    ///
    /// On any error the sink is notified and an empty, `failed` outcome is
    /// returned.
    pub async fn fetch_all(&self) -> FetchOutcome {
        match self.endpoint.list().await {
            Ok(records) => {
                debug!(count = records.len(), location = self.endpoint.location(), "Fetched remote records");
                FetchOutcome {
                    records,
                    failed: false,
                }
            }
            Err(e) => {
                warn!(error = %e, location = self.endpoint.location(), "Fetch failed");
                self.sink.notify(
                    &format!(
                        "Could not fetch records from {}: {e}. Local records are unchanged.",
                        self.endpoint.location()
                    ),
                    true,
                );
                FetchOutcome {
                    records: Vec::new(),
                    failed: true,
                }
            }
        }
    }

    /// Post one record if it is not synced yet.
    ///
    /// Already-synced records return `true` without touching the network. On
    /// success the record carries the remote id, is marked synced and gets a
    /// fresh `updated_at`. On failure it is left unchanged and `false` is
    /// returned.
    pub async fn post_one(&self, record: &mut Record) -> bool {
        if record.synced {
            return true;
        }

        match self.endpoint.create(&record.content).await {
            Ok(remote_id) => {
                debug!(local = %record.id, remote = remote_id, "Posted record");
                record.confirm(remote_id);
                true
            }
            Err(e) => {
                warn!(id = %record.id, error = %e, "Post failed");
                self.sink.notify(
                    &format!(
                        "Could not post \"{}\": {e}. It stays queued and will be retried on the next sync.",
                        truncate(&record.content.text, 40)
                    ),
                    true,
                );
                false
            }
        }
    }
}

/// Shorten `text` to at most `max` characters for messages.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordId;
    use crate::status::MemorySink;

    fn gateway(endpoint: Arc<MemoryEndpoint>) -> (RemoteGateway<Arc<MemoryEndpoint>>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (RemoteGateway::new(endpoint, sink.clone()), sink)
    }

    #[tokio::test]
    async fn test_post_one_skips_synced_records() {
        let endpoint = Arc::new(MemoryEndpoint::new());
        let (gateway, _) = gateway(endpoint.clone());

        let mut record = Record::from_remote(3, Content::new("A", "X"), chrono::Utc::now());
        let before = record.clone();

        assert!(gateway.post_one(&mut record).await);
        assert_eq!(endpoint.create_calls(), 0);
        assert_eq!(record, before);
    }

    #[tokio::test]
    async fn test_post_one_skips_synced_even_when_remote_is_down() {
        let endpoint = Arc::new(MemoryEndpoint::new());
        endpoint.set_fail_create(true);
        let (gateway, sink) = gateway(endpoint.clone());

        let mut record = Record::from_remote(3, Content::new("A", "X"), chrono::Utc::now());
        assert!(gateway.post_one(&mut record).await);
        assert_eq!(endpoint.create_calls(), 0);
        assert!(sink.errors().is_empty());
    }

    #[tokio::test]
    async fn test_post_one_confirms_record() {
        let endpoint = Arc::new(MemoryEndpoint::starting_at(55));
        let (gateway, _) = gateway(endpoint.clone());

        let mut record = Record::new_local(Content::new("C", "Z"));
        assert!(gateway.post_one(&mut record).await);

        assert_eq!(record.id, RecordId::Remote(55));
        assert!(record.synced);
        assert_eq!(endpoint.create_calls(), 1);
        assert_eq!(endpoint.records().len(), 1);
    }

    #[tokio::test]
    async fn test_post_one_failure_leaves_record_unchanged() {
        let endpoint = Arc::new(MemoryEndpoint::new());
        endpoint.set_fail_create(true);
        let (gateway, sink) = gateway(endpoint);

        let mut record = Record::new_local(Content::new("C", "Z"));
        let before = record.clone();

        assert!(!gateway.post_one(&mut record).await);
        assert_eq!(record, before);
        let errors = sink.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("retried"));
    }

    #[tokio::test]
    async fn test_fetch_all_recovers_from_errors() {
        let endpoint = Arc::new(MemoryEndpoint::new());
        endpoint.set_fail_list(true);
        let (gateway, sink) = gateway(endpoint);

        let outcome = gateway.fetch_all().await;
        assert!(outcome.failed);
        assert!(outcome.records.is_empty());
        assert_eq!(sink.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_all_returns_remote_records() {
        let endpoint = Arc::new(MemoryEndpoint::with_records(vec![Record::from_remote(
            1,
            Content::new("A", "X"),
            chrono::Utc::now(),
        )]));
        let (gateway, sink) = gateway(endpoint);

        let outcome = gateway.fetch_all().await;
        assert!(!outcome.failed);
        assert_eq!(outcome.records.len(), 1);
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
