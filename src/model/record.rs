//! Record model for quotesync.
//!
//! A record is the unit of synchronization: a quote's content plus the
//! metadata needed to reconcile it against the remote collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix used for client-generated ids.
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Record identifier.
///
/// Serialized untagged: remote ids are JSON numbers, local-pending ids are
/// strings, so the snapshot stays readable (`"id": 55` vs `"id": "local-..."`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Assigned by the remote system. Authoritative once present.
    Remote(u64),
    /// Client-generated placeholder, not yet confirmed by the remote.
    Local(String),
}

impl RecordId {
    /// Generate a fresh local-pending id.
    #[must_use]
    pub fn new_local() -> Self {
        Self::Local(format!("{LOCAL_ID_PREFIX}{}", uuid::Uuid::new_v4()))
    }

    /// True for ids the remote system has not confirmed yet.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    /// The remote-assigned id, if any.
    #[must_use]
    pub const fn remote(&self) -> Option<u64> {
        match self {
            Self::Remote(id) => Some(*id),
            Self::Local(_) => None,
        }
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(id) => write!(f, "{id}"),
            Self::Local(id) => write!(f, "{id}"),
        }
    }
}

/// Payload fields compared for equality during merge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Content {
    /// The quote text.
    pub text: String,
    /// Free-form category, often the author.
    pub category: String,
}

impl Content {
    /// Build content from anything string-like.
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
        }
    }

    /// Both required fields are present and non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.text.trim().is_empty() && !self.category.trim().is_empty()
    }

    /// Case-insensitive keyword match over text and category.
    ///
    /// `keyword` must already be lowercased.
    #[must_use]
    pub fn matches(&self, keyword: &str) -> bool {
        self.text.to_lowercase().contains(keyword)
            || self.category.to_lowercase().contains(keyword)
    }
}

/// A quote record with sync metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Local-pending or remote id. Rewritten in place on confirmation.
    pub id: RecordId,
    /// Payload.
    #[serde(flatten)]
    pub content: Content,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// True iff this state is known to match the remote.
    pub synced: bool,
}

impl Record {
    /// A new, unsynced record with a local-pending id.
    #[must_use]
    pub fn new_local(content: Content) -> Self {
        Self {
            id: RecordId::new_local(),
            content,
            updated_at: Utc::now(),
            synced: false,
        }
    }

    /// A record as reported by the remote system.
    #[must_use]
    pub const fn from_remote(id: u64, content: Content, updated_at: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::Remote(id),
            content,
            updated_at,
            synced: true,
        }
    }

    /// Unsynced and still carrying a local-pending id.
    #[must_use]
    pub const fn is_pending_post(&self) -> bool {
        !self.synced && self.id.is_pending()
    }

    /// Accept the remote-assigned id after a successful post.
    pub fn confirm(&mut self, remote_id: u64) {
        self.id = RecordId::Remote(remote_id);
        self.synced = true;
        self.updated_at = Utc::now();
    }
}
