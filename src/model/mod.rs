//! Data models for quotesync.
//!
//! - [`Record`] - a quote plus its sync metadata
//! - [`RecordId`] - local-pending or remote-assigned identifier
//! - [`Content`] - the payload compared during merge

pub mod record;

pub use record::{Content, LOCAL_ID_PREFIX, Record, RecordId};
