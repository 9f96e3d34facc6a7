//! Record storage.
//!
//! The collection lives in memory inside a [`RecordStore`] and is persisted
//! as a single JSON document, rewritten atomically on every save.
//!
//! # Submodules
//!
//! - [`file`] - Atomic snapshot reads and writes
//! - [`record_store`] - The store itself, import validation and views
//! - [`seed`] - Default records for a fresh install

pub mod file;
pub mod record_store;
pub mod seed;

pub use record_store::{AddOutcome, ImportEntry, ImportStats, RecordStore, load};
