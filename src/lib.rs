//! quotesync - a local-first quote collection that syncs with a remote
//! JSON collection in the background.
//!
//! This crate provides the core functionality for the `qsync` CLI tool.
//!
//! # Architecture
//!
//! - [`store`] - In-memory record collection persisted as a JSON snapshot
//! - [`remote`] - Remote collection access (HTTP and in-memory endpoints)
//! - [`sync`] - Merge engine and sync orchestrator
//! - [`status`] - Status notification sinks
//! - [`model`] - Record, id and content types
//! - [`config`] - Configuration management
//! - [`cli`] - Command-line interface using clap
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod remote;
pub mod status;
pub mod store;
pub mod sync;

pub use error::{Error, Result};
