//! Command implementations.
//!
//! Every command is synchronous at the edge: commands that talk to the
//! remote build a tokio runtime and block on the async core.

pub mod completions;
pub mod config;
pub mod records;
pub mod status;
pub mod sync;

use std::sync::Arc;

use crate::cli::Cli;
use crate::config::{Settings, load_config};
use crate::error::{Error, Result};
use crate::remote::HttpEndpoint;
use crate::status::{ConsoleSink, StatusSink, TracingSink};
use crate::store::RecordStore;
use crate::sync::SyncOrchestrator;

/// Per-invocation state shared by the command handlers.
pub struct Context {
    pub settings: Settings,
    pub json: bool,
    pub offline: bool,
    pub sink: Arc<dyn StatusSink>,
}

impl Context {
    /// Resolve settings and pick a status sink for this invocation.
    ///
    /// JSON mode routes status messages through tracing so stdout stays
    /// machine-readable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or resolved.
    pub fn from_cli(cli: &Cli, json: bool) -> Result<Self> {
        let config = load_config()?;
        let settings = Settings::resolve(cli.store.as_deref(), cli.endpoint.as_deref(), &config)?;
        let sink: Arc<dyn StatusSink> = if json {
            Arc::new(TracingSink)
        } else {
            Arc::new(ConsoleSink::new(cli.quiet))
        };

        Ok(Self {
            settings,
            json,
            offline: cli.offline,
            sink,
        })
    }

    /// Open the record store.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot exists but cannot be read.
    pub fn open_store(&self) -> Result<RecordStore> {
        RecordStore::open(&self.settings.store_path, Arc::clone(&self.sink))
    }

    /// Build an orchestrator over the HTTP endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or the HTTP client
    /// cannot be built.
    pub fn orchestrator(&self) -> Result<SyncOrchestrator<HttpEndpoint>> {
        let store = self.open_store()?;
        let endpoint = HttpEndpoint::new(&self.settings.endpoint, self.settings.timeout)
            .map_err(|e| Error::Sync(format!("Failed to create HTTP client: {e}")))?;

        Ok(SyncOrchestrator::new(
            store,
            endpoint,
            Arc::clone(&self.sink),
            self.settings.conflict_policy,
        ))
    }

    /// Refuse to continue when `--offline` is set.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` in offline mode.
    pub fn require_online(&self, command: &str) -> Result<()> {
        if self.offline {
            return Err(Error::InvalidArgument(format!(
                "`{command}` needs the remote; drop --offline"
            )));
        }
        Ok(())
    }
}

/// Build the async runtime used by network commands.
///
/// # Errors
///
/// Returns `Error::Other` if the runtime cannot be created.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))
}
