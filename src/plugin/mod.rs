//! Plugin base machinery and the contracts plugins implement.
//!
//! The hosting core is consumed through [`ServerCore`]: a cooperative
//! termination signal, client-identity reconstruction, and configuration
//! access. [`PluginBase`] carries the state every plugin shares (name,
//! datastore-derived data directory, core reference, debug flag). The
//! traits in [`contracts`] define the attachment points the engines
//! dispatch into; they carry no algorithmic content here.

mod contracts;

pub use contracts::{
    Generator, GoalValidator, Metadata, PullSource, PullTarget, Structure, StructureValidator,
};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::debug::Debuggable;
use crate::{Config, Error, Result};

/// Opaque identity of a managed node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    hostname: String,
}

impl ClientIdentity {
    /// Create an identity for a hostname.
    #[must_use]
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
        }
    }

    /// The client's hostname.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }
}

/// Surface of the hosting core consumed by plugins.
pub trait ServerCore: Send + Sync {
    /// Cooperative termination signal; workers poll it, nothing cancels
    /// them preemptively.
    fn termination(&self) -> &CancellationToken;

    /// Reconstruct a client identity from its hostname string.
    ///
    /// # Errors
    ///
    /// Returns an error if the hostname maps to no known client.
    fn build_identity(&self, hostname: &str) -> Result<ClientIdentity>;

    /// Server configuration.
    fn config(&self) -> &Config;
}

/// State shared by every plugin: name, data directory, core reference.
pub struct PluginBase {
    name: &'static str,
    data: PathBuf,
    core: Arc<dyn ServerCore>,
    debug: AtomicBool,
}

impl PluginBase {
    /// Create the base for a named plugin.
    ///
    /// The data directory is derived from the repository root and the
    /// plugin's name; it is not created here, see [`PluginBase::init_repo`].
    #[must_use]
    pub fn new(name: &'static str, core: Arc<dyn ServerCore>) -> Self {
        let data = core.config().plugin_data_dir(name);
        Self {
            name,
            data,
            core,
            debug: AtomicBool::new(false),
        }
    }

    /// Create a plugin's directory inside the repository.
    ///
    /// # Errors
    ///
    /// Returns an `Init` error if the directory cannot be created.
    pub fn init_repo(config: &Config, name: &str) -> Result<()> {
        let dir = config.plugin_data_dir(name);
        fs::create_dir_all(&dir).map_err(|e| {
            Error::init(format!(
                "failed to create plugin directory '{}': {e}",
                dir.display()
            ))
        })
    }

    /// Plugin name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Plugin data directory inside the repository.
    #[must_use]
    pub fn data(&self) -> &Path {
        &self.data
    }

    /// The hosting core.
    #[must_use]
    pub fn core(&self) -> &Arc<dyn ServerCore> {
        &self.core
    }
}

impl Debuggable for PluginBase {
    fn debug_flag(&self) -> &AtomicBool {
        &self.debug
    }

    fn component_name(&self) -> &str {
        self.name
    }
}
