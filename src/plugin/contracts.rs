//! Extension contracts: the attachment points concrete plugins override.
//!
//! Every method here is a placeholder that raises `NotImplemented` until a
//! plugin provides it. The engines call into these polymorphically and
//! carry no knowledge of their internals; an unoverridden method reaching
//! production is a programmer error, so the error is always raised and
//! never caught by the substrate.

use serde_json::Value;

use super::ClientIdentity;
use crate::{Error, Result};

/// Produces concrete configuration entries for clients.
pub trait Generator {
    /// Fill in one abstract entry for a client.
    ///
    /// # Errors
    ///
    /// Raises `NotImplemented` until overridden.
    fn handle_entry(&self, _entry: &mut Value, _client: &ClientIdentity) -> Result<()> {
        Err(Error::NotImplemented("Generator::handle_entry"))
    }
}

/// Assembles the abstract structure list for a client.
pub trait Structure {
    /// Build the list of structures a client should receive.
    ///
    /// # Errors
    ///
    /// Raises `NotImplemented` until overridden.
    fn build_structures(&self, _client: &ClientIdentity) -> Result<Vec<Value>> {
        Err(Error::NotImplemented("Structure::build_structures"))
    }
}

/// Owns client metadata: initial construction and merging of data supplied
/// by connector plugins.
pub trait Metadata {
    /// Build the initial metadata for a hostname.
    ///
    /// # Errors
    ///
    /// Raises `NotImplemented` until overridden.
    fn get_initial_metadata(&self, _hostname: &str) -> Result<ClientIdentity> {
        Err(Error::NotImplemented("Metadata::get_initial_metadata"))
    }

    /// Merge additional data from a named source into a client's metadata.
    ///
    /// # Errors
    ///
    /// Raises `NotImplemented` until overridden.
    fn merge_additional_data(
        &self,
        _client: &mut ClientIdentity,
        _source: &str,
        _data: Value,
    ) -> Result<()> {
        Err(Error::NotImplemented("Metadata::merge_additional_data"))
    }

    /// Merge additional group membership into a client's metadata.
    ///
    /// # Errors
    ///
    /// Raises `NotImplemented` until overridden.
    fn merge_additional_groups(
        &self,
        _client: &mut ClientIdentity,
        _groups: &[String],
    ) -> Result<()> {
        Err(Error::NotImplemented("Metadata::merge_additional_groups"))
    }
}

/// Source side of pull-mode negotiation.
pub trait PullSource {
    /// Report the current state of one entry on a client.
    ///
    /// # Errors
    ///
    /// Raises `NotImplemented` until overridden.
    fn get_current_entry(
        &self,
        _client: &ClientIdentity,
        _entry_type: &str,
        _entry_name: &str,
    ) -> Result<Value> {
        Err(Error::NotImplemented("PullSource::get_current_entry"))
    }
}

/// Target side of pull-mode negotiation.
pub trait PullTarget {
    /// Choose among candidate entry states.
    ///
    /// # Errors
    ///
    /// Raises `NotImplemented` until overridden.
    fn accept_choices(&self, _client: &ClientIdentity, _choices: &[Value]) -> Result<Value> {
        Err(Error::NotImplemented("PullTarget::accept_choices"))
    }

    /// Accept pulled entry data into the repository.
    ///
    /// # Errors
    ///
    /// Raises `NotImplemented` until overridden.
    fn accept_pull_data(
        &self,
        _client: &ClientIdentity,
        _entry: &Value,
        _metadata: &Value,
    ) -> Result<()> {
        Err(Error::NotImplemented("PullTarget::accept_pull_data"))
    }
}

/// Validates assembled structures before generation.
pub trait StructureValidator {
    /// Validate (and possibly rewrite) a client's structure list.
    ///
    /// # Errors
    ///
    /// Raises `NotImplemented` until overridden.
    fn validate_structures(
        &self,
        _client: &ClientIdentity,
        _structures: &mut [Value],
    ) -> Result<()> {
        Err(Error::NotImplemented("StructureValidator::validate_structures"))
    }
}

/// Validates fully bound configuration goals.
pub trait GoalValidator {
    /// Validate a client's final configuration.
    ///
    /// # Errors
    ///
    /// Raises `NotImplemented` until overridden.
    fn validate_goals(&self, _client: &ClientIdentity, _goals: &[Value]) -> Result<()> {
        Err(Error::NotImplemented("GoalValidator::validate_goals"))
    }
}
