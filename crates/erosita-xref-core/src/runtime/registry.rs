// crates/erosita-xref-core/src/runtime/registry.rs
// ============================================================================
// Module: Database Registry
// Description: Name-keyed table of reference database descriptors and clients.
// Purpose: Resolve a database name to its descriptor and behavior once per run.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Each supported reference database is one [`DatabaseEntry`]: an immutable
//! [`DatabaseDescriptor`] paired with the [`RemoteCatalogClient`] that talks
//! to it. Entries are validated on registration and looked up by name at
//! dispatch time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::DatabaseDescriptor;
use crate::core::DatabaseName;
use crate::interfaces::RemoteCatalogClient;
use crate::runtime::error::XrefError;

// ============================================================================
// SECTION: Entries
// ============================================================================

/// Descriptor plus client for one reference database.
#[derive(Clone)]
pub struct DatabaseEntry {
    /// Immutable database descriptor.
    pub descriptor: DatabaseDescriptor,
    /// Client used for cone searches.
    pub client: Arc<dyn RemoteCatalogClient>,
}

impl DatabaseEntry {
    /// Creates a registry entry.
    #[must_use]
    pub fn new(descriptor: DatabaseDescriptor, client: Arc<dyn RemoteCatalogClient>) -> Self {
        Self {
            descriptor,
            client,
        }
    }

    /// Returns the database name.
    #[must_use]
    pub const fn name(&self) -> &DatabaseName {
        &self.descriptor.name
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Registry of reference databases keyed by case-folded name.
#[derive(Clone, Default)]
pub struct DatabaseRegistry {
    /// Entries keyed by upper-cased database name.
    entries: BTreeMap<String, DatabaseEntry>,
}

impl DatabaseRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a database, replacing any entry whose name differs only in
    /// case.
    ///
    /// # Errors
    ///
    /// Returns [`XrefError::InvalidRequest`] when the descriptor is invalid.
    pub fn register(&mut self, entry: DatabaseEntry) -> Result<(), XrefError> {
        entry.descriptor.validate().map_err(XrefError::InvalidRequest)?;
        self.entries.insert(registry_key(entry.name().as_str()), entry);
        Ok(())
    }

    /// Looks up a database by name, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`XrefError::UnknownDatabase`] when the name is not registered.
    pub fn lookup(&self, name: &str) -> Result<&DatabaseEntry, XrefError> {
        self.entries
            .get(&registry_key(name))
            .ok_or_else(|| XrefError::UnknownDatabase(name.to_string()))
    }

    /// Returns the registered database names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.values().map(|entry| entry.name().as_str()).collect()
    }

    /// Returns the number of registered databases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no databases are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Normalizes a database name for registry keys.
fn registry_key(name: &str) -> String {
    name.to_ascii_uppercase()
}
