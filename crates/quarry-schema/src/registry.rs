//! Process-wide schema registry.
//!
//! The schema is published exactly once and is read-only afterwards, so reads
//! need no synchronization beyond the `OnceLock` itself.

use crate::{error::SchemaError, schema::Schema};
use std::sync::OnceLock;

static SCHEMA: OnceLock<Schema> = OnceLock::new();

/// Publish the process schema. Fails if a schema was already installed.
pub fn install(schema: Schema) -> Result<&'static Schema, SchemaError> {
    SCHEMA
        .set(schema)
        .map_err(|_| SchemaError::AlreadyInstalled)?;

    get()
}

/// Read the installed schema.
pub fn get() -> Result<&'static Schema, SchemaError> {
    SCHEMA.get().ok_or(SchemaError::NotInstalled)
}

#[must_use]
pub fn is_installed() -> bool {
    SCHEMA.get().is_some()
}
