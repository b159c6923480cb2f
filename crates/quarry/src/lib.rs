//! ## Crate layout
//! - `schema`: tables, typed columns, relations and the schema registry.
//! - `core`: expressions, statement builders, rendering, result mapping,
//!   sessions and the in-memory reference engine.
//! - `error`: the public error taxonomy.
//!
//! The `prelude` module is the builder-facing surface: declaring tables,
//! composing statements and running them through a `Session`.

pub use quarry_core as core;
pub use quarry_schema as schema;

pub mod error;


pub use error::{Error, ErrorKind, ErrorOrigin, QueryErrorKind};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::Error;
    pub use quarry_core::prelude::*;
}

/// Validate and publish the process schema.
///
/// Call once at start-up; later calls fail with `AlreadyInstalled`.
pub fn start(schema: schema::Schema) -> Result<&'static schema::Schema, Error> {
    Ok(schema::registry::install(schema)?)
}
