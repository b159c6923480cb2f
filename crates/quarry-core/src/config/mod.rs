//! Module: config
//! Responsibility: TOML configuration for rendering and sessions.
//!
//! Every key is optional. A missing section or key takes its default, and
//! unknown keys are rejected so typos surface at load time.


use crate::render::RenderOptions;
use serde::Deserialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

///
/// QuarryConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct QuarryConfig {
    pub render: RenderOptions,
    pub session: SessionOptions,
}

impl QuarryConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&source)
    }
}

///
/// SessionOptions
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SessionOptions {
    /// Log rendered statements and their fingerprints at debug level.
    pub log_statements: bool,

    /// Largest `LIMIT` a page fetch may request. `None` means uncapped.
    pub max_page_size: Option<u64>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            log_statements: true,
            max_page_size: None,
        }
    }
}
