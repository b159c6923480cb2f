use derive_more::Display;
use quarry_core::{
    config::ConfigError,
    error::{ErrorClass, QueryError},
};
use quarry_schema::SchemaError;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        let (kind, origin) = match err.class() {
            ErrorClass::Invalid => (
                ErrorKind::Query(QueryErrorKind::Invalid),
                match err {
                    QueryError::Schema(_) => ErrorOrigin::Schema,
                    _ => ErrorOrigin::Query,
                },
            ),
            ErrorClass::Unsupported => (
                ErrorKind::Query(QueryErrorKind::Unsupported),
                ErrorOrigin::Query,
            ),
            ErrorClass::Mapping => (
                ErrorKind::Query(QueryErrorKind::Mapping),
                ErrorOrigin::Mapping,
            ),
            ErrorClass::NotFound => (
                ErrorKind::Query(QueryErrorKind::NotFound),
                ErrorOrigin::Response,
            ),
            ErrorClass::NotUnique => (
                ErrorKind::Query(QueryErrorKind::NotUnique),
                ErrorOrigin::Response,
            ),
            ErrorClass::Storage => (ErrorKind::Storage, ErrorOrigin::Executor),
        };

        Self::new(kind, origin, err.to_string())
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Self::new(
            ErrorKind::Query(QueryErrorKind::Invalid),
            ErrorOrigin::Schema,
            err.to_string(),
        )
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::Config, ErrorOrigin::Config, err.to_string())
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum ErrorKind {
    /// Configuration could not be read or parsed.
    Config,

    Query(QueryErrorKind),

    /// The executor failed; the message carries the engine's error.
    Storage,
}

///
/// QueryErrorKind
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum QueryErrorKind {
    /// Statement shape or types are invalid; nothing was executed.
    Invalid,

    /// Rows could not be bound to the requested target type.
    Mapping,

    /// Valid query, but no rows matched.
    NotFound,

    /// Query expected one row but matched many.
    NotUnique,

    /// The statement was sent to an operation that cannot run it.
    Unsupported,
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum ErrorOrigin {
    Config,
    Executor,
    Mapping,
    Query,
    Response,
    Schema,
}
