use thiserror::Error;

use crate::parse::ParseError;
use crate::SchemaError;

/// Unified error type covering parsing, schema compilation, and loading.
///
/// Returned by convenience loaders like
/// [`CompiledSchema::from_json()`](crate::CompiledSchema) and
/// [`CompiledSchema::from_file()`](crate::CompiledSchema).
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
