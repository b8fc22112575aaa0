//! Error types for manifest loading.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while reading or validating a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read manifest {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("manifest is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("invalid manifest: {0}")]
    Schema(SchemaViolation),
}

/// Specific structural problem found in a well-formed JSON manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    /// The document root is not a JSON object.
    NotAnObject,
    /// A required top-level field is absent.
    MissingField(&'static str),
    /// A shader entry is not a JSON object.
    ShaderNotAnObject { index: usize },
    /// A shader entry lacks its `file` field.
    ShaderMissingFile { index: usize },
    /// A field is present but has the wrong shape.
    InvalidValue(String),
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "top level must be a JSON object"),
            Self::MissingField(field) => write!(f, "missing required field '{}'", field),
            Self::ShaderNotAnObject { index } => {
                write!(f, "shaders[{}] must be a JSON object", index)
            }
            Self::ShaderMissingFile { index } => {
                write!(f, "shaders[{}] is missing required field 'file'", index)
            }
            Self::InvalidValue(detail) => write!(f, "{}", detail),
        }
    }
}

impl ManifestError {
    /// Returns the schema violation, if this is a schema error.
    pub fn violation(&self) -> Option<&SchemaViolation> {
        match self {
            Self::Schema(violation) => Some(violation),
            _ => None,
        }
    }
}
