//! Shader Build Manifest
//!
//! Defines the JSON manifest consumed by `slang-batch`: global compiler
//! options, per-shader entries, an optional shader root and include
//! directories.

pub mod error;
pub mod manifest;

pub use error::{ManifestError, SchemaViolation};
pub use manifest::{LoadedManifest, Manifest, ShaderEntry};

/// Top-level fields every manifest must carry.
pub const REQUIRED_FIELDS: &[&str] = &["common_options", "shaders"];
