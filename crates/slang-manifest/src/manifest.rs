//! Manifest model and validation
//!
//! A manifest looks like:
//!
//! ```json
//! {
//!   "shader_root": "../shaders",
//!   "include_dir": ["common"],
//!   "common_options": ["-target", "spirv"],
//!   "shaders": [
//!     { "file": "fx/blur.slang", "options": ["-entry", "main"] },
//!     { "file": "ui/text.slang", "alias": "text.slang" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ManifestError, SchemaViolation};
use crate::REQUIRED_FIELDS;

/// One shader to compile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderEntry {
    /// Source file, relative to the shader root
    pub file: String,

    /// Options passed only for this shader
    #[serde(default)]
    pub options: Vec<String>,

    /// Name the output artifact is derived from (defaults to `file`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl ShaderEntry {
    /// The alias if set, otherwise the source file name.
    pub fn output_alias(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.file)
    }
}

/// Parsed shader build manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Options passed to every compiler invocation, in order
    pub common_options: Vec<String>,

    /// Shaders to compile, in manifest order
    pub shaders: Vec<ShaderEntry>,

    /// Directory shader files are resolved against, relative to the manifest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shader_root: Option<String>,

    /// Include directories, relative to the shader root
    #[serde(default, rename = "include_dir")]
    pub include_dirs: Vec<String>,
}

impl Manifest {
    /// Read and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        LoadedManifest::load(path).map(|loaded| loaded.manifest)
    }

    /// Parse and validate a manifest from a string.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Self::from_slice(json.as_bytes())
    }

    /// Parse and validate a manifest from raw bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ManifestError> {
        let value: Value = serde_json::from_slice(bytes).map_err(ManifestError::Parse)?;
        Self::from_value(value)
    }

    /// Validate an already-parsed JSON document.
    pub fn from_value(value: Value) -> Result<Self, ManifestError> {
        let object = value
            .as_object()
            .ok_or(ManifestError::Schema(SchemaViolation::NotAnObject))?;

        for field in REQUIRED_FIELDS {
            if !object.contains_key(*field) {
                return Err(ManifestError::Schema(SchemaViolation::MissingField(*field)));
            }
        }

        if let Some(shaders) = object.get("shaders").and_then(Value::as_array) {
            for (index, shader) in shaders.iter().enumerate() {
                let entry = shader
                    .as_object()
                    .ok_or(ManifestError::Schema(SchemaViolation::ShaderNotAnObject { index }))?;
                if !entry.contains_key("file") {
                    return Err(ManifestError::Schema(SchemaViolation::ShaderMissingFile {
                        index,
                    }));
                }
            }
        }

        serde_json::from_value(value)
            .map_err(|e| ManifestError::Schema(SchemaViolation::InvalidValue(e.to_string())))
    }

    /// The shader root, treating an empty string as unset.
    pub fn shader_root(&self) -> Option<&str> {
        self.shader_root.as_deref().filter(|root| !root.is_empty())
    }

    /// Shader root resolved against the directory containing the manifest.
    ///
    /// An existing root is canonicalized so `..` segments do not leak into
    /// include paths; a missing one is returned as joined.
    pub fn resolve_shader_root(&self, manifest_dir: &Path) -> Option<PathBuf> {
        self.shader_root().map(|root| {
            let joined = manifest_dir.join(root);
            joined.canonicalize().unwrap_or(joined)
        })
    }
}

/// A manifest together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedManifest {
    /// Path the manifest was read from
    pub path: PathBuf,

    /// SHA-256 digest of the raw file bytes (hex)
    pub sha256: String,

    /// The validated manifest
    pub manifest: Manifest,
}

impl LoadedManifest {
    /// Read, digest and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        if !path.is_file() {
            return Err(ManifestError::NotFound(path.to_path_buf()));
        }

        let bytes = fs::read(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let manifest = Manifest::from_slice(&bytes)?;

        Ok(Self {
            path: path.to_path_buf(),
            sha256: hex::encode(Sha256::digest(&bytes)),
            manifest,
        })
    }

    /// Directory containing the manifest file.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Shader root resolved against the manifest directory, if one is set.
    pub fn shader_root(&self) -> Option<PathBuf> {
        self.manifest.resolve_shader_root(self.dir())
    }
}
