//! Output artifact naming
//!
//! Compiled shaders land in one flat directory, so nested aliases are
//! flattened: `fx/blur.slang` becomes `fx.blur.spv`.

use std::path::{Component, Path, PathBuf};

/// Extension given to compiled artifacts.
pub const ARTIFACT_EXTENSION: &str = "spv";

/// Derive the flat artifact file name for an alias.
///
/// The extension is replaced (or added), `.` components are dropped and the
/// remaining path components are joined with `.`. Backslashes are treated as
/// separators on every platform so manifests written on Windows name their
/// outputs the same way.
///
/// Returns `None` when the alias does not end in a file name (`""`, `..`,
/// `fx/..`).
pub fn output_file_name(alias: &str, extension: &str) -> Option<String> {
    let normalized = alias.replace('\\', "/");
    let path = Path::new(&normalized);
    path.file_name()?;

    let name = path
        .with_extension(extension)
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(".");
    Some(name)
}

/// Full artifact path for an alias inside `output_dir`.
pub fn output_path(output_dir: &Path, alias: &str, extension: &str) -> Option<PathBuf> {
    output_file_name(alias, extension).map(|name| output_dir.join(name))
}
