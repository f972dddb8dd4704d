// src/watch/path_utils.rs

//! Path helpers shared by the watcher and source matching.

use std::path::Path;

/// Render a relative path with forward slashes, the form glob patterns use.
pub fn slash_path(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Falls back to comparing canonical paths when the plain prefix does not
/// match (symlinked temp dirs on macOS report `/private/var/...`).
///
/// Returns `None` if the path lies outside `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(slash_path(rel));
    }

    let root_canon = root.canonicalize().ok()?;
    // Removed files cannot be canonicalized; canonicalize their parent.
    let path_canon = match path.canonicalize() {
        Ok(p) => p,
        Err(_) => {
            let parent = path.parent()?.canonicalize().ok()?;
            parent.join(path.file_name()?)
        }
    };

    path_canon
        .strip_prefix(&root_canon)
        .ok()
        .map(slash_path)
}
