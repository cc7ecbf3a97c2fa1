// src/watch/path_utils.rs

//! Path helpers shared by glob matching and the watcher.

use std::path::Path;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First a direct `strip_prefix(root)`.
/// - If that fails (symlinks, `/private/var` vs `/var` on macOS), both paths
///   are canonicalized and stripped again.
///
/// Returns `None` if the path is not below `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(to_slash(rel));
        }
    }

    None
}

fn to_slash(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_root_and_normalises_separators() {
        let rel = relative_str(Path::new("/proj/src"), Path::new("/proj/src/assets/a.js"));
        assert_eq!(rel.as_deref(), Some("assets/a.js"));
    }

    #[test]
    fn unrelated_path_is_none() {
        assert_eq!(relative_str(Path::new("/proj/src"), Path::new("/elsewhere/a.js")), None);
    }
}
