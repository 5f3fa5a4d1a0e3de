//! Discovery of log-pair directories in a dataset tree.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::config::PairLayout;
use crate::error::Result;

/// Collect every directory under `root` holding both logs of `layout`.
///
/// Symlinks are followed. Directories are reported after their descendants
/// with siblings in file-name order, so the result is stable for an unchanged
/// tree. Any traversal error aborts the scan; no partial list is returned.
pub fn discover_pairs(root: &Path, layout: &PairLayout) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(root)
        .follow_links(true)
        .max_depth(layout.max_depth.saturating_sub(1))
        .contents_first(true)
        .sort_by_file_name();

    let mut directories = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if is_pair_dir(entry.path(), layout) {
            directories.push(entry.into_path());
        }
    }

    debug!(root = ?root, found = directories.len(), "dataset scanned");
    Ok(directories)
}

/// True when `dir` holds both the success and the failure log.
pub fn is_pair_dir(dir: &Path, layout: &PairLayout) -> bool {
    dir.join(&layout.success_file).is_file() && dir.join(&layout.failure_file).is_file()
}

/// `dir` relative to `root`, as written in output rows.
pub fn relative_label(root: &Path, dir: &Path) -> String {
    dir.strip_prefix(root)
        .unwrap_or(dir)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::write(path, "line\n").unwrap();
    }

    #[test]
    fn test_only_complete_pairs_are_found() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a");
        fs::create_dir_all(a.join("b")).unwrap();
        fs::create_dir_all(a.join("c")).unwrap();
        touch(&a.join("b/success.log"));
        touch(&a.join("b/failure.log"));
        touch(&a.join("c/success.log"));

        let found = discover_pairs(&a, &PairLayout::default()).unwrap();
        assert_eq!(found, vec![a.join("b")]);
    }

    #[test]
    fn test_root_itself_can_be_a_pair() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("success.log"));
        touch(&tmp.path().join("failure.log"));

        let found = discover_pairs(tmp.path(), &PairLayout::default()).unwrap();
        assert_eq!(found, vec![tmp.path().to_path_buf()]);
    }

    #[test]
    fn test_file_names_are_case_sensitive() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("x");
        fs::create_dir(&dir).unwrap();
        touch(&dir.join("Success.log"));
        touch(&dir.join("failure.log"));

        let found = discover_pairs(tmp.path(), &PairLayout::default()).unwrap();
        // Case-insensitive filesystems resolve "success.log" anyway.
        if !dir.join("success.log").exists() {
            assert!(found.is_empty());
        }
    }

    #[test]
    fn test_depth_bound_excludes_deep_pairs() {
        let tmp = tempfile::tempdir().unwrap();
        let shallow = tmp.path().join("1");
        let deep = tmp.path().join("1/2/3");
        fs::create_dir_all(&deep).unwrap();
        for dir in [&shallow, &deep] {
            touch(&dir.join("success.log"));
            touch(&dir.join("failure.log"));
        }
        let layout = PairLayout {
            max_depth: 3,
            ..PairLayout::default()
        };

        let found = discover_pairs(tmp.path(), &layout).unwrap();
        assert_eq!(found, vec![shallow]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        assert!(discover_pairs(&missing, &PairLayout::default()).is_err());
    }

    #[test]
    fn test_relative_label() {
        let root = Path::new("/data/set");
        assert_eq!(relative_label(root, Path::new("/data/set/org/repo/1")), "org/repo/1");
        assert_eq!(relative_label(root, Path::new("/elsewhere")), "/elsewhere");
    }
}
