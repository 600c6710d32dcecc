//! File tree walker built on `ignore::WalkBuilder` (§4.3).

use std::path::Path;

use drspec_core::errors::ScanError;
use drspec_core::Language;

use super::types::DiscoveredFile;

/// Default ignore set (§4.3). Applied as directory-name globs, so any path
/// with a matching ancestor directory is skipped regardless of depth.
pub const DEFAULT_IGNORES: &[&str] = &[
    ".git",
    "node_modules",
    "__pycache__",
    "venv",
    ".venv",
    "dist",
    "build",
    ".pytest_cache",
    ".mypy_cache",
    "*.egg-info",
    ".tox",
    ".nox",
    ".coverage",
    "htmlcov",
    ".eggs",
];

/// Walk `root`, returning every recognized-language file found.
/// `recursive = false` restricts the walk to `root`'s immediate children.
pub fn walk_directory(
    root: &Path,
    recursive: bool,
    extra_ignore: &[String],
) -> Result<Vec<DiscoveredFile>, ScanError> {
    if !root.exists() {
        return Err(ScanError::PathNotFound(root.display().to_string()));
    }

    let mut builder = ignore::WalkBuilder::new(root);
    builder.hidden(false).git_ignore(true).git_global(true).git_exclude(true);
    if !recursive {
        builder.max_depth(Some(1));
    }

    let mut overrides = ignore::overrides::OverrideBuilder::new(root);
    for pattern in DEFAULT_IGNORES {
        let _ = overrides.add(&format!("!{pattern}/**"));
        let _ = overrides.add(&format!("!{pattern}"));
    }
    for pattern in extra_ignore {
        let _ = overrides.add(&format!("!{pattern}"));
    }
    if let Ok(built) = overrides.build() {
        builder.overrides(built);
    }

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let Some(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }

        let path = entry.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let Some(language) = Language::from_extension(ext) else {
            continue;
        };
        let is_header = Language::is_cpp_header(ext);
        let relative_path = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        files.push(DiscoveredFile {
            path: path.to_path_buf(),
            relative_path,
            language,
            is_header,
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn skips_default_ignored_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/vendored.py"), "def f(): pass").unwrap();
        fs::write(dir.path().join("real.py"), "def f(): pass").unwrap();

        let files = walk_directory(dir.path(), true, &[]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "real.py");
    }

    #[test]
    fn non_recursive_stops_at_top_level() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/deep.py"), "def f(): pass").unwrap();
        fs::write(dir.path().join("top.py"), "def f(): pass").unwrap();

        let files = walk_directory(dir.path(), false, &[]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "top.py");
    }

    #[test]
    fn unrecognized_extensions_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.md"), "hello").unwrap();
        let files = walk_directory(dir.path(), true, &[]).unwrap();
        assert!(files.is_empty());
    }
}
