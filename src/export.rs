// src/export.rs

//! Exported source set
//!
//! A recipe lists the path patterns that accompany it. Only matching files
//! are copied next to the recipe in the cache, and only those files are
//! visible to the build. The recipe revision is a hash of the recipe file
//! plus every exported file, so any change to the shipped sources yields a
//! new revision.

use crate::error::{Error, Result};
use crate::hash::Hasher;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Files selected by a recipe's export patterns
#[derive(Debug, Clone, Default)]
pub struct ExportSet {
    /// Matched files, relative to the recipe directory, sorted
    pub files: BTreeSet<PathBuf>,
    /// Patterns that matched nothing
    pub unmatched: Vec<String>,
}

/// Result of exporting a recipe
#[derive(Debug, Clone)]
pub struct ExportedSources {
    /// Folder holding the copied sources
    pub folder: PathBuf,
    /// Relative paths of the copied files
    pub files: Vec<PathBuf>,
    /// Hash of the recipe file and the exported files
    pub revision: String,
    pub warnings: Vec<String>,
}

/// Expand export patterns against a recipe directory
///
/// `dir/*` selects every file below `dir`, not just its direct children.
pub fn collect_exports(recipe_dir: &Path, patterns: &[String]) -> Result<ExportSet> {
    let mut set = ExportSet::default();
    let base = glob::Pattern::escape(&recipe_dir.to_string_lossy());

    for pattern in patterns {
        if pattern.starts_with('/') || pattern.split('/').any(|c| c == "..") {
            return Err(Error::ExportError(format!(
                "Export pattern '{}' must stay inside the recipe directory",
                pattern
            )));
        }

        let expanded = match pattern.strip_suffix("/*") {
            Some(dir) => format!("{}/{}/**/*", base, dir),
            None => format!("{}/{}", base, pattern),
        };

        let entries = glob::glob(&expanded).map_err(|e| {
            Error::ExportError(format!("Invalid export pattern '{}': {}", pattern, e))
        })?;

        let before = set.files.len();
        let mut matched_any = false;
        for entry in entries {
            let path = entry.map_err(|e| Error::ExportError(e.to_string()))?;
            if !path.is_file() {
                continue;
            }
            matched_any = true;
            let relative = path
                .strip_prefix(recipe_dir)
                .map_err(|e| Error::ExportError(e.to_string()))?
                .to_path_buf();
            set.files.insert(relative);
        }

        if !matched_any {
            set.unmatched.push(pattern.clone());
        }
        debug!(
            "Export pattern '{}' matched {} new file(s)",
            pattern,
            set.files.len() - before
        );
    }

    Ok(set)
}

/// Compute the recipe revision from the recipe file and exported files
pub fn recipe_revision(recipe_file: &Path, recipe_dir: &Path, files: &BTreeSet<PathBuf>) -> Result<String> {
    let mut hasher = Hasher::new();
    hasher.field(&fs::read(recipe_file)?);

    for relative in files {
        hasher.path_field(relative);
        hasher.field(&fs::read(recipe_dir.join(relative))?);
    }

    Ok(hasher.finalize())
}

/// Copy the exported source set of a recipe into `dest`
///
/// `dest` is recreated so files removed from the recipe directory do not
/// linger from an earlier export.
pub fn export_sources(recipe_file: &Path, patterns: &[String], dest: &Path) -> Result<ExportedSources> {
    let recipe_dir = recipe_file.parent().unwrap_or(Path::new("."));
    let set = collect_exports(recipe_dir, patterns)?;

    if set.files.is_empty() {
        return Err(Error::ExportError(format!(
            "No files in {} match the export patterns: {}",
            recipe_dir.display(),
            patterns.join(", ")
        )));
    }

    let mut warnings = Vec::new();
    for pattern in &set.unmatched {
        warn!("Export pattern '{}' matched no files", pattern);
        warnings.push(format!("Export pattern '{}' matched no files", pattern));
    }

    if dest.exists() {
        fs::remove_dir_all(dest)?;
    }
    fs::create_dir_all(dest)?;

    for relative in &set.files {
        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(recipe_dir.join(relative), &target)?;
    }

    let revision = recipe_revision(recipe_file, recipe_dir, &set.files)?;
    info!(
        "Exported {} file(s) to {} (revision {})",
        set.files.len(),
        dest.display(),
        &revision[..12]
    );

    Ok(ExportedSources {
        folder: dest.to_path_buf(),
        files: set.files.into_iter().collect(),
        revision,
        warnings,
    })
}

/// Recursively copy a directory tree
pub fn copy_tree(src: &Path, dest: &Path) -> Result<u64> {
    let mut copied = 0;

    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| Error::IoError(format!("Failed to walk {}: {}", src.display(), e)))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::IoError(e.to_string()))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn nbkit_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "recipe.toml", "recipe");
        touch(dir.path(), "CMakeLists.txt", "project(nbkit)");
        touch(dir.path(), "nbkit/event.h", "// event");
        touch(dir.path(), "nbkit/detail/matrix_impl.h", "// impl");
        touch(dir.path(), "tests/test_event.cpp", "// test");
        touch(dir.path(), "README.md", "not exported");
        dir
    }

    fn nbkit_patterns() -> Vec<String> {
        vec!["CMakeLists.txt".into(), "nbkit/*".into(), "tests/*".into()]
    }

    #[test]
    fn test_collect_exports_matches_subtrees() {
        let dir = nbkit_tree();
        let set = collect_exports(dir.path(), &nbkit_patterns()).unwrap();

        let files: Vec<_> = set.files.iter().map(|p| p.to_string_lossy().into_owned()).collect();
        assert_eq!(
            files,
            vec![
                "CMakeLists.txt",
                "nbkit/detail/matrix_impl.h",
                "nbkit/event.h",
                "tests/test_event.cpp"
            ]
        );
        assert!(set.unmatched.is_empty());
    }

    #[test]
    fn test_collect_exports_reports_unmatched() {
        let dir = nbkit_tree();
        let patterns = vec!["CMakeLists.txt".to_string(), "docs/*".to_string()];
        let set = collect_exports(dir.path(), &patterns).unwrap();
        assert_eq!(set.unmatched, vec!["docs/*"]);
    }

    #[test]
    fn test_collect_exports_rejects_escape() {
        let dir = nbkit_tree();
        assert!(collect_exports(dir.path(), &["../secret".to_string()]).is_err());
        assert!(collect_exports(dir.path(), &["/etc/passwd".to_string()]).is_err());
    }

    #[test]
    fn test_export_sources_copies_only_matches() {
        let dir = nbkit_tree();
        let dest = tempfile::tempdir().unwrap();
        let out = dest.path().join("export");

        let exported =
            export_sources(&dir.path().join("recipe.toml"), &nbkit_patterns(), &out).unwrap();

        assert_eq!(exported.files.len(), 4);
        assert!(out.join("nbkit/detail/matrix_impl.h").is_file());
        assert!(!out.join("README.md").exists());
        assert_eq!(exported.revision.len(), 64);
    }

    #[test]
    fn test_export_sources_empty_is_error() {
        let dir = nbkit_tree();
        let dest = tempfile::tempdir().unwrap();
        let err = export_sources(
            &dir.path().join("recipe.toml"),
            &["missing/*".to_string()],
            &dest.path().join("export"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ExportError(_)));
    }

    #[test]
    fn test_revision_changes_with_sources() {
        let dir = nbkit_tree();
        let set = collect_exports(dir.path(), &nbkit_patterns()).unwrap();
        let recipe = dir.path().join("recipe.toml");

        let first = recipe_revision(&recipe, dir.path(), &set.files).unwrap();
        assert_eq!(first, recipe_revision(&recipe, dir.path(), &set.files).unwrap());

        touch(dir.path(), "nbkit/event.h", "// event v2");
        assert_ne!(first, recipe_revision(&recipe, dir.path(), &set.files).unwrap());
    }

    #[test]
    fn test_copy_tree() {
        let dir = nbkit_tree();
        let dest = tempfile::tempdir().unwrap();
        let copied = copy_tree(dir.path(), dest.path()).unwrap();
        assert_eq!(copied, 6);
        assert!(dest.path().join("nbkit/detail/matrix_impl.h").is_file());
    }
}
