use crate::layout::{LayoutError, Result, MANIFEST_EXTENSION};
use std::path::Path;
use walkdir::WalkDir;

/// Org directories directly under `base_dir`, sorted by name
pub fn discover_orgs(base_dir: &Path) -> Result<Vec<String>> {
    child_dirs(base_dir)
}

pub fn discover_spaces(base_dir: &Path, org: &str) -> Result<Vec<String>> {
    child_dirs(&base_dir.join(org))
}

/// Instance names of the `*.yml` manifests in one space directory.
/// Files with other extensions are strategy artifacts and are left alone.
pub fn discover_manifests(base_dir: &Path, org: &str, space: &str) -> Result<Vec<String>> {
    let dir = base_dir.join(org).join(space);
    let mut names = Vec::new();
    for entry in WalkDir::new(&dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(MANIFEST_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            names.push(stem.to_string());
        }
    }
    Ok(names)
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| LayoutError::io(dir, e))
}

/// A missing directory counts as empty
pub fn is_empty_dir(dir: &Path) -> Result<bool> {
    if !dir.exists() {
        return Ok(true);
    }
    let mut entries = std::fs::read_dir(dir).map_err(|e| LayoutError::io(dir, e))?;
    Ok(entries.next().is_none())
}

fn child_dirs(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            // hidden directories are never orgs or spaces
            if !name.starts_with('.') {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discovery() {
        let dir = TempDir::new().unwrap();
        let space = dir.path().join("acme").join("dev");
        std::fs::create_dir_all(&space).unwrap();
        std::fs::create_dir_all(dir.path().join("blue").join("prod")).unwrap();
        std::fs::create_dir_all(dir.path().join(".cache")).unwrap();
        std::fs::write(space.join("db.yml"), "name: db\n").unwrap();
        std::fs::write(space.join("db.sql"), "-- dump").unwrap();
        std::fs::write(space.join("cache.yml"), "name: cache\n").unwrap();

        assert_eq!(discover_orgs(dir.path()).unwrap(), vec!["acme", "blue"]);
        assert_eq!(discover_spaces(dir.path(), "acme").unwrap(), vec!["dev"]);
        assert_eq!(
            discover_manifests(dir.path(), "acme", "dev").unwrap(),
            vec!["cache", "db"]
        );
    }

    #[test]
    fn test_is_empty_dir() {
        let dir = TempDir::new().unwrap();
        assert!(is_empty_dir(dir.path()).unwrap());
        assert!(is_empty_dir(&dir.path().join("missing")).unwrap());

        std::fs::write(dir.path().join("file"), "x").unwrap();
        assert!(!is_empty_dir(dir.path()).unwrap());
    }
}
