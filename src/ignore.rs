//! Per-project ignore registry
//!
//! Stores suppressed `groupId:artifactId:version` keys in a `.feraldeps-ignore`
//! file next to the scanned project. Keys are version specific: ignoring
//! `g:a:1.0` does not hide `g:a:2.0`.
//!
//! File format: one key per line; blank lines and `#` comments are skipped on
//! load. Every mutation rewrites the whole file, sorted, under a fixed header.

use crate::domain::Dependency;
use crate::error::PersistenceError;
use crate::manifest::temp_path;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Default ignore file name inside the project directory
pub const IGNORE_FILENAME: &str = ".feraldeps-ignore";

/// Header written at the top of every saved ignore file
const HEADER: [&str; 2] = [
    "# FeralDeps - Ignored Dependencies",
    "# Dependencies listed here will be hidden from scan results",
];

/// Persistent set of ignored coordinate:version keys
#[derive(Debug, Clone)]
pub struct IgnoreRegistry {
    /// Backing file
    path: PathBuf,
    /// Ignored keys, kept sorted
    entries: BTreeSet<String>,
}

impl IgnoreRegistry {
    /// Load the registry for a project directory using the default file name
    pub fn for_project(project_dir: &Path) -> Self {
        Self::load(project_dir.join(IGNORE_FILENAME))
    }

    /// Load the registry from an explicit file
    ///
    /// Best effort: a missing file yields an empty registry, and a read
    /// failure is logged and also yields an empty registry.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match Self::read_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("{}; continuing with an empty ignore list", e);
                BTreeSet::new()
            }
        };
        tracing::debug!(path = %path.display(), count = entries.len(), "loaded ignore registry");
        Self { path, entries }
    }

    /// Create an empty registry bound to a file without touching disk
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeSet::new(),
        }
    }

    fn read_entries(path: &Path) -> Result<BTreeSet<String>, PersistenceError> {
        if !path.exists() {
            return Ok(BTreeSet::new());
        }

        let bytes = fs::read(path).map_err(|e| PersistenceError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        // A stray non-UTF-8 byte in a hand-edited comment must not drop every entry
        Ok(parse_entries(&String::from_utf8_lossy(&bytes)))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if this exact coordinate:version is ignored
    pub fn is_ignored(&self, dependency: &Dependency) -> bool {
        self.entries.contains(&dependency.key())
    }

    /// Returns true if the raw key is ignored
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    /// Ignore a dependency and persist the registry
    ///
    /// Returns whether the key was newly added. The in-memory set keeps the
    /// change even when saving fails.
    pub fn ignore(&mut self, dependency: &Dependency) -> Result<bool, PersistenceError> {
        self.ignore_key(&dependency.key())
    }

    /// Stop ignoring a dependency and persist the registry
    ///
    /// Returns whether the key was present.
    pub fn unignore(&mut self, dependency: &Dependency) -> Result<bool, PersistenceError> {
        self.unignore_key(&dependency.key())
    }

    /// Ignore a raw `groupId:artifactId:version` key
    pub fn ignore_key(&mut self, key: &str) -> Result<bool, PersistenceError> {
        let added = self.entries.insert(key.trim().to_string());
        self.save()?;
        Ok(added)
    }

    /// Remove a raw `groupId:artifactId:version` key
    pub fn unignore_key(&mut self, key: &str) -> Result<bool, PersistenceError> {
        let removed = self.entries.remove(key.trim());
        self.save()?;
        Ok(removed)
    }

    /// Ignored keys in sorted order
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Number of ignored keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is ignored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the full file content
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in HEADER {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
        for entry in &self.entries {
            out.push_str(entry);
            out.push('\n');
        }
        out
    }

    /// Rewrite the backing file through a sibling temp file and rename
    pub fn save(&self) -> Result<(), PersistenceError> {
        write_atomic(&self.path, &self.render()).map_err(|e| {
            let err = PersistenceError::WriteError {
                path: self.path.clone(),
                source: e,
            };
            tracing::warn!("{}", err);
            err
        })
    }
}

fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let tmp = temp_path(path);
    let result = fs::write(&tmp, content).and_then(|()| fs::rename(&tmp, path));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Parse ignore file content, skipping blank lines and comments
fn parse_entries(content: &str) -> BTreeSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Parse a `groupId:artifactId:version` key into a dependency
pub fn parse_key(key: &str) -> Option<Dependency> {
    let mut parts = key.trim().splitn(3, ':');
    let group = parts.next().filter(|s| !s.is_empty())?;
    let artifact = parts.next().filter(|s| !s.is_empty())?;
    let version = parts.next().filter(|s| !s.is_empty())?;
    Some(Dependency::new(group, artifact, version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dep(version: &str) -> Dependency {
        Dependency::new("org.x", "lib", version)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let registry = IgnoreRegistry::for_project(temp_dir.path());
        assert!(registry.is_empty());
        assert!(!registry.path().exists());
    }

    #[test]
    fn test_ignore_is_version_specific() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = IgnoreRegistry::for_project(temp_dir.path());

        registry.ignore(&dep("1.0")).unwrap();

        assert!(registry.is_ignored(&dep("1.0")));
        assert!(!registry.is_ignored(&dep("2.0")));
    }

    #[test]
    fn test_ignore_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = IgnoreRegistry::for_project(temp_dir.path());

        assert!(registry.ignore(&dep("1.0")).unwrap());
        assert!(!registry.ignore(&dep("1.0")).unwrap());

        assert_eq!(registry.len(), 1);
        let content = fs::read_to_string(registry.path()).unwrap();
        assert_eq!(content.matches("org.x:lib:1.0").count(), 1);
    }

    #[test]
    fn test_unignore_removes_entry() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = IgnoreRegistry::for_project(temp_dir.path());

        registry.ignore(&dep("1.0")).unwrap();
        assert!(registry.unignore(&dep("1.0")).unwrap());
        assert!(!registry.is_ignored(&dep("1.0")));
        assert!(!registry.unignore(&dep("1.0")).unwrap());

        let reloaded = IgnoreRegistry::for_project(temp_dir.path());
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_saved_file_is_sorted_with_header() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = IgnoreRegistry::for_project(temp_dir.path());

        registry.ignore_key("org.z:zeta:1").unwrap();
        registry.ignore_key("com.a:alpha:2").unwrap();

        let content = fs::read_to_string(registry.path()).unwrap();
        assert_eq!(
            content,
            "# FeralDeps - Ignored Dependencies\n\
             # Dependencies listed here will be hidden from scan results\n\
             \n\
             com.a:alpha:2\n\
             org.z:zeta:1\n"
        );
    }

    #[test]
    fn test_load_skips_comments_and_blank_lines() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(IGNORE_FILENAME),
            "# comment\n\n  org.x:lib:1.0  \n#org.x:lib:3.0\norg.y:other:2.0\n",
        )
        .unwrap();

        let registry = IgnoreRegistry::for_project(temp_dir.path());
        assert_eq!(registry.len(), 2);
        assert!(registry.contains_key("org.x:lib:1.0"));
        assert!(!registry.contains_key("org.x:lib:3.0"));
    }

    #[test]
    fn test_non_utf8_bytes_keep_existing_entries() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(IGNORE_FILENAME),
            b"# caf\xe9 notes\norg.x:lib:1.0\norg.y:old:2.0\n",
        )
        .unwrap();

        let mut registry = IgnoreRegistry::for_project(temp_dir.path());
        assert_eq!(registry.len(), 2);

        registry.ignore_key("org.z:new:3.0").unwrap();

        let reloaded = IgnoreRegistry::for_project(temp_dir.path());
        assert_eq!(
            reloaded.entries().collect::<Vec<_>>(),
            vec!["org.x:lib:1.0", "org.y:old:2.0", "org.z:new:3.0"]
        );
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = IgnoreRegistry::for_project(temp_dir.path());
        registry.ignore(&dep("1.0")).unwrap();

        assert!(registry.path().exists());
        assert!(!temp_path(registry.path()).exists());
    }

    #[test]
    fn test_unreadable_file_is_treated_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the file should be cannot be read as text
        fs::create_dir(temp_dir.path().join(IGNORE_FILENAME)).unwrap();

        let registry = IgnoreRegistry::for_project(temp_dir.path());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_save_failure_keeps_in_memory_change() {
        let mut registry = IgnoreRegistry::empty("/nonexistent/dir/.feraldeps-ignore");
        let result = registry.ignore(&dep("1.0"));
        assert!(matches!(result, Err(PersistenceError::WriteError { .. })));
        assert!(registry.is_ignored(&dep("1.0")));
    }

    #[test]
    fn test_parse_key() {
        let dep = parse_key("org.x:lib:1.0").unwrap();
        assert_eq!(dep.coordinate(), "org.x:lib");
        assert_eq!(dep.version, "1.0");
        assert!(parse_key("org.x:lib").is_none());
        assert!(parse_key("org.x::1.0").is_none());
    }
}
