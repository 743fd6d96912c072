//! Vault filesystem access.
//!
//! The host's file explorer deals in vault-relative paths with `/`
//! separators; everything that touches the real filesystem goes through
//! [`Vault`], which resolves those paths against the vault base directory and
//! refuses anything that would escape it. Descriptors are read at the moment
//! of a user action and discarded — nothing here caches filesystem state.

use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::freshness::SourceDescriptor;

/// Timestamps of an existing file, epoch milliseconds. Creation time falls
/// back to modification time on filesystems without creation-time support;
/// the freshness comparison semantics are unchanged by the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub modified_at_ms: i64,
    pub created_at_ms: i64,
}

/// A vault rooted at an absolute base directory.
#[derive(Debug, Clone)]
pub struct Vault {
    base: PathBuf,
}

impl Vault {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolve a vault-relative path to an absolute filesystem path.
    /// Absolute inputs and `..` components are rejected — explorer paths are
    /// always plain descendants of the vault base.
    pub fn absolute_path(&self, rel: &str) -> Result<PathBuf, String> {
        let mut resolved = self.base.clone();
        for component in Path::new(rel).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    return Err(format!("Access denied: '{rel}' escapes the vault"));
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(format!("Not a vault-relative path: '{rel}'"));
                }
            }
        }
        Ok(resolved)
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.absolute_path(rel).map(|p| p.exists()).unwrap_or(false)
    }

    /// Stat a vault file, `None` when it doesn't exist (or the path is
    /// invalid — absence and inaccessibility look the same to callers).
    pub fn stat(&self, rel: &str) -> Option<FileStat> {
        let abs = self.absolute_path(rel).ok()?;
        let metadata = std::fs::metadata(&abs).ok()?;
        let modified_at_ms = metadata.modified().map(system_time_ms).unwrap_or(0);
        let created_at_ms = metadata
            .created()
            .map(system_time_ms)
            .unwrap_or(modified_at_ms);
        Some(FileStat {
            modified_at_ms,
            created_at_ms,
        })
    }

    /// Build a [`SourceDescriptor`] for a vault file. `None` for missing
    /// paths and directories — directories are never compilable sources.
    pub fn source_descriptor(&self, rel: &str) -> Option<SourceDescriptor> {
        let abs = self.absolute_path(rel).ok()?;
        if !abs.is_file() {
            return None;
        }
        let stat = self.stat(rel)?;
        Some(SourceDescriptor::new(file_name_of(rel), stat.modified_at_ms))
    }

    /// Create an empty `Untitled.typ` in the given folder, appending `_N`
    /// (N starting at 1) until an unoccupied name is found. Returns the
    /// vault-relative path of the created note.
    pub fn create_untitled_note(&self, folder_rel: &str) -> Result<String, String> {
        let mut index = 0usize;
        loop {
            let name = if index == 0 {
                "Untitled.typ".to_string()
            } else {
                format!("Untitled_{index}.typ")
            };
            let rel = join_rel(folder_rel, &name);
            let abs = self.absolute_path(&rel)?;
            if !abs.exists() {
                std::fs::write(&abs, "")
                    .map_err(|e| format!("Failed to create '{rel}': {e}"))?;
                tracing::debug!(path = %rel, "created new typst note");
                return Ok(rel);
            }
            index += 1;
        }
    }
}

/// Final path segment of a vault-relative path.
pub fn file_name_of(rel: &str) -> &str {
    rel.rsplit('/').next().unwrap_or(rel)
}

/// Vault-relative parent of a path: `Some("")` for root-level entries, `None`
/// when the path has no file component at all.
pub fn parent_rel(rel: &str) -> Option<&str> {
    if rel.is_empty() || rel.ends_with('/') {
        return None;
    }
    match rel.rsplit_once('/') {
        Some((dir, _)) => Some(dir),
        None => Some(""),
    }
}

/// Join a vault-relative directory and a file name.
pub fn join_rel(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{name}", dir.trim_end_matches('/'))
    }
}

fn system_time_ms(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
