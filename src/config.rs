//! Plugin settings persistence.
//!
//! Settings live as JSON in the platform config dir and are loaded fresh at
//! the start of every user action — action handlers receive an immutable
//! snapshot, and writing back is an explicit save step. A missing or corrupt
//! file falls back to defaults with a logged warning instead of failing the
//! action.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.json";

/// What a click on a typst-classified explorer entry does.
/// Wire values match the original plugin's saved data (`"None"`, `"PDF"`,
/// `"Compile"`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhenClicked {
    /// Suppress navigation, do nothing else.
    None,
    /// Open the associated PDF, or notice when absent.
    #[default]
    #[serde(rename = "PDF")]
    Pdf,
    /// Compile into PDF when stale, then open.
    Compile,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypstHelperSettings {
    /// Path or name of the typst CLI.
    #[serde(default = "default_typst_cli")]
    pub typst_cli: String,
    #[serde(default)]
    pub when_clicked: WhenClicked,
    /// Treat `name.typ.md` files as typst source.
    #[serde(default = "default_true")]
    pub support_typ_md: bool,
}

fn default_typst_cli() -> String {
    "typst".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for TypstHelperSettings {
    fn default() -> Self {
        Self {
            typst_cli: default_typst_cli(),
            when_clicked: WhenClicked::default(),
            support_typ_md: true,
        }
    }
}

/// Config directory: `<platform config dir>/typst-helper/`, falling back to
/// `~/.typst-helper/` when the platform dir is unavailable.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("typst-helper"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".typst-helper")
        })
}

/// Load the settings snapshot for one user action.
pub fn load_settings() -> TypstHelperSettings {
    read_settings(&config_dir().join(SETTINGS_FILE))
}

/// Persist settings. Explicit save step; callers surface the error.
pub fn save_settings(settings: &TypstHelperSettings) -> Result<(), String> {
    write_settings(&config_dir().join(SETTINGS_FILE), settings)
}

/// Read settings from a concrete path, defaulting on missing or corrupt
/// content. Unknown fields are ignored and missing fields take their serde
/// defaults, so files written by earlier revisions still load.
fn read_settings(path: &Path) -> TypstHelperSettings {
    if !path.exists() {
        return TypstHelperSettings::default();
    }
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("could not read settings {}: {e}", path.display());
            return TypstHelperSettings::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("corrupt settings {}: {e}; using defaults", path.display());
            TypstHelperSettings::default()
        }
    }
}

/// Write settings atomically (temp file + rename), 0600 on Unix.
fn write_settings(path: &Path, settings: &TypstHelperSettings) -> Result<(), String> {
    let dir = path
        .parent()
        .ok_or_else(|| "settings path has no parent directory".to_string())?;
    std::fs::create_dir_all(dir).map_err(|e| format!("Failed to create config directory: {e}"))?;

    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {e}"))?;

    let temp = dir.join(format!("{SETTINGS_FILE}.tmp.{}", std::process::id()));
    std::fs::write(&temp, &json).map_err(|e| format!("Failed to write temp settings: {e}"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&temp, perms)
            .map_err(|e| format!("Failed to set settings permissions: {e}"))?;
    }

    std::fs::rename(&temp, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        format!("Failed to commit settings: {e}")
    })
}
