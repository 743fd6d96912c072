//! External tool probing and resolution.
//!
//! The note-taking host is a desktop-launched app, so it doesn't inherit the
//! user's shell PATH and tools like `typst` and `code` often aren't found by
//! bare name. [`resolve_tool`] probes well-known install directories and
//! caches the result for the process lifetime; [`tool_exists`] is the
//! advisory availability probe — a `true` result is no guarantee the later
//! invocation succeeds, callers still handle spawn failure.

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

/// Install directories worth probing when a tool isn't on the inherited PATH.
fn probe_dirs() -> &'static [String] {
    static DIRS: OnceLock<Vec<String>> = OnceLock::new();
    DIRS.get_or_init(|| {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_default();

        let mut dirs = Vec::new();

        #[cfg(target_os = "macos")]
        dirs.extend([
            "/usr/local/bin".to_string(),
            "/opt/homebrew/bin".to_string(),
        ]);

        #[cfg(target_os = "linux")]
        dirs.extend([
            "/usr/bin".to_string(),
            "/usr/local/bin".to_string(),
            format!("{home}/.local/bin"),
            "/snap/bin".to_string(),
        ]);

        #[cfg(not(target_os = "windows"))]
        dirs.push(format!("{home}/.cargo/bin"));

        #[cfg(target_os = "windows")]
        {
            let local_app_data = std::env::var("LOCALAPPDATA")
                .unwrap_or_else(|_| format!("{home}\\AppData\\Local"));
            let program_files =
                std::env::var("ProgramFiles").unwrap_or_else(|_| "C:\\Program Files".to_string());
            dirs.extend([
                format!("{home}\\.cargo\\bin"),
                format!("{local_app_data}\\Programs\\Microsoft VS Code\\bin"),
                format!("{program_files}\\Microsoft VS Code\\bin"),
                format!("{home}\\scoop\\shims"),
            ]);
        }

        dirs
    })
}

/// Resolve a tool name to an invocable path.
///
/// Names containing a path separator (the user configured an explicit path)
/// are returned unchanged. Otherwise the probe directories are checked and
/// the first hit wins; a miss returns the bare name so the spawn still goes
/// through PATH lookup. Results are cached per name — tool locations don't
/// change at runtime.
pub fn resolve_tool(name: &str) -> String {
    if has_path_separator(name) {
        return name.to_string();
    }

    static CACHE: OnceLock<parking_lot::Mutex<HashMap<String, String>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| parking_lot::Mutex::new(HashMap::new()));

    if let Some(hit) = cache.lock().get(name) {
        return hit.clone();
    }

    let resolved = resolve_tool_uncached(name);
    cache.lock().insert(name.to_string(), resolved.clone());
    resolved
}

fn resolve_tool_uncached(name: &str) -> String {
    for dir in probe_dirs() {
        let candidate = Path::new(dir).join(name);
        if candidate.exists() {
            return candidate.to_string_lossy().to_string();
        }
    }
    name.to_string()
}

fn has_path_separator(name: &str) -> bool {
    name.contains('/') || name.contains('\\')
}

/// Advisory availability probe: `where` on Windows, `which` elsewhere, with a
/// non-zero exit (or a failure to run the locator at all) meaning "not
/// found". Never surfaces the underlying error beyond the boolean. A tool
/// found in a probe directory counts as present even when PATH misses it.
pub fn tool_exists(name: &str) -> bool {
    // Explicitly configured paths are checked directly.
    if has_path_separator(name) {
        return Path::new(name).exists();
    }

    let locator = if cfg!(target_os = "windows") { "where" } else { "which" };
    let on_path = Command::new(locator)
        .arg(name)
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false);
    if on_path {
        return true;
    }

    resolve_tool(name) != name
}
