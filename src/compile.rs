//! Compiler invocation.
//!
//! Runs `<typst_cli> c <absolute source> <absolute pdf>` for one user action.
//! Exit code 0 is success; anything else becomes a one-line notice carrying
//! the raw (truncated) stderr. The original plugin launched one compiler
//! process per click with no in-flight tracking; here concurrent requests for
//! the same source are de-duplicated — the second click reports
//! [`CompileOutcome::AlreadyRunning`] and spawns nothing.

use std::process::Command;
use std::sync::OnceLock;
use std::time::Duration;

use dashmap::DashMap;

use crate::cli;
use crate::config::TypstHelperSettings;
use crate::notice::Notices;
use crate::vault::{self, Vault};

/// Hard cap on one compiler run. Long documents are slow, but a wedged
/// process shouldn't pin the source path's in-flight slot forever.
const COMPILE_TIMEOUT_SECS: u64 = 120;

/// Stderr bytes carried into the failure notice.
const MAX_STDERR_BYTES: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// The compiler ran and exited 0.
    Compiled,
    /// Rejected before any subprocess was spawned (tool missing, not a typst
    /// file, no parent directory). A notice has already been pushed.
    NotStarted,
    /// A compile for the same source is still running; nothing was spawned.
    AlreadyRunning,
}

/// Absolute source paths with a compiler process currently running.
fn in_flight() -> &'static DashMap<String, ()> {
    static SET: OnceLock<DashMap<String, ()>> = OnceLock::new();
    SET.get_or_init(DashMap::new)
}

/// RAII slot in the in-flight set; released on drop, including every early
/// return and the timeout path.
struct InFlightGuard {
    key: String,
}

impl InFlightGuard {
    fn acquire(key: &str) -> Option<Self> {
        use dashmap::mapref::entry::Entry;
        match in_flight().entry(key.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(Self {
                    key: key.to_string(),
                })
            }
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        in_flight().remove(&self.key);
    }
}

/// Compile one vault file into its expected PDF.
///
/// All rejections and failures are terminal for this one action: one notice,
/// one log entry, no retry. `Err` means a compiler process was spawned and
/// failed (or timed out); the error string matches the pushed notice.
pub async fn compile_source(
    settings: &TypstHelperSettings,
    vault: &Vault,
    rel_path: &str,
    notices: &Notices,
) -> Result<CompileOutcome, String> {
    if !cli::tool_exists(&settings.typst_cli) {
        notices.push(format!("{}: typst not found.", settings.typst_cli));
        return Ok(CompileOutcome::NotStarted);
    }

    let file_name = vault::file_name_of(rel_path);
    let Some(descriptor) = vault.source_descriptor(rel_path) else {
        notices.push(format!("'{file_name}' isn't typst file."));
        return Ok(CompileOutcome::NotStarted);
    };
    let Some(artifact_name) = descriptor.derived_artifact_name(settings.support_typ_md) else {
        notices.push(format!("'{file_name}' isn't typst file."));
        return Ok(CompileOutcome::NotStarted);
    };
    let Some(parent) = vault::parent_rel(rel_path) else {
        notices.push(format!("The parent of '{file_name}' is null."));
        return Ok(CompileOutcome::NotStarted);
    };

    let source_abs = match vault.absolute_path(rel_path) {
        Ok(path) => path,
        Err(e) => {
            notices.push(e.clone());
            return Err(e);
        }
    };
    let pdf_rel = vault::join_rel(parent, &artifact_name);
    let pdf_abs = match vault.absolute_path(&pdf_rel) {
        Ok(path) => path,
        Err(e) => {
            notices.push(e.clone());
            return Err(e);
        }
    };

    let key = source_abs.to_string_lossy().to_string();
    let Some(_guard) = InFlightGuard::acquire(&key) else {
        tracing::debug!(source = %key, "compile already in flight, skipping");
        return Ok(CompileOutcome::AlreadyRunning);
    };

    let binary = cli::resolve_tool(&settings.typst_cli);
    tracing::debug!(%binary, source = %source_abs.display(), pdf = %pdf_abs.display(), "compiling");

    let mut cmd = Command::new(&binary);
    cmd.arg("c").arg(&source_abs).arg(&pdf_abs);
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());

    let result = tokio::time::timeout(
        Duration::from_secs(COMPILE_TIMEOUT_SECS),
        tokio::task::spawn_blocking(move || cmd.output()),
    )
    .await;

    let output = match result {
        Err(_) => {
            let msg = format!(
                "{} timed out after {COMPILE_TIMEOUT_SECS}s compiling '{file_name}'.",
                settings.typst_cli
            );
            notices.push(msg.clone());
            return Err(msg);
        }
        Ok(Err(e)) => {
            let msg = format!("compile task failed: {e}");
            notices.push(msg.clone());
            return Err(msg);
        }
        Ok(Ok(Err(e))) => {
            let msg = format!("Failed to run {}: {e}", settings.typst_cli);
            notices.push(msg.clone());
            return Err(msg);
        }
        Ok(Ok(Ok(output))) => output,
    };

    if !output.status.success() {
        let stderr_bytes = &output.stderr[..output.stderr.len().min(MAX_STDERR_BYTES)];
        let stderr = String::from_utf8_lossy(stderr_bytes);
        let code = output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".into());
        let msg = format!(
            "{} exited with code {code}: {}",
            settings.typst_cli,
            stderr.trim()
        );
        notices.push(msg.clone());
        return Err(msg);
    }

    tracing::debug!(source = %source_abs.display(), "compile finished");
    Ok(CompileOutcome::Compiled)
}
