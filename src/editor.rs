//! External editor launch.
//!
//! Opens the parent directory of a typst file in the `code` editor. The
//! subprocess is an explicit fire-and-forget task: detached, standard streams
//! ignored, child handle dropped — the plugin never waits for, cancels, or
//! observes the editor's exit. A missing `code` binary is surfaced as a
//! notice; a failure to launch after a positive probe is only logged (the
//! probe is advisory, not a guarantee).

use std::process::{Command, Stdio};

use crate::cli;
use crate::notice::Notices;
use crate::vault::{self, Vault};

const EDITOR_TOOL: &str = "code";

/// Open the parent directory of `rel_path` in the external editor.
pub fn open_with_editor(vault: &Vault, rel_path: &str, notices: &Notices) -> Result<(), String> {
    open_with_editor_tool(vault, rel_path, notices, EDITOR_TOOL)
}

fn open_with_editor_tool(
    vault: &Vault,
    rel_path: &str,
    notices: &Notices,
    tool: &str,
) -> Result<(), String> {
    if !cli::tool_exists(tool) {
        notices.push(format!("{tool}: command not found."));
        return Ok(());
    }

    let Some(parent) = vault::parent_rel(rel_path) else {
        notices.push(format!(
            "The parent of '{}' is null.",
            vault::file_name_of(rel_path)
        ));
        return Ok(());
    };
    let dir = vault.absolute_path(parent)?;

    let mut cmd = launch_command(tool);
    cmd.arg(&dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    {
        // Detach into its own process group so the editor outlives the host.
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    match cmd.spawn() {
        Ok(child) => {
            tracing::debug!(%tool, dir = %dir.display(), pid = child.id(), "editor launched");
            drop(child);
        }
        Err(e) => {
            // Probe said the tool exists but the launch still failed; terminal
            // for this action, diagnostic log only.
            tracing::error!(%tool, "failed to launch editor: {e}");
        }
    }
    Ok(())
}

#[cfg(not(windows))]
fn launch_command(tool: &str) -> Command {
    Command::new(cli::resolve_tool(tool))
}

/// `code` on Windows is a `.cmd` shim, which `CreateProcess` won't run
/// directly.
#[cfg(windows)]
fn launch_command(tool: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(cli::resolve_tool(tool));
    cmd
}
