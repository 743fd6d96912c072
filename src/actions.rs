//! Contextual actions and explorer click dispatch.
//!
//! Instead of registering callbacks against the host's menu builder, the
//! plugin exposes a declarative list of actions with scope predicates; the
//! host bridge renders whatever [`actions_for`] returns for the entry under
//! the cursor. Click interception works the same way: the host reports the
//! clicked entry's vault path and maps the returned [`ClickOutcome`] back
//! onto its explorer (pass through, suppress, or open a file in a pane).

use crate::classify;
use crate::compile::{self, CompileOutcome};
use crate::config::{TypstHelperSettings, WhenClicked};
use crate::freshness::{self, DerivedArtifactStat};
use crate::notice::Notices;
use crate::vault::{self, Vault};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionId {
    NewNote,
    OpenWithEditor,
    Compile,
}

/// Which explorer entries an action applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionScope {
    Folder,
    TypstFile,
}

/// One context-menu contribution: label and icon as the host displays them,
/// scope as the predicate for showing it.
#[derive(Debug, Clone, Copy)]
pub struct ContextAction {
    pub id: ActionId,
    pub label: &'static str,
    pub icon: &'static str,
    pub scope: ActionScope,
}

/// The plugin's three menu contributions.
pub const CONTEXT_ACTIONS: &[ContextAction] = &[
    ContextAction {
        id: ActionId::NewNote,
        label: "typst: new note",
        icon: "square-pen",
        scope: ActionScope::Folder,
    },
    ContextAction {
        id: ActionId::OpenWithEditor,
        label: "typst: open with editor",
        icon: "popup-open",
        scope: ActionScope::TypstFile,
    },
    ContextAction {
        id: ActionId::Compile,
        label: "typst: compile",
        icon: "popup-open",
        scope: ActionScope::TypstFile,
    },
];

/// An explorer entry as the host reports it.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Vault-relative path, `/`-separated.
    pub path: String,
    pub is_dir: bool,
}

/// Context actions applicable to an entry under the current settings.
pub fn actions_for(entry: &FileEntry, settings: &TypstHelperSettings) -> Vec<&'static ContextAction> {
    let name = vault::file_name_of(&entry.path);
    let extension = classify::extension_of(name);
    CONTEXT_ACTIONS
        .iter()
        .filter(|action| match action.scope {
            ActionScope::Folder => entry.is_dir,
            ActionScope::TypstFile => {
                !entry.is_dir
                    && classify::is_typst_source(name, extension, settings.support_typ_md)
            }
        })
        .collect()
}

/// What the host should do after a capturing-phase explorer click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Not a typst file: let the host's default navigation run.
    PassThrough,
    /// Default navigation suppressed, nothing to open.
    Suppressed,
    /// Default navigation suppressed; open this vault-relative file instead.
    OpenFile(String),
}

/// Dispatch a click on an explorer entry according to the `when_clicked`
/// setting. Every failure along the way is terminal for this click: one
/// notice, suppression, and the user retries manually.
pub async fn handle_file_click(
    settings: &TypstHelperSettings,
    vault: &Vault,
    rel_path: &str,
    notices: &Notices,
) -> ClickOutcome {
    let Some(descriptor) = vault.source_descriptor(rel_path) else {
        return ClickOutcome::PassThrough;
    };
    let Some(artifact_name) = descriptor.derived_artifact_name(settings.support_typ_md) else {
        return ClickOutcome::PassThrough;
    };
    let Some(parent) = vault::parent_rel(rel_path) else {
        return ClickOutcome::PassThrough;
    };
    let pdf_rel = vault::join_rel(parent, &artifact_name);

    match settings.when_clicked {
        WhenClicked::None => ClickOutcome::Suppressed,
        WhenClicked::Pdf => {
            if vault.exists(&pdf_rel) {
                ClickOutcome::OpenFile(pdf_rel)
            } else {
                notices.push(format!("'{artifact_name}' does not exist."));
                ClickOutcome::Suppressed
            }
        }
        WhenClicked::Compile => {
            let derived = vault.stat(&pdf_rel).map(|stat| DerivedArtifactStat {
                created_at_ms: stat.created_at_ms,
            });
            if freshness::needs_recompile(&descriptor, derived) {
                match compile::compile_source(settings, vault, rel_path, notices).await {
                    Ok(CompileOutcome::Compiled) => {}
                    // Rejected, already running, or failed — a notice is
                    // already out where one is due; just suppress.
                    Ok(_) | Err(_) => return ClickOutcome::Suppressed,
                }
            }
            if vault.exists(&pdf_rel) {
                ClickOutcome::OpenFile(pdf_rel)
            } else {
                notices.push(format!("'{artifact_name}' does not exist."));
                ClickOutcome::Suppressed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(path: &str, is_dir: bool) -> FileEntry {
        FileEntry {
            path: path.to_string(),
            is_dir,
        }
    }

    fn labels(actions: &[&ContextAction]) -> Vec<&'static str> {
        actions.iter().map(|a| a.label).collect()
    }

    #[test]
    fn folders_get_new_note() {
        let settings = TypstHelperSettings::default();
        let actions = actions_for(&entry("notes", true), &settings);
        assert_eq!(labels(&actions), ["typst: new note"]);
    }

    #[test]
    fn typst_files_get_editor_and_compile() {
        let settings = TypstHelperSettings::default();
        let actions = actions_for(&entry("notes/report.typ", false), &settings);
        assert_eq!(
            labels(&actions),
            ["typst: open with editor", "typst: compile"]
        );
    }

    #[test]
    fn aliased_files_follow_the_setting() {
        let mut settings = TypstHelperSettings::default();
        assert_eq!(
            actions_for(&entry("report.typ.md", false), &settings).len(),
            2
        );
        settings.support_typ_md = false;
        assert!(actions_for(&entry("report.typ.md", false), &settings).is_empty());
    }

    #[test]
    fn other_files_get_nothing() {
        let settings = TypstHelperSettings::default();
        assert!(actions_for(&entry("notes.md", false), &settings).is_empty());
        assert!(actions_for(&entry("report.pdf", false), &settings).is_empty());
    }

    // -- click dispatch ----------------------------------------------------

    fn click_settings(cli: &str, when_clicked: WhenClicked) -> TypstHelperSettings {
        TypstHelperSettings {
            typst_cli: cli.to_string(),
            when_clicked,
            support_typ_md: true,
        }
    }

    /// Executable stand-in for the typst CLI: appends argv to `log`, creates
    /// the pdf it was asked for.
    #[cfg(unix)]
    fn fake_typst(dir: &std::path::Path, log: &std::path::Path) -> String {
        use std::os::unix::fs::PermissionsExt;
        let script = dir.join("fake-typst");
        let contents = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$*\" >> \"{}\"\n: > \"$3\"\n",
            log.display()
        );
        std::fs::write(&script, contents).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script.to_string_lossy().to_string()
    }

    #[cfg(unix)]
    fn compile_calls(log: &std::path::Path) -> usize {
        std::fs::read_to_string(log)
            .map(|calls| calls.lines().count())
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn non_typst_click_passes_through() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.md"), "plain").unwrap();
        let vault = Vault::new(dir.path());
        let notices = Notices::new();
        let settings = click_settings("typst", WhenClicked::Compile);

        let outcome = handle_file_click(&settings, &vault, "notes.md", &notices).await;
        assert_eq!(outcome, ClickOutcome::PassThrough);
        assert!(notices.is_empty());
    }

    #[tokio::test]
    async fn unknown_path_passes_through() {
        let dir = TempDir::new().unwrap();
        let vault = Vault::new(dir.path());
        let notices = Notices::new();
        let settings = click_settings("typst", WhenClicked::Pdf);

        let outcome = handle_file_click(&settings, &vault, "ghost.typ", &notices).await;
        assert_eq!(outcome, ClickOutcome::PassThrough);
    }

    #[tokio::test]
    async fn none_mode_only_suppresses() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("report.typ"), "").unwrap();
        let vault = Vault::new(dir.path());
        let notices = Notices::new();
        let settings = click_settings("typst", WhenClicked::None);

        let outcome = handle_file_click(&settings, &vault, "report.typ", &notices).await;
        assert_eq!(outcome, ClickOutcome::Suppressed);
        assert!(notices.is_empty());
    }

    #[tokio::test]
    async fn pdf_mode_opens_existing_artifact() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("report.typ"), "").unwrap();
        std::fs::write(dir.path().join("report.pdf"), "%PDF").unwrap();
        let vault = Vault::new(dir.path());
        let notices = Notices::new();
        let settings = click_settings("typst", WhenClicked::Pdf);

        let outcome = handle_file_click(&settings, &vault, "report.typ", &notices).await;
        assert_eq!(outcome, ClickOutcome::OpenFile("report.pdf".to_string()));
    }

    #[tokio::test]
    async fn pdf_mode_notices_missing_artifact() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("report.typ"), "").unwrap();
        let vault = Vault::new(dir.path());
        let notices = Notices::new();
        let settings = click_settings("typst", WhenClicked::Pdf);

        let outcome = handle_file_click(&settings, &vault, "report.typ", &notices).await;
        assert_eq!(outcome, ClickOutcome::Suppressed);
        assert_eq!(
            notices.last_message().as_deref(),
            Some("'report.pdf' does not exist.")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn compile_mode_compiles_missing_pdf_then_opens() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("calls.log");
        let cli = fake_typst(dir.path(), &log);
        std::fs::write(dir.path().join("report.typ"), "= Title").unwrap();

        let vault = Vault::new(dir.path());
        let notices = Notices::new();
        let settings = click_settings(&cli, WhenClicked::Compile);

        let outcome = handle_file_click(&settings, &vault, "report.typ", &notices).await;
        assert_eq!(outcome, ClickOutcome::OpenFile("report.pdf".to_string()));
        assert_eq!(compile_calls(&log), 1);

        let calls = std::fs::read_to_string(&log).unwrap();
        assert_eq!(
            calls.trim(),
            format!(
                "c {} {}",
                dir.path().join("report.typ").display(),
                dir.path().join("report.pdf").display()
            )
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn compile_mode_recompiles_stale_pdf() {
        use std::time::{Duration, SystemTime};

        let dir = TempDir::new().unwrap();
        let log = dir.path().join("calls.log");
        let cli = fake_typst(dir.path(), &log);

        // pdf first, source modified well after it was created
        std::fs::write(dir.path().join("report.pdf"), "%PDF").unwrap();
        std::fs::write(dir.path().join("report.typ"), "= Title").unwrap();
        let source = std::fs::File::options()
            .append(true)
            .open(dir.path().join("report.typ"))
            .unwrap();
        source
            .set_modified(SystemTime::now() + Duration::from_secs(10))
            .unwrap();

        let vault = Vault::new(dir.path());
        let notices = Notices::new();
        let settings = click_settings(&cli, WhenClicked::Compile);

        let outcome = handle_file_click(&settings, &vault, "report.typ", &notices).await;
        assert_eq!(outcome, ClickOutcome::OpenFile("report.pdf".to_string()));
        assert_eq!(compile_calls(&log), 1, "stale pdf must trigger one compile");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn compile_mode_opens_fresh_pdf_without_compiling() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("calls.log");
        let cli = fake_typst(dir.path(), &log);

        // source first, pdf created at or after the source's mtime
        std::fs::write(dir.path().join("report.typ"), "= Title").unwrap();
        std::fs::write(dir.path().join("report.pdf"), "%PDF").unwrap();

        let vault = Vault::new(dir.path());
        let notices = Notices::new();
        let settings = click_settings(&cli, WhenClicked::Compile);

        let outcome = handle_file_click(&settings, &vault, "report.typ", &notices).await;
        assert_eq!(outcome, ClickOutcome::OpenFile("report.pdf".to_string()));
        assert_eq!(compile_calls(&log), 0, "fresh pdf must not recompile");
        assert!(notices.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn compile_mode_suppresses_on_compiler_failure() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("fake-typst");
        std::fs::write(&script, "#!/bin/sh\necho 'error: boom' >&2\nexit 2\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        std::fs::write(dir.path().join("report.typ"), "= Broken").unwrap();

        let vault = Vault::new(dir.path());
        let notices = Notices::new();
        let settings = click_settings(&script.to_string_lossy(), WhenClicked::Compile);

        let outcome = handle_file_click(&settings, &vault, "report.typ", &notices).await;
        assert_eq!(outcome, ClickOutcome::Suppressed);
        let message = notices.last_message().unwrap();
        assert!(message.contains("boom"), "got: {message}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn compile_mode_handles_aliased_sources_in_subfolders() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("calls.log");
        let cli = fake_typst(dir.path(), &log);
        std::fs::create_dir(dir.path().join("notes")).unwrap();
        std::fs::write(dir.path().join("notes/report.typ.md"), "= Title").unwrap();

        let vault = Vault::new(dir.path());
        let notices = Notices::new();
        let settings = click_settings(&cli, WhenClicked::Compile);

        let outcome = handle_file_click(&settings, &vault, "notes/report.typ.md", &notices).await;
        assert_eq!(
            outcome,
            ClickOutcome::OpenFile("notes/report.pdf".to_string())
        );
        assert!(dir.path().join("notes/report.pdf").is_file());
    }
}
