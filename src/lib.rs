//! Typst helper backend for a note-taking host's file explorer.
//!
//! The host application owns the vault index, the explorer DOM and the
//! settings widgets; this crate owns everything behind them: classifying
//! typst sources, deciding whether a compiled PDF is stale, probing for and
//! invoking the external compiler and editor, and turning explorer clicks
//! into outcomes the host applies. The core policy modules ([`classify`],
//! [`freshness`]) are pure and host-independent; [`TypstHelper`] is the thin
//! facade a host bridge drives.

pub mod actions;
pub mod classify;
pub mod cli;
pub mod compile;
pub mod config;
pub mod editor;
pub mod freshness;
pub mod notice;
pub mod vault;

pub use actions::{
    ActionId, ActionScope, ClickOutcome, ContextAction, FileEntry, actions_for, handle_file_click,
};
pub use compile::{CompileOutcome, compile_source};
pub use config::{TypstHelperSettings, WhenClicked, load_settings, save_settings};
pub use freshness::{DerivedArtifactStat, SourceDescriptor, needs_recompile};
pub use notice::{Notice, Notices};
pub use vault::{FileStat, Vault};

/// Install the diagnostic log subscriber. Call once from the host bridge;
/// respects `RUST_LOG`, defaults to `typst_helper=info`. Safe to call when a
/// subscriber is already installed.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("typst_helper=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

/// The plugin facade the host bridge holds for the lifetime of a vault.
///
/// Settings are not cached here: every entry point loads a fresh immutable
/// snapshot, so a settings change applies to the next user action without a
/// reload. Notices accumulate in a shared buffer the host drains for display.
pub struct TypstHelper {
    vault: Vault,
    notices: Notices,
}

impl TypstHelper {
    /// Create a helper for the vault rooted at `base_path`.
    pub fn new(base_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            vault: Vault::new(base_path),
            notices: Notices::new(),
        }
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    /// Handle to the notice buffer for the host to drain.
    pub fn notices(&self) -> Notices {
        self.notices.clone()
    }

    /// Context-menu actions for the entry under the cursor.
    pub fn context_actions(&self, entry: &FileEntry) -> Vec<&'static ContextAction> {
        let settings = config::load_settings();
        actions_for(entry, &settings)
    }

    /// "typst: new note" — create a collision-avoided `Untitled[_N].typ`.
    pub fn new_note(&self, folder_rel: &str) -> Result<String, String> {
        self.vault.create_untitled_note(folder_rel)
    }

    /// "typst: open with editor" — fire-and-forget launch on the parent dir.
    pub fn open_with_editor(&self, rel_path: &str) -> Result<(), String> {
        editor::open_with_editor(&self.vault, rel_path, &self.notices)
    }

    /// "typst: compile" — compile the file into its PDF.
    pub async fn compile(&self, rel_path: &str) -> Result<CompileOutcome, String> {
        let settings = config::load_settings();
        compile_source(&settings, &self.vault, rel_path, &self.notices).await
    }

    /// Capturing-phase explorer click on `rel_path`.
    pub async fn on_file_click(&self, rel_path: &str) -> ClickOutcome {
        let settings = config::load_settings();
        handle_file_click(&settings, &self.vault, rel_path, &self.notices).await
    }
}
