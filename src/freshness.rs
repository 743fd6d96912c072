//! Derived-artifact freshness policy.
//!
//! A compiled PDF is considered fresh when its creation time is not earlier
//! than its source's modification time. The comparison is deliberately
//! createdAt-vs-modifiedAt (not mtime-vs-mtime) and a tie counts as fresh;
//! callers should be aware that coarse filesystem timestamp resolution can
//! make a just-compiled artifact tie with its source.

use crate::classify;

/// A candidate compilable file at the moment of a user action. Extension and
/// base name are derived from the name on construction and never settable
/// independently.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDescriptor {
    pub name: String,
    pub extension: String,
    pub base_name: String,
    /// Modification time, epoch milliseconds.
    pub modified_at_ms: i64,
}

impl SourceDescriptor {
    pub fn new(name: impl Into<String>, modified_at_ms: i64) -> Self {
        let name = name.into();
        let extension = classify::extension_of(&name).to_string();
        let base_name = classify::base_name(&name, &extension).to_string();
        Self {
            name,
            extension,
            base_name,
            modified_at_ms,
        }
    }

    /// Whether this file classifies as typst source under the given alias
    /// setting.
    pub fn is_typst(&self, typ_md: bool) -> bool {
        classify::is_typst_source(&self.name, &self.extension, typ_md)
    }

    /// Expected PDF file name for this source, `None` for non-sources.
    pub fn derived_artifact_name(&self, typ_md: bool) -> Option<String> {
        classify::derived_artifact_name(&self.name, &self.extension, typ_md)
    }
}

/// Stat of an existing derived artifact. Absence of the artifact is modeled
/// as `Option::None` at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedArtifactStat {
    /// Creation time, epoch milliseconds.
    pub created_at_ms: i64,
}

/// Whether the derived artifact must be regenerated. Missing artifact means
/// compile; an existing one is stale only when strictly older than the
/// source's modification time (tie = fresh).
pub fn needs_recompile(source: &SourceDescriptor, derived: Option<DerivedArtifactStat>) -> bool {
    match derived {
        None => true,
        Some(artifact) => artifact.created_at_ms < source.modified_at_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_derives_extension_and_base() {
        let src = SourceDescriptor::new("report.typ", 100);
        assert_eq!(src.extension, "typ");
        assert_eq!(src.base_name, "report");

        let aliased = SourceDescriptor::new("report.typ.md", 100);
        assert_eq!(aliased.extension, "md");
        assert_eq!(aliased.base_name, "report.typ");
        assert_eq!(aliased.derived_artifact_name(true).as_deref(), Some("report.pdf"));
        assert_eq!(aliased.derived_artifact_name(false), None);
    }

    #[test]
    fn missing_artifact_needs_compile() {
        let src = SourceDescriptor::new("report.typ", 100);
        assert!(needs_recompile(&src, None));
    }

    #[test]
    fn older_artifact_is_stale() {
        let src = SourceDescriptor::new("report.typ", 100);
        assert!(needs_recompile(&src, Some(DerivedArtifactStat { created_at_ms: 50 })));
    }

    #[test]
    fn equal_timestamps_count_as_fresh() {
        let src = SourceDescriptor::new("report.typ", 100);
        assert!(!needs_recompile(&src, Some(DerivedArtifactStat { created_at_ms: 100 })));
    }

    #[test]
    fn newer_artifact_is_fresh() {
        let src = SourceDescriptor::new("report.typ", 100);
        assert!(!needs_recompile(&src, Some(DerivedArtifactStat { created_at_ms: 200 })));
    }
}
