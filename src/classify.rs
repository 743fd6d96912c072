//! Typst source classification.
//!
//! Two naming conventions mark a file as compilable typst input: a plain
//! `.typ` extension, or the `name.typ.md` alias convention that keeps a typst
//! document markdown-recognized by other tools while this plugin treats it as
//! source. Everything here is pure string logic; callers supply the file name
//! and its extension (the extension is always derived from the name, never
//! stored independently).

/// Extension of a file name: the part after the last `.`, or `""` when the
/// name has no dot. `".typ.md"` → `"md"`, `"README"` → `""`.
pub fn extension_of(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => "",
    }
}

/// File name minus the trailing `.{extension}` suffix. When the extension is
/// empty (no dot in the name) the base name is the name itself.
pub fn base_name<'a>(name: &'a str, extension: &str) -> &'a str {
    if extension.is_empty() {
        return name;
    }
    name.strip_suffix(extension)
        .and_then(|n| n.strip_suffix('.'))
        .unwrap_or(name)
}

/// Whether a file qualifies as compilable typst source.
///
/// Comparisons are case-sensitive exact matches on `"typ"` / `"md"`. With
/// `typ_md` enabled, a markdown file whose base name itself ends in `.typ`
/// (e.g. `report.typ.md`) also qualifies. A file literally named `.typ.md`
/// has an empty effective base and is still accepted.
pub fn is_typst_source(name: &str, extension: &str, typ_md: bool) -> bool {
    if extension == "typ" {
        return true;
    }
    typ_md && extension == "md" && base_name(name, extension).ends_with(".typ")
}

/// Base name of the derived artifact for a typst source, or `None` when the
/// file is not a source. Agrees exactly with [`is_typst_source`]: returns
/// `Some` iff the classifier returns `true`.
///
/// `report.typ` → `"report"`; `report.typ.md` (typ_md on) → `"report"`.
pub fn derived_base_name(name: &str, extension: &str, typ_md: bool) -> Option<String> {
    if extension == "typ" {
        return Some(base_name(name, extension).to_string());
    }
    if typ_md && extension == "md" {
        let base = base_name(name, extension);
        if let Some(stripped) = base.strip_suffix(".typ") {
            return Some(stripped.to_string());
        }
    }
    None
}

/// Expected derived artifact file name (`{base}.pdf`), or `None` for
/// non-sources.
pub fn derived_artifact_name(name: &str, extension: &str, typ_md: bool) -> Option<String> {
    derived_base_name(name, extension, typ_md).map(|base| format!("{base}.pdf"))
}
