//! Utility functions shared across the crate.

use std::path::{Path, PathBuf};

use crate::config::Lang;

/// Get the user's config directory following XDG conventions.
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// Derive the output path for a translated document.
///
/// The target language's uppercased name is inserted before the extension:
/// `report.pdf` with target `ru` becomes `report_RUSSIAN.pdf`. Languages
/// without a known English name use the uppercased code itself.
pub fn derived_output_path(input: &Path, target: &Lang) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let suffix = target
        .english_name()
        .map_or_else(|| target.as_str().to_uppercase(), str::to_uppercase);
    input.with_file_name(format!("{stem}_{suffix}.pdf"))
}
