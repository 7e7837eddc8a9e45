//! File utility functions

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Expand a user-supplied path to an absolute path.
///
/// `~` and `~/rest` resolve against the home directory; relative paths
/// resolve against the current directory; absolute paths pass through.
///
/// ```text
/// expand_path("~/.cypher-filter") // -> /home/user/.cypher-filter
/// expand_path("filters/a.json")   // -> /current/dir/filters/a.json
/// expand_path("/etc/filter.json") // -> /etc/filter.json
/// ```
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    }

    let expanded = if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(path))
    } else if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir().map_or_else(|| PathBuf::from(path), |home| home.join(rest))
    } else {
        PathBuf::from(path)
    };

    if expanded.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    } else {
        expanded
    }
}

/// Read a JSON input file after path expansion
pub fn read_json_file(path: &Path) -> Result<String> {
    let expanded = expand_path(&path.to_string_lossy());
    tracing::debug!(path = %expanded.display(), "Reading JSON input");
    fs::read_to_string(&expanded)
        .with_context(|| format!("Failed to read file: {}", expanded.display()))
}
