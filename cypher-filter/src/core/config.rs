use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::filter::CompileOptions;
use crate::utils::file::expand_path;
use crate::utils::string::is_plain_identifier;

use super::cli::CliConfig;
use super::constants::{APP_DOT_FOLDER, CONFIG_FILE_NAME};

// =============================================================================
// File Config (JSON)
// =============================================================================

/// `compiler` section of the config file
#[derive(Debug, Default, Deserialize)]
pub struct CompilerFileConfig {
    pub node_alias: Option<String>,
    pub strict: Option<bool>,
    pub explicit_zero_paging: Option<bool>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub compiler: Option<CompilerFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(compiler) = other.compiler {
            let current = self
                .compiler
                .get_or_insert_with(CompilerFileConfig::default);
            if compiler.node_alias.is_some() {
                tracing::trace!(node_alias = ?compiler.node_alias, "Merging compiler.node_alias");
                current.node_alias = compiler.node_alias;
            }
            if compiler.strict.is_some() {
                tracing::trace!(strict = ?compiler.strict, "Merging compiler.strict");
                current.strict = compiler.strict;
            }
            if compiler.explicit_zero_paging.is_some() {
                tracing::trace!(
                    explicit_zero_paging = ?compiler.explicit_zero_paging,
                    "Merging compiler.explicit_zero_paging"
                );
                current.explicit_zero_paging = compiler.explicit_zero_paging;
            }
        }
    }
}

// =============================================================================
// Application Config
// =============================================================================

/// Resolved application configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub compiler: CompileOptions,
}

impl AppConfig {
    /// Load configuration: profile file, then `--config` or local file, then CLI/env
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Profile dir (~/.cypher-filter/cypher-filter.json), skipped if missing
        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        Self::from_layers(file_config, cli)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn from_layers(file_config: FileConfig, cli: &CliConfig) -> Result<Self> {
        let file_compiler = file_config.compiler.unwrap_or_default();
        let defaults = CompileOptions::default();

        let node_alias = cli
            .node_alias
            .clone()
            .or(file_compiler.node_alias)
            .unwrap_or(defaults.node_alias);

        if !is_plain_identifier(&node_alias) {
            anyhow::bail!(
                "Invalid node alias '{}': expected a plain identifier such as 'n'",
                node_alias
            );
        }

        let compiler = CompileOptions {
            node_alias,
            strict: cli
                .strict
                .or(file_compiler.strict)
                .unwrap_or(defaults.strict),
            explicit_zero_paging: cli
                .explicit_zero_paging
                .or(file_compiler.explicit_zero_paging)
                .unwrap_or(defaults.explicit_zero_paging),
        };

        tracing::debug!(
            node_alias = %compiler.node_alias,
            strict = compiler.strict,
            explicit_zero_paging = compiler.explicit_zero_paging,
            "Compiler configuration resolved"
        );

        Ok(Self { compiler })
    }
}

/// Get the profile config path (~/.cypher-filter/cypher-filter.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
