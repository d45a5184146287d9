//! Configuration management using the `config` crate for hierarchical discovery and merging.
//!
//! ## Configuration Sources (in precedence order, highest to lowest):
//! 1. **CLI flags** - Highest precedence (applied in [`crate::Settings::resolve`])
//! 2. **Environment variables** - Middle precedence (via `PARROTY_*` prefix)
//! 3. **Config files** - Lowest precedence
//!
//! ## Config File Discovery (in merge order, later overrides earlier):
//! 1. `~/.config/parroty/config.toml` (user config directory)
//! 2. `parroty.toml` in the git repository root (walking up from the current directory)
//! 3. `./parroty.toml` in the current directory
//! 4. Explicit `--config` path (must exist when given)
//!
//! The API credential is not part of these files. It comes from
//! `GEMINI_API_KEY`, optionally seeded from a `.env` file in the current
//! directory (see [`resolve_api_key`]).

use crate::cli::args::Args;
use crate::generator::postprocess::DEFAULT_COMMENT_MARKER;
use crate::llm::providers::gemini::{API_KEY_ENV, DEFAULT_MODEL, GEMINI_API_URL};
use crate::packer::walker::{DEFAULT_EXCLUDED_DIRS, DEFAULT_KEY_FILES};
use crate::utils::error::ParrotyError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "parroty.toml";

/// Root configuration structure loaded from config files.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub comment: CommentConfig,
}

/// Remote model settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model")]
    pub name: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            endpoint: default_endpoint(),
            timeout: default_timeout(),
            retries: default_retries(),
            temperature: None,
            max_tokens: None,
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_owned()
}

fn default_endpoint() -> String {
    GEMINI_API_URL.to_owned()
}

const fn default_timeout() -> u64 {
    120
}

const fn default_retries() -> u32 {
    3
}

/// Project scanner name lists.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    #[serde(default = "default_key_files")]
    pub key_files: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exclude: default_exclude(),
            key_files: default_key_files(),
        }
    }
}

fn default_exclude() -> Vec<String> {
    DEFAULT_EXCLUDED_DIRS.iter().map(|s| (*s).to_owned()).collect()
}

fn default_key_files() -> Vec<String> {
    DEFAULT_KEY_FILES.iter().map(|s| (*s).to_owned()).collect()
}

/// Comment output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommentConfig {
    #[serde(default = "default_marker")]
    pub marker: String,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
        }
    }
}

fn default_marker() -> String {
    DEFAULT_COMMENT_MARKER.to_owned()
}

fn discover_config_paths(explicit_path: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // User config (lowest precedence)
    if let Some(user_config) = get_user_config_path() {
        paths.push(user_config);
    }

    // Git root config
    let current_dir_config = PathBuf::from(CONFIG_FILE_NAME);
    if let Some(git_root) = find_git_root() {
        let git_config = git_root.join(CONFIG_FILE_NAME);
        let is_cwd_config = std::fs::canonicalize(&git_config).ok()
            == std::fs::canonicalize(&current_dir_config).ok();
        if git_config.exists() && !is_cwd_config {
            paths.push(git_config);
        }
    }

    // Current directory config
    if current_dir_config.exists() {
        paths.push(current_dir_config);
    }

    // Explicit --config path (highest precedence)
    if explicit_path != Path::new(CONFIG_FILE_NAME) {
        paths.push(explicit_path.to_path_buf());
    }

    paths
}

fn find_git_root() -> Option<PathBuf> {
    git2::Repository::discover(".")
        .ok()
        .and_then(|repo| repo.workdir().map(Path::to_path_buf))
}

fn get_user_config_path() -> Option<PathBuf> {
    dirs::config_dir()
        .map(|config_dir| config_dir.join("parroty").join("config.toml"))
        .filter(|path| path.exists())
}

/// Load configuration from discovered config files and environment variables.
pub fn load(args: &Args) -> Result<Config> {
    let mut builder = config::Config::builder();

    for config_path in discover_config_paths(&args.config) {
        tracing::debug!("Loading config file {}", config_path.display());
        builder = builder.add_source(config::File::from(config_path));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("PARROTY")
            .separator("_")
            .try_parsing(true),
    );

    let settings = builder.build().context("Failed to build configuration")?;

    settings
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Read the API credential, loading `./.env` first if it exists.
///
/// Variables already present in the environment win over `.env` entries.
pub fn resolve_api_key() -> Result<String, ParrotyError> {
    match dotenvy::from_path(".env") {
        Ok(()) => tracing::debug!("Loaded .env from the current directory"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {e}"),
    }
    api_key_from(std::env::var(API_KEY_ENV).ok())
}

/// Validate a credential value: it must be present and not blank.
pub fn api_key_from(value: Option<String>) -> Result<String, ParrotyError> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ParrotyError::missing_api_key(API_KEY_ENV))
}
