//! # parroty
//!
//! parroty asks a hosted language model to document code:
//!
//! 1. **comment** - a one-line summary comment for a snippet
//! 2. **docstring** - a docstring with `Args:` and `Returns:` sections
//! 3. **readme** - a README built from a project's tree listing and key files
//! 4. **scan** - the tree listing and key files alone, no model call
//!
//! ## Architecture
//!
//! - [`cli`] parses arguments and layered configuration into [`Settings`]
//! - [`packer`] walks a project directory
//! - [`generator`] builds prompts and shapes model output
//! - [`llm`] holds the provider trait, the Gemini provider and the retrying
//!   [`llm::LLMClient`]
//!
//! Configuration follows hierarchical precedence:
//! 1. User config (~/.config/parroty/config.toml)
//! 2. Git root (parroty.toml)
//! 3. Current directory (parroty.toml)
//! 4. Explicit --config path
//! 5. Environment variables (PARROTY_*)
//! 6. CLI flags (highest precedence)

pub mod cli;
pub mod generator;
pub mod llm;
pub mod packer;
pub mod utils;

use anyhow::{Context, Result};
use cli::args::{Args, Command};
use cli::commands::Outcome;
use cli::config::Config;
use llm::providers::gemini::GeminiProvider;
use llm::{CompletionOptions, LLMClient, RetryConfig};
use packer::ScanOptions;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use utils::error::ParrotyError;

/// Final resolved configuration after merging all sources (CLI, env, config files).
#[derive(Debug, Clone)]
pub struct Settings {
    /// Model identifier, e.g. `gemini-2.0-flash`
    pub model: String,
    /// Base URL of the generation API
    pub endpoint: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retry attempts after a transient failure
    pub retries: u32,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
    /// Marker placed before generated comments
    pub comment_marker: String,
    /// Scanner exclusion and key-file globs
    pub scan: ScanOptions,
    /// Verbosity level (0-3)
    pub verbose: u8,
    /// Quiet mode (errors only, no spinner)
    pub quiet: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self::resolve(&Config::default(), None, 0, false)
    }
}

impl Settings {
    /// Merge file/env configuration with CLI overrides.
    pub fn resolve(config: &Config, model: Option<&str>, verbose: u8, quiet: bool) -> Self {
        Self {
            model: model.map_or_else(|| config.model.name.clone(), str::to_owned),
            endpoint: config.model.endpoint.clone(),
            timeout: Duration::from_secs(config.model.timeout),
            retries: config.model.retries,
            temperature: config.model.temperature,
            max_tokens: config.model.max_tokens,
            comment_marker: config.comment.marker.clone(),
            scan: ScanOptions {
                exclude_dirs: config.scan.exclude.clone(),
                key_files: config.scan.key_files.clone(),
            },
            verbose,
            quiet,
        }
    }

    pub fn from_args(args: &Args, config: &Config) -> Self {
        Self::resolve(config, args.model.as_deref(), args.verbose, args.quiet)
    }
}

/// Initialize the tracing subscriber. Logs go to stderr; stdout carries
/// only command output.
///
/// `RUST_LOG` takes precedence over the verbosity flags.
pub fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parroty={level},{level}")));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

/// Build the model client. Fails before any network traffic when the
/// credential is missing or the HTTP client cannot be created.
pub fn build_client(settings: &Settings, api_key: String) -> Result<LLMClient, ParrotyError> {
    let provider = GeminiProvider::with_endpoint(
        api_key,
        settings.model.clone(),
        settings.endpoint.clone(),
        settings.timeout,
    )?;

    Ok(LLMClient::new(Box::new(provider))
        .with_retry_config(RetryConfig {
            max_retries: settings.retries,
            ..RetryConfig::default()
        })
        .with_options(CompletionOptions {
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }))
}

/// Run one command to completion.
pub async fn run(command: &Command, settings: &Settings) -> Result<Outcome> {
    tracing::info!("parroty v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::debug!(
        "Configuration: command={}, model={}, endpoint={}, timeout={:?}, retries={}",
        command.name(),
        settings.model,
        settings.endpoint,
        settings.timeout,
        settings.retries
    );

    // Scanning never needs the model, so it runs without a credential.
    if let Command::Scan { path } = command {
        return cli::commands::run_scan(path, settings);
    }

    cli::commands::check_arguments(command)?;
    let api_key = cli::config::resolve_api_key()?;
    let client = build_client(settings, api_key).context("Failed to initialize the model client")?;
    tracing::info!("Using model {}", client.model());

    cli::commands::run_with_client(command, settings, &client).await
}
