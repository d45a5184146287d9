use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

use console::style;

/// Compiled regex patterns for redacting sensitive data.
///
/// The patterns are literals covered by tests, so the `expect()` calls cannot
/// fire on runtime input.
static REDACTION_PATTERNS: LazyLock<[(regex::Regex, &'static str); 4]> = LazyLock::new(|| {
    [
        (
            regex::Regex::new(r"(?i)\b((?:api[_-]?)?key[=:]\s*)[^\s&]+")
                .expect("api_key redaction pattern is invalid"),
            "${1}[REDACTED]",
        ),
        (
            regex::Regex::new(r"(?i)(x-goog-api-key[=:\s]+)[^\s]+")
                .expect("goog header redaction pattern is invalid"),
            "${1}[REDACTED]",
        ),
        (
            regex::Regex::new(r"(?i)(bearer\s+)[^\s]+")
                .expect("bearer redaction pattern is invalid"),
            "${1}[REDACTED]",
        ),
        (
            regex::Regex::new(r"(AIza[0-9A-Za-z_\-]{20,})")
                .expect("google key redaction pattern is invalid"),
            "[REDACTED]",
        ),
    ]
});

#[derive(Debug, Error)]
pub enum ParrotyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Failed to scan {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("LLM provider error: {provider} - {}", redact_sensitive_data(message))]
    Provider { provider: String, message: String },

    #[error("Rate limited by {provider}, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("{provider} returned no text (finish reason: {reason})")]
    EmptyResponse { provider: String, reason: String },

    #[error("Parse error: {message}")]
    ParseError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{message}\nSuggestion: {suggestion}")]
    ValidationError { message: String, suggestion: String },

    #[error("Network error: {message}")]
    NetworkError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Redact sensitive information from error messages.
fn redact_sensitive_data(message: &str) -> String {
    let mut result = message.to_owned();
    for (pattern, replacement) in REDACTION_PATTERNS.iter() {
        result = pattern.replace_all(&result, *replacement).to_string();
    }
    result
}

impl ParrotyError {
    pub fn missing_api_key(env_var: &str) -> Self {
        Self::ValidationError {
            message: format!("API key not configured ({env_var} is unset or empty)"),
            suggestion: format!(
                "Set the {env_var} environment variable or add it to a .env file in the current directory"
            ),
        }
    }

    pub fn missing_readme_input() -> Self {
        Self::ValidationError {
            message: "readme requires <STRUCTURE> and <CONTENTS>, or --project <DIR>".to_owned(),
            suggestion: "Run `parroty readme --project .` to scan the current directory"
                .to_owned(),
        }
    }

    pub fn empty_input(what: &str) -> Self {
        Self::ValidationError {
            message: format!("No {what} provided"),
            suggestion: "Pass the text as an argument, or `-` to read it from stdin".to_owned(),
        }
    }

    pub(crate) fn scan(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Scan {
            path: path.into(),
            source,
        }
    }

    /// Whether a retry of the same request could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::NetworkError { .. })
    }
}

impl From<serde_json::Error> for ParrotyError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            message: "Failed to parse JSON response".to_owned(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<reqwest::Error> for ParrotyError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "Request timed out. Check your network connection.".to_owned()
        } else if err.is_connect() {
            "Failed to connect to server. Check your network connection.".to_owned()
        } else if err.is_decode() {
            "Failed to decode the response body".to_owned()
        } else if err.is_status() {
            format!(
                "HTTP error: {}",
                err.status()
                    .map_or_else(|| "unknown".to_owned(), |s| s.to_string())
            )
        } else {
            "Network request failed".to_owned()
        };

        Self::NetworkError {
            message,
            source: Some(Box::new(err.without_url())),
        }
    }
}

/// Render an error for the terminal.
///
/// Validation errors get their suggestion on a separate, dimmed line. In
/// verbose mode the `source()` chain is appended.
pub fn format_error(error: &ParrotyError, verbose: bool) -> String {
    let mut out = match error {
        ParrotyError::ValidationError {
            message,
            suggestion,
        } => format!(
            "{} {}\n  {}",
            style("error:").for_stderr().red().bold(),
            message,
            style(suggestion).for_stderr().dim()
        ),
        other => format!("{} {}", style("error:").for_stderr().red().bold(), other),
    };

    if verbose {
        let mut source = std::error::Error::source(error);
        while let Some(cause) = source {
            out.push_str(&format!("\n  caused by: {cause}"));
            source = cause.source();
        }
    }

    out
}
