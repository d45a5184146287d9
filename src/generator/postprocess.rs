//! Shaping raw model text into comments, docstrings and README bodies.

use crate::utils::error::ParrotyError;
use regex::Regex;
use std::sync::LazyLock;

/// Opening fence on its own line, bare or tagged `markdown`/`md`.
/// A fence tagged with any other language is left alone.
static LEADING_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\A```(?:markdown|md)?[ \t]*(?:\r?\n|\z)")
        .expect("leading fence pattern is invalid")
});

/// Opening fence tagged with any language (or none), for code-shaped output.
static LEADING_CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A```[\w+#.-]*[ \t]*(?:\r?\n|\z)").expect("code fence pattern is invalid")
});

/// Closing fence at the very end, on its own line (or the whole text).
static TRAILING_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\A|\r?\n)[ \t]*```\z").expect("trailing fence pattern is invalid")
});

pub const DEFAULT_COMMENT_MARKER: &str = "#";
const DOCSTRING_DELIMITER: &str = "\"\"\"";

/// Strip a wrapping markdown fence pair and trim whitespace.
///
/// The closing fence is only removed together with an opening one, so a
/// document that merely ends in its own code block keeps it intact. Repeats
/// until no opening fence is left, so the function is idempotent even for
/// doubly-fenced responses.
pub fn clean_markdown_response(text: &str) -> String {
    strip_fences(text, &LEADING_FENCE)
}

/// Like [`clean_markdown_response`] but also unwraps language-tagged
/// fences such as ```` ```python ````.
pub fn strip_code_fence(text: &str) -> String {
    strip_fences(text, &LEADING_CODE_FENCE)
}

fn strip_fences(text: &str, leading: &Regex) -> String {
    let mut current = text.trim().to_owned();
    while let Some(opening) = leading.find(&current) {
        let body = current.get(opening.end()..).unwrap_or_default();
        current = TRAILING_FENCE.replace(body, "").trim().to_owned();
    }
    current
}

/// Turn a model summary into a single line comment: `<marker> <text>`.
///
/// Any comment markers the model already added are dropped first so the
/// result always starts with exactly one. A reply with nothing left after
/// that is an [`ParrotyError::EmptyResponse`].
pub fn format_comment(raw: &str, marker: &str) -> Result<String, ParrotyError> {
    let cleaned = strip_code_fence(raw);
    let mut text = cleaned.as_str();
    if !marker.is_empty() {
        while let Some(rest) = text.strip_prefix(marker) {
            text = rest.trim_start();
        }
    }

    if text.is_empty() {
        return Err(ParrotyError::EmptyResponse {
            provider: "model".to_owned(),
            reason: "comment was empty after removing markers".to_owned(),
        });
    }
    if marker.is_empty() {
        return Ok(text.to_owned());
    }
    Ok(format!("{marker} {text}"))
}

/// Wrap model output in Python docstring quotes.
///
/// Multi-line text closes on its own line, single-line text stays inline.
pub fn wrap_docstring(raw: &str) -> String {
    let cleaned = strip_code_fence(raw);
    let text = cleaned
        .strip_prefix(DOCSTRING_DELIMITER)
        .and_then(|rest| rest.strip_suffix(DOCSTRING_DELIMITER))
        .map_or(cleaned.as_str(), str::trim);

    if text.contains('\n') {
        format!("{DOCSTRING_DELIMITER}{text}\n{DOCSTRING_DELIMITER}")
    } else if text.ends_with('"') {
        // A quote right before the delimiter would merge into it
        format!("{DOCSTRING_DELIMITER}{text} {DOCSTRING_DELIMITER}")
    } else {
        format!("{DOCSTRING_DELIMITER}{text}{DOCSTRING_DELIMITER}")
    }
}
