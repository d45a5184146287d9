// Copyright (c) 2025-2026 the parroty contributors
// SPDX-License-Identifier: Apache-2.0

//! Prompt generation for the three documentation tasks.
//!
//! Templates live under `prompts/` and are compiled in. Placeholders use
//! `{{name}}` and are substituted in a single pass, so text supplied by the
//! caller is never re-scanned for placeholders.
//!
//! # Example
//!
//! ```
//! use parroty::generator::prompts::build_comment_prompt;
//!
//! let prompt = build_comment_prompt("def add(a, b):\n    return a + b");
//! assert!(prompt.contains("return a + b"));
//! ```

use crate::packer::{KeyFile, render_key_files};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Role instruction sent as the system message for comments and docstrings.
pub const DOCUMENTATION_SYSTEM_PROMPT: &str = "You are an expert programmer writing documentation.";

/// Role instruction sent as the system message for READMEs.
pub const README_SYSTEM_PROMPT: &str =
    "You are an expert technical writer creating README files for software projects.";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([a-z_]+)\}\}").expect("placeholder pattern is invalid")
});

static BACKTICK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`{3,}").expect("backtick pattern is invalid"));

/// Load the one-line comment prompt template.
pub fn comment_template() -> &'static str {
    include_str!("../../prompts/comment.md")
}

/// Load the docstring prompt template.
pub fn docstring_template() -> &'static str {
    include_str!("../../prompts/docstring.md")
}

/// Load the README prompt template.
pub fn readme_template() -> &'static str {
    include_str!("../../prompts/readme.md")
}

/// Substitute `{{name}}` placeholders from `vars`. Unknown names are left as-is.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let name = caps.get(1).map_or("", |m| m.as_str());
            vars.iter()
                .find(|(key, _)| *key == name)
                .map_or_else(|| caps[0].to_owned(), |(_, value)| (*value).to_owned())
        })
        .into_owned()
}

/// A backtick fence longer than any run of backticks inside `text`, so the
/// embedded text cannot close the block early.
fn fence_for(text: &str) -> String {
    let longest = BACKTICK_RUN
        .find_iter(text)
        .map(|m| m.len())
        .max()
        .unwrap_or(0);
    "`".repeat(longest.saturating_add(1).max(3))
}

/// Build the prompt asking for a single-sentence summary of `snippet`.
pub fn build_comment_prompt(snippet: &str) -> String {
    let fence = fence_for(snippet);
    render(
        comment_template(),
        &[("snippet", snippet), ("fence", fence.as_str())],
    )
}

/// Build the prompt asking for a docstring with `Args:` and `Returns:`
/// sections.
pub fn build_docstring_prompt(snippet: &str) -> String {
    let fence = fence_for(snippet);
    render(
        docstring_template(),
        &[("snippet", snippet), ("fence", fence.as_str())],
    )
}

/// Build the README prompt from a tree listing and path-tagged key files.
///
/// # Arguments
///
/// * `project_structure` - Indented tree listing of the project
/// * `key_files` - Key file contents, rendered in order as `path:\ncontent`
pub fn build_readme_prompt(project_structure: &str, key_files: &[KeyFile]) -> String {
    let file_contents = render_key_files(key_files);
    let structure_fence = fence_for(project_structure);
    let contents_fence = fence_for(&file_contents);
    render(
        readme_template(),
        &[
            ("project_structure", project_structure.trim_end()),
            ("file_contents", file_contents.trim_end()),
            ("structure_fence", structure_fence.as_str()),
            ("contents_fence", contents_fence.as_str()),
        ],
    )
}
