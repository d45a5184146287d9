//! Documentation generation.
//!
//! This module provides:
//! - Prompt builders for comments, docstrings and READMEs
//! - Post-processing of raw model output
//! - The generation operations that tie both to an [`crate::llm::LLMClient`]

pub mod docs;
pub mod postprocess;
pub mod prompts;

pub use docs::{generate_comment, generate_docstring, generate_readme};
pub use postprocess::{clean_markdown_response, format_comment, strip_code_fence, wrap_docstring};
pub use prompts::{build_comment_prompt, build_docstring_prompt, build_readme_prompt};
