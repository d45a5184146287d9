pub mod walker;

use std::fmt;

/// A key file's content tagged with its path relative to the scan root.
///
/// An empty path marks caller-supplied contents that were joined before
/// reaching us; those render without a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFile {
    pub path: String,
    pub content: String,
}

impl KeyFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Pre-joined contents with no originating path.
    pub fn untagged(content: impl Into<String>) -> Self {
        Self::new(String::new(), content)
    }
}

impl fmt::Display for KeyFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}\n\n", self.content)
        } else {
            write!(f, "{}:\n{}\n\n", self.path, self.content)
        }
    }
}

/// Concatenate key files in the order given, each followed by a blank line.
pub fn render_key_files(key_files: &[KeyFile]) -> String {
    key_files.iter().map(ToString::to_string).collect()
}

/// Result of scanning a project directory.
#[derive(Debug, Clone, Default)]
pub struct ProjectSnapshot {
    /// Indented tree listing, one entry per line.
    pub structure: String,
    /// Allow-listed files found anywhere in the tree, in walk order.
    pub key_files: Vec<KeyFile>,
}

pub use walker::{ScanOptions, scan_project};
