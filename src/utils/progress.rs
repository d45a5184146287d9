// Copyright (c) 2025-2026 the parroty contributors
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};

/// Stage name constants for consistent progress display.
pub mod stages {
    /// Project directory scan.
    pub const SCANNING: &str = "scanning";
    /// Waiting on the model.
    pub const GENERATING: &str = "generating";
}

/// Spinner shown on stderr while a stage runs.
///
/// Output on stdout is the command's result, so the spinner never touches it.
/// When stderr is not a terminal (an editor extension spawning the binary,
/// CI, pipes) or quiet mode is on, the spinner is hidden and produces no
/// output at all.
#[derive(Debug)]
pub struct StageSpinner {
    bar: ProgressBar,
}

impl StageSpinner {
    /// Starts a spinner for the given stage.
    #[must_use]
    pub fn start(stage: &str, detail: &str, quiet: bool) -> Self {
        let bar = if quiet || !Term::stderr().is_term() {
            ProgressBar::hidden()
        } else {
            let spinner = ProgressBar::new_spinner();
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner
        };
        bar.set_style(Self::style_for_stage(stage));
        bar.set_message(detail.to_owned());
        Self { bar }
    }

    /// Whether the spinner is drawing anything.
    pub fn is_visible(&self) -> bool {
        !self.bar.is_hidden()
    }

    /// Clears the spinner. Called on both success and failure.
    pub fn finish(self) {
        self.bar.finish_and_clear();
    }

    fn style_for_stage(stage: &str) -> ProgressStyle {
        let template = match stage {
            stages::SCANNING => "{spinner:.green} Scanning {msg}",
            stages::GENERATING => "{spinner:.green} Generating {msg} [{elapsed}]",
            _ => "{spinner:.green} {msg}",
        };

        ProgressStyle::default_spinner()
            .template(template)
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to parse spinner template for stage '{stage}': {e}");
                ProgressStyle::default_spinner()
            })
    }
}
