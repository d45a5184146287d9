//! Command handlers behind the CLI dispatcher.
//!
//! Each handler returns the text destined for stdout; printing and exit
//! codes stay in `main`.

use crate::Settings;
use crate::cli::args::Command;
use crate::generator::{generate_comment, generate_docstring, generate_readme};
use crate::llm::LLMClient;
use crate::packer::{KeyFile, ProjectSnapshot, scan_project};
use crate::utils::error::ParrotyError;
use crate::utils::progress::{StageSpinner, stages};
use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

/// Output of a command run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Text for stdout.
    Print(String),
    /// A file was written; the message goes to stderr.
    Wrote(String),
}

/// Run a model-backed command with an already constructed client.
pub async fn run_with_client(
    command: &Command,
    settings: &Settings,
    client: &LLMClient,
) -> Result<Outcome> {
    match command {
        Command::Comment { snippet, marker } => {
            let snippet = read_snippet(snippet, "code snippet")?;
            let marker = marker.as_deref().unwrap_or(&settings.comment_marker);
            let spinner = StageSpinner::start(stages::GENERATING, "comment", settings.quiet);
            let result = generate_comment(client, &snippet, marker).await;
            spinner.finish();
            Ok(Outcome::Print(result?))
        }
        Command::Docstring { snippet } => {
            let snippet = read_snippet(snippet, "code snippet")?;
            let spinner = StageSpinner::start(stages::GENERATING, "docstring", settings.quiet);
            let result = generate_docstring(client, &snippet).await;
            spinner.finish();
            Ok(Outcome::Print(result?))
        }
        Command::Readme {
            structure,
            contents,
            project,
            output,
        } => {
            let snapshot = readme_input(
                structure.as_deref(),
                contents.as_deref(),
                project.as_deref(),
                settings,
            )?;
            let spinner = StageSpinner::start(stages::GENERATING, "README", settings.quiet);
            let result = generate_readme(client, &snapshot.structure, &snapshot.key_files).await;
            spinner.finish();
            let readme = result?;

            match output {
                Some(path) => {
                    std::fs::write(path, format!("{readme}\n"))
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!("Wrote README to {}", path.display());
                    Ok(Outcome::Wrote(format!("Wrote {}", path.display())))
                }
                None => Ok(Outcome::Print(readme)),
            }
        }
        Command::Scan { path } => run_scan(path, settings),
    }
}

/// Reject argument combinations that can never produce a request.
///
/// Runs before the credential is resolved so a usage mistake is reported as
/// such. Stdin snippets (`-`) are checked once they are read.
pub fn check_arguments(command: &Command) -> Result<(), ParrotyError> {
    match command {
        Command::Comment { snippet, .. } | Command::Docstring { snippet }
            if snippet != "-" && snippet.trim().is_empty() =>
        {
            Err(ParrotyError::empty_input("code snippet"))
        }
        Command::Readme {
            structure,
            contents,
            project: None,
            ..
        } if structure.is_none() || contents.is_none() => {
            Err(ParrotyError::missing_readme_input())
        }
        _ => Ok(()),
    }
}

/// Print the scan result without touching the model.
pub fn run_scan(path: &Path, settings: &Settings) -> Result<Outcome> {
    let snapshot = scan_with_spinner(path, settings)?;
    let mut out = snapshot.structure;
    if snapshot.key_files.is_empty() {
        out.push_str("\nNo key files found.");
    } else {
        out.push_str("\nKey files:\n");
        let listing: Vec<String> = snapshot
            .key_files
            .iter()
            .map(|k| format!("  {} ({} bytes)", k.path, k.content.len()))
            .collect();
        out.push_str(&listing.join("\n"));
    }
    Ok(Outcome::Print(out))
}

fn scan_with_spinner(path: &Path, settings: &Settings) -> Result<ProjectSnapshot, ParrotyError> {
    let spinner = StageSpinner::start(
        stages::SCANNING,
        &path.display().to_string(),
        settings.quiet,
    );
    let result = scan_project(path, &settings.scan);
    spinner.finish();
    result
}

/// Build the README input from positionals or a project scan.
fn readme_input(
    structure: Option<&str>,
    contents: Option<&str>,
    project: Option<&Path>,
    settings: &Settings,
) -> Result<ProjectSnapshot, ParrotyError> {
    match (structure, contents, project) {
        (_, _, Some(dir)) => scan_with_spinner(dir, settings),
        (Some(structure), Some(contents), None) => {
            let key_files = if contents.trim().is_empty() {
                Vec::new()
            } else {
                vec![KeyFile::untagged(contents.trim_end())]
            };
            Ok(ProjectSnapshot {
                structure: structure.to_owned(),
                key_files,
            })
        }
        _ => Err(ParrotyError::missing_readme_input()),
    }
}

/// Resolve a snippet argument; `-` reads all of stdin.
fn read_snippet(arg: &str, what: &str) -> Result<String, ParrotyError> {
    let text = if arg == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        arg.to_owned()
    };

    if text.trim().is_empty() {
        return Err(ParrotyError::empty_input(what));
    }
    Ok(text)
}
