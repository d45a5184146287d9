use crate::packer::{KeyFile, ProjectSnapshot};
use crate::utils::error::ParrotyError;
use globset::{GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Directory names never listed or descended into.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "__pycache__",
    ".venv",
    "venv",
    "target",
    ".idea",
    ".vscode",
];

/// File names whose full content is embedded in the README prompt.
pub const DEFAULT_KEY_FILES: &[&str] = &[
    "package.json",
    "requirements.txt",
    "Cargo.toml",
    "pyproject.toml",
    "go.mod",
    "Gemfile",
    "composer.json",
    "pom.xml",
    "build.gradle",
    "ABOUT.md",
    "CONVENTIONS.md",
];

const INDENT: &str = "    ";
const BRANCH: &str = "\u{251c}\u{2500}\u{2500} ";

/// Name patterns steering a project scan.
///
/// Both lists are globs matched against a single path component (the
/// directory or file name), not against the full path.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub exclude_dirs: Vec<String>,
    pub key_files: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            exclude_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| (*s).to_owned()).collect(),
            key_files: DEFAULT_KEY_FILES.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

/// Build a `GlobSet` from a list of patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet, ParrotyError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = globset::Glob::new(pattern).map_err(|e| {
            ParrotyError::Config(format!("Invalid glob pattern '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| ParrotyError::Config(format!("Failed to build glob set: {e}")))
}

/// Normalize a relative path to forward slashes for display and tagging.
fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Walk `root` depth-first and collect its tree listing and key files.
///
/// Entries are visited in file-name order. Excluded directories are pruned
/// before descent, so nothing beneath them is listed or read. Any walk or
/// read failure aborts the scan with the offending path.
pub fn scan_project(root: &Path, options: &ScanOptions) -> Result<ProjectSnapshot, ParrotyError> {
    let metadata = std::fs::metadata(root).map_err(|e| ParrotyError::scan(root, e))?;
    if !metadata.is_dir() {
        return Err(ParrotyError::scan(
            root,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }

    let exclude_set = build_globset(&options.exclude_dirs)?;
    let key_file_set = build_globset(&options.key_files)?;

    let root_name = root
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| ".".to_owned());

    let mut structure = format!("{root_name}/\n");
    let mut key_files = Vec::new();
    let mut dir_count: usize = 0;

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            entry.depth() == 0 || !is_dir || !exclude_set.is_match(entry.file_name())
        })
        .build();

    for result in walker {
        let entry = result.map_err(|e| walk_error(root, e))?;
        let depth = entry.depth();
        if depth == 0 {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        let indent = INDENT.repeat(depth.saturating_sub(1));
        let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());

        if is_dir {
            dir_count = dir_count.saturating_add(1);
            let _ = writeln!(structure, "{indent}{BRANCH}{name}/");
            continue;
        }

        let _ = writeln!(structure, "{indent}{BRANCH}{name}");

        let is_regular_file = entry.file_type().is_some_and(|ft| ft.is_file());
        if is_regular_file && key_file_set.is_match(entry.file_name()) {
            let path = entry.path();
            let content =
                std::fs::read_to_string(path).map_err(|e| ParrotyError::scan(path, e))?;
            let relative = path.strip_prefix(root).unwrap_or(path);
            tracing::debug!("Collected key file {}", relative.display());
            key_files.push(KeyFile::new(normalize_path(relative), content));
        }
    }

    tracing::info!(
        "Scanned {} ({} directories, {} key files)",
        root.display(),
        dir_count,
        key_files.len()
    );

    Ok(ProjectSnapshot {
        structure,
        key_files,
    })
}

/// Map a walker error to a scan error that names the failing path.
fn walk_error(root: &Path, err: ignore::Error) -> ParrotyError {
    let path = walk_error_path(&err).unwrap_or_else(|| root.to_path_buf());
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
    ParrotyError::scan(path, source)
}

fn walk_error_path(err: &ignore::Error) -> Option<PathBuf> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.clone()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            walk_error_path(err)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_tree_rendering_indents_by_depth() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/main.py", "print('hi')");
        write(dir.path(), "setup.cfg", "");

        let snapshot = scan_project(dir.path(), &ScanOptions::default()).unwrap();
        let lines: Vec<&str> = snapshot.structure.lines().collect();

        assert!(lines[0].ends_with('/'));
        assert_eq!(lines[1], "\u{251c}\u{2500}\u{2500} setup.cfg");
        assert_eq!(lines[2], "\u{251c}\u{2500}\u{2500} src/");
        assert_eq!(lines[3], "    \u{251c}\u{2500}\u{2500} main.py");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_excluded_directories_are_pruned() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "node_modules/left-pad/package.json", "{}");
        write(dir.path(), ".git/config", "[core]");
        write(dir.path(), "app/__pycache__/mod.pyc", "");
        write(dir.path(), "app/main.py", "");

        let snapshot = scan_project(dir.path(), &ScanOptions::default()).unwrap();

        assert!(!snapshot.structure.contains("node_modules"));
        assert!(!snapshot.structure.contains("left-pad"));
        assert!(!snapshot.structure.contains(".git"));
        assert!(!snapshot.structure.contains("__pycache__"));
        assert!(snapshot.structure.contains("main.py"));
        assert!(snapshot.key_files.is_empty());
    }

    #[test]
    fn test_every_key_file_occurrence_is_tagged() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "requirements.txt", "requests\n");
        write(dir.path(), "backend/requirements.txt", "flask\n");
        write(dir.path(), "frontend/package.json", "{\"name\": \"web\"}");

        let snapshot = scan_project(dir.path(), &ScanOptions::default()).unwrap();
        let paths: Vec<&str> = snapshot.key_files.iter().map(|k| k.path.as_str()).collect();

        assert_eq!(
            paths,
            vec![
                "backend/requirements.txt",
                "frontend/package.json",
                "requirements.txt"
            ]
        );
        assert_eq!(snapshot.key_files[0].content, "flask\n");
    }

    #[test]
    fn test_custom_globs() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "build/out.txt", "");
        write(dir.path(), "requirements-dev.txt", "pytest\n");

        let options = ScanOptions {
            exclude_dirs: vec!["bu*".to_owned()],
            key_files: vec!["requirements*.txt".to_owned()],
        };
        let snapshot = scan_project(dir.path(), &options).unwrap();

        assert!(!snapshot.structure.contains("out.txt"));
        assert_eq!(snapshot.key_files.len(), 1);
        assert_eq!(snapshot.key_files[0].path, "requirements-dev.txt");
    }

    #[test]
    fn test_root_named_like_excluded_dir_is_still_scanned() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "target/Cargo.toml", "[package]");

        let snapshot =
            scan_project(&dir.path().join("target"), &ScanOptions::default()).unwrap();
        assert_eq!(snapshot.key_files.len(), 1);
        assert!(snapshot.structure.starts_with("target/"));
    }

    #[test]
    fn test_non_utf8_key_file_is_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("package.json"), [0xff, 0xfe, 0x00]).unwrap();

        let err = scan_project(dir.path(), &ScanOptions::default()).unwrap_err();
        assert!(matches!(err, ParrotyError::Scan { .. }));
        assert!(err.to_string().contains("package.json"));
    }

    #[test]
    fn test_missing_root_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = scan_project(&dir.path().join("nope"), &ScanOptions::default()).unwrap_err();
        assert!(matches!(err, ParrotyError::Scan { .. }));
    }

    #[test]
    fn test_invalid_glob_is_config_error() {
        let dir = TempDir::new().unwrap();
        let options = ScanOptions {
            exclude_dirs: vec!["[".to_owned()],
            key_files: vec![],
        };
        assert!(matches!(
            scan_project(dir.path(), &options),
            Err(ParrotyError::Config(_))
        ));
    }
}
