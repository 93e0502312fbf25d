use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::config;

/// Resolve `dir` and make sure it is the `movement/make` directory.
pub fn ensure_make_dir(dir: &Path) -> Result<PathBuf> {
    let dir = dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve directory: {}", dir.display()))?;

    if dir.file_name().and_then(|n| n.to_str()) != Some(config::MAKE_DIR_NAME) {
        eprintln!(
            "{}",
            "This script must be executed from within the movement/make directory."
                .red()
                .bold()
        );
        anyhow::bail!("{} is not a movement/make directory", dir.display());
    }

    Ok(dir)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCheck {
    /// Path as written in the config, for display.
    pub path: PathBuf,
    pub found: bool,
}

pub fn check_files(dir: &Path, files: &[&str]) -> Vec<FileCheck> {
    files
        .iter()
        .map(|file| {
            let path: PathBuf = Path::new(file).components().collect();
            let found = dir.join(&path).is_file();
            tracing::debug!(path = %path.display(), found, "file check");
            FileCheck { path, found }
        })
        .collect()
}

/// Print the required-file checks; fails on the first missing file.
pub fn require_files(dir: &Path) -> Result<()> {
    println!();
    println!("{}", "Checking for necessary files".cyan().bold());
    println!();

    for check in check_files(dir, config::REQUIRED_FILES) {
        if !check.found {
            eprintln!(
                "\t{}",
                format!("--Error: Required file '{}' not found.", check.path.display()).red()
            );
            anyhow::bail!("Required file '{}' not found", check.path.display());
        }
        println!(
            "\t{}",
            format!("--File '{}' found.", check.path.display()).green()
        );
    }

    Ok(())
}

/// Print the optional-file checks. Never fails.
pub fn note_optional_files(dir: &Path) {
    println!();
    println!("{}", "Checking for optional files".cyan().bold());
    println!();

    for check in check_files(dir, config::OPTIONAL_FILES) {
        if check.found {
            println!(
                "\t{}",
                format!("--Optional file '{}' found.", check.path.display()).green()
            );
        } else {
            println!(
                "\t{}",
                format!("--Note: Optional file '{}' not found.", check.path.display()).dimmed()
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn movement_tree(tmp: &TempDir) -> PathBuf {
        let make = tmp.path().join("movement").join("make");
        fs::create_dir_all(&make).unwrap();
        make
    }

    #[test]
    fn make_dir_is_accepted_and_canonical() {
        let tmp = TempDir::new().unwrap();
        let make = movement_tree(&tmp);
        let resolved = ensure_make_dir(&make.join("..").join("make")).unwrap();
        assert_eq!(resolved, make.canonicalize().unwrap());
    }

    #[test]
    fn other_dir_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let make = movement_tree(&tmp);
        let err = ensure_make_dir(make.parent().unwrap()).unwrap_err();
        assert!(err.to_string().contains("not a movement/make directory"));
    }

    #[test]
    fn nonexistent_dir_is_rejected() {
        let tmp = TempDir::new().unwrap();
        assert!(ensure_make_dir(&tmp.path().join("make")).is_err());
    }

    #[test]
    fn checks_resolve_relative_to_make_dir() {
        let tmp = TempDir::new().unwrap();
        let make = movement_tree(&tmp);
        fs::write(make.join("Makefile"), "all:\n").unwrap();

        let checks = check_files(&make, config::REQUIRED_FILES);
        assert_eq!(checks.len(), 2);
        assert!(!checks[0].found);
        assert!(checks[1].found);
        assert!(require_files(&make).is_err());

        let hw = tmp.path().join("watch-library").join("hardware");
        fs::create_dir_all(&hw).unwrap();
        fs::write(hw.join("main.c"), "").unwrap();
        assert!(require_files(&make).is_ok());
    }

    #[test]
    fn directory_named_like_a_file_does_not_count() {
        let tmp = TempDir::new().unwrap();
        let make = movement_tree(&tmp);
        fs::create_dir(make.join("alarms.csv")).unwrap();
        let checks = check_files(&make, config::OPTIONAL_FILES);
        assert!(checks.iter().all(|c| !c.found));
    }
}
