//! File discovery: expand paths and directories into concrete file lists

use crate::config::FilesConfig;
use glob::glob;
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::warn;
use std::path::{Path, PathBuf};

/// Expand a list of files and directories into the files to lint.
///
/// Explicit file paths are taken as-is; directories are expanded with the
/// configured include patterns and filtered by the exclude patterns. Glob
/// expansion yields alphabetical order, so the result is deterministic.
pub fn collect_files(paths: &[PathBuf], files: &FilesConfig) -> Vec<PathBuf> {
    let exclude = build_exclude(&files.exclude);
    let mut collected = Vec::new();

    for path in paths {
        if path.is_file() {
            collected.push(path.clone());
        } else if path.is_dir() {
            for pattern in &files.include {
                let full = format!("{}/{}", path.display(), pattern);
                match glob(&full) {
                    Ok(entries) => {
                        for entry in entries.flatten() {
                            if entry.is_file() && !is_excluded(&exclude, &entry) {
                                collected.push(entry);
                            }
                        }
                    }
                    Err(err) => warn!("bad include pattern '{}': {}", full, err),
                }
            }
        } else {
            warn!("skipping unsupported path: {}", path.display());
        }
    }

    collected
}

fn build_exclude(patterns: &[String]) -> Option<GlobSet> {
    if patterns.is_empty() {
        return None;
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(err) => warn!("bad exclude pattern '{}': {}", pattern, err),
        }
    }
    builder.build().ok()
}

fn is_excluded(exclude: &Option<GlobSet>, path: &Path) -> bool {
    let Some(set) = exclude else {
        return false;
    };
    let normalized = path.display().to_string().replace('\\', "/");
    set.is_match(&normalized)
}
