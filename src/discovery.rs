// src/discovery.rs
use crate::config::{should_prune, Config};
use crate::error::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Expands `roots` into the source files to scan.
///
/// Files given directly are kept when their extension is configured;
/// directories are walked with pruning. Exclude patterns apply to both.
///
/// # Errors
/// Returns an error if a root does not exist.
pub fn discover(roots: &[PathBuf], config: &Config) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for root in roots {
        if root.is_file() {
            files.push(root.clone());
        } else if root.is_dir() {
            files.extend(walk_filesystem(root));
        } else {
            return Err(crate::error::LeakError::Io {
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
                path: root.clone(),
            });
        }
    }
    files.retain(|p| is_source_file(p, config) && !is_excluded(p, config));
    files.sort();
    files.dedup();
    Ok(files)
}

fn walk_filesystem(root: &Path) -> Vec<PathBuf> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !should_prune(&e.file_name().to_string_lossy()));

    let (paths, error_count) = accumulate_walker(walker);
    if error_count > 0 {
        tracing::warn!(root = %root.display(), error_count, "errors during file walk");
    }
    paths
}

fn accumulate_walker<I>(walker: I) -> (Vec<PathBuf>, usize)
where
    I: Iterator<Item = walkdir::Result<walkdir::DirEntry>>,
{
    let mut paths = Vec::new();
    let mut errors = 0;
    for item in walker {
        match item {
            Ok(entry) => {
                if entry.file_type().is_file() {
                    paths.push(entry.into_path());
                }
            }
            Err(_) => errors += 1,
        }
    }
    (paths, errors)
}

fn is_source_file(path: &Path, config: &Config) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| config.accepts_extension(ext))
}

/// Normalizes a path to use forward slashes (cross-platform pattern matching).
fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn is_excluded(path: &Path, config: &Config) -> bool {
    let s = normalize_path(path);
    config.exclude_patterns.iter().any(|re| re.is_match(&s))
}
