use crate::model::ScannedFile;
use crate::progress::ProgressReporter;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Sequential traversal of the root directories. Exclusion regexes are
/// matched against the absolute path; a matching directory prunes its whole
/// subtree. Symlinks are never followed and symlinked files are skipped.
/// Unreadable paths are logged and skipped; they never abort the walk.
pub fn scan(
    roots: &[PathBuf],
    excludes: &[Regex],
    reporter: &dyn ProgressReporter,
) -> Vec<ScannedFile> {
    let mut records = Vec::new();
    for root in roots {
        walk_root(root, excludes, &mut records, reporter);
    }
    records
}

fn walk_root(
    root: &Path,
    excludes: &[Regex],
    records: &mut Vec<ScannedFile>,
    reporter: &dyn ProgressReporter,
) {
    let mut it = WalkDir::new(root).follow_links(false).into_iter();
    loop {
        let entry = match it.next() {
            None => break,
            Some(Err(err)) => {
                warn!("Skipping unreadable path under {}: {}", root.display(), err);
                continue;
            }
            Some(Ok(entry)) => entry,
        };

        let path_str = entry.path().to_string_lossy();
        if excludes.iter().any(|re| re.is_match(&path_str)) {
            if entry.file_type().is_dir() {
                it.skip_current_dir();
            }
            continue;
        }

        if !entry.file_type().is_file() {
            continue;
        }

        if let Some(record) = to_scanned(&entry) {
            records.push(record);
            reporter.on_scan_progress(records.len());
        }
    }
}

fn to_scanned(entry: &DirEntry) -> Option<ScannedFile> {
    let metadata = match entry.metadata() {
        Ok(metadata) => metadata,
        Err(err) => {
            warn!("Skipping {}: {}", entry.path().display(), err);
            return None;
        }
    };

    let modified: DateTime<Utc> = metadata
        .modified()
        .map(DateTime::from)
        .unwrap_or_else(|_| Utc::now());

    Some(ScannedFile {
        path: entry.path().to_path_buf(),
        file_name: entry.file_name().to_string_lossy().into_owned(),
        extension: entry
            .path()
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase()),
        size: metadata.len(),
        modified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentReporter;
    use std::fs;

    #[test]
    fn test_scan_excluded_directory_is_pruned() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("root");
        fs::create_dir_all(root.join("keep")).unwrap();
        fs::create_dir_all(root.join("venv/lib")).unwrap();
        fs::write(root.join("keep/a.txt"), "a").unwrap();
        fs::write(root.join("venv/lib/b.txt"), "b").unwrap();

        let excludes = vec![Regex::new("venv").unwrap()];
        let records = scan(&[root], &excludes, &SilentReporter);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_name, "a.txt");
    }

    #[test]
    fn test_scan_collects_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("root");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("Song.MP3"), "12345").unwrap();

        let records = scan(&[root], &[], &SilentReporter);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_name, "Song.MP3");
        assert_eq!(records[0].extension.as_deref(), Some("mp3"));
        assert_eq!(records[0].size, 5);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_skips_symlinks() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("root");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("real.txt"), "real").unwrap();
        std::os::unix::fs::symlink(root.join("real.txt"), root.join("link.txt")).unwrap();

        let records = scan(&[root], &[], &SilentReporter);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_name, "real.txt");
    }
}
