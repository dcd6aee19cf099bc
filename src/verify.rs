use crate::error::Error;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A primary file whose expected companion is absent from its folder.
#[derive(Debug, Clone)]
pub struct MissingCompanion {
    pub primary: PathBuf,
    pub suffix: String,
}

#[derive(Debug, Default)]
pub struct VerifyReport {
    pub items_checked: usize,
    pub missing: Vec<MissingCompanion>,
}

/// Walk an organized tree and check that every primary file (e.g. each
/// `.mp3`) has its expected companions next to it. Archive subtrees are
/// ignored; they hold displaced files, not organized items.
pub fn verify_tree(
    dest_root: &Path,
    primary_suffix: &str,
    required_suffixes: &[String],
) -> Result<VerifyReport, Error> {
    if !dest_root.is_dir() {
        return Err(Error::UnreadableRoot(dest_root.to_path_buf()));
    }

    let mut report = VerifyReport::default();

    for entry in WalkDir::new(dest_root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if !file_name.ends_with(primary_suffix) || file_name.len() <= primary_suffix.len() {
            continue;
        }
        if entry
            .path()
            .components()
            .any(|c| c.as_os_str().to_string_lossy().starts_with("_archive_"))
        {
            continue;
        }

        report.items_checked += 1;
        let stem = &file_name[..file_name.len() - primary_suffix.len()];
        let parent = match entry.path().parent() {
            Some(parent) => parent,
            None => continue,
        };

        for suffix in required_suffixes {
            let companion = parent.join(format!("{}{}", stem, suffix));
            if !companion.exists() {
                report.missing.push(MissingCompanion {
                    primary: entry.path().to_path_buf(),
                    suffix: suffix.clone(),
                });
            }
        }
    }

    Ok(report)
}
