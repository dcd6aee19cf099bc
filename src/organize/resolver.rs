use super::hash_cache::HashCache;
use crate::error::Error;
use crate::model::{Decision, FileRecord, ItemGroup};
use ahash::{AHashMap, AHashSet};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

/// A fully-decided action, ready for the mover. `archive_to` is set only
/// for archive-and-replace; `detail` carries the failure message for
/// planning-time `Error` rows.
#[derive(Debug, Clone)]
pub struct PlannedAction {
    pub record: FileRecord,
    pub destination: PathBuf,
    pub decision: Decision,
    pub archive_to: Option<PathBuf>,
    pub detail: Option<String>,
}

/// Total, deterministic ordering between two records competing for the same
/// slot. `Greater` means `a` wins: newest effective timestamp first, then
/// larger size, then lexicographically smaller source path.
pub fn tie_break(a: &FileRecord, b: &FileRecord) -> Ordering {
    a.effective_timestamp()
        .cmp(&b.effective_timestamp())
        .then_with(|| a.size.cmp(&b.size))
        .then_with(|| b.path.cmp(&a.path))
}

/// Single-threaded conflict planning. Decisions never delete data: a
/// replaced destination file is always relocated into the run's archive
/// subtree first.
pub struct Resolver<'a> {
    dest_root: PathBuf,
    archive_dir: PathBuf,
    hash_cache: &'a HashCache,
}

impl<'a> Resolver<'a> {
    pub fn new(dest_root: &Path, run_timestamp: &str, hash_cache: &'a HashCache) -> Self {
        let archive_dir = dest_root.join(format!("_archive_{}", run_timestamp));
        Self {
            dest_root: dest_root.to_path_buf(),
            archive_dir,
            hash_cache,
        }
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    /// Decide every group member. Exactly one action is emitted per record;
    /// a record whose planning fails gets an `Error` action and the batch
    /// continues. The same source path appearing twice is a logic bug and
    /// aborts the run.
    pub fn plan(&self, groups: &[ItemGroup]) -> Result<Vec<PlannedAction>, Error> {
        let mut actions: Vec<PlannedAction> = Vec::new();
        // destination -> index of the action currently winning that slot
        let mut claimed: AHashMap<PathBuf, usize> = AHashMap::new();
        let mut seen_sources: AHashSet<PathBuf> = AHashSet::new();
        let mut archive_slots: AHashSet<PathBuf> = AHashSet::new();

        for group in groups {
            for record in &group.members {
                if !seen_sources.insert(record.path.clone()) {
                    return Err(Error::ConflictDecision(format!(
                        "source path visited twice: {}",
                        record.path.display()
                    )));
                }

                let destination = self.destination_for(group, record);
                let action =
                    self.resolve_record(record, destination, &mut claimed, &mut actions, &mut archive_slots);
                actions.push(action);
            }
        }

        Ok(actions)
    }

    fn resolve_record(
        &self,
        record: &FileRecord,
        destination: PathBuf,
        claimed: &mut AHashMap<PathBuf, usize>,
        actions: &mut [PlannedAction],
        archive_slots: &mut AHashSet<PathBuf>,
    ) -> PlannedAction {
        let index = actions.len();

        if record.path == destination {
            return PlannedAction {
                record: record.clone(),
                destination,
                decision: Decision::SkipIdentical,
                archive_to: None,
                detail: None,
            };
        }

        let (mut decision, mut archive_to, detail) =
            self.resolve_against_disk(record, &destination, archive_slots);

        if matches!(decision, Decision::Move | Decision::ArchiveAndReplace) {
            if let Some(&winner_index) = claimed.get(&destination) {
                let winner = &actions[winner_index].record;
                if self.sources_identical(record, winner) {
                    decision = Decision::SkipIdentical;
                    archive_to = None;
                } else if tie_break(record, winner) == Ordering::Greater {
                    // Incoming record takes the slot; the previous claimant
                    // is demoted in place.
                    actions[winner_index].decision = Decision::SkipOlder;
                    actions[winner_index].archive_to = None;
                    claimed.insert(destination.clone(), index);
                } else {
                    decision = Decision::SkipOlder;
                    archive_to = None;
                }
            } else {
                claimed.insert(destination.clone(), index);
            }
        }

        PlannedAction {
            record: record.clone(),
            destination,
            decision,
            archive_to,
            detail,
        }
    }

    /// Grouped members land under their base key; ungrouped singletons are
    /// routed by subcategory, falling back to the built-in category
    /// directory.
    fn destination_for(&self, group: &ItemGroup, record: &FileRecord) -> PathBuf {
        if group.grouped {
            self.dest_root.join(&group.key).join(&record.file_name)
        } else {
            let dir = record
                .subcategory
                .clone()
                .unwrap_or_else(|| record.category.dir_name().to_string());
            self.dest_root.join(dir).join(&record.file_name)
        }
    }

    fn resolve_against_disk(
        &self,
        record: &FileRecord,
        destination: &Path,
        archive_slots: &mut AHashSet<PathBuf>,
    ) -> (Decision, Option<PathBuf>, Option<String>) {
        if !destination.exists() {
            return (Decision::Move, None, None);
        }

        let dest_meta = match fs::metadata(destination) {
            Ok(metadata) => metadata,
            Err(err) => {
                return (
                    Decision::Error,
                    None,
                    Some(format!("failed to read destination metadata: {}", err)),
                )
            }
        };

        if dest_meta.len() == record.size {
            let source_hash = self.hash_cache.content_hash(&record.path);
            let dest_hash = self.hash_cache.content_hash(destination);
            match (source_hash, dest_hash) {
                (Ok(a), Ok(b)) if a == b => return (Decision::SkipIdentical, None, None),
                (Err(err), _) | (_, Err(err)) => {
                    return (
                        Decision::Error,
                        None,
                        Some(format!("failed to hash for identity check: {}", err)),
                    )
                }
                _ => {}
            }
        }

        let dest_modified: DateTime<Utc> = dest_meta
            .modified()
            .map(DateTime::from)
            .unwrap_or_else(|_| Utc::now());

        let incoming_wins = match record.effective_timestamp().cmp(&dest_modified) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => match record.size.cmp(&dest_meta.len()) {
                Ordering::Greater => true,
                Ordering::Less => false,
                Ordering::Equal => record.path.as_os_str() < destination.as_os_str(),
            },
        };

        if incoming_wins {
            let archive_to = self.allocate_archive_slot(&record.file_name, archive_slots);
            (Decision::ArchiveAndReplace, Some(archive_to), None)
        } else {
            (Decision::SkipOlder, None, None)
        }
    }

    fn sources_identical(&self, a: &FileRecord, b: &FileRecord) -> bool {
        if a.size != b.size {
            return false;
        }
        match (
            self.hash_cache.content_hash(&a.path),
            self.hash_cache.content_hash(&b.path),
        ) {
            (Ok(ha), Ok(hb)) => ha == hb,
            _ => false,
        }
    }

    fn allocate_archive_slot(
        &self,
        file_name: &str,
        slots: &mut AHashSet<PathBuf>,
    ) -> PathBuf {
        let plain = self.archive_dir.join(file_name);
        if !slots.contains(&plain) && !plain.exists() {
            slots.insert(plain.clone());
            return plain;
        }

        let (stem, ext) = match file_name.rfind('.') {
            Some(i) => (&file_name[..i], &file_name[i..]),
            None => (file_name, ""),
        };
        let mut counter = 1u32;
        loop {
            let candidate = self.archive_dir.join(format!("{}_{}{}", stem, counter, ext));
            if !slots.contains(&candidate) && !candidate.exists() {
                slots.insert(candidate.clone());
                return candidate;
            }
            counter += 1;
        }
    }
}
