use super::reporter::ManifestLog;
use super::resolver::PlannedAction;
use crate::error::Error;
use crate::model::{Decision, MoveAction};
use crate::progress::ProgressReporter;
use chrono::Utc;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::{debug, error};

/// Execute the planned actions. Under `dry_run` no filesystem mutation
/// occurs but every action is still appended to the manifest with its
/// `would-*` decision, so dry and live manifests have the same shape.
///
/// One failed move never aborts the batch: the failure becomes an `error`
/// row and processing continues. Every manifest append is flushed before
/// the next action starts, so an interrupted run leaves a consistent log.
pub fn execute(
    planned: &[PlannedAction],
    dry_run: bool,
    parallel: bool,
    log: &Mutex<ManifestLog>,
    reporter: &dyn ProgressReporter,
) -> Result<Vec<MoveAction>, Error> {
    reporter.on_move_start(planned.len());

    if parallel && !dry_run {
        let completed = AtomicUsize::new(0);
        return planned
            .par_iter()
            .map(|action| {
                let result = log_one(action, dry_run, log);
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                reporter.on_move_progress(done, planned.len());
                result
            })
            .collect();
    }

    let mut results = Vec::with_capacity(planned.len());
    for (i, action) in planned.iter().enumerate() {
        results.push(log_one(action, dry_run, log)?);
        reporter.on_move_progress(i + 1, planned.len());
    }
    Ok(results)
}

fn log_one(
    planned: &PlannedAction,
    dry_run: bool,
    log: &Mutex<ManifestLog>,
) -> Result<MoveAction, Error> {
    let action = execute_one(planned, dry_run);
    let mut log = log
        .lock()
        .map_err(|_| Error::Other("manifest log mutex poisoned".to_string()))?;
    log.append(&action)?;
    Ok(action)
}

fn execute_one(planned: &PlannedAction, dry_run: bool) -> MoveAction {
    let timestamp = Utc::now();
    let base = MoveAction {
        source: planned.record.path.clone(),
        destination: planned.destination.clone(),
        decision: planned.decision,
        timestamp,
        archived_to: planned.archive_to.clone(),
        detail: planned.detail.clone(),
    };

    if dry_run {
        return MoveAction {
            decision: planned.decision.dry(),
            ..base
        };
    }

    match planned.decision {
        Decision::Move => match perform_move(&planned.record.path, &planned.destination) {
            Ok(()) => {
                debug!(
                    "moved {} -> {}",
                    planned.record.path.display(),
                    planned.destination.display()
                );
                base
            }
            Err(err) => error_action(base, planned, err),
        },
        Decision::ArchiveAndReplace => match archive_and_replace(planned) {
            Ok(()) => {
                debug!(
                    "archived {} and placed {}",
                    planned.destination.display(),
                    planned.record.path.display()
                );
                base
            }
            Err(err) => error_action(base, planned, err),
        },
        // Nothing to do on disk for skips and planning errors.
        _ => base,
    }
}

fn error_action(base: MoveAction, planned: &PlannedAction, err: io::Error) -> MoveAction {
    error!(
        "Failed to place {} at {}: {}",
        planned.record.path.display(),
        planned.destination.display(),
        err
    );
    MoveAction {
        decision: Decision::Error,
        archived_to: None,
        detail: Some(err.to_string()),
        ..base
    }
}

fn archive_and_replace(planned: &PlannedAction) -> io::Result<()> {
    let archive_to = planned.archive_to.as_deref().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "archive-and-replace decision without an archive path",
        )
    })?;
    perform_move(&planned.destination, archive_to)?;
    perform_move(&planned.record.path, &planned.destination)
}

/// Rename, falling back to copy-then-remove for cross-device moves.
pub(crate) fn perform_move(source: &Path, destination: &Path) -> io::Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(source, destination)?;
            fs::remove_file(source)
        }
    }
}
