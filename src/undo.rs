use crate::error::Error;
use crate::model::Decision;
use crate::organize::mover;
use crate::organize::reporter;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct UndoSummary {
    pub restored: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Replay a manifest in reverse, restoring moved files to their sources and
/// archived files back to their original destinations. Conflicts (source
/// slot occupied, moved file missing) are logged and skipped, never
/// overwritten.
pub fn undo_manifest(manifest_path: &Path, dry_run: bool) -> Result<UndoSummary, Error> {
    let actions = reporter::read_manifest(manifest_path)?;
    let mut summary = UndoSummary::default();

    for action in actions.iter().rev() {
        match action.decision {
            Decision::Move => {
                restore(&action.destination, &action.source, dry_run, &mut summary);
            }
            Decision::ArchiveAndReplace => {
                restore(&action.destination, &action.source, dry_run, &mut summary);
                match &action.archived_to {
                    Some(archived) => {
                        restore(archived, &action.destination, dry_run, &mut summary)
                    }
                    None => {
                        warn!(
                            "Manifest row for {} has no archive path; cannot restore the replaced file",
                            action.destination.display()
                        );
                        summary.skipped += 1;
                    }
                }
            }
            _ => {}
        }
    }

    info!(
        "Undo complete: {} restored, {} skipped, {} errors",
        summary.restored, summary.skipped, summary.errors
    );
    Ok(summary)
}

fn restore(from: &Path, to: &Path, dry_run: bool, summary: &mut UndoSummary) {
    if !from.exists() {
        warn!("Cannot restore {}: file is missing", from.display());
        summary.skipped += 1;
        return;
    }
    if to.exists() {
        warn!(
            "Cannot restore {} to {}: destination is occupied",
            from.display(),
            to.display()
        );
        summary.skipped += 1;
        return;
    }
    if dry_run {
        info!("Would restore {} -> {}", from.display(), to.display());
        summary.restored += 1;
        return;
    }
    match mover::perform_move(from, to) {
        Ok(()) => summary.restored += 1,
        Err(err) => {
            warn!(
                "Failed to restore {} to {}: {}",
                from.display(),
                to.display(),
                err
            );
            summary.errors += 1;
        }
    }
}
