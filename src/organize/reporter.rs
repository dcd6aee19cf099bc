use crate::config::ReportFormat;
use crate::error::Error;
use crate::model::{Decision, MoveAction};
use chrono::{DateTime, Utc};
use colored::*;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const CSV_HEADERS: [&str; 5] = [
    "source",
    "destination",
    "decision",
    "timestamp",
    "archived_to",
];

enum ManifestWriter {
    Csv(csv::Writer<File>),
    Json(BufWriter<File>),
}

/// Append-only manifest of a run. Every append is flushed immediately so a
/// cancelled run still leaves a consistent, inspectable log.
pub struct ManifestLog {
    path: PathBuf,
    writer: ManifestWriter,
}

impl ManifestLog {
    /// Open a manifest named after the run timestamp inside `report_dir`, so
    /// repeated runs never overwrite each other's output.
    pub fn create(
        report_dir: &Path,
        run_timestamp: &str,
        format: ReportFormat,
    ) -> Result<Self, Error> {
        fs::create_dir_all(report_dir)?;
        let (file_name, writer) = match format {
            ReportFormat::Csv => {
                let file_name = format!("archivist_manifest_{}.csv", run_timestamp);
                let path = report_dir.join(&file_name);
                let mut writer = csv::Writer::from_path(&path)?;
                writer.write_record(CSV_HEADERS)?;
                writer.flush()?;
                (file_name, ManifestWriter::Csv(writer))
            }
            ReportFormat::Json => {
                let file_name = format!("archivist_manifest_{}.jsonl", run_timestamp);
                let path = report_dir.join(&file_name);
                let writer = BufWriter::new(File::create(&path)?);
                (file_name, ManifestWriter::Json(writer))
            }
        };
        Ok(Self {
            path: report_dir.join(file_name),
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, action: &MoveAction) -> Result<(), Error> {
        match &mut self.writer {
            ManifestWriter::Csv(writer) => {
                writer.write_record(&[
                    action.source.to_string_lossy().into_owned(),
                    action.destination.to_string_lossy().into_owned(),
                    action.decision.as_str().to_string(),
                    action.timestamp.to_rfc3339(),
                    action
                        .archived_to
                        .as_ref()
                        .map(|p| p.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                ])?;
                writer.flush()?;
            }
            ManifestWriter::Json(writer) => {
                serde_json::to_writer(&mut *writer, action)?;
                writer.write_all(b"\n")?;
                writer.flush()?;
            }
        }
        Ok(())
    }
}

/// Load a manifest back, detecting the format from the file extension.
/// Needed by `undo`, and handy for inspecting old runs in tests.
pub fn read_manifest(path: &Path) -> Result<Vec<MoveAction>, Error> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("jsonl") | Some("json") => read_json_manifest(path),
        _ => read_csv_manifest(path),
    }
}

fn read_csv_manifest(path: &Path) -> Result<Vec<MoveAction>, Error> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut actions = Vec::new();
    for row in reader.records() {
        let row = row?;
        let decision: Decision = row
            .get(2)
            .unwrap_or_default()
            .parse()
            .map_err(Error::Other)?;
        let timestamp = DateTime::parse_from_rfc3339(row.get(3).unwrap_or_default())
            .map_err(|e| Error::Other(format!("bad manifest timestamp: {}", e)))?
            .with_timezone(&Utc);
        let archived_to = match row.get(4) {
            Some("") | None => None,
            Some(value) => Some(PathBuf::from(value)),
        };
        actions.push(MoveAction {
            source: PathBuf::from(row.get(0).unwrap_or_default()),
            destination: PathBuf::from(row.get(1).unwrap_or_default()),
            decision,
            timestamp,
            archived_to,
            detail: None,
        });
    }
    Ok(actions)
}

fn read_json_manifest(path: &Path) -> Result<Vec<MoveAction>, Error> {
    let reader = BufReader::new(File::open(path)?);
    let mut actions = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        actions.push(serde_json::from_str(&line)?);
    }
    Ok(actions)
}

/// Count actions per decision kind, in stable order.
pub fn decision_counts(actions: &[MoveAction]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for action in actions {
        *counts.entry(action.decision.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Human-readable end-of-run summary: one colored count per decision kind,
/// then the manifest path. Always printed, so nothing is silently lost.
pub fn print_summary(actions: &[MoveAction], manifest_path: &Path) {
    println!();
    for (decision, count) in decision_counts(actions) {
        let count = count.to_string();
        let colored_count = if decision.contains("error") {
            count.red()
        } else if decision.contains("archive") {
            count.cyan()
        } else if decision.contains("skip") {
            count.yellow()
        } else {
            count.green()
        };
        println!("  {:>26}  {}", decision, colored_count);
    }
    println!("  {:>26}  {}", "total", actions.len());
    println!("\n{} {}", "Manifest:".bold(), manifest_path.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::SubsecRound;

    fn sample_actions() -> Vec<MoveAction> {
        let ts = Utc::now().round_subsecs(0);
        vec![
            MoveAction {
                source: PathBuf::from("/src/song.mp3"),
                destination: PathBuf::from("/out/song/song.mp3"),
                decision: Decision::Move,
                timestamp: ts,
                archived_to: None,
                detail: None,
            },
            MoveAction {
                source: PathBuf::from("/src/old.mp3"),
                destination: PathBuf::from("/out/song/old.mp3"),
                decision: Decision::ArchiveAndReplace,
                timestamp: ts,
                archived_to: Some(PathBuf::from("/out/_archive_x/old.mp3")),
                detail: None,
            },
        ]
    }

    #[test]
    fn test_csv_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let actions = sample_actions();

        let mut log =
            ManifestLog::create(tmp.path(), "20240101_000000", ReportFormat::Csv).unwrap();
        for action in &actions {
            log.append(action).unwrap();
        }
        let path = log.path().to_path_buf();
        drop(log);

        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .contains("20240101_000000"));

        let loaded = read_manifest(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].decision, Decision::Move);
        assert_eq!(loaded[0].source, actions[0].source);
        assert_eq!(loaded[1].decision, Decision::ArchiveAndReplace);
        assert_eq!(loaded[1].archived_to, actions[1].archived_to);
        assert_eq!(loaded[1].timestamp, actions[1].timestamp);
    }

    #[test]
    fn test_jsonl_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let actions = sample_actions();

        let mut log =
            ManifestLog::create(tmp.path(), "20240101_000000", ReportFormat::Json).unwrap();
        for action in &actions {
            log.append(action).unwrap();
        }
        let path = log.path().to_path_buf();
        drop(log);

        let loaded = read_manifest(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].archived_to, actions[1].archived_to);
    }

    #[test]
    fn test_decision_counts() {
        let actions = sample_actions();
        let counts = decision_counts(&actions);
        assert_eq!(counts.get("move"), Some(&1));
        assert_eq!(counts.get("archive-and-replace"), Some(&1));
    }
}
