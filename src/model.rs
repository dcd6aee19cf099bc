use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Destination bucket for files that don't belong to a named item group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Documents,
    Images,
    Audio,
    Video,
    Other,
}

impl Category {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Documents => "Documents",
            Category::Images => "Images",
            Category::Audio => "Audio",
            Category::Video => "Video",
            Category::Other => "Other",
        }
    }
}

/// A file discovered during scanning. Category assignment and metadata
/// enrichment happen later, in the classifier.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub file_name: String,
    pub extension: Option<String>,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// A classified file. Immutable once built.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    pub file_name: String,
    pub extension: Option<String>,
    pub size: u64,
    pub modified: DateTime<Utc>,
    /// Creation date sniffed from embedded metadata (EXIF, ID3, MP4 atoms).
    pub created_hint: Option<DateTime<Utc>>,
    pub category: Category,
    pub subcategory: Option<String>,
}

impl FileRecord {
    /// Timestamp used for conflict tie-breaking: the sniffed creation date
    /// when available, the filesystem mtime otherwise.
    pub fn effective_timestamp(&self) -> DateTime<Utc> {
        self.created_hint.unwrap_or(self.modified)
    }
}

/// Files sharing a base key after role-suffix stripping. A file matching no
/// known suffix becomes its own singleton group with `grouped` false.
#[derive(Debug, Clone)]
pub struct ItemGroup {
    pub key: String,
    pub members: Vec<FileRecord>,
    pub grouped: bool,
}

/// Outcome recorded for one file. The `Would*` variants are the dry-run
/// counterparts of the live decisions, so dry and live manifests have the
/// same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decision {
    Move,
    SkipIdentical,
    SkipOlder,
    ArchiveAndReplace,
    Error,
    WouldMove,
    WouldSkipIdentical,
    WouldSkipOlder,
    WouldArchiveAndReplace,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Move => "move",
            Decision::SkipIdentical => "skip-identical",
            Decision::SkipOlder => "skip-older",
            Decision::ArchiveAndReplace => "archive-and-replace",
            Decision::Error => "error",
            Decision::WouldMove => "would-move",
            Decision::WouldSkipIdentical => "would-skip-identical",
            Decision::WouldSkipOlder => "would-skip-older",
            Decision::WouldArchiveAndReplace => "would-archive-and-replace",
        }
    }

    /// Map a live decision to its dry-run counterpart. `Error` rows stay as
    /// they are; a planning failure is reported identically in both modes.
    pub fn dry(self) -> Decision {
        match self {
            Decision::Move => Decision::WouldMove,
            Decision::SkipIdentical => Decision::WouldSkipIdentical,
            Decision::SkipOlder => Decision::WouldSkipOlder,
            Decision::ArchiveAndReplace => Decision::WouldArchiveAndReplace,
            other => other,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "move" => Ok(Decision::Move),
            "skip-identical" => Ok(Decision::SkipIdentical),
            "skip-older" => Ok(Decision::SkipOlder),
            "archive-and-replace" => Ok(Decision::ArchiveAndReplace),
            "error" => Ok(Decision::Error),
            "would-move" => Ok(Decision::WouldMove),
            "would-skip-identical" => Ok(Decision::WouldSkipIdentical),
            "would-skip-older" => Ok(Decision::WouldSkipOlder),
            "would-archive-and-replace" => Ok(Decision::WouldArchiveAndReplace),
            other => Err(format!("unknown decision '{}'", other)),
        }
    }
}

/// One entry of the append-only run log. `archived_to` is populated only on
/// archive-and-replace rows so the manifest alone is enough to reverse a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveAction {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub decision: Decision,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_to: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
