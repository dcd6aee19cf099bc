use super::sniff;
use crate::model::{Category, FileRecord, ScannedFile};
use ahash::AHashMap;
use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    static ref EXTENSION_CATEGORIES: AHashMap<&'static str, Category> = {
        let mut map = AHashMap::new();
        for ext in [
            "txt", "md", "pdf", "doc", "docx", "rtf", "odt", "csv", "xls", "xlsx", "json",
            "srt", "html", "htm",
        ] {
            map.insert(ext, Category::Documents);
        }
        for ext in [
            "jpg", "jpeg", "png", "gif", "bmp", "svg", "webp", "heic", "ico", "tif", "tiff",
        ] {
            map.insert(ext, Category::Images);
        }
        for ext in ["mp3", "wav", "flac", "m4a", "aac", "ogg", "wma", "aiff"] {
            map.insert(ext, Category::Audio);
        }
        for ext in ["mp4", "mov", "avi", "mkv", "webm", "m4v", "wmv", "flv"] {
            map.insert(ext, Category::Video);
        }
        map
    };
}

pub struct Classifier {
    /// extension (lowercase) to subcategory name
    subcategories: AHashMap<String, String>,
}

impl Classifier {
    pub fn new(subcategories: &HashMap<String, Vec<String>>) -> Self {
        // Deterministic precedence when one extension appears under two names.
        let mut names: Vec<&String> = subcategories.keys().collect();
        names.sort();

        let mut map = AHashMap::new();
        for name in names {
            for ext in &subcategories[name] {
                map.entry(ext.to_lowercase()).or_insert_with(|| name.clone());
            }
        }
        Self { subcategories: map }
    }

    /// Extension lookup, then best-effort creation-date sniffing. Unknown
    /// extensions map to `Other` rather than erroring.
    pub fn classify(&self, scanned: ScannedFile) -> FileRecord {
        let category = scanned
            .extension
            .as_deref()
            .and_then(|ext| EXTENSION_CATEGORIES.get(ext).copied())
            .unwrap_or(Category::Other);

        let subcategory = scanned
            .extension
            .as_deref()
            .and_then(|ext| self.subcategories.get(ext).cloned());

        let created_hint =
            sniff::creation_date(&scanned.path, category, scanned.extension.as_deref());

        FileRecord {
            path: scanned.path,
            file_name: scanned.file_name,
            extension: scanned.extension,
            size: scanned.size,
            modified: scanned.modified,
            created_hint,
            category,
            subcategory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::PathBuf;

    fn scanned(name: &str, ext: Option<&str>) -> ScannedFile {
        ScannedFile {
            path: PathBuf::from(format!("/nonexistent/{}", name)),
            file_name: name.to_string(),
            extension: ext.map(String::from),
            size: 1,
            modified: Utc::now(),
        }
    }

    #[test]
    fn test_known_extensions() {
        let classifier = Classifier::new(&HashMap::new());
        assert_eq!(
            classifier.classify(scanned("a.mp3", Some("mp3"))).category,
            Category::Audio
        );
        assert_eq!(
            classifier.classify(scanned("a.png", Some("png"))).category,
            Category::Images
        );
        assert_eq!(
            classifier.classify(scanned("a.pdf", Some("pdf"))).category,
            Category::Documents
        );
        assert_eq!(
            classifier.classify(scanned("a.mkv", Some("mkv"))).category,
            Category::Video
        );
    }

    #[test]
    fn test_unknown_extension_maps_to_other() {
        let classifier = Classifier::new(&HashMap::new());
        let record = classifier.classify(scanned("a.xyz", Some("xyz")));
        assert_eq!(record.category, Category::Other);
        let record = classifier.classify(scanned("Makefile", None));
        assert_eq!(record.category, Category::Other);
    }

    #[test]
    fn test_subcategory_assignment() {
        let mut subcategories = HashMap::new();
        subcategories.insert(
            "csv_processing".to_string(),
            vec!["csv".to_string(), "xlsx".to_string()],
        );
        let classifier = Classifier::new(&subcategories);
        let record = classifier.classify(scanned("report.csv", Some("csv")));
        assert_eq!(record.subcategory.as_deref(), Some("csv_processing"));
        assert_eq!(record.category, Category::Documents);
        let record = classifier.classify(scanned("a.txt", Some("txt")));
        assert_eq!(record.subcategory, None);
    }
}
