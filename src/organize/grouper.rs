use crate::model::{FileRecord, ItemGroup};
use ahash::AHashMap;

pub struct Grouper {
    /// Role suffixes sorted longest-first so `_analysis.txt` is never
    /// mistaken for plain `.txt`.
    suffixes: Vec<String>,
}

impl Grouper {
    pub fn new(role_suffixes: &[String]) -> Self {
        let mut suffixes = role_suffixes.to_vec();
        suffixes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        Self { suffixes }
    }

    /// Strip the first (longest) matching role suffix. `None` means the file
    /// matches no known suffix and stays ungrouped.
    pub fn base_key(&self, file_name: &str) -> Option<String> {
        for suffix in &self.suffixes {
            if file_name.len() > suffix.len() && file_name.ends_with(suffix.as_str()) {
                return Some(file_name[..file_name.len() - suffix.len()].to_string());
            }
        }
        None
    }

    /// Build item groups, preserving the insertion order of both groups and
    /// members. A file matching no suffix becomes a singleton ungrouped
    /// group keyed by its full file name; it must not silently disappear.
    pub fn group(&self, records: Vec<FileRecord>) -> Vec<ItemGroup> {
        let mut groups: Vec<ItemGroup> = Vec::new();
        let mut index: AHashMap<String, usize> = AHashMap::new();

        for record in records {
            match self.base_key(&record.file_name) {
                Some(key) => match index.get(&key) {
                    Some(&i) => groups[i].members.push(record),
                    None => {
                        index.insert(key.clone(), groups.len());
                        groups.push(ItemGroup {
                            key,
                            members: vec![record],
                            grouped: true,
                        });
                    }
                },
                None => groups.push(ItemGroup {
                    key: record.file_name.clone(),
                    members: vec![record],
                    grouped: false,
                }),
            }
        }

        groups
    }
}
