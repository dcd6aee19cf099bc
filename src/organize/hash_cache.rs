use dashmap::DashMap;
use std::fs;
use std::hash::Hasher as _;
use std::io::{self, Read};
use std::path::Path;
use std::time::UNIX_EPOCH;
use tracing::trace;
use twox_hash::XxHash64;

/// In-memory content hash cache for byte-identity checks. The key includes
/// the mtime with subsecond precision so a rewritten file never reuses a
/// stale entry.
pub struct HashCache {
    entries: DashMap<String, u64>,
}

impl HashCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn content_hash(&self, file: &Path) -> io::Result<u64> {
        let key = cache_key(file)?;
        if let Some(hash) = self.entries.get(&key) {
            trace!("Found hash for {} in cache", file.display());
            return Ok(*hash);
        }
        let data = read_full_file(file)?;
        let hash = hash_data(&data);
        self.entries.insert(key, hash);
        Ok(hash)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for HashCache {
    fn default() -> Self {
        Self::new()
    }
}

fn cache_key(file: &Path) -> io::Result<String> {
    let canonical = fs::canonicalize(file)?;
    let metadata = fs::metadata(file)?;
    let modified = metadata.modified()?;
    let timestamp = modified
        .duration_since(UNIX_EPOCH)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    Ok(format!(
        "{}|{}.{}",
        canonical.to_string_lossy(),
        timestamp.as_secs(),
        timestamp.subsec_nanos()
    ))
}

pub fn read_full_file(file: &Path) -> io::Result<Vec<u8>> {
    let mut f = fs::File::open(file)?;
    let mut buffer = Vec::new();
    f.read_to_end(&mut buffer)?;
    Ok(buffer)
}

pub fn hash_data(data: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(data);
    hasher.finish()
}
