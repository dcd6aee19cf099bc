use crate::config::{self, AppConfig};
use crate::error::Error;
use crate::model::{Decision, FileRecord, MoveAction};
use crate::organize::classifier::Classifier;
use crate::organize::grouper::Grouper;
use crate::organize::hash_cache::HashCache;
use crate::organize::mover;
use crate::organize::reporter::ManifestLog;
use crate::organize::resolver::Resolver;
use crate::organize::scanner;
use crate::progress::ProgressReporter;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Archive subtrees from earlier runs are never rescanned; reorganizing
/// them would defeat the recovery path they exist for.
const ARCHIVE_DIR_PATTERN: &str = r"[/\\]_archive_[0-9]{8}_[0-9]{6}";

pub struct OrganizeEngine {
    config: AppConfig,
}

#[derive(Debug)]
pub struct RunResult {
    pub scan_duration: Duration,
    pub classify_duration: Duration,
    pub resolve_duration: Duration,
    pub move_duration: Duration,
    pub total_records: usize,
    pub group_count: usize,
    pub ungrouped_count: usize,
    pub manifest_path: PathBuf,
    pub actions: Vec<MoveAction>,
}

impl RunResult {
    pub fn decision_count(&self, decision: Decision) -> usize {
        self.actions
            .iter()
            .filter(|a| a.decision == decision)
            .count()
    }
}

impl OrganizeEngine {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Run the full organization pipeline:
    /// 1. Sequential scan of the root directories
    /// 2. Classification and role-suffix grouping
    /// 3. Single-threaded conflict planning
    /// 4. Move execution (or dry-run logging) with per-entry manifest flush
    ///
    /// Configuration problems abort before any filesystem mutation;
    /// per-file failures become `error` rows and the run completes.
    pub fn run(&self, reporter: &dyn ProgressReporter) -> Result<RunResult, Error> {
        let run_timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();

        let roots = self.validated_roots()?;
        let dest_root = self.validated_dest_root()?;

        let mut exclude_patterns = self.config.exclude_patterns.clone();
        exclude_patterns.push(ARCHIVE_DIR_PATTERN.to_string());
        let excludes = config::compile_exclude_patterns(&exclude_patterns)?;

        info!("Processing directories: {:?}", roots);
        if self.config.dry_run {
            info!("Dry run: decisions are logged but nothing is moved");
        }

        // Phase 1: scan
        reporter.on_scan_start();
        let scan_start = Instant::now();
        let scanned = scanner::scan(&roots, &excludes, reporter);
        let scan_duration = scan_start.elapsed();
        reporter.on_scan_complete(scanned.len(), scan_duration.as_secs_f64());
        debug!(
            "Scan completed in {:.2}s, {} files found",
            scan_duration.as_secs_f64(),
            scanned.len()
        );

        // Phase 2: classify and group
        let classify_start = Instant::now();
        let classifier = Classifier::new(&self.config.subcategories);
        let records: Vec<FileRecord> = scanned
            .into_iter()
            .map(|file| classifier.classify(file))
            .collect();
        let total_records = records.len();
        reporter.on_classify_complete(total_records);

        let grouper = Grouper::new(&self.config.role_suffixes);
        let groups = grouper.group(records);
        let group_count = groups.iter().filter(|g| g.grouped).count();
        let ungrouped_count = groups.len() - group_count;
        let classify_duration = classify_start.elapsed();
        reporter.on_group_complete(group_count, ungrouped_count);
        debug!(
            "Classified and grouped in {:.2}s, {} groups, {} ungrouped singletons",
            classify_duration.as_secs_f64(),
            group_count,
            ungrouped_count
        );

        // Phase 3: conflict planning (single-threaded; destinations race
        // otherwise)
        let resolve_start = Instant::now();
        let hash_cache = HashCache::new();
        let resolver = Resolver::new(&dest_root, &run_timestamp, &hash_cache);
        let planned = resolver.plan(&groups)?;
        let resolve_duration = resolve_start.elapsed();
        reporter.on_resolve_complete(planned.len());
        debug!(
            "Planned {} actions in {:.2}s ({} cached hashes)",
            planned.len(),
            resolve_duration.as_secs_f64(),
            hash_cache.len()
        );

        // Phase 4: execute and log
        let manifest = ManifestLog::create(
            Path::new(&self.config.report_dir),
            &run_timestamp,
            self.config.report_format,
        )?;
        let manifest_path = manifest.path().to_path_buf();
        let log = Mutex::new(manifest);

        let move_start = Instant::now();
        let actions = mover::execute(
            &planned,
            self.config.dry_run,
            self.config.parallel_moves,
            &log,
            reporter,
        )?;
        let move_duration = move_start.elapsed();
        reporter.on_move_complete(actions.len(), move_duration.as_secs_f64());

        info!("Manifest written to {}", manifest_path.display());

        Ok(RunResult {
            scan_duration,
            classify_duration,
            resolve_duration,
            move_duration,
            total_records,
            group_count,
            ungrouped_count,
            manifest_path,
            actions,
        })
    }

    fn validated_roots(&self) -> Result<Vec<PathBuf>, Error> {
        if self.config.root_paths.is_empty() {
            return Err(Error::Other("no root directories configured".to_string()));
        }
        let non_overlapping =
            config::non_overlapping_directories(self.config.root_paths.clone());
        let mut roots = Vec::new();
        for root in non_overlapping {
            let path = PathBuf::from(&root);
            if !path.is_dir() {
                return Err(Error::UnreadableRoot(path));
            }
            fs::read_dir(&path).map_err(|_| Error::UnreadableRoot(path.clone()))?;
            roots.push(fs::canonicalize(&path)?);
        }
        Ok(roots)
    }

    fn validated_dest_root(&self) -> Result<PathBuf, Error> {
        if self.config.dest_root.is_empty() {
            return Err(Error::Other("no destination root configured".to_string()));
        }
        let dest_root = PathBuf::from(&self.config.dest_root);
        // Canonical form keeps the already-in-place check honest when a run
        // re-targets its own destination tree.
        if dest_root.exists() {
            Ok(fs::canonicalize(&dest_root)?)
        } else {
            Ok(dest_root)
        }
    }
}
