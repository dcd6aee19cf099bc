use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

const DEFAULT_SPINNER_TEMPLATE: &str =
    "[{elapsed_precise}] {spinner} {prefix:.bold.dim} {wide_msg}";
const DEFAULT_BAR_TEMPLATE: &str =
    "[{elapsed_precise}] {prefix:.bold}▕{bar:.blue}▏{percent} {wide_msg}";
const DEFAULT_FINISH_TEMPLATE: &str = "[{elapsed_precise}] {msg}";
const DEFAULT_STEADY_TICK_MS: u64 = 100;

/// Trait for reporting pipeline progress.
///
/// The CLI implements this with indicatif; tests use the silent no-op
/// implementation. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self) {}
    fn on_scan_progress(&self, _files_found: usize) {}
    fn on_scan_complete(&self, _total_files: usize, _duration_secs: f64) {}
    fn on_classify_complete(&self, _total_files: usize) {}
    fn on_group_complete(&self, _groups: usize, _ungrouped: usize) {}
    fn on_resolve_complete(&self, _planned: usize) {}
    fn on_move_start(&self, _total: usize) {}
    fn on_move_progress(&self, _completed: usize, _total: usize) {}
    fn on_move_complete(&self, _total: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Terminal progress display: a spinner for the scan phase and a bar for
/// move execution.
pub struct CliReporter {
    _multi: MultiProgress,
    scan: ProgressBar,
    moves: ProgressBar,
}

impl CliReporter {
    pub fn new() -> Self {
        let multi = MultiProgress::new();

        let scan = multi.add(ProgressBar::new_spinner());
        scan.set_style(
            ProgressStyle::with_template(DEFAULT_SPINNER_TEMPLATE)
                .unwrap()
                .tick_strings(&[".  ", ".. ", "...", " ..", "  .", "   "]),
        );
        scan.set_prefix("scan");

        let moves = multi.add(ProgressBar::new(0));
        moves.set_style(
            ProgressStyle::with_template(DEFAULT_BAR_TEMPLATE)
                .unwrap()
                .progress_chars("█▓▒░  "),
        );
        moves.set_prefix("move");

        Self {
            _multi: multi,
            scan,
            moves,
        }
    }

    fn finish_style() -> ProgressStyle {
        ProgressStyle::with_template(DEFAULT_FINISH_TEMPLATE).unwrap()
    }
}

impl Default for CliReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self) {
        self.scan
            .enable_steady_tick(Duration::from_millis(DEFAULT_STEADY_TICK_MS));
    }

    fn on_scan_progress(&self, files_found: usize) {
        self.scan.set_message(format!("{} files", files_found));
    }

    fn on_scan_complete(&self, total_files: usize, duration_secs: f64) {
        self.scan.set_style(Self::finish_style());
        self.scan.finish_with_message(format!(
            "Scanned {} files in {:.2}s",
            total_files, duration_secs
        ));
    }

    fn on_move_start(&self, total: usize) {
        self.moves.set_length(total as u64);
    }

    fn on_move_progress(&self, completed: usize, _total: usize) {
        self.moves.set_position(completed as u64);
    }

    fn on_move_complete(&self, total: usize, duration_secs: f64) {
        self.moves.set_style(Self::finish_style());
        self.moves.finish_with_message(format!(
            "{} actions logged in {:.2}s",
            total, duration_secs
        ));
    }
}
