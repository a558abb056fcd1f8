//! Cache sweep engine.
//!
//! A sweep walks a set of root directories, selects every regular file older
//! than a cutoff, adds it to the running totals and, in execute mode, hands it
//! to a [`Disposer`]. Per-file problems never abort the batch.
//!
//! Counting happens at selection time. In [`SweepMode::Execute`] a file whose
//! removal fails is still part of `files_processed` and `total_bytes`, so the
//! numbers describe what the sweep *tried* to reclaim, not what was freed.
//! [`SweepReport`] carries the separate `deleted` / `bytes_deleted` tallies for
//! callers that need the confirmed figures.

use crate::dispose::{remove_with_retry, Disposal, Disposer};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info};
use walkdir::WalkDir;

const SECS_PER_DAY: u64 = 86_400;

/// Whether a sweep only measures or also deletes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepMode {
    Preview,
    Execute,
}

impl SweepMode {
    pub fn from_preview_flag(preview: bool) -> Self {
        if preview {
            SweepMode::Preview
        } else {
            SweepMode::Execute
        }
    }
}

/// Case-insensitive file name match on a prefix and a suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameFilter {
    pub prefix: String,
    pub suffix: String,
}

impl NameFilter {
    pub fn new(prefix: &str, suffix: &str) -> Self {
        Self {
            prefix: prefix.to_ascii_lowercase(),
            suffix: suffix.to_ascii_lowercase(),
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        let lower = file_name.to_ascii_lowercase();
        lower.starts_with(&self.prefix) && lower.ends_with(&self.suffix)
    }
}

/// Parameters of one sweep
#[derive(Debug, Clone)]
pub struct SweepRequest {
    roots: Vec<PathBuf>,
    pub mode: SweepMode,
    /// Files modified less than this long ago are kept. Zero disables the filter.
    pub min_age: Duration,
    pub name_filter: Option<NameFilter>,
    /// Walk depth limit, 1 meaning the root's direct children only
    pub max_depth: Option<usize>,
}

impl SweepRequest {
    pub fn new<I, P>(roots: I, mode: SweepMode, min_age_secs: u64) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut seen = HashSet::new();
        let roots = roots
            .into_iter()
            .map(Into::into)
            .filter(|root: &PathBuf| seen.insert(root.clone()))
            .collect();

        Self {
            roots,
            mode,
            min_age: Duration::from_secs(min_age_secs),
            name_filter: None,
            max_depth: None,
        }
    }

    /// Build a request from an age in days. Negative ages count as zero.
    pub fn older_than_days<I, P>(roots: I, mode: SweepMode, days: i64) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let days = u64::try_from(days).unwrap_or(0);
        Self::new(roots, mode, days.saturating_mul(SECS_PER_DAY))
    }

    /// The Explorer thumbnail cache: `thumbcache*.db` directly inside `explorer_dir`.
    pub fn thumbnails(explorer_dir: impl Into<PathBuf>, mode: SweepMode) -> Self {
        Self::new([explorer_dir.into()], mode, 0)
            .with_name_filter(NameFilter::new("thumbcache", ".db"))
            .with_max_depth(1)
    }

    pub fn with_name_filter(mut self, filter: NameFilter) -> Self {
        self.name_filter = Some(filter);
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

/// A file seen during the walk
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: SystemTime,
}

/// What happened to one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Metadata could not be read
    SkippedUnreadable,
    /// Newer than the cutoff
    SkippedRecent,
    /// Counted, left in place (preview)
    Selected,
    Deleted,
    /// Counted, but still on disk
    DeleteFailed,
}

/// Aggregate counters returned to callers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepResult {
    pub files_processed: u64,
    pub total_bytes: u64,
}

impl SweepResult {
    pub fn is_empty(&self) -> bool {
        self.files_processed == 0
    }

    pub fn merge(&mut self, other: SweepResult) {
        self.files_processed += other.files_processed;
        self.total_bytes += other.total_bytes;
    }
}

/// Fold of every per-file outcome of a sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub files_processed: u64,
    pub total_bytes: u64,
    pub deleted: u64,
    pub bytes_deleted: u64,
    pub delete_failed: u64,
    pub skipped_unreadable: u64,
    pub skipped_recent: u64,
}

impl SweepReport {
    pub fn record(&mut self, outcome: FileOutcome, size_bytes: u64) {
        match outcome {
            FileOutcome::SkippedUnreadable => self.skipped_unreadable += 1,
            FileOutcome::SkippedRecent => self.skipped_recent += 1,
            FileOutcome::Selected | FileOutcome::Deleted | FileOutcome::DeleteFailed => {
                self.files_processed += 1;
                self.total_bytes += size_bytes;
                if outcome == FileOutcome::Deleted {
                    self.deleted += 1;
                    self.bytes_deleted += size_bytes;
                } else if outcome == FileOutcome::DeleteFailed {
                    self.delete_failed += 1;
                }
            }
        }
    }

    pub fn result(&self) -> SweepResult {
        SweepResult {
            files_processed: self.files_processed,
            total_bytes: self.total_bytes,
        }
    }
}

/// Runs sweeps with a given removal primitive
pub struct Sweeper<D = Disposal> {
    disposer: D,
    now: Option<SystemTime>,
}

impl Default for Sweeper<Disposal> {
    fn default() -> Self {
        Self::new(Disposal::default())
    }
}

impl<D: Disposer> Sweeper<D> {
    pub fn new(disposer: D) -> Self {
        Self { disposer, now: None }
    }

    /// Pin the clock used to compute the age cutoff.
    pub fn with_now(mut self, now: SystemTime) -> Self {
        self.now = Some(now);
        self
    }

    pub fn sweep(&self, request: &SweepRequest) -> SweepResult {
        self.run(request).result()
    }

    pub fn run(&self, request: &SweepRequest) -> SweepReport {
        let cutoff = self.cutoff(request.min_age);
        let mut report = SweepReport::default();

        for root in request.roots() {
            if !root.is_dir() {
                debug!("Skipping root {}: not a directory", root.display());
                continue;
            }
            self.sweep_root(root, request, cutoff, &mut report);
        }

        info!(
            "Sweep ({:?}) finished: {} files, {} bytes selected; \
             {} deleted, {} failed, {} unreadable, {} too recent",
            request.mode,
            report.files_processed,
            report.total_bytes,
            report.deleted,
            report.delete_failed,
            report.skipped_unreadable,
            report.skipped_recent
        );
        report
    }

    fn cutoff(&self, min_age: Duration) -> Option<SystemTime> {
        if min_age.is_zero() {
            return None;
        }
        let now = self.now.unwrap_or_else(SystemTime::now);
        // A threshold reaching before the epoch keeps everything.
        Some(now.checked_sub(min_age).unwrap_or(SystemTime::UNIX_EPOCH))
    }

    fn sweep_root(
        &self,
        root: &Path,
        request: &SweepRequest,
        cutoff: Option<SystemTime>,
        report: &mut SweepReport,
    ) {
        let mut walker = WalkDir::new(root).follow_links(false).min_depth(1);
        if let Some(depth) = request.max_depth {
            walker = walker.max_depth(depth);
        }

        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_dir() {
                continue;
            }
            if let Some(filter) = &request.name_filter {
                if !filter.matches(&entry.file_name().to_string_lossy()) {
                    continue;
                }
            }

            let candidate = match stat_entry(entry.path()) {
                Stat::File(candidate) => candidate,
                Stat::Directory => continue,
                Stat::Unreadable => {
                    report.record(FileOutcome::SkippedUnreadable, 0);
                    continue;
                }
            };

            let outcome = self.process(&candidate, request.mode, cutoff);
            report.record(outcome, candidate.size_bytes);
        }
    }

    fn process(
        &self,
        candidate: &FileCandidate,
        mode: SweepMode,
        cutoff: Option<SystemTime>,
    ) -> FileOutcome {
        if let Some(cutoff) = cutoff {
            if candidate.modified >= cutoff {
                return FileOutcome::SkippedRecent;
            }
        }

        match mode {
            SweepMode::Preview => {
                debug!("[PREVIEW] Would delete: {}", candidate.path.display());
                FileOutcome::Selected
            }
            SweepMode::Execute => match remove_with_retry(&self.disposer, &candidate.path) {
                Ok(()) => {
                    debug!("Deleted: {}", candidate.path.display());
                    FileOutcome::Deleted
                }
                Err(e) => {
                    debug!("Could not delete {}: {}", candidate.path.display(), e);
                    FileOutcome::DeleteFailed
                }
            },
        }
    }
}

enum Stat {
    File(FileCandidate),
    Directory,
    Unreadable,
}

/// Stat a walked entry, following links.
fn stat_entry(path: &Path) -> Stat {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(_) => return Stat::Unreadable,
    };
    if metadata.is_dir() {
        return Stat::Directory;
    }
    match metadata.modified() {
        Ok(modified) => Stat::File(FileCandidate {
            path: path.to_path_buf(),
            size_bytes: metadata.len(),
            modified,
        }),
        Err(_) => Stat::Unreadable,
    }
}

/// Sweep with the default removal primitive (trash, falling back to unlink on
/// permission errors).
pub fn sweep(request: &SweepRequest) -> SweepResult {
    Sweeper::new(Disposal::default()).sweep(request)
}
