use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use sweep_rs::{sweep, Disposal, DisposeError, SweepMode, SweepRequest, SweepResult, Sweeper};
use tempfile::TempDir;

const DAY: Duration = Duration::from_secs(86_400);

fn write_file(dir: &Path, name: &str, size: usize, modified: SystemTime) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, vec![0u8; size]).unwrap();
    set_file_mtime(&path, FileTime::from_system_time(modified)).unwrap();
    path
}

/// `a`: 100 bytes, ten days old. `b`: 50 bytes, modified now.
fn two_file_root() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let now = SystemTime::now();
    write_file(temp_dir.path(), "a", 100, now - 10 * DAY);
    write_file(temp_dir.path(), "b", 50, now);
    temp_dir
}

fn permanent() -> Sweeper<Disposal> {
    Sweeper::new(Disposal::Permanent)
}

#[test]
fn test_empty_root() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir(temp_dir.path().join("empty_subdir")).unwrap();

    let request = SweepRequest::new([temp_dir.path()], SweepMode::Execute, 0);
    assert_eq!(permanent().sweep(&request), SweepResult::default());
}

#[test]
fn test_missing_root() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("does-not-exist");

    let request = SweepRequest::new([missing], SweepMode::Execute, 0);
    assert_eq!(permanent().sweep(&request), SweepResult::default());
}

#[test]
fn test_file_root_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_file(temp_dir.path(), "not_a_dir", 10, SystemTime::now() - 10 * DAY);

    let request = SweepRequest::new([file.clone()], SweepMode::Execute, 0);
    assert_eq!(permanent().sweep(&request), SweepResult::default());
    assert!(file.exists());
}

#[test]
fn test_preview_selects_only_old_files() {
    let root = two_file_root();

    let request = SweepRequest::new([root.path()], SweepMode::Preview, 86_400);
    assert_eq!(
        permanent().sweep(&request),
        SweepResult { files_processed: 1, total_bytes: 100 }
    );
    assert!(root.path().join("a").exists());
    assert!(root.path().join("b").exists());
}

#[test]
fn test_execute_without_age_filter_empties_root() {
    let root = two_file_root();

    let request = SweepRequest::new([root.path()], SweepMode::Execute, 0);
    assert_eq!(
        permanent().sweep(&request),
        SweepResult { files_processed: 2, total_bytes: 150 }
    );
    assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
}

#[test]
fn test_execute_with_age_filter_keeps_recent_files() {
    let root = two_file_root();

    let request = SweepRequest::older_than_days([root.path()], SweepMode::Execute, 1);
    let report = permanent().run(&request);
    assert_eq!(report.result(), SweepResult { files_processed: 1, total_bytes: 100 });
    assert_eq!(report.deleted, 1);
    assert_eq!(report.skipped_recent, 1);
    assert!(!root.path().join("a").exists());
    assert!(root.path().join("b").exists());
}

#[test]
fn test_zero_age_selects_everything_recursively() {
    let temp_dir = TempDir::new().unwrap();
    let now = SystemTime::now();
    write_file(temp_dir.path(), "fresh", 7, now);
    let nested = temp_dir.path().join("Cache_Data").join("index-dir");
    fs::create_dir_all(&nested).unwrap();
    write_file(&nested, "the-real-index", 13, now - 400 * DAY);

    let request = SweepRequest::new([temp_dir.path()], SweepMode::Preview, 0);
    assert_eq!(
        permanent().sweep(&request),
        SweepResult { files_processed: 2, total_bytes: 20 }
    );
}

#[test]
fn test_preview_is_idempotent() {
    let root = two_file_root();
    let request = SweepRequest::new([root.path()], SweepMode::Preview, 0);

    let first = permanent().sweep(&request);
    let second = permanent().sweep(&request);
    assert_eq!(first, second);
    assert_eq!(first, SweepResult { files_processed: 2, total_bytes: 150 });
}

#[test]
fn test_age_cutoff_is_exclusive() {
    let temp_dir = TempDir::new().unwrap();
    let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_750_000_000);
    write_file(temp_dir.path(), "exactly_at_cutoff", 40, now - DAY);
    write_file(temp_dir.path(), "one_second_older", 60, now - DAY - Duration::from_secs(1));

    let request = SweepRequest::new([temp_dir.path()], SweepMode::Preview, 86_400);
    assert_eq!(
        permanent().with_now(now).sweep(&request),
        SweepResult { files_processed: 1, total_bytes: 60 }
    );
}

#[test]
fn test_default_sweep_preview_leaves_files() {
    let root = two_file_root();

    // The default disposal is the trash, but a preview never reaches it
    let request = SweepRequest::new([root.path()], SweepMode::Preview, 86_400);
    assert_eq!(sweep(&request), SweepResult { files_processed: 1, total_bytes: 100 });
    assert!(root.path().join("a").exists());
    assert!(root.path().join("b").exists());
}

#[test]
fn test_duplicate_roots_counted_once() {
    let root = two_file_root();

    let request = SweepRequest::new([root.path(), root.path()], SweepMode::Preview, 0);
    assert_eq!(request.roots().len(), 1);
    assert_eq!(
        permanent().sweep(&request),
        SweepResult { files_processed: 2, total_bytes: 150 }
    );
}

#[test]
fn test_multiple_roots_accumulate() {
    let first = two_file_root();
    let second = TempDir::new().unwrap();
    write_file(second.path(), "c", 25, SystemTime::now() - 30 * DAY);

    let request = SweepRequest::new(
        [first.path(), second.path(), Path::new("/definitely/not/here")],
        SweepMode::Preview,
        86_400,
    );
    assert_eq!(
        permanent().sweep(&request),
        SweepResult { files_processed: 2, total_bytes: 125 }
    );
}

#[test]
fn test_failed_deletion_still_counted() {
    let root = two_file_root();

    // Every removal fails: the batch goes on and the counters still include both files
    let refuse = |_: &Path| -> Result<(), DisposeError> {
        Err(DisposeError::Other("file in use".to_string()))
    };
    let request = SweepRequest::new([root.path()], SweepMode::Execute, 0);
    let report = Sweeper::new(refuse).run(&request);

    assert_eq!(report.result(), SweepResult { files_processed: 2, total_bytes: 150 });
    assert_eq!(report.delete_failed, 2);
    assert_eq!(report.deleted, 0);
    assert!(root.path().join("a").exists());
    assert!(root.path().join("b").exists());
}

#[test]
fn test_readonly_file_removed_on_retry() {
    let temp_dir = TempDir::new().unwrap();
    let locked = write_file(temp_dir.path(), "thumbcache_1024.db", 80, SystemTime::now());
    let mut perms = fs::metadata(&locked).unwrap().permissions();
    perms.set_readonly(true);
    fs::set_permissions(&locked, perms).unwrap();

    // Behaves like a platform that refuses to touch read-only files
    let strict = |path: &Path| -> Result<(), DisposeError> {
        if fs::metadata(path)?.permissions().readonly() {
            return Err(DisposeError::PermissionDenied(path.display().to_string()));
        }
        fs::remove_file(path)?;
        Ok(())
    };

    let request = SweepRequest::thumbnails(temp_dir.path(), SweepMode::Execute);
    let report = Sweeper::new(strict).run(&request);
    assert_eq!(report.result(), SweepResult { files_processed: 1, total_bytes: 80 });
    assert_eq!(report.deleted, 1);
    assert!(!locked.exists());
}

#[test]
fn test_thumbnail_variant_ignores_other_files() {
    let temp_dir = TempDir::new().unwrap();
    let now = SystemTime::now();
    write_file(temp_dir.path(), "thumbcache_32.db", 10, now);
    write_file(temp_dir.path(), "thumbcache_96.db", 20, now);
    write_file(temp_dir.path(), "iconcache_16.db", 30, now);
    let nested = temp_dir.path().join("sub");
    fs::create_dir(&nested).unwrap();
    write_file(&nested, "thumbcache_256.db", 40, now);

    let request = SweepRequest::thumbnails(temp_dir.path(), SweepMode::Execute);
    assert_eq!(
        permanent().sweep(&request),
        SweepResult { files_processed: 2, total_bytes: 30 }
    );
    assert!(temp_dir.path().join("iconcache_16.db").exists());
    assert!(nested.join("thumbcache_256.db").exists());
}

#[cfg(unix)]
#[test]
fn test_unreadable_entry_is_excluded() {
    let root = two_file_root();
    // Dangling link: listed by the walk, but its metadata cannot be read
    std::os::unix::fs::symlink(root.path().join("vanished"), root.path().join("broken")).unwrap();

    let request = SweepRequest::new([root.path()], SweepMode::Preview, 0);
    let report = permanent().run(&request);
    assert_eq!(report.result(), SweepResult { files_processed: 2, total_bytes: 150 });
    assert_eq!(report.skipped_unreadable, 1);
}

#[cfg(unix)]
#[test]
fn test_directory_links_are_not_followed() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("root");
    fs::create_dir(&root).unwrap();
    write_file(&root, "data", 10, SystemTime::now());
    // A link back to the root would loop forever if followed
    std::os::unix::fs::symlink(&root, root.join("loop")).unwrap();

    let request = SweepRequest::new([&root], SweepMode::Preview, 0);
    assert_eq!(
        permanent().sweep(&request),
        SweepResult { files_processed: 1, total_bytes: 10 }
    );
}
