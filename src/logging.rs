use crate::error::{Result, SweepError};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Where log lines go
#[derive(Debug, Clone)]
pub enum LogTarget {
    /// stderr, plus a log file when given
    Console { file: Option<PathBuf> },
    /// Only a log file; the terminal belongs to the TUI
    FileOnly(PathBuf),
}

/// Default log file: `<temp>/sweep-rs-logs/sweep_<unix-seconds>.log`
pub fn default_log_path() -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    std::env::temp_dir()
        .join("sweep-rs-logs")
        .join(format!("sweep_{}.log", stamp))
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    File::create(path)
}

/// Install the global subscriber. `RUST_LOG` wins over `default_level`.
///
/// Fails if the log file cannot be created or a global subscriber is
/// already installed.
pub fn init(target: LogTarget, default_level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (console, file) = match target {
        LogTarget::Console { file } => (true, file),
        LogTarget::FileOnly(path) => (false, Some(path)),
    };

    let console_layer = console.then(|| fmt::layer().with_writer(std::io::stderr).boxed());
    let file_layer = match file {
        Some(path) => {
            let file = open_log_file(&path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| SweepError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_path_layout() {
        let path = default_log_path();
        assert!(path.starts_with(std::env::temp_dir().join("sweep-rs-logs")));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("sweep_") && name.ends_with(".log"));
    }

    #[test]
    fn test_open_log_file_creates_parent() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("logs").join("sweep.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_unwritable_log_file_is_an_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        fs::write(&blocker, b"").unwrap();

        let target = LogTarget::FileOnly(blocker.join("sweep.log"));
        assert!(matches!(init(target, "info"), Err(SweepError::Io(_))));
    }

    #[test]
    fn test_second_init_reports_failure() {
        // Whichever call installs the subscriber first, a later one must fail
        let _ = init(LogTarget::Console { file: None }, "warn");
        let again = init(LogTarget::Console { file: None }, "warn");
        assert!(matches!(again, Err(SweepError::Logging(_))));
    }
}
