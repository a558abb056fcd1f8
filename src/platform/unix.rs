use crate::error::{Result, SweepError};
use crate::startup::RunKeyStore;
use crate::sweep::SweepResult;
use tracing::info;

/// Query the Recycle Bin (not supported on Unix/Linux)
pub fn query_recycle_bin() -> Result<SweepResult> {
    Err(SweepError::NotSupported(
        "Recycle Bin is not available on Unix/Linux systems".to_string(),
    ))
}

/// Clean the Recycle Bin (not supported on Unix/Linux)
///
/// On Unix-like systems, there is no unified recycle bin. Each desktop
/// environment may have its own trash implementation.
pub fn clean_recycle_bin(dry_run: bool) -> Result<()> {
    if dry_run {
        info!("[PREVIEW] Recycle Bin cleaning is not supported on this platform");
    } else {
        info!("Recycle Bin cleaning is not supported on this platform");
    }
    Err(SweepError::NotSupported(
        "Recycle Bin is not available on Unix/Linux systems".to_string(),
    ))
}

/// Startup entries live in the Windows registry only
pub fn run_key_store() -> Result<Box<dyn RunKeyStore>> {
    Err(SweepError::NotSupported(
        "Startup entries are only available on Windows".to_string(),
    ))
}
