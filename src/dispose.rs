//! File removal primitives.
//!
//! A [`Disposer`] removes exactly one file. The sweep engine only cares whether
//! that worked, and if not, whether the failure was a permission problem that
//! is worth one retry after clearing the read-only attribute.

use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Why a single file could not be removed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DisposeError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Other(String),
}

impl From<io::Error> for DisposeError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::PermissionDenied {
            DisposeError::PermissionDenied(err.to_string())
        } else {
            DisposeError::Other(err.to_string())
        }
    }
}

/// Capability to remove a single file.
pub trait Disposer {
    fn dispose(&self, path: &Path) -> Result<(), DisposeError>;
}

impl<F> Disposer for F
where
    F: Fn(&Path) -> Result<(), DisposeError>,
{
    fn dispose(&self, path: &Path) -> Result<(), DisposeError> {
        self(path)
    }
}

/// How selected files leave the disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposal {
    /// Move to the Recycle Bin (or the desktop trash on other platforms)
    #[default]
    Trash,
    /// Unlink immediately
    Permanent,
}

impl Disposer for Disposal {
    fn dispose(&self, path: &Path) -> Result<(), DisposeError> {
        match self {
            Disposal::Trash => trash::delete(path).map_err(|e| classify_trash_error(path, e)),
            Disposal::Permanent => fs::remove_file(path).map_err(DisposeError::from),
        }
    }
}

/// `ERROR_ACCESS_DENIED`, as a Win32 code and wrapped in an HRESULT
const WIN32_ACCESS_DENIED: i32 = 5;
const HRESULT_ACCESS_DENIED: i32 = 0x8007_0005_u32 as i32;

/// Map a trash backend failure onto the two cases the sweep distinguishes.
fn classify_trash_error(path: &Path, err: trash::Error) -> DisposeError {
    let denied = match &err {
        #[cfg(all(
            unix,
            not(target_os = "macos"),
            not(target_os = "ios"),
            not(target_os = "android")
        ))]
        trash::Error::FileSystem { source, .. } => source.kind() == io::ErrorKind::PermissionDenied,
        trash::Error::Os { code, .. } => is_access_denied_code(*code),
        _ => false,
    };

    // A read-only file is the one case the retry knows how to fix, whatever
    // shape the backend reported it in.
    if denied || is_readonly(path) {
        DisposeError::PermissionDenied(err.to_string())
    } else {
        DisposeError::Other(err.to_string())
    }
}

fn is_access_denied_code(code: i32) -> bool {
    if code == WIN32_ACCESS_DENIED || code == HRESULT_ACCESS_DENIED {
        return true;
    }
    #[cfg(unix)]
    {
        let kind = io::Error::from_raw_os_error(code).kind();
        if kind == io::ErrorKind::PermissionDenied {
            return true;
        }
    }
    false
}

fn is_readonly(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.permissions().readonly())
        .unwrap_or(false)
}

/// Clear the read-only attribute of a file. Best-effort, errors are ignored.
pub fn clear_readonly(path: &Path) {
    if let Ok(metadata) = fs::symlink_metadata(path) {
        let mut perms = metadata.permissions();
        if perms.readonly() {
            perms.set_readonly(false);
            if let Err(e) = fs::set_permissions(path, perms) {
                debug!("Could not clear read-only flag on {}: {}", path.display(), e);
            }
        }
    }
}

/// Remove `path` through `disposer`. A permission failure gets exactly one
/// retry: the read-only flag is cleared and the file is unlinked directly.
pub fn remove_with_retry<D>(disposer: &D, path: &Path) -> Result<(), DisposeError>
where
    D: Disposer + ?Sized,
{
    match disposer.dispose(path) {
        Ok(()) => Ok(()),
        Err(DisposeError::PermissionDenied(reason)) => {
            debug!("Permission denied on {} ({}), retrying", path.display(), reason);
            clear_readonly(path);
            fs::remove_file(path).map_err(DisposeError::from)
        }
        Err(e) => Err(e),
    }
}
