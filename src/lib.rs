//! sweep-rs - Windows cache sweeping library
//!
//! This library finds well-known cache directories and sweeps them: files are
//! selected by age, measured, and (outside preview mode) removed one by one.
//! It can also switch off programs that Windows launches at logon.

pub mod dispose;
pub mod error;
pub mod format;
pub mod logging;
pub mod platform;
pub mod startup;
pub mod sweep;
pub mod targets;
pub mod tui;

pub use dispose::{Disposal, DisposeError, Disposer};
pub use error::{Result, SweepError};
pub use format::human_size;
pub use startup::{Hive, RunKeyStore, StartupEntry};
pub use sweep::{
    sweep, FileOutcome, NameFilter, SweepMode, SweepReport, SweepRequest, SweepResult, Sweeper,
};
pub use targets::{all_targets, find_target, CacheLocations, SweepTarget, TargetKind};
