//! Programs launched at logon from the `Run` registry keys.
//!
//! Disabling an entry renames its value with [`DISABLED_SUFFIX`], which Windows
//! does not recognise, so the program no longer starts. Enabling strips the
//! suffix again. The value's type and data are carried over untouched.
//!
//! The rename logic works against any [`RunKeyStore`]; the registry-backed
//! store lives in [`crate::platform`].

use crate::error::Result;
use crate::platform;
use std::io;
use tracing::{debug, error, info, warn};

/// Path of the `Run` key below each hive
pub const RUN_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";

/// Appended to the value name of a disabled entry
pub const DISABLED_SUFFIX: &str = " (Disabled by sweep-rs)";

/// `REG_SZ`
pub const REG_SZ: u32 = 1;
/// `REG_EXPAND_SZ`
pub const REG_EXPAND_SZ: u32 = 2;

/// Registry hive holding a `Run` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hive {
    CurrentUser,
    LocalMachine,
}

impl Hive {
    pub const ALL: [Hive; 2] = [Hive::CurrentUser, Hive::LocalMachine];

    pub fn short_name(self) -> &'static str {
        match self {
            Hive::CurrentUser => "HKCU",
            Hive::LocalMachine => "HKLM",
        }
    }

    /// `HKCU\Software\...\Run`
    pub fn run_key_path(self) -> String {
        format!(r"{}\{}", self.short_name(), RUN_KEY)
    }
}

/// A raw registry value: type tag plus data bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegValue {
    pub kind: u32,
    pub data: Vec<u8>,
}

impl RegValue {
    /// A `REG_SZ` holding `text`, NUL-terminated UTF-16
    pub fn string(text: &str) -> Self {
        let data = text
            .encode_utf16()
            .chain(std::iter::once(0))
            .flat_map(u16::to_le_bytes)
            .collect();
        Self { kind: REG_SZ, data }
    }

    /// The command line of a string value. Other types are summarised.
    pub fn to_text(&self) -> String {
        match self.kind {
            REG_SZ | REG_EXPAND_SZ => {
                let units: Vec<u16> = self
                    .data
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
                    .trim_end_matches('\0')
                    .to_string()
            }
            kind => format!("<type {}, {} bytes>", kind, self.data.len()),
        }
    }
}

/// Access to the `Run` key of each hive.
///
/// A missing key is reported by [`RunKeyStore::values`] as
/// [`io::ErrorKind::NotFound`] and by [`RunKeyStore::get`] as `Ok(None)`.
pub trait RunKeyStore {
    fn values(&self, hive: Hive) -> io::Result<Vec<(String, RegValue)>>;
    fn get(&self, hive: Hive, name: &str) -> io::Result<Option<RegValue>>;
    fn set(&mut self, hive: Hive, name: &str, value: &RegValue) -> io::Result<()>;
    fn delete(&mut self, hive: Hive, name: &str) -> io::Result<()>;
}

/// The `Run` keys of this machine, or `NotSupported` off Windows
pub fn system_store() -> Result<Box<dyn RunKeyStore>> {
    platform::run_key_store()
}

/// One startup program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupEntry {
    pub hive: Hive,
    /// Value name without the disabled marker
    pub name: String,
    pub command: String,
    pub enabled: bool,
}

impl StartupEntry {
    pub fn location(&self) -> String {
        self.hive.run_key_path()
    }
}

/// Every entry of both hives, disabled ones included. Hives that are missing
/// or cannot be read are skipped.
pub fn list_entries<S: RunKeyStore + ?Sized>(store: &S) -> Vec<StartupEntry> {
    let mut entries = Vec::new();
    for hive in Hive::ALL {
        let values = match store.values(hive) {
            Ok(values) => values,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} does not exist", hive.run_key_path());
                continue;
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                warn!("No permission to read {}", hive.run_key_path());
                continue;
            }
            Err(e) => {
                error!("Could not read {}: {}", hive.run_key_path(), e);
                continue;
            }
        };

        for (name, value) in values {
            let (name, enabled) = match name.strip_suffix(DISABLED_SUFFIX) {
                Some(base) => (base.to_string(), false),
                None => (name, true),
            };
            entries.push(StartupEntry {
                hive,
                name,
                command: value.to_text(),
                enabled,
            });
        }
    }
    entries
}

/// Disable `name` in every hive where it is enabled. Returns true if
/// anything changed.
pub fn disable_entry<S: RunKeyStore + ?Sized>(store: &mut S, name: &str) -> bool {
    let disabled = format!("{}{}", name, DISABLED_SUFFIX);
    rename_entry(store, name, &disabled, "Disabled")
}

/// Re-enable `name` in every hive where it was disabled. Returns true if
/// anything changed.
pub fn enable_entry<S: RunKeyStore + ?Sized>(store: &mut S, name: &str) -> bool {
    let disabled = format!("{}{}", name, DISABLED_SUFFIX);
    rename_entry(store, &disabled, name, "Enabled")
}

fn rename_entry<S: RunKeyStore + ?Sized>(store: &mut S, from: &str, to: &str, verb: &str) -> bool {
    let mut changed = false;
    for hive in Hive::ALL {
        match move_value(store, hive, from, to) {
            Ok(true) => {
                info!("{} startup entry '{}' in {}", verb, to, hive.run_key_path());
                changed = true;
            }
            Ok(false) => {}
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                warn!("No permission to change '{}' in {}", from, hive.run_key_path());
            }
            Err(e) => error!("Could not rename '{}' in {}: {}", from, hive.run_key_path(), e),
        }
    }
    changed
}

/// Write the value under its new name, then drop the old one
fn move_value<S: RunKeyStore + ?Sized>(
    store: &mut S,
    hive: Hive,
    from: &str,
    to: &str,
) -> io::Result<bool> {
    let Some(value) = store.get(hive, from)? else {
        return Ok(false);
    };
    store.set(hive, to, &value)?;
    store.delete(hive, from)?;
    Ok(true)
}

/// In-memory `Run` keys
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    values: Vec<(Hive, String, RegValue)>,
    denied: Vec<Hive>,
}

#[cfg(test)]
impl MemoryStore {
    pub(crate) fn with_value(mut self, hive: Hive, name: &str, command: &str) -> Self {
        self.values.push((hive, name.to_string(), RegValue::string(command)));
        self
    }

    pub(crate) fn deny(mut self, hive: Hive) -> Self {
        self.denied.push(hive);
        self
    }

    fn check(&self, hive: Hive) -> io::Result<()> {
        if self.denied.contains(&hive) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "Access is denied."));
        }
        Ok(())
    }
}

#[cfg(test)]
impl RunKeyStore for MemoryStore {
    fn values(&self, hive: Hive) -> io::Result<Vec<(String, RegValue)>> {
        self.check(hive)?;
        Ok(self
            .values
            .iter()
            .filter(|(h, _, _)| *h == hive)
            .map(|(_, name, value)| (name.clone(), value.clone()))
            .collect())
    }

    fn get(&self, hive: Hive, name: &str) -> io::Result<Option<RegValue>> {
        self.check(hive)?;
        Ok(self
            .values
            .iter()
            .find(|(h, n, _)| *h == hive && n == name)
            .map(|(_, _, value)| value.clone()))
    }

    fn set(&mut self, hive: Hive, name: &str, value: &RegValue) -> io::Result<()> {
        self.check(hive)?;
        self.values.retain(|(h, n, _)| !(*h == hive && n == name));
        self.values.push((hive, name.to_string(), value.clone()));
        Ok(())
    }

    fn delete(&mut self, hive: Hive, name: &str) -> io::Result<()> {
        self.check(hive)?;
        self.values.retain(|(h, n, _)| !(*h == hive && n == name));
        Ok(())
    }
}
