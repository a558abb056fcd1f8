use crate::error::{Result, SweepError};
use crate::startup::{Hive, RegValue, RunKeyStore, RUN_KEY};
use crate::sweep::SweepResult;
use std::ffi::OsStr;
use std::io;
use std::os::windows::ffi::OsStrExt;
use std::ptr;
use tracing::{info, warn};
use winapi::shared::minwindef::{DWORD, HKEY};
use winapi::shared::winerror::{
    ERROR_FILE_NOT_FOUND, ERROR_MORE_DATA, ERROR_NO_MORE_ITEMS, ERROR_SUCCESS,
};
use winapi::um::shellapi::{
    SHEmptyRecycleBinW, SHQueryRecycleBinW, SHERB_NOCONFIRMATION, SHERB_NOPROGRESSUI,
    SHERB_NOSOUND, SHQUERYRBINFO,
};
use winapi::um::winnt::{KEY_QUERY_VALUE, KEY_READ, KEY_SET_VALUE};
use winapi::um::winreg::{
    RegCloseKey, RegDeleteValueW, RegEnumValueW, RegOpenKeyExW, RegQueryValueExW, RegSetValueExW,
    HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, REGSAM,
};

/// Item count and size of the Recycle Bin across all drives
pub fn query_recycle_bin() -> Result<SweepResult> {
    let mut info = SHQUERYRBINFO {
        cbSize: std::mem::size_of::<SHQUERYRBINFO>() as u32,
        i64Size: 0,
        i64NumItems: 0,
    };

    let hr = unsafe { SHQueryRecycleBinW(ptr::null(), &mut info) };
    if hr != 0 {
        return Err(SweepError::WindowsError(format!(
            "SHQueryRecycleBinW failed (HRESULT {:#x})",
            hr
        )));
    }

    Ok(SweepResult {
        files_processed: info.i64NumItems.max(0) as u64,
        total_bytes: info.i64Size.max(0) as u64,
    })
}

/// Empty the Windows Recycle Bin
pub fn clean_recycle_bin(dry_run: bool) -> Result<()> {
    if dry_run {
        info!("[PREVIEW] Would empty the Recycle Bin");
        return Ok(());
    }

    info!("Emptying Recycle Bin...");
    let hr = unsafe {
        SHEmptyRecycleBinW(
            ptr::null_mut(),
            ptr::null(),
            SHERB_NOCONFIRMATION | SHERB_NOPROGRESSUI | SHERB_NOSOUND,
        )
    };

    if hr == 0 {
        info!("Recycle Bin emptied");
    } else {
        // An already empty bin reports a failure HRESULT as well
        warn!("SHEmptyRecycleBinW returned {:#x}. This is not critical.", hr);
    }
    Ok(())
}

/// The `Run` keys of `HKEY_CURRENT_USER` and `HKEY_LOCAL_MACHINE`
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistryRunKeys;

pub fn run_key_store() -> Result<Box<dyn RunKeyStore>> {
    Ok(Box::new(RegistryRunKeys))
}

fn wide(text: &str) -> Vec<u16> {
    OsStr::new(text).encode_wide().chain(std::iter::once(0)).collect()
}

/// `LSTATUS` to `io::Result`
fn check(status: i32) -> io::Result<()> {
    if status as DWORD == ERROR_SUCCESS {
        Ok(())
    } else {
        Err(io::Error::from_raw_os_error(status))
    }
}

/// An open `Run` key, closed on drop
struct RunKey(HKEY);

impl RunKey {
    fn open(hive: Hive, access: REGSAM) -> io::Result<Self> {
        let root = match hive {
            Hive::CurrentUser => HKEY_CURRENT_USER,
            Hive::LocalMachine => HKEY_LOCAL_MACHINE,
        };
        let path = wide(RUN_KEY);
        let mut key: HKEY = ptr::null_mut();
        check(unsafe { RegOpenKeyExW(root, path.as_ptr(), 0, access, &mut key) })?;
        Ok(RunKey(key))
    }
}

impl Drop for RunKey {
    fn drop(&mut self) {
        unsafe {
            RegCloseKey(self.0);
        }
    }
}

impl RunKeyStore for RegistryRunKeys {
    fn values(&self, hive: Hive) -> io::Result<Vec<(String, RegValue)>> {
        let key = RunKey::open(hive, KEY_READ)?;
        let mut values = Vec::new();
        // Value names are at most 16383 characters
        let mut name_buf = vec![0u16; 16_384];
        let mut data_buf = vec![0u8; 4096];
        let mut index: DWORD = 0;

        loop {
            let mut name_len = name_buf.len() as DWORD;
            let mut data_len = data_buf.len() as DWORD;
            let mut kind: DWORD = 0;
            let status = unsafe {
                RegEnumValueW(
                    key.0,
                    index,
                    name_buf.as_mut_ptr(),
                    &mut name_len,
                    ptr::null_mut(),
                    &mut kind,
                    data_buf.as_mut_ptr(),
                    &mut data_len,
                )
            };
            match status as DWORD {
                ERROR_NO_MORE_ITEMS => break,
                ERROR_MORE_DATA => {
                    let needed = (data_len as usize).max(data_buf.len() * 2);
                    data_buf.resize(needed, 0);
                    continue;
                }
                _ => check(status)?,
            }

            let name = String::from_utf16_lossy(&name_buf[..name_len as usize]);
            let data = data_buf[..data_len as usize].to_vec();
            values.push((name, RegValue { kind, data }));
            index += 1;
        }
        Ok(values)
    }

    fn get(&self, hive: Hive, name: &str) -> io::Result<Option<RegValue>> {
        let key = match RunKey::open(hive, KEY_QUERY_VALUE) {
            Ok(key) => key,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let name = wide(name);
        let mut kind: DWORD = 0;
        let mut len: DWORD = 0;

        let status = unsafe {
            RegQueryValueExW(
                key.0,
                name.as_ptr(),
                ptr::null_mut(),
                &mut kind,
                ptr::null_mut(),
                &mut len,
            )
        };
        if status as DWORD == ERROR_FILE_NOT_FOUND {
            return Ok(None);
        }
        check(status)?;

        let mut data = vec![0u8; len as usize];
        check(unsafe {
            RegQueryValueExW(
                key.0,
                name.as_ptr(),
                ptr::null_mut(),
                &mut kind,
                data.as_mut_ptr(),
                &mut len,
            )
        })?;
        data.truncate(len as usize);
        Ok(Some(RegValue { kind, data }))
    }

    fn set(&mut self, hive: Hive, name: &str, value: &RegValue) -> io::Result<()> {
        let key = RunKey::open(hive, KEY_SET_VALUE)?;
        let name = wide(name);
        check(unsafe {
            RegSetValueExW(
                key.0,
                name.as_ptr(),
                0,
                value.kind,
                value.data.as_ptr(),
                value.data.len() as DWORD,
            )
        })
    }

    fn delete(&mut self, hive: Hive, name: &str) -> io::Result<()> {
        let key = RunKey::open(hive, KEY_SET_VALUE)?;
        let name = wide(name);
        check(unsafe { RegDeleteValueW(key.0, name.as_ptr()) })
    }
}
