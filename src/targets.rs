use crate::dispose::Disposal;
use crate::error::{Result, SweepError};
use crate::platform;
use crate::sweep::{SweepMode, SweepRequest, SweepResult, Sweeper};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default age threshold for temp directories
pub const DEFAULT_TEMP_DAYS: i64 = 7;

/// Cache sub-directories of a Chromium profile
const CHROMIUM_CACHE_SUBDIRS: &[&str] = &[
    "Cache",
    "Code Cache/js",
    "Code Cache/wasm",
    "GPUCache",
    "Service Worker/CacheStorage",
    "Media Cache",
    "ShaderCache",
];

/// Cache sub-directories of a Firefox profile
const FIREFOX_CACHE_SUBDIRS: &[&str] =
    &["cache2", "startupCache", "jumpListCache", "storage/default"];

const OPERA_EDITIONS: &[&str] = &["Opera Stable", "Opera GX Stable"];

/// Base directories the enumerator resolves cache locations from
#[derive(Debug, Clone, Default)]
pub struct CacheLocations {
    /// `%LOCALAPPDATA%`
    pub local_app_data: Option<PathBuf>,
    /// `%APPDATA%`
    pub roaming_app_data: Option<PathBuf>,
    pub temp_dirs: Vec<PathBuf>,
}

impl CacheLocations {
    /// Resolve the locations of the current user
    pub fn detect() -> Self {
        let temp_dirs = std::iter::once(std::env::temp_dir())
            .chain(system_temp_dir())
            .collect();

        Self {
            local_app_data: dirs::data_local_dir(),
            roaming_app_data: dirs::data_dir(),
            temp_dirs,
        }
    }
}

/// `%SystemRoot%\Temp`
#[cfg(windows)]
fn system_temp_dir() -> Option<PathBuf> {
    std::env::var_os("SystemRoot").map(|root| PathBuf::from(root).join("Temp"))
}

#[cfg(not(windows))]
fn system_temp_dir() -> Option<PathBuf> {
    None
}

fn push_existing(paths: &mut Vec<PathBuf>, base: &Path, relative: &str) {
    let path = relative.split('/').fold(base.to_path_buf(), |p, part| p.join(part));
    if path.is_dir() {
        paths.push(path);
    }
}

fn profile_dirs(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(root) else {
        return Vec::new();
    };
    let mut profiles: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    profiles.sort();
    profiles
}

fn chromium_profile_caches(paths: &mut Vec<PathBuf>, user_data: &Path) {
    for profile in profile_dirs(user_data) {
        for sub in CHROMIUM_CACHE_SUBDIRS {
            push_existing(paths, &profile, sub);
        }
    }
}

/// Cache directories of Chrome, Edge, Opera / Opera GX and Firefox, for every
/// profile found. Only directories that exist are returned.
pub fn browser_cache_roots(locations: &CacheLocations) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(local) = &locations.local_app_data {
        let chrome = local.join("Google").join("Chrome").join("User Data");
        chromium_profile_caches(&mut paths, &chrome);
        let edge = local.join("Microsoft").join("Edge").join("User Data");
        chromium_profile_caches(&mut paths, &edge);
    }

    // Opera keeps profiles in roaming or local app data depending on the edition
    for base in [&locations.roaming_app_data, &locations.local_app_data]
        .into_iter()
        .flatten()
    {
        let opera_root = base.join("Opera Software");
        if !opera_root.is_dir() {
            continue;
        }
        for edition in OPERA_EDITIONS {
            chromium_profile_caches(&mut paths, &opera_root.join(edition));
        }
    }

    if let Some(roaming) = &locations.roaming_app_data {
        let ff_profiles = roaming.join("Mozilla").join("Firefox").join("Profiles");
        for profile in profile_dirs(&ff_profiles) {
            for sub in FIREFOX_CACHE_SUBDIRS {
                push_existing(&mut paths, &profile, sub);
            }
        }
    }

    debug!("Found {} browser cache directories", paths.len());
    paths
}

/// Explorer's thumbnail cache directory
pub fn thumbnail_cache_dir(locations: &CacheLocations) -> Option<PathBuf> {
    locations
        .local_app_data
        .as_ref()
        .map(|local| local.join("Microsoft").join("Windows").join("Explorer"))
}

/// Kind of sweep a target performs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
    /// Every file under the browser cache roots
    BrowserCaches,
    /// `thumbcache*.db` in the Explorer directory
    Thumbnails,
    /// Temp directories, files older than the given number of days
    TempFiles { older_than_days: i64 },
    /// The Recycle Bin as a whole
    RecycleBin,
}

/// A named cleanup target that can be scanned and cleaned
#[derive(Debug, Clone)]
pub struct SweepTarget {
    pub id: &'static str,
    pub name: String,
    pub description: String,
    pub kind: TargetKind,
    pub enabled: bool,
    locations: CacheLocations,
    disposal: Disposal,
}

impl SweepTarget {
    /// Use `disposal` for files removed by [`SweepTarget::clean`]
    pub fn with_disposal(mut self, disposal: Disposal) -> Self {
        self.disposal = disposal;
        self
    }

    /// Measure without deleting anything
    pub fn scan(&self) -> Result<SweepResult> {
        self.run(SweepMode::Preview)
    }

    /// Delete and report what was selected
    pub fn clean(&self) -> Result<SweepResult> {
        self.run(SweepMode::Execute)
    }

    pub fn run(&self, mode: SweepMode) -> Result<SweepResult> {
        if self.kind == TargetKind::RecycleBin {
            let contents = platform::query_recycle_bin()?;
            if mode == SweepMode::Execute && !contents.is_empty() {
                platform::clean_recycle_bin(false)?;
            }
            return Ok(contents);
        }

        let request = self.request(mode)?;
        if request.roots().is_empty() {
            info!("{}: nothing to sweep", self.name);
            return Ok(SweepResult::default());
        }
        Ok(Sweeper::new(self.disposal).sweep(&request))
    }

    /// The sweep request this target resolves to
    pub fn request(&self, mode: SweepMode) -> Result<SweepRequest> {
        match &self.kind {
            TargetKind::BrowserCaches => {
                Ok(SweepRequest::new(browser_cache_roots(&self.locations), mode, 0))
            }
            TargetKind::Thumbnails => thumbnail_cache_dir(&self.locations)
                .map(|dir| SweepRequest::thumbnails(dir, mode))
                .ok_or_else(|| {
                    SweepError::InvalidRequest("local app data directory is unknown".to_string())
                }),
            TargetKind::TempFiles { older_than_days } => Ok(SweepRequest::older_than_days(
                self.locations.temp_dirs.iter().cloned(),
                mode,
                *older_than_days,
            )),
            TargetKind::RecycleBin => Err(SweepError::InvalidRequest(
                "the Recycle Bin is not swept file by file".to_string(),
            )),
        }
    }
}

/// All targets for the given locations
pub fn all_targets(locations: &CacheLocations, temp_days: i64) -> Vec<SweepTarget> {
    let temp_list = locations
        .temp_dirs
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");

    vec![
        SweepTarget {
            id: "browser_caches",
            name: "Browser caches".to_string(),
            description: "Chrome, Edge, Opera/GX and Firefox caches, all profiles".to_string(),
            kind: TargetKind::BrowserCaches,
            enabled: true,
            locations: locations.clone(),
            disposal: Disposal::default(),
        },
        SweepTarget {
            id: "thumbnails",
            name: "Thumbnail cache".to_string(),
            description: "Explorer thumbcache_*.db files".to_string(),
            kind: TargetKind::Thumbnails,
            enabled: true,
            locations: locations.clone(),
            disposal: Disposal::default(),
        },
        SweepTarget {
            id: "temp_files",
            name: "Temporary files".to_string(),
            description: format!("Files older than {} days in {}", temp_days, temp_list),
            kind: TargetKind::TempFiles {
                older_than_days: temp_days,
            },
            enabled: true,
            locations: locations.clone(),
            disposal: Disposal::default(),
        },
        SweepTarget {
            id: "recycle_bin",
            name: "Recycle Bin".to_string(),
            description: "Empty the Recycle Bin on all drives".to_string(),
            kind: TargetKind::RecycleBin,
            enabled: cfg!(windows),
            locations: locations.clone(),
            disposal: Disposal::default(),
        },
    ]
}

/// Look up a target by id
pub fn find_target(locations: &CacheLocations, temp_days: i64, id: &str) -> Option<SweepTarget> {
    all_targets(locations, temp_days).into_iter().find(|t| t.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mkdirs(base: &Path, relative: &str) -> PathBuf {
        let path = relative.split('/').fold(base.to_path_buf(), |p, part| p.join(part));
        fs::create_dir_all(&path).unwrap();
        path
    }

    fn locations_in(root: &Path) -> CacheLocations {
        CacheLocations {
            local_app_data: Some(mkdirs(root, "Local")),
            roaming_app_data: Some(mkdirs(root, "Roaming")),
            temp_dirs: vec![mkdirs(root, "Temp")],
        }
    }

    #[test]
    fn test_browser_cache_roots_per_profile() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let locations = locations_in(root);

        let chrome_default = mkdirs(root, "Local/Google/Chrome/User Data/Default/Cache");
        let chrome_js = mkdirs(root, "Local/Google/Chrome/User Data/Profile 1/Code Cache/js");
        let edge_gpu = mkdirs(root, "Local/Microsoft/Edge/User Data/Default/GPUCache");
        let opera = mkdirs(root, "Roaming/Opera Software/Opera GX Stable/Default/ShaderCache");
        let firefox = mkdirs(root, "Roaming/Mozilla/Firefox/Profiles/abc.default/cache2");
        // Not a cache directory
        mkdirs(root, "Local/Google/Chrome/User Data/Default/Bookmarks");

        let roots = browser_cache_roots(&locations);
        assert_eq!(roots.len(), 5);
        for expected in [chrome_default, chrome_js, edge_gpu, opera, firefox] {
            assert!(roots.contains(&expected), "missing {}", expected.display());
        }
    }

    #[test]
    fn test_browser_cache_roots_without_browsers() {
        let temp_dir = TempDir::new().unwrap();
        let locations = locations_in(temp_dir.path());
        assert!(browser_cache_roots(&locations).is_empty());
        assert!(browser_cache_roots(&CacheLocations::default()).is_empty());
    }

    #[test]
    fn test_thumbnail_cache_dir() {
        let locations = CacheLocations {
            local_app_data: Some(PathBuf::from("C:/Users/me/AppData/Local")),
            ..Default::default()
        };
        let dir = thumbnail_cache_dir(&locations).unwrap();
        assert!(dir.ends_with(Path::new("Microsoft").join("Windows").join("Explorer")));
        assert!(thumbnail_cache_dir(&CacheLocations::default()).is_none());
    }

    #[test]
    fn test_thumbnail_target_scans_only_thumbcache_files() {
        let temp_dir = TempDir::new().unwrap();
        let locations = locations_in(temp_dir.path());
        let explorer = mkdirs(temp_dir.path(), "Local/Microsoft/Windows/Explorer");
        fs::write(explorer.join("thumbcache_256.db"), vec![0u8; 300]).unwrap();
        fs::write(explorer.join("thumbcache_idx.db"), vec![0u8; 20]).unwrap();
        fs::write(explorer.join("iconcache_32.db"), vec![0u8; 1000]).unwrap();

        let target = find_target(&locations, DEFAULT_TEMP_DAYS, "thumbnails").unwrap();
        let result = target.scan().unwrap();
        assert_eq!(result, SweepResult { files_processed: 2, total_bytes: 320 });
        assert!(explorer.join("thumbcache_256.db").exists());
    }

    #[test]
    fn test_browser_target_scan() {
        let temp_dir = TempDir::new().unwrap();
        let locations = locations_in(temp_dir.path());
        let cache = mkdirs(temp_dir.path(), "Local/Google/Chrome/User Data/Default/Cache");
        fs::write(cache.join("data_0"), vec![0u8; 128]).unwrap();
        let nested = mkdirs(&cache, "Cache_Data");
        fs::write(nested.join("f_000001"), vec![0u8; 64]).unwrap();

        let target = find_target(&locations, DEFAULT_TEMP_DAYS, "browser_caches").unwrap();
        assert_eq!(
            target.scan().unwrap(),
            SweepResult { files_processed: 2, total_bytes: 192 }
        );
    }

    #[test]
    fn test_temp_target_request_uses_days() {
        let temp_dir = TempDir::new().unwrap();
        let locations = locations_in(temp_dir.path());
        let target = find_target(&locations, 3, "temp_files").unwrap();
        let request = target.request(SweepMode::Preview).unwrap();
        assert_eq!(request.min_age.as_secs(), 3 * 86_400);
        assert_eq!(request.roots(), locations.temp_dirs.as_slice());
    }

    #[test]
    fn test_detect_includes_user_temp() {
        let locations = CacheLocations::detect();
        assert_eq!(locations.temp_dirs.first(), Some(&std::env::temp_dir()));
        if cfg!(windows) {
            assert!(locations.temp_dirs.len() <= 2);
        } else {
            assert_eq!(locations.temp_dirs.len(), 1);
        }
    }

    #[test]
    fn test_all_targets_ids() {
        let ids: Vec<_> = all_targets(&CacheLocations::default(), DEFAULT_TEMP_DAYS)
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, ["browser_caches", "thumbnails", "temp_files", "recycle_bin"]);
        assert!(find_target(&CacheLocations::default(), 7, "prefetch").is_none());
    }
}
