//! Native Firebird client library discovery.
//!
//! Directories are searched in a fixed order and every existing client
//! library found in them becomes a connection candidate. The caller tries
//! the candidates in turn until one connects.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::SourceConfig;

/// Client library file names for the current platform, embedded build first.
#[cfg(windows)]
pub const LIBRARY_NAMES: &[&str] = &["fbembed.dll", "fbclient.dll"];

/// Client library file names for the current platform, embedded build first.
#[cfg(target_os = "macos")]
pub const LIBRARY_NAMES: &[&str] = &["libfbembed.dylib", "libfbclient.dylib"];

/// Client library file names for the current platform, embedded build first.
#[cfg(all(unix, not(target_os = "macos")))]
pub const LIBRARY_NAMES: &[&str] = &["libfbembed.so", "libfbclient.so", "libfbclient.so.2"];

/// Ordered client library search for one database file.
#[derive(Debug, Clone)]
pub struct ClientSearch {
    dirs: Vec<PathBuf>,
    explicit: Option<PathBuf>,
}

impl ClientSearch {
    /// Build the search for a database, honoring the source configuration.
    pub fn new(config: &SourceConfig, db_path: &Path) -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        let cwd = std::env::current_dir().ok();

        Self {
            dirs: search_dirs(config, exe_dir.as_deref(), cwd.as_deref(), db_path),
            explicit: config.client_library.clone(),
        }
    }

    /// Existing client libraries, in the order they should be tried.
    ///
    /// A configured `client_library` is the only candidate; the directory
    /// search is skipped.
    pub fn candidates(&self) -> Vec<PathBuf> {
        if let Some(ref lib) = self.explicit {
            return if lib.is_file() { vec![lib.clone()] } else { Vec::new() };
        }
        candidates_in(&self.dirs, LIBRARY_NAMES)
    }

    /// Paths reported when no candidate connects.
    pub fn searched(&self) -> Vec<PathBuf> {
        match self.explicit {
            Some(ref lib) => vec![lib.clone()],
            None => self.dirs.clone(),
        }
    }
}

/// Directories to search, in order, without duplicates.
///
/// Configured directories come first, then `<exe_dir>/runtime`, the
/// working directory, the executable's directory, the database's directory
/// and finally the conventional install locations.
pub fn search_dirs(
    config: &SourceConfig,
    exe_dir: Option<&Path>,
    cwd: Option<&Path>,
    db_path: &Path,
) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = config.search_dirs.clone();
    if let Some(exe_dir) = exe_dir {
        dirs.push(exe_dir.join("runtime"));
    }
    dirs.extend(cwd.map(Path::to_path_buf));
    dirs.extend(exe_dir.map(Path::to_path_buf));
    if let Some(db_dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        dirs.push(db_dir.to_path_buf());
    }
    dirs.extend(install_dirs());

    let mut unique = Vec::with_capacity(dirs.len());
    for dir in dirs {
        if !unique.contains(&dir) {
            unique.push(dir);
        }
    }
    unique
}

/// Existing files named `names` inside `dirs`, directory-major order.
pub fn candidates_in(dirs: &[PathBuf], names: &[&str]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for dir in dirs {
        if !dir.is_dir() {
            continue;
        }
        for name in names {
            let path = dir.join(name);
            if path.is_file() {
                debug!("Found client library candidate: {}", path.display());
                found.push(path);
            }
        }
    }
    found
}

#[cfg(windows)]
fn install_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(pf) = std::env::var_os("ProgramFiles") {
        let base = PathBuf::from(pf).join("Firebird");
        dirs.push(base.join("Firebird_2_5").join("bin"));
        dirs.push(base.join("Firebird_3_0"));
    }
    if let Some(pf) = std::env::var_os("ProgramFiles(x86)") {
        dirs.push(PathBuf::from(pf).join("Firebird").join("Firebird_2_5").join("bin"));
    }
    dirs
}

#[cfg(not(windows))]
fn install_dirs() -> Vec<PathBuf> {
    ["/opt/firebird/lib", "/usr/lib/firebird/lib", "/Library/Frameworks/Firebird.framework/Libraries"]
        .iter()
        .map(PathBuf::from)
        .collect()
}
