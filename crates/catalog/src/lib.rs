//! Apps on the badge (`system/apps`, `apps`) and in the local catalog checkout.
//!
//! Installing only ever copies from a catalog that is already on disk;
//! fetching it is the simulator crate's job.

use badgeforge_core::{
    system_apps_dir, user_apps_dir, AppEntry, BridgeError, Result, APP_ICON_FILE,
    APP_MARKER_FILE,
};
use badgeforge_guard::{is_protected, validate_app_name};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const CATALOG_MISSING: &str =
    "Simulator not set up. Please set up the simulator first to browse available apps.";
pub const CATALOG_APP_MISSING: &str =
    "App not found in repository. Please set up the simulator first to download apps.";

/// An app bundle found on disk, with its location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogApp {
    pub name: String,
    pub path: PathBuf,
    pub has_icon: bool,
}

impl CatalogApp {
    pub fn entry(&self) -> AppEntry {
        AppEntry {
            name: self.name.clone(),
            has_icon: self.has_icon,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CopyStats {
    pub files: usize,
    pub bytes: u64,
}

pub fn catalog_apps_dir(catalog_root: &Path) -> PathBuf {
    catalog_root.join("badge").join("apps")
}

/// Apps installed on the badge. System apps are scanned first and the first
/// occurrence of a name wins.
pub fn list_apps(mount: &Path) -> Vec<AppEntry> {
    let mut apps: Vec<AppEntry> = Vec::new();
    for root in [system_apps_dir(mount), user_apps_dir(mount)] {
        for app in scan_app_root(&root) {
            if apps.iter().any(|existing| existing.name == app.name) {
                continue;
            }
            apps.push(app.entry());
        }
    }
    apps
}

/// Apps the catalog checkout can install.
pub fn list_available(catalog_root: &Path) -> Result<Vec<AppEntry>> {
    Ok(list_catalog_apps(catalog_root)?
        .iter()
        .map(CatalogApp::entry)
        .collect())
}

/// Catalog apps with their absolute paths, suitable as simulator targets.
pub fn list_catalog_apps(catalog_root: &Path) -> Result<Vec<CatalogApp>> {
    let apps_dir = catalog_apps_dir(catalog_root);
    if !apps_dir.is_dir() {
        return Err(BridgeError::PrerequisiteMissing(CATALOG_MISSING.to_string()));
    }
    Ok(scan_app_root(&apps_dir))
}

/// Directories under `root` that carry the app marker, sorted by name.
/// Unreadable roots are logged and treated as empty.
pub fn scan_app_root(root: &Path) -> Vec<CatalogApp> {
    if !root.exists() {
        return Vec::new();
    }
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(root = %root.display(), error = %err, "cannot scan app directory");
            return Vec::new();
        }
    };
    let mut apps = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() || !path.join(APP_MARKER_FILE).exists() {
            continue;
        }
        apps.push(CatalogApp {
            name: entry.file_name().to_string_lossy().to_string(),
            has_icon: path.join(APP_ICON_FILE).exists(),
            path,
        });
    }
    apps.sort_by(|a, b| a.name.cmp(&b.name));
    apps
}

/// Copy `name` from the catalog checkout into the badge's `apps/`.
pub fn install_app(name: &str, catalog_root: &Path, mount: &Path) -> Result<CopyStats> {
    validate_app_name(name)?;
    let user_path = user_apps_dir(mount).join(name);
    if system_apps_dir(mount).join(name).exists() || user_path.exists() {
        return Err(BridgeError::AlreadyExists(name.to_string()));
    }

    let source = catalog_apps_dir(catalog_root).join(name);
    if !source.is_dir() {
        return Err(BridgeError::PrerequisiteMissing(CATALOG_APP_MISSING.to_string()));
    }

    let stats = match copy_dir_recursive(&source, &user_path) {
        Ok(stats) => stats,
        Err(err) => {
            // A half-copied app would list as installed.
            if let Err(cleanup) = fs::remove_dir_all(&user_path) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!(path = %user_path.display(), error = %cleanup, "cannot remove partial install");
                }
            }
            return Err(BridgeError::io("Failed to install app", err));
        }
    };
    info!(app = name, files = stats.files, bytes = stats.bytes, "app installed");
    Ok(stats)
}

/// Delete `apps/<name>` from the badge. System apps are never touched; a
/// failure part way through leaves whatever was not yet deleted.
pub fn remove_app(name: &str, mount: &Path) -> Result<()> {
    if is_protected(name) {
        return Err(BridgeError::Protected(name.to_string()));
    }
    validate_app_name(name)?;
    let app_path = user_apps_dir(mount).join(name);
    if !app_path.exists() {
        return Err(BridgeError::NotFound(name.to_string()));
    }
    fs::remove_dir_all(&app_path).map_err(|err| BridgeError::io("Failed to remove app", err))?;
    info!(app = name, "app removed");
    Ok(())
}

fn copy_dir_recursive(source: &Path, dest: &Path) -> io::Result<CopyStats> {
    let mut stats = CopyStats::default();
    fs::create_dir_all(dest)?;
    copy_dir_recursive_inner(source, dest, &mut stats)?;
    Ok(stats)
}

fn copy_dir_recursive_inner(current: &Path, dest: &Path, stats: &mut CopyStats) -> io::Result<()> {
    for entry in fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        let metadata = fs::metadata(&path)?;
        let dest_path = dest.join(entry.file_name());
        if metadata.is_dir() {
            fs::create_dir_all(&dest_path)?;
            copy_dir_recursive_inner(&path, &dest_path, stats)?;
        } else if metadata.is_file() {
            fs::copy(&path, &dest_path)?;
            stats.files += 1;
            stats.bytes = stats.bytes.saturating_add(metadata.len());
        } else {
            debug!(path = %path.display(), "skipping special file");
        }
    }
    Ok(())
}
