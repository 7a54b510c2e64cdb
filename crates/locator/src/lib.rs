//! Finds the badge volume and works out which mode it is in.
//!
//! Nothing is cached: every call probes the filesystem again, so a badge
//! that rebooted between two polls is simply reported with its new state.

use badgeforge_core::{
    matches_volume_name, DeviceMode, DeviceStatus, VolumeCandidate, BOOTSEL_VOLUME_NAME,
    ENTRY_POINT_FILE, SECRETS_FILE, USER_APPS_DIR,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Probe the platform's well-known mount points.
pub fn locate() -> DeviceStatus {
    locate_in(&platform_candidates())
}

/// Probe `extra` paths first, then (when `scan_platform` is set) the
/// platform's well-known mount points.
pub fn locate_with(extra: &[PathBuf], scan_platform: bool) -> DeviceStatus {
    let mut candidates: Vec<VolumeCandidate> =
        extra.iter().cloned().map(VolumeCandidate::new).collect();
    if scan_platform {
        candidates.extend(platform_candidates());
    }
    locate_in(&candidates)
}

/// First candidate that exists and is recognisable wins. Existing volumes
/// that look like neither mode are skipped.
pub fn locate_in(candidates: &[VolumeCandidate]) -> DeviceStatus {
    for candidate in candidates {
        if !exists(&candidate.path) {
            continue;
        }
        match classify(candidate) {
            Some(mode) => {
                debug!(path = %candidate.path.display(), mode = mode.as_str(), "badge volume found");
                return DeviceStatus::attached(candidate.path.clone(), mode);
            }
            None => {
                debug!(path = %candidate.path.display(), "volume present but not a badge, skipping");
            }
        }
    }
    DeviceStatus::disconnected()
}

/// Mode of an existing candidate volume, or `None` when it is not a badge.
pub fn classify(candidate: &VolumeCandidate) -> Option<DeviceMode> {
    let is_bootsel = candidate
        .volume_name()
        .map(|name| matches_volume_name(&name, BOOTSEL_VOLUME_NAME))
        .unwrap_or(false);
    if is_bootsel {
        return Some(DeviceMode::Bootsel);
    }
    if has_disk_signature(&candidate.path) {
        return Some(DeviceMode::Disk);
    }
    None
}

pub fn has_disk_signature(root: &Path) -> bool {
    [SECRETS_FILE, ENTRY_POINT_FILE, USER_APPS_DIR]
        .iter()
        .any(|name| exists(&root.join(name)))
}

pub fn platform_candidates() -> Vec<VolumeCandidate> {
    #[cfg(target_os = "windows")]
    {
        return badgeforge_host_windows::candidate_volumes();
    }
    #[cfg(target_os = "linux")]
    {
        return badgeforge_host_linux::candidate_volumes();
    }
    #[cfg(target_os = "macos")]
    {
        return badgeforge_host_macos::candidate_volumes();
    }
    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        Vec::new()
    }
}

fn exists(path: &Path) -> bool {
    path.try_exists().unwrap_or(false)
}
