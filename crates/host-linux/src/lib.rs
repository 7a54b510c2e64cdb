use badgeforge_core::{matches_volume_name, VolumeCandidate, BOOTSEL_VOLUME_NAME, DISK_VOLUME_NAME};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const VOLUME_NAMES: [&str; 2] = [DISK_VOLUME_NAME, BOOTSEL_VOLUME_NAME];

/// Places the badge shows up on Linux, most likely first.
///
/// The desktop automounter locations come first, followed by any other
/// mount point in `/proc/self/mounts` carrying one of the badge volume names
/// (e.g. `/run/media/$USER/BADGER` on udisks2 setups).
pub fn candidate_volumes() -> Vec<VolumeCandidate> {
    let user = current_user();
    let mut candidates = fixed_candidates(user.as_deref());
    let mounts = fs::read_to_string("/proc/self/mounts").unwrap_or_default();
    for mount_point in badge_mount_points(&mounts) {
        if candidates.iter().any(|candidate| candidate.path == mount_point) {
            continue;
        }
        debug!(mount = %mount_point.display(), "badge volume found in mount table");
        candidates.push(VolumeCandidate::new(mount_point));
    }
    candidates
}

pub fn fixed_candidates(user: Option<&str>) -> Vec<VolumeCandidate> {
    let mut candidates = Vec::new();
    if let Some(user) = user {
        for name in VOLUME_NAMES {
            candidates.push(VolumeCandidate::new(
                PathBuf::from("/media").join(user).join(name),
            ));
        }
    }
    for name in VOLUME_NAMES {
        candidates.push(VolumeCandidate::new(PathBuf::from("/mnt").join(name)));
    }
    candidates
}

/// Mount points from a `/proc/self/mounts` style table whose last component
/// is a badge volume name.
pub fn badge_mount_points(mounts: &str) -> Vec<PathBuf> {
    let mut points = Vec::new();
    for line in mounts.lines() {
        let mut parts = line.split_whitespace();
        if parts.next().is_none() {
            continue;
        }
        let mount_point = match parts.next() {
            Some(value) => PathBuf::from(unescape_mount(value)),
            None => continue,
        };
        let is_badge = mount_point
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| VOLUME_NAMES.iter().any(|expected| matches_volume_name(name, expected)))
            .unwrap_or(false);
        if is_badge && !points.contains(&mount_point) {
            points.push(mount_point);
        }
    }
    points
}

fn current_user() -> Option<String> {
    ["USER", "LOGNAME"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
}

fn unescape_mount(value: &str) -> String {
    let mut output = String::new();
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            let mut octal = String::new();
            for _ in 0..3 {
                if let Some(next) = chars.peek() {
                    if next.is_digit(8) {
                        octal.push(*next);
                        chars.next();
                    } else {
                        break;
                    }
                }
            }
            if octal.len() == 3 {
                if let Ok(byte) = u8::from_str_radix(&octal, 8) {
                    output.push(byte as char);
                    continue;
                }
            }
            output.push('\\');
            output.push_str(&octal);
        } else {
            output.push(ch);
        }
    }
    output
}
