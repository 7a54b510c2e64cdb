use badgeforge_core::{matches_volume_name, VolumeCandidate, BOOTSEL_VOLUME_NAME, DISK_VOLUME_NAME};
use std::path::{Path, PathBuf};

const VOLUME_NAMES: [&str; 2] = [DISK_VOLUME_NAME, BOOTSEL_VOLUME_NAME];

/// `/Volumes/BADGER`, `/Volumes/RP2350`, then any mounted volume whose name
/// is a badge name with the Finder's ` <n>` duplicate suffix.
pub fn candidate_volumes() -> Vec<VolumeCandidate> {
    let mut candidates = fixed_candidates();

    #[cfg(target_os = "macos")]
    {
        for mount_point in mounted_volumes() {
            if !is_badge_volume(&mount_point) {
                continue;
            }
            if candidates.iter().any(|candidate| candidate.path == mount_point) {
                continue;
            }
            tracing::debug!(mount = %mount_point.display(), "badge volume found via getfsstat");
            candidates.push(VolumeCandidate::new(mount_point));
        }
    }

    candidates
}

pub fn fixed_candidates() -> Vec<VolumeCandidate> {
    VOLUME_NAMES
        .iter()
        .map(|name| VolumeCandidate::new(PathBuf::from("/Volumes").join(name)))
        .collect()
}

pub fn is_badge_volume(mount_point: &Path) -> bool {
    mount_point.starts_with("/Volumes")
        && mount_point
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| VOLUME_NAMES.iter().any(|expected| matches_volume_name(name, expected)))
            .unwrap_or(false)
}

#[cfg(target_os = "macos")]
fn mounted_volumes() -> Vec<PathBuf> {
    use libc::{getfsstat, statfs, MNT_NOWAIT};
    use std::ffi::CStr;
    use std::mem::size_of;
    use std::ptr;

    let count = unsafe { getfsstat(ptr::null_mut(), 0, MNT_NOWAIT) };
    if count <= 0 {
        tracing::debug!("getfsstat reported no mounts");
        return Vec::new();
    }
    let mut buf = vec![unsafe { std::mem::zeroed::<statfs>() }; count as usize];
    let res = unsafe {
        getfsstat(
            buf.as_mut_ptr(),
            (buf.len() * size_of::<statfs>()) as i32,
            MNT_NOWAIT,
        )
    };
    if res < 0 {
        tracing::debug!("getfsstat returned error");
        return Vec::new();
    }

    buf.into_iter()
        .take(res as usize)
        .map(|entry| {
            let mount_point = unsafe { CStr::from_ptr(entry.f_mntonname.as_ptr()) }
                .to_string_lossy()
                .to_string();
            PathBuf::from(mount_point)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_candidates_disk_first() {
        let paths: Vec<PathBuf> = fixed_candidates().into_iter().map(|c| c.path).collect();
        assert_eq!(
            paths,
            vec![PathBuf::from("/Volumes/BADGER"), PathBuf::from("/Volumes/RP2350")]
        );
    }

    #[test]
    fn duplicate_suffix_is_recognised() {
        assert!(is_badge_volume(Path::new("/Volumes/BADGER 1")));
        assert!(is_badge_volume(Path::new("/Volumes/RP2350")));
        assert!(!is_badge_volume(Path::new("/Volumes/Backup")));
        assert!(!is_badge_volume(Path::new("/private/BADGER")));
    }
}
