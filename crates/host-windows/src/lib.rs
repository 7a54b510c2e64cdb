use badgeforge_core::VolumeCandidate;

#[cfg(windows)]
mod volumes;
#[cfg(not(windows))]
#[path = "volumes_stub.rs"]
mod volumes;

pub use volumes::volume_label;

/// Drive letters Windows typically hands to a freshly attached USB volume.
pub const CANDIDATE_DRIVE_LETTERS: [char; 5] = ['D', 'E', 'F', 'G', 'H'];

pub fn candidate_volumes() -> Vec<VolumeCandidate> {
    let mask = volumes::logical_drive_mask();
    candidates_for_mask(mask, volume_label)
}

fn candidates_for_mask(
    mask: Option<u32>,
    label_for: impl Fn(&str) -> Option<String>,
) -> Vec<VolumeCandidate> {
    CANDIDATE_DRIVE_LETTERS
        .iter()
        .filter(|letter| mask.map_or(true, |mask| mask & drive_bit(**letter) != 0))
        .map(|letter| {
            let root = drive_root(*letter);
            let label = label_for(&root);
            VolumeCandidate {
                path: root.into(),
                label,
            }
        })
        .collect()
}

pub fn drive_root(letter: char) -> String {
    format!("{}:\\", letter)
}

fn drive_bit(letter: char) -> u32 {
    1u32 << (letter as u32 - 'A' as u32)
}
