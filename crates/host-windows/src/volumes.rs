use windows::core::PCWSTR;
use windows::Win32::Storage::FileSystem::{GetLogicalDrives, GetVolumeInformationW};

fn wide(s: &str) -> Vec<u16> {
    use std::os::windows::prelude::*;
    std::ffi::OsStr::new(s)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

pub fn logical_drive_mask() -> Option<u32> {
    let mask = unsafe { GetLogicalDrives() };
    if mask == 0 {
        tracing::debug!("GetLogicalDrives failed");
        None
    } else {
        Some(mask)
    }
}

/// Volume label for a drive root such as `E:\`, if the volume reports one.
pub fn volume_label(root: &str) -> Option<String> {
    let wroot = wide(root);
    let mut name_buf = [0u16; 256];

    let result = unsafe {
        GetVolumeInformationW(
            PCWSTR(wroot.as_ptr()),
            Some(&mut name_buf),
            None,
            None,
            None,
            None,
        )
    };
    if result.is_err() {
        tracing::debug!(root, "GetVolumeInformationW failed");
        return None;
    }

    let label = String::from_utf16_lossy(&name_buf)
        .trim_end_matches('\0')
        .trim()
        .to_string();
    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}
