pub fn logical_drive_mask() -> Option<u32> {
    None
}

pub fn volume_label(_root: &str) -> Option<String> {
    None
}
