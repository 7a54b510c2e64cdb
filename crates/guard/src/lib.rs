use badgeforge_core::{BridgeError, DeviceStatus, Result};
use std::path::Path;

pub const DISK_GUIDANCE: &str = "Badge not connected in disk mode";
pub const BOOTSEL_GUIDANCE: &str = "Badge must be in BOOTSEL mode to flash firmware. Hold HOME + press RESET, then release HOME when RP2350 drive appears.";

/// Apps the badge firmware needs to boot; never removable.
pub const PROTECTED_APPS: [&str; 3] = ["menu", "startup", "badge"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(String),
}

pub fn require_disk(status: &DeviceStatus) -> Result<&Path> {
    status
        .disk_mount()
        .ok_or_else(|| BridgeError::not_connected(DISK_GUIDANCE))
}

pub fn require_bootsel(status: &DeviceStatus) -> Result<&Path> {
    status
        .bootsel_mount()
        .ok_or_else(|| BridgeError::not_connected(BOOTSEL_GUIDANCE))
}

// FAT lookups ignore case, so "Menu" would hit the real menu directory.
pub fn is_protected(name: &str) -> bool {
    PROTECTED_APPS
        .iter()
        .any(|protected| protected.eq_ignore_ascii_case(name))
}

pub fn can_remove_app(name: &str) -> Decision {
    if is_protected(name) {
        return Decision::Deny(format!("Cannot remove system app: {}", name));
    }
    match validate_app_name(name) {
        Ok(()) => Decision::Allow,
        Err(err) => Decision::Deny(err.to_string()),
    }
}

/// App names become a single directory component on the badge.
pub fn validate_app_name(name: &str) -> Result<()> {
    let invalid = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', ':', '\0']);
    if invalid {
        return Err(BridgeError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use badgeforge_core::DeviceMode;

    #[test]
    fn disk_required() {
        let status = DeviceStatus::attached("/Volumes/BADGER", DeviceMode::Disk);
        assert_eq!(require_disk(&status).unwrap(), Path::new("/Volumes/BADGER"));

        let err = require_disk(&DeviceStatus::disconnected()).unwrap_err();
        assert_eq!(err.kind(), "not_connected");
        assert_eq!(err.to_string(), DISK_GUIDANCE);
    }

    #[test]
    fn bootsel_required() {
        let status = DeviceStatus::attached("/Volumes/BADGER", DeviceMode::Disk);
        let err = require_bootsel(&status).unwrap_err();
        assert!(err.to_string().contains("BOOTSEL"));
    }

    #[test]
    fn denies_protected_apps() {
        for name in ["menu", "startup", "badge", "Menu"] {
            assert!(matches!(can_remove_app(name), Decision::Deny(_)), "{name}");
        }
    }

    #[test]
    fn denies_path_like_names() {
        for name in ["", "..", "../secrets.py", "a/b", "a\\b"] {
            assert!(matches!(can_remove_app(name), Decision::Deny(_)), "{name:?}");
        }
    }

    #[test]
    fn allows_regular_apps() {
        assert_eq!(can_remove_app("clock"), Decision::Allow);
        assert!(validate_app_name("weather-2").is_ok());
    }
}
