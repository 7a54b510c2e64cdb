use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod envelope;
mod error;
mod storage;

pub use envelope::Envelope;
pub use error::{BridgeError, Result};
pub use storage::{sync_best_effort, write_durable};

/// Volume name the badge uses when its flash is exposed as a disk.
pub const DISK_VOLUME_NAME: &str = "BADGER";
/// Volume label of the RP2350 bootloader (BOOTSEL) drive.
pub const BOOTSEL_VOLUME_NAME: &str = "RP2350";

pub const SECRETS_FILE: &str = "secrets.py";
pub const ENTRY_POINT_FILE: &str = "main.py";
pub const USER_APPS_DIR: &str = "apps";
pub const SYSTEM_DIR: &str = "system";
pub const APP_MARKER_FILE: &str = "__init__.py";
pub const APP_ICON_FILE: &str = "icon.png";
pub const BADGES_DIR: &str = "badges";
pub const BADGE_TXT_FILE: &str = "badge.txt";

pub const DEFAULT_EVENT: &str = "Universe 2025";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceMode {
    Disk,
    Bootsel,
    Disconnected,
}

impl DeviceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceMode::Disk => "disk",
            DeviceMode::Bootsel => "bootsel",
            DeviceMode::Disconnected => "disconnected",
        }
    }
}

/// Snapshot of where the badge is and what it is doing.
///
/// `connected` is true exactly when `mode` is not `Disconnected`, and
/// `mount_path` is present exactly when `connected` is. Use the constructors
/// to keep the three fields consistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    pub connected: bool,
    pub mount_path: Option<PathBuf>,
    pub mode: DeviceMode,
}

impl DeviceStatus {
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            mount_path: None,
            mode: DeviceMode::Disconnected,
        }
    }

    pub fn attached(mount_path: impl Into<PathBuf>, mode: DeviceMode) -> Self {
        if mode == DeviceMode::Disconnected {
            return Self::disconnected();
        }
        Self {
            connected: true,
            mount_path: Some(mount_path.into()),
            mode,
        }
    }

    /// Mount root when the badge is in disk mode.
    pub fn disk_mount(&self) -> Option<&Path> {
        match self.mode {
            DeviceMode::Disk => self.mount_path.as_deref(),
            _ => None,
        }
    }

    /// Mount root when the badge is in bootloader mode.
    pub fn bootsel_mount(&self) -> Option<&Path> {
        match self.mode {
            DeviceMode::Bootsel => self.mount_path.as_deref(),
            _ => None,
        }
    }
}

/// A path that may hold the badge volume, as reported by a host provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeCandidate {
    pub path: PathBuf,
    pub label: Option<String>,
}

impl VolumeCandidate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            label: None,
        }
    }

    pub fn labeled(path: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label: Some(label.into()),
        }
    }

    /// Volume label when the host reported one, otherwise the last path component.
    pub fn volume_name(&self) -> Option<String> {
        if let Some(label) = self.label.as_deref().filter(|label| !label.is_empty()) {
            return Some(label.to_string());
        }
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
    }
}

/// Contents of `secrets.py`.
///
/// The optional fields distinguish "unset" (`None`, written as the bare
/// `None` literal) from an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct DeviceConfig {
    pub wifi_ssid: String,
    pub wifi_password: String,
    pub github_username: String,
    pub github_token: String,
    pub weather_location: Option<String>,
    pub wled_ip: Option<String>,
}

/// The seven positional lines of `badges/badge.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub event: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub title: String,
    pub pronouns: String,
    pub handle: String,
}

impl Default for PersonalInfo {
    fn default() -> Self {
        Self {
            event: DEFAULT_EVENT.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            company: String::new(),
            title: String::new(),
            pronouns: String::new(),
            handle: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppEntry {
    pub name: String,
    pub has_icon: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "message", rename_all = "lowercase")]
pub enum FirmwareTransferResult {
    Success(String),
    Failure(String),
}

impl FirmwareTransferResult {
    pub fn is_success(&self) -> bool {
        matches!(self, FirmwareTransferResult::Success(_))
    }

    pub fn message(&self) -> &str {
        match self {
            FirmwareTransferResult::Success(message) | FirmwareTransferResult::Failure(message) => {
                message
            }
        }
    }
}

/// True when `name` is `expected` (ignoring case), optionally followed by the
/// ` <n>` suffix macOS appends when two volumes share a name.
pub fn matches_volume_name(name: &str, expected: &str) -> bool {
    let Some(prefix) = name.get(..expected.len()) else {
        return false;
    };
    if !prefix.eq_ignore_ascii_case(expected) {
        return false;
    }
    let rest = &name[expected.len()..];
    rest.is_empty()
        || rest
            .strip_prefix(' ')
            .is_some_and(|suffix| !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()))
}

pub fn secrets_path(mount: &Path) -> PathBuf {
    mount.join(SECRETS_FILE)
}

pub fn user_apps_dir(mount: &Path) -> PathBuf {
    mount.join(USER_APPS_DIR)
}

pub fn system_apps_dir(mount: &Path) -> PathBuf {
    mount.join(SYSTEM_DIR).join(USER_APPS_DIR)
}

pub fn badge_txt_path(mount: &Path) -> PathBuf {
    mount.join(BADGES_DIR).join(BADGE_TXT_FILE)
}
