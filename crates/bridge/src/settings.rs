use badgeforge_simulator::{default_catalog_root, DEFAULT_SCALE};
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::warn;

pub const CATALOG_DIR_ENV: &str = "BADGEFORGE_CATALOG_DIR";
pub const MOUNT_ENV: &str = "BADGEFORGE_MOUNT";
pub const SIM_SCALE_ENV: &str = "BADGEFORGE_SIM_SCALE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    /// Local checkout of the app catalog and simulator.
    pub catalog_root: PathBuf,
    /// Probed before the platform's own mount points.
    pub extra_mounts: Vec<PathBuf>,
    /// When false only `extra_mounts` are probed.
    pub scan_platform: bool,
    pub simulator_scale: u32,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            catalog_root: default_catalog_root()
                .unwrap_or_else(|| PathBuf::from(".github-badge-customizer").join("badger-home")),
            extra_mounts: Vec::new(),
            scan_platform: true,
            simulator_scale: DEFAULT_SCALE,
        }
    }
}

impl BridgeSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var_os(key))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let mut settings = Self::default();
        if let Some(dir) = lookup(CATALOG_DIR_ENV).filter(|value| !value.is_empty()) {
            settings.catalog_root = PathBuf::from(dir);
        }
        if let Some(mounts) = lookup(MOUNT_ENV) {
            settings.extra_mounts = env::split_paths(&mounts)
                .filter(|path| !path.as_os_str().is_empty())
                .collect();
        }
        if let Some(scale) = lookup(SIM_SCALE_ENV) {
            match scale.to_string_lossy().trim().parse::<u32>() {
                Ok(scale) if scale > 0 => settings.simulator_scale = scale,
                _ => warn!(value = ?scale, "ignoring invalid {}", SIM_SCALE_ENV),
            }
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let vars: HashMap<String, OsString> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), OsString::from(value)))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let settings = BridgeSettings::from_lookup(lookup(&[]));
        assert!(settings.catalog_root.ends_with("badger-home"));
        assert!(settings.extra_mounts.is_empty());
        assert!(settings.scan_platform);
        assert_eq!(settings.simulator_scale, 4);
    }

    #[test]
    fn environment_overrides() {
        let mounts = env::join_paths(["/tmp/a", "/tmp/b"]).unwrap();
        let settings = BridgeSettings::from_lookup(lookup(&[
            (CATALOG_DIR_ENV, "/srv/catalog"),
            (MOUNT_ENV, mounts.to_str().unwrap()),
            (SIM_SCALE_ENV, "2"),
        ]));
        assert_eq!(settings.catalog_root, PathBuf::from("/srv/catalog"));
        assert_eq!(
            settings.extra_mounts,
            vec![PathBuf::from("/tmp/a"), PathBuf::from("/tmp/b")]
        );
        assert_eq!(settings.simulator_scale, 2);
    }

    #[test]
    fn bad_scale_keeps_default() {
        let settings = BridgeSettings::from_lookup(lookup(&[(SIM_SCALE_ENV, "huge")]));
        assert_eq!(settings.simulator_scale, 4);
        let settings = BridgeSettings::from_lookup(lookup(&[(SIM_SCALE_ENV, "0")]));
        assert_eq!(settings.simulator_scale, 4);
    }
}
