use anyhow::Result;
use badgeforge_bridge::{Bridge, Request};
use badgeforge_core::{DeviceMode, DeviceStatus};
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub interval: Duration,
    pub polls: Option<u64>,
    pub with_config: bool,
}

/// What changed since the previous poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub status: DeviceStatus,
    /// A disk-mode badge at a mount path whose config has not been loaded yet.
    pub reload_config: bool,
}

/// Remembers the last status seen and the mount whose config was loaded, so
/// a badge that stays put is reported once.
#[derive(Debug, Default)]
pub struct Tracker {
    last: Option<DeviceStatus>,
    loaded_mount: Option<PathBuf>,
}

impl Tracker {
    pub fn observe(&mut self, status: DeviceStatus) -> Option<Transition> {
        if self.last.as_ref() == Some(&status) {
            return None;
        }
        let reload_config = match (&status.mode, &status.mount_path) {
            (DeviceMode::Disk, Some(mount)) => self.loaded_mount.as_ref() != Some(mount),
            _ => false,
        };
        if reload_config {
            self.loaded_mount = status.mount_path.clone();
        }
        if !status.connected {
            self.loaded_mount = None;
        }
        self.last = Some(status.clone());
        Some(Transition {
            status,
            reload_config,
        })
    }
}

pub fn watch(bridge: &Bridge, options: &WatchOptions, mut output: impl Write) -> Result<()> {
    let mut tracker = Tracker::default();
    let mut polls = 0u64;
    loop {
        if let Some(transition) = tracker.observe(bridge.status()) {
            let mut line = json!({ "status": transition.status });
            if options.with_config && transition.reload_config {
                line["config"] = bridge.handle(Request::ReadConfig).to_value();
            }
            serde_json::to_writer(&mut output, &line)?;
            output.write_all(b"\n")?;
            output.flush()?;
        }
        polls += 1;
        if options.polls.is_some_and(|limit| polls >= limit) {
            return Ok(());
        }
        thread::sleep(options.interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use badgeforge_bridge::BridgeSettings;
    use serde_json::Value;
    use std::fs;

    #[test]
    fn reports_only_changes() {
        let mut tracker = Tracker::default();
        let disk = DeviceStatus::attached("/media/me/BADGER", DeviceMode::Disk);

        let first = tracker.observe(DeviceStatus::disconnected()).unwrap();
        assert!(!first.reload_config);
        assert!(tracker.observe(DeviceStatus::disconnected()).is_none());

        let attached = tracker.observe(disk.clone()).unwrap();
        assert!(attached.reload_config);
        assert!(tracker.observe(disk).is_none());
    }

    #[test]
    fn reboot_cycle_reloads_config_once_per_attach() {
        let mut tracker = Tracker::default();
        let disk = DeviceStatus::attached("/Volumes/BADGER", DeviceMode::Disk);
        let bootsel = DeviceStatus::attached("/Volumes/RP2350", DeviceMode::Bootsel);

        assert!(tracker.observe(disk.clone()).unwrap().reload_config);
        assert!(!tracker.observe(bootsel).unwrap().reload_config);
        // Same mount again without a disconnect in between.
        assert!(!tracker.observe(disk.clone()).unwrap().reload_config);
        tracker.observe(DeviceStatus::disconnected()).unwrap();
        assert!(tracker.observe(disk).unwrap().reload_config);
    }

    #[test]
    fn watch_prints_initial_state() {
        let dir = tempfile::tempdir().unwrap();
        let badge = dir.path().join("BADGER");
        fs::create_dir_all(badge.join("apps")).unwrap();
        let bridge = Bridge::new(BridgeSettings {
            catalog_root: dir.path().join("badger-home"),
            extra_mounts: vec![badge],
            scan_platform: false,
            simulator_scale: 4,
        });
        let options = WatchOptions {
            interval: Duration::from_millis(1),
            polls: Some(2),
            with_config: true,
        };

        let mut output = Vec::new();
        watch(&bridge, &options, &mut output).unwrap();
        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["status"]["mode"], "disk");
        assert_eq!(lines[0]["config"]["success"], true);
    }
}
