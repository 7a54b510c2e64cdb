use badgeforge_bridge::{Bridge, BridgeSettings, Request};
use badgeforge_core::{DeviceConfig, PersonalInfo};
use badgeforge_simulator::{Tool, Toolchain};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const MISSING_TOOL: &str = "badgeforge-test-no-such-program";

struct Fixture {
    dir: TempDir,
    badge: PathBuf,
    catalog: PathBuf,
}

impl Fixture {
    /// A disk-mode badge volume plus an empty catalog location.
    fn disk() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let badge = dir.path().join("BADGER");
        fs::create_dir_all(badge.join("apps")).unwrap();
        fs::write(badge.join("main.py"), "import menu\n").unwrap();
        let catalog = dir.path().join("badger-home");
        Self {
            dir,
            badge,
            catalog,
        }
    }

    fn bootsel() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let badge = dir.path().join("RP2350");
        fs::create_dir_all(&badge).unwrap();
        let catalog = dir.path().join("badger-home");
        Self {
            dir,
            badge,
            catalog,
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn bridge(&self) -> Bridge {
        Bridge::with_toolchain(
            BridgeSettings {
                catalog_root: self.catalog.clone(),
                extra_mounts: vec![self.badge.clone()],
                scan_platform: false,
                simulator_scale: 4,
            },
            missing_toolchain(),
        )
    }

    fn catalog_app(&self, name: &str) {
        let app = self.catalog.join("badge").join("apps").join(name);
        fs::create_dir_all(&app).unwrap();
        fs::write(app.join("__init__.py"), "").unwrap();
        fs::write(app.join("icon.png"), [0x89, b'P', b'N', b'G']).unwrap();
    }
}

fn missing_toolchain() -> Toolchain {
    Toolchain {
        python: Tool::new(MISSING_TOOL),
        pip: Tool::new(MISSING_TOOL),
        pip_install_args: Vec::new(),
        git: Tool::new(MISSING_TOOL),
    }
}

fn detached_bridge(root: &Path) -> Bridge {
    Bridge::with_toolchain(
        BridgeSettings {
            catalog_root: root.join("badger-home"),
            extra_mounts: vec![root.join("nothing-here")],
            scan_platform: false,
            simulator_scale: 4,
        },
        missing_toolchain(),
    )
}

#[test]
fn status_reports_disk_mode() {
    let fixture = Fixture::disk();
    let value = fixture.bridge().handle(Request::GetStatus).to_value();
    assert_eq!(value["success"], true);
    assert_eq!(value["connected"], true);
    assert_eq!(value["mode"], "disk");
    assert_eq!(value["mountPath"], json!(fixture.badge));
}

#[test]
fn status_reports_disconnected() {
    let dir = tempfile::tempdir().unwrap();
    let value = detached_bridge(dir.path()).handle(Request::GetStatus).to_value();
    assert_eq!(value["connected"], false);
    assert_eq!(value["mode"], "disconnected");
    assert!(value["mountPath"].is_null());
}

#[test]
fn config_round_trip_through_requests() {
    let fixture = Fixture::disk();
    let bridge = fixture.bridge();

    let first = bridge.handle(Request::ReadConfig).to_value();
    assert_eq!(first["success"], true);
    assert_eq!(first["config"]["WIFI_SSID"], "");
    assert!(first["config"]["WEATHER_LOCATION"].is_null());

    let config = DeviceConfig {
        wifi_ssid: "Home WiFi".to_string(),
        github_username: "octocat".to_string(),
        ..DeviceConfig::default()
    };
    let written = bridge.handle(Request::WriteConfig {
        config: config.clone(),
    });
    assert!(written.success);

    let text = fs::read_to_string(fixture.badge.join("secrets.py")).unwrap();
    assert!(text.lines().any(|line| line == "WEATHER_LOCATION = None"));

    let read = bridge.handle(Request::ReadConfig).to_value();
    assert_eq!(read["config"]["WIFI_SSID"], "Home WiFi");
    assert_eq!(read["config"]["GITHUB_USERNAME"], "octocat");
    assert!(read["config"]["WEATHER_LOCATION"].is_null());
}

#[test]
fn disk_requests_fail_without_badge() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = detached_bridge(dir.path());
    for request in [
        Request::ReadConfig,
        Request::ListApps,
        Request::ReadBadgeInfo,
        Request::RemoveApp {
            name: "clock".to_string(),
        },
    ] {
        let value = bridge.handle(request).to_value();
        assert_eq!(value["success"], false);
        assert_eq!(value["errorKind"], "not_connected");
        assert_eq!(value["error"], "Badge not connected in disk mode");
    }
}

#[test]
fn flashing_requires_bootsel() {
    let fixture = Fixture::disk();
    let image = fixture.root().join("badge.uf2");
    fs::write(&image, [0u8; 512]).unwrap();
    let value = fixture
        .bridge()
        .handle(Request::FlashFirmware { file_path: image })
        .to_value();
    assert_eq!(value["success"], false);
    assert_eq!(value["errorKind"], "not_connected");
    assert!(value["error"].as_str().unwrap().contains("BOOTSEL"));
    assert!(!fixture.badge.join("badge.uf2").exists());
}

#[test]
fn flashing_copies_image_in_bootsel() {
    let fixture = Fixture::bootsel();
    let image = fixture.root().join("badge.uf2");
    fs::write(&image, vec![7u8; 1024]).unwrap();
    let envelope = fixture.bridge().handle(Request::FlashFirmware {
        file_path: image.clone(),
    });
    assert!(envelope.success);
    assert_eq!(
        fs::read(fixture.badge.join("badge.uf2")).unwrap(),
        fs::read(&image).unwrap()
    );
}

#[test]
fn flashing_missing_file_is_a_failure() {
    let fixture = Fixture::bootsel();
    let value = fixture
        .bridge()
        .handle(Request::FlashFirmware {
            file_path: fixture.root().join("missing.uf2"),
        })
        .to_value();
    assert_eq!(value["success"], false);
    assert_eq!(value["errorKind"], "io");
}

#[test]
fn app_lifecycle() {
    let fixture = Fixture::disk();
    fixture.catalog_app("clock");
    let bridge = fixture.bridge();

    let available = bridge.handle(Request::AvailableApps).to_value();
    assert_eq!(available["apps"], json!([{"name": "clock", "hasIcon": true}]));

    let installed = bridge
        .handle(Request::InstallApp {
            name: "clock".to_string(),
        })
        .to_value();
    assert_eq!(installed["success"], true);
    assert_eq!(installed["message"], "Installed clock");
    assert_eq!(installed["files"], 2);

    let listed = bridge.handle(Request::ListApps).to_value();
    assert_eq!(listed["apps"], json!([{"name": "clock", "hasIcon": true}]));

    let again = bridge
        .handle(Request::InstallApp {
            name: "clock".to_string(),
        })
        .to_value();
    assert_eq!(again["errorKind"], "already_exists");

    let removed = bridge
        .handle(Request::RemoveApp {
            name: "clock".to_string(),
        })
        .to_value();
    assert_eq!(removed["message"], "Removed clock");
    assert!(!fixture.badge.join("apps").join("clock").exists());
}

#[test]
fn protected_apps_survive_removal() {
    let fixture = Fixture::disk();
    let menu = fixture.badge.join("apps").join("menu");
    fs::create_dir_all(&menu).unwrap();
    fs::write(menu.join("__init__.py"), "").unwrap();

    let value = fixture
        .bridge()
        .handle(Request::RemoveApp {
            name: "menu".to_string(),
        })
        .to_value();
    assert_eq!(value["errorKind"], "protected");
    assert_eq!(value["error"], "Cannot remove system app: menu");
    assert!(menu.exists());
}

#[test]
fn install_without_catalog_asks_for_setup() {
    let fixture = Fixture::disk();
    let value = fixture
        .bridge()
        .handle(Request::InstallApp {
            name: "clock".to_string(),
        })
        .to_value();
    assert_eq!(value["errorKind"], "prerequisite_missing");
}

#[test]
fn badge_info_round_trip() {
    let fixture = Fixture::disk();
    let bridge = fixture.bridge();

    let defaults = bridge.handle(Request::ReadBadgeInfo).to_value();
    assert_eq!(defaults["info"]["event"], "Universe 2025");

    let info = PersonalInfo {
        first_name: "Mona".to_string(),
        last_name: "Lisa".to_string(),
        handle: "@mona".to_string(),
        ..PersonalInfo::default()
    };
    assert!(bridge
        .handle(Request::WriteBadgeInfo { info: info.clone() })
        .success);
    assert!(fixture.badge.join("badges").join("badge.txt").exists());

    let read = bridge.handle(Request::ReadBadgeInfo).to_value();
    assert_eq!(read["info"], serde_json::to_value(&info).unwrap());
}

#[test]
fn simulator_queries_tolerate_missing_tools() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = detached_bridge(dir.path());

    let python = bridge.handle(Request::SimulatorCheckPython).to_value();
    assert_eq!(python["success"], true);
    assert_eq!(python["installed"], false);
    assert!(python["version"].is_null());

    let pygame = bridge.handle(Request::SimulatorCheckPygame).to_value();
    assert_eq!(pygame["installed"], false);

    let prerequisites = bridge.handle(Request::Prerequisites).to_value();
    assert_eq!(prerequisites["interpreterCompatible"], false);
    assert_eq!(prerequisites["graphicsLibInstalled"], false);
    assert_eq!(prerequisites["catalogInstalled"], false);

    let status = bridge.handle(Request::SimulatorStatus).to_value();
    assert_eq!(status["installed"], false);
    assert_eq!(status["path"], json!(dir.path().join("badger-home")));
}

#[test]
fn simulator_actions_report_missing_setup() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = detached_bridge(dir.path());

    let launch = bridge
        .handle(Request::SimulatorLaunch {
            config: DeviceConfig::default(),
            app_path: None,
        })
        .to_value();
    assert_eq!(launch["success"], false);
    assert_eq!(launch["errorKind"], "prerequisite_missing");

    let apps = bridge.handle(Request::SimulatorListApps).to_value();
    assert_eq!(apps["errorKind"], "prerequisite_missing");

    let setup = bridge.handle(Request::SimulatorSetup).to_value();
    assert_eq!(setup["errorKind"], "command");
}

#[test]
fn simulator_lists_catalog_apps_with_paths() {
    let fixture = Fixture::disk();
    fixture.catalog_app("weather");
    let value = fixture.bridge().handle(Request::SimulatorListApps).to_value();
    let expected = fixture
        .catalog
        .join("badge")
        .join("apps")
        .join("weather");
    assert_eq!(value["apps"][0]["name"], "weather");
    assert_eq!(value["apps"][0]["path"], json!(expected));
    assert_eq!(value["apps"][0]["hasIcon"], true);
}
