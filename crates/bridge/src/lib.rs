//! Collaborator-facing facade over the badge crates.
//!
//! Every request re-locates the badge, checks the mode it needs and answers
//! with an [`Envelope`]. Nothing is remembered between calls.

use badgeforge_core::{DeviceStatus, Envelope, FirmwareTransferResult, Result};
use badgeforge_guard::{require_bootsel, require_disk};
use badgeforge_simulator::{Simulator, Toolchain};
use std::path::Path;
use tracing::{debug, info, warn};

mod request;
mod settings;

pub use request::Request;
pub use settings::{BridgeSettings, CATALOG_DIR_ENV, MOUNT_ENV, SIM_SCALE_ENV};

pub const LAUNCHED_MESSAGE: &str = "Simulator launched! A new window should appear.";

#[derive(Debug, Clone)]
pub struct Bridge {
    settings: BridgeSettings,
    simulator: Simulator,
}

impl Bridge {
    pub fn new(settings: BridgeSettings) -> Self {
        Self::with_toolchain(settings, Toolchain::detect())
    }

    pub fn with_toolchain(settings: BridgeSettings, toolchain: Toolchain) -> Self {
        let simulator = Simulator::new(settings.catalog_root.clone(), toolchain)
            .with_scale(settings.simulator_scale);
        Self {
            settings,
            simulator,
        }
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    /// Probe for the badge now.
    pub fn status(&self) -> DeviceStatus {
        badgeforge_locator::locate_with(&self.settings.extra_mounts, self.settings.scan_platform)
    }

    /// Run one request. Failures come back as `success: false` envelopes.
    pub fn handle(&self, request: Request) -> Envelope {
        let op = request.name();
        debug!(op, "handling request");
        match self.dispatch(request) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(op, kind = err.kind(), error = %err, "request failed");
                Envelope::failure(&err)
            }
        }
    }

    fn dispatch(&self, request: Request) -> Result<Envelope> {
        match request {
            Request::GetStatus => Ok(Envelope::ok().merge(self.status())),
            Request::ReadConfig => {
                let status = self.status();
                let mount = require_disk(&status)?;
                let config = badgeforge_secrets::read_config(mount)?;
                Ok(Envelope::ok().with("config", config))
            }
            Request::WriteConfig { config } => {
                let status = self.status();
                let mount = require_disk(&status)?;
                badgeforge_secrets::write_config(mount, &config)?;
                info!(mount = %mount.display(), "configuration saved");
                Ok(Envelope::ok())
            }
            Request::FlashFirmware { file_path } => self.flash_firmware(&file_path),
            Request::ListApps => {
                let status = self.status();
                let mount = require_disk(&status)?;
                Ok(Envelope::ok().with("apps", badgeforge_catalog::list_apps(mount)))
            }
            Request::InstallApp { name } => {
                let status = self.status();
                let mount = require_disk(&status)?;
                let stats =
                    badgeforge_catalog::install_app(&name, &self.settings.catalog_root, mount)?;
                Ok(Envelope::ok()
                    .message(format!("Installed {name}"))
                    .with("files", stats.files)
                    .with("bytes", stats.bytes))
            }
            Request::RemoveApp { name } => {
                let status = self.status();
                let mount = require_disk(&status)?;
                badgeforge_catalog::remove_app(&name, mount)?;
                Ok(Envelope::ok().message(format!("Removed {name}")))
            }
            Request::AvailableApps => {
                let apps = badgeforge_catalog::list_available(&self.settings.catalog_root)?;
                Ok(Envelope::ok().with("apps", apps))
            }
            Request::ReadBadgeInfo => {
                let status = self.status();
                let mount = require_disk(&status)?;
                let info = badgeforge_badge_info::read_badge_info(mount)?;
                Ok(Envelope::ok().with("info", info))
            }
            Request::WriteBadgeInfo { info } => {
                let status = self.status();
                let mount = require_disk(&status)?;
                badgeforge_badge_info::write_badge_info(mount, &info)?;
                info!(mount = %mount.display(), "badge info saved");
                Ok(Envelope::ok())
            }
            Request::SimulatorStatus => Ok(Envelope::ok().merge(self.simulator.catalog_status())),
            Request::SimulatorSetup => {
                let message = self.simulator.install_catalog()?;
                Ok(Envelope::ok().message(message))
            }
            Request::SimulatorCheckPython => {
                Ok(Envelope::ok().merge(self.simulator.check_interpreter()))
            }
            Request::SimulatorCheckPygame => {
                Ok(Envelope::ok().with("installed", self.simulator.check_graphics_lib()))
            }
            Request::SimulatorInstallPygame => {
                self.simulator.install_graphics_lib()?;
                Ok(Envelope::ok())
            }
            Request::SimulatorLaunch { config, app_path } => {
                let launched = self.simulator.launch(&config, app_path.as_deref())?;
                Ok(Envelope::ok()
                    .message(LAUNCHED_MESSAGE)
                    .with("pid", launched.pid)
                    .with("appPath", launched.app_path))
            }
            Request::SimulatorListApps => Ok(Envelope::ok().with("apps", self.simulator.list_apps()?)),
            Request::SimulatorOpenFolder => {
                self.simulator.reveal_catalog()?;
                Ok(Envelope::ok())
            }
            Request::Prerequisites => Ok(Envelope::ok().merge(self.simulator.check_prerequisites())),
        }
    }

    fn flash_firmware(&self, file_path: &Path) -> Result<Envelope> {
        let status = self.status();
        require_bootsel(&status)?;
        match badgeforge_firmware::transfer(file_path, &status) {
            FirmwareTransferResult::Success(message) => Ok(Envelope::ok().message(message)),
            FirmwareTransferResult::Failure(message) => {
                warn!(source = %file_path.display(), error = %message, "firmware transfer failed");
                Ok(Envelope::failure_with("io", message))
            }
        }
    }
}
