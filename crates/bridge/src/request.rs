use badgeforge_core::{DeviceConfig, PersonalInfo};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One collaborator-facing operation, tagged by `op` on the wire:
/// `{"op":"installApp","name":"clock"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Request {
    GetStatus,
    ReadConfig,
    WriteConfig {
        config: DeviceConfig,
    },
    #[serde(rename_all = "camelCase")]
    FlashFirmware {
        file_path: PathBuf,
    },
    ListApps,
    InstallApp {
        name: String,
    },
    RemoveApp {
        name: String,
    },
    AvailableApps,
    ReadBadgeInfo,
    WriteBadgeInfo {
        info: PersonalInfo,
    },
    SimulatorStatus,
    SimulatorSetup,
    SimulatorCheckPython,
    SimulatorCheckPygame,
    SimulatorInstallPygame,
    #[serde(rename_all = "camelCase")]
    SimulatorLaunch {
        #[serde(default)]
        config: DeviceConfig,
        #[serde(default)]
        app_path: Option<PathBuf>,
    },
    SimulatorListApps,
    SimulatorOpenFolder,
    Prerequisites,
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::GetStatus => "getStatus",
            Request::ReadConfig => "readConfig",
            Request::WriteConfig { .. } => "writeConfig",
            Request::FlashFirmware { .. } => "flashFirmware",
            Request::ListApps => "listApps",
            Request::InstallApp { .. } => "installApp",
            Request::RemoveApp { .. } => "removeApp",
            Request::AvailableApps => "availableApps",
            Request::ReadBadgeInfo => "readBadgeInfo",
            Request::WriteBadgeInfo { .. } => "writeBadgeInfo",
            Request::SimulatorStatus => "simulatorStatus",
            Request::SimulatorSetup => "simulatorSetup",
            Request::SimulatorCheckPython => "simulatorCheckPython",
            Request::SimulatorCheckPygame => "simulatorCheckPygame",
            Request::SimulatorInstallPygame => "simulatorInstallPygame",
            Request::SimulatorLaunch { .. } => "simulatorLaunch",
            Request::SimulatorListApps => "simulatorListApps",
            Request::SimulatorOpenFolder => "simulatorOpenFolder",
            Request::Prerequisites => "prerequisites",
        }
    }
}
