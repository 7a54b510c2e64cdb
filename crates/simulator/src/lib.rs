//! Runs the badge simulator from the local catalog checkout.
//!
//! The simulator is a Python/pygame program shipped in the catalog
//! repository. This crate only probes for it, installs it through external
//! tools, writes its `secrets.py`, and starts it detached.

use badgeforge_catalog::{list_catalog_apps, CatalogApp};
use badgeforge_core::{BridgeError, DeviceConfig, Result};
use directories::BaseDirs;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::sync::OnceLock;
use tracing::{debug, info};

mod toolchain;

pub use toolchain::{Tool, Toolchain};

pub const CATALOG_REPO_URL: &str = "https://github.com/badger/home.git";
pub const DEFAULT_SCALE: u32 = 4;
pub const GRAPHICS_LIB: &str = "pygame";
pub const NOT_INSTALLED: &str = "Simulator not installed. Please install first.";
pub const INTERPRETER_INCOMPATIBLE: &str =
    "Python 3.10 or newer is required to run the simulator.";

/// `~/.github-badge-customizer/badger-home`, when a home directory exists.
pub fn default_catalog_root() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(".github-badge-customizer")
            .join("badger-home")
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStatus {
    pub installed: bool,
    pub path: PathBuf,
    pub simulator_script: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpreterStatus {
    pub installed: bool,
    pub version: Option<String>,
    pub compatible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prerequisites {
    pub interpreter_compatible: bool,
    pub graphics_lib_installed: bool,
    pub catalog_installed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchedProcess {
    pub pid: u32,
    pub app_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Simulator {
    catalog_root: PathBuf,
    toolchain: Toolchain,
    scale: u32,
}

impl Simulator {
    pub fn new(catalog_root: impl Into<PathBuf>, toolchain: Toolchain) -> Self {
        Self {
            catalog_root: catalog_root.into(),
            toolchain,
            scale: DEFAULT_SCALE,
        }
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale.max(1);
        self
    }

    pub fn catalog_root(&self) -> &Path {
        &self.catalog_root
    }

    pub fn simulator_script(&self) -> PathBuf {
        self.catalog_root.join("simulator").join("badge_simulator.py")
    }

    pub fn badge_dir(&self) -> PathBuf {
        self.catalog_root.join("badge")
    }

    pub fn default_app(&self) -> PathBuf {
        self.badge_dir().join("apps").join("menu")
    }

    pub fn catalog_status(&self) -> CatalogStatus {
        let simulator_script = self.simulator_script();
        CatalogStatus {
            installed: simulator_script.exists(),
            path: self.catalog_root.clone(),
            simulator_script,
        }
    }

    /// Ask the interpreter for its version. A missing or failing interpreter
    /// is reported as not installed.
    pub fn check_interpreter(&self) -> InterpreterStatus {
        let output = match probe(&self.toolchain.python, &["--version"]) {
            Some(output) => output,
            None => {
                return InterpreterStatus {
                    installed: false,
                    version: None,
                    compatible: false,
                }
            }
        };
        // Python 2 prints its version on stderr.
        let text = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        match parse_python_version(&text) {
            Some((major, minor, patch)) => InterpreterStatus {
                installed: true,
                version: Some(format!("{major}.{minor}.{patch}")),
                compatible: (major, minor) >= (3, 10),
            },
            None => InterpreterStatus {
                installed: true,
                version: Some(text.trim().to_string()),
                compatible: false,
            },
        }
    }

    pub fn check_graphics_lib(&self) -> bool {
        let import = format!("import {GRAPHICS_LIB}");
        probe(&self.toolchain.python, &["-c", &import]).is_some()
    }

    pub fn check_prerequisites(&self) -> Prerequisites {
        Prerequisites {
            interpreter_compatible: self.check_interpreter().compatible,
            graphics_lib_installed: self.check_graphics_lib(),
            catalog_installed: self.catalog_status().installed,
        }
    }

    /// Clone the catalog, or pull when a checkout is already there.
    pub fn install_catalog(&self) -> Result<String> {
        if self.catalog_root.exists() {
            run_tool(&self.toolchain.git, &["pull"], Some(&self.catalog_root))?;
            info!(path = %self.catalog_root.display(), "catalog updated");
            return Ok("Simulator updated!".to_string());
        }
        if let Some(parent) = self.catalog_root.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| BridgeError::io("Failed to create catalog directory", err))?;
        }
        let target = self.catalog_root.to_string_lossy().to_string();
        run_tool(
            &self.toolchain.git,
            &["clone", CATALOG_REPO_URL, &target],
            self.catalog_root.parent(),
        )?;
        info!(path = %self.catalog_root.display(), "catalog cloned");
        Ok("Simulator installed!".to_string())
    }

    pub fn install_graphics_lib(&self) -> Result<()> {
        run_command(&self.toolchain.pip, self.toolchain.pip_install(GRAPHICS_LIB))?;
        info!("{} installed", GRAPHICS_LIB);
        Ok(())
    }

    pub fn list_apps(&self) -> Result<Vec<CatalogApp>> {
        list_catalog_apps(&self.catalog_root)
    }

    /// Write `config` where the simulator reads it, then start the simulator
    /// on `app` (the catalog's menu app by default). Returns as soon as the
    /// process exists; it keeps running after this process exits.
    pub fn launch(&self, config: &DeviceConfig, app: Option<&Path>) -> Result<LaunchedProcess> {
        let script = self.simulator_script();
        if !script.exists() {
            return Err(BridgeError::PrerequisiteMissing(NOT_INSTALLED.to_string()));
        }
        let interpreter = self.check_interpreter();
        if !interpreter.compatible {
            return Err(BridgeError::PrerequisiteMissing(INTERPRETER_INCOMPATIBLE.to_string()));
        }

        badgeforge_secrets::write_config_file(
            &self.badge_dir().join(badgeforge_core::SECRETS_FILE),
            config,
        )?;

        let app_path = app.map(Path::to_path_buf).unwrap_or_else(|| self.default_app());
        let mut command = self.toolchain.python.command();
        command
            .arg(&script)
            .arg("--scale")
            .arg(self.scale.to_string())
            .arg(&app_path)
            .current_dir(&self.catalog_root)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        detach(&mut command);

        let child = command.spawn().map_err(|err| BridgeError::Command {
            program: self.toolchain.python.display(),
            detail: format!("Failed to launch simulator: {err}"),
        })?;
        let pid = child.id();
        reap(child);
        info!(pid, app = %app_path.display(), "simulator launched");
        Ok(LaunchedProcess { pid, app_path })
    }

    /// Open the catalog checkout in the platform file manager.
    pub fn reveal_catalog(&self) -> Result<()> {
        if !self.catalog_root.exists() {
            return Err(BridgeError::PrerequisiteMissing(NOT_INSTALLED.to_string()));
        }
        let mut command = Command::new(file_manager());
        command
            .arg(&self.catalog_root)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        detach(&mut command);
        let child = command.spawn().map_err(|err| BridgeError::Command {
            program: file_manager().to_string(),
            detail: err.to_string(),
        })?;
        reap(child);
        Ok(())
    }
}

/// `Python X.Y.Z` anywhere in `text`.
pub fn parse_python_version(text: &str) -> Option<(u32, u32, u32)> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| Regex::new(r"Python (\d+)\.(\d+)\.(\d+)").expect("version pattern is valid"));
    let captures = pattern.captures(text)?;
    Some((
        captures[1].parse().ok()?,
        captures[2].parse().ok()?,
        captures[3].parse().ok()?,
    ))
}

/// Run a read-only query; any failure, including a missing program, is `None`.
fn probe(tool: &Tool, args: &[&str]) -> Option<Output> {
    match tool.command().args(args).stdin(Stdio::null()).output() {
        Ok(output) if output.status.success() => Some(output),
        Ok(output) => {
            debug!(tool = %tool.display(), status = %output.status, "probe failed");
            None
        }
        Err(err) => {
            debug!(tool = %tool.display(), error = %err, "probe could not start");
            None
        }
    }
}

fn run_tool(tool: &Tool, args: &[&str], cwd: Option<&Path>) -> Result<()> {
    let mut command = tool.command();
    command.args(args);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }
    run_command(tool, command)
}

fn run_command(tool: &Tool, mut command: Command) -> Result<()> {
    let output = command
        .stdin(Stdio::null())
        .output()
        .map_err(|err| BridgeError::Command {
            program: tool.display(),
            detail: err.to_string(),
        })?;
    if output.status.success() {
        Ok(())
    } else {
        Err(BridgeError::Command {
            program: tool.display(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Collect the child's exit status on a background thread so a finished
/// process does not linger as a zombie. The caller never waits.
fn reap(child: Child) {
    #[cfg(unix)]
    {
        let mut child = child;
        let pid = child.id();
        let spawned = std::thread::Builder::new()
            .name("badgeforge-reaper".to_string())
            .spawn(move || match child.wait() {
                Ok(status) => debug!(pid, %status, "child exited"),
                Err(err) => debug!(pid, error = %err, "waiting on child failed"),
            });
        if let Err(err) = spawned {
            tracing::warn!(pid, error = %err, "cannot start reaper thread");
        }
    }
    #[cfg(not(unix))]
    drop(child);
}

fn detach(command: &mut Command) {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
    }
}

fn file_manager() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(windows) {
        "explorer"
    } else {
        "xdg-open"
    }
}
