use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// An external program plus any arguments that always precede the call's own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Tool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }

    pub fn display(&self) -> String {
        self.program.display().to_string()
    }
}

/// The interpreter, package installer and version-control client used by
/// the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub python: Tool,
    pub pip: Tool,
    /// Options that `pip install` needs after the package name.
    pub pip_install_args: Vec<OsString>,
    pub git: Tool,
}

impl Toolchain {
    /// Preferred install locations first, then whatever is on `PATH`.
    pub fn detect() -> Self {
        let python = match preferred(homebrew_python()) {
            Some(path) => Tool::new(path),
            None => Tool::new(on_path(generic_python())),
        };
        // Homebrew's Python is externally managed; pip refuses to install
        // into it without this `install` option.
        let (pip, pip_install_args) = match preferred(homebrew_pip()) {
            Some(path) => (Tool::new(path), vec![OsString::from("--break-system-packages")]),
            None => (Tool::new(on_path(generic_pip())), Vec::new()),
        };
        Self {
            python,
            pip,
            pip_install_args,
            git: Tool::new(on_path("git")),
        }
    }

    /// `pip install <package>` followed by the install options.
    pub fn pip_install(&self, package: &str) -> Command {
        let mut command = self.pip.command();
        command.arg("install").arg(package).args(&self.pip_install_args);
        command
    }
}

fn preferred(path: Option<&'static str>) -> Option<PathBuf> {
    path.map(PathBuf::from).filter(|path| Path::new(path).exists())
}

fn on_path(name: &str) -> PathBuf {
    which::which(name).unwrap_or_else(|_| PathBuf::from(name))
}

fn homebrew_python() -> Option<&'static str> {
    cfg!(target_os = "macos").then_some("/opt/homebrew/bin/python3.12")
}

fn homebrew_pip() -> Option<&'static str> {
    cfg!(target_os = "macos").then_some("/opt/homebrew/bin/pip3.12")
}

fn generic_python() -> &'static str {
    if cfg!(windows) {
        "python"
    } else {
        "python3"
    }
}

fn generic_pip() -> &'static str {
    if cfg!(windows) {
        "pip"
    } else {
        "pip3"
    }
}
