use anyhow::{Context, Result};
use badgeforge_bridge::{Bridge, BridgeSettings, Request, CATALOG_DIR_ENV, SIM_SCALE_ENV};
use badgeforge_core::{DeviceConfig, Envelope, PersonalInfo};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod serve;
mod watch;

#[derive(Debug, Parser)]
#[command(name = "badgeforge", version, about = "Configure a badge through its USB volume")]
struct Cli {
    /// Catalog checkout used for app installs and the simulator.
    #[arg(long, global = true, env = CATALOG_DIR_ENV)]
    catalog_dir: Option<PathBuf>,

    /// Extra mount point to probe before the platform defaults (repeatable).
    #[arg(long = "mount", global = true)]
    mounts: Vec<PathBuf>,

    /// Probe only the --mount paths.
    #[arg(long, global = true)]
    mount_only: bool,

    #[arg(long, global = true, env = SIM_SCALE_ENV)]
    sim_scale: Option<u32>,

    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Where the badge is mounted and which mode it is in.
    Status,
    ReadConfig,
    /// Update secrets.py; omitted fields keep their current value.
    WriteConfig(ConfigArgs),
    /// Copy a UF2 image onto the badge in BOOTSEL mode.
    Flash { file: PathBuf },
    /// Apps installed on the badge.
    Apps,
    /// Apps in the catalog checkout.
    Available,
    Install { name: String },
    Remove { name: String },
    BadgeInfo,
    /// Update badges/badge.txt; omitted fields keep their current value.
    SetBadgeInfo(BadgeInfoArgs),
    #[command(subcommand)]
    Sim(SimCommand),
    /// Simulator prerequisites at a glance.
    Prerequisites,
    /// Answer JSON requests read line by line from stdin.
    Serve,
    /// Print a line whenever the badge appears, disappears or changes mode.
    Watch {
        /// Seconds between polls.
        #[arg(long, default_value_t = 2)]
        interval: u64,
        /// Stop after this many polls.
        #[arg(long)]
        polls: Option<u64>,
        /// Also print the config each time a new disk-mode badge shows up.
        #[arg(long)]
        with_config: bool,
    },
}

#[derive(Debug, Subcommand)]
enum SimCommand {
    Status,
    /// Clone or update the catalog checkout.
    Setup,
    CheckPython,
    CheckPygame,
    InstallPygame,
    /// Start the simulator with the badge's config, or an empty one.
    Launch {
        #[arg(long)]
        app: Option<PathBuf>,
    },
    Apps,
    Open,
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[arg(long)]
    ssid: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[arg(long)]
    github_user: Option<String>,
    #[arg(long)]
    github_token: Option<String>,
    #[arg(long)]
    weather: Option<String>,
    /// Write WEATHER_LOCATION as None.
    #[arg(long, conflicts_with = "weather")]
    clear_weather: bool,
    #[arg(long)]
    wled_ip: Option<String>,
    /// Write WLED_IP as None.
    #[arg(long, conflicts_with = "wled_ip")]
    clear_wled_ip: bool,
}

impl ConfigArgs {
    fn apply(self, config: &mut DeviceConfig) {
        if let Some(value) = self.ssid {
            config.wifi_ssid = value;
        }
        if let Some(value) = self.password {
            config.wifi_password = value;
        }
        if let Some(value) = self.github_user {
            config.github_username = value;
        }
        if let Some(value) = self.github_token {
            config.github_token = value;
        }
        if self.clear_weather {
            config.weather_location = None;
        } else if self.weather.is_some() {
            config.weather_location = self.weather;
        }
        if self.clear_wled_ip {
            config.wled_ip = None;
        } else if self.wled_ip.is_some() {
            config.wled_ip = self.wled_ip;
        }
    }
}

#[derive(Debug, Args)]
struct BadgeInfoArgs {
    #[arg(long)]
    event: Option<String>,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    company: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    pronouns: Option<String>,
    #[arg(long)]
    handle: Option<String>,
}

impl BadgeInfoArgs {
    fn apply(self, info: &mut PersonalInfo) {
        let fields = [
            (self.event, &mut info.event),
            (self.first_name, &mut info.first_name),
            (self.last_name, &mut info.last_name),
            (self.company, &mut info.company),
            (self.title, &mut info.title),
            (self.pronouns, &mut info.pronouns),
            (self.handle, &mut info.handle),
        ];
        for (value, field) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

fn settings(cli: &Cli) -> BridgeSettings {
    let mut settings = BridgeSettings::from_env();
    if let Some(dir) = &cli.catalog_dir {
        settings.catalog_root = dir.clone();
    }
    if !cli.mounts.is_empty() {
        settings.extra_mounts = cli.mounts.clone();
    }
    if cli.mount_only {
        settings.scan_platform = false;
    }
    if let Some(scale) = cli.sim_scale.filter(|scale| *scale > 0) {
        settings.simulator_scale = scale;
    }
    settings
}

fn run(cli: Cli) -> Result<ExitCode> {
    let bridge = Bridge::new(settings(&cli));
    let pretty = cli.pretty;

    let request = match cli.command {
        Command::Serve => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            serve::serve(&bridge, stdin.lock(), stdout.lock()).context("serve loop")?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Watch {
            interval,
            polls,
            with_config,
        } => {
            let options = watch::WatchOptions {
                interval: Duration::from_secs(interval.max(1)),
                polls,
                with_config,
            };
            watch::watch(&bridge, &options, std::io::stdout().lock()).context("watch loop")?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Status => Request::GetStatus,
        Command::ReadConfig => Request::ReadConfig,
        Command::WriteConfig(args) => {
            let current = bridge.handle(Request::ReadConfig);
            if !current.success {
                return emit(&current, pretty);
            }
            let mut config = payload::<DeviceConfig>(&current, "config")?;
            args.apply(&mut config);
            Request::WriteConfig { config }
        }
        Command::Flash { file } => Request::FlashFirmware { file_path: file },
        Command::Apps => Request::ListApps,
        Command::Available => Request::AvailableApps,
        Command::Install { name } => Request::InstallApp { name },
        Command::Remove { name } => Request::RemoveApp { name },
        Command::BadgeInfo => Request::ReadBadgeInfo,
        Command::SetBadgeInfo(args) => {
            let current = bridge.handle(Request::ReadBadgeInfo);
            if !current.success {
                return emit(&current, pretty);
            }
            let mut info = payload::<PersonalInfo>(&current, "info")?;
            args.apply(&mut info);
            Request::WriteBadgeInfo { info }
        }
        Command::Sim(command) => match command {
            SimCommand::Status => Request::SimulatorStatus,
            SimCommand::Setup => Request::SimulatorSetup,
            SimCommand::CheckPython => Request::SimulatorCheckPython,
            SimCommand::CheckPygame => Request::SimulatorCheckPygame,
            SimCommand::InstallPygame => Request::SimulatorInstallPygame,
            SimCommand::Launch { app } => {
                let current = bridge.handle(Request::ReadConfig);
                let config = if current.success {
                    payload::<DeviceConfig>(&current, "config")?
                } else {
                    DeviceConfig::default()
                };
                Request::SimulatorLaunch {
                    config,
                    app_path: app,
                }
            }
            SimCommand::Apps => Request::SimulatorListApps,
            SimCommand::Open => Request::SimulatorOpenFolder,
        },
        Command::Prerequisites => Request::Prerequisites,
    };

    let envelope = bridge.handle(request);
    emit(&envelope, pretty)
}

fn payload<T: serde::de::DeserializeOwned>(envelope: &Envelope, key: &str) -> Result<T> {
    let value = envelope
        .get(key)
        .cloned()
        .with_context(|| format!("response has no {key}"))?;
    serde_json::from_value(value).with_context(|| format!("decode {key}"))
}

fn emit(envelope: &Envelope, pretty: bool) -> Result<ExitCode> {
    if pretty {
        println!("{}", serde_json::to_string_pretty(envelope)?);
    } else {
        println!("{}", serde_json::to_string(envelope)?);
    }
    Ok(if envelope.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
