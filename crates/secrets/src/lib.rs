//! Reader and writer for the badge's `secrets.py`.
//!
//! The file is MicroPython source, but only a narrow slice of it matters:
//! top-level `NAME = "value"` / `NAME = None` assignments to the known
//! configuration names. Everything else is tolerated and ignored; nothing is
//! evaluated.

use badgeforge_core::{secrets_path, write_durable, BridgeError, DeviceConfig, Result};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info};

pub const WIFI_SSID: &str = "WIFI_SSID";
pub const WIFI_PASSWORD: &str = "WIFI_PASSWORD";
pub const GITHUB_USERNAME: &str = "GITHUB_USERNAME";
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const WEATHER_LOCATION: &str = "WEATHER_LOCATION";
pub const WLED_IP: &str = "WLED_IP";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Literal {
    Str(String),
    None,
}

/// Read `secrets.py` from the badge root. A missing file is a first run and
/// yields the default config.
pub fn read_config(mount: &Path) -> Result<DeviceConfig> {
    read_config_file(&secrets_path(mount))
}

pub fn read_config_file(path: &Path) -> Result<DeviceConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "no secrets file, using defaults");
        return Ok(DeviceConfig::default());
    }
    let bytes = fs::read(path).map_err(|err| BridgeError::io("Failed to read config", err))?;
    Ok(parse_config(&String::from_utf8_lossy(&bytes)))
}

pub fn parse_config(content: &str) -> DeviceConfig {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut config = DeviceConfig::default();
    for line in content.lines() {
        let Some(captures) = assignment_pattern().captures(line) else {
            continue;
        };
        let name = &captures[1];
        let Some(literal) = parse_literal(&captures[2]) else {
            debug!(name, "skipping non-literal assignment");
            continue;
        };
        apply(&mut config, name, literal);
    }
    config
}

fn apply(config: &mut DeviceConfig, name: &str, literal: Literal) {
    let required = match name {
        WIFI_SSID => &mut config.wifi_ssid,
        WIFI_PASSWORD => &mut config.wifi_password,
        GITHUB_USERNAME => &mut config.github_username,
        GITHUB_TOKEN => &mut config.github_token,
        WEATHER_LOCATION => {
            config.weather_location = literal.into_option();
            return;
        }
        WLED_IP => {
            config.wled_ip = literal.into_option();
            return;
        }
        _ => return,
    };
    if let Literal::Str(value) = literal {
        *required = value;
    }
}

impl Literal {
    fn into_option(self) -> Option<String> {
        match self {
            Literal::Str(value) => Some(value),
            Literal::None => None,
        }
    }
}

fn assignment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.*)$").expect("assignment pattern is valid")
    })
}

fn parse_literal(input: &str) -> Option<Literal> {
    let input = input.trim_end();
    if let Some(rest) = input.strip_prefix("None") {
        let rest = rest.trim_start();
        return (rest.is_empty() || rest.starts_with('#')).then_some(Literal::None);
    }
    parse_quoted(input).map(Literal::Str)
}

fn parse_quoted(input: &str) -> Option<String> {
    let mut chars = input.chars();
    let quote = chars.next().filter(|c| *c == '"' || *c == '\'')?;
    let mut value = String::new();
    while let Some(ch) = chars.next() {
        if ch == quote {
            return Some(value);
        }
        if ch != '\\' {
            value.push(ch);
            continue;
        }
        match chars.next()? {
            'n' => value.push('\n'),
            'r' => value.push('\r'),
            't' => value.push('\t'),
            '0' => value.push('\0'),
            '\\' => value.push('\\'),
            '"' => value.push('"'),
            '\'' => value.push('\''),
            other => {
                value.push('\\');
                value.push(other);
            }
        }
    }
    None
}

/// Escape a value for a double-quoted literal: backslash, double quote,
/// newline, carriage return and tab.
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

/// Render the whole file. Layout is fixed and line endings are always `\n`.
pub fn render_config(config: &DeviceConfig) -> String {
    let lines = [
        "# Badge Configuration".to_string(),
        "# Generated by badgeforge".to_string(),
        String::new(),
        "# WiFi Settings (2.4GHz network required)".to_string(),
        string_assignment(WIFI_SSID, &config.wifi_ssid),
        string_assignment(WIFI_PASSWORD, &config.wifi_password),
        String::new(),
        "# GitHub Settings".to_string(),
        string_assignment(GITHUB_USERNAME, &config.github_username),
        string_assignment(GITHUB_TOKEN, &config.github_token),
        String::new(),
        "# Optional Settings".to_string(),
        optional_assignment(WEATHER_LOCATION, config.weather_location.as_deref()),
        optional_assignment(WLED_IP, config.wled_ip.as_deref()),
        String::new(),
    ];
    lines.join("\n")
}

fn string_assignment(name: &str, value: &str) -> String {
    format!("{name} = \"{}\"", escape_literal(value))
}

fn optional_assignment(name: &str, value: Option<&str>) -> String {
    match value {
        Some(value) => string_assignment(name, value),
        None => format!("{name} = None"),
    }
}

/// Write `secrets.py` at the badge root and flush it to the device.
pub fn write_config(mount: &Path, config: &DeviceConfig) -> Result<()> {
    write_config_file(&secrets_path(mount), config)
}

pub fn write_config_file(path: &Path, config: &DeviceConfig) -> Result<()> {
    write_durable(path, render_config(config).as_bytes())
        .map_err(|err| BridgeError::io("Failed to write config", err))?;
    info!(path = %path.display(), "config written");
    Ok(())
}
