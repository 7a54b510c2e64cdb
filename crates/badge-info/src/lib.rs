use badgeforge_core::{badge_txt_path, write_durable, BridgeError, PersonalInfo, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Read `badges/badge.txt`. A missing file yields the default record.
pub fn read_badge_info(mount: &Path) -> Result<PersonalInfo> {
    let path = badge_txt_path(mount);
    if !path.exists() {
        debug!(path = %path.display(), "no badge.txt, using defaults");
        return Ok(PersonalInfo::default());
    }
    let bytes = fs::read(&path).map_err(|err| BridgeError::io("Failed to read badge info", err))?;
    Ok(parse_badge_info(&String::from_utf8_lossy(&bytes)))
}

/// Map trimmed lines 0..7 onto the record. Missing trailing lines are empty;
/// the event line is taken as-is because the file exists.
pub fn parse_badge_info(content: &str) -> PersonalInfo {
    let mut lines = content.split('\n').map(|line| line.trim().to_string());
    let mut next = || lines.next().unwrap_or_default();
    PersonalInfo {
        event: next(),
        first_name: next(),
        last_name: next(),
        company: next(),
        title: next(),
        pronouns: next(),
        handle: next(),
    }
}

pub fn render_badge_info(info: &PersonalInfo) -> String {
    [
        &info.event,
        &info.first_name,
        &info.last_name,
        &info.company,
        &info.title,
        &info.pronouns,
        &info.handle,
    ]
    .iter()
    .map(|field| single_line(field))
    .collect::<Vec<_>>()
    .join("\n")
}

// A line break inside a field would shift every later position.
fn single_line(field: &str) -> String {
    field.replace(['\r', '\n'], " ")
}

/// Write `badges/badge.txt`, creating `badges/` when needed.
pub fn write_badge_info(mount: &Path, info: &PersonalInfo) -> Result<()> {
    let path = badge_txt_path(mount);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .map_err(|err| BridgeError::io("Failed to create badges directory", err))?;
    }
    write_durable(&path, render_badge_info(info).as_bytes())
        .map_err(|err| BridgeError::io("Failed to write badge info", err))?;
    info!(path = %path.display(), "badge info written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use badgeforge_core::DEFAULT_EVENT;

    fn sample() -> PersonalInfo {
        PersonalInfo {
            event: "Universe 2025".to_string(),
            first_name: "Mona".to_string(),
            last_name: "Lisa".to_string(),
            company: "GitHub".to_string(),
            title: "Octocat".to_string(),
            pronouns: "she/her".to_string(),
            handle: "@mona".to_string(),
        }
    }

    #[test]
    fn absent_file_defaults_event() {
        let dir = tempfile::tempdir().unwrap();
        let info = read_badge_info(dir.path()).unwrap();
        assert_eq!(info.event, DEFAULT_EVENT);
        assert_eq!(info.first_name, "");
        assert_eq!(info.handle, "");
    }

    #[test]
    fn short_file_fills_trailing_fields() {
        let info = parse_badge_info("Hack Day\n  Mona \nLisa");
        assert_eq!(info.event, "Hack Day");
        assert_eq!(info.first_name, "Mona");
        assert_eq!(info.last_name, "Lisa");
        assert_eq!(info.company, "");
        assert_eq!(info.title, "");
        assert_eq!(info.pronouns, "");
        assert_eq!(info.handle, "");
    }

    #[test]
    fn present_but_empty_first_line_is_kept_empty() {
        let info = parse_badge_info("\nMona");
        assert_eq!(info.event, "");
        assert_eq!(info.first_name, "Mona");
    }

    #[test]
    fn crlf_lines_are_trimmed() {
        let info = parse_badge_info("Event\r\nMona\r\n");
        assert_eq!(info.event, "Event");
        assert_eq!(info.first_name, "Mona");
    }

    #[test]
    fn write_creates_directory_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        write_badge_info(dir.path(), &sample()).unwrap();
        let raw = fs::read_to_string(dir.path().join("badges").join("badge.txt")).unwrap();
        assert_eq!(raw, "Universe 2025\nMona\nLisa\nGitHub\nOctocat\nshe/her\n@mona");
        assert_eq!(read_badge_info(dir.path()).unwrap(), sample());
    }

    #[test]
    fn embedded_newlines_do_not_shift_fields() {
        let mut info = sample();
        info.company = "Git\nHub".to_string();
        let parsed = parse_badge_info(&render_badge_info(&info));
        assert_eq!(parsed.company, "Git Hub");
        assert_eq!(parsed.handle, "@mona");
    }
}
