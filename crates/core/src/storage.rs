use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

/// Replace `path` with `contents` without ever leaving a truncated file behind.
///
/// The bytes go to a sibling staging file first and are renamed over the
/// target once fully written. The result is then flushed to the device,
/// tolerating filesystems that reject an explicit sync.
pub fn write_durable(path: &Path, contents: &[u8]) -> io::Result<()> {
    let staging = staging_path(path);
    let result = write_staging(&staging, contents).and_then(|_| fs::rename(&staging, path));
    if let Err(err) = result {
        let _ = fs::remove_file(&staging);
        return Err(err);
    }
    sync_best_effort(path);
    Ok(())
}

/// Open for read, sync, close. Removable FAT volumes do not always honour
/// the sync, so failures are only logged.
pub fn sync_best_effort(path: &Path) {
    if let Err(err) = File::open(path).and_then(|file| file.sync_all()) {
        debug!(path = %path.display(), error = %err, "sync not supported, continuing");
    }
}

fn write_staging(staging: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = File::create(staging)?;
    file.write_all(contents)?;
    if let Err(err) = file.sync_all() {
        debug!(path = %staging.display(), error = %err, "staging sync failed");
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
