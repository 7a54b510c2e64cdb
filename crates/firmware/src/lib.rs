//! Copies a UF2 image onto the RP2350 bootloader drive.
//!
//! A good image makes the badge reboot while (or right after) it is being
//! written, so the drive vanishing under us is the expected outcome.

use badgeforge_core::{DeviceStatus, FirmwareTransferResult};
use badgeforge_guard::BOOTSEL_GUIDANCE;
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::Path;
use tracing::{info, warn};

pub const UPLOADED_MESSAGE: &str =
    "Firmware uploaded! Badge will reboot automatically. The RP2350 drive will disappear - this is normal.";
pub const REBOOTING_MESSAGE: &str =
    "Firmware upload initiated. Badge is rebooting - this is expected!";

const UF2_BLOCK_SIZE: usize = 512;
const UF2_MAGIC_START0: u32 = 0x0A32_4655;
const UF2_MAGIC_START1: u32 = 0x9E5D_5157;
const UF2_MAGIC_END: u32 = 0x0AB1_6F30;

#[derive(Debug, Clone)]
pub struct FirmwareImage {
    pub file_name: OsString,
    pub bytes: Vec<u8>,
    pub sha256: String,
    pub uf2_blocks: Option<usize>,
}

pub fn load_image(source: &Path) -> io::Result<FirmwareImage> {
    let file_name = source
        .file_name()
        .map(|name| name.to_os_string())
        .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, "firmware path has no file name"))?;
    let bytes = fs::read(source)?;
    let sha256 = to_hex(&Sha256::digest(&bytes));
    let uf2_blocks = uf2_block_count(&bytes);
    Ok(FirmwareImage {
        file_name,
        bytes,
        sha256,
        uf2_blocks,
    })
}

/// Write `source` into the bootloader drive root under its own file name.
pub fn transfer(source: &Path, status: &DeviceStatus) -> FirmwareTransferResult {
    let Some(mount) = status.bootsel_mount() else {
        return FirmwareTransferResult::Failure(BOOTSEL_GUIDANCE.to_string());
    };

    let image = match load_image(source) {
        Ok(image) => image,
        Err(err) => {
            return FirmwareTransferResult::Failure(format!(
                "Failed to read firmware file {}: {}",
                source.display(),
                err
            ))
        }
    };
    match image.uf2_blocks {
        Some(blocks) => info!(blocks, sha256 = %image.sha256, "firmware image inspected"),
        None => warn!(sha256 = %image.sha256, "firmware image is not a UF2 file, copying anyway"),
    }

    let dest = mount.join(&image.file_name);
    match write_image(&dest, &image.bytes) {
        Ok(()) => {
            info!(dest = %dest.display(), bytes = image.bytes.len(), "firmware written");
            FirmwareTransferResult::Success(UPLOADED_MESSAGE.to_string())
        }
        Err(err) if is_disconnect(&err) => {
            info!(dest = %dest.display(), error = %err, "bootloader drive went away, badge is rebooting");
            FirmwareTransferResult::Success(REBOOTING_MESSAGE.to_string())
        }
        Err(err) => FirmwareTransferResult::Failure(format!("Failed to flash firmware: {err}")),
    }
}

fn write_image(dest: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(dest)?;
    file.write_all(bytes)?;
    file.flush()?;
    match file.sync_all() {
        Ok(()) => Ok(()),
        Err(err) if is_disconnect(&err) => Err(err),
        Err(err) => {
            warn!(dest = %dest.display(), error = %err, "sync after firmware write failed");
            Ok(())
        }
    }
}

#[cfg(unix)]
const DISCONNECT_OS_ERRORS: &[i32] = &[libc::ENOENT, libc::EBUSY, libc::ENODEV];

// ERROR_FILE_NOT_FOUND, ERROR_PATH_NOT_FOUND, ERROR_NOT_READY, ERROR_DEV_NOT_EXIST, ERROR_BUSY
#[cfg(windows)]
const DISCONNECT_OS_ERRORS: &[i32] = &[2, 3, 21, 55, 170];

#[cfg(not(any(unix, windows)))]
const DISCONNECT_OS_ERRORS: &[i32] = &[];

const DISCONNECT_MESSAGES: &[&str] = &[
    "no such file",
    "no such device",
    "resource busy",
    "device busy",
    "enoent",
    "ebusy",
    "enodev",
];

/// Whether an I/O error means the target vanished or is busy rebooting.
///
/// Structured information (error kind, OS error code) is checked first; the
/// message text is the fallback for errors that carry neither.
pub fn is_disconnect(err: &io::Error) -> bool {
    if err.kind() == ErrorKind::NotFound {
        return true;
    }
    if let Some(code) = err.raw_os_error() {
        return DISCONNECT_OS_ERRORS.contains(&code);
    }
    let text = err.to_string().to_ascii_lowercase();
    DISCONNECT_MESSAGES.iter().any(|needle| text.contains(needle))
}

/// Number of UF2 blocks when every 512-byte block carries the UF2 magic words.
pub fn uf2_block_count(bytes: &[u8]) -> Option<usize> {
    if bytes.is_empty() || bytes.len() % UF2_BLOCK_SIZE != 0 {
        return None;
    }
    let mut count = 0;
    for block in bytes.chunks_exact(UF2_BLOCK_SIZE) {
        if word(block, 0) != UF2_MAGIC_START0
            || word(block, 4) != UF2_MAGIC_START1
            || word(block, UF2_BLOCK_SIZE - 4) != UF2_MAGIC_END
        {
            return None;
        }
        count += 1;
    }
    Some(count)
}

fn word(block: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&block[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}
