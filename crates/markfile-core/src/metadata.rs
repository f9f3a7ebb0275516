//! Human-readable metadata summaries for a single path.
//!
//! Nothing here mutates the filesystem or caches what it reads: every
//! [`MetadataReport::read`] stats the path again.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use humansize::{FormatSizeOptions, DECIMAL};
use serde::{Deserialize, Serialize};

use crate::error::{OpsError, Result};

/// Timestamp format used for all reported times.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Placeholder for a timestamp the platform does not provide.
pub const MISSING_TIMESTAMP: &str = "-";

/// Type of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// Sockets, devices, fifos.
    Other,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
            Self::Symlink => write!(f, "symlink"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// File metadata timestamps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Timestamps {
    /// Creation time (if available, platform-dependent).
    pub created: Option<SystemTime>,
    /// Last access time (if available).
    pub accessed: Option<SystemTime>,
    /// Last modification time (if available).
    pub modified: Option<SystemTime>,
}

impl Timestamps {
    fn from_metadata(metadata: &fs::Metadata) -> Self {
        Self {
            created: metadata.created().ok(),
            accessed: metadata.accessed().ok(),
            modified: metadata.modified().ok(),
        }
    }
}

/// Point-in-time metadata of one path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataReport {
    /// The path that was read.
    pub path: PathBuf,
    /// Entry type.
    pub kind: EntryKind,
    /// Size in bytes.
    pub size: u64,
    /// Permission bits (lower 12 bits of the mode).
    pub mode: u32,
    /// Birth/access/modify times.
    pub timestamps: Timestamps,
}

impl MetadataReport {
    /// Read the metadata of `path`.
    ///
    /// Symlinks are followed; a dangling link is reported as the link itself.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = fs::metadata(path)
            .or_else(|_| fs::symlink_metadata(path))
            .map_err(|_| OpsError::MetadataUnavailable {
                path: path.to_path_buf(),
            })?;

        let file_type = metadata.file_type();
        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else if file_type.is_symlink() {
            EntryKind::Symlink
        } else {
            EntryKind::Other
        };

        Ok(Self {
            path: path.to_path_buf(),
            kind,
            size: metadata.len(),
            mode: permission_bits(&metadata),
            timestamps: Timestamps::from_metadata(&metadata),
        })
    }

    /// Size with an SI suffix.
    pub fn size_display(&self) -> String {
        format_size(self.size)
    }

    /// Permission bits as an octal string such as `644`.
    pub fn permissions_octal(&self) -> String {
        format_permissions_octal(self.mode)
    }

    /// Permission bits as `rwxr-xr-x`.
    pub fn permissions_symbolic(&self) -> String {
        format_permissions_symbolic(self.mode)
    }

    /// Summary lines suitable for a status area.
    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            format!("path:     {}", self.path.display()),
            format!("type:     {}", self.kind),
            format!("size:     {} ({} bytes)", self.size_display(), self.size),
            format!(
                "mode:     {} ({})",
                self.permissions_symbolic(),
                self.permissions_octal()
            ),
            format!("created:  {}", format_timestamp(self.timestamps.created)),
            format!("accessed: {}", format_timestamp(self.timestamps.accessed)),
            format!("modified: {}", format_timestamp(self.timestamps.modified)),
        ]
    }
}

#[cfg(unix)]
fn permission_bits(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permission_bits(metadata: &fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o666
    }
}

fn size_options() -> FormatSizeOptions {
    DECIMAL.decimal_places(1)
}

/// Format a byte count with SI suffixes, one decimal above 1000 bytes.
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, size_options())
}

/// Signed variant of [`format_size`].
///
/// The magnitude decides the suffix, so `-1500` formats as `-1.5 kB`.
pub fn format_size_signed(bytes: i64) -> String {
    let magnitude = format_size(bytes.unsigned_abs());
    if bytes < 0 {
        format!("-{magnitude}")
    } else {
        magnitude
    }
}

/// Format permission bits as a three digit octal string.
pub fn format_permissions_octal(mode: u32) -> String {
    format!("{:03o}", mode & 0o777)
}

/// Format permission bits as a 9-character owner/group/other string.
pub fn format_permissions_symbolic(mode: u32) -> String {
    const FLAGS: [(u32, char); 9] = [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ];

    FLAGS
        .iter()
        .map(|&(bit, c)| if mode & bit != 0 { c } else { '-' })
        .collect()
}

/// Format a timestamp in local time.
pub fn format_timestamp(time: Option<SystemTime>) -> String {
    match time {
        Some(time) => DateTime::<Local>::from(time)
            .format(TIMESTAMP_FORMAT)
            .to_string(),
        None => MISSING_TIMESTAMP.to_string(),
    }
}
