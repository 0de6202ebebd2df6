//! Volume identifier parsing and normalization.
//!
//! A volume can be named three ways, all with a mandatory trailing
//! backslash:
//!
//! 1. A drive letter root: `D:\`
//! 2. A volume mount point path: `C:\mounts\data\`
//! 3. A unique volume name: `\\?\Volume{GUID}\`
//!
//! Parsing is purely syntactic. Whether the volume actually exists is the
//! provider's verdict, checked at operation time.

use crate::error::{DiffAreaError, DiffAreaResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Syntactic form of a volume name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeNameKind {
    /// A drive letter root, e.g. `D:\`.
    DriveLetter,
    /// A mount point path below a drive root, e.g. `C:\mounts\data\`.
    MountPoint,
    /// A unique volume name, `\\?\Volume{GUID}\`.
    UniqueVolume,
}

/// A validated volume identifier.
///
/// Immutable once constructed and never empty. Equality, ordering and
/// hashing are case-insensitive: `d:\` and `D:\` name the same volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VolumeName {
    /// The identifier as given by the caller.
    raw: String,
    /// Case-folded form used for comparisons.
    canonical: String,
    kind: VolumeNameKind,
}

impl VolumeName {
    /// Parse and validate a volume identifier.
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` when the string matches none of the three
    /// accepted forms.
    pub fn parse(name: &str) -> DiffAreaResult<Self> {
        if name.is_empty() {
            return Err(DiffAreaError::invalid("volume name must not be empty"));
        }
        if !name.ends_with('\\') {
            return Err(DiffAreaError::invalid(format!(
                "volume name must end with a backslash: {:?}",
                name
            )));
        }

        let kind = if let Some(interior) = name
            .strip_prefix("\\\\?\\Volume{")
            .and_then(|rest| rest.strip_suffix("}\\"))
        {
            if !is_guid(interior) {
                return Err(DiffAreaError::invalid(format!(
                    "malformed volume GUID: {:?}",
                    interior
                )));
            }
            VolumeNameKind::UniqueVolume
        } else if is_drive_root(name) {
            VolumeNameKind::DriveLetter
        } else {
            validate_mount_point(name)?;
            VolumeNameKind::MountPoint
        };

        Ok(Self {
            raw: name.to_string(),
            canonical: name.to_ascii_uppercase(),
            kind,
        })
    }

    /// The identifier exactly as it was given.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The syntactic form this name was parsed as.
    pub fn kind(&self) -> VolumeNameKind {
        self.kind
    }
}

impl fmt::Display for VolumeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for VolumeName {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for VolumeName {}

impl PartialOrd for VolumeName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VolumeName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl Hash for VolumeName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl FromStr for VolumeName {
    type Err = DiffAreaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VolumeName::parse(s)
    }
}

impl TryFrom<String> for VolumeName {
    type Error = DiffAreaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        VolumeName::parse(&value)
    }
}

impl From<VolumeName> for String {
    fn from(value: VolumeName) -> Self {
        value.raw
    }
}

/// `X:\` - one ASCII letter, a colon, a single trailing backslash.
fn is_drive_root(name: &str) -> bool {
    name.len() == 3 && starts_with_drive_root(name)
}

/// Whether the first three bytes spell a drive root (`X:\`).
fn starts_with_drive_root(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && bytes[2] == b'\\'
}

/// 8-4-4-4-12 hex groups separated by hyphens.
fn is_guid(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 36 {
        return false;
    }
    for (i, b) in bytes.iter().enumerate() {
        match i {
            8 | 13 | 18 | 23 => {
                if *b != b'-' {
                    return false;
                }
            }
            _ => {
                if !b.is_ascii_hexdigit() {
                    return false;
                }
            }
        }
    }
    true
}

/// A mount point is an absolute path below a drive root with non-empty,
/// well-formed components and a trailing backslash.
fn validate_mount_point(name: &str) -> DiffAreaResult<()> {
    if name.len() < 4 || !starts_with_drive_root(name) {
        return Err(DiffAreaError::invalid(format!(
            "volume name is not a drive root, mount point, or unique volume name: {:?}",
            name
        )));
    }

    // Interior between the drive root and the trailing backslash.
    let interior = &name[3..name.len() - 1];
    for component in interior.split('\\') {
        if component.is_empty() {
            return Err(DiffAreaError::invalid(format!(
                "mount point path has an empty component: {:?}",
                name
            )));
        }
        if component
            .chars()
            .any(|c| c.is_control() || matches!(c, '<' | '>' | ':' | '"' | '/' | '|' | '?' | '*'))
        {
            return Err(DiffAreaError::invalid(format!(
                "mount point component contains an invalid character: {:?}",
                component
            )));
        }
    }
    Ok(())
}
