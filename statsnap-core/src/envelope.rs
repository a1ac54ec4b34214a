/*!
Versioned, hashed wrapper around an encoded archive.

```text
[magic "STSN"][u16 LE format version][i64 LE created-at millis][32-byte SHA-256][archive]
```
*/

use crate::wire::WireReader;
use crate::{Result, StatsError};
use bytes::BufMut;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Leading bytes of every snapshot file
pub const ENVELOPE_MAGIC: &[u8; 4] = b"STSN";

/// Format version written by this build
pub const CURRENT_FORMAT_VERSION: u16 = 2;

/// Oldest format version this build can read
pub const MIN_FORMAT_VERSION: u16 = 2;

/// Bytes in front of the archive
pub const HEADER_LEN: usize = 4 + 2 + 8 + 32;

/// Header of a sealed snapshot
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHeader {
    /// Format version the archive was written with
    pub format_version: u16,

    /// When the snapshot was sealed, millisecond precision
    pub created_at: DateTime<Utc>,

    /// Hex SHA-256 of the archive bytes
    pub content_hash: String,

    /// Size of the archive in bytes
    pub archive_size: usize,
}

impl SnapshotHeader {
    /// Describe `archive` as sealed now
    pub fn for_archive(archive: &[u8]) -> Self {
        Self::for_archive_at(archive, Utc::now())
    }

    pub fn for_archive_at(archive: &[u8], created_at: DateTime<Utc>) -> Self {
        // the wire keeps milliseconds only
        let millis = created_at.timestamp_millis();
        Self {
            format_version: CURRENT_FORMAT_VERSION,
            created_at: DateTime::from_timestamp_millis(millis).unwrap_or(created_at),
            content_hash: Self::compute_hash(archive),
            archive_size: archive.len(),
        }
    }

    /// Compute SHA-256 hash of the provided data as lowercase hex
    pub fn compute_hash(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    /// Check an archive against the recorded hash
    ///
    /// # Returns
    /// Ok(()) if the hash matches, Err(StatsError::IntegrityCheckFailed) otherwise
    pub fn verify_integrity(&self, archive: &[u8]) -> Result<()> {
        let computed_hash = Self::compute_hash(archive);
        if computed_hash == self.content_hash {
            Ok(())
        } else {
            Err(StatsError::IntegrityCheckFailed {
                expected: self.content_hash.clone(),
                actual: computed_hash,
            })
        }
    }

    /// Check if this header's format version can be read by this build
    pub fn is_compatible(&self) -> bool {
        (MIN_FORMAT_VERSION..=CURRENT_FORMAT_VERSION).contains(&self.format_version)
    }
}

/// Prefix `archive` with a fresh header
pub fn write_envelope(archive: &[u8]) -> (SnapshotHeader, Vec<u8>) {
    write_envelope_at(archive, Utc::now())
}

pub fn write_envelope_at(archive: &[u8], created_at: DateTime<Utc>) -> (SnapshotHeader, Vec<u8>) {
    let header = SnapshotHeader::for_archive_at(archive, created_at);
    let mut out = Vec::with_capacity(HEADER_LEN + archive.len());
    out.put_slice(ENVELOPE_MAGIC);
    out.put_u16_le(header.format_version);
    out.put_i64_le(header.created_at.timestamp_millis());
    out.put_slice(&Sha256::digest(archive));
    out.put_slice(archive);
    (header, out)
}

/// Parse the header and verify the archive against it.
///
/// # Errors
/// * `StatsError::InvalidFormat` - If the magic is wrong or the header is short
/// * `StatsError::UnsupportedVersion` - If the format version is outside the readable range
/// * `StatsError::IntegrityCheckFailed` - If the archive does not match its hash
pub fn read_envelope(bytes: &[u8]) -> Result<(SnapshotHeader, &[u8])> {
    let (header, archive) = read_header(bytes)?;
    header.verify_integrity(archive)?;
    Ok((header, archive))
}

/// Parse the header without checking the archive hash
pub fn read_header(bytes: &[u8]) -> Result<(SnapshotHeader, &[u8])> {
    if bytes.len() < HEADER_LEN {
        return Err(StatsError::invalid_format(format!(
            "header needs {HEADER_LEN} bytes, found {}",
            bytes.len()
        )));
    }
    let mut reader = WireReader::new(bytes);
    let magic = reader.get_bytes(ENVELOPE_MAGIC.len())?;
    if magic != ENVELOPE_MAGIC {
        return Err(StatsError::invalid_format("missing STSN magic"));
    }

    let format_version = reader.get_u16_le()?;
    if !(MIN_FORMAT_VERSION..=CURRENT_FORMAT_VERSION).contains(&format_version) {
        return Err(StatsError::UnsupportedVersion {
            found: format_version,
            min: MIN_FORMAT_VERSION,
            max: CURRENT_FORMAT_VERSION,
        });
    }

    let millis = reader.get_i64_le()?;
    let created_at = DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| StatsError::invalid_format(format!("timestamp {millis} out of range")))?;

    let digest = reader.get_bytes(32)?;
    let content_hash = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();

    let archive = reader.rest();
    Ok((
        SnapshotHeader {
            format_version,
            created_at,
            content_hash,
            archive_size: archive.len(),
        },
        archive,
    ))
}
