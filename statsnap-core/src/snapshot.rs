/*!
Snapshot engine tying the codec, the envelope and a store together.

Saving encodes a provider, seals the archive in an envelope and writes it
through the store. Loading reverses each step and decodes into an editable
provider.
*/

use crate::codec::{DecodeReport, StatsCodec};
use crate::config::{CodecConfig, StoreConfig};
use crate::directory::IdentifierDirectory;
use crate::envelope::{read_envelope, read_header, write_envelope, SnapshotHeader};
use crate::provider::{EditableStatsProvider, RamStatsProvider, StatsProvider};
use crate::store::{LocalFileStore, SnapshotStore};
use crate::Result;
use tracing::{debug, info};

/// Main engine for snapshot save and restore operations
///
/// # Example
/// ```rust,no_run
/// use statsnap_core::{
///     CounterKind, EditableStatsProvider, LocalFileStore, RamStatsProvider, SnapshotEngine,
///     StatCategory, StatKey, StaticDirectory,
/// };
///
/// let directory = StaticDirectory::new().with(StatCategory::Item, &["minecraft:dirt"])?;
/// let engine = SnapshotEngine::new(LocalFileStore::with_base_dir("/var/stats"), directory);
///
/// let mut stats = RamStatsProvider::new().with_display_name("Steve");
/// stats.set_counter(StatKey::new(CounterKind::Mined, "minecraft:dirt".parse()?), 64);
/// engine.save_snapshot(&stats, "steve.stsn")?;
///
/// let mut restored = RamStatsProvider::new();
/// engine.load_snapshot("steve.stsn", &mut restored)?;
/// # Ok::<(), statsnap_core::StatsError>(())
/// ```
pub struct SnapshotEngine<S, D>
where
    S: SnapshotStore,
    D: IdentifierDirectory,
{
    store: S,
    codec: StatsCodec<D>,
}

impl<S, D> SnapshotEngine<S, D>
where
    S: SnapshotStore,
    D: IdentifierDirectory,
{
    /// Create an engine with the default codec limits
    pub fn new(store: S, directory: D) -> Self {
        Self::with_codec(store, StatsCodec::new(directory))
    }

    pub fn with_codec(store: S, codec: StatsCodec<D>) -> Self {
        Self { store, codec }
    }

    pub fn codec(&self) -> &StatsCodec<D> {
        &self.codec
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Encode, seal and store a provider's statistics
    ///
    /// # Errors
    /// * `StatsError::Storage` - If writing to the store fails
    pub fn save_snapshot<P: StatsProvider + ?Sized>(
        &self,
        provider: &P,
        path: &str,
    ) -> Result<SnapshotHeader> {
        let archive = self.codec.encode(provider);
        let (header, sealed) = write_envelope(&archive);
        self.store.save(&sealed, path)?;

        info!(
            path,
            archive_size = header.archive_size,
            content_hash = %header.content_hash,
            "snapshot saved"
        );
        Ok(header)
    }

    /// Load, verify and decode a snapshot into `target`
    ///
    /// `target` is only modified when every step succeeds.
    ///
    /// # Errors
    /// * `StatsError::Storage` - If reading from the store fails
    /// * `StatsError::InvalidFormat` / `StatsError::UnsupportedVersion` - If the envelope is unreadable
    /// * `StatsError::IntegrityCheckFailed` - If the archive does not match its hash
    /// * `StatsError::TruncatedArchive` / `StatsError::OversizedField` - If the archive is malformed
    pub fn load_snapshot<T: EditableStatsProvider + ?Sized>(
        &self,
        path: &str,
        target: &mut T,
    ) -> Result<SnapshotHeader> {
        let (header, report) = self.load_snapshot_with_report(path, target)?;
        debug!(path, dropped_records = report.dropped_records, "snapshot decode report");
        Ok(header)
    }

    /// Like [`SnapshotEngine::load_snapshot`], also returning the decode report
    pub fn load_snapshot_with_report<T: EditableStatsProvider + ?Sized>(
        &self,
        path: &str,
        target: &mut T,
    ) -> Result<(SnapshotHeader, DecodeReport)> {
        let sealed = self.store.load(path)?;
        let (header, archive) = read_envelope(&sealed)?;
        let report = self.codec.decode_with_report(archive, target)?;

        info!(
            path,
            archive_size = header.archive_size,
            skipped_chunks = report.skipped_chunks,
            "snapshot loaded"
        );
        Ok((header, report))
    }

    /// Load a snapshot into a fresh RAM provider
    pub fn restore(&self, path: &str) -> Result<(SnapshotHeader, RamStatsProvider)> {
        let mut provider = RamStatsProvider::new();
        let header = self.load_snapshot(path, &mut provider)?;
        Ok((header, provider))
    }

    /// Read a snapshot's header without checking or decoding the archive
    pub fn snapshot_header(&self, path: &str) -> Result<SnapshotHeader> {
        let sealed = self.store.load(path)?;
        let (header, _) = read_header(&sealed)?;
        Ok(header)
    }

    /// Verify envelope, integrity and archive structure without keeping the result
    pub fn verify_snapshot(&self, path: &str) -> Result<(SnapshotHeader, DecodeReport)> {
        let mut scratch = RamStatsProvider::new();
        self.load_snapshot_with_report(path, &mut scratch)
    }

    /// Check if a snapshot exists at the specified path
    pub fn snapshot_exists(&self, path: &str) -> bool {
        self.store.exists(path)
    }

    /// Delete a snapshot from the store
    pub fn delete_snapshot(&self, path: &str) -> Result<()> {
        self.store.delete(path)?;
        info!(path, "snapshot deleted");
        Ok(())
    }
}

/// Engine over the local filesystem with the given settings
pub fn create_local_engine<D: IdentifierDirectory>(
    directory: D,
    store_config: StoreConfig,
    codec_config: CodecConfig,
) -> Result<SnapshotEngine<LocalFileStore, D>> {
    store_config.validate()?;
    codec_config.validate()?;
    Ok(SnapshotEngine::with_codec(
        LocalFileStore::from_config(store_config),
        StatsCodec::with_config(directory, codec_config),
    ))
}
