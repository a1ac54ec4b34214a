/*!
Chunked binary codec for a provider's complete statistics.

An archive is a sequence of `[i32 LE length][chunk]` frames. Every chunk
starts with a UTF-8 kind tag, then a kind-specific payload:

| kind           | payload                                                        |
|----------------|----------------------------------------------------------------|
| `metadata`     | rich-text name (JSON), flag + UUID, flag + account name         |
| `general`      | repeated `[namespace][varint n][n × (path, value)]`            |
| `item`         | repeated `[namespace][varint n][n × (path, 6 counters)]`       |
| `mob`          | repeated `[namespace][varint n][n × (path, kills, deaths)]`    |
| `player_badge` | repeated `[namespace][varint n][n × (path, value)]`            |

Decoding stages every mutation and applies them only once the whole archive
has been read, so a failed decode never leaves the target half-written.
*/

use crate::config::CodecConfig;
use crate::directory::IdentifierDirectory;
use crate::facts::{
    badge_facts, general_facts, group_by_identifier_namespace, item_facts, mob_facts, non_empty,
    NamespaceGroups, StatFact,
};
use crate::identifier::{CounterKind, Identifier, StatCategory, StatKey};
use crate::provider::{AccountIdentity, EditableStatsProvider, StatsProvider};
use crate::text::RichText;
use crate::wire::{WireReader, WireWrite};
use crate::{Result, StatsError};
use bytes::{BufMut, BytesMut};
use std::fmt;
use tracing::{debug, warn};

#[cfg(feature = "metrics")]
use crate::observability::CodecMetrics;

/// Name written in place of a missing display name
pub const ABSENT_DISPLAY_NAME: &str = "-";

/// The closed set of chunk kinds understood by this format generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkKind {
    Metadata,
    General,
    Item,
    Mob,
    PlayerBadge,
}

impl ChunkKind {
    /// Chunk kinds in archive order
    pub const ALL: [ChunkKind; 5] = [
        ChunkKind::Metadata,
        ChunkKind::General,
        ChunkKind::Item,
        ChunkKind::Mob,
        ChunkKind::PlayerBadge,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            ChunkKind::Metadata => "metadata",
            ChunkKind::General => "general",
            ChunkKind::Item => "item",
            ChunkKind::Mob => "mob",
            ChunkKind::PlayerBadge => "player_badge",
        }
    }

    /// Exact-match lookup; unknown tags yield `None`
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Statistic category carried by a record chunk
    pub fn category(&self) -> Option<StatCategory> {
        match self {
            ChunkKind::Metadata => None,
            ChunkKind::General => Some(StatCategory::General),
            ChunkKind::Item => Some(StatCategory::Item),
            ChunkKind::Mob => Some(StatCategory::Mob),
            ChunkKind::PlayerBadge => Some(StatCategory::PlayerBadge),
        }
    }

    /// Number of varint fields following each record's path
    fn record_width(&self) -> usize {
        match self {
            ChunkKind::Metadata => 0,
            ChunkKind::General | ChunkKind::PlayerBadge => 1,
            ChunkKind::Item => CounterKind::ITEM.len(),
            ChunkKind::Mob => CounterKind::MOB.len(),
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// What a successful decode did besides populating the target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    /// Chunks read, known or not
    pub chunks: usize,
    /// Chunks skipped because their kind is unknown
    pub skipped_chunks: usize,
    /// Records dropped because their identifier did not resolve
    pub dropped_records: usize,
    /// Counter and badge writes applied to the target, including the
    /// zero-valued fields of item and mob records
    pub applied_values: usize,
}

/// Mutations collected during a decode, applied only on success.
#[derive(Debug, Default)]
struct StagedWrites {
    display_name: Option<Option<RichText>>,
    identity: Option<Option<AccountIdentity>>,
    counters: Vec<(StatKey, i32)>,
    badges: Vec<(Identifier, i32)>,
}

impl StagedWrites {
    fn stage_record(&mut self, kind: ChunkKind, id: Identifier, values: &[i32]) {
        match kind {
            ChunkKind::General => self.counters.push((StatKey::custom(id), values[0])),
            ChunkKind::Item => self.stage_kinds(&CounterKind::ITEM, id, values),
            ChunkKind::Mob => self.stage_kinds(&CounterKind::MOB, id, values),
            ChunkKind::PlayerBadge => self.badges.push((id, values[0])),
            ChunkKind::Metadata => {}
        }
    }

    fn stage_kinds(&mut self, kinds: &[CounterKind], id: Identifier, values: &[i32]) {
        for (kind, value) in kinds.iter().zip(values) {
            self.counters
                .push((StatKey::new(*kind, id.clone()), *value));
        }
    }

    fn apply<T: EditableStatsProvider + ?Sized>(self, target: &mut T) -> usize {
        if let Some(name) = self.display_name {
            target.set_display_name(name);
        }
        if let Some(identity) = self.identity {
            target.set_identity(identity);
        }
        let applied = self.counters.len() + self.badges.len();
        for (key, value) in self.counters {
            target.set_counter(key, value);
        }
        for (id, value) in self.badges {
            target.set_badge_counter(id, value);
        }
        applied
    }
}

/// Encoder/decoder bound to an identifier directory and size limits.
#[derive(Debug, Clone)]
pub struct StatsCodec<D> {
    directory: D,
    config: CodecConfig,
}

impl<D: IdentifierDirectory> StatsCodec<D> {
    pub fn new(directory: D) -> Self {
        Self::with_config(directory, CodecConfig::default())
    }

    pub fn with_config(directory: D, config: CodecConfig) -> Self {
        Self { directory, config }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Serialize a provider's complete state.
    ///
    /// Metadata is always written; record chunks only when they hold at least
    /// one non-empty fact. Records are grouped under their identifier's own
    /// namespace, and strings this codec would refuse to decode are left out.
    pub fn encode<P: StatsProvider + ?Sized>(&self, provider: &P) -> Vec<u8> {
        let mut archive = Vec::new();
        let mut chunks = 1;
        let limit = self.config.max_string_bytes;

        write_chunk(&mut archive, ChunkKind::Metadata, |buf| {
            write_metadata(buf, provider, &self.config)
        });

        let general = self.group(general_facts(provider, &self.directory, non_empty));
        chunks += write_groups(&mut archive, ChunkKind::General, &general, limit, |buf, fact| {
            buf.put_varint(fact.value)
        });

        let items = self.group(item_facts(provider, &self.directory, non_empty));
        chunks += write_groups(&mut archive, ChunkKind::Item, &items, limit, |buf, fact| {
            for value in fact.counters() {
                buf.put_varint(value);
            }
        });

        let mobs = self.group(mob_facts(provider, &self.directory, non_empty));
        chunks += write_groups(&mut archive, ChunkKind::Mob, &mobs, limit, |buf, fact| {
            buf.put_varint(fact.kills);
            buf.put_varint(fact.deaths);
        });

        let badges = self.group(badge_facts(provider, &self.directory, non_empty));
        chunks += write_groups(&mut archive, ChunkKind::PlayerBadge, &badges, limit, |buf, fact| {
            buf.put_varint(fact.value)
        });

        debug!(size = archive.len(), chunks, "encoded stats archive");
        #[cfg(feature = "metrics")]
        if let Some(metrics) = CodecMetrics::global() {
            metrics.record_encoded(archive.len());
        }
        archive
    }

    fn group<F: StatFact>(&self, facts: Vec<F>) -> NamespaceGroups<F> {
        group_by_identifier_namespace(facts, &self.directory)
    }

    /// Decode an archive into `target`.
    ///
    /// # Errors
    /// * `StatsError::TruncatedArchive` - If a length or field runs past the available bytes
    /// * `StatsError::OversizedField` - If a string or varint exceeds its ceiling
    pub fn decode<T: EditableStatsProvider + ?Sized>(&self, bytes: &[u8], target: &mut T) -> Result<()> {
        self.decode_with_report(bytes, target).map(|_| ())
    }

    /// Like [`StatsCodec::decode`], also reporting what was skipped or dropped.
    pub fn decode_with_report<T: EditableStatsProvider + ?Sized>(
        &self,
        bytes: &[u8],
        target: &mut T,
    ) -> Result<DecodeReport> {
        let mut staged = StagedWrites::default();
        let mut report = DecodeReport::default();

        if let Err(e) = self.read_archive(bytes, &mut staged, &mut report) {
            debug!(error = %e, size = bytes.len(), "rejected stats archive");
            #[cfg(feature = "metrics")]
            if let Some(metrics) = CodecMetrics::global() {
                metrics.record_decode_failure();
            }
            return Err(e);
        }

        report.applied_values = staged.apply(target);
        debug!(
            size = bytes.len(),
            chunks = report.chunks,
            skipped_chunks = report.skipped_chunks,
            dropped_records = report.dropped_records,
            "decoded stats archive"
        );
        #[cfg(feature = "metrics")]
        if let Some(metrics) = CodecMetrics::global() {
            metrics.record_decoded(bytes.len());
            metrics.record_dropped_records(report.dropped_records as u64);
        }
        Ok(report)
    }

    fn read_archive(
        &self,
        bytes: &[u8],
        staged: &mut StagedWrites,
        report: &mut DecodeReport,
    ) -> Result<()> {
        let mut reader = WireReader::new(bytes);
        while reader.has_remaining() {
            let declared = reader.get_i32_le()?;
            if declared < 0 {
                return Err(StatsError::TruncatedArchive {
                    expected: declared as u32 as usize,
                    actual: reader.remaining(),
                });
            }
            let mut chunk = reader.split_to(declared as usize)?;
            report.chunks += 1;

            let tag = chunk.get_utf("chunk kind", self.config.max_string_bytes)?;
            match ChunkKind::from_tag(&tag) {
                Some(ChunkKind::Metadata) => self.read_metadata(&mut chunk, staged)?,
                Some(kind) => self.read_records(kind, &mut chunk, staged, report)?,
                None => {
                    debug!(kind = %tag, size = declared, "skipping unknown chunk");
                    report.skipped_chunks += 1;
                    #[cfg(feature = "metrics")]
                    if let Some(metrics) = CodecMetrics::global() {
                        metrics.record_skipped_chunk();
                    }
                }
            }
        }
        Ok(())
    }

    fn read_metadata(&self, chunk: &mut WireReader<'_>, staged: &mut StagedWrites) -> Result<()> {
        let raw = chunk.get_utf("display name", self.config.max_rich_text_bytes)?;
        let name = RichText::from_json(&raw).unwrap_or_else(|e| {
            debug!(error = %e, "display name is not rich text, keeping it as plain text");
            RichText::literal(raw)
        });
        staged.display_name = Some(Some(name));

        // archives from before account fields existed stop here
        if chunk.remaining() < 2 {
            staged.identity = Some(None);
            return Ok(());
        }

        let id = if chunk.get_flag()? {
            Some(chunk.get_uuid()?)
        } else {
            None
        };
        let name = if chunk.get_flag()? {
            Some(chunk.get_utf("account name", self.config.max_string_bytes)?)
        } else {
            None
        };
        staged.identity = Some(AccountIdentity::new(id, name));
        Ok(())
    }

    fn read_records(
        &self,
        kind: ChunkKind,
        chunk: &mut WireReader<'_>,
        staged: &mut StagedWrites,
        report: &mut DecodeReport,
    ) -> Result<()> {
        let Some(category) = kind.category() else {
            return Ok(());
        };
        let width = kind.record_width();
        let limit = self.config.max_string_bytes;
        let mut values = [0i32; 6];

        while chunk.has_remaining() {
            let namespace = chunk.get_utf("namespace", limit)?;
            let count = chunk.get_varint()?;
            for _ in 0..count.max(0) {
                let path = chunk.get_utf("path", limit)?;
                for value in values.iter_mut().take(width) {
                    *value = chunk.get_varint()?.max(0);
                }
                match self.directory.resolve(&namespace, &path, category) {
                    Some(id) => staged.stage_record(kind, id, &values[..width]),
                    None => {
                        debug!(%namespace, %path, %category, "dropping record for unknown identifier");
                        report.dropped_records += 1;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Frame one chunk: tag plus payload in a scratch buffer, then length-prefixed
fn write_chunk<F>(archive: &mut Vec<u8>, kind: ChunkKind, body: F)
where
    F: FnOnce(&mut BytesMut),
{
    let mut scratch = BytesMut::new();
    scratch.put_utf(kind.tag());
    body(&mut scratch);
    archive.put_i32_le(scratch.len() as i32);
    archive.extend_from_slice(&scratch);
}

/// Write a record chunk unless there is nothing to write; returns chunks written.
///
/// Namespaces and paths longer than `limit` bytes are skipped with a warning.
fn write_groups<F, W>(
    archive: &mut Vec<u8>,
    kind: ChunkKind,
    groups: &NamespaceGroups<F>,
    limit: usize,
    write_fields: W,
) -> usize
where
    F: StatFact,
    W: Fn(&mut BytesMut, &F),
{
    let writable: Vec<(&str, Vec<&F>)> = groups
        .iter()
        .filter(|(namespace, _)| {
            let fits = namespace.len() <= limit;
            if !fits {
                warn!(%kind, %namespace, limit, "namespace too long to encode, skipping its records");
            }
            fits
        })
        .map(|(namespace, facts)| {
            let facts: Vec<&F> = facts
                .iter()
                .filter(|fact| {
                    let fits = fact.id().path().len() <= limit;
                    if !fits {
                        warn!(%kind, id = %fact.id(), limit, "path too long to encode, skipping record");
                    }
                    fits
                })
                .collect();
            (namespace, facts)
        })
        .filter(|(_, facts)| !facts.is_empty())
        .collect();

    if writable.is_empty() {
        return 0;
    }
    write_chunk(archive, kind, |buf| {
        for (namespace, facts) in &writable {
            buf.put_utf(namespace);
            buf.put_varint(facts.len() as i32);
            for fact in facts {
                buf.put_utf(fact.id().path());
                write_fields(buf, *fact);
            }
        }
    });
    1
}

fn write_metadata<P: StatsProvider + ?Sized>(buf: &mut BytesMut, provider: &P, config: &CodecConfig) {
    let name = provider
        .display_name()
        .cloned()
        .unwrap_or_else(|| RichText::literal(ABSENT_DISPLAY_NAME));
    let mut json = match name.to_json() {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "could not serialize display name, writing plain text");
            name.to_plain_string()
        }
    };
    if json.len() > config.max_rich_text_bytes {
        warn!(
            size = json.len(),
            limit = config.max_rich_text_bytes,
            "display name too long to encode, writing it as absent"
        );
        json = absent_name_json();
    }
    buf.put_utf(&json);

    match provider.identity() {
        Some(identity) => {
            match &identity.id {
                Some(id) => {
                    buf.put_flag(true);
                    buf.put_uuid(id);
                }
                None => buf.put_flag(false),
            }
            match &identity.name {
                Some(name) if name.len() > config.max_string_bytes => {
                    warn!(
                        size = name.len(),
                        limit = config.max_string_bytes,
                        "account name too long to encode, leaving it out"
                    );
                    buf.put_flag(false);
                }
                Some(name) => {
                    buf.put_flag(true);
                    buf.put_utf(name);
                }
                None => buf.put_flag(false),
            }
        }
        None => {
            buf.put_flag(false);
            buf.put_flag(false);
        }
    }
}

fn absent_name_json() -> String {
    let name = RichText::literal(ABSENT_DISPLAY_NAME);
    name.to_json().unwrap_or_else(|_| name.to_plain_string())
}

/// Encode with the default configuration
pub fn encode<P, D>(provider: &P, directory: &D) -> Vec<u8>
where
    P: StatsProvider + ?Sized,
    D: IdentifierDirectory + ?Sized,
{
    StatsCodec::new(directory).encode(provider)
}

/// Decode with the default configuration
pub fn decode<T, D>(bytes: &[u8], target: &mut T, directory: &D) -> Result<()>
where
    T: EditableStatsProvider + ?Sized,
    D: IdentifierDirectory + ?Sized,
{
    StatsCodec::new(directory).decode(bytes, target)
}
