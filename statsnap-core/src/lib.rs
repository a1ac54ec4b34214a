/*!
# Statsnap Core Engine

Persisted statistics snapshots for game-style counters.

This crate captures an owner's accumulated statistics (general counters,
per-item action counts, per-mob kills and deaths, badge counters) behind a
uniform provider abstraction and serializes them to a compact, chunked,
forward-compatible binary archive.

- Stats providers with read-only and editable realizations
- An aggregation layer producing grouped, filterable stat facts
- A chunked binary codec with staged, all-or-nothing decoding
- A versioned, hashed snapshot envelope and local file storage

## Architecture

The identifier directory that maps symbolic identifiers to known
statistics is an injected collaborator, never global state. Storage is an
adapter behind [`SnapshotStore`].

## Usage

```rust
use statsnap_core::{
    decode, encode, CounterKind, EditableStatsProvider, RamStatsProvider, StatCategory,
    StatKey, StaticDirectory, StatsProvider,
};

let directory = StaticDirectory::new().with(StatCategory::Item, &["core:dirt"])?;

let mut stats = RamStatsProvider::new();
stats.set_counter(StatKey::new(CounterKind::Mined, "core:dirt".parse()?), 5);

let archive = encode(&stats, &directory);

let mut restored = RamStatsProvider::new();
decode(&archive, &mut restored, &directory)?;
assert_eq!(restored.counter_of(CounterKind::Mined, &"core:dirt".parse()?), 5);
# Ok::<(), statsnap_core::StatsError>(())
```
*/

pub mod codec;
pub mod config;
pub mod directory;
pub mod envelope;
pub mod error;
pub mod facts;
pub mod identifier;
pub mod observability;
pub mod provider;
pub mod snapshot;
pub mod store;
pub mod text;
pub mod wire;

#[cfg(test)]
mod envelope_tests;

pub use codec::{decode, encode, ChunkKind, DecodeReport, StatsCodec};
pub use config::{CodecConfig, StoreConfig};
pub use directory::{DirectoryManifest, IdentifierDirectory, StatFormat, StaticDirectory};
pub use envelope::{read_envelope, write_envelope, SnapshotHeader};
pub use error::{Result, StatsError};
pub use facts::{
    any_fact, badge_facts, badge_facts_by_namespace, general_facts, general_facts_by_namespace,
    group_by_identifier_namespace, group_by_namespace, item_facts, item_facts_by_namespace,
    mob_facts, mob_facts_by_namespace, non_empty, BadgeFact, GeneralFact, ItemFact, MobFact, NamespaceGroups, StatFact, StatsSummary,
};
pub use identifier::{CounterKind, Identifier, StatCategory, StatKey, DEFAULT_NAMESPACE};
pub use observability::init_observability;
pub use provider::{
    AccountIdentity, CounterStore, EditableStatsProvider, EmptyStatsProvider, LiveStatsProvider,
    RamStatsProvider, StatsProvider,
};
pub use snapshot::{create_local_engine, SnapshotEngine};
pub use store::{LocalFileStore, MemoryStore, SnapshotStore};
pub use text::RichText;
