/*!
End-to-end tests: provider to archive to file and back.
*/

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statsnap_core::{
    create_local_engine, item_facts_by_namespace, non_empty, AccountIdentity, CodecConfig,
    CounterKind, CounterStore, EditableStatsProvider, EmptyStatsProvider, Identifier,
    LiveStatsProvider, RamStatsProvider, RichText, StatCategory, StatKey, StaticDirectory,
    StatsCodec, StatsError, StatsProvider, StatsSummary, StoreConfig,
};
use tempfile::TempDir;
use uuid::Uuid;

const DIRECTORY_JSON: &str = r#"{
    "general": ["minecraft:jump", "minecraft:walk_one_cm", "minecraft:play_time", "create:wrench_uses"],
    "item": ["minecraft:dirt", "minecraft:stone", "minecraft:diamond_pickaxe", "create:cogwheel", "create:shaft"],
    "mob": ["minecraft:zombie", "minecraft:creeper", "alexsmobs:crocodile"],
    "player_badge": ["badges:first_login", "badges:speedrunner"],
    "formats": {"minecraft:walk_one_cm": "distance", "minecraft:play_time": "time"}
}"#;

fn directory() -> StaticDirectory {
    StaticDirectory::from_json_str(DIRECTORY_JSON).unwrap()
}

fn id(s: &str) -> Identifier {
    s.parse().unwrap()
}

fn random_provider(rng: &mut StdRng, directory: &StaticDirectory) -> RamStatsProvider {
    use statsnap_core::IdentifierDirectory;

    let mut provider = RamStatsProvider::new()
        .with_display_name(RichText::literal("Random").with_color("green"))
        .with_identity(AccountIdentity::named(Uuid::new_v4(), "random"));

    for id in directory.iterate(StatCategory::General) {
        if rng.gen_bool(0.5) {
            provider.set_counter(StatKey::custom(id), rng.gen_range(1..=i32::MAX));
        }
    }
    for id in directory.iterate(StatCategory::Item) {
        for kind in CounterKind::ITEM {
            if rng.gen_bool(0.3) {
                provider.set_counter(StatKey::new(kind, id.clone()), rng.gen_range(1..100_000));
            }
        }
    }
    for id in directory.iterate(StatCategory::Mob) {
        for kind in CounterKind::MOB {
            if rng.gen_bool(0.4) {
                provider.set_counter(StatKey::new(kind, id.clone()), rng.gen_range(1..500));
            }
        }
    }
    for id in directory.iterate(StatCategory::PlayerBadge) {
        if rng.gen_bool(0.5) {
            provider.set_badge_counter(id, rng.gen_range(1..10));
        }
    }
    provider
}

#[test]
fn test_randomized_round_trips() {
    let directory = directory();
    let codec = StatsCodec::new(&directory);
    let mut rng = StdRng::seed_from_u64(0x5747_534e);

    for _ in 0..50 {
        let source = random_provider(&mut rng, &directory);
        let archive = codec.encode(&source);
        assert_eq!(archive, codec.encode(&source));

        let mut target = RamStatsProvider::new();
        codec.decode(&archive, &mut target).unwrap();
        assert_eq!(target.store(), source.store());
        assert_eq!(target.identity(), source.identity());
    }
}

#[test]
fn test_every_truncation_point_fails_cleanly() {
    let directory = directory();
    let codec = StatsCodec::new(&directory);
    let mut rng = StdRng::seed_from_u64(7);
    let archive = codec.encode(&random_provider(&mut rng, &directory));

    // cutting exactly between frames leaves a shorter but valid archive
    let mut boundaries = Vec::new();
    let mut offset = 0;
    while offset < archive.len() {
        let mut prefix = [0u8; 4];
        prefix.copy_from_slice(&archive[offset..offset + 4]);
        offset += 4 + i32::from_le_bytes(prefix) as usize;
        boundaries.push(offset);
    }

    for cut in (1..archive.len()).filter(|cut| !boundaries.contains(cut)) {
        let mut target = RamStatsProvider::new();
        match codec.decode(&archive[..cut], &mut target) {
            Err(StatsError::TruncatedArchive { .. }) | Err(StatsError::OversizedField { .. }) => {}
            other => panic!("cut at {cut} gave {other:?}"),
        }
        assert_eq!(target, RamStatsProvider::new(), "cut at {cut} mutated target");
    }
}

#[test]
fn test_live_session_snapshot_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let engine = create_local_engine(
        directory(),
        StoreConfig::with_base_dir(temp_dir.path()),
        CodecConfig::default(),
    )
    .unwrap();

    // a session's live counters
    let mut live = CounterStore::new();
    live.increment(StatKey::new(CounterKind::Mined, id("minecraft:stone")), 320);
    live.increment(StatKey::new(CounterKind::Crafted, id("create:cogwheel")), 16);
    live.increment(StatKey::new(CounterKind::KilledBy, id("minecraft:creeper")), 2);
    live.increment(StatKey::custom(id("minecraft:play_time")), 72_000);
    live.set_badge(id("badges:first_login"), 1);

    let owner = Uuid::new_v4();
    let view = LiveStatsProvider::new(
        &live,
        Some(RichText::literal("Steve")),
        Some(AccountIdentity::named(owner, "steve")),
    );

    let header = engine.save_snapshot(&view, "players/steve.stsn").unwrap();
    assert!(temp_dir.path().join("players/steve.stsn").is_file());
    assert_eq!(header.format_version, 2);

    let (loaded, restored) = engine.restore("players/steve.stsn").unwrap();
    assert_eq!(loaded, header);
    assert_eq!(restored.store(), &live);
    assert_eq!(restored.identity().and_then(|i| i.id), Some(owner));

    let summary = StatsSummary::collect(&restored, engine.codec().directory());
    assert_eq!(summary.mined, 320);
    assert_eq!(summary.crafted, 16);
    assert_eq!(summary.deaths, 2);
    assert_eq!(summary.badge_entries, 1);

    engine.delete_snapshot("players/steve.stsn").unwrap();
    assert!(!engine.snapshot_exists("players/steve.stsn"));
}

#[test]
fn test_modded_namespaces_group_after_default() {
    let directory = directory();
    let mut provider = RamStatsProvider::new();
    provider.set_counter(StatKey::new(CounterKind::Used, id("create:shaft")), 4);
    provider.set_counter(StatKey::new(CounterKind::Used, id("minecraft:dirt")), 1);
    provider.set_counter(StatKey::new(CounterKind::Used, id("create:cogwheel")), 2);

    let groups = item_facts_by_namespace(&provider, &directory, non_empty);
    assert_eq!(groups.namespaces(), vec!["minecraft", "create"]);
    let create: Vec<&str> = groups
        .get("create")
        .unwrap()
        .iter()
        .map(|fact| fact.id.path())
        .collect();
    assert_eq!(create, vec!["cogwheel", "shaft"]);
}

#[test]
fn test_importing_into_existing_provider_overrides_listed_counters() {
    let directory = directory();
    let codec = StatsCodec::new(&directory);

    let mut incoming = RamStatsProvider::new().with_display_name("Alex");
    incoming.set_counter(StatKey::custom(id("minecraft:jump")), 10);

    let mut existing = RamStatsProvider::new();
    existing.set_counter(StatKey::custom(id("minecraft:jump")), 99);
    existing.set_counter(StatKey::new(CounterKind::Killed, id("minecraft:zombie")), 5);

    codec.decode(&codec.encode(&incoming), &mut existing).unwrap();
    assert_eq!(existing.counter(&StatKey::custom(id("minecraft:jump"))), 10);
    // counters not present in the archive are left alone
    assert_eq!(
        existing.counter_of(CounterKind::Killed, &id("minecraft:zombie")),
        5
    );
}

#[test]
fn test_empty_provider_snapshot() {
    let directory = directory();
    let codec = StatsCodec::new(&directory);
    let archive = codec.encode(&EmptyStatsProvider::new());

    let mut target = RamStatsProvider::new();
    codec.decode(&archive, &mut target).unwrap();
    assert_eq!(target.display_name().unwrap().to_plain_string(), "null");
    assert_eq!(
        target.identity(),
        Some(&AccountIdentity::named(Uuid::nil(), "null"))
    );
    assert!(target.store().is_empty());
}
