/*!
Statsnap CLI - command-line tooling for statistics snapshots.

Inspect, verify, export and import sealed snapshot files. The identifier
directory used to resolve statistics is loaded from a JSON manifest.
*/

mod dump;

use clap::{Parser, Subcommand};
use dump::StatsDump;
use statsnap_core::{
    badge_facts, create_local_engine, general_facts, item_facts, mob_facts, non_empty,
    CodecConfig, Identifier, IdentifierDirectory, LocalFileStore, SnapshotEngine, StatCategory,
    StaticDirectory, StatsError, StatsProvider, StatsSummary, StoreConfig,
};
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "statsnap")]
#[command(about = "CLI for statistics snapshot files")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Identifier directory manifest (JSON)
    #[arg(short, long, global = true, env = "STATSNAP_DIRECTORY")]
    directory: Option<PathBuf>,

    /// Base directory snapshot paths are resolved against
    #[arg(short, long, global = true, env = "STATSNAP_BASE_DIR")]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show header, owner, totals and non-empty statistics of a snapshot
    Inspect {
        /// Snapshot path
        snapshot: String,
    },
    /// Verify integrity and structure of a snapshot
    Verify {
        /// Snapshot path
        snapshot: String,
    },
    /// Print a snapshot's statistics as JSON
    Export {
        /// Snapshot path
        snapshot: String,
        /// Pretty-print the JSON
        #[arg(short, long)]
        pretty: bool,
    },
    /// Build a snapshot from a JSON statistics dump
    Import {
        /// JSON dump, as produced by `export`
        json: PathBuf,
        /// Snapshot path to write
        snapshot: String,
    },
    /// List snapshot files in the base directory
    List,
    /// Delete a snapshot
    Delete {
        /// Snapshot path
        snapshot: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Category")]
    category: &'static str,
    #[tabled(rename = "Identifier")]
    id: String,
    #[tabled(rename = "Values")]
    values: String,
}

#[derive(Tabled)]
struct SnapshotRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Size")]
    size: String,
}

type Engine = SnapshotEngine<LocalFileStore, StaticDirectory>;

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let engine = create_engine(&cli)?;

    match cli.command {
        Commands::Inspect { snapshot } => inspect_snapshot(&engine, &snapshot)?,
        Commands::Verify { snapshot } => verify_snapshot(&engine, &snapshot)?,
        Commands::Export { snapshot, pretty } => export_snapshot(&engine, &snapshot, pretty)?,
        Commands::Import { json, snapshot } => import_snapshot(&engine, &json, &snapshot)?,
        Commands::List => list_snapshots(&engine)?,
        Commands::Delete { snapshot, force } => delete_snapshot(&engine, &snapshot, force)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"))
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn create_engine(cli: &Cli) -> Result<Engine, anyhow::Error> {
    let directory = match &cli.directory {
        Some(path) => StaticDirectory::load(path)?,
        None => {
            warn!("No identifier directory given; every statistic will be treated as unknown");
            StaticDirectory::new()
        }
    };
    let store_config = StoreConfig {
        base_dir: cli.base_dir.clone(),
    };
    Ok(create_local_engine(
        directory,
        store_config,
        CodecConfig::from_env()?,
    )?)
}

fn inspect_snapshot(engine: &Engine, snapshot: &str) -> Result<(), anyhow::Error> {
    info!("Inspecting snapshot: {}", snapshot);

    let (header, stats) = engine.restore(snapshot)?;
    let directory = engine.codec().directory();

    println!("Snapshot Details:");
    println!("  Path: {snapshot}");
    println!("  Format Version: {}", header.format_version);
    println!("  Created: {}", format_timestamp(header.created_at));
    println!("  Archive Size: {}", format_size(header.archive_size as u64));
    println!("  Content Hash: {}", header.content_hash);

    let name = stats
        .display_name()
        .map(|name| name.to_plain_string())
        .unwrap_or_else(|| "-".to_string());
    println!("  Display Name: {name}");
    if let Some(identity) = stats.identity() {
        let id = identity.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
        let account = identity.name.as_deref().unwrap_or("-");
        println!("  Account: {account} ({id})");
    }

    let summary = StatsSummary::collect(&stats, directory);
    println!("Totals:");
    println!(
        "  Mined {}, Crafted {}, Used {}, Broken {}, Picked Up {}, Dropped {}",
        summary.mined,
        summary.crafted,
        summary.used,
        summary.broken,
        summary.picked_up,
        summary.dropped
    );
    println!("  Kills {}, Deaths {}", summary.kills, summary.deaths);

    let rows = stat_rows(&stats, directory);
    if rows.is_empty() {
        println!("No statistics recorded");
    } else {
        println!("{}", Table::new(rows));
    }
    Ok(())
}

fn stat_rows<P, D>(stats: &P, directory: &D) -> Vec<StatRow>
where
    P: StatsProvider,
    D: IdentifierDirectory,
{
    let mut rows = Vec::new();
    for fact in general_facts(stats, directory, non_empty) {
        rows.push(StatRow {
            category: "general",
            id: fact.id.to_string(),
            values: fact.value_text,
        });
    }
    for fact in item_facts(stats, directory, non_empty) {
        rows.push(StatRow {
            category: "item",
            id: fact.id.to_string(),
            values: format!(
                "mined {} crafted {} used {} broken {} picked up {} dropped {}",
                fact.mined, fact.crafted, fact.used, fact.broken, fact.picked_up, fact.dropped
            ),
        });
    }
    for fact in mob_facts(stats, directory, non_empty) {
        rows.push(StatRow {
            category: "mob",
            id: fact.id.to_string(),
            values: format!("kills {} deaths {}", fact.kills, fact.deaths),
        });
    }
    for fact in badge_facts(stats, directory, non_empty) {
        rows.push(StatRow {
            category: "player_badge",
            id: fact.id.to_string(),
            values: fact.value.to_string(),
        });
    }
    rows
}

fn verify_snapshot(engine: &Engine, snapshot: &str) -> Result<(), anyhow::Error> {
    info!("Verifying snapshot: {}", snapshot);

    match engine.verify_snapshot(snapshot) {
        Ok((header, report)) => {
            println!("✓ Snapshot is valid and integrity check passed");
            println!("  Format Version: {}", header.format_version);
            println!("  Chunks: {}", report.chunks);
            if report.skipped_chunks > 0 {
                println!("  Unknown chunks skipped: {}", report.skipped_chunks);
            }
            if report.dropped_records > 0 {
                println!(
                    "  Records not in the directory: {}",
                    report.dropped_records
                );
            }
        }
        Err(StatsError::IntegrityCheckFailed { expected, actual }) => {
            error!("✗ Integrity check failed:");
            error!("  Expected hash: {}", expected);
            error!("  Actual hash: {}", actual);
            return Err(anyhow::anyhow!("Integrity check failed"));
        }
        Err(e) => {
            error!("✗ Failed to verify snapshot: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}

fn export_snapshot(engine: &Engine, snapshot: &str, pretty: bool) -> Result<(), anyhow::Error> {
    let (_, stats) = engine.restore(snapshot)?;
    let dump = StatsDump::from_provider(&stats, engine.codec().directory());
    let json = if pretty {
        serde_json::to_string_pretty(&dump)?
    } else {
        serde_json::to_string(&dump)?
    };
    println!("{json}");
    Ok(())
}

fn import_snapshot(engine: &Engine, json_path: &Path, snapshot: &str) -> Result<(), anyhow::Error> {
    let raw = std::fs::read_to_string(json_path)?;
    let dump: StatsDump = serde_json::from_str(&raw)?;

    let directory = engine.codec().directory();
    for text in dump.identifiers() {
        let known = text.parse::<Identifier>().is_ok_and(|id| {
            StatCategory::ALL
                .iter()
                .any(|category| directory.resolve(id.namespace(), id.path(), *category).is_some())
        });
        if !known {
            warn!("{} is not in the directory and will not be written", text);
        }
    }

    let stats = dump.into_provider()?;
    let header = engine.save_snapshot(&stats, snapshot)?;
    println!("✓ Snapshot written to {snapshot}");
    println!("  Content Hash: {}", header.content_hash);
    Ok(())
}

fn list_snapshots(engine: &Engine) -> Result<(), anyhow::Error> {
    let base = engine
        .store()
        .base_dir()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    if !base.exists() {
        println!("No snapshots directory found at: {}", base.display());
        return Ok(());
    }

    let mut snapshots = Vec::new();
    for entry in std::fs::read_dir(&base)? {
        let file_path = entry?.path();
        if !file_path.is_file() {
            continue;
        }
        let name = file_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        // entries are direct children of the base directory
        match engine.snapshot_header(&name) {
            Ok(header) => snapshots.push(SnapshotRow {
                file: name.clone(),
                version: header.format_version.to_string(),
                created: format_timestamp(header.created_at),
                size: format_size(header.archive_size as u64),
            }),
            Err(StatsError::InvalidFormat(_)) => {}
            Err(e) => warn!("Failed to read header of {}: {}", file_path.display(), e),
        }
    }

    if snapshots.is_empty() {
        println!("No snapshots found");
    } else {
        snapshots.sort_by(|a, b| a.created.cmp(&b.created));
        println!("{}", Table::new(snapshots));
    }
    Ok(())
}

fn delete_snapshot(engine: &Engine, snapshot: &str, force: bool) -> Result<(), anyhow::Error> {
    if !engine.snapshot_exists(snapshot) {
        return Err(anyhow::anyhow!("No snapshot at {snapshot}"));
    }
    if !force {
        print!("Are you sure you want to delete snapshot '{snapshot}'? (y/N): ");
        use std::io::{self, Write};
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().to_lowercase().starts_with('y') {
            println!("Deletion cancelled");
            return Ok(());
        }
    }

    engine.delete_snapshot(snapshot)?;
    println!("✓ Snapshot deleted successfully");
    Ok(())
}

fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

fn format_timestamp(timestamp: chrono::DateTime<chrono::Utc>) -> String {
    timestamp
        .with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_stat_rows_skip_empty_facts() {
        use statsnap_core::{CounterKind, EditableStatsProvider, RamStatsProvider, StatKey};

        let directory = StaticDirectory::new()
            .with(StatCategory::Item, &["minecraft:dirt", "minecraft:stone"])
            .unwrap();
        let mut stats = RamStatsProvider::new();
        stats.set_counter(
            StatKey::new(CounterKind::Broken, "minecraft:stone".parse().unwrap()),
            2,
        );
        let rows = stat_rows(&stats, &directory);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "minecraft:stone");
        assert!(rows[0].values.contains("broken 2"));
    }

    #[test]
    fn test_import_then_export() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let directory = StaticDirectory::new()
            .with(StatCategory::General, &["minecraft:jump"])
            .unwrap();
        let engine = create_local_engine(
            directory,
            StoreConfig::with_base_dir(temp_dir.path()),
            CodecConfig::default(),
        )
        .unwrap();

        let json_path = temp_dir.path().join("dump.json");
        std::fs::write(&json_path, r#"{"general": {"minecraft:jump": 9}}"#).unwrap();
        import_snapshot(&engine, &json_path, "steve.stsn").unwrap();

        let (_, stats) = engine.restore("steve.stsn").unwrap();
        let dump = StatsDump::from_provider(&stats, engine.codec().directory());
        assert_eq!(dump.general.get("minecraft:jump"), Some(&9));
    }
}
