/*!
The identifier directory: the host-supplied registry of known statistics.

The core only ever queries a directory. Hosts plug in their live registries
by implementing [`IdentifierDirectory`]; [`StaticDirectory`] is an in-memory
realization used by tooling and tests, loadable from a JSON manifest.
*/

use crate::identifier::{Identifier, StatCategory, DEFAULT_NAMESPACE};
use crate::{Result, StatsError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// How a general statistic's raw value is rendered for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatFormat {
    /// Grouped integer, e.g. `1,234`
    #[default]
    Plain,
    /// Centimetres, scaled to m or km
    Distance,
    /// Game ticks (20 per second), scaled up to years
    Time,
    /// Tenths, rendered with two decimals
    DivideByTen,
}

impl StatFormat {
    pub fn format(&self, value: i32) -> String {
        match self {
            StatFormat::Plain => group_thousands(value),
            StatFormat::DivideByTen => format!("{:.2}", f64::from(value) * 0.1),
            StatFormat::Distance => {
                let metres = f64::from(value) / 100.0;
                let kilometres = metres / 1000.0;
                if kilometres > 0.5 {
                    format!("{kilometres:.2} km")
                } else if metres > 0.5 {
                    format!("{metres:.2} m")
                } else {
                    format!("{value} cm")
                }
            }
            StatFormat::Time => {
                let seconds = f64::from(value) / 20.0;
                let minutes = seconds / 60.0;
                let hours = minutes / 60.0;
                let days = hours / 24.0;
                let years = days / 365.0;
                if years > 0.5 {
                    format!("{years:.2} y")
                } else if days > 0.5 {
                    format!("{days:.2} d")
                } else if hours > 0.5 {
                    format!("{hours:.2} h")
                } else if minutes > 0.5 {
                    format!("{minutes:.2} min")
                } else {
                    format!("{seconds:.2} s")
                }
            }
        }
    }
}

fn group_thousands(value: i32) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Registry of identifiers known to the host, per statistic category.
///
/// Iteration order must be stable for the lifetime of the process; encoding
/// the same provider twice relies on it to produce identical bytes.
#[cfg_attr(test, mockall::automock)]
pub trait IdentifierDirectory {
    /// Look up a decoded `(namespace, path)` pair; `None` if unknown
    fn resolve(&self, namespace: &str, path: &str, category: StatCategory) -> Option<Identifier>;

    /// All identifiers of a category in the directory's natural order
    fn iterate(&self, category: StatCategory) -> Vec<Identifier>;

    /// Namespace an identifier's facts are listed under.
    ///
    /// Only affects views; archives always group by [`Identifier::namespace`].
    fn namespace_of(&self, id: &Identifier) -> String {
        id.namespace().to_string()
    }

    /// Localized display text used to order general statistics
    fn display_text(&self, id: &Identifier, category: StatCategory) -> String {
        id.to_translation_key(translation_prefix(category))
    }

    /// Display format of a general statistic
    fn format_of(&self, _id: &Identifier) -> StatFormat {
        StatFormat::Plain
    }

    /// Namespace that is always listed first when grouping
    fn default_namespace(&self) -> String {
        DEFAULT_NAMESPACE.to_string()
    }
}

impl<D: IdentifierDirectory + ?Sized> IdentifierDirectory for &D {
    fn resolve(&self, namespace: &str, path: &str, category: StatCategory) -> Option<Identifier> {
        (**self).resolve(namespace, path, category)
    }

    fn iterate(&self, category: StatCategory) -> Vec<Identifier> {
        (**self).iterate(category)
    }

    fn namespace_of(&self, id: &Identifier) -> String {
        (**self).namespace_of(id)
    }

    fn display_text(&self, id: &Identifier, category: StatCategory) -> String {
        (**self).display_text(id, category)
    }

    fn format_of(&self, id: &Identifier) -> StatFormat {
        (**self).format_of(id)
    }

    fn default_namespace(&self) -> String {
        (**self).default_namespace()
    }
}

fn translation_prefix(category: StatCategory) -> &'static str {
    match category {
        StatCategory::General => "stat",
        StatCategory::Item => "item",
        StatCategory::Mob => "entity",
        StatCategory::PlayerBadge => "badge",
    }
}

/// Serializable description of a [`StaticDirectory`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_namespace: Option<String>,
    #[serde(default)]
    pub general: Vec<Identifier>,
    #[serde(default)]
    pub item: Vec<Identifier>,
    #[serde(default)]
    pub mob: Vec<Identifier>,
    #[serde(default)]
    pub player_badge: Vec<Identifier>,
    #[serde(default)]
    pub formats: HashMap<Identifier, StatFormat>,
    #[serde(default)]
    pub names: HashMap<Identifier, String>,
}

/// In-memory directory with a fixed registration order.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    default_namespace: Option<String>,
    entries: HashMap<StatCategory, Vec<Identifier>>,
    known: HashSet<(StatCategory, Identifier)>,
    formats: HashMap<Identifier, StatFormat>,
    names: HashMap<Identifier, String>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identifier; re-registering is a no-op that keeps the first position
    pub fn register(&mut self, category: StatCategory, id: Identifier) -> &mut Self {
        if self.known.insert((category, id.clone())) {
            self.entries.entry(category).or_default().push(id);
        }
        self
    }

    /// Parse and register an identifier in one step
    ///
    /// # Errors
    /// * `StatsError::InvalidArgument` - If the identifier is blank
    pub fn register_str(&mut self, category: StatCategory, id: &str) -> Result<&mut Self> {
        let id = id.parse()?;
        Ok(self.register(category, id))
    }

    /// Builder-style registration, mostly for tests and fixtures
    pub fn with(mut self, category: StatCategory, ids: &[&str]) -> Result<Self> {
        for id in ids {
            self.register_str(category, id)?;
        }
        Ok(self)
    }

    pub fn set_format(&mut self, id: Identifier, format: StatFormat) -> &mut Self {
        self.formats.insert(id, format);
        self
    }

    pub fn set_name<S: Into<String>>(&mut self, id: Identifier, name: S) -> &mut Self {
        self.names.insert(id, name.into());
        self
    }

    pub fn set_default_namespace<S: Into<String>>(&mut self, namespace: S) -> &mut Self {
        self.default_namespace = Some(namespace.into());
        self
    }

    pub fn len(&self, category: StatCategory) -> usize {
        self.entries.get(&category).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    pub fn from_manifest(manifest: DirectoryManifest) -> Self {
        let mut directory = Self::new();
        if let Some(namespace) = manifest.default_namespace {
            directory.set_default_namespace(namespace);
        }
        let lists = [
            (StatCategory::General, manifest.general),
            (StatCategory::Item, manifest.item),
            (StatCategory::Mob, manifest.mob),
            (StatCategory::PlayerBadge, manifest.player_badge),
        ];
        for (category, ids) in lists {
            for id in ids {
                directory.register(category, id);
            }
        }
        directory.formats = manifest.formats;
        directory.names = manifest.names;
        directory
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let manifest: DirectoryManifest = serde_json::from_str(json)?;
        Ok(Self::from_manifest(manifest))
    }

    /// Load a directory manifest from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            StatsError::storage(format!(
                "Failed to read directory manifest {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&json)
    }
}

impl IdentifierDirectory for StaticDirectory {
    fn resolve(&self, namespace: &str, path: &str, category: StatCategory) -> Option<Identifier> {
        let id = Identifier::new(namespace, path).ok()?;
        if self.known.contains(&(category, id.clone())) {
            Some(id)
        } else {
            None
        }
    }

    fn iterate(&self, category: StatCategory) -> Vec<Identifier> {
        self.entries.get(&category).cloned().unwrap_or_default()
    }

    fn display_text(&self, id: &Identifier, category: StatCategory) -> String {
        match self.names.get(id) {
            Some(name) => name.clone(),
            None => id.to_translation_key(translation_prefix(category)),
        }
    }

    fn format_of(&self, id: &Identifier) -> StatFormat {
        self.formats.get(id).copied().unwrap_or_default()
    }

    fn default_namespace(&self) -> String {
        self.default_namespace
            .clone()
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_keeps_first_position() {
        let directory = StaticDirectory::new()
            .with(StatCategory::Item, &["core:dirt", "core:stone", "core:dirt"])
            .unwrap();
        let ids: Vec<String> = directory
            .iterate(StatCategory::Item)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(ids, vec!["core:dirt", "core:stone"]);
        assert_eq!(directory.len(StatCategory::Item), 2);
    }

    #[test]
    fn test_resolve_is_per_category() {
        let directory = StaticDirectory::new()
            .with(StatCategory::Item, &["core:dirt"])
            .unwrap();
        assert!(directory
            .resolve("core", "dirt", StatCategory::Item)
            .is_some());
        assert!(directory.resolve("core", "dirt", StatCategory::Mob).is_none());
        assert!(directory.resolve("", "dirt", StatCategory::Item).is_none());
    }

    #[test]
    fn test_manifest_loading() {
        let json = r#"{
            "default_namespace": "core",
            "general": ["core:walk_one_cm", "core:jump"],
            "mob": ["core:zombie"],
            "formats": {"core:walk_one_cm": "distance"},
            "names": {"core:jump": "Jumps"}
        }"#;
        let directory = StaticDirectory::from_json_str(json).unwrap();
        let walk: Identifier = "core:walk_one_cm".parse().unwrap();
        let jump: Identifier = "core:jump".parse().unwrap();

        assert_eq!(directory.default_namespace(), "core");
        assert_eq!(directory.format_of(&walk), StatFormat::Distance);
        assert_eq!(directory.format_of(&jump), StatFormat::Plain);
        assert_eq!(directory.display_text(&jump, StatCategory::General), "Jumps");
        assert_eq!(
            directory.display_text(&walk, StatCategory::General),
            "stat.core.walk_one_cm"
        );
        assert_eq!(directory.iterate(StatCategory::Mob).len(), 1);
        assert!(directory.iterate(StatCategory::PlayerBadge).is_empty());
    }

    #[test]
    fn test_manifest_rejects_blank_identifier() {
        assert!(StaticDirectory::from_json_str(r#"{"item": [":dirt"]}"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("directory.json");
        std::fs::write(&path, r#"{"item": ["core:dirt"]}"#).unwrap();

        let directory = StaticDirectory::load(&path).unwrap();
        assert_eq!(directory.len(StatCategory::Item), 1);
        assert!(StaticDirectory::load(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_plain_format_groups_thousands() {
        assert_eq!(StatFormat::Plain.format(0), "0");
        assert_eq!(StatFormat::Plain.format(999), "999");
        assert_eq!(StatFormat::Plain.format(1234), "1,234");
        assert_eq!(StatFormat::Plain.format(1_234_567), "1,234,567");
    }

    #[test]
    fn test_scaled_formats() {
        assert_eq!(StatFormat::DivideByTen.format(123), "12.30");
        assert_eq!(StatFormat::Distance.format(40), "40 cm");
        assert_eq!(StatFormat::Distance.format(250), "2.50 m");
        assert_eq!(StatFormat::Distance.format(150_000), "1.50 km");
        assert_eq!(StatFormat::Time.format(200), "10.00 s");
        assert_eq!(StatFormat::Time.format(20 * 60 * 90), "1.50 h");
    }

    #[test]
    fn test_reference_forwards() {
        let directory = StaticDirectory::new()
            .with(StatCategory::Mob, &["core:zombie"])
            .unwrap();
        let by_ref: &StaticDirectory = &directory;
        assert_eq!(
            IdentifierDirectory::iterate(&by_ref, StatCategory::Mob).len(),
            1
        );
    }
}
