/*!
Namespaced identifiers and the keys that address individual counters.
*/

use crate::{Result, StatsError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Namespace assumed when an identifier is written without one.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Namespace and path of the reserved null identifier.
const NULL_PART: &str = "null";

/// A `namespace:path` pair naming one statistic target.
///
/// The namespace groups identifiers by the content source that registered
/// them. Both halves are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier {
    namespace: String,
    path: String,
}

impl Identifier {
    /// Create an identifier from its two halves
    ///
    /// # Errors
    /// * `StatsError::InvalidArgument` - If either half is empty
    /// * `StatsError::InvalidArgument` - If the namespace contains `:`
    ///
    /// # Example
    /// ```rust
    /// use statsnap_core::Identifier;
    ///
    /// let id = Identifier::new("core", "dirt")?;
    /// assert_eq!(id.to_string(), "core:dirt");
    /// # Ok::<(), statsnap_core::StatsError>(())
    /// ```
    pub fn new<N, P>(namespace: N, path: P) -> Result<Self>
    where
        N: Into<String>,
        P: Into<String>,
    {
        let namespace = namespace.into();
        let path = path.into();
        if namespace.is_empty() {
            return Err(StatsError::invalid_argument("identifier namespace is empty"));
        }
        if path.is_empty() {
            return Err(StatsError::invalid_argument("identifier path is empty"));
        }
        if namespace.contains(':') {
            return Err(StatsError::invalid_argument(format!(
                "identifier namespace {namespace:?} contains ':'"
            )));
        }
        Ok(Self { namespace, path })
    }

    /// Create an identifier in the default namespace
    pub fn with_default_namespace<P: Into<String>>(path: P) -> Result<Self> {
        Self::new(DEFAULT_NAMESPACE, path)
    }

    /// The reserved sentinel standing in for an unresolvable identifier
    pub fn null() -> Self {
        Self {
            namespace: NULL_PART.to_string(),
            path: NULL_PART.to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.namespace == NULL_PART && self.path == NULL_PART
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Translation-key style rendering, e.g. `stat.minecraft.jump`
    pub fn to_translation_key(&self, prefix: &str) -> String {
        format!("{prefix}.{}.{}", self.namespace, self.path)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for Identifier {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((namespace, path)) => Self::new(namespace, path),
            None => Self::with_default_namespace(s),
        }
    }
}

impl TryFrom<String> for Identifier {
    type Error = StatsError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.to_string()
    }
}

/// Category of a statistic; determines the shape of its fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatCategory {
    General,
    Item,
    Mob,
    PlayerBadge,
}

impl StatCategory {
    pub const ALL: [StatCategory; 4] = [
        StatCategory::General,
        StatCategory::Item,
        StatCategory::Mob,
        StatCategory::PlayerBadge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatCategory::General => "general",
            StatCategory::Item => "item",
            StatCategory::Mob => "mob",
            StatCategory::PlayerBadge => "player_badge",
        }
    }
}

impl fmt::Display for StatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of raw counter kept for an identifier.
///
/// General statistics use [`CounterKind::Custom`]; items carry six action
/// counters and mobs carry kills and deaths. Badge counters are addressed by
/// identifier alone and have no kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterKind {
    Custom,
    Mined,
    Crafted,
    Used,
    Broken,
    PickedUp,
    Dropped,
    Killed,
    KilledBy,
}

impl CounterKind {
    /// Item counters in wire order
    pub const ITEM: [CounterKind; 6] = [
        CounterKind::Mined,
        CounterKind::Crafted,
        CounterKind::Used,
        CounterKind::Broken,
        CounterKind::PickedUp,
        CounterKind::Dropped,
    ];

    /// Mob counters in wire order
    pub const MOB: [CounterKind; 2] = [CounterKind::Killed, CounterKind::KilledBy];

    /// The fact category this counter contributes to
    pub fn category(&self) -> StatCategory {
        match self {
            CounterKind::Custom => StatCategory::General,
            CounterKind::Killed | CounterKind::KilledBy => StatCategory::Mob,
            _ => StatCategory::Item,
        }
    }
}

/// Address of one raw counter: a counter kind plus the identifier it counts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatKey {
    pub kind: CounterKind,
    pub id: Identifier,
}

impl StatKey {
    pub fn new(kind: CounterKind, id: Identifier) -> Self {
        Self { kind, id }
    }

    pub fn custom(id: Identifier) -> Self {
        Self::new(CounterKind::Custom, id)
    }
}

/// Clamp an arbitrary wide value into the persisted counter range `[0, i32::MAX]`.
pub fn clamp_counter(value: i64) -> i32 {
    value.clamp(0, i32::MAX as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_parse_with_namespace() {
        let id: Identifier = "core:dirt".parse().unwrap();
        assert_eq!(id.namespace(), "core");
        assert_eq!(id.path(), "dirt");
    }

    #[test]
    fn test_identifier_parse_defaults_namespace() {
        let id: Identifier = "jump".parse().unwrap();
        assert_eq!(id.namespace(), DEFAULT_NAMESPACE);
        assert_eq!(id.to_string(), "minecraft:jump");
    }

    #[test]
    fn test_identifier_rejects_blank_halves() {
        assert!(matches!(
            Identifier::new("", "dirt"),
            Err(StatsError::InvalidArgument(_))
        ));
        assert!(matches!(
            "core:".parse::<Identifier>(),
            Err(StatsError::InvalidArgument(_))
        ));
        assert!(matches!(
            "".parse::<Identifier>(),
            Err(StatsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_identifier_rejects_colon_in_namespace() {
        assert!(matches!(
            Identifier::new("a:b", "c"),
            Err(StatsError::InvalidArgument(_))
        ));

        // a colon in the path survives the text round trip
        let id = Identifier::new("a", "b:c").unwrap();
        let back: Identifier = id.to_string().parse().unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_null_identifier() {
        assert!(Identifier::null().is_null());
        assert!(!Identifier::new("core", "null").unwrap().is_null());
    }

    #[test]
    fn test_identifier_serde_as_string() {
        let id = Identifier::new("core", "dirt").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"core:dirt\"");
        let back: Identifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<Identifier>("\":dirt\"").is_err());
    }

    #[test]
    fn test_counter_kind_categories() {
        assert_eq!(CounterKind::Custom.category(), StatCategory::General);
        assert_eq!(CounterKind::PickedUp.category(), StatCategory::Item);
        assert_eq!(CounterKind::KilledBy.category(), StatCategory::Mob);
    }

    #[test]
    fn test_clamp_counter() {
        assert_eq!(clamp_counter(-5), 0);
        assert_eq!(clamp_counter(42), 42);
        assert_eq!(clamp_counter(i64::from(i32::MAX) + 10), i32::MAX);
    }
}
