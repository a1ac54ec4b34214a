/*!
JSON form of a provider's statistics, used by `export` and `import`.
*/

use serde::{Deserialize, Serialize};
use statsnap_core::{
    badge_facts, general_facts, item_facts, mob_facts, non_empty, AccountIdentity, CounterKind,
    EditableStatsProvider, Identifier, IdentifierDirectory, RamStatsProvider, RichText, StatKey,
    StatsProvider,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCounts {
    #[serde(default)]
    pub mined: i32,
    #[serde(default)]
    pub crafted: i32,
    #[serde(default)]
    pub used: i32,
    #[serde(default)]
    pub broken: i32,
    #[serde(default)]
    pub picked_up: i32,
    #[serde(default)]
    pub dropped: i32,
}

impl ItemCounts {
    fn values(&self) -> [i32; 6] {
        [
            self.mined,
            self.crafted,
            self.used,
            self.broken,
            self.picked_up,
            self.dropped,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobCounts {
    #[serde(default)]
    pub kills: i32,
    #[serde(default)]
    pub deaths: i32,
}

/// Every non-empty statistic of a provider, keyed by identifier text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsDump {
    #[serde(default)]
    pub display_name: Option<RichText>,
    #[serde(default)]
    pub identity: Option<AccountIdentity>,
    #[serde(default)]
    pub general: BTreeMap<String, i32>,
    #[serde(default)]
    pub item: BTreeMap<String, ItemCounts>,
    #[serde(default)]
    pub mob: BTreeMap<String, MobCounts>,
    #[serde(default)]
    pub player_badge: BTreeMap<String, i32>,
}

impl StatsDump {
    pub fn from_provider<P, D>(provider: &P, directory: &D) -> Self
    where
        P: StatsProvider + ?Sized,
        D: IdentifierDirectory + ?Sized,
    {
        let general = general_facts(provider, directory, non_empty)
            .into_iter()
            .map(|fact| (fact.id.to_string(), fact.value))
            .collect();
        let item = item_facts(provider, directory, non_empty)
            .into_iter()
            .map(|fact| {
                let counts = ItemCounts {
                    mined: fact.mined,
                    crafted: fact.crafted,
                    used: fact.used,
                    broken: fact.broken,
                    picked_up: fact.picked_up,
                    dropped: fact.dropped,
                };
                (fact.id.to_string(), counts)
            })
            .collect();
        let mob = mob_facts(provider, directory, non_empty)
            .into_iter()
            .map(|fact| {
                let counts = MobCounts {
                    kills: fact.kills,
                    deaths: fact.deaths,
                };
                (fact.id.to_string(), counts)
            })
            .collect();
        let player_badge = badge_facts(provider, directory, non_empty)
            .into_iter()
            .map(|fact| (fact.id.to_string(), fact.value))
            .collect();

        Self {
            display_name: provider.display_name().cloned(),
            identity: provider.identity().cloned(),
            general,
            item,
            mob,
            player_badge,
        }
    }

    /// Build an editable provider; identifiers that fail to parse are errors
    pub fn into_provider(self) -> anyhow::Result<RamStatsProvider> {
        let mut provider = RamStatsProvider::new();
        provider.set_display_name(self.display_name);
        provider.set_identity(self.identity);

        for (id, value) in self.general {
            provider.set_counter(StatKey::custom(parse_id(&id)?), value);
        }
        for (id, counts) in self.item {
            let id = parse_id(&id)?;
            for (kind, value) in CounterKind::ITEM.iter().zip(counts.values()) {
                provider.set_counter(StatKey::new(*kind, id.clone()), value);
            }
        }
        for (id, counts) in self.mob {
            let id = parse_id(&id)?;
            provider.set_counter(StatKey::new(CounterKind::Killed, id.clone()), counts.kills);
            provider.set_counter(StatKey::new(CounterKind::KilledBy, id), counts.deaths);
        }
        for (id, value) in self.player_badge {
            provider.set_badge_counter(parse_id(&id)?, value);
        }
        Ok(provider)
    }

    /// Identifier texts this dump mentions, in dump order
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.general
            .keys()
            .chain(self.item.keys())
            .chain(self.mob.keys())
            .chain(self.player_badge.keys())
            .map(String::as_str)
    }
}

fn parse_id(text: &str) -> anyhow::Result<Identifier> {
    text.parse()
        .map_err(|e| anyhow::anyhow!("bad identifier {text:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use statsnap_core::{StatCategory, StaticDirectory};

    fn directory() -> StaticDirectory {
        StaticDirectory::new()
            .with(StatCategory::General, &["minecraft:jump"])
            .unwrap()
            .with(StatCategory::Item, &["minecraft:dirt"])
            .unwrap()
            .with(StatCategory::Mob, &["minecraft:zombie"])
            .unwrap()
    }

    #[test]
    fn test_dump_round_trip_through_provider() {
        let json = r#"{
            "display_name": {"text": "Steve"},
            "general": {"minecraft:jump": 3},
            "item": {"dirt": {"mined": 5}},
            "mob": {"minecraft:zombie": {"kills": 2}}
        }"#;
        let dump: StatsDump = serde_json::from_str(json).unwrap();
        let provider = dump.into_provider().unwrap();

        let back = StatsDump::from_provider(&provider, &directory());
        assert_eq!(back.general.get("minecraft:jump"), Some(&3));
        assert_eq!(back.item["minecraft:dirt"].mined, 5);
        assert_eq!(back.mob["minecraft:zombie"], MobCounts { kills: 2, deaths: 0 });
        assert_eq!(back.display_name, Some(RichText::literal("Steve")));
    }

    #[test]
    fn test_bad_identifier_is_rejected() {
        let mut dump = StatsDump::default();
        dump.general.insert("minecraft:".to_string(), 1);
        assert!(dump.into_provider().is_err());
    }
}
