/*!
Aggregation layer: derives stat facts from a provider and groups them by
namespace.

Facts are views. Every call re-reads the provider, so a fact list is only as
fresh as the moment it was built.
*/

use crate::directory::IdentifierDirectory;
use crate::identifier::{CounterKind, Identifier, StatCategory, StatKey};
use crate::provider::StatsProvider;
use serde::Serialize;
use std::collections::HashMap;

/// Common surface of the four fact shapes.
pub trait StatFact {
    fn id(&self) -> &Identifier;

    /// True when every counter of the fact is zero
    fn is_empty(&self) -> bool;
}

/// Counters are persisted in `[0, i32::MAX]`; a misbehaving provider's
/// negatives read as zero.
fn read_counter<P: StatsProvider + ?Sized>(provider: &P, kind: CounterKind, id: &Identifier) -> i32 {
    provider.counter_of(kind, id).max(0)
}

/// Predicate keeping only facts with at least one non-zero counter.
pub fn non_empty<F: StatFact>(fact: &F) -> bool {
    !fact.is_empty()
}

/// Predicate keeping every fact.
pub fn any_fact<F: StatFact>(_fact: &F) -> bool {
    true
}

/// A general (custom) statistic with a single value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneralFact {
    pub id: Identifier,
    pub value: i32,
    /// Localized name of the statistic
    pub display_text: String,
    /// The value rendered with the statistic's display format
    pub value_text: String,
}

impl GeneralFact {
    pub fn read<P, D>(provider: &P, directory: &D, id: Identifier) -> Self
    where
        P: StatsProvider + ?Sized,
        D: IdentifierDirectory + ?Sized,
    {
        let value = read_counter(provider, CounterKind::Custom, &id);
        Self {
            display_text: directory.display_text(&id, StatCategory::General),
            value_text: directory.format_of(&id).format(value),
            value,
            id,
        }
    }
}

impl StatFact for GeneralFact {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn is_empty(&self) -> bool {
        self.value == 0
    }
}

/// Per-item action counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFact {
    pub id: Identifier,
    pub mined: i32,
    pub crafted: i32,
    pub used: i32,
    pub broken: i32,
    pub picked_up: i32,
    pub dropped: i32,
}

impl ItemFact {
    pub fn read<P: StatsProvider + ?Sized>(provider: &P, id: Identifier) -> Self {
        Self {
            mined: read_counter(provider, CounterKind::Mined, &id),
            crafted: read_counter(provider, CounterKind::Crafted, &id),
            used: read_counter(provider, CounterKind::Used, &id),
            broken: read_counter(provider, CounterKind::Broken, &id),
            picked_up: read_counter(provider, CounterKind::PickedUp, &id),
            dropped: read_counter(provider, CounterKind::Dropped, &id),
            id,
        }
    }

    /// Counters in wire order: mined, crafted, used, broken, picked up, dropped
    pub fn counters(&self) -> [i32; 6] {
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

impl StatFact for ItemFact {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn is_empty(&self) -> bool {
        self.counters().iter().all(|value| *value == 0)
    }
}

/// Kill and death counters for one creature type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MobFact {
    pub id: Identifier,
    pub kills: i32,
    pub deaths: i32,
}

impl MobFact {
    pub fn read<P: StatsProvider + ?Sized>(provider: &P, id: Identifier) -> Self {
        Self {
            kills: read_counter(provider, CounterKind::Killed, &id),
            deaths: read_counter(provider, CounterKind::KilledBy, &id),
            id,
        }
    }
}

impl StatFact for MobFact {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn is_empty(&self) -> bool {
        self.kills == 0 && self.deaths == 0
    }
}

/// How many times a badge was awarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeFact {
    pub id: Identifier,
    pub value: i32,
}

impl BadgeFact {
    pub fn read<P: StatsProvider + ?Sized>(provider: &P, id: Identifier) -> Self {
        Self {
            value: provider.badge_counter(&id).max(0),
            id,
        }
    }
}

impl StatFact for BadgeFact {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn is_empty(&self) -> bool {
        self.value == 0
    }
}

/// General facts sorted by display text, null identifiers excluded.
pub fn general_facts<P, D, F>(provider: &P, directory: &D, filter: F) -> Vec<GeneralFact>
where
    P: StatsProvider + ?Sized,
    D: IdentifierDirectory + ?Sized,
    F: Fn(&GeneralFact) -> bool,
{
    let mut facts: Vec<GeneralFact> = directory
        .iterate(StatCategory::General)
        .into_iter()
        .filter(|id| !id.is_null())
        .map(|id| GeneralFact::read(provider, directory, id))
        .filter(|fact| filter(fact))
        .collect();
    // stable, so equal names keep directory order
    facts.sort_by(|a, b| a.display_text.cmp(&b.display_text));
    facts
}

/// Item facts in directory order.
pub fn item_facts<P, D, F>(provider: &P, directory: &D, filter: F) -> Vec<ItemFact>
where
    P: StatsProvider + ?Sized,
    D: IdentifierDirectory + ?Sized,
    F: Fn(&ItemFact) -> bool,
{
    directory
        .iterate(StatCategory::Item)
        .into_iter()
        .map(|id| ItemFact::read(provider, id))
        .filter(|fact| filter(fact))
        .collect()
}

/// Mob facts in directory order.
pub fn mob_facts<P, D, F>(provider: &P, directory: &D, filter: F) -> Vec<MobFact>
where
    P: StatsProvider + ?Sized,
    D: IdentifierDirectory + ?Sized,
    F: Fn(&MobFact) -> bool,
{
    directory
        .iterate(StatCategory::Mob)
        .into_iter()
        .map(|id| MobFact::read(provider, id))
        .filter(|fact| filter(fact))
        .collect()
}

/// Badge facts in directory order.
pub fn badge_facts<P, D, F>(provider: &P, directory: &D, filter: F) -> Vec<BadgeFact>
where
    P: StatsProvider + ?Sized,
    D: IdentifierDirectory + ?Sized,
    F: Fn(&BadgeFact) -> bool,
{
    directory
        .iterate(StatCategory::PlayerBadge)
        .into_iter()
        .map(|id| BadgeFact::read(provider, id))
        .filter(|fact| filter(fact))
        .collect()
}

/// Facts grouped by namespace, in insertion order.
///
/// No namespace appears twice and no group is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceGroups<F> {
    groups: Vec<(String, Vec<F>)>,
}

impl<F> NamespaceGroups<F> {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[F])> {
        self.groups
            .iter()
            .map(|(namespace, facts)| (namespace.as_str(), facts.as_slice()))
    }

    pub fn get(&self, namespace: &str) -> Option<&[F]> {
        self.groups
            .iter()
            .find(|(ns, _)| ns == namespace)
            .map(|(_, facts)| facts.as_slice())
    }

    pub fn namespaces(&self) -> Vec<&str> {
        self.groups.iter().map(|(ns, _)| ns.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of facts across all groups
    pub fn fact_count(&self) -> usize {
        self.groups.iter().map(|(_, facts)| facts.len()).sum()
    }
}

impl<F> IntoIterator for NamespaceGroups<F> {
    type Item = (String, Vec<F>);
    type IntoIter = std::vec::IntoIter<(String, Vec<F>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Group facts by namespace, keeping their relative order.
///
/// The directory's default namespace always comes first, and is dropped
/// entirely when no fact belongs to it.
pub fn group_by_namespace<F, D>(facts: Vec<F>, directory: &D) -> NamespaceGroups<F>
where
    F: StatFact,
    D: IdentifierDirectory + ?Sized,
{
    group_with(facts, directory.default_namespace(), |fact| {
        directory.namespace_of(fact.id())
    })
}

/// Group facts by the namespace their identifier carries, ignoring any
/// directory override of [`IdentifierDirectory::namespace_of`].
///
/// Archives persist each path under its group key and resolve the pair on
/// decode, so this is the grouping the codec writes.
pub fn group_by_identifier_namespace<F, D>(facts: Vec<F>, directory: &D) -> NamespaceGroups<F>
where
    F: StatFact,
    D: IdentifierDirectory + ?Sized,
{
    group_with(facts, directory.default_namespace(), |fact| {
        fact.id().namespace().to_string()
    })
}

fn group_with<F, K>(facts: Vec<F>, default_namespace: String, key: K) -> NamespaceGroups<F>
where
    F: StatFact,
    K: Fn(&F) -> String,
{
    let mut groups: Vec<(String, Vec<F>)> = vec![(default_namespace.clone(), Vec::new())];
    let mut index: HashMap<String, usize> = HashMap::new();
    index.insert(default_namespace, 0);

    for fact in facts {
        let namespace = key(&fact);
        let slot = match index.get(&namespace) {
            Some(slot) => *slot,
            None => {
                groups.push((namespace.clone(), Vec::new()));
                index.insert(namespace, groups.len() - 1);
                groups.len() - 1
            }
        };
        groups[slot].1.push(fact);
    }

    if groups[0].1.is_empty() {
        groups.remove(0);
    }
    NamespaceGroups { groups }
}

pub fn general_facts_by_namespace<P, D, F>(
    provider: &P,
    directory: &D,
    filter: F,
) -> NamespaceGroups<GeneralFact>
where
    P: StatsProvider + ?Sized,
    D: IdentifierDirectory + ?Sized,
    F: Fn(&GeneralFact) -> bool,
{
    group_by_namespace(general_facts(provider, directory, filter), directory)
}

pub fn item_facts_by_namespace<P, D, F>(
    provider: &P,
    directory: &D,
    filter: F,
) -> NamespaceGroups<ItemFact>
where
    P: StatsProvider + ?Sized,
    D: IdentifierDirectory + ?Sized,
    F: Fn(&ItemFact) -> bool,
{
    group_by_namespace(item_facts(provider, directory, filter), directory)
}

pub fn mob_facts_by_namespace<P, D, F>(
    provider: &P,
    directory: &D,
    filter: F,
) -> NamespaceGroups<MobFact>
where
    P: StatsProvider + ?Sized,
    D: IdentifierDirectory + ?Sized,
    F: Fn(&MobFact) -> bool,
{
    group_by_namespace(mob_facts(provider, directory, filter), directory)
}

pub fn badge_facts_by_namespace<P, D, F>(
    provider: &P,
    directory: &D,
    filter: F,
) -> NamespaceGroups<BadgeFact>
where
    P: StatsProvider + ?Sized,
    D: IdentifierDirectory + ?Sized,
    F: Fn(&BadgeFact) -> bool,
{
    group_by_namespace(badge_facts(provider, directory, filter), directory)
}

/// Category totals over every identifier the directory knows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub mined: i64,
    pub crafted: i64,
    pub used: i64,
    pub broken: i64,
    pub picked_up: i64,
    pub dropped: i64,
    pub kills: i64,
    pub deaths: i64,
    pub general_entries: usize,
    pub item_entries: usize,
    pub mob_entries: usize,
    pub badge_entries: usize,
}

impl StatsSummary {
    pub fn collect<P, D>(provider: &P, directory: &D) -> Self
    where
        P: StatsProvider + ?Sized,
        D: IdentifierDirectory + ?Sized,
    {
        let mut summary = Self {
            general_entries: general_facts(provider, directory, non_empty).len(),
            badge_entries: badge_facts(provider, directory, non_empty).len(),
            ..Self::default()
        };

        for fact in item_facts(provider, directory, non_empty) {
            summary.mined += i64::from(fact.mined);
            summary.crafted += i64::from(fact.crafted);
            summary.used += i64::from(fact.used);
            summary.broken += i64::from(fact.broken);
            summary.picked_up += i64::from(fact.picked_up);
            summary.dropped += i64::from(fact.dropped);
            summary.item_entries += 1;
        }
        for fact in mob_facts(provider, directory, non_empty) {
            summary.kills += i64::from(fact.kills);
            summary.deaths += i64::from(fact.deaths);
            summary.mob_entries += 1;
        }
        summary
    }
}

/// Every raw counter key a fact of `category` reads for `id`.
pub fn counter_keys(category: StatCategory, id: &Identifier) -> Vec<StatKey> {
    let kinds: &[CounterKind] = match category {
        StatCategory::General => &[CounterKind::Custom],
        StatCategory::Item => &CounterKind::ITEM,
        StatCategory::Mob => &CounterKind::MOB,
        StatCategory::PlayerBadge => &[],
    };
    kinds
        .iter()
        .map(|kind| StatKey::new(*kind, id.clone()))
        .collect()
}
