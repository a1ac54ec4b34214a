/*!
Stats providers: uniform read (and optionally write) access to an owner's
counters, badge counters and identity.

Three realizations ship with the core:

- [`LiveStatsProvider`] borrows a session's live [`CounterStore`] and is
  read-only, so it can never desynchronize a remote peer.
- [`RamStatsProvider`] owns its counters and is editable; it is the usual
  target of an archive decode.
- [`EmptyStatsProvider`] reports zero for everything.
*/

use crate::identifier::{clamp_counter, CounterKind, Identifier, StatKey};
use crate::text::RichText;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Account an owner's statistics belong to. Either half may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountIdentity {
    pub id: Option<Uuid>,
    pub name: Option<String>,
}

impl AccountIdentity {
    /// Build an identity, or `None` when both halves are absent
    pub fn new(id: Option<Uuid>, name: Option<String>) -> Option<Self> {
        if id.is_none() && name.is_none() {
            None
        } else {
            Some(Self { id, name })
        }
    }

    pub fn named<S: Into<String>>(id: Uuid, name: S) -> Self {
        Self {
            id: Some(id),
            name: Some(name.into()),
        }
    }
}

/// Read access to a set of statistics.
///
/// Lookups never fail: an unknown key reads as `0`.
pub trait StatsProvider {
    /// Display name shown as the owner of these statistics
    fn display_name(&self) -> Option<&RichText>;

    /// Account these statistics belong to, if any
    fn identity(&self) -> Option<&AccountIdentity>;

    /// Raw value of one counter
    fn counter(&self, key: &StatKey) -> i32;

    /// Raw value of one badge counter
    fn badge_counter(&self, id: &Identifier) -> i32;

    fn counter_of(&self, kind: CounterKind, id: &Identifier) -> i32 {
        self.counter(&StatKey::new(kind, id.clone()))
    }
}

/// Write access on top of [`StatsProvider`].
///
/// Implementations keep every stored value within `[0, i32::MAX]`.
pub trait EditableStatsProvider: StatsProvider {
    fn set_display_name(&mut self, name: Option<RichText>);

    fn set_identity(&mut self, identity: Option<AccountIdentity>);

    /// Overwrite one counter; callers pass values in `[0, i32::MAX]`
    fn set_counter(&mut self, key: StatKey, value: i32);

    fn set_badge_counter(&mut self, id: Identifier, value: i32);

    /// Add `delta` to a counter, saturating at `0` and `i32::MAX`
    fn increase_counter(&mut self, key: StatKey, delta: i32) {
        let value = clamp_counter(i64::from(self.counter(&key)) + i64::from(delta));
        self.set_counter(key, value);
    }

    /// Copy every counter and badge counter of `from`, overriding existing values
    fn set_all(&mut self, from: &RamStatsProvider) {
        for (key, value) in from.store().counters() {
            self.set_counter(key.clone(), *value);
        }
        for (id, value) in from.store().badge_counters() {
            self.set_badge_counter(id.clone(), *value);
        }
    }
}

/// Raw counter storage owned by whatever subsystem accumulates statistics.
///
/// Not synchronized; the owner serializes access.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterStore {
    counters: HashMap<StatKey, i32>,
    badges: HashMap<Identifier, i32>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &StatKey) -> i32 {
        self.counters.get(key).copied().unwrap_or(0)
    }

    pub fn get_badge(&self, id: &Identifier) -> i32 {
        self.badges.get(id).copied().unwrap_or(0)
    }

    /// Store a counter; negatives are stored as `0` and zero entries are dropped
    pub fn set(&mut self, key: StatKey, value: i32) {
        let value = value.max(0);
        if value == 0 {
            self.counters.remove(&key);
        } else {
            self.counters.insert(key, value);
        }
    }

    pub fn set_badge(&mut self, id: Identifier, value: i32) {
        let value = value.max(0);
        if value == 0 {
            self.badges.remove(&id);
        } else {
            self.badges.insert(id, value);
        }
    }

    /// Saturating increment, as the owning session would apply a game event
    pub fn increment(&mut self, key: StatKey, delta: i32) {
        let value = clamp_counter(i64::from(self.get(&key)) + i64::from(delta));
        self.set(key, value);
    }

    pub fn counters(&self) -> &HashMap<StatKey, i32> {
        &self.counters
    }

    pub fn badge_counters(&self) -> &HashMap<Identifier, i32> {
        &self.badges
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty() && self.badges.is_empty()
    }

    pub fn clear(&mut self) {
        self.counters.clear();
        self.badges.clear();
    }
}

/// Read-only view over a live [`CounterStore`] with identity cached at creation.
#[derive(Debug, Clone)]
pub struct LiveStatsProvider<'a> {
    display_name: Option<RichText>,
    identity: Option<AccountIdentity>,
    store: &'a CounterStore,
}

impl<'a> LiveStatsProvider<'a> {
    pub fn new(
        store: &'a CounterStore,
        display_name: Option<RichText>,
        identity: Option<AccountIdentity>,
    ) -> Self {
        Self {
            display_name,
            identity,
            store,
        }
    }

    pub fn store(&self) -> &CounterStore {
        self.store
    }
}

impl StatsProvider for LiveStatsProvider<'_> {
    fn display_name(&self) -> Option<&RichText> {
        self.display_name.as_ref()
    }

    fn identity(&self) -> Option<&AccountIdentity> {
        self.identity.as_ref()
    }

    fn counter(&self, key: &StatKey) -> i32 {
        self.store.get(key)
    }

    fn badge_counter(&self, id: &Identifier) -> i32 {
        self.store.get_badge(id)
    }
}

/// Editable provider owning its counters; typically loaded from a file or
/// received over the network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RamStatsProvider {
    display_name: Option<RichText>,
    identity: Option<AccountIdentity>,
    store: CounterStore,
}

impl RamStatsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_display_name<T: Into<RichText>>(mut self, name: T) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_identity(mut self, identity: AccountIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn store(&self) -> &CounterStore {
        &self.store
    }

    /// Snapshot a live provider's identity and counters
    pub fn copy_of(live: &LiveStatsProvider<'_>) -> Self {
        Self {
            display_name: live.display_name.clone(),
            identity: live.identity.clone(),
            store: live.store.clone(),
        }
    }
}

impl StatsProvider for RamStatsProvider {
    fn display_name(&self) -> Option<&RichText> {
        self.display_name.as_ref()
    }

    fn identity(&self) -> Option<&AccountIdentity> {
        self.identity.as_ref()
    }

    fn counter(&self, key: &StatKey) -> i32 {
        self.store.get(key)
    }

    fn badge_counter(&self, id: &Identifier) -> i32 {
        self.store.get_badge(id)
    }
}

impl EditableStatsProvider for RamStatsProvider {
    fn set_display_name(&mut self, name: Option<RichText>) {
        self.display_name = name;
    }

    fn set_identity(&mut self, identity: Option<AccountIdentity>) {
        self.identity = identity;
    }

    fn set_counter(&mut self, key: StatKey, value: i32) {
        self.store.set(key, value);
    }

    fn set_badge_counter(&mut self, id: Identifier, value: i32) {
        self.store.set_badge(id, value);
    }
}

/// Provider that reports `0` for every counter.
#[derive(Debug, Clone)]
pub struct EmptyStatsProvider {
    display_name: RichText,
    identity: AccountIdentity,
}

impl EmptyStatsProvider {
    pub fn new() -> Self {
        Self {
            display_name: RichText::literal("null"),
            identity: AccountIdentity::named(Uuid::nil(), "null"),
        }
    }
}

impl Default for EmptyStatsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsProvider for EmptyStatsProvider {
    fn display_name(&self) -> Option<&RichText> {
        Some(&self.display_name)
    }

    fn identity(&self) -> Option<&AccountIdentity> {
        Some(&self.identity)
    }

    fn counter(&self, _key: &StatKey) -> i32 {
        0
    }

    fn badge_counter(&self, _id: &Identifier) -> i32 {
        0
    }
}
