use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{MatchRecord, PlayerAppearance, Role, SlotRoleEntry};

pub const DEFAULT_SLOT_UPPER_BOUND: i64 = 12;

/// Lookup from the vertical formation coordinate of a slot to a coarse role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormationSlotRoleMap {
    by_y: HashMap<i64, Role>,
    upper_bound: i64,
}

impl FormationSlotRoleMap {
    pub fn from_entries(entries: &[SlotRoleEntry], upper_bound: i64) -> Self {
        let mut by_y = HashMap::with_capacity(entries.len());
        for entry in entries {
            by_y.insert(entry.slot_y, entry.role);
        }
        Self { by_y, upper_bound }
    }

    /// Layout used when no reference table is supplied: keeper on row 1,
    /// defensive line 2-4, midfield 5-8, attack 9-11.
    pub fn standard(upper_bound: i64) -> Self {
        let mut by_y = HashMap::new();
        by_y.insert(1, Role::Goalkeeper);
        for y in 2..=4 {
            by_y.insert(y, Role::Back);
        }
        for y in 5..=8 {
            by_y.insert(y, Role::Midfield);
        }
        for y in 9..=11 {
            by_y.insert(y, Role::Forward);
        }
        Self { by_y, upper_bound }
    }

    pub fn upper_bound(&self) -> i64 {
        self.upper_bound
    }

    pub fn in_range(&self, y: i64) -> bool {
        (0..self.upper_bound).contains(&y)
    }

    /// `None` for missing or out-of-range coordinates, `Unknown` for in-range
    /// coordinates with no entry.
    pub fn role_for(&self, slot_y: Option<i64>) -> Option<Role> {
        let y = slot_y?;
        if !self.in_range(y) {
            return None;
        }
        Some(self.by_y.get(&y).copied().unwrap_or(Role::Unknown))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RolePolicy {
    /// Most observed role wins; ties go to the role seen in the most recent match.
    #[default]
    MostFrequent,
    /// The last appearance processed overwrites earlier ones.
    LastObserved,
}

impl RolePolicy {
    pub fn parse(raw: &str) -> Option<RolePolicy> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "most-frequent" | "most_frequent" | "frequency" => Some(RolePolicy::MostFrequent),
            "last-observed" | "last_observed" | "last" => Some(RolePolicy::LastObserved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RoleTally {
    count: u32,
    latest_date: Option<NaiveDateTime>,
    last_seq: usize,
}

/// Every role a player was observed in, with enough context to apply any policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleObservations {
    tallies: BTreeMap<Role, RoleTally>,
    last: Option<Role>,
}

impl RoleObservations {
    fn observe(&mut self, role: Role, date: Option<NaiveDateTime>, seq: usize) {
        let tally = self.tallies.entry(role).or_default();
        tally.count += 1;
        tally.latest_date = tally.latest_date.max(date);
        tally.last_seq = seq;
        self.last = Some(role);
    }

    pub fn count(&self, role: Role) -> u32 {
        self.tallies.get(&role).map(|t| t.count).unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.tallies.values().map(|t| t.count).sum()
    }

    pub fn is_conflicting(&self) -> bool {
        self.tallies.len() > 1
    }

    pub fn resolve(&self, policy: RolePolicy) -> Option<Role> {
        match policy {
            RolePolicy::LastObserved => self.last,
            RolePolicy::MostFrequent => self
                .tallies
                .iter()
                .max_by(|(_, a), (_, b)| {
                    a.count
                        .cmp(&b.count)
                        .then(a.latest_date.cmp(&b.latest_date))
                        .then(a.last_seq.cmp(&b.last_seq))
                })
                .map(|(role, _)| *role),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedRoles {
    pub roles: HashMap<u64, Role>,
    pub observations: HashMap<u64, RoleObservations>,
    pub appearances_seen: usize,
    pub appearances_discarded: usize,
}

impl ResolvedRoles {
    pub fn role_of(&self, player_id: u64) -> Option<Role> {
        self.roles.get(&player_id).copied()
    }

    pub fn role_counts(&self) -> BTreeMap<Role, usize> {
        let mut out = BTreeMap::new();
        for role in self.roles.values() {
            *out.entry(*role).or_insert(0) += 1;
        }
        out
    }

    pub fn conflicted_players(&self) -> usize {
        self.observations
            .values()
            .filter(|obs| obs.is_conflicting())
            .count()
    }
}

pub fn appearances(matches: &[MatchRecord]) -> Vec<PlayerAppearance> {
    matches.iter().flat_map(MatchRecord::appearances).collect()
}

/// Resolve one role per player from every appearance, in processing order.
pub fn resolve_roles(
    appearances: &[PlayerAppearance],
    map: &FormationSlotRoleMap,
    policy: RolePolicy,
) -> ResolvedRoles {
    let mut observations: HashMap<u64, RoleObservations> = HashMap::new();
    let mut discarded = 0usize;

    for (seq, app) in appearances.iter().enumerate() {
        let Some(role) = map.role_for(app.slot_y) else {
            discarded += 1;
            continue;
        };
        observations
            .entry(app.player_id)
            .or_default()
            .observe(role, app.match_date, seq);
    }

    let roles = observations
        .iter()
        .filter_map(|(id, obs)| obs.resolve(policy).map(|role| (*id, role)))
        .collect::<HashMap<_, _>>();

    let out = ResolvedRoles {
        roles,
        observations,
        appearances_seen: appearances.len(),
        appearances_discarded: discarded,
    };
    debug!(
        players = out.roles.len(),
        discarded,
        conflicted = out.conflicted_players(),
        ?policy,
        "resolved player roles"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_map_covers_all_rows() {
        let map = FormationSlotRoleMap::standard(DEFAULT_SLOT_UPPER_BOUND);
        assert_eq!(map.role_for(Some(1)), Some(Role::Goalkeeper));
        assert_eq!(map.role_for(Some(3)), Some(Role::Back));
        assert_eq!(map.role_for(Some(7)), Some(Role::Midfield));
        assert_eq!(map.role_for(Some(11)), Some(Role::Forward));
        assert_eq!(map.role_for(Some(0)), Some(Role::Unknown));
        assert_eq!(map.role_for(Some(12)), None);
        assert_eq!(map.role_for(None), None);
    }

    #[test]
    fn policy_names_parse() {
        assert_eq!(RolePolicy::parse("last"), Some(RolePolicy::LastObserved));
        assert_eq!(
            RolePolicy::parse(" Most-Frequent "),
            Some(RolePolicy::MostFrequent)
        );
        assert_eq!(RolePolicy::parse("vote"), None);
    }
}
