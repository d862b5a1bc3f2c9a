use std::collections::HashMap;

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::join::JoinReport;
use crate::model::{Attribute, Player, PlayerAttributeSnapshot};

/// A snapshot with its derived potential-to-rating ratio and the player's name.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSnapshot {
    pub snapshot: PlayerAttributeSnapshot,
    pub player_name: Option<String>,
    pub potential_rating_ratio: Option<f64>,
}

impl NormalizedSnapshot {
    pub fn player_id(&self) -> u64 {
        self.snapshot.player_id
    }

    pub fn date(&self) -> Option<NaiveDateTime> {
        self.snapshot.date
    }

    pub fn attribute(&self, attr: Attribute) -> Option<f64> {
        self.snapshot.attribute(attr)
    }
}

/// potential / overall_rating * 100. Absent when either side is missing or the rating is zero.
pub fn potential_rating_ratio(snapshot: &PlayerAttributeSnapshot) -> Option<f64> {
    let potential = snapshot.potential?;
    let overall = snapshot.overall_rating?;
    if overall == 0.0 {
        return None;
    }
    Some(potential / overall * 100.0)
}

/// Attach the ratio to every snapshot.
pub fn with_ratios(
    snapshots: &[PlayerAttributeSnapshot],
) -> Vec<(PlayerAttributeSnapshot, Option<f64>)> {
    let mut zero_ratings = 0usize;
    let out = snapshots
        .iter()
        .map(|s| {
            if s.overall_rating == Some(0.0) {
                zero_ratings += 1;
            }
            (s.clone(), potential_rating_ratio(s))
        })
        .collect();
    if zero_ratings > 0 {
        warn!(zero_ratings, "snapshots with a zero overall rating have no potential ratio");
    }
    out
}

/// Index of the most recent row per key. Equal dates resolve to the later row;
/// undated rows only win when a key has no dated row.
pub fn latest_index_by_key<T>(
    rows: &[T],
    key: impl Fn(&T) -> u64,
    date: impl Fn(&T) -> Option<NaiveDateTime>,
) -> HashMap<u64, usize> {
    let mut latest: HashMap<u64, usize> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        let id = key(row);
        match latest.get(&id) {
            Some(&prev) if date(&rows[prev]) > date(row) => {}
            _ => {
                latest.insert(id, idx);
            }
        }
    }
    latest
}

/// Ratio per snapshot, then exactly one snapshot per player: the latest by date.
/// The result keeps the input order of the selected rows.
pub fn normalize_latest(
    snapshots: &[PlayerAttributeSnapshot],
    players: &[Player],
    joins: &mut JoinReport,
) -> Vec<NormalizedSnapshot> {
    let names: HashMap<u64, &str> = players
        .iter()
        .map(|p| (p.player_api_id, p.player_name.as_str()))
        .collect();

    let with_ratio = with_ratios(snapshots);
    let latest = latest_index_by_key(&with_ratio, |(s, _)| s.player_id, |(s, _)| s.date);
    let mut selected = latest.into_values().collect::<Vec<_>>();
    selected.sort_unstable();

    let mut out = Vec::with_capacity(selected.len());
    for idx in selected {
        let (snapshot, ratio) = with_ratio[idx].clone();
        let player_name = names.get(&snapshot.player_id).map(|n| n.to_string());
        if player_name.is_none() {
            joins.record_missing("player_attributes -> players", snapshot.player_id);
        }
        out.push(NormalizedSnapshot {
            snapshot,
            player_name,
            potential_rating_ratio: ratio,
        });
    }
    debug!(
        snapshots = snapshots.len(),
        players = out.len(),
        "selected latest attribute snapshot per player"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_is_percentage() {
        let snap = PlayerAttributeSnapshot {
            overall_rating: Some(80.0),
            potential: Some(88.0),
            ..Default::default()
        };
        let r = potential_rating_ratio(&snap).unwrap();
        assert!((r - 110.0).abs() < 1e-9);
    }

    #[test]
    fn ratio_absent_for_zero_rating() {
        let snap = PlayerAttributeSnapshot {
            overall_rating: Some(0.0),
            potential: Some(70.0),
            ..Default::default()
        };
        assert_eq!(potential_rating_ratio(&snap), None);
    }
}
