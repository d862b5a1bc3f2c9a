use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::attributes::latest_index_by_key;
use crate::error::{PipelineError, Result};
use crate::join::JoinReport;
use crate::model::{
    MatchRecord, PossessionSample, ShotEvent, TacticalAttribute, Team, TeamAttributeSnapshot,
};

pub const DEFAULT_TOP_N: usize = 5;
pub const DEFAULT_BASELINE: f64 = 1.1;

pub const JOIN_TEAM_NAMES: &str = "opponents -> teams";
pub const JOIN_STYLE: &str = "opponents -> team_attributes";
pub const JOIN_POSSESSION: &str = "opponents -> possession";
pub const JOIN_SHOTS_ON: &str = "opponents -> shots_on";
pub const JOIN_SHOTS_OFF: &str = "opponents -> shots_off";

/// 3 for a win, 1 for a draw, 0 for a loss.
pub fn points(goals_for: u32, goals_against: u32) -> u32 {
    if goals_for > goals_against {
        3
    } else if goals_for == goals_against {
        1
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Tier {
    #[serde(rename = "Top 5")]
    Top,
    #[serde(rename = "Bottom 5")]
    Bottom,
    Others,
    #[serde(rename = "Our Team")]
    OurTeam,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Top, Tier::Bottom, Tier::Others, Tier::OurTeam];

    pub fn label(self) -> &'static str {
        match self {
            Tier::Top => "Top 5",
            Tier::Bottom => "Bottom 5",
            Tier::Others => "Others",
            Tier::OurTeam => "Our Team",
        }
    }

    /// Tier for the opponent at `rank` (0 = best) among `n` opponents.
    pub fn for_rank(rank: usize, n: usize, top_n: usize) -> Tier {
        if rank < top_n {
            Tier::Top
        } else if rank >= n.saturating_sub(top_n) {
            Tier::Bottom
        } else {
            Tier::Others
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One (team, opponent, points) row from the target team's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsRow {
    pub team_id: u64,
    pub opponent_id: u64,
    pub points: u32,
}

/// Long-format points for every match the team played, home rows first then away rows.
/// Matches with a missing score are skipped.
pub fn points_long(matches: &[MatchRecord], team_id: u64) -> Vec<PointsRow> {
    let scored = |m: &&MatchRecord| m.home_goals.is_some() && m.away_goals.is_some();
    let home = matches
        .iter()
        .filter(scored)
        .filter(|m| m.home_team_id == team_id)
        .map(|m| PointsRow {
            team_id,
            opponent_id: m.away_team_id,
            points: points(m.home_goals.unwrap_or(0), m.away_goals.unwrap_or(0)),
        });
    let away = matches
        .iter()
        .filter(scored)
        .filter(|m| m.away_team_id == team_id)
        .map(|m| PointsRow {
            team_id,
            opponent_id: m.home_team_id,
            points: points(m.away_goals.unwrap_or(0), m.home_goals.unwrap_or(0)),
        });
    home.chain(away).collect()
}

/// Mean points per opponent, ordered by ascending opponent id.
pub fn average_points(rows: &[PointsRow]) -> Vec<(u64, f64, usize)> {
    let mut acc: BTreeMap<u64, (u32, usize)> = BTreeMap::new();
    for row in rows {
        let entry = acc.entry(row.opponent_id).or_insert((0, 0));
        entry.0 += row.points;
        entry.1 += 1;
    }
    acc.into_iter()
        .map(|(id, (sum, n))| (id, sum as f64 / n as f64, n))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpponentPerformanceRecord {
    pub opponent_id: u64,
    pub opponent_name: String,
    pub matches: usize,
    pub avg_points: f64,
    pub tier: Tier,
}

/// Opponents sorted by average points (best first, stable on ties), tiered by rank,
/// with the target team appended as a synthetic `Our Team` row worth 0 points.
pub fn tier_opponents(
    matches: &[MatchRecord],
    teams: &[Team],
    team_id: u64,
    top_n: usize,
    joins: &mut JoinReport,
) -> Result<Vec<OpponentPerformanceRecord>> {
    let names: HashMap<u64, &str> = teams
        .iter()
        .map(|t| (t.team_api_id, t.team_long_name.as_str()))
        .collect();
    let Some(our_name) = names.get(&team_id).copied() else {
        return Err(PipelineError::UnknownTargetTeam(team_id));
    };

    let mut avg = average_points(&points_long(matches, team_id));
    avg.sort_by(|a, b| b.1.total_cmp(&a.1));

    let n = avg.len();
    let mut out = Vec::with_capacity(n + 1);
    for (rank, (opponent_id, avg_points, played)) in avg.into_iter().enumerate() {
        let opponent_name = match names.get(&opponent_id) {
            Some(name) => name.to_string(),
            None => {
                joins.record_missing(JOIN_TEAM_NAMES, opponent_id);
                format!("team {opponent_id}")
            }
        };
        out.push(OpponentPerformanceRecord {
            opponent_id,
            opponent_name,
            matches: played,
            avg_points,
            tier: Tier::for_rank(rank, n, top_n),
        });
    }
    out.push(OpponentPerformanceRecord {
        opponent_id: team_id,
        opponent_name: our_name.to_string(),
        matches: 0,
        avg_points: 0.0,
        tier: Tier::OurTeam,
    });
    info!(team_id, opponents = n, "ranked opponents by average points");
    Ok(out)
}

/// Latest tactical snapshot per team.
pub fn latest_team_attributes(
    snapshots: &[TeamAttributeSnapshot],
) -> HashMap<u64, &TeamAttributeSnapshot> {
    latest_index_by_key(snapshots, |s| s.team_id, |s| s.date)
        .into_iter()
        .map(|(team, idx)| (team, &snapshots[idx]))
        .collect()
}

/// Mean possession share per team over every match it played.
pub fn average_possession(
    matches: &[MatchRecord],
    samples: &[PossessionSample],
) -> HashMap<u64, f64> {
    let mut per_match: HashMap<u64, [(f64, usize); 2]> = HashMap::new();
    for s in samples {
        let entry = per_match.entry(s.match_id).or_insert([(0.0, 0); 2]);
        if let Some(home) = s.home {
            entry[0].0 += home;
            entry[0].1 += 1;
        }
        if let Some(away) = s.away {
            entry[1].0 += away;
            entry[1].1 += 1;
        }
    }

    let mut per_team: HashMap<u64, (f64, usize)> = HashMap::new();
    for m in matches {
        let Some(sides) = per_match.get(&m.id) else {
            continue;
        };
        for (team, (sum, n)) in [(m.home_team_id, sides[0]), (m.away_team_id, sides[1])] {
            if n == 0 {
                continue;
            }
            let entry = per_team.entry(team).or_insert((0.0, 0));
            entry.0 += sum / n as f64;
            entry.1 += 1;
        }
    }
    per_team
        .into_iter()
        .map(|(team, (sum, n))| (team, sum / n as f64))
        .collect()
}

/// Shots counted per (match, team), then averaged over the matches where the team shot.
pub fn average_shots(events: &[ShotEvent]) -> HashMap<u64, f64> {
    let mut per_match: HashMap<(u64, u64), usize> = HashMap::new();
    for e in events {
        *per_match.entry((e.match_id, e.team_id)).or_insert(0) += 1;
    }
    let mut per_team: HashMap<u64, (usize, usize)> = HashMap::new();
    for ((_, team), count) in per_match {
        let entry = per_team.entry(team).or_insert((0, 0));
        entry.0 += count;
        entry.1 += 1;
    }
    per_team
        .into_iter()
        .map(|(team, (shots, matches))| (team, shots as f64 / matches as f64))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamStyleMetrics {
    pub style: BTreeMap<TacticalAttribute, f64>,
    pub possession: Option<f64>,
    pub shots_on: Option<f64>,
    pub shots_off: Option<f64>,
}

/// A metric plotted on the distribution charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ComparisonMetric {
    Style(TacticalAttribute),
    Possession,
    ShotsOn,
    ShotsOff,
}

impl ComparisonMetric {
    pub fn name(self) -> &'static str {
        match self {
            ComparisonMetric::Style(attr) => attr.column(),
            ComparisonMetric::Possession => "possession",
            ComparisonMetric::ShotsOn => "shots_on",
            ComparisonMetric::ShotsOff => "shots_off",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpponentComparison {
    #[serde(flatten)]
    pub record: OpponentPerformanceRecord,
    pub metrics: TeamStyleMetrics,
}

impl OpponentComparison {
    pub fn metric(&self, metric: ComparisonMetric) -> Option<f64> {
        match metric {
            ComparisonMetric::Style(attr) => self.metrics.style.get(&attr).copied(),
            ComparisonMetric::Possession => self.metrics.possession,
            ComparisonMetric::ShotsOn => self.metrics.shots_on,
            ComparisonMetric::ShotsOff => self.metrics.shots_off,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamPerformanceReport {
    pub team_id: u64,
    pub team_name: String,
    pub style_attributes: Vec<TacticalAttribute>,
    pub rows: Vec<OpponentComparison>,
    pub joins: JoinReport,
}

impl TeamPerformanceReport {
    /// Tiered opponents without the synthetic target row, best first.
    pub fn opponents(&self) -> impl Iterator<Item = &OpponentComparison> {
        self.rows.iter().filter(|r| r.record.tier != Tier::OurTeam)
    }

    pub fn metrics(&self) -> Vec<ComparisonMetric> {
        let mut out: Vec<ComparisonMetric> = self
            .style_attributes
            .iter()
            .copied()
            .map(ComparisonMetric::Style)
            .collect();
        out.extend([
            ComparisonMetric::Possession,
            ComparisonMetric::ShotsOn,
            ComparisonMetric::ShotsOff,
        ]);
        out
    }
}

#[derive(Debug, Clone)]
pub struct TeamPerformanceInput<'a> {
    pub matches: &'a [MatchRecord],
    pub teams: &'a [Team],
    pub team_attributes: &'a [TeamAttributeSnapshot],
    pub possession: &'a [PossessionSample],
    pub shots_on: &'a [ShotEvent],
    pub shots_off: &'a [ShotEvent],
}

/// Full comparison table: tiered opponents plus the target row, each with style,
/// possession and shot metrics merged in.
pub fn aggregate(
    input: &TeamPerformanceInput<'_>,
    team_id: u64,
    top_n: usize,
    style_attributes: &[TacticalAttribute],
) -> Result<TeamPerformanceReport> {
    let mut joins = JoinReport::default();
    let tiered = tier_opponents(input.matches, input.teams, team_id, top_n, &mut joins)?;

    let latest = latest_team_attributes(input.team_attributes);
    let possession = average_possession(input.matches, input.possession);
    let shots_on = average_shots(input.shots_on);
    let shots_off = average_shots(input.shots_off);

    let mut rows = Vec::with_capacity(tiered.len());
    for record in tiered {
        let id = record.opponent_id;
        let style = match latest.get(&id) {
            Some(snap) => style_attributes
                .iter()
                .filter_map(|attr| snap.values.get(attr).map(|v| (*attr, *v)))
                .collect(),
            None => {
                joins.record_missing(JOIN_STYLE, id);
                BTreeMap::new()
            }
        };
        let mut lookup = |join: &'static str, table: &HashMap<u64, f64>| {
            let value = table.get(&id).copied();
            if value.is_none() {
                joins.record_missing(join, id);
            }
            value
        };
        let metrics = TeamStyleMetrics {
            style,
            possession: lookup(JOIN_POSSESSION, &possession),
            shots_on: lookup(JOIN_SHOTS_ON, &shots_on),
            shots_off: lookup(JOIN_SHOTS_OFF, &shots_off),
        };
        rows.push(OpponentComparison { record, metrics });
    }

    let team_name = rows
        .last()
        .map(|r| r.record.opponent_name.clone())
        .unwrap_or_default();
    debug!(
        rows = rows.len(),
        join_issues = joins.issue_count(),
        "merged style, possession and shot metrics"
    );
    Ok(TeamPerformanceReport {
        team_id,
        team_name,
        style_attributes: style_attributes.to_vec(),
        rows,
        joins,
    })
}

/// Bar placement around a baseline: returns (base, height).
pub fn baseline_bar(avg_points: f64, baseline: f64) -> (f64, f64) {
    (avg_points.min(baseline), (avg_points - baseline).abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_rule() {
        assert_eq!(points(2, 1), 3);
        assert_eq!(points(1, 1), 1);
        assert_eq!(points(0, 3), 0);
    }

    #[test]
    fn tiers_overlap_prefers_top() {
        let tiers: Vec<Tier> = (0..7).map(|i| Tier::for_rank(i, 7, 5)).collect();
        assert_eq!(
            tiers,
            vec![
                Tier::Top,
                Tier::Top,
                Tier::Top,
                Tier::Top,
                Tier::Top,
                Tier::Bottom,
                Tier::Bottom
            ]
        );
    }

    #[test]
    fn bar_geometry() {
        assert_eq!(baseline_bar(2.0, 1.0), (1.0, 1.0));
        assert_eq!(baseline_bar(0.5, 1.5), (0.5, 1.0));
    }
}
