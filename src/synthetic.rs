//! Seeded, self-consistent tables for demos, tests and benchmarks.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::config::DEFAULT_TARGET_TEAM;
use crate::model::{
    Attribute, MatchRecord, Player, PlayerAttributeSnapshot, PossessionSample, Role, RoleTag,
    SLOTS_PER_SIDE, ShotEvent, SlotRoleEntry, TacticalAttribute, Tables, Team,
    TeamAttributeSnapshot,
};

const TEAM_NAMES: [&str; 16] = [
    "RCD Espanyol",
    "Real Betis",
    "Getafe CF",
    "Granada CF",
    "Levante UD",
    "Malaga CF",
    "CA Osasuna",
    "Rayo Vallecano",
    "Real Sociedad",
    "Sevilla FC",
    "Valencia CF",
    "Villarreal CF",
    "Celta Vigo",
    "SD Eibar",
    "UD Las Palmas",
    "Sporting Gijon",
];

const FIRST_NAMES: [&str; 14] = [
    "Adrian", "Bruno", "Carlos", "Dani", "Enzo", "Fede", "Gerard", "Hugo", "Ivan", "Jordi",
    "Koke", "Lucas", "Marc", "Nico",
];

const LAST_NAMES: [&str; 18] = [
    "Alba", "Bravo", "Castro", "Diaz", "Espinosa", "Ferrer", "Garcia", "Herrera", "Iglesias",
    "Jimenez", "Lopez", "Moreno", "Navarro", "Ortiz", "Prieto", "Ramos", "Soler", "Torres",
];

/// Squad shape per team: keeper, backs, midfielders, forwards.
const SQUAD: [(Role, usize); 4] = [
    (Role::Goalkeeper, 1),
    (Role::Back, 5),
    (Role::Midfield, 5),
    (Role::Forward, 3),
];

/// Starting eleven shape and the formation row each line stands on.
const LINEUP: [(Role, usize, i64); 4] = [
    (Role::Goalkeeper, 1, 1),
    (Role::Back, 4, 3),
    (Role::Midfield, 4, 7),
    (Role::Forward, 2, 10),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticSpec {
    pub seed: u64,
    pub teams: usize,
    /// Chance that a starter is fielded one line away from their usual role.
    pub out_of_position_pct: u32,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            seed: 8558,
            teams: 12,
            out_of_position_pct: 8,
        }
    }
}

fn at(y: i32, m: u32, d: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(y, m, d).and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn slot_row(role: Role) -> i64 {
    LINEUP
        .iter()
        .find(|(r, _, _)| *r == role)
        .map(|(_, _, y)| *y)
        .unwrap_or(0)
}

/// Build a league where the first team is the default target team.
pub fn generate(spec: SyntheticSpec) -> Tables {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let team_count = spec.teams.clamp(2, TEAM_NAMES.len());

    let teams: Vec<Team> = (0..team_count)
        .map(|i| Team {
            team_api_id: if i == 0 {
                DEFAULT_TARGET_TEAM
            } else {
                9_000 + i as u64
            },
            team_long_name: TEAM_NAMES[i].to_string(),
            team_short_name: Some(TEAM_NAMES[i][..3].to_ascii_uppercase()),
        })
        .collect();

    let mut players = Vec::new();
    let mut squads: Vec<BTreeMap<Role, Vec<u64>>> = Vec::with_capacity(team_count);
    let mut player_attributes = Vec::new();
    for _ in &teams {
        let mut squad: BTreeMap<Role, Vec<u64>> = BTreeMap::new();
        for (role, size) in SQUAD {
            for _ in 0..size {
                let idx = players.len();
                let id = 30_000 + idx as u64;
                let name = format!(
                    "{} {}",
                    FIRST_NAMES[idx % FIRST_NAMES.len()],
                    LAST_NAMES[(idx / FIRST_NAMES.len()) % LAST_NAMES.len()]
                );
                let birthday = at(
                    rng.gen_range(1988..=2000),
                    rng.gen_range(1..=12),
                    rng.gen_range(1..=28),
                );
                players.push(Player {
                    player_api_id: id,
                    player_name: name,
                    birthday,
                });
                squad.entry(role).or_default().push(id);
                player_attributes.extend(snapshots(&mut rng, id, role));
            }
        }
        squads.push(squad);
    }

    let season_start = at(2015, 8, 22);
    let mut matches = Vec::new();
    let mut possession = Vec::new();
    let mut shots_on = Vec::new();
    let mut shots_off = Vec::new();
    for home in 0..team_count {
        for away in 0..team_count {
            if home == away {
                continue;
            }
            let id = 1_000 + matches.len() as u64;
            let matchday = matches.len() as i64 / 2;
            let (home_players, home_player_y) = lineup(&mut rng, &squads[home], spec);
            let (away_players, away_player_y) = lineup(&mut rng, &squads[away], spec);
            matches.push(MatchRecord {
                id,
                date: season_start.map(|d| d + Duration::days(matchday)),
                home_team_id: teams[home].team_api_id,
                away_team_id: teams[away].team_api_id,
                home_goals: Some(rng.gen_range(0..=4)),
                away_goals: Some(rng.gen_range(0..=3)),
                home_players,
                away_players,
                home_player_y,
                away_player_y,
            });

            for _ in 0..3 {
                let home_pos = rng.gen_range(35..=65) as f64;
                possession.push(PossessionSample {
                    match_id: id,
                    home: Some(home_pos),
                    away: Some(100.0 - home_pos),
                });
            }
            for team_id in [teams[home].team_api_id, teams[away].team_api_id] {
                for _ in 0..rng.gen_range(1..=8) {
                    shots_on.push(ShotEvent { match_id: id, team_id });
                }
                for _ in 0..rng.gen_range(1..=9) {
                    shots_off.push(ShotEvent { match_id: id, team_id });
                }
            }
        }
    }

    let mut team_attributes = Vec::new();
    for team in &teams {
        for year in [2014, 2015] {
            team_attributes.push(TeamAttributeSnapshot {
                team_id: team.team_api_id,
                date: at(year, 9, 10),
                values: TacticalAttribute::ALL
                    .into_iter()
                    .map(|attr| (attr, rng.gen_range(20..=80) as f64))
                    .collect(),
            });
        }
    }

    let slot_roles = (1..=11)
        .map(|y| SlotRoleEntry {
            slot_y: y,
            role: match y {
                1 => Role::Goalkeeper,
                2..=4 => Role::Back,
                5..=8 => Role::Midfield,
                _ => Role::Forward,
            },
        })
        .collect();

    let promising_names = players
        .iter()
        .step_by(2)
        .map(|p| p.player_name.clone())
        .collect();

    Tables {
        matches,
        players,
        player_attributes,
        teams,
        team_attributes,
        possession,
        shots_on,
        shots_off,
        slot_roles,
        promising_names,
    }
}

/// Two yearly snapshots, the later one slightly improved. Role attributes get a bonus.
fn snapshots(rng: &mut StdRng, player_id: u64, role: Role) -> Vec<PlayerAttributeSnapshot> {
    let quality: f64 = rng.gen_range(50..=84) as f64;
    let headroom: f64 = rng.gen_range(0..=14) as f64;
    let strengths: &[Attribute] = role.tag().map(RoleTag::attributes).unwrap_or(&[]);

    [(2015, 0.0), (2016, 2.0)]
        .into_iter()
        .map(|(year, growth)| {
            let overall = (quality + growth).min(94.0);
            let attributes = Attribute::ALL
                .into_iter()
                .map(|attr| {
                    let bonus = if strengths.contains(&attr) { 6.0 } else { -4.0 };
                    let jitter = rng.gen_range(-10..=10) as f64;
                    (attr, (overall + bonus + jitter).clamp(15.0, 97.0))
                })
                .collect();
            PlayerAttributeSnapshot {
                player_id,
                date: at(year, 2, 1),
                overall_rating: Some(overall),
                potential: Some((overall + headroom).min(95.0)),
                attributes,
            }
        })
        .collect()
}

type Side = ([Option<u64>; SLOTS_PER_SIDE], [Option<i64>; SLOTS_PER_SIDE]);

fn lineup(rng: &mut StdRng, squad: &BTreeMap<Role, Vec<u64>>, spec: SyntheticSpec) -> Side {
    let mut players = [None; SLOTS_PER_SIDE];
    let mut ys = [None; SLOTS_PER_SIDE];
    let mut slot = 0usize;
    for (role, count, y) in LINEUP {
        let mut pool = squad.get(&role).cloned().unwrap_or_default();
        pool.shuffle(rng);
        for id in pool.into_iter().take(count) {
            let shifted = role != Role::Goalkeeper && rng.gen_range(0..100) < spec.out_of_position_pct;
            let row = if shifted {
                match role {
                    Role::Back => slot_row(Role::Midfield),
                    Role::Forward => slot_row(Role::Midfield),
                    _ => slot_row(Role::Back),
                }
            } else {
                y
            };
            if slot < SLOTS_PER_SIDE {
                players[slot] = Some(id);
                ys[slot] = Some(row);
                slot += 1;
            }
        }
    }
    (players, ys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_tables() {
        let a = generate(SyntheticSpec::default());
        let b = generate(SyntheticSpec::default());
        assert_eq!(a.players, b.players);
        assert_eq!(a.player_attributes, b.player_attributes);
        assert_eq!(a.matches.len(), 12 * 11);
    }

    #[test]
    fn every_lineup_is_full() {
        let tables = generate(SyntheticSpec::default());
        for m in &tables.matches {
            assert_eq!(m.appearances().count(), 2 * SLOTS_PER_SIDE);
        }
    }
}
