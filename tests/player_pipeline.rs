use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};

use scout_insights::attributes::normalize_latest;
use scout_insights::error::PipelineError;
use scout_insights::heatmap::{RATIO_COLUMN, project, project_tag};
use scout_insights::join::JoinReport;
use scout_insights::model::{Attribute, Player, PlayerAttributeSnapshot, Role, RoleTag};
use scout_insights::partition::{RolePartitionedDataset, RoleRow, build_role_datasets};
use scout_insights::roles::ResolvedRoles;

fn date(y: i32, m: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(y, m, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn player(id: u64, name: &str) -> Player {
    Player {
        player_api_id: id,
        player_name: name.to_string(),
        birthday: date(1995, 6),
    }
}

/// Every attribute set to `level`.
fn snapshot(id: u64, when: Option<NaiveDateTime>, overall: f64, potential: f64, level: f64) -> PlayerAttributeSnapshot {
    PlayerAttributeSnapshot {
        player_id: id,
        date: when,
        overall_rating: Some(overall),
        potential: Some(potential),
        attributes: Attribute::ALL.into_iter().map(|a| (a, level)).collect(),
    }
}

fn roles(pairs: &[(u64, Role)]) -> ResolvedRoles {
    ResolvedRoles {
        roles: pairs.iter().copied().collect::<HashMap<_, _>>(),
        ..Default::default()
    }
}

#[test]
fn normalizer_keeps_latest_snapshot_per_player() {
    let snaps = vec![
        snapshot(1, date(2014, 1), 70.0, 80.0, 60.0),
        snapshot(1, date(2016, 1), 75.0, 82.0, 65.0),
        snapshot(1, date(2015, 1), 72.0, 81.0, 62.0),
        snapshot(2, date(2013, 1), 60.0, 66.0, 50.0),
    ];
    let players = vec![player(1, "Ana"), player(2, "Ben")];
    let mut joins = JoinReport::default();
    let latest = normalize_latest(&snaps, &players, &mut joins);

    assert_eq!(latest.len(), 2);
    let one = latest.iter().find(|s| s.player_id() == 1).unwrap();
    assert_eq!(one.date(), date(2016, 1));
    let ratio = one.potential_rating_ratio.unwrap();
    assert!((ratio - 82.0 / 75.0 * 100.0).abs() < 1e-9);
    assert_eq!(one.player_name.as_deref(), Some("Ana"));
    assert!(joins.is_clean());
}

#[test]
fn normalizer_reports_unknown_players_and_zero_ratings() {
    let snaps = vec![
        snapshot(3, date(2015, 1), 0.0, 70.0, 50.0),
        snapshot(99, date(2015, 1), 70.0, 70.0, 50.0),
    ];
    let mut joins = JoinReport::default();
    let latest = normalize_latest(&snaps, &[player(3, "Cal")], &mut joins);

    assert_eq!(latest[0].potential_rating_ratio, None);
    assert_eq!(latest[1].player_name, None);
    assert_eq!(joins.missing("player_attributes -> players"), &[99]);
}

#[test]
fn role_sets_are_disjoint_and_within_allow_list() {
    let players = vec![
        player(1, "Forward One"),
        player(2, "Mid Two"),
        player(3, "Back Three"),
        player(4, "Keeper Four"),
        player(5, "Unlisted Five"),
        player(6, "Unknown Six"),
    ];
    let snaps: Vec<_> = (1..=6)
        .map(|id| snapshot(id, date(2015, 1), 70.0, 77.0, 60.0))
        .collect();
    let mut joins = JoinReport::default();
    let latest = normalize_latest(&snaps, &players, &mut joins);
    let resolved = roles(&[
        (1, Role::Forward),
        (2, Role::Midfield),
        (3, Role::Back),
        (4, Role::Goalkeeper),
        (5, Role::Forward),
        (6, Role::Unknown),
    ]);
    let allow: Vec<String> = ["Forward One", "Mid Two", " Back Three ", "Keeper Four", "Unknown Six"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let sets = build_role_datasets(&allow, &latest, &resolved);
    assert_eq!(sets.forwards.player_names().collect::<Vec<_>>(), vec!["Forward One"]);
    assert_eq!(sets.midfielders.player_names().collect::<Vec<_>>(), vec!["Mid Two"]);
    assert_eq!(sets.backs.player_names().collect::<Vec<_>>(), vec!["Back Three"]);

    let mut seen = HashSet::new();
    let allowed: HashSet<&str> = allow.iter().map(|n| n.trim()).collect();
    for set in sets.iter() {
        for row in &set.rows {
            assert!(seen.insert(row.player_id), "player in two role sets");
            assert!(allowed.contains(row.player_name.as_str()));
        }
        assert_eq!(set.rows[0].values.len(), set.tag.attributes().len());
    }
}

fn row(name: &str, ratio: Option<f64>, fill: f64, n: usize) -> RoleRow {
    RoleRow {
        player_id: 0,
        player_name: name.to_string(),
        potential_rating_ratio: ratio,
        values: vec![Some(fill); n],
    }
}

#[test]
fn heatmap_sorts_descending_with_stable_ties() {
    let n = RoleTag::Forward.attributes().len();
    let dataset = RolePartitionedDataset {
        tag: RoleTag::Forward,
        rows: vec![
            row("low", Some(101.2), 1.0, n),
            row("tie-a", Some(110.9), 2.0, n),
            row("high", Some(125.0), 3.0, n),
            row("tie-b", Some(110.1), 4.0, n),
        ],
    };
    let matrix = project(&dataset, "fw").unwrap();

    assert_eq!(matrix.row_labels, vec!["high", "tie-a", "tie-b", "low"]);
    assert_eq!(matrix.columns[0], RATIO_COLUMN);
    assert_eq!(matrix.columns.len(), n + 1);
    assert_eq!(matrix.row("tie-a").unwrap()[0], 110.0);
    assert_eq!(matrix.row("tie-b").unwrap()[1], 4.0);
}

#[test]
fn heatmap_drops_rows_with_missing_values() {
    let n = RoleTag::Back.attributes().len();
    let mut gap = row("gap", Some(120.0), 5.0, n);
    gap.values[3] = None;
    let dataset = RolePartitionedDataset {
        tag: RoleTag::Back,
        rows: vec![gap, row("full", Some(105.0), 5.0, n), row("no-ratio", None, 5.0, n)],
    };
    let matrix = project_tag(&dataset, RoleTag::Back);
    assert_eq!(matrix.row_labels, vec!["full"]);
    assert_eq!(matrix.dropped_rows, 2);
}

#[test]
fn heatmap_rejects_unknown_tag() {
    let dataset = RolePartitionedDataset {
        tag: RoleTag::Back,
        rows: Vec::new(),
    };
    let err = project(&dataset, "gk").unwrap_err();
    assert!(matches!(err, PipelineError::UnsupportedRoleTag(tag) if tag == "gk"));
}

#[test]
fn heatmap_with_foreign_tag_drops_everything() {
    let n = RoleTag::Back.attributes().len();
    let dataset = RolePartitionedDataset {
        tag: RoleTag::Back,
        rows: vec![row("b", Some(100.0), 1.0, n)],
    };
    // Forward columns that backs do not carry leave every row incomplete.
    let matrix = project_tag(&dataset, RoleTag::Forward);
    assert!(matrix.values.is_empty());
}
