use chrono::{NaiveDate, NaiveDateTime};

use scout_insights::model::{MatchRecord, PlayerAppearance, Role, SlotRoleEntry};
use scout_insights::roles::{
    DEFAULT_SLOT_UPPER_BOUND, FormationSlotRoleMap, RolePolicy, appearances, resolve_roles,
};

fn day(d: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2015, 3, d).and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn app(match_id: u64, date: u32, player_id: u64, y: i64) -> PlayerAppearance {
    PlayerAppearance {
        match_id,
        match_date: day(date),
        player_id,
        slot_y: Some(y),
    }
}

fn reference() -> FormationSlotRoleMap {
    let entries = [
        (1, Role::Goalkeeper),
        (3, Role::Back),
        (7, Role::Midfield),
        (10, Role::Forward),
    ]
    .map(|(slot_y, role)| SlotRoleEntry { slot_y, role });
    FormationSlotRoleMap::from_entries(&entries, DEFAULT_SLOT_UPPER_BOUND)
}

#[test]
fn coordinates_at_or_above_bound_are_excluded() {
    let apps = vec![app(1, 1, 7, 12), app(2, 2, 7, 40), app(3, 3, 8, 10)];
    let resolved = resolve_roles(&apps, &reference(), RolePolicy::MostFrequent);

    assert_eq!(resolved.role_of(7), None);
    assert_eq!(resolved.role_of(8), Some(Role::Forward));
    assert_eq!(resolved.appearances_seen, 3);
    assert_eq!(resolved.appearances_discarded, 2);
}

#[test]
fn unmapped_in_range_coordinate_is_unknown() {
    let resolved = resolve_roles(&[app(1, 1, 5, 5)], &reference(), RolePolicy::MostFrequent);
    assert_eq!(resolved.role_of(5), Some(Role::Unknown));
}

#[test]
fn most_frequent_beats_last_observed() {
    let apps = vec![
        app(1, 1, 9, 7),
        app(2, 2, 9, 7),
        app(3, 3, 9, 7),
        app(4, 4, 9, 3),
    ];
    let map = reference();
    let freq = resolve_roles(&apps, &map, RolePolicy::MostFrequent);
    let last = resolve_roles(&apps, &map, RolePolicy::LastObserved);

    assert_eq!(freq.role_of(9), Some(Role::Midfield));
    assert_eq!(last.role_of(9), Some(Role::Back));
    assert_eq!(freq.conflicted_players(), 1);
    assert_eq!(freq.observations[&9].count(Role::Midfield), 3);
}

#[test]
fn frequency_tie_goes_to_most_recent_match() {
    // Processing order puts the older back appearance last.
    let apps = vec![app(2, 20, 4, 10), app(1, 5, 4, 3)];
    let resolved = resolve_roles(&apps, &reference(), RolePolicy::MostFrequent);
    assert_eq!(resolved.role_of(4), Some(Role::Forward));
}

#[test]
fn frequency_tie_without_dates_goes_to_later_processing() {
    let mut first = app(1, 1, 4, 10);
    let mut second = app(2, 1, 4, 3);
    first.match_date = None;
    second.match_date = None;
    let resolved = resolve_roles(&[first, second], &reference(), RolePolicy::MostFrequent);
    assert_eq!(resolved.role_of(4), Some(Role::Back));
}

#[test]
fn appearances_follow_home_then_away_slot_order() {
    let mut m = MatchRecord {
        id: 77,
        date: day(9),
        ..Default::default()
    };
    m.home_players[0] = Some(1);
    m.home_player_y[0] = Some(1);
    m.home_players[10] = Some(11);
    m.home_player_y[10] = Some(10);
    m.away_players[0] = Some(21);
    m.away_player_y[0] = Some(1);
    m.away_players[4] = Some(25);

    let apps = appearances(&[m]);
    let ids: Vec<u64> = apps.iter().map(|a| a.player_id).collect();
    assert_eq!(ids, vec![1, 11, 21, 25]);
    assert!(apps.iter().all(|a| a.match_id == 77));
    assert_eq!(apps[3].slot_y, None);

    let resolved = resolve_roles(&apps, &reference(), RolePolicy::MostFrequent);
    assert_eq!(resolved.role_of(25), None);
    assert_eq!(resolved.role_counts().get(&Role::Goalkeeper), Some(&2));
}
