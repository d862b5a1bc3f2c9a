use std::fs;
use std::path::Path;

use scout_insights::model::{Role, TacticalAttribute};
use scout_insights::sqlite_source::{load_sqlite, write_sqlite};
use scout_insights::synthetic::{self, SyntheticSpec};
use scout_insights::tables::{RawTables, load_csv_dir, write_csv_dir};

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).expect("write fixture");
}

fn minimal_dir(dir: &Path) {
    write(
        dir,
        "Match.csv",
        "id,date,home_team_api_id,away_team_api_id,home_team_goal,away_team_goal,home_player_1,home_player_Y1,away_player_1,away_player_Y1\n\
         1,2015-08-22 00:00:00,8558,9001,2,1,501.0,1.0,,NA\n\
         2,2015-08-29,9001,8558,nan,0,,,502,3\n",
    );
    write(
        dir,
        "Player.csv",
        "id,player_api_id,player_name,birthday\n\
         1,501,Keeper Uno,1994-02-01 00:00:00\n\
         2,502,Back Dos,1997-05-10 00:00:00\n",
    );
    write(
        dir,
        "Player_Attributes.csv",
        "id,player_api_id,date,overall_rating,potential,marking,crossing\n\
         1,502,2016-02-01 00:00:00,70,80,65,NULL\n",
    );
    write(
        dir,
        "Team.csv",
        "id,team_api_id,team_long_name,team_short_name\n\
         1,8558,RCD Espanyol,ESP\n\
         2,9001,Real Betis,\n",
    );
    write(
        dir,
        "Team_Attributes.csv",
        "id,team_api_id,date,buildUpPlaySpeed,defencePressure\n\
         1,9001,2015-09-10 00:00:00,55,\n",
    );
    write(dir, "promising_names.txt", "Back Dos\n\n  Keeper Uno  \n");
}

#[test]
fn csv_directory_loads_with_optional_tables_missing() {
    let tmp = tempfile::tempdir().unwrap();
    minimal_dir(tmp.path());
    let tables = load_csv_dir(tmp.path()).unwrap();

    assert_eq!(tables.matches.len(), 2);
    let first = &tables.matches[0];
    assert_eq!(first.home_players[0], Some(501));
    assert_eq!(first.home_player_y[0], Some(1));
    assert_eq!(first.away_players[0], None);
    assert_eq!(first.home_players[5], None);
    assert_eq!(tables.matches[1].home_goals, None);
    assert!(tables.matches[1].date.is_some());

    let snap = &tables.player_attributes[0];
    assert_eq!(snap.potential, Some(80.0));
    assert_eq!(
        snap.attribute(scout_insights::model::Attribute::Marking),
        Some(65.0)
    );
    assert_eq!(
        snap.attribute(scout_insights::model::Attribute::Crossing),
        None
    );

    assert_eq!(tables.teams[1].team_short_name, None);
    assert_eq!(
        tables.team_attributes[0]
            .values
            .get(&TacticalAttribute::BuildUpPlaySpeed),
        Some(&55.0)
    );
    assert!(tables.possession.is_empty());
    assert!(tables.shots_on.is_empty());
    assert!(tables.slot_roles.is_empty());
    assert_eq!(tables.promising_names, vec!["Back Dos", "Keeper Uno"]);
}

#[test]
fn missing_required_table_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    minimal_dir(tmp.path());
    fs::remove_file(tmp.path().join("Team.csv")).unwrap();
    let err = load_csv_dir(tmp.path()).unwrap_err();
    assert!(format!("{err:#}").contains("Team.csv"));
}

#[test]
fn missing_required_column_names_the_column() {
    let tmp = tempfile::tempdir().unwrap();
    minimal_dir(tmp.path());
    write(tmp.path(), "Team.csv", "id,team_api_id\n1,8558\n");
    let err = load_csv_dir(tmp.path()).unwrap_err();
    assert!(format!("{err:#}").contains("team_long_name"));
}

#[test]
fn csv_and_sqlite_sources_agree() {
    let tables = synthetic::generate(SyntheticSpec {
        teams: 4,
        ..Default::default()
    });
    let raw = RawTables::from_tables(&tables);

    let tmp = tempfile::tempdir().unwrap();
    let csv_dir = tmp.path().join("csv");
    write_csv_dir(&csv_dir, &raw).unwrap();
    let db = tmp.path().join("league.sqlite");
    write_sqlite(&db, &raw).unwrap();

    let from_csv = load_csv_dir(&csv_dir).unwrap();
    let from_db = load_sqlite(&db, Some(tables.promising_names.clone())).unwrap();

    assert_eq!(from_csv.players, tables.players);
    assert_eq!(from_csv.player_attributes, tables.player_attributes);
    assert_eq!(from_csv.teams, from_db.teams);
    assert_eq!(from_csv.player_attributes, from_db.player_attributes);
    assert_eq!(from_csv.team_attributes, from_db.team_attributes);
    assert_eq!(from_csv.possession, from_db.possession);
    assert_eq!(from_csv.shots_on, from_db.shots_on);
    assert_eq!(from_csv.slot_roles, from_db.slot_roles);
    assert_eq!(from_csv.promising_names, from_db.promising_names);
    assert_eq!(from_csv.matches.len(), from_db.matches.len());
    for (a, b) in from_csv.matches.iter().zip(&from_db.matches) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.date, b.date);
        assert_eq!(a.home_players, b.home_players);
        assert_eq!(a.away_player_y, b.away_player_y);
    }
    assert_eq!(from_db.slot_roles[0].role, Role::Goalkeeper);
}
