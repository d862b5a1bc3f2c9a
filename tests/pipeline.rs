use std::fs;

use scout_insights::config::PipelineConfig;
use scout_insights::model::RoleTag;
use scout_insights::pipeline::{self, Stages};
use scout_insights::synthetic::{self, SyntheticSpec};
use scout_insights::tables::{RawTables, write_csv_dir};

fn demo_config(out: &std::path::Path) -> PipelineConfig {
    PipelineConfig {
        out_dir: out.to_path_buf(),
        ..Default::default()
    }
}

#[test]
fn full_run_writes_every_output() {
    let tables = synthetic::generate(SyntheticSpec::default());
    let tmp = tempfile::tempdir().unwrap();
    let cfg = demo_config(tmp.path());

    let summary = pipeline::run(&tables, &cfg, Stages::ALL).unwrap();

    for name in [
        "fw_players.csv",
        "mf_players.csv",
        "bk_players.csv",
        "promising_names.txt",
        "summary.xlsx",
        "charts/promising_scatter.json",
        "charts/points_bar.json",
        "charts/heatmap_fw.json",
        "charts/violin_possession.json",
        "charts/violin_buildUpPlaySpeed.json",
    ] {
        assert!(tmp.path().join(name).exists(), "missing {name}");
    }
    assert!(summary.files.len() >= 10);

    let bar: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(tmp.path().join("charts/points_bar.json")).unwrap())
            .unwrap();
    assert_eq!(bar["data"][0]["type"], "bar");
    assert_eq!(bar["data"][0]["x"].as_array().unwrap().len(), 11);
    assert_eq!(bar["layout"]["shapes"][0]["y0"], 1.1);
}

#[test]
fn players_stage_uses_loaded_allow_list() {
    let tables = synthetic::generate(SyntheticSpec::default());
    let cfg = PipelineConfig::default();
    let insights = pipeline::analyze_players(&tables, &cfg, &tables.promising_names).unwrap();

    let total: usize = insights.datasets.iter().map(|d| d.len()).sum();
    assert!(total > 0);
    for tag in RoleTag::ALL {
        let set = insights.datasets.get(tag);
        for name in set.player_names() {
            assert!(tables.promising_names.iter().any(|n| n == name));
        }
    }
    assert_eq!(insights.heatmaps.len(), 3);
    assert!(insights.joins.is_clean());
}

#[test]
fn reruns_are_identical() {
    let tables = synthetic::generate(SyntheticSpec::default());
    let cfg = PipelineConfig::default();
    let a = pipeline::analyze_teams(&tables, &cfg).unwrap();
    let b = pipeline::analyze_teams(&tables, &cfg).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.rows.len(), 12);
}

#[test]
fn csv_directory_runs_end_to_end() {
    let tables = synthetic::generate(SyntheticSpec {
        teams: 6,
        ..Default::default()
    });
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    write_csv_dir(&data, &RawTables::from_tables(&tables)).unwrap();

    let cfg = PipelineConfig {
        data_dir: Some(data),
        out_dir: tmp.path().join("out"),
        ..Default::default()
    };
    let loaded = pipeline::load_tables(&cfg).unwrap();
    assert_eq!(loaded.promising_names, tables.promising_names);

    let stages = Stages {
        scan: false,
        players: true,
        teams: false,
    };
    pipeline::run(&loaded, &cfg, stages).unwrap();
    let fw = fs::read_to_string(tmp.path().join("out/fw_players.csv")).unwrap();
    assert!(fw.starts_with("player_name,potential_rating_ratio,finishing"));
    assert!(!tmp.path().join("out/promising_names.txt").exists());
}

#[test]
fn strict_joins_fail_on_unknown_opponent() {
    let mut tables = synthetic::generate(SyntheticSpec {
        teams: 3,
        ..Default::default()
    });
    tables.teams.retain(|t| t.team_api_id == 8558);
    let cfg = PipelineConfig {
        strict_joins: true,
        ..Default::default()
    };
    assert!(pipeline::analyze_teams(&tables, &cfg).is_err());

    let lenient = PipelineConfig::default();
    let report = pipeline::analyze_teams(&tables, &lenient).unwrap();
    assert!(!report.joins.is_clean());
}

#[test]
fn missing_source_is_reported() {
    let err = pipeline::load_tables(&PipelineConfig::default()).unwrap_err();
    assert!(err.to_string().contains("no input configured"));
}
