use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use scout_insights::charts::{ChartFormat, Palette};
use scout_insights::config::{ConfigOverrides, PipelineConfig};
use scout_insights::error::PipelineError;
use scout_insights::model::TacticalAttribute;
use scout_insights::roles::RolePolicy;

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn defaults_match_the_reference_analysis() {
    let cfg = PipelineConfig::default();
    assert_eq!(cfg.target_team_id, 8558);
    assert_eq!(cfg.top_n, 5);
    assert_eq!(cfg.baseline, 1.1);
    assert_eq!(cfg.slot_upper_bound, 12);
    assert_eq!(cfg.role_policy, RolePolicy::MostFrequent);
    assert_eq!(cfg.style_attributes.len(), 5);
    assert_eq!(cfg.swarm.threshold, 1.0);
    assert_eq!(cfg.swarm.spread, 0.04);
}

#[test]
fn file_then_env_then_flags() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("scout.json");
    fs::write(
        &path,
        r#"{
            "target_team_id": 1,
            "top_n": 3,
            "baseline": 1.5,
            "palette": "print",
            "role_policy": "last-observed",
            "swarm": { "spread": 0.1 }
        }"#,
    )
    .unwrap();

    let mut cfg = PipelineConfig::from_json_file(&path).unwrap();
    assert_eq!(cfg.target_team_id, 1);
    assert_eq!(cfg.palette, Palette::Print);
    assert_eq!(cfg.swarm.spread, 0.1);
    assert_eq!(cfg.swarm.threshold, 1.0);
    assert_eq!(cfg.slot_upper_bound, 12);

    let env = vars(&[
        ("SCOUT_TEAM_ID", "2"),
        ("SCOUT_TOP_N", "4"),
        ("SCOUT_CHART_FORMAT", "json-pretty"),
        ("SCOUT_BASELINE", "not a number"),
        ("SCOUT_STYLE_ATTRIBUTES", "defencePressure"),
    ]);
    cfg.apply_vars(|key| env.get(key).cloned());
    assert_eq!(cfg.target_team_id, 2);
    assert_eq!(cfg.top_n, 4);
    assert_eq!(cfg.baseline, 1.5);
    assert_eq!(cfg.chart_format, ChartFormat::JsonPretty);
    assert_eq!(cfg.style_attributes, vec![TacticalAttribute::DefencePressure]);

    let flags = ConfigOverrides {
        team_id: Some(3),
        out_dir: Some(PathBuf::from("elsewhere")),
        role_policy: Some("most-frequent".to_string()),
        strict_joins: true,
        ..Default::default()
    };
    flags.apply(&mut cfg).unwrap();
    assert_eq!(cfg.target_team_id, 3);
    assert_eq!(cfg.top_n, 4);
    assert_eq!(cfg.out_dir, PathBuf::from("elsewhere"));
    assert_eq!(cfg.role_policy, RolePolicy::MostFrequent);
    assert!(cfg.strict_joins);
}

#[test]
fn bad_flag_values_are_config_errors() {
    let mut cfg = PipelineConfig::default();
    let flags = ConfigOverrides {
        palette: Some("neon".to_string()),
        ..Default::default()
    };
    let err = flags.apply(&mut cfg).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidConfig { field: "palette", .. }));

    let flags = ConfigOverrides {
        style: Some("buildUpPlaySpeed,tikiTaka".to_string()),
        ..Default::default()
    };
    assert!(flags.apply(&mut cfg).is_err());
}

#[test]
fn allow_list_defaults_to_data_dir() {
    let cfg = PipelineConfig {
        data_dir: Some(PathBuf::from("data")),
        ..Default::default()
    };
    assert_eq!(
        cfg.promising_names_path(),
        Some(PathBuf::from("data").join("promising_names.txt"))
    );
}
