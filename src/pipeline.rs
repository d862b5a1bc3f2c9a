use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::attributes::{NormalizedSnapshot, normalize_latest};
use crate::charts::{self, NamedFigure};
use crate::config::PipelineConfig;
use crate::export::{self, SUMMARY_FILE};
use crate::heatmap::{HeatmapMatrix, project_tag};
use crate::join::JoinReport;
use crate::model::{RoleTag, Tables};
use crate::partition::{RoleDatasets, build_role_datasets};
use crate::promising::{self, ScanReport};
use crate::roles::{FormationSlotRoleMap, ResolvedRoles, appearances, resolve_roles};
use crate::sqlite_source::load_sqlite;
use crate::tables::{load_csv_dir, read_name_list};
use crate::team_performance::{self, TeamPerformanceInput, TeamPerformanceReport};

pub const PROMISING_OUTPUT: &str = "promising_names.txt";

/// Read the configured source. SQLite wins when both a database and a directory are set.
pub fn load_tables(cfg: &PipelineConfig) -> Result<Tables> {
    if let Some(db) = &cfg.sqlite_path {
        let names = match cfg.promising_names_path() {
            Some(path) if path.exists() => Some(read_name_list(&path)?),
            _ => None,
        };
        return load_sqlite(db, names);
    }
    let Some(dir) = &cfg.data_dir else {
        bail!("no input configured: set a data directory or a sqlite database");
    };
    let mut tables = load_csv_dir(dir)?;
    if let Some(path) = &cfg.promising_names {
        tables.promising_names = read_name_list(path)?;
    }
    Ok(tables)
}

/// The reference table when one was loaded, else the standard formation layout.
pub fn slot_map(tables: &Tables, cfg: &PipelineConfig) -> FormationSlotRoleMap {
    if tables.slot_roles.is_empty() {
        info!("no position reference table; using the standard formation rows");
        FormationSlotRoleMap::standard(cfg.slot_upper_bound)
    } else {
        FormationSlotRoleMap::from_entries(&tables.slot_roles, cfg.slot_upper_bound)
    }
}

#[derive(Debug, Clone)]
pub struct PlayerInsights {
    pub roles: ResolvedRoles,
    pub latest: Vec<NormalizedSnapshot>,
    pub datasets: RoleDatasets,
    pub heatmaps: Vec<HeatmapMatrix>,
    pub joins: JoinReport,
}

/// Roles, latest snapshots, role datasets and one heatmap per role for `allow_list`.
pub fn analyze_players(
    tables: &Tables,
    cfg: &PipelineConfig,
    allow_list: &[String],
) -> Result<PlayerInsights> {
    let map = slot_map(tables, cfg);
    let roles = resolve_roles(&appearances(&tables.matches), &map, cfg.role_policy);

    let mut joins = JoinReport::default();
    let latest = normalize_latest(&tables.player_attributes, &tables.players, &mut joins);
    joins.check(cfg.strict_joins)?;

    if allow_list.is_empty() {
        warn!("allow-list is empty; role datasets will be empty");
    }
    let datasets = build_role_datasets(allow_list, &latest, &roles);
    let heatmaps = RoleTag::ALL
        .into_iter()
        .map(|tag| project_tag(datasets.get(tag), tag))
        .collect();

    Ok(PlayerInsights {
        roles,
        latest,
        datasets,
        heatmaps,
        joins,
    })
}

pub fn analyze_teams(tables: &Tables, cfg: &PipelineConfig) -> Result<TeamPerformanceReport> {
    let input = TeamPerformanceInput {
        matches: &tables.matches,
        teams: &tables.teams,
        team_attributes: &tables.team_attributes,
        possession: &tables.possession,
        shots_on: &tables.shots_on,
        shots_off: &tables.shots_off,
    };
    let report = team_performance::aggregate(
        &input,
        cfg.target_team_id,
        cfg.top_n,
        &cfg.style_attributes,
    )?;
    report.joins.check(cfg.strict_joins)?;
    Ok(report)
}

pub fn scan_players(tables: &Tables, cfg: &PipelineConfig) -> Result<ScanReport> {
    let mut joins = JoinReport::default();
    let report = promising::scan(
        &tables.player_attributes,
        &tables.players,
        cfg.scan,
        &mut joins,
    );
    joins.check(cfg.strict_joins)?;
    Ok(report)
}

pub fn player_figures(insights: &PlayerInsights, cfg: &PipelineConfig) -> Vec<NamedFigure> {
    insights
        .heatmaps
        .iter()
        .map(|m| NamedFigure {
            name: format!("heatmap_{}", m.tag.as_str()),
            figure: charts::role_heatmap(m, cfg.palette),
        })
        .collect()
}

pub fn team_figures(report: &TeamPerformanceReport, cfg: &PipelineConfig) -> Vec<NamedFigure> {
    let mut out = vec![NamedFigure {
        name: "points_bar".to_string(),
        figure: charts::points_bar(report, cfg.baseline, cfg.palette),
    }];
    out.extend(report.metrics().into_iter().map(|metric| NamedFigure {
        name: format!("violin_{}", metric.name()),
        figure: charts::metric_violin(report, metric, cfg.palette, cfg.swarm),
    }));
    out
}

/// Files produced by one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub files: Vec<PathBuf>,
    pub join_issues: usize,
}

/// Which analyses a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stages {
    pub scan: bool,
    pub players: bool,
    pub teams: bool,
}

impl Stages {
    pub const ALL: Stages = Stages {
        scan: true,
        players: true,
        teams: true,
    };
}

/// Run the selected stages and write every output under `cfg.out_dir`.
/// When the scan runs, its result is the allow-list for the player stage.
pub fn run(tables: &Tables, cfg: &PipelineConfig, stages: Stages) -> Result<RunSummary> {
    cfg.validate()?;
    fs::create_dir_all(&cfg.out_dir)
        .with_context(|| format!("create output dir {}", cfg.out_dir.display()))?;

    let mut summary = RunSummary::default();
    let mut figures = Vec::new();

    let scan = if stages.scan {
        let report = scan_players(tables, cfg)?;
        let path = cfg.out_dir.join(PROMISING_OUTPUT);
        export::write_names(&path, &report.names())?;
        info!(path = %path.display(), promising = report.promising.len(), "wrote allow-list");
        summary.files.push(path);
        figures.push(NamedFigure {
            name: "promising_scatter".to_string(),
            figure: charts::scan_scatter(&report),
        });
        Some(report)
    } else {
        None
    };

    let players = if stages.players {
        let allow_list = match &scan {
            Some(report) => report.names(),
            None => tables.promising_names.clone(),
        };
        let insights = analyze_players(tables, cfg, &allow_list)?;
        summary
            .files
            .extend(export::write_role_csvs(&cfg.out_dir, &insights.datasets)?);
        figures.extend(player_figures(&insights, cfg));
        summary.join_issues += insights.joins.issue_count();
        Some(insights)
    } else {
        None
    };

    let teams = if stages.teams {
        let report = analyze_teams(tables, cfg)?;
        figures.extend(team_figures(&report, cfg));
        summary.join_issues += report.joins.issue_count();
        Some(report)
    } else {
        None
    };

    summary
        .files
        .extend(export::write_charts(&cfg.out_dir, &figures, cfg.chart_format)?);

    let workbook = cfg.out_dir.join(SUMMARY_FILE);
    export::write_summary(
        &workbook,
        players.as_ref().map(|p| &p.datasets),
        teams.as_ref(),
        scan.as_ref(),
    )?;
    summary.files.push(workbook);

    info!(
        files = summary.files.len(),
        join_issues = summary.join_issues,
        "run complete"
    );
    Ok(summary)
}
