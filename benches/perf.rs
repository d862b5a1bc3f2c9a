use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use scout_insights::attributes::normalize_latest;
use scout_insights::config::PipelineConfig;
use scout_insights::heatmap::project_tag;
use scout_insights::join::JoinReport;
use scout_insights::model::{RoleTag, TacticalAttribute, Tables};
use scout_insights::partition::build_role_datasets;
use scout_insights::pipeline::slot_map;
use scout_insights::promising::{ScanCriteria, scan};
use scout_insights::roles::{RolePolicy, appearances, resolve_roles};
use scout_insights::synthetic::{SyntheticSpec, generate};
use scout_insights::tables::RawTables;
use scout_insights::team_performance::{TeamPerformanceInput, aggregate};

fn league() -> Tables {
    generate(SyntheticSpec {
        teams: 20,
        ..Default::default()
    })
}

fn bench_resolve_roles(c: &mut Criterion) {
    let tables = league();
    let map = slot_map(&tables, &PipelineConfig::default());
    let seen = appearances(&tables.matches);
    c.bench_function("resolve_roles", |b| {
        b.iter(|| {
            let roles = resolve_roles(black_box(&seen), &map, RolePolicy::MostFrequent);
            black_box(roles.roles.len());
        })
    });
}

fn bench_role_datasets(c: &mut Criterion) {
    let tables = league();
    let map = slot_map(&tables, &PipelineConfig::default());
    let roles = resolve_roles(&appearances(&tables.matches), &map, RolePolicy::MostFrequent);
    c.bench_function("latest_and_heatmaps", |b| {
        b.iter(|| {
            let mut joins = JoinReport::default();
            let latest = normalize_latest(
                black_box(&tables.player_attributes),
                &tables.players,
                &mut joins,
            );
            let datasets = build_role_datasets(&tables.promising_names, &latest, &roles);
            for tag in RoleTag::ALL {
                black_box(project_tag(datasets.get(tag), tag).values.len());
            }
        })
    });
}

fn bench_team_aggregate(c: &mut Criterion) {
    let tables = league();
    let input = TeamPerformanceInput {
        matches: &tables.matches,
        teams: &tables.teams,
        team_attributes: &tables.team_attributes,
        possession: &tables.possession,
        shots_on: &tables.shots_on,
        shots_off: &tables.shots_off,
    };
    c.bench_function("team_aggregate", |b| {
        b.iter(|| {
            let report = aggregate(
                black_box(&input),
                8558,
                5,
                &TacticalAttribute::DEFAULT_SELECTION,
            )
            .unwrap();
            black_box(report.rows.len());
        })
    });
}

fn bench_scan(c: &mut Criterion) {
    let tables = league();
    c.bench_function("promising_scan", |b| {
        b.iter(|| {
            let mut joins = JoinReport::default();
            let report = scan(
                black_box(&tables.player_attributes),
                &tables.players,
                ScanCriteria::default(),
                &mut joins,
            );
            black_box(report.promising.len());
        })
    });
}

fn bench_raw_parse(c: &mut Criterion) {
    let raw = RawTables::from_tables(&league());
    c.bench_function("raw_tables_parse", |b| {
        b.iter(|| {
            let tables = black_box(raw.clone()).into_tables().unwrap();
            black_box(tables.matches.len());
        })
    });
}

criterion_group!(
    perf,
    bench_resolve_roles,
    bench_role_datasets,
    bench_team_aggregate,
    bench_scan,
    bench_raw_parse
);
criterion_main!(perf);
