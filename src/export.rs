use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::info;

use crate::charts::{ChartFormat, NamedFigure};
use crate::heatmap::RATIO_COLUMN;
use crate::partition::{RoleDatasets, RolePartitionedDataset};
use crate::promising::ScanReport;
use crate::team_performance::TeamPerformanceReport;

pub const CHARTS_DIR: &str = "charts";
pub const SUMMARY_FILE: &str = "summary.xlsx";

/// `fw_players.csv`, `mf_players.csv`, `bk_players.csv`.
pub fn role_file_name(dataset: &RolePartitionedDataset) -> String {
    format!("{}_players.csv", dataset.tag.as_str())
}

/// Header row plus one row per player; missing values are empty cells.
pub fn role_rows(dataset: &RolePartitionedDataset) -> Vec<Vec<String>> {
    let mut header = vec!["player_name".to_string(), RATIO_COLUMN.to_string()];
    header.extend(dataset.columns().iter().map(|a| a.column().to_string()));

    let mut rows = Vec::with_capacity(dataset.len() + 1);
    rows.push(header);
    for row in &dataset.rows {
        let mut out = vec![
            row.player_name.clone(),
            opt_to_string(row.potential_rating_ratio),
        ];
        out.extend(row.values.iter().map(|v| opt_to_string(*v)));
        rows.push(out);
    }
    rows
}

pub fn write_role_csv(path: &Path, dataset: &RolePartitionedDataset) -> Result<usize> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    let rows = role_rows(dataset);
    for row in &rows {
        writer
            .write_record(row)
            .with_context(|| format!("write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(rows.len().saturating_sub(1))
}

pub fn write_role_csvs(out_dir: &Path, datasets: &RoleDatasets) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for dataset in datasets.iter() {
        let path = out_dir.join(role_file_name(dataset));
        let rows = write_role_csv(&path, dataset)?;
        info!(path = %path.display(), rows, "wrote role dataset");
        written.push(path);
    }
    Ok(written)
}

pub fn write_names(path: &Path, names: &[String]) -> Result<()> {
    let mut body = names.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    write_atomic(path, body.as_bytes())
}

/// Write to a sibling temp file, then swap it into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}

pub fn write_charts(
    out_dir: &Path,
    figures: &[NamedFigure],
    format: ChartFormat,
) -> Result<Vec<PathBuf>> {
    let dir = out_dir.join(CHARTS_DIR);
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    let mut written = Vec::with_capacity(figures.len());
    for named in figures {
        let path = dir.join(format!("{}.json", named.name));
        let body = format
            .render(&named.figure)
            .with_context(|| format!("render chart {}", named.name))?;
        write_atomic(&path, body.as_bytes())?;
        written.push(path);
    }
    info!(dir = %dir.display(), charts = written.len(), "wrote chart documents");
    Ok(written)
}

fn opponent_rows(report: &TeamPerformanceReport) -> Vec<Vec<String>> {
    let metrics = report.metrics();
    let mut header = vec![
        "opponent_team_api_id".to_string(),
        "team_long_name".to_string(),
        "matches".to_string(),
        "avg_points".to_string(),
        "classification".to_string(),
    ];
    header.extend(metrics.iter().map(|m| m.name().to_string()));

    let mut rows = vec![header];
    for r in &report.rows {
        let mut row = vec![
            r.record.opponent_id.to_string(),
            r.record.opponent_name.clone(),
            r.record.matches.to_string(),
            format!("{:.3}", r.record.avg_points),
            r.record.tier.label().to_string(),
        ];
        row.extend(metrics.iter().map(|m| opt_to_string(r.metric(*m))));
        rows.push(row);
    }
    rows
}

fn promising_rows(scan: &ScanReport) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "player_name".to_string(),
        "age".to_string(),
        "potential".to_string(),
        "potential_age_ratio".to_string(),
    ]];
    for p in &scan.promising {
        rows.push(vec![
            p.player_name.clone(),
            format!("{:.2}", p.age),
            p.potential.to_string(),
            format!("{:.4}", p.potential_age_ratio),
        ]);
    }
    rows
}

/// One workbook with a sheet per role dataset plus whatever team and scan results exist.
pub fn write_summary(
    path: &Path,
    datasets: Option<&RoleDatasets>,
    teams: Option<&TeamPerformanceReport>,
    scan: Option<&ScanReport>,
) -> Result<()> {
    let mut workbook = Workbook::new();
    if let Some(datasets) = datasets {
        for dataset in datasets.iter() {
            let sheet = workbook.add_worksheet();
            sheet.set_name(dataset.tag.title())?;
            write_rows(sheet, &role_rows(dataset))?;
        }
    }
    if let Some(report) = teams {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Opponents")?;
        write_rows(sheet, &opponent_rows(report))?;
    }
    if let Some(scan) = scan {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Promising")?;
        write_rows(sheet, &promising_rows(scan))?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    info!(path = %path.display(), "wrote summary workbook");
    Ok(())
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
