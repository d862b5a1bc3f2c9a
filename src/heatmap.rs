use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::model::RoleTag;
use crate::partition::RolePartitionedDataset;

pub const RATIO_COLUMN: &str = "potential_rating_ratio";

/// Player × attribute matrix, rows sorted by potential ratio (highest first).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapMatrix {
    pub tag: RoleTag,
    pub columns: Vec<String>,
    pub row_labels: Vec<String>,
    pub values: Vec<Vec<f64>>,
    pub dropped_rows: usize,
}

impl HeatmapMatrix {
    pub fn row(&self, player_name: &str) -> Option<&[f64]> {
        self.row_labels
            .iter()
            .position(|n| n == player_name)
            .map(|idx| self.values[idx].as_slice())
    }
}

/// Project a role dataset for the role named by `tag` (`bk`, `mf` or `fw`).
pub fn project(dataset: &RolePartitionedDataset, tag: &str) -> Result<HeatmapMatrix> {
    let tag: RoleTag = tag.parse()?;
    Ok(project_tag(dataset, tag))
}

pub fn project_tag(dataset: &RolePartitionedDataset, tag: RoleTag) -> HeatmapMatrix {
    let attrs = tag.attributes();
    let source_cols = dataset.columns();

    let mut rows: Vec<(String, Vec<f64>)> = Vec::with_capacity(dataset.rows.len());
    let mut dropped = 0usize;
    'rows: for row in &dataset.rows {
        let Some(ratio) = row.potential_rating_ratio else {
            dropped += 1;
            continue;
        };
        let mut values = Vec::with_capacity(attrs.len() + 1);
        values.push(ratio.trunc());
        for attr in attrs {
            let value = source_cols
                .iter()
                .position(|c| c == attr)
                .and_then(|idx| row.values.get(idx).copied().flatten());
            let Some(value) = value else {
                dropped += 1;
                continue 'rows;
            };
            values.push(value);
        }
        rows.push((row.player_name.clone(), values));
    }

    // Stable: equal ratios keep dataset order.
    rows.sort_by(|a, b| b.1[0].total_cmp(&a.1[0]));

    let mut columns = Vec::with_capacity(attrs.len() + 1);
    columns.push(RATIO_COLUMN.to_string());
    columns.extend(attrs.iter().map(|a| a.column().to_string()));

    debug!(%tag, rows = rows.len(), dropped, "projected heatmap");
    let (row_labels, values) = rows.into_iter().unzip();
    HeatmapMatrix {
        tag,
        columns,
        row_labels,
        values,
        dropped_rows: dropped,
    }
}
