//! Deterministic swarm placement for points sharing one categorical axis position.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    /// Two points closer than this on the y axis (in data units) are treated as overlapping.
    pub threshold: f64,
    /// Horizontal step between neighbouring overlapped points.
    pub spread: f64,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            spread: 0.04,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SwarmPoint {
    /// Position of the value in the input slice.
    pub index: usize,
    pub x: f64,
    pub y: f64,
}

/// Horizontal offset for the point that has `overlaps` earlier neighbours within the threshold:
/// 0 when alone, then -1, +1, -2, +2, ... spreads.
pub fn offset_for(overlaps: usize, spread: f64) -> f64 {
    if overlaps == 0 {
        return 0.0;
    }
    let step = overlaps.div_ceil(2) as f64 * spread;
    if overlaps % 2 == 1 { -step } else { step }
}

/// Place `values` around `center`, visiting them in ascending y order. Output is in
/// placement order; `index` points back into `values`. Non-finite values are skipped.
pub fn place(values: &[f64], center: f64, cfg: SwarmConfig) -> Vec<SwarmPoint> {
    let mut order: Vec<usize> = (0..values.len())
        .filter(|&i| values[i].is_finite())
        .collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut placed: Vec<SwarmPoint> = Vec::with_capacity(order.len());
    for idx in order {
        let y = values[idx];
        let overlaps = placed
            .iter()
            .filter(|p| (p.y - y).abs() < cfg.threshold)
            .count();
        placed.push(SwarmPoint {
            index: idx,
            x: center + offset_for(overlaps, cfg.spread),
            y,
        });
    }
    placed
}
