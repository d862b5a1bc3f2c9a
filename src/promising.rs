use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::attributes::latest_index_by_key;
use crate::join::JoinReport;
use crate::model::{Player, PlayerAttributeSnapshot};

const SECONDS_PER_YEAR: f64 = 365.25 * 24.0 * 60.0 * 60.0;
pub const TREND_SAMPLES: usize = 100;

/// Age window and the diagonal that separates "promising" from merely young.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanCriteria {
    /// Players strictly younger than this are plotted.
    pub young_below: f64,
    pub max_age: f64,
    pub min_potential: f64,
    pub max_potential: f64,
    /// Line from (line_start_age, min_potential) to (max_age, max_potential).
    pub line_start_age: f64,
}

impl Default for ScanCriteria {
    fn default() -> Self {
        Self {
            young_below: 24.0,
            max_age: 23.0,
            min_potential: 75.0,
            max_potential: 95.0,
            line_start_age: 16.5,
        }
    }
}

impl ScanCriteria {
    pub fn slope(&self) -> f64 {
        (self.max_potential - self.min_potential) / (self.max_age - self.line_start_age)
    }

    pub fn line_at(&self, age: f64) -> f64 {
        let intercept = self.min_potential - self.slope() * self.line_start_age;
        self.slope() * age + intercept
    }

    pub fn is_promising(&self, age: f64, potential: f64) -> bool {
        age <= self.max_age
            && potential >= self.min_potential
            && potential <= self.max_potential
            && potential >= self.line_at(age)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YoungPlayer {
    pub player_id: u64,
    pub player_name: String,
    pub age: f64,
    pub potential: Option<f64>,
    /// Potential scaled to 0..=1 across the young set.
    pub potential_norm: Option<f64>,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromisingPlayer {
    pub player_id: u64,
    pub player_name: String,
    pub age: f64,
    pub potential: f64,
    pub potential_age_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
    pub x_min: f64,
    pub x_max: f64,
}

impl TrendLine {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn samples(&self, n: usize) -> Vec<(f64, f64)> {
        if n < 2 {
            return vec![(self.x_min, self.predict(self.x_min))];
        }
        let step = (self.x_max - self.x_min) / (n - 1) as f64;
        (0..n)
            .map(|i| {
                let x = self.x_min + step * i as f64;
                (x, self.predict(x))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub criteria: ScanCriteria,
    pub young: Vec<YoungPlayer>,
    /// Sorted by potential/age, highest first.
    pub promising: Vec<PromisingPlayer>,
    pub trend: Option<TrendLine>,
}

impl ScanReport {
    pub fn names(&self) -> Vec<String> {
        self.promising.iter().map(|p| p.player_name.clone()).collect()
    }
}

/// Age in years at `at`, rounded to two decimals.
pub fn age_years(birthday: NaiveDateTime, at: NaiveDateTime) -> f64 {
    let secs = (at - birthday).num_seconds() as f64;
    (secs / SECONDS_PER_YEAR * 100.0).round() / 100.0
}

/// Ordinary least squares y ~ x. `None` with fewer than two distinct x values.
pub fn fit_line(points: &[(f64, f64)]) -> Option<TrendLine> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let sxx = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum::<f64>();
    if sxx <= f64::EPSILON {
        return None;
    }
    let sxy = points
        .iter()
        .map(|p| (p.0 - mean_x) * (p.1 - mean_y))
        .sum::<f64>();
    let slope = sxy / sxx;
    let (x_min, x_max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.0), hi.max(p.0))
        });
    Some(TrendLine {
        slope,
        intercept: mean_y - slope * mean_x,
        x_min,
        x_max,
    })
}

const COLOR_STOPS: [(f64, f64, f64); 3] = [
    (215.0, 48.0, 39.0),
    (255.0, 255.0, 191.0),
    (26.0, 150.0, 65.0),
];

/// Red (0) through pale yellow (0.5) to green (1).
pub fn red_yellow_green(t: f64) -> String {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
    let (lo, hi, local) = if t < 0.5 {
        (COLOR_STOPS[0], COLOR_STOPS[1], t / 0.5)
    } else {
        (COLOR_STOPS[1], COLOR_STOPS[2], (t - 0.5) / 0.5)
    };
    let mix = |a: f64, b: f64| (a + (b - a) * local).round() as u8;
    format!(
        "rgba({},{},{},255)",
        mix(lo.0, hi.0),
        mix(lo.1, hi.1),
        mix(lo.2, hi.2)
    )
}

/// Latest snapshot per player with an age, filtered to young players, then to the
/// promising triangle.
pub fn scan(
    snapshots: &[PlayerAttributeSnapshot],
    players: &[Player],
    criteria: ScanCriteria,
    joins: &mut JoinReport,
) -> ScanReport {
    let by_id: HashMap<u64, &Player> = players.iter().map(|p| (p.player_api_id, p)).collect();

    // Inner join: snapshots of unknown players carry no name or birthday.
    let joined: Vec<(&PlayerAttributeSnapshot, &Player)> = snapshots
        .iter()
        .filter_map(|s| match by_id.get(&s.player_id) {
            Some(p) => Some((s, *p)),
            None => {
                joins.record_missing("player_attributes -> players", s.player_id);
                None
            }
        })
        .collect();

    let latest = latest_index_by_key(&joined, |(s, _)| s.player_id, |(s, _)| s.date);
    let mut selected = latest.into_values().collect::<Vec<_>>();
    selected.sort_unstable();

    let mut young: Vec<YoungPlayer> = Vec::new();
    for idx in selected {
        let (snap, player) = joined[idx];
        let (Some(birthday), Some(date)) = (player.birthday, snap.date) else {
            continue;
        };
        let age = age_years(birthday, date);
        if age < criteria.young_below {
            young.push(YoungPlayer {
                player_id: player.player_api_id,
                player_name: player.player_name.clone(),
                age,
                potential: snap.potential,
                potential_norm: None,
                color: String::new(),
            });
        }
    }

    let potentials = young.iter().filter_map(|p| p.potential);
    let min_pot = potentials.clone().fold(f64::INFINITY, f64::min);
    let max_pot = potentials.fold(f64::NEG_INFINITY, f64::max);
    for p in &mut young {
        let norm = p.potential.map(|v| {
            if max_pot > min_pot {
                (v - min_pot) / (max_pot - min_pot)
            } else {
                0.5
            }
        });
        p.potential_norm = norm;
        p.color = red_yellow_green(norm.unwrap_or(f64::NAN));
    }

    let mut promising: Vec<PromisingPlayer> = young
        .iter()
        .filter_map(|p| {
            let potential = p.potential?;
            if !criteria.is_promising(p.age, potential) || p.age <= 0.0 {
                return None;
            }
            Some(PromisingPlayer {
                player_id: p.player_id,
                player_name: p.player_name.clone(),
                age: p.age,
                potential,
                potential_age_ratio: potential / p.age,
            })
        })
        .collect();
    promising.sort_by(|a, b| b.potential_age_ratio.total_cmp(&a.potential_age_ratio));

    let trend_points: Vec<(f64, f64)> = young
        .iter()
        .filter_map(|p| p.potential.map(|v| (p.age, v)))
        .collect();
    let trend = fit_line(&trend_points);

    info!(
        young = young.len(),
        promising = promising.len(),
        "scanned for promising young players"
    );
    ScanReport {
        criteria,
        young,
        promising,
        trend,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_edges() {
        let c = ScanCriteria::default();
        assert!((c.line_at(16.5) - 75.0).abs() < 1e-9);
        assert!((c.line_at(23.0) - 95.0).abs() < 1e-9);
        assert!(c.is_promising(17.0, 90.0));
        assert!(!c.is_promising(22.0, 80.0));
        assert!(!c.is_promising(23.5, 95.0));
    }

    #[test]
    fn least_squares_exact_line() {
        let line = fit_line(&[(1.0, 3.0), (2.0, 5.0), (3.0, 7.0)]).unwrap();
        assert!((line.slope - 2.0).abs() < 1e-9);
        assert!((line.intercept - 1.0).abs() < 1e-9);
        assert_eq!(line.samples(3).len(), 3);
    }

    #[test]
    fn color_scale_endpoints() {
        assert_eq!(red_yellow_green(0.0), "rgba(215,48,39,255)");
        assert_eq!(red_yellow_green(1.0), "rgba(26,150,65,255)");
        assert_eq!(red_yellow_green(0.5), "rgba(255,255,191,255)");
    }
}
