//! Plotly-shaped figure documents. Rendering is left to whatever consumes the JSON.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::heatmap::HeatmapMatrix;
use crate::promising::{ScanReport, TREND_SAMPLES};
use crate::swarm::{self, SwarmConfig};
use crate::team_performance::{ComparisonMetric, Tier, TeamPerformanceReport, baseline_bar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Palette {
    #[default]
    Vivid,
    Print,
}

impl Palette {
    pub fn parse(raw: &str) -> Option<Palette> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "vivid" => Some(Palette::Vivid),
            "print" => Some(Palette::Print),
            _ => None,
        }
    }

    pub fn tier_color(self, tier: Tier) -> &'static str {
        match (self, tier) {
            (_, Tier::Top) => "limegreen",
            (_, Tier::Bottom) => "crimson",
            (Palette::Vivid, Tier::Others) => "grey",
            (Palette::Print, Tier::Others) => "black",
            (Palette::Vivid, Tier::OurTeam) => "cyan",
            (Palette::Print, Tier::OurTeam) => "blue",
        }
    }

    pub fn heatmap_scale(self) -> &'static str {
        match self {
            Palette::Vivid => "Viridis",
            Palette::Print => "Greens",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartFormat {
    #[default]
    Json,
    JsonPretty,
}

impl ChartFormat {
    pub fn parse(raw: &str) -> Option<ChartFormat> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Some(ChartFormat::Json),
            "json-pretty" | "pretty" => Some(ChartFormat::JsonPretty),
            _ => None,
        }
    }

    pub fn render(self, figure: &Figure) -> Result<String> {
        Ok(match self {
            ChartFormat::Json => serde_json::to_string(figure)?,
            ChartFormat::JsonPretty => serde_json::to_string_pretty(figure)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Values {
    Numbers(Vec<f64>),
    Labels(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColorSpec {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Line {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub color: ColorSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Scatter,
    Bar,
    Violin,
    Heatmap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Visible {
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: TraceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Values>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Values>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<Vec<Vec<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorscale: Option<String>,
    #[serde(rename = "box", skip_serializing_if = "Option::is_none")]
    pub box_: Option<Visible>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meanline: Option<Visible>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fillcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
}

impl Trace {
    pub fn new(kind: TraceKind) -> Self {
        Self {
            kind,
            name: None,
            x: None,
            y: None,
            z: None,
            base: None,
            mode: None,
            text: None,
            marker: None,
            line: None,
            colorscale: None,
            box_: None,
            meanline: None,
            fillcolor: None,
            showlegend: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x0: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y0: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y1: Option<f64>,
    pub line: Line,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fillcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showticklabels: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showgrid: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: String,
    pub xaxis: Axis,
    pub yaxis: Axis,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shapes: Vec<Shape>,
    pub showlegend: bool,
    pub plot_bgcolor: String,
    pub paper_bgcolor: String,
}

impl Layout {
    fn titled(title: String) -> Self {
        Self {
            title,
            xaxis: Axis::default(),
            yaxis: Axis::default(),
            shapes: Vec::new(),
            showlegend: false,
            plot_bgcolor: "white".to_string(),
            paper_bgcolor: "white".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

/// A figure paired with the file stem it is written under.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedFigure {
    pub name: String,
    pub figure: Figure,
}

fn outlined(color: ColorSpec) -> Marker {
    Marker {
        color,
        size: Some(10.0),
        line: Some(Line {
            color: Some("black".to_string()),
            width: Some(1.0),
            dash: None,
        }),
    }
}

/// Young players by age and potential, with the trend line and the promising triangle.
pub fn scan_scatter(report: &ScanReport) -> Figure {
    let plotted: Vec<_> = report.young.iter().filter(|p| p.potential.is_some()).collect();
    let mut points = Trace::new(TraceKind::Scatter);
    points.mode = Some("markers".to_string());
    points.x = Some(Values::Numbers(plotted.iter().map(|p| p.age).collect()));
    points.y = Some(Values::Numbers(
        plotted.iter().filter_map(|p| p.potential).collect(),
    ));
    points.text = Some(plotted.iter().map(|p| p.player_name.clone()).collect());
    points.marker = Some(outlined(ColorSpec::Many(
        plotted.iter().map(|p| p.color.clone()).collect(),
    )));

    let mut data = vec![points];
    if let Some(trend) = report.trend {
        let samples = trend.samples(TREND_SAMPLES);
        let mut line = Trace::new(TraceKind::Scatter);
        line.name = Some("Trend Line".to_string());
        line.mode = Some("lines".to_string());
        line.x = Some(Values::Numbers(samples.iter().map(|s| s.0).collect()));
        line.y = Some(Values::Numbers(samples.iter().map(|s| s.1).collect()));
        line.line = Some(Line {
            color: Some("black".to_string()),
            width: None,
            dash: Some("dot".to_string()),
        });
        data.push(line);
    }

    let c = report.criteria;
    let mut layout = Layout::titled(format!(
        "Promising Young Players (Age < {}, Inside Triangle <= {})",
        c.young_below, c.max_age
    ));
    layout.xaxis.title = Some("Age".to_string());
    layout.xaxis.showgrid = Some(false);
    layout.yaxis.title = Some("Potential Rating".to_string());
    layout.yaxis.showgrid = Some(false);
    layout.shapes.push(Shape {
        kind: "path".to_string(),
        path: Some(format!(
            "M {a},{lo} L {a},{hi} L {b},{hi} Z",
            a = c.line_start_age,
            b = c.max_age,
            lo = c.min_potential,
            hi = c.max_potential
        )),
        x0: None,
        y0: None,
        x1: None,
        y1: None,
        line: Line {
            color: Some("green".to_string()),
            width: None,
            dash: None,
        },
        fillcolor: Some("rgba(0,128,0,0.1)".to_string()),
        layer: Some("below".to_string()),
    });
    Figure { data, layout }
}

/// Average points per opponent drawn as bars above or below the baseline.
pub fn points_bar(report: &TeamPerformanceReport, baseline: f64, palette: Palette) -> Figure {
    let opponents: Vec<_> = report.opponents().collect();
    let (bases, heights): (Vec<f64>, Vec<f64>) = opponents
        .iter()
        .map(|o| baseline_bar(o.record.avg_points, baseline))
        .unzip();

    let mut bars = Trace::new(TraceKind::Bar);
    bars.x = Some(Values::Labels(
        opponents
            .iter()
            .map(|o| o.record.opponent_name.clone())
            .collect(),
    ));
    bars.y = Some(Values::Numbers(heights));
    bars.base = Some(bases);
    bars.text = Some(
        opponents
            .iter()
            .map(|o| format!("{:.2}", o.record.avg_points))
            .collect(),
    );
    bars.marker = Some(Marker {
        color: ColorSpec::Many(
            opponents
                .iter()
                .map(|o| palette.tier_color(o.record.tier).to_string())
                .collect(),
        ),
        size: None,
        line: None,
    });

    let mut layout = Layout::titled(format!("Avg Points by {} vs Opponents", report.team_name));
    layout.yaxis.title = Some("Avg Points".to_string());
    layout.xaxis.showticklabels = Some(false);
    layout.shapes.push(Shape {
        kind: "line".to_string(),
        path: None,
        x0: Some(-0.5),
        y0: Some(baseline),
        x1: Some(opponents.len() as f64 - 0.5),
        y1: Some(baseline),
        line: Line {
            color: Some("black".to_string()),
            width: None,
            dash: Some("dash".to_string()),
        },
        fillcolor: None,
        layer: None,
    });
    Figure {
        data: vec![bars],
        layout,
    }
}

/// Distribution of one metric across every row, with tier-colored markers spread
/// horizontally so close values stay visible.
pub fn metric_violin(
    report: &TeamPerformanceReport,
    metric: ComparisonMetric,
    palette: Palette,
    swarm_cfg: SwarmConfig,
) -> Figure {
    let present: Vec<(&str, Tier, f64)> = report
        .rows
        .iter()
        .filter_map(|r| {
            r.metric(metric)
                .map(|v| (r.record.opponent_name.as_str(), r.record.tier, v))
        })
        .collect();
    let values: Vec<f64> = present.iter().map(|p| p.2).collect();

    let mut violin = Trace::new(TraceKind::Violin);
    violin.name = Some(metric.name().to_string());
    violin.x = Some(Values::Numbers(vec![0.0; values.len()]));
    violin.y = Some(Values::Numbers(values.clone()));
    violin.box_ = Some(Visible { visible: false });
    violin.meanline = Some(Visible { visible: true });
    violin.fillcolor = Some("rgba(255,255,255,0.7)".to_string());
    violin.line = Some(Line {
        color: Some("black".to_string()),
        width: None,
        dash: None,
    });
    violin.showlegend = Some(false);

    let placed = swarm::place(&values, 0.0, swarm_cfg);
    let mut data = vec![violin];
    for tier in Tier::ALL {
        let members: Vec<_> = placed.iter().filter(|p| present[p.index].1 == tier).collect();
        if members.is_empty() {
            continue;
        }
        let mut dots = Trace::new(TraceKind::Scatter);
        dots.name = Some(tier.label().to_string());
        dots.mode = Some("markers".to_string());
        dots.x = Some(Values::Numbers(members.iter().map(|p| p.x).collect()));
        dots.y = Some(Values::Numbers(members.iter().map(|p| p.y).collect()));
        dots.text = Some(
            members
                .iter()
                .map(|p| present[p.index].0.to_string())
                .collect(),
        );
        dots.marker = Some(outlined(ColorSpec::One(palette.tier_color(tier).to_string())));
        data.push(dots);
    }

    let mut layout = Layout::titled(format!(
        "{}: Distribution of {}",
        report.team_name,
        metric.name()
    ));
    layout.yaxis.title = Some(metric.name().to_string());
    layout.xaxis.showticklabels = Some(false);
    layout.showlegend = true;
    Figure { data, layout }
}

/// Players by attribute, best potential ratio at the top.
pub fn role_heatmap(matrix: &HeatmapMatrix, palette: Palette) -> Figure {
    let mut heat = Trace::new(TraceKind::Heatmap);
    heat.x = Some(Values::Labels(matrix.columns.clone()));
    heat.y = Some(Values::Labels(matrix.row_labels.clone()));
    heat.z = Some(matrix.values.clone());
    heat.colorscale = Some(palette.heatmap_scale().to_string());

    let mut layout = Layout::titled(format!(
        "{}: attributes by potential rating ratio",
        matrix.tag.title()
    ));
    layout.xaxis.title = Some("Attribute".to_string());
    layout.yaxis.title = Some("Player".to_string());
    Figure {
        data: vec![heat],
        layout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palettes_differ_only_on_neutral_tiers() {
        assert_eq!(Palette::Vivid.tier_color(Tier::Top), Palette::Print.tier_color(Tier::Top));
        assert_ne!(
            Palette::Vivid.tier_color(Tier::Others),
            Palette::Print.tier_color(Tier::Others)
        );
        assert_eq!(Palette::Print.heatmap_scale(), "Greens");
    }

    #[test]
    fn trace_serializes_plotly_keys() {
        let mut t = Trace::new(TraceKind::Violin);
        t.box_ = Some(Visible { visible: false });
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["type"], "violin");
        assert_eq!(json["box"]["visible"], false);
        assert!(json.get("x").is_none());
    }
}
