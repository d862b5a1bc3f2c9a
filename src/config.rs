use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::charts::{ChartFormat, Palette};
use crate::error::PipelineError;
use crate::logging::LogFormat;
use crate::model::TacticalAttribute;
use crate::promising::ScanCriteria;
use crate::roles::{DEFAULT_SLOT_UPPER_BOUND, RolePolicy};
use crate::swarm::SwarmConfig;
use crate::team_performance::{DEFAULT_BASELINE, DEFAULT_TOP_N};

pub const DEFAULT_TARGET_TEAM: u64 = 8558;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding `<Table>.csv` files.
    pub data_dir: Option<PathBuf>,
    /// SQLite database with the same tables. Used instead of `data_dir` when set.
    pub sqlite_path: Option<PathBuf>,
    /// Allow-list of promising players. Defaults to `promising_names.txt` in `data_dir`.
    pub promising_names: Option<PathBuf>,
    pub out_dir: PathBuf,
    pub target_team_id: u64,
    pub top_n: usize,
    pub baseline: f64,
    pub slot_upper_bound: i64,
    pub role_policy: RolePolicy,
    pub style_attributes: Vec<TacticalAttribute>,
    pub palette: Palette,
    pub chart_format: ChartFormat,
    pub strict_joins: bool,
    pub swarm: SwarmConfig,
    pub scan: ScanCriteria,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            sqlite_path: None,
            promising_names: None,
            out_dir: PathBuf::from("out"),
            target_team_id: DEFAULT_TARGET_TEAM,
            top_n: DEFAULT_TOP_N,
            baseline: DEFAULT_BASELINE,
            slot_upper_bound: DEFAULT_SLOT_UPPER_BOUND,
            role_policy: RolePolicy::default(),
            style_attributes: TacticalAttribute::DEFAULT_SELECTION.to_vec(),
            palette: Palette::default(),
            chart_format: ChartFormat::default(),
            strict_joins: false,
            swarm: SwarmConfig::default(),
            scan: ScanCriteria::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults, then the optional JSON file, then `SCOUT_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw =
            fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn apply_env(&mut self) {
        self.apply_vars(|key| env::var(key).ok());
    }

    /// Override fields from `lookup`. Blank or unparseable values are ignored.
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = var("SCOUT_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = var("SCOUT_SQLITE") {
            self.sqlite_path = Some(PathBuf::from(v));
        }
        if let Some(v) = var("SCOUT_PROMISING_NAMES") {
            self.promising_names = Some(PathBuf::from(v));
        }
        if let Some(v) = var("SCOUT_OUT_DIR") {
            self.out_dir = PathBuf::from(v);
        }
        if let Some(v) = var("SCOUT_TEAM_ID").and_then(|v| v.parse().ok()) {
            self.target_team_id = v;
        }
        if let Some(v) = var("SCOUT_TOP_N").and_then(|v| v.parse().ok()) {
            self.top_n = v;
        }
        if let Some(v) = var("SCOUT_BASELINE").and_then(|v| v.parse().ok()) {
            self.baseline = v;
        }
        if let Some(v) = var("SCOUT_SLOT_UPPER_BOUND").and_then(|v| v.parse().ok()) {
            self.slot_upper_bound = v;
        }
        if let Some(v) = var("SCOUT_ROLE_POLICY").and_then(|v| RolePolicy::parse(&v)) {
            self.role_policy = v;
        }
        if let Some(v) = var("SCOUT_STYLE_ATTRIBUTES").and_then(|v| parse_style_list(&v).ok()) {
            self.style_attributes = v;
        }
        if let Some(v) = var("SCOUT_PALETTE").and_then(|v| Palette::parse(&v)) {
            self.palette = v;
        }
        if let Some(v) = var("SCOUT_CHART_FORMAT").and_then(|v| ChartFormat::parse(&v)) {
            self.chart_format = v;
        }
        if let Some(v) = var("SCOUT_STRICT_JOINS") {
            let t = v.to_ascii_lowercase();
            self.strict_joins = !(t == "0" || t == "false" || t == "off" || t == "no");
        }
        if let Some(v) = var("SCOUT_SWARM_THRESHOLD").and_then(|v| v.parse().ok()) {
            self.swarm.threshold = v;
        }
        if let Some(v) = var("SCOUT_SWARM_SPREAD").and_then(|v| v.parse().ok()) {
            self.swarm.spread = v;
        }
        if let Some(v) = var("SCOUT_LOG") {
            self.log_level = v;
        }
        if let Some(v) = var("SCOUT_LOG_FORMAT").and_then(|v| LogFormat::parse(&v)) {
            self.log_format = v;
        }
    }

    pub fn validate(&self) -> std::result::Result<(), PipelineError> {
        let invalid = |field, reason: &str| {
            Err(PipelineError::InvalidConfig {
                field,
                reason: reason.to_string(),
            })
        };
        if !self.baseline.is_finite() {
            return invalid("baseline", "must be a finite number");
        }
        if self.slot_upper_bound <= 0 {
            return invalid("slot_upper_bound", "must be positive");
        }
        if !(self.swarm.threshold.is_finite() && self.swarm.threshold >= 0.0) {
            return invalid("swarm.threshold", "must be a non-negative number");
        }
        if !(self.swarm.spread.is_finite() && self.swarm.spread >= 0.0) {
            return invalid("swarm.spread", "must be a non-negative number");
        }
        if self.scan.max_age <= self.scan.line_start_age {
            return invalid("scan.max_age", "must be greater than scan.line_start_age");
        }
        Ok(())
    }

    /// Allow-list location: the explicit path, else the default file in the data directory.
    pub fn promising_names_path(&self) -> Option<PathBuf> {
        self.promising_names.clone().or_else(|| {
            self.data_dir
                .as_ref()
                .map(|dir| dir.join(crate::tables::PROMISING_NAMES_FILE))
        })
    }
}

/// Command-line flags. Every flag that is present replaces the layered value.
#[derive(Debug, Clone, Default, PartialEq, Args)]
pub struct ConfigOverrides {
    /// Directory of CSV tables.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    /// SQLite database holding the same tables.
    #[arg(long, global = true)]
    pub sqlite: Option<PathBuf>,
    /// Allow-list file, one player name per line.
    #[arg(long, global = true)]
    pub promising_names: Option<PathBuf>,
    #[arg(long, global = true)]
    pub out_dir: Option<PathBuf>,
    /// Target team api id.
    #[arg(long, global = true)]
    pub team_id: Option<u64>,
    #[arg(long, global = true)]
    pub top_n: Option<usize>,
    #[arg(long, global = true)]
    pub baseline: Option<f64>,
    #[arg(long, global = true)]
    pub slot_upper_bound: Option<i64>,
    /// most-frequent or last-observed.
    #[arg(long, global = true)]
    pub role_policy: Option<String>,
    /// Comma-separated tactical columns, e.g. buildUpPlaySpeed,defencePressure.
    #[arg(long, global = true)]
    pub style: Option<String>,
    /// vivid or print.
    #[arg(long, global = true)]
    pub palette: Option<String>,
    /// json or json-pretty.
    #[arg(long, global = true)]
    pub chart_format: Option<String>,
    /// Fail on unmatched join keys instead of warning.
    #[arg(long, global = true)]
    pub strict_joins: bool,
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    /// pretty or json.
    #[arg(long, global = true)]
    pub log_format: Option<String>,
}

impl ConfigOverrides {
    pub fn apply(&self, cfg: &mut PipelineConfig) -> std::result::Result<(), PipelineError> {
        fn parsed<T>(
            field: &'static str,
            raw: &str,
            parse: impl Fn(&str) -> Option<T>,
        ) -> std::result::Result<T, PipelineError> {
            parse(raw).ok_or_else(|| PipelineError::InvalidConfig {
                field,
                reason: format!("unrecognized value '{raw}'"),
            })
        }

        if let Some(v) = &self.data_dir {
            cfg.data_dir = Some(v.clone());
        }
        if let Some(v) = &self.sqlite {
            cfg.sqlite_path = Some(v.clone());
        }
        if let Some(v) = &self.promising_names {
            cfg.promising_names = Some(v.clone());
        }
        if let Some(v) = &self.out_dir {
            cfg.out_dir = v.clone();
        }
        if let Some(v) = self.team_id {
            cfg.target_team_id = v;
        }
        if let Some(v) = self.top_n {
            cfg.top_n = v;
        }
        if let Some(v) = self.baseline {
            cfg.baseline = v;
        }
        if let Some(v) = self.slot_upper_bound {
            cfg.slot_upper_bound = v;
        }
        if let Some(v) = &self.role_policy {
            cfg.role_policy = parsed("role_policy", v, RolePolicy::parse)?;
        }
        if let Some(v) = &self.style {
            cfg.style_attributes = parse_style_list(v)?;
        }
        if let Some(v) = &self.palette {
            cfg.palette = parsed("palette", v, Palette::parse)?;
        }
        if let Some(v) = &self.chart_format {
            cfg.chart_format = parsed("chart_format", v, ChartFormat::parse)?;
        }
        if self.strict_joins {
            cfg.strict_joins = true;
        }
        if let Some(v) = &self.log_level {
            cfg.log_level = v.clone();
        }
        if let Some(v) = &self.log_format {
            cfg.log_format = parsed("log_format", v, LogFormat::parse)?;
        }
        Ok(())
    }
}

/// Comma-separated tactical column names, e.g. `buildUpPlaySpeed,defencePressure`.
pub fn parse_style_list(raw: &str) -> std::result::Result<Vec<TacticalAttribute>, PipelineError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            TacticalAttribute::from_column(s).ok_or_else(|| PipelineError::InvalidConfig {
                field: "style_attributes",
                reason: format!("unknown tactical attribute '{s}'"),
            })
        })
        .collect()
}
