use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::model::{
    Attribute, MatchRecord, Player, PlayerAttributeSnapshot, PossessionSample, Role,
    SLOTS_PER_SIDE, ShotEvent, SlotRoleEntry, TacticalAttribute, Tables, Team,
    TeamAttributeSnapshot,
};

pub const MATCH_TABLE: &str = "Match";
pub const PLAYER_TABLE: &str = "Player";
pub const PLAYER_ATTRIBUTES_TABLE: &str = "Player_Attributes";
pub const TEAM_TABLE: &str = "Team";
pub const TEAM_ATTRIBUTES_TABLE: &str = "Team_Attributes";
pub const POSSESSION_TABLE: &str = "Match_Possesion";
pub const SHOTS_ON_TABLE: &str = "Match_Shots_On";
pub const SHOTS_OFF_TABLE: &str = "Match_Shots_Off";
pub const POSITION_REFERENCE_TABLE: &str = "PositionReference";
pub const PROMISING_NAMES_FILE: &str = "promising_names.txt";

/// Untyped rows with named columns. Both the CSV and SQLite sources produce this
/// shape so the typed parsing below is shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(name: &str, headers: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            headers,
            rows: Vec::new(),
        }
    }

    fn columns(&self) -> Columns<'_> {
        let index = self
            .headers
            .iter()
            .enumerate()
            .map(|(idx, h)| (h.trim(), idx))
            .collect();
        Columns {
            table: &self.name,
            index,
        }
    }
}

struct Columns<'a> {
    table: &'a str,
    index: HashMap<&'a str, usize>,
}

impl Columns<'_> {
    fn required(&self, name: &str) -> std::result::Result<usize, PipelineError> {
        self.optional(name)
            .ok_or_else(|| PipelineError::MissingColumn {
                table: self.table.to_string(),
                column: name.to_string(),
            })
    }

    fn optional(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

fn cell(row: &[Option<String>], idx: Option<usize>) -> Option<&str> {
    let raw = row.get(idx?)?.as_deref()?.trim();
    if is_missing(raw) { None } else { Some(raw) }
}

pub fn is_missing(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "" | "na" | "nan" | "null" | "none"
    )
}

pub fn parse_f64(raw: Option<&str>) -> Option<f64> {
    raw?.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Ids sometimes arrive float-formatted ("39890.0").
pub fn parse_id(raw: Option<&str>) -> Option<u64> {
    let raw = raw?;
    if let Ok(v) = raw.parse::<u64>() {
        return Some(v);
    }
    let v = raw.parse::<f64>().ok()?;
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 {
        Some(v as u64)
    } else {
        None
    }
}

pub fn parse_int(raw: Option<&str>) -> Option<i64> {
    let raw = raw?;
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    let v = raw.parse::<f64>().ok()?;
    if v.is_finite() && v.fract() == 0.0 {
        Some(v as i64)
    } else {
        None
    }
}

pub fn parse_datetime(raw: Option<&str>) -> Option<NaiveDateTime> {
    let raw = raw?;
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn required_id(
    row: &[Option<String>],
    idx: usize,
    table: &str,
    column: &str,
    line: usize,
) -> Result<u64> {
    parse_id(cell(row, Some(idx)))
        .with_context(|| format!("{table} row {line}: invalid or missing {column}"))
}

pub fn parse_matches(raw: &RawTable) -> Result<Vec<MatchRecord>> {
    let cols = raw.columns();
    let id = cols.required("id")?;
    let date = cols.optional("date");
    let home_team = cols.required("home_team_api_id")?;
    let away_team = cols.required("away_team_api_id")?;
    let home_goal = cols.optional("home_team_goal");
    let away_goal = cols.optional("away_team_goal");

    let slot_cols = |prefix: &str| -> [Option<usize>; SLOTS_PER_SIDE] {
        std::array::from_fn(|i| cols.optional(&format!("{prefix}{}", i + 1)))
    };
    let home_players = slot_cols("home_player_");
    let away_players = slot_cols("away_player_");
    let home_y = slot_cols("home_player_Y");
    let away_y = slot_cols("away_player_Y");

    let mut out = Vec::with_capacity(raw.rows.len());
    for (line, row) in raw.rows.iter().enumerate() {
        let goals = |idx| parse_int(cell(row, idx)).and_then(|g| u32::try_from(g).ok());
        out.push(MatchRecord {
            id: required_id(row, id, &raw.name, "id", line + 1)?,
            date: parse_datetime(cell(row, date)),
            home_team_id: required_id(row, home_team, &raw.name, "home_team_api_id", line + 1)?,
            away_team_id: required_id(row, away_team, &raw.name, "away_team_api_id", line + 1)?,
            home_goals: goals(home_goal),
            away_goals: goals(away_goal),
            home_players: home_players.map(|idx| parse_id(cell(row, idx))),
            away_players: away_players.map(|idx| parse_id(cell(row, idx))),
            home_player_y: home_y.map(|idx| parse_int(cell(row, idx))),
            away_player_y: away_y.map(|idx| parse_int(cell(row, idx))),
        });
    }
    Ok(out)
}

pub fn parse_players(raw: &RawTable) -> Result<Vec<Player>> {
    let cols = raw.columns();
    let id = cols.required("player_api_id")?;
    let name = cols.required("player_name")?;
    let birthday = cols.optional("birthday");

    let mut out = Vec::with_capacity(raw.rows.len());
    for (line, row) in raw.rows.iter().enumerate() {
        out.push(Player {
            player_api_id: required_id(row, id, &raw.name, "player_api_id", line + 1)?,
            player_name: cell(row, Some(name)).unwrap_or_default().to_string(),
            birthday: parse_datetime(cell(row, birthday)),
        });
    }
    Ok(out)
}

pub fn parse_player_attributes(raw: &RawTable) -> Result<Vec<PlayerAttributeSnapshot>> {
    let cols = raw.columns();
    let id = cols.required("player_api_id")?;
    let date = cols.optional("date");
    let overall = cols.required("overall_rating")?;
    let potential = cols.required("potential")?;
    let attr_cols: Vec<(Attribute, usize)> = Attribute::ALL
        .iter()
        .filter_map(|attr| cols.optional(attr.column()).map(|idx| (*attr, idx)))
        .collect();

    let mut out = Vec::with_capacity(raw.rows.len());
    for (line, row) in raw.rows.iter().enumerate() {
        let attributes = attr_cols
            .iter()
            .filter_map(|(attr, idx)| parse_f64(cell(row, Some(*idx))).map(|v| (*attr, v)))
            .collect();
        out.push(PlayerAttributeSnapshot {
            player_id: required_id(row, id, &raw.name, "player_api_id", line + 1)?,
            date: parse_datetime(cell(row, date)),
            overall_rating: parse_f64(cell(row, Some(overall))),
            potential: parse_f64(cell(row, Some(potential))),
            attributes,
        });
    }
    Ok(out)
}

pub fn parse_teams(raw: &RawTable) -> Result<Vec<Team>> {
    let cols = raw.columns();
    let id = cols.required("team_api_id")?;
    let long_name = cols.required("team_long_name")?;
    let short_name = cols.optional("team_short_name");

    let mut out = Vec::with_capacity(raw.rows.len());
    for (line, row) in raw.rows.iter().enumerate() {
        out.push(Team {
            team_api_id: required_id(row, id, &raw.name, "team_api_id", line + 1)?,
            team_long_name: cell(row, Some(long_name)).unwrap_or_default().to_string(),
            team_short_name: cell(row, short_name).map(str::to_string),
        });
    }
    Ok(out)
}

pub fn parse_team_attributes(raw: &RawTable) -> Result<Vec<TeamAttributeSnapshot>> {
    let cols = raw.columns();
    let id = cols.required("team_api_id")?;
    let date = cols.optional("date");
    let attr_cols: Vec<(TacticalAttribute, usize)> = TacticalAttribute::ALL
        .iter()
        .filter_map(|attr| cols.optional(attr.column()).map(|idx| (*attr, idx)))
        .collect();

    let mut out = Vec::with_capacity(raw.rows.len());
    for (line, row) in raw.rows.iter().enumerate() {
        out.push(TeamAttributeSnapshot {
            team_id: required_id(row, id, &raw.name, "team_api_id", line + 1)?,
            date: parse_datetime(cell(row, date)),
            values: attr_cols
                .iter()
                .filter_map(|(attr, idx)| parse_f64(cell(row, Some(*idx))).map(|v| (*attr, v)))
                .collect(),
        });
    }
    Ok(out)
}

pub fn parse_possession(raw: &RawTable) -> Result<Vec<PossessionSample>> {
    let cols = raw.columns();
    let match_id = cols.required("match_id")?;
    let home = cols.required("homepos")?;
    let away = cols.required("awaypos")?;

    let mut out = Vec::with_capacity(raw.rows.len());
    for (line, row) in raw.rows.iter().enumerate() {
        out.push(PossessionSample {
            match_id: required_id(row, match_id, &raw.name, "match_id", line + 1)?,
            home: parse_f64(cell(row, Some(home))),
            away: parse_f64(cell(row, Some(away))),
        });
    }
    Ok(out)
}

/// Shot events without a team are dropped; they cannot be attributed.
pub fn parse_shots(raw: &RawTable) -> Result<Vec<ShotEvent>> {
    let cols = raw.columns();
    let match_id = cols.required("match_id")?;
    let team = cols.required("team")?;

    let mut out = Vec::with_capacity(raw.rows.len());
    for (line, row) in raw.rows.iter().enumerate() {
        let Some(team_id) = parse_id(cell(row, Some(team))) else {
            continue;
        };
        out.push(ShotEvent {
            match_id: required_id(row, match_id, &raw.name, "match_id", line + 1)?,
            team_id,
        });
    }
    Ok(out)
}

pub fn parse_slot_roles(raw: &RawTable) -> Result<Vec<SlotRoleEntry>> {
    let cols = raw.columns();
    let y = cols.required("player_pos_y")?;
    let role = cols.required("role_y")?;

    let mut out = Vec::with_capacity(raw.rows.len());
    for row in &raw.rows {
        let Some(slot_y) = parse_int(cell(row, Some(y))) else {
            continue;
        };
        out.push(SlotRoleEntry {
            slot_y,
            role: cell(row, Some(role))
                .map(Role::from_label)
                .unwrap_or(Role::Unknown),
        });
    }
    Ok(out)
}

/// One name per line; blank lines are ignored.
pub fn parse_name_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn read_csv_table(path: &Path, name: &str) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open CSV {}", path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("read header of {}", path.display()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let mut table = RawTable::new(name, headers);
    for record in reader.records() {
        let record = record.with_context(|| format!("read row of {}", path.display()))?;
        table
            .rows
            .push(record.iter().map(|v| Some(v.to_string())).collect());
    }
    Ok(table)
}

/// Everything the loaders need to assemble `Tables`, regardless of where it came from.
#[derive(Debug, Clone, Default)]
pub struct RawTables {
    pub matches: RawTable,
    pub players: RawTable,
    pub player_attributes: RawTable,
    pub teams: RawTable,
    pub team_attributes: RawTable,
    pub possession: Option<RawTable>,
    pub shots_on: Option<RawTable>,
    pub shots_off: Option<RawTable>,
    pub slot_roles: Option<RawTable>,
    pub promising_names: Option<Vec<String>>,
}

impl RawTables {
    pub fn into_tables(self) -> Result<Tables> {
        let optional = |raw: Option<RawTable>, name: &str| {
            if raw.is_none() {
                warn!(table = name, "optional table not found; continuing without it");
            }
            raw
        };
        let tables = Tables {
            matches: parse_matches(&self.matches)?,
            players: parse_players(&self.players)?,
            player_attributes: parse_player_attributes(&self.player_attributes)?,
            teams: parse_teams(&self.teams)?,
            team_attributes: parse_team_attributes(&self.team_attributes)?,
            possession: optional(self.possession, POSSESSION_TABLE)
                .map(|t| parse_possession(&t))
                .transpose()?
                .unwrap_or_default(),
            shots_on: optional(self.shots_on, SHOTS_ON_TABLE)
                .map(|t| parse_shots(&t))
                .transpose()?
                .unwrap_or_default(),
            shots_off: optional(self.shots_off, SHOTS_OFF_TABLE)
                .map(|t| parse_shots(&t))
                .transpose()?
                .unwrap_or_default(),
            slot_roles: self
                .slot_roles
                .map(|t| parse_slot_roles(&t))
                .transpose()?
                .unwrap_or_default(),
            promising_names: self.promising_names.unwrap_or_default(),
        };
        info!(
            matches = tables.matches.len(),
            players = tables.players.len(),
            player_attributes = tables.player_attributes.len(),
            teams = tables.teams.len(),
            team_attributes = tables.team_attributes.len(),
            possession = tables.possession.len(),
            shots_on = tables.shots_on.len(),
            shots_off = tables.shots_off.len(),
            "loaded tables"
        );
        Ok(tables)
    }
}

fn optional_csv(dir: &Path, name: &str) -> Result<Option<RawTable>> {
    let path = dir.join(format!("{name}.csv"));
    if !path.exists() {
        return Ok(None);
    }
    read_csv_table(&path, name).map(Some)
}

pub fn read_name_list(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(parse_name_list(&raw))
}

/// Load a directory of `<Table>.csv` files plus the optional allow-list.
pub fn load_csv_dir(dir: &Path) -> Result<Tables> {
    let required = |name: &str| read_csv_table(&dir.join(format!("{name}.csv")), name);
    let names_path = dir.join(PROMISING_NAMES_FILE);
    let raw = RawTables {
        matches: required(MATCH_TABLE)?,
        players: required(PLAYER_TABLE)?,
        player_attributes: required(PLAYER_ATTRIBUTES_TABLE)?,
        teams: required(TEAM_TABLE)?,
        team_attributes: required(TEAM_ATTRIBUTES_TABLE)?,
        possession: optional_csv(dir, POSSESSION_TABLE)?,
        shots_on: optional_csv(dir, SHOTS_ON_TABLE)?,
        shots_off: optional_csv(dir, SHOTS_OFF_TABLE)?,
        slot_roles: optional_csv(dir, POSITION_REFERENCE_TABLE)?,
        promising_names: if names_path.exists() {
            Some(read_name_list(&names_path)?)
        } else {
            None
        },
    };
    raw.into_tables()
        .with_context(|| format!("parse tables from {}", dir.display()))
}

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn text<T: ToString>(value: Option<T>) -> Option<String> {
    value.map(|v| v.to_string())
}

fn date_text(value: Option<NaiveDateTime>) -> Option<String> {
    value.map(|d| d.format(DATE_FORMAT).to_string())
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

impl RawTables {
    /// Render typed tables back into the source layout. Parsing the result yields the
    /// same tables.
    pub fn from_tables(tables: &Tables) -> Self {
        let mut match_headers = headers(&[
            "id",
            "date",
            "home_team_api_id",
            "away_team_api_id",
            "home_team_goal",
            "away_team_goal",
        ]);
        for side in ["home", "away"] {
            for i in 1..=SLOTS_PER_SIDE {
                match_headers.push(format!("{side}_player_{i}"));
            }
            for i in 1..=SLOTS_PER_SIDE {
                match_headers.push(format!("{side}_player_Y{i}"));
            }
        }
        let mut matches = RawTable::new(MATCH_TABLE, match_headers);
        for m in &tables.matches {
            let mut row = vec![
                Some(m.id.to_string()),
                date_text(m.date),
                Some(m.home_team_id.to_string()),
                Some(m.away_team_id.to_string()),
                text(m.home_goals),
                text(m.away_goals),
            ];
            for (players, ys) in [
                (&m.home_players, &m.home_player_y),
                (&m.away_players, &m.away_player_y),
            ] {
                row.extend(players.iter().map(|p| text(*p)));
                row.extend(ys.iter().map(|y| text(*y)));
            }
            matches.rows.push(row);
        }

        let mut players = RawTable::new(
            PLAYER_TABLE,
            headers(&["player_api_id", "player_name", "birthday"]),
        );
        for p in &tables.players {
            players.rows.push(vec![
                Some(p.player_api_id.to_string()),
                Some(p.player_name.clone()),
                date_text(p.birthday),
            ]);
        }

        let mut attr_headers = headers(&["player_api_id", "date", "overall_rating", "potential"]);
        attr_headers.extend(Attribute::ALL.iter().map(|a| a.column().to_string()));
        let mut player_attributes = RawTable::new(PLAYER_ATTRIBUTES_TABLE, attr_headers);
        for s in &tables.player_attributes {
            let mut row = vec![
                Some(s.player_id.to_string()),
                date_text(s.date),
                text(s.overall_rating),
                text(s.potential),
            ];
            row.extend(Attribute::ALL.iter().map(|a| text(s.attribute(*a))));
            player_attributes.rows.push(row);
        }

        let mut teams = RawTable::new(
            TEAM_TABLE,
            headers(&["team_api_id", "team_long_name", "team_short_name"]),
        );
        for t in &tables.teams {
            teams.rows.push(vec![
                Some(t.team_api_id.to_string()),
                Some(t.team_long_name.clone()),
                t.team_short_name.clone(),
            ]);
        }

        let mut team_attr_headers = headers(&["team_api_id", "date"]);
        team_attr_headers.extend(TacticalAttribute::ALL.iter().map(|a| a.column().to_string()));
        let mut team_attributes = RawTable::new(TEAM_ATTRIBUTES_TABLE, team_attr_headers);
        for s in &tables.team_attributes {
            let mut row = vec![Some(s.team_id.to_string()), date_text(s.date)];
            row.extend(
                TacticalAttribute::ALL
                    .iter()
                    .map(|a| text(s.values.get(a).copied())),
            );
            team_attributes.rows.push(row);
        }

        let mut possession = RawTable::new(
            POSSESSION_TABLE,
            headers(&["match_id", "homepos", "awaypos"]),
        );
        for s in &tables.possession {
            possession
                .rows
                .push(vec![Some(s.match_id.to_string()), text(s.home), text(s.away)]);
        }

        let shots = |name: &str, events: &[ShotEvent]| {
            let mut table = RawTable::new(name, headers(&["match_id", "team"]));
            for e in events {
                table
                    .rows
                    .push(vec![Some(e.match_id.to_string()), Some(e.team_id.to_string())]);
            }
            table
        };

        let mut slot_roles = RawTable::new(
            POSITION_REFERENCE_TABLE,
            headers(&["player_pos_y", "role_y"]),
        );
        for e in &tables.slot_roles {
            slot_roles
                .rows
                .push(vec![Some(e.slot_y.to_string()), Some(e.role.label().to_string())]);
        }

        RawTables {
            matches,
            players,
            player_attributes,
            teams,
            team_attributes,
            possession: Some(possession),
            shots_on: Some(shots(SHOTS_ON_TABLE, &tables.shots_on)),
            shots_off: Some(shots(SHOTS_OFF_TABLE, &tables.shots_off)),
            slot_roles: (!tables.slot_roles.is_empty()).then_some(slot_roles),
            promising_names: Some(tables.promising_names.clone()),
        }
    }

    pub fn tables(&self) -> impl Iterator<Item = &RawTable> {
        [
            Some(&self.matches),
            Some(&self.players),
            Some(&self.player_attributes),
            Some(&self.teams),
            Some(&self.team_attributes),
            self.possession.as_ref(),
            self.shots_on.as_ref(),
            self.shots_off.as_ref(),
            self.slot_roles.as_ref(),
        ]
        .into_iter()
        .flatten()
    }
}

pub fn write_csv_table(path: &Path, table: &RawTable) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    writer
        .write_record(&table.headers)
        .with_context(|| format!("write header to {}", path.display()))?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(|v| v.as_deref().unwrap_or("")))
            .with_context(|| format!("write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

/// Lay the tables out as a directory `load_csv_dir` can read back.
pub fn write_csv_dir(dir: &Path, raw: &RawTables) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    for table in raw.tables() {
        write_csv_table(&dir.join(format!("{}.csv", table.name)), table)?;
    }
    if let Some(names) = &raw.promising_names {
        let mut body = names.join("\n");
        body.push('\n');
        let path = dir.join(PROMISING_NAMES_FILE);
        fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
    }
    info!(dir = %dir.display(), "wrote CSV tables");
    Ok(())
}
