use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

pub const SLOTS_PER_SIDE: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "GK")]
    Goalkeeper,
    #[serde(rename = "BK")]
    Back,
    #[serde(rename = "MF")]
    Midfield,
    #[serde(rename = "FW")]
    Forward,
    Unknown,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Goalkeeper => "GK",
            Role::Back => "BK",
            Role::Midfield => "MF",
            Role::Forward => "FW",
            Role::Unknown => "Unknown",
        }
    }

    /// Parse the label used by the slot reference table. Anything else is `Unknown`.
    pub fn from_label(raw: &str) -> Role {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GK" => Role::Goalkeeper,
            "BK" => Role::Back,
            "MF" => Role::Midfield,
            "FW" => Role::Forward,
            _ => Role::Unknown,
        }
    }

    pub fn tag(self) -> Option<RoleTag> {
        match self {
            Role::Back => Some(RoleTag::Back),
            Role::Midfield => Some(RoleTag::Midfield),
            Role::Forward => Some(RoleTag::Forward),
            Role::Goalkeeper | Role::Unknown => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The three outfield roles that get their own dataset and heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoleTag {
    #[serde(rename = "bk")]
    Back,
    #[serde(rename = "mf")]
    Midfield,
    #[serde(rename = "fw")]
    Forward,
}

impl RoleTag {
    pub const ALL: [RoleTag; 3] = [RoleTag::Forward, RoleTag::Midfield, RoleTag::Back];

    pub fn as_str(self) -> &'static str {
        match self {
            RoleTag::Back => "bk",
            RoleTag::Midfield => "mf",
            RoleTag::Forward => "fw",
        }
    }

    pub fn role(self) -> Role {
        match self {
            RoleTag::Back => Role::Back,
            RoleTag::Midfield => Role::Midfield,
            RoleTag::Forward => Role::Forward,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            RoleTag::Back => "Backs",
            RoleTag::Midfield => "Midfielders",
            RoleTag::Forward => "Forwards",
        }
    }

    /// Attribute columns compared for players in this role, in display order.
    pub fn attributes(self) -> &'static [Attribute] {
        use Attribute::*;
        match self {
            RoleTag::Back => &[
                Marking,
                StandingTackle,
                SlidingTackle,
                Interceptions,
                Strength,
                Stamina,
                Aggression,
                Jumping,
                HeadingAccuracy,
                ShortPassing,
                Reactions,
                Vision,
            ],
            RoleTag::Midfield => &[
                ShortPassing,
                LongPassing,
                BallControl,
                Vision,
                Dribbling,
                Interceptions,
                Stamina,
                Reactions,
                Positioning,
                Aggression,
                ShotPower,
                Curve,
                FreeKickAccuracy,
                StandingTackle,
                SlidingTackle,
            ],
            RoleTag::Forward => &[
                Finishing,
                ShotPower,
                Positioning,
                Dribbling,
                Acceleration,
                SprintSpeed,
                BallControl,
                Volleys,
                HeadingAccuracy,
                Agility,
                Reactions,
                Penalties,
                Curve,
            ],
        }
    }
}

impl FromStr for RoleTag {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bk" => Ok(RoleTag::Back),
            "mf" => Ok(RoleTag::Midfield),
            "fw" => Ok(RoleTag::Forward),
            _ => Err(PipelineError::UnsupportedRoleTag(s.to_string())),
        }
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// FIFA skill attributes carried by a player snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Crossing,
    Finishing,
    HeadingAccuracy,
    ShortPassing,
    Volleys,
    Dribbling,
    Curve,
    FreeKickAccuracy,
    LongPassing,
    BallControl,
    Acceleration,
    SprintSpeed,
    Agility,
    Reactions,
    Balance,
    ShotPower,
    Jumping,
    Stamina,
    Strength,
    LongShots,
    Aggression,
    Interceptions,
    Positioning,
    Vision,
    Penalties,
    Marking,
    StandingTackle,
    SlidingTackle,
    GkDiving,
    GkHandling,
    GkKicking,
    GkPositioning,
    GkReflexes,
}

impl Attribute {
    pub const ALL: [Attribute; 33] = [
        Attribute::Crossing,
        Attribute::Finishing,
        Attribute::HeadingAccuracy,
        Attribute::ShortPassing,
        Attribute::Volleys,
        Attribute::Dribbling,
        Attribute::Curve,
        Attribute::FreeKickAccuracy,
        Attribute::LongPassing,
        Attribute::BallControl,
        Attribute::Acceleration,
        Attribute::SprintSpeed,
        Attribute::Agility,
        Attribute::Reactions,
        Attribute::Balance,
        Attribute::ShotPower,
        Attribute::Jumping,
        Attribute::Stamina,
        Attribute::Strength,
        Attribute::LongShots,
        Attribute::Aggression,
        Attribute::Interceptions,
        Attribute::Positioning,
        Attribute::Vision,
        Attribute::Penalties,
        Attribute::Marking,
        Attribute::StandingTackle,
        Attribute::SlidingTackle,
        Attribute::GkDiving,
        Attribute::GkHandling,
        Attribute::GkKicking,
        Attribute::GkPositioning,
        Attribute::GkReflexes,
    ];

    /// Column name in the attribute table.
    pub fn column(self) -> &'static str {
        match self {
            Attribute::Crossing => "crossing",
            Attribute::Finishing => "finishing",
            Attribute::HeadingAccuracy => "heading_accuracy",
            Attribute::ShortPassing => "short_passing",
            Attribute::Volleys => "volleys",
            Attribute::Dribbling => "dribbling",
            Attribute::Curve => "curve",
            Attribute::FreeKickAccuracy => "free_kick_accuracy",
            Attribute::LongPassing => "long_passing",
            Attribute::BallControl => "ball_control",
            Attribute::Acceleration => "acceleration",
            Attribute::SprintSpeed => "sprint_speed",
            Attribute::Agility => "agility",
            Attribute::Reactions => "reactions",
            Attribute::Balance => "balance",
            Attribute::ShotPower => "shot_power",
            Attribute::Jumping => "jumping",
            Attribute::Stamina => "stamina",
            Attribute::Strength => "strength",
            Attribute::LongShots => "long_shots",
            Attribute::Aggression => "aggression",
            Attribute::Interceptions => "interceptions",
            Attribute::Positioning => "positioning",
            Attribute::Vision => "vision",
            Attribute::Penalties => "penalties",
            Attribute::Marking => "marking",
            Attribute::StandingTackle => "standing_tackle",
            Attribute::SlidingTackle => "sliding_tackle",
            Attribute::GkDiving => "gk_diving",
            Attribute::GkHandling => "gk_handling",
            Attribute::GkKicking => "gk_kicking",
            Attribute::GkPositioning => "gk_positioning",
            Attribute::GkReflexes => "gk_reflexes",
        }
    }
}

/// Numeric tactical fields of a team attribute snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TacticalAttribute {
    #[serde(rename = "buildUpPlaySpeed")]
    BuildUpPlaySpeed,
    #[serde(rename = "buildUpPlayDribbling")]
    BuildUpPlayDribbling,
    #[serde(rename = "buildUpPlayPassing")]
    BuildUpPlayPassing,
    #[serde(rename = "chanceCreationPassing")]
    ChanceCreationPassing,
    #[serde(rename = "chanceCreationCrossing")]
    ChanceCreationCrossing,
    #[serde(rename = "chanceCreationShooting")]
    ChanceCreationShooting,
    #[serde(rename = "defencePressure")]
    DefencePressure,
    #[serde(rename = "defenceAggression")]
    DefenceAggression,
    #[serde(rename = "defenceTeamWidth")]
    DefenceTeamWidth,
}

impl TacticalAttribute {
    pub const ALL: [TacticalAttribute; 9] = [
        TacticalAttribute::BuildUpPlaySpeed,
        TacticalAttribute::BuildUpPlayDribbling,
        TacticalAttribute::BuildUpPlayPassing,
        TacticalAttribute::ChanceCreationPassing,
        TacticalAttribute::ChanceCreationCrossing,
        TacticalAttribute::ChanceCreationShooting,
        TacticalAttribute::DefencePressure,
        TacticalAttribute::DefenceAggression,
        TacticalAttribute::DefenceTeamWidth,
    ];

    /// Styles compared on the violin charts unless configured otherwise.
    pub const DEFAULT_SELECTION: [TacticalAttribute; 5] = [
        TacticalAttribute::BuildUpPlaySpeed,
        TacticalAttribute::BuildUpPlayDribbling,
        TacticalAttribute::DefencePressure,
        TacticalAttribute::DefenceAggression,
        TacticalAttribute::ChanceCreationPassing,
    ];

    pub fn column(self) -> &'static str {
        match self {
            TacticalAttribute::BuildUpPlaySpeed => "buildUpPlaySpeed",
            TacticalAttribute::BuildUpPlayDribbling => "buildUpPlayDribbling",
            TacticalAttribute::BuildUpPlayPassing => "buildUpPlayPassing",
            TacticalAttribute::ChanceCreationPassing => "chanceCreationPassing",
            TacticalAttribute::ChanceCreationCrossing => "chanceCreationCrossing",
            TacticalAttribute::ChanceCreationShooting => "chanceCreationShooting",
            TacticalAttribute::DefencePressure => "defencePressure",
            TacticalAttribute::DefenceAggression => "defenceAggression",
            TacticalAttribute::DefenceTeamWidth => "defenceTeamWidth",
        }
    }

    pub fn from_column(raw: &str) -> Option<TacticalAttribute> {
        let raw = raw.trim();
        TacticalAttribute::ALL
            .into_iter()
            .find(|attr| attr.column().eq_ignore_ascii_case(raw))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatchRecord {
    pub id: u64,
    pub date: Option<NaiveDateTime>,
    pub home_team_id: u64,
    pub away_team_id: u64,
    pub home_goals: Option<u32>,
    pub away_goals: Option<u32>,
    pub home_players: [Option<u64>; SLOTS_PER_SIDE],
    pub away_players: [Option<u64>; SLOTS_PER_SIDE],
    pub home_player_y: [Option<i64>; SLOTS_PER_SIDE],
    pub away_player_y: [Option<i64>; SLOTS_PER_SIDE],
}

impl MatchRecord {
    /// Every filled formation slot of this match: home slots 1..=11, then away slots 1..=11.
    pub fn appearances(&self) -> impl Iterator<Item = PlayerAppearance> + '_ {
        let home = self.home_players.iter().zip(self.home_player_y.iter());
        let away = self.away_players.iter().zip(self.away_player_y.iter());
        home.chain(away).filter_map(move |(player, y)| {
            Some(PlayerAppearance {
                match_id: self.id,
                match_date: self.date,
                player_id: (*player)?,
                slot_y: *y,
            })
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerAppearance {
    pub match_id: u64,
    pub match_date: Option<NaiveDateTime>,
    pub player_id: u64,
    pub slot_y: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub player_api_id: u64,
    pub player_name: String,
    pub birthday: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerAttributeSnapshot {
    pub player_id: u64,
    pub date: Option<NaiveDateTime>,
    pub overall_rating: Option<f64>,
    pub potential: Option<f64>,
    pub attributes: BTreeMap<Attribute, f64>,
}

impl PlayerAttributeSnapshot {
    pub fn attribute(&self, attr: Attribute) -> Option<f64> {
        self.attributes.get(&attr).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub team_api_id: u64,
    pub team_long_name: String,
    pub team_short_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamAttributeSnapshot {
    pub team_id: u64,
    pub date: Option<NaiveDateTime>,
    pub values: BTreeMap<TacticalAttribute, f64>,
}

/// One possession sample. The source carries several samples per match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PossessionSample {
    pub match_id: u64,
    pub home: Option<f64>,
    pub away: Option<f64>,
}

/// One shot event, attributed to the shooting team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotEvent {
    pub match_id: u64,
    pub team_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRoleEntry {
    pub slot_y: i64,
    pub role: Role,
}

/// Everything one analysis run reads, fully in memory.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub matches: Vec<MatchRecord>,
    pub players: Vec<Player>,
    pub player_attributes: Vec<PlayerAttributeSnapshot>,
    pub teams: Vec<Team>,
    pub team_attributes: Vec<TeamAttributeSnapshot>,
    pub possession: Vec<PossessionSample>,
    pub shots_on: Vec<ShotEvent>,
    pub shots_off: Vec<ShotEvent>,
    pub slot_roles: Vec<SlotRoleEntry>,
    pub promising_names: Vec<String>,
}
