//! Match document schema.
//!
//! Matches arrive as loosely shaped JSON documents written by the scoring
//! UI. They are parsed and validated once here so that the rules engine and
//! the aggregator work on a fully typed structure.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{EntityId, MatchId, PlayerId, Roster, RosterEntry, TeamSide};
use crate::calculate::{self, InningsTotals};

/// Errors raised while ingesting a match document.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Malformed match document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid match document: {0}")]
    Validation(String),
}

fn default_status() -> String {
    "not out".to_string()
}

/// One batter's figures for an innings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattingLine {
    #[serde(default)]
    pub runs: u32,
    #[serde(default)]
    pub balls: u32,
    #[serde(default)]
    pub fours: u32,
    #[serde(default)]
    pub sixes: u32,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
}

impl Default for BattingLine {
    fn default() -> Self {
        Self {
            runs: 0,
            balls: 0,
            fours: 0,
            sixes: 0,
            status: default_status(),
            player_id: None,
        }
    }
}

impl BattingLine {
    pub fn is_out(&self) -> bool {
        self.status == "out"
    }

    /// A line with no balls faced means the player never came in.
    pub fn has_batted(&self) -> bool {
        self.balls > 0
    }
}

/// One bowler's figures for an innings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BowlingLine {
    #[serde(default)]
    pub overs: u32,
    #[serde(default)]
    pub balls: u32,
    #[serde(default)]
    pub runs: u32,
    #[serde(default)]
    pub wickets: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
}

impl BowlingLine {
    pub fn balls_bowled(&self) -> u32 {
        self.overs
            .saturating_mul(calculate::BALLS_PER_OVER)
            .saturating_add(self.balls)
    }
}

/// Batting lines keyed by roster position.
pub type BattingCard = BTreeMap<usize, BattingLine>;

/// Bowling lines keyed by roster position.
pub type BowlingCard = BTreeMap<usize, BowlingLine>;

/// Snapshot of a completed innings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InningsData {
    pub runs: u32,
    pub wickets: u32,
    pub overs: u32,
    pub balls: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batting_team: Option<TeamSide>,
    pub batsman_stats: BattingCard,
    pub bowler_stats: BowlingCard,
}

impl InningsData {
    pub fn totals(&self) -> InningsTotals {
        InningsTotals {
            runs: self.runs,
            wickets: self.wickets,
        }
    }
}

/// Borrowed view of one innings' scorecards and who batted in it.
#[derive(Debug, Clone, Copy)]
pub struct InningsCards<'a> {
    pub batting_side: Option<TeamSide>,
    pub batting: &'a BattingCard,
    pub bowling: &'a BowlingCard,
}

impl InningsCards<'_> {
    pub fn bowling_side(&self) -> Option<TeamSide> {
        self.batting_side.map(TeamSide::other)
    }
}

/// A match as stored by the scorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub team1_name: String,

    #[serde(default)]
    pub team2_name: String,

    #[serde(default)]
    pub team1_players: Roster,

    #[serde(default)]
    pub team2_players: Roster,

    /// Team batting in the current innings.
    pub batting_team: TeamSide,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_overs: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,

    /// Current innings number (1 or 2).
    #[serde(default = "default_innings")]
    pub current_innings: u32,

    #[serde(default)]
    pub runs: u32,

    #[serde(default)]
    pub wickets: u32,

    #[serde(default)]
    pub overs: u32,

    #[serde(default)]
    pub balls: u32,

    #[serde(default)]
    pub batsman_stats: BattingCard,

    #[serde(default)]
    pub bowler_stats: BowlingCard,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub innings1_data: Option<InningsData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub innings2_data: Option<InningsData>,
}

fn default_innings() -> u32 {
    1
}

impl MatchRecord {
    /// Parse and validate a match document.
    pub fn from_json(json: &str) -> Result<Self, MatchError> {
        let record: MatchRecord = serde_json::from_str(json)?;
        record.validate()?;
        Ok(record)
    }

    /// Check structural rules that serde cannot express.
    pub fn validate(&self) -> Result<(), MatchError> {
        for (label, cards) in self.all_cards() {
            for (index, line) in cards.bowling {
                if line.balls > 5 {
                    return Err(MatchError::Validation(format!(
                        "{} bowler {} has {} balls in an over (expected 0-5)",
                        label, index, line.balls
                    )));
                }
                self.check_player_ref(label, *index, line.player_id.as_ref())?;
            }
            for (index, line) in cards.batting {
                self.check_player_ref(label, *index, line.player_id.as_ref())?;
            }
        }
        Ok(())
    }

    fn check_player_ref(
        &self,
        label: &str,
        index: usize,
        player_id: Option<&PlayerId>,
    ) -> Result<(), MatchError> {
        match player_id {
            Some(id) if self.find_player(id).is_none() => Err(MatchError::Validation(format!(
                "{} line {} references unknown player {}",
                label, index, id
            ))),
            _ => Ok(()),
        }
    }

    /// Idempotency key: the document id, or a hash of the canonical document.
    pub fn match_id(&self) -> MatchId {
        match self.id.as_deref() {
            Some(id) if !id.trim().is_empty() => EntityId::from(id.trim()),
            _ => {
                let canonical = serde_json::to_string(self).unwrap_or_default();
                EntityId::generate(&["match", &canonical])
            }
        }
    }

    pub fn roster(&self, side: TeamSide) -> &Roster {
        match side {
            TeamSide::Team1 => &self.team1_players,
            TeamSide::Team2 => &self.team2_players,
        }
    }

    pub fn team_name(&self, side: TeamSide) -> &str {
        match side {
            TeamSide::Team1 => &self.team1_name,
            TeamSide::Team2 => &self.team2_name,
        }
    }

    pub fn find_player(&self, id: &PlayerId) -> Option<&RosterEntry> {
        self.team1_players
            .find_by_id(id)
            .or_else(|| self.team2_players.find_by_id(id))
    }

    /// Resolve a scorecard line to the roster entry it belongs to.
    ///
    /// An explicit player id wins. Otherwise the position is looked up in
    /// the roster of `side`; with no side known, team1 is tried before team2.
    pub fn resolve_line(
        &self,
        side: Option<TeamSide>,
        index: usize,
        player_id: Option<&PlayerId>,
    ) -> Option<&RosterEntry> {
        if let Some(id) = player_id {
            return self.find_player(id);
        }
        match side {
            Some(side) => self.roster(side).entry_at(index),
            None => self
                .team1_players
                .entry_at(index)
                .or_else(|| self.team2_players.entry_at(index)),
        }
    }

    /// Scorecards of the innings in progress (or last played).
    pub fn current_cards(&self) -> InningsCards<'_> {
        InningsCards {
            batting_side: Some(self.batting_team),
            batting: &self.batsman_stats,
            bowling: &self.bowler_stats,
        }
    }

    pub fn innings1_cards(&self) -> Option<InningsCards<'_>> {
        self.innings1_data.as_ref().map(innings_cards)
    }

    pub fn innings2_cards(&self) -> Option<InningsCards<'_>> {
        self.innings2_data.as_ref().map(innings_cards)
    }

    fn all_cards(&self) -> Vec<(&'static str, InningsCards<'_>)> {
        let mut cards = vec![("current innings", self.current_cards())];
        if let Some(c) = self.innings1_cards() {
            cards.push(("innings 1", c));
        }
        if let Some(c) = self.innings2_cards() {
            cards.push(("innings 2", c));
        }
        cards
    }

    /// Result text for a finished match, empty while undecided.
    pub fn result(&self) -> String {
        calculate::match_result(
            self.innings1_data.as_ref().map(InningsData::totals),
            self.innings2_data.as_ref().map(InningsData::totals),
            &self.team1_name,
            &self.team2_name,
            self.batting_team,
            &self.team1_players.names(),
            &self.team2_players.names(),
        )
    }
}

fn innings_cards(data: &InningsData) -> InningsCards<'_> {
    InningsCards {
        batting_side: data.batting_team,
        batting: &data.batsman_stats,
        bowling: &data.bowler_stats,
    }
}
