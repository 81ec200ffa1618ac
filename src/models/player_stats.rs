//! Persisted career statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BattingLine, BowlingLine, EntityId, MatchId, PlayerId};
use crate::calculate;

/// One player's figures from a single match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchContribution {
    pub innings: u32,
    pub runs: u32,
    pub balls: u32,
    pub fours: u32,
    pub sixes: u32,
    pub not_out: bool,
    pub high_score: u32,
    pub wickets: u32,
    pub runs_conceded: u32,
    pub balls_bowled: u32,
}

impl MatchContribution {
    /// Count a batting innings. Lines with no balls faced are ignored.
    pub fn add_batting(&mut self, line: &BattingLine) {
        if !line.has_batted() {
            return;
        }
        self.innings = self.innings.saturating_add(1);
        self.runs = self.runs.saturating_add(line.runs);
        self.balls = self.balls.saturating_add(line.balls);
        self.fours = self.fours.saturating_add(line.fours);
        self.sixes = self.sixes.saturating_add(line.sixes);
        if !line.is_out() {
            self.not_out = true;
        }
        self.high_score = self.high_score.max(line.runs);
    }

    pub fn add_bowling(&mut self, line: &BowlingLine) {
        self.wickets = self.wickets.saturating_add(line.wickets);
        self.runs_conceded = self.runs_conceded.saturating_add(line.runs);
        self.balls_bowled = self.balls_bowled.saturating_add(line.balls_bowled());
    }
}

/// Cumulative statistics for one player under one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerStats {
    pub user_id: String,
    pub player_name: String,
    #[serde(default)]
    pub player_id: Option<PlayerId>,
    #[serde(default)]
    pub total_matches: u32,
    #[serde(default)]
    pub total_innings: u32,
    #[serde(default)]
    pub total_runs: u32,
    #[serde(default)]
    pub total_balls: u32,
    #[serde(default)]
    pub high_score: u32,
    #[serde(default)]
    pub not_outs: u32,
    #[serde(default)]
    pub fours: u32,
    #[serde(default)]
    pub sixes: u32,
    #[serde(default)]
    pub wickets: u32,
    #[serde(default)]
    pub runs_conceded: u32,
    #[serde(default)]
    pub balls_bowled: u32,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    /// Matches already folded into these totals.
    #[serde(default)]
    pub processed_matches: Vec<MatchId>,
}

impl CareerStats {
    /// Zeroed record for a player seen for the first time.
    pub fn new(user_id: &str, player_name: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            player_name: player_name.to_string(),
            player_id: Some(EntityId::for_player_name(player_name)),
            total_matches: 0,
            total_innings: 0,
            total_runs: 0,
            total_balls: 0,
            high_score: 0,
            not_outs: 0,
            fours: 0,
            sixes: 0,
            wickets: 0,
            runs_conceded: 0,
            balls_bowled: 0,
            last_updated: None,
            processed_matches: Vec::new(),
        }
    }

    /// Store key for a player record.
    pub fn document_key(user_id: &str, player_name: &str) -> String {
        format!("{}_{}", user_id, player_name)
    }

    pub fn has_processed(&self, match_id: &MatchId) -> bool {
        self.processed_matches.contains(match_id)
    }

    /// Fold one match into the running totals.
    pub fn apply_match(
        &mut self,
        match_id: &MatchId,
        contribution: &MatchContribution,
        timestamp: DateTime<Utc>,
    ) {
        self.total_matches = self.total_matches.saturating_add(1);
        self.total_innings = self.total_innings.saturating_add(contribution.innings);
        self.total_runs = self.total_runs.saturating_add(contribution.runs);
        self.total_balls = self.total_balls.saturating_add(contribution.balls);
        self.high_score = self.high_score.max(contribution.high_score);
        if contribution.not_out {
            self.not_outs = self.not_outs.saturating_add(1);
        }
        self.fours = self.fours.saturating_add(contribution.fours);
        self.sixes = self.sixes.saturating_add(contribution.sixes);
        self.wickets = self.wickets.saturating_add(contribution.wickets);
        self.runs_conceded = self.runs_conceded.saturating_add(contribution.runs_conceded);
        self.balls_bowled = self.balls_bowled.saturating_add(contribution.balls_bowled);
        self.last_updated = Some(timestamp);
        self.processed_matches.push(match_id.clone());
    }
}

/// Career record enriched with rate statistics for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatsView {
    /// Store key of the underlying record
    pub id: String,

    #[serde(flatten)]
    pub stats: CareerStats,

    pub batting_avg: String,
    pub strike_rate: String,
    pub bowling_avg: String,
    pub economy: String,
}

impl PlayerStatsView {
    pub fn new(id: String, stats: CareerStats) -> Self {
        let batting_avg =
            calculate::batting_average(stats.total_runs, stats.total_innings, stats.not_outs);
        let strike_rate = calculate::strike_rate(stats.total_runs, stats.total_balls);
        let bowling_avg = calculate::bowling_average(stats.runs_conceded, stats.wickets);
        let economy = calculate::economy_rate(stats.runs_conceded, stats.balls_bowled);

        Self {
            id,
            stats,
            batting_avg,
            strike_rate,
            bowling_avg,
            economy,
        }
    }
}
