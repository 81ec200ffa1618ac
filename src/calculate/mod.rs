//! Cricket rules engine.
//!
//! Pure functions used while scoring a match and when deciding it:
//! - Wicket limits and innings-end detection
//! - Remaining balls and wickets
//! - Match result text
//! - Batting and bowling rate statistics
//!
//! Nothing here fails. Degenerate inputs resolve to sentinel values.

mod rates;
mod result;

pub use rates::*;
pub use result::*;

/// Wicket limit used when a roster has no named players.
pub const DEFAULT_MAX_WICKETS: u32 = 10;

/// Balls in a legal over.
pub const BALLS_PER_OVER: u32 = 6;

/// Wickets that end an innings for a roster: one fewer than named players.
pub fn max_wickets<S: AsRef<str>>(roster: &[S]) -> u32 {
    let players = roster
        .iter()
        .filter(|p| !p.as_ref().trim().is_empty())
        .count() as u32;
    if players > 0 {
        players - 1
    } else {
        DEFAULT_MAX_WICKETS
    }
}

pub fn is_all_out(wickets: u32, max_wickets: u32) -> bool {
    wickets >= max_wickets
}

pub fn are_overs_complete(overs: u32, total_overs: u32) -> bool {
    overs >= total_overs
}

/// Only a second innings can chase, and only a set target counts.
pub fn is_target_chased(innings: u32, runs: u32, target: Option<u32>) -> bool {
    match target {
        Some(target) if innings == 2 && target != 0 => runs >= target,
        _ => false,
    }
}

/// Not clamped: callers passing more wickets than the limit get a negative.
pub fn wickets_remaining(max_wickets: u32, wickets: u32) -> i64 {
    i64::from(max_wickets) - i64::from(wickets)
}

pub fn balls_remaining(total_overs: u32, overs: u32, balls: u32) -> i64 {
    let total = i64::from(total_overs) * i64::from(BALLS_PER_OVER);
    let bowled = i64::from(overs) * i64::from(BALLS_PER_OVER) + i64::from(balls);
    total - bowled
}

pub fn runs_difference(runs1: u32, runs2: u32) -> u32 {
    runs1.abs_diff(runs2)
}

/// Live position of an innings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InningsProgress {
    pub innings: u32,
    pub runs: u32,
    pub wickets: u32,
    pub overs: u32,
    pub balls: u32,
}

/// Everything the scoreboard needs to know about an innings at one ball.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InningsStatus {
    pub max_wickets: u32,
    pub wickets_remaining: i64,
    pub balls_remaining: i64,
    pub all_out: bool,
    pub overs_complete: bool,
    pub target_chased: bool,
}

impl InningsStatus {
    pub fn evaluate<S: AsRef<str>>(
        progress: InningsProgress,
        total_overs: u32,
        target: Option<u32>,
        batting_roster: &[S],
    ) -> Self {
        let max = max_wickets(batting_roster);
        Self {
            max_wickets: max,
            wickets_remaining: wickets_remaining(max, progress.wickets),
            balls_remaining: balls_remaining(total_overs, progress.overs, progress.balls),
            all_out: is_all_out(progress.wickets, max),
            overs_complete: are_overs_complete(progress.overs, total_overs),
            target_chased: is_target_chased(progress.innings, progress.runs, target),
        }
    }

    /// The innings is over for any of the three reasons.
    pub fn is_complete(&self) -> bool {
        self.all_out || self.overs_complete || self.target_chased
    }
}
