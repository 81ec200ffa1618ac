//! Batting and bowling rate statistics.
//!
//! Rates are returned pre-formatted to two decimals, the form the scorecard
//! and career tables display. A zero denominator yields a sentinel instead.

use super::BALLS_PER_OVER;

/// Shown when an average has no dismissals to divide by.
pub const NOT_AVAILABLE: &str = "N/A";

/// Shown when a per-ball rate has no balls to divide by.
pub const ZERO_RATE: &str = "0.00";

fn two_places(value: f64) -> String {
    format!("{:.2}", value)
}

pub fn batting_average(runs: u32, innings: u32, not_outs: u32) -> String {
    let outs = i64::from(innings) - i64::from(not_outs);
    if outs <= 0 {
        return NOT_AVAILABLE.to_string();
    }
    two_places(f64::from(runs) / outs as f64)
}

/// Runs per hundred balls faced.
pub fn strike_rate(runs: u32, balls: u32) -> String {
    if balls == 0 {
        return ZERO_RATE.to_string();
    }
    two_places(f64::from(runs) / f64::from(balls) * 100.0)
}

pub fn bowling_average(runs_conceded: u32, wickets: u32) -> String {
    if wickets == 0 {
        return NOT_AVAILABLE.to_string();
    }
    two_places(f64::from(runs_conceded) / f64::from(wickets))
}

/// Runs conceded per six-ball over.
pub fn economy_rate(runs_conceded: u32, balls_bowled: u32) -> String {
    if balls_bowled == 0 {
        return ZERO_RATE.to_string();
    }
    let overs = f64::from(balls_bowled) / f64::from(BALLS_PER_OVER);
    two_places(f64::from(runs_conceded) / overs)
}

/// `"15.3"` for fifteen overs and three balls. Balls are not normalized.
pub fn format_overs(overs: u32, balls: u32) -> String {
    format!("{}.{}", overs, balls)
}

pub fn balls_to_overs(total_balls: u32) -> String {
    format_overs(total_balls / BALLS_PER_OVER, total_balls % BALLS_PER_OVER)
}
