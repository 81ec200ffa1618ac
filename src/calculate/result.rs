//! Match result text.

use super::{max_wickets, wickets_remaining};
use crate::models::TeamSide;

/// Runs and wickets at the close of an innings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InningsTotals {
    pub runs: u32,
    pub wickets: u32,
}

pub const TIED: &str = "Match Tied";

fn plural(word: &str, count: i64) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

/// Describe the outcome of a two-innings match.
///
/// `batting_team` is the side that batted second. A chase won is measured
/// in that side's unused wickets, a defence in runs. Returns an empty string
/// until both innings are recorded.
#[allow(clippy::too_many_arguments)]
pub fn match_result<S: AsRef<str>>(
    innings1: Option<InningsTotals>,
    innings2: Option<InningsTotals>,
    team1_name: &str,
    team2_name: &str,
    batting_team: TeamSide,
    team1_roster: &[S],
    team2_roster: &[S],
) -> String {
    let (Some(first), Some(second)) = (innings1, innings2) else {
        return String::new();
    };

    let chasing_roster = match batting_team {
        TeamSide::Team2 => team2_roster,
        TeamSide::Team1 => team1_roster,
    };
    let (chasing_name, defending_name) = match batting_team {
        TeamSide::Team2 => (team2_name, team1_name),
        TeamSide::Team1 => (team1_name, team2_name),
    };

    if second.runs > first.runs {
        let margin = wickets_remaining(max_wickets(chasing_roster), second.wickets);
        format!(
            "{} won by {} {}",
            chasing_name,
            margin,
            plural("wicket", margin)
        )
    } else if second.runs < first.runs {
        let margin = i64::from(first.runs - second.runs);
        format!("{} won by {} {}", defending_name, margin, plural("run", margin))
    } else {
        TIED.to_string()
    }
}
