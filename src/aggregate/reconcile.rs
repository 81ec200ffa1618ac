//! Per-match reconciliation of scorecard lines into player contributions.

use std::collections::HashSet;

use tracing::debug;

use crate::models::{InningsCards, MatchContribution, MatchRecord, RosterEntry};

/// Innings whose lines name participants: current, first, second.
fn discovery_cards(record: &MatchRecord) -> Vec<InningsCards<'_>> {
    [
        Some(record.current_cards()),
        record.innings1_cards(),
        record.innings2_cards(),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Innings whose lines count towards totals.
///
/// The second-innings snapshot of a finished match repeats the current
/// innings, so only current and first innings are counted.
fn counting_cards(record: &MatchRecord) -> Vec<InningsCards<'_>> {
    [Some(record.current_cards()), record.innings1_cards()]
        .into_iter()
        .flatten()
        .collect()
}

fn batter<'a>(
    record: &'a MatchRecord,
    cards: &InningsCards<'_>,
    index: usize,
) -> Option<&'a RosterEntry> {
    let line = cards.batting.get(&index)?;
    record.resolve_line(cards.batting_side, index, line.player_id.as_ref())
}

fn bowler<'a>(
    record: &'a MatchRecord,
    cards: &InningsCards<'_>,
    index: usize,
) -> Option<&'a RosterEntry> {
    let line = cards.bowling.get(&index)?;
    record.resolve_line(cards.bowling_side(), index, line.player_id.as_ref())
}

/// Names of everyone who batted or bowled, in order of first appearance.
///
/// All batting cards are scanned before any bowling card. Lines that resolve
/// to no roster entry are dropped.
pub fn discover_participants(record: &MatchRecord) -> Vec<String> {
    let cards = discovery_cards(record);
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    let mut visit = |entry: Option<&RosterEntry>, index: usize| match entry {
        Some(entry) => {
            let name = entry.display_name();
            if seen.insert(name.to_string()) {
                names.push(name.to_string());
            }
        }
        None => debug!("No roster entry for scorecard line {}", index),
    };

    for c in &cards {
        for index in c.batting.keys() {
            visit(batter(record, c, *index), *index);
        }
    }
    for c in &cards {
        for index in c.bowling.keys() {
            visit(bowler(record, c, *index), *index);
        }
    }

    names
}

/// What one player did in this match.
///
/// Each counted innings contributes at most one batting and one bowling
/// line for the player.
pub fn contribution_for(record: &MatchRecord, name: &str) -> MatchContribution {
    let mut contribution = MatchContribution::default();

    for c in counting_cards(record) {
        let batting = c.batting.iter().find(|(index, _)| {
            batter(record, &c, **index).is_some_and(|e| e.display_name() == name)
        });
        if let Some((_, line)) = batting {
            contribution.add_batting(line);
        }

        let bowling = c.bowling.iter().find(|(index, _)| {
            bowler(record, &c, **index).is_some_and(|e| e.display_name() == name)
        });
        if let Some((_, line)) = bowling {
            contribution.add_bowling(line);
        }
    }

    contribution
}
