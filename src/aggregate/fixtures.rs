//! Match documents shared by the aggregation tests.

use crate::models::MatchRecord;

/// A finished five-over match.
///
/// Hawks (team1) batted first: Asha 30 (20) out, Bilal 12* (10), Chen did
/// not face. Dev and Elif bowled. Vipers (team2) chased 43/1: Dev 25 (15)
/// out, Elif 18* (12), with Asha and Chen bowling.
pub(crate) const SAMPLE_MATCH: &str = r#"{
    "id": "hawks-v-vipers",
    "team1Name": "Harbour Hawks",
    "team2Name": "Valley Vipers",
    "team1Players": ["Asha", "Bilal", "Chen"],
    "team2Players": ["Dev", "Elif", "Farah"],
    "battingTeam": "team2",
    "totalOvers": 5,
    "target": 43,
    "currentInnings": 2,
    "runs": 43,
    "wickets": 1,
    "overs": 4,
    "balls": 2,
    "batsmanStats": {
        "0": {"runs": 25, "balls": 15, "fours": 2, "sixes": 1, "status": "out"},
        "1": {"runs": 18, "balls": 12, "fours": 1, "sixes": 0, "status": "not out"}
    },
    "bowlerStats": {
        "0": {"overs": 2, "balls": 0, "runs": 18, "wickets": 1},
        "2": {"overs": 1, "balls": 4, "runs": 25, "wickets": 1}
    },
    "innings1Data": {
        "runs": 42,
        "wickets": 1,
        "overs": 5,
        "balls": 0,
        "battingTeam": "team1",
        "batsmanStats": {
            "0": {"runs": 30, "balls": 20, "fours": 3, "sixes": 1, "status": "out"},
            "1": {"runs": 12, "balls": 10, "fours": 1, "sixes": 0, "status": "not out"},
            "2": {"runs": 0, "balls": 0, "fours": 0, "sixes": 0, "status": "not out"}
        },
        "bowlerStats": {
            "0": {"overs": 2, "balls": 0, "runs": 20, "wickets": 1},
            "1": {"overs": 1, "balls": 3, "runs": 22, "wickets": 0}
        }
    },
    "innings2Data": {
        "runs": 43,
        "wickets": 1,
        "overs": 4,
        "balls": 2,
        "battingTeam": "team2",
        "batsmanStats": {
            "0": {"runs": 25, "balls": 15, "fours": 2, "sixes": 1, "status": "out"},
            "1": {"runs": 18, "balls": 12, "fours": 1, "sixes": 0, "status": "not out"}
        },
        "bowlerStats": {
            "0": {"overs": 2, "balls": 0, "runs": 18, "wickets": 1},
            "2": {"overs": 1, "balls": 4, "runs": 25, "wickets": 1}
        }
    }
}"#;

pub(crate) fn sample_match() -> MatchRecord {
    MatchRecord::from_json(SAMPLE_MATCH).unwrap()
}

/// The same fixture under a different match id.
pub(crate) fn rematch(id: &str) -> MatchRecord {
    let mut record = sample_match();
    record.id = Some(id.to_string());
    record
}
