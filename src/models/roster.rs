//! Team rosters and stable player identity.

use serde::{Deserialize, Serialize};

use super::{EntityId, PlayerId};

/// Which side of the fixture a team occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamSide {
    Team1,
    Team2,
}

impl TeamSide {
    /// The opposing side.
    pub fn other(self) -> Self {
        match self {
            TeamSide::Team1 => TeamSide::Team2,
            TeamSide::Team2 => TeamSide::Team1,
        }
    }
}

impl std::fmt::Display for TeamSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamSide::Team1 => write!(f, "team1"),
            TeamSide::Team2 => write!(f, "team2"),
        }
    }
}

/// Wire form of a roster entry: either a bare name or an object with an id.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRosterEntry {
    Name(String),
    Entry {
        #[serde(default)]
        id: Option<PlayerId>,
        name: String,
    },
}

/// One roster slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawRosterEntry")]
pub struct RosterEntry {
    pub id: PlayerId,
    pub name: String,
}

impl From<RawRosterEntry> for RosterEntry {
    fn from(raw: RawRosterEntry) -> Self {
        match raw {
            RawRosterEntry::Name(name) => Self::new(name),
            RawRosterEntry::Entry { id: Some(id), name } => Self { id, name },
            RawRosterEntry::Entry { id: None, name } => Self::new(name),
        }
    }
}

impl RosterEntry {
    /// Create an entry whose id is derived from the name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: EntityId::for_player_name(&name),
            name,
        }
    }

    /// Name with surrounding whitespace removed.
    pub fn display_name(&self) -> &str {
        self.name.trim()
    }

    pub fn is_blank(&self) -> bool {
        self.display_name().is_empty()
    }
}

/// Ordered list of players for one team.
///
/// Blank slots are kept so that positional references in older documents
/// still line up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster(Vec<RosterEntry>);

impl Roster {
    /// Build a roster from plain names, deriving ids.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        Self(
            names
                .iter()
                .map(|n| RosterEntry::new(n.as_ref().to_string()))
                .collect(),
        )
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.0
    }

    /// Raw names in roster order, blanks included.
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.name.as_str()).collect()
    }

    /// Non-blank entry at a position.
    pub fn entry_at(&self, index: usize) -> Option<&RosterEntry> {
        self.0.get(index).filter(|e| !e.is_blank())
    }

    /// Position of the first entry whose trimmed name matches exactly.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.0
            .iter()
            .position(|e| !e.is_blank() && e.display_name() == name)
    }

    pub fn find_by_id(&self, id: &PlayerId) -> Option<&RosterEntry> {
        self.0.iter().find(|e| &e.id == id && !e.is_blank())
    }
}
