//! Core data models for the cricket scorer.

mod ids;
mod match_record;
mod player_stats;
mod roster;

pub use ids::*;
pub use match_record::*;
pub use player_stats::*;
pub use roster::*;
