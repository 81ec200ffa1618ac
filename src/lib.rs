//! # Cricket Scorer
//!
//! Ball-by-ball scoring rules and career statistics for limited-overs
//! cricket.
//!
//! ## Architecture
//!
//! - **calculate**: Rules engine (wicket limits, innings end, results, rates)
//! - **models**: Match documents, rosters and career records
//! - **aggregate**: Folds finished matches into per-player career totals
//! - **storage**: Document store trait with memory and JSONL backends
//! - **config**: Configuration loading and validation

pub mod aggregate;
pub mod calculate;
pub mod config;
pub mod models;
pub mod storage;

pub use models::*;
