//! Career statistics aggregation.
//!
//! After a match is finalized every participant's cumulative record is
//! fetched, merged with their contribution from this match and written
//! back. Players are processed one at a time; a store failure aborts the
//! run but leaves already-written players updated. Each record remembers
//! the matches folded into it, so re-running a match only applies the
//! players it missed.

#[cfg(test)]
pub(crate) mod fixtures;
mod reconcile;

pub use reconcile::{contribution_for, discover_participants};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{CareerStats, MatchContribution, MatchId, MatchRecord, PlayerStatsView};
use crate::storage::{with_timeout, Document, DocumentStore, StorageError};

/// Collection holding cumulative player records.
pub const PLAYER_STATS_COLLECTION: &str = "playerStats";

/// Errors that abort an aggregation or listing run.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("Failed to update stats for {player}: {source}")]
    Store {
        player: String,
        #[source]
        source: StorageError,
    },

    #[error("Failed to load player stats: {0}")]
    Query(#[source] StorageError),

    #[error("Stored stats for {key} are unreadable: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Tuning for the aggregator.
#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    pub collection: String,
    /// Deadline applied to each individual store call.
    pub store_timeout: Duration,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            collection: PLAYER_STATS_COLLECTION.to_string(),
            store_timeout: Duration::from_secs(30),
        }
    }
}

/// Outcome of one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationSummary {
    /// Unset when the run was skipped.
    pub match_id: Option<MatchId>,
    pub updated: Vec<String>,
    pub already_applied: Vec<String>,
}

impl AggregationSummary {
    pub fn is_skipped(&self) -> bool {
        self.match_id.is_none()
    }
}

/// Applies finished matches to career records in a document store.
pub struct StatsAggregator {
    store: Arc<dyn DocumentStore>,
    options: AggregatorOptions,
}

fn owner_of(owner: Option<&str>) -> Option<&str> {
    owner.map(str::trim).filter(|o| !o.is_empty())
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn DocumentStore>, options: AggregatorOptions) -> Self {
        Self { store, options }
    }

    pub fn with_defaults(store: Arc<dyn DocumentStore>) -> Self {
        Self::new(store, AggregatorOptions::default())
    }

    async fn call<T, F>(&self, call: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        with_timeout(self.options.store_timeout, call).await
    }

    /// Fold a finalized match into every participant's career record.
    ///
    /// Without an owner nothing is written and a skipped summary is returned.
    pub async fn aggregate_match_stats(
        &self,
        record: &MatchRecord,
        owner: Option<&str>,
    ) -> Result<AggregationSummary, AggregateError> {
        let Some(owner) = owner_of(owner) else {
            warn!("Skipping player stats update - no owner");
            return Ok(AggregationSummary::default());
        };

        let match_id = record.match_id();
        info!(
            "Updating player statistics for match {} via {} store",
            match_id,
            self.store.name()
        );

        let players = discover_participants(record);
        info!("Found {} players to update", players.len());

        let mut summary = AggregationSummary {
            match_id: Some(match_id.clone()),
            ..AggregationSummary::default()
        };

        for name in players {
            let contribution = contribution_for(record, &name);
            if self
                .apply_to_player(owner, &name, &match_id, &contribution)
                .await?
            {
                summary.updated.push(name);
            } else {
                summary.already_applied.push(name);
            }
        }

        info!(
            "Player stats updated for match {} ({} updated, {} already applied)",
            match_id,
            summary.updated.len(),
            summary.already_applied.len()
        );
        Ok(summary)
    }

    /// Returns false when this match was already applied to the player.
    async fn apply_to_player(
        &self,
        owner: &str,
        name: &str,
        match_id: &MatchId,
        contribution: &MatchContribution,
    ) -> Result<bool, AggregateError> {
        let collection = self.options.collection.as_str();
        let key = CareerStats::document_key(owner, name);
        let store_err = |source: StorageError| AggregateError::Store {
            player: name.to_string(),
            source,
        };

        let existing = self
            .call(self.store.get(collection, &key))
            .await
            .map_err(store_err)?;
        let mut stats = match existing {
            Some(doc) => parse_stats(&key, doc)?,
            None => CareerStats::new(owner, name),
        };

        if stats.has_processed(match_id) {
            debug!("Match {} already applied to {}", match_id, name);
            return Ok(false);
        }

        let now = self
            .call(self.store.server_timestamp())
            .await
            .map_err(store_err)?;
        stats.apply_match(match_id, contribution, now);

        let doc = serde_json::to_value(&stats).map_err(|e| store_err(StorageError::Json(e)))?;
        self.call(self.store.set(collection, &key, doc))
            .await
            .map_err(store_err)?;

        info!("Updated stats for {}", name);
        Ok(true)
    }

    /// All career records of an owner with rate statistics, most runs first.
    pub async fn list_player_stats(
        &self,
        owner: Option<&str>,
    ) -> Result<Vec<PlayerStatsView>, AggregateError> {
        let Some(owner) = owner_of(owner) else {
            warn!("Cannot fetch player stats - no owner");
            return Ok(Vec::new());
        };

        let docs = self
            .call(self.store.query(
                &self.options.collection,
                "userId",
                &Document::String(owner.to_string()),
            ))
            .await
            .map_err(AggregateError::Query)?;

        let mut views = docs
            .into_iter()
            .map(|(key, doc)| {
                let stats = parse_stats(&key, doc)?;
                Ok(PlayerStatsView::new(key, stats))
            })
            .collect::<Result<Vec<_>, AggregateError>>()?;

        views.sort_by(|a, b| b.stats.total_runs.cmp(&a.stats.total_runs));

        info!("Loaded stats for {} players", views.len());
        Ok(views)
    }
}

fn parse_stats(key: &str, doc: Document) -> Result<CareerStats, AggregateError> {
    serde_json::from_value(doc).map_err(|source| AggregateError::Corrupt {
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::fixtures::{rematch, sample_match};
    use crate::models::EntityId;
    use crate::storage::{JsonlStore, MemoryStore, StorageConfig};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    const OWNER: &str = "uid-7";

    /// Memory store whose writes start failing after a set number succeed.
    struct FlakyStore {
        inner: MemoryStore,
        writes_left: Mutex<Option<usize>>,
    }

    impl FlakyStore {
        fn failing_after(writes: usize) -> Self {
            Self {
                inner: MemoryStore::new(),
                writes_left: Mutex::new(Some(writes)),
            }
        }

        fn heal(&self) {
            *self.writes_left.lock().unwrap() = None;
        }
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn get(
            &self,
            collection: &str,
            key: &str,
        ) -> Result<Option<Document>, StorageError> {
            self.inner.get(collection, key).await
        }

        async fn set(
            &self,
            collection: &str,
            key: &str,
            doc: Document,
        ) -> Result<(), StorageError> {
            {
                let mut left = self.writes_left.lock().unwrap();
                match left.as_mut() {
                    Some(0) => return Err(StorageError::Backend("connection reset".to_string())),
                    Some(n) => *n -= 1,
                    None => {}
                }
            }
            self.inner.set(collection, key, doc).await
        }

        async fn query(
            &self,
            collection: &str,
            field: &str,
            value: &Document,
        ) -> Result<Vec<(String, Document)>, StorageError> {
            self.inner.query(collection, field, value).await
        }

        async fn server_timestamp(&self) -> Result<DateTime<Utc>, StorageError> {
            self.inner.server_timestamp().await
        }
    }

    /// Store whose reads never answer in time.
    struct StalledStore;

    #[async_trait]
    impl DocumentStore for StalledStore {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn get(&self, _: &str, _: &str) -> Result<Option<Document>, StorageError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }

        async fn set(&self, _: &str, _: &str, _: Document) -> Result<(), StorageError> {
            Ok(())
        }

        async fn query(
            &self,
            _: &str,
            _: &str,
            _: &Document,
        ) -> Result<Vec<(String, Document)>, StorageError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }

        async fn server_timestamp(&self) -> Result<DateTime<Utc>, StorageError> {
            Ok(Utc::now())
        }
    }

    async fn load(store: &dyn DocumentStore, name: &str) -> CareerStats {
        let doc = store
            .get(PLAYER_STATS_COLLECTION, &CareerStats::document_key(OWNER, name))
            .await
            .unwrap()
            .unwrap();
        serde_json::from_value(doc).unwrap()
    }

    #[tokio::test]
    async fn test_aggregate_creates_records() {
        let store = Arc::new(MemoryStore::new());
        let aggregator = StatsAggregator::with_defaults(store.clone());

        let summary = assert_ok!(
            aggregator
                .aggregate_match_stats(&sample_match(), Some(OWNER))
                .await
        );

        assert_eq!(summary.match_id, Some(EntityId::from("hawks-v-vipers")));
        assert_eq!(summary.updated, vec!["Dev", "Elif", "Asha", "Bilal", "Chen"]);
        assert!(summary.already_applied.is_empty());
        assert_eq!(store.len(PLAYER_STATS_COLLECTION).await, 5);

        let asha = load(store.as_ref(), "Asha").await;
        assert_eq!(asha.user_id, OWNER);
        assert_eq!(asha.total_matches, 1);
        assert_eq!(asha.total_innings, 1);
        assert_eq!(asha.total_runs, 30);
        assert_eq!(asha.total_balls, 20);
        assert_eq!(asha.high_score, 30);
        assert_eq!(asha.not_outs, 0);
        assert_eq!(asha.fours, 3);
        assert_eq!(asha.sixes, 1);
        assert_eq!(asha.wickets, 1);
        assert_eq!(asha.runs_conceded, 18);
        assert_eq!(asha.balls_bowled, 12);
        assert!(asha.last_updated.is_some());
        assert_eq!(asha.processed_matches, vec![EntityId::from("hawks-v-vipers")]);

        let bilal = load(store.as_ref(), "Bilal").await;
        assert_eq!(bilal.not_outs, 1);

        let chen = load(store.as_ref(), "Chen").await;
        assert_eq!(chen.total_matches, 1);
        assert_eq!(chen.total_innings, 0);
        assert_eq!(chen.wickets, 1);
    }

    #[tokio::test]
    async fn test_reaggregating_same_match_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let aggregator = StatsAggregator::with_defaults(store.clone());
        let record = sample_match();

        assert_ok!(aggregator.aggregate_match_stats(&record, Some(OWNER)).await);
        let before = load(store.as_ref(), "Dev").await;

        let again = assert_ok!(aggregator.aggregate_match_stats(&record, Some(OWNER)).await);
        assert!(again.updated.is_empty());
        assert_eq!(again.already_applied.len(), 5);

        let after = load(store.as_ref(), "Dev").await;
        assert_eq!(before, after);
        assert_eq!(after.total_matches, 1);
        assert_eq!(after.total_runs, 25);
    }

    #[tokio::test]
    async fn test_new_match_accumulates() {
        let store = Arc::new(MemoryStore::new());
        let aggregator = StatsAggregator::with_defaults(store.clone());

        assert_ok!(aggregator.aggregate_match_stats(&sample_match(), Some(OWNER)).await);
        let first = load(store.as_ref(), "Asha").await;

        assert_ok!(aggregator.aggregate_match_stats(&rematch("return-leg"), Some(OWNER)).await);
        let second = load(store.as_ref(), "Asha").await;

        assert_eq!(second.total_matches, first.total_matches + 1);
        assert_eq!(second.total_runs, 60);
        assert_eq!(second.total_innings, 2);
        assert_eq!(second.high_score, 30);
        assert_eq!(second.wickets, 2);
        assert_eq!(second.processed_matches.len(), 2);
        assert!(second.last_updated >= first.last_updated);
    }

    #[tokio::test]
    async fn test_high_score_is_running_max() {
        let store = Arc::new(MemoryStore::new());
        let mut existing = CareerStats::new(OWNER, "Asha");
        existing.total_matches = 4;
        existing.high_score = 88;
        store
            .set(
                PLAYER_STATS_COLLECTION,
                &CareerStats::document_key(OWNER, "Asha"),
                serde_json::to_value(&existing).unwrap(),
            )
            .await
            .unwrap();

        let aggregator = StatsAggregator::with_defaults(store.clone());
        assert_ok!(aggregator.aggregate_match_stats(&sample_match(), Some(OWNER)).await);

        let asha = load(store.as_ref(), "Asha").await;
        assert_eq!(asha.high_score, 88);
        assert_eq!(asha.total_matches, 5);
    }

    #[tokio::test]
    async fn test_missing_owner_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let aggregator = StatsAggregator::with_defaults(store.clone());

        let summary = assert_ok!(aggregator.aggregate_match_stats(&sample_match(), None).await);
        assert!(summary.is_skipped());

        let blank = assert_ok!(aggregator.aggregate_match_stats(&sample_match(), Some("  ")).await);
        assert!(blank.is_skipped());

        assert_eq!(store.len(PLAYER_STATS_COLLECTION).await, 0);
    }

    #[tokio::test]
    async fn test_store_failure_keeps_partial_writes() {
        let store = Arc::new(FlakyStore::failing_after(2));
        let aggregator = StatsAggregator::with_defaults(store.clone());
        let record = sample_match();

        let err = assert_err!(aggregator.aggregate_match_stats(&record, Some(OWNER)).await);
        match &err {
            AggregateError::Store { player, source } => {
                assert_eq!(player, "Asha");
                assert!(matches!(source, StorageError::Backend(_)));
            }
            other => panic!("unexpected error: {}", other),
        }

        assert_eq!(load(store.as_ref(), "Dev").await.total_matches, 1);
        assert!(store
            .get(PLAYER_STATS_COLLECTION, &CareerStats::document_key(OWNER, "Asha"))
            .await
            .unwrap()
            .is_none());

        store.heal();
        let retry = assert_ok!(aggregator.aggregate_match_stats(&record, Some(OWNER)).await);
        assert_eq!(retry.already_applied, vec!["Dev", "Elif"]);
        assert_eq!(retry.updated, vec!["Asha", "Bilal", "Chen"]);
        assert_eq!(load(store.as_ref(), "Dev").await.total_matches, 1);
    }

    #[tokio::test]
    async fn test_corrupt_record_aborts() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                PLAYER_STATS_COLLECTION,
                &CareerStats::document_key(OWNER, "Dev"),
                json!({"userId": OWNER, "playerName": "Dev", "totalRuns": "lots"}),
            )
            .await
            .unwrap();

        let aggregator = StatsAggregator::with_defaults(store);
        let err = assert_err!(aggregator.aggregate_match_stats(&sample_match(), Some(OWNER)).await);
        assert!(matches!(err, AggregateError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_store_timeout_is_fatal() {
        let aggregator = StatsAggregator::new(
            Arc::new(StalledStore),
            AggregatorOptions {
                store_timeout: Duration::from_millis(20),
                ..AggregatorOptions::default()
            },
        );

        let err = assert_err!(aggregator.aggregate_match_stats(&sample_match(), Some(OWNER)).await);
        assert!(matches!(
            err,
            AggregateError::Store {
                source: StorageError::Timeout(20),
                ..
            }
        ));

        let err = assert_err!(aggregator.list_player_stats(Some(OWNER)).await);
        assert!(matches!(err, AggregateError::Query(StorageError::Timeout(20))));
    }

    #[tokio::test]
    async fn test_list_player_stats_sorted_with_rates() {
        let store = Arc::new(MemoryStore::new());
        let aggregator = StatsAggregator::with_defaults(store.clone());
        assert_ok!(aggregator.aggregate_match_stats(&sample_match(), Some(OWNER)).await);
        assert_ok!(aggregator.aggregate_match_stats(&sample_match(), Some("someone-else")).await);

        let views = assert_ok!(aggregator.list_player_stats(Some(OWNER)).await);
        let names: Vec<&str> = views.iter().map(|v| v.stats.player_name.as_str()).collect();
        assert_eq!(names, vec!["Asha", "Dev", "Elif", "Bilal", "Chen"]);

        let asha = &views[0];
        assert_eq!(asha.id, "uid-7_Asha");
        assert_eq!(asha.batting_avg, "30.00");
        assert_eq!(asha.strike_rate, "150.00");
        assert_eq!(asha.bowling_avg, "18.00");
        assert_eq!(asha.economy, "9.00");

        let elif = &views[2];
        assert_eq!(elif.batting_avg, "N/A");
        assert_eq!(elif.bowling_avg, "N/A");

        let chen = &views[4];
        assert_eq!(chen.strike_rate, "0.00");
    }

    #[tokio::test]
    async fn test_aggregate_over_jsonl_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(JsonlStore::new(StorageConfig::new(temp_dir.path().to_path_buf())));
        let aggregator = StatsAggregator::with_defaults(store.clone());

        assert_ok!(aggregator.aggregate_match_stats(&sample_match(), Some(OWNER)).await);
        let again = assert_ok!(
            aggregator
                .aggregate_match_stats(&sample_match(), Some(OWNER))
                .await
        );
        assert_eq!(again.already_applied.len(), 5);

        let asha = load(store.as_ref(), "Asha").await;
        assert_eq!(asha.total_matches, 1);
        assert_eq!(asha.total_runs, 30);

        let views = assert_ok!(aggregator.list_player_stats(Some(OWNER)).await);
        assert_eq!(views.len(), 5);
        assert_eq!(views[0].stats.player_name, "Asha");
    }

    #[tokio::test]
    async fn test_unreadable_jsonl_record_aborts_without_overwriting() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());
        let path = config.collection_path(PLAYER_STATS_COLLECTION);
        std::fs::create_dir_all(config.collections_dir()).unwrap();
        let history = concat!(
            r#"{"key":"uid-7_Asha","doc":{"userId":"uid-7","playerName":"Asha","#,
            r#""totalMatches":40,"totalRuns":1200}"#,
            "\n"
        );
        std::fs::write(&path, history).unwrap();

        let aggregator = StatsAggregator::with_defaults(Arc::new(JsonlStore::new(config)));
        let err = assert_err!(aggregator.aggregate_match_stats(&sample_match(), Some(OWNER)).await);
        assert!(matches!(
            err,
            AggregateError::Store {
                source: StorageError::CorruptLine { line: 1, .. },
                ..
            }
        ));

        assert_eq!(std::fs::read_to_string(&path).unwrap(), history);
    }

    #[tokio::test]
    async fn test_list_without_owner_is_empty() {
        let aggregator = StatsAggregator::with_defaults(Arc::new(MemoryStore::new()));
        let views = assert_ok!(aggregator.list_player_stats(None).await);
        assert!(views.is_empty());
    }
}
