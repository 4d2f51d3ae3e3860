//! Repository trait definitions for testability and dependency injection.
//!
//! The engine never talks to PostgreSQL directly; it goes through these
//! traits, which makes the bracket manager testable against an in-memory
//! mock and keeps the store swappable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row, postgres::PgRow};
use thiserror::Error;

use crate::entities::{ApprovalStatus, Competitor, CompetitorId, GroupId, MatchId};
use crate::lifecycle::{Match, MatchStatus};
use crate::seeding::MatchSeed;

/// Store errors, annotated with the failing operation and record so a
/// batch caller can report exactly which persistence call went wrong.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{operation} failed for {record}: {source}")]
    Database {
        operation: &'static str,
        record: String,
        #[source]
        source: sqlx::Error,
    },

    /// Unique constraint on `(group_id, round, side_a, side_b)` fired:
    /// another writer already persisted this pairing.
    #[error("match already exists for group {group_id} round {round}: {side_a} vs {side_b}")]
    DuplicateMatch {
        group_id: GroupId,
        round: u32,
        side_a: CompetitorId,
        side_b: CompetitorId,
    },

    #[error("match {0} not found")]
    MatchNotFound(MatchId),

    #[error("stored match {id} has unknown status {status:?}")]
    UnknownStatus { id: MatchId, status: String },

    #[error("stored competitor {id} has unknown approval status {status:?}")]
    UnknownApproval { id: CompetitorId, status: String },

    #[error("snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Mutable fields of a match record, for partial updates. Fields left as
/// `None` keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchUpdate {
    pub status: Option<MatchStatus>,
    pub is_scheduled: Option<bool>,
    pub is_reviewed: Option<bool>,
    pub scheduled_for: Option<chrono::DateTime<chrono::Utc>>,
    pub winner: Option<CompetitorId>,
}

impl MatchUpdate {
    /// Capture every mutable field of a record, typically after a
    /// lifecycle transition has been applied in memory.
    pub fn from_record(record: &Match) -> Self {
        Self {
            status: Some(record.status),
            is_scheduled: Some(record.is_scheduled),
            is_reviewed: Some(record.is_reviewed),
            scheduled_for: record.scheduled_for,
            winner: record.winner,
        }
    }
}

/// Trait for competitor repository operations
#[async_trait]
pub trait CompetitorRepository: Send + Sync {
    /// List a group's competitors, optionally filtered by approval status
    async fn list_competitors(
        &self,
        group_id: GroupId,
        status: Option<ApprovalStatus>,
    ) -> StoreResult<Vec<Competitor>>;

    /// Resolve a single competitor reference
    async fn get_competitor(&self, id: CompetitorId) -> StoreResult<Option<Competitor>>;
}

/// Trait for match repository operations
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// List all matches belonging to a group
    async fn list_matches(&self, group_id: GroupId) -> StoreResult<Vec<Match>>;

    /// Persist a generated pairing; the store assigns the id
    async fn create_match(&self, seed: &MatchSeed) -> StoreResult<Match>;

    /// Apply a partial update and return the stored record
    async fn update_match(&self, id: MatchId, update: &MatchUpdate) -> StoreResult<Match>;
}

/// Prediction snapshot persisted alongside the match as an opaque blob.
/// Written once at creation time and never touched again.
#[derive(Debug, Serialize, Deserialize)]
struct PredictionSnapshot {
    predicted_winner: CompetitorId,
    win_probability: u8,
}

fn db_err(
    operation: &'static str,
    record: impl Into<String>,
) -> impl FnOnce(sqlx::Error) -> StoreError {
    let record = record.into();
    move |source| StoreError::Database {
        operation,
        record,
        source,
    }
}

fn decode_competitor(row: &PgRow) -> StoreResult<Competitor> {
    let id: CompetitorId = row.get("id");
    let approval_str: String = row.get("approval");
    let approval =
        ApprovalStatus::parse(&approval_str).ok_or_else(|| StoreError::UnknownApproval {
            id,
            status: approval_str,
        })?;

    Ok(Competitor {
        id,
        display_name: row.get("display_name"),
        rating: row.get("rating"),
        group_id: row.get("group_id"),
        approval,
    })
}

fn decode_match(row: &PgRow) -> StoreResult<Match> {
    let id: MatchId = row.get("id");
    let status_str: String = row.get("status");
    let status = MatchStatus::parse(&status_str).ok_or_else(|| StoreError::UnknownStatus {
        id,
        status: status_str,
    })?;

    let snapshot: PredictionSnapshot =
        serde_json::from_value(row.get::<serde_json::Value, _>("prediction"))?;

    Ok(Match {
        id,
        group_id: row.get("group_id"),
        round: row.get::<i32, _>("round") as u32,
        side_a: row.get("side_a"),
        side_b: row.get("side_b"),
        status,
        is_scheduled: row.get("is_scheduled"),
        is_reviewed: row.get("is_reviewed"),
        scheduled_for: row
            .get::<Option<chrono::NaiveDateTime>, _>("scheduled_for")
            .map(|dt| dt.and_utc()),
        predicted_winner: snapshot.predicted_winner,
        win_probability: snapshot.win_probability,
        winner: row.get("winner"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    })
}

/// Default PostgreSQL implementation of `CompetitorRepository`
pub struct PgCompetitorRepository {
    pool: PgPool,
}

impl PgCompetitorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompetitorRepository for PgCompetitorRepository {
    async fn list_competitors(
        &self,
        group_id: GroupId,
        status: Option<ApprovalStatus>,
    ) -> StoreResult<Vec<Competitor>> {
        let rows = if let Some(status) = status {
            sqlx::query(
                "SELECT id, display_name, rating, group_id, approval
                 FROM competitors WHERE group_id = $1 AND approval = $2
                 ORDER BY id",
            )
            .bind(group_id)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query(
                "SELECT id, display_name, rating, group_id, approval
                 FROM competitors WHERE group_id = $1
                 ORDER BY id",
            )
            .bind(group_id)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(db_err("list_competitors", format!("group {group_id}")))?;

        rows.iter().map(decode_competitor).collect()
    }

    async fn get_competitor(&self, id: CompetitorId) -> StoreResult<Option<Competitor>> {
        let row = sqlx::query(
            "SELECT id, display_name, rating, group_id, approval
             FROM competitors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("get_competitor", format!("competitor {id}")))?;

        row.as_ref().map(decode_competitor).transpose()
    }
}

/// Default PostgreSQL implementation of `MatchRepository`
pub struct PgMatchRepository {
    pool: PgPool,
}

impl PgMatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const MATCH_COLUMNS: &str = "id, group_id, round, side_a, side_b, status, is_scheduled, \
                             is_reviewed, scheduled_for, prediction, winner, created_at";

#[async_trait]
impl MatchRepository for PgMatchRepository {
    async fn list_matches(&self, group_id: GroupId) -> StoreResult<Vec<Match>> {
        let rows = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE group_id = $1 ORDER BY id"
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("list_matches", format!("group {group_id}")))?;

        rows.iter().map(decode_match).collect()
    }

    async fn create_match(&self, seed: &MatchSeed) -> StoreResult<Match> {
        let snapshot = serde_json::to_value(PredictionSnapshot {
            predicted_winner: seed.predicted_winner,
            win_probability: seed.win_probability,
        })?;

        let row = sqlx::query(&format!(
            "INSERT INTO matches
                 (group_id, round, side_a, side_b, status, is_scheduled,
                  is_reviewed, scheduled_for, prediction)
             VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7, $8)
             RETURNING {MATCH_COLUMNS}"
        ))
        .bind(seed.group_id)
        .bind(seed.round as i32)
        .bind(seed.side_a)
        .bind(seed.side_b)
        .bind(seed.status.as_str())
        .bind(seed.is_scheduled)
        .bind(seed.scheduled_for.map(|dt| dt.naive_utc()))
        .bind(snapshot)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // 23505 = unique_violation on (group_id, round, side_a, side_b)
            if let sqlx::Error::Database(db) = &e {
                if db.code().as_deref() == Some("23505") {
                    return StoreError::DuplicateMatch {
                        group_id: seed.group_id,
                        round: seed.round,
                        side_a: seed.side_a,
                        side_b: seed.side_b,
                    };
                }
            }
            db_err(
                "create_match",
                format!("{} vs {}", seed.side_a, seed.side_b),
            )(e)
        })?;

        decode_match(&row)
    }

    async fn update_match(&self, id: MatchId, update: &MatchUpdate) -> StoreResult<Match> {
        let row = sqlx::query(&format!(
            "UPDATE matches SET
                 status = COALESCE($2, status),
                 is_scheduled = COALESCE($3, is_scheduled),
                 is_reviewed = COALESCE($4, is_reviewed),
                 scheduled_for = COALESCE($5, scheduled_for),
                 winner = COALESCE($6, winner)
             WHERE id = $1
             RETURNING {MATCH_COLUMNS}"
        ))
        .bind(id)
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.is_scheduled)
        .bind(update.is_reviewed)
        .bind(update.scheduled_for.map(|dt| dt.naive_utc()))
        .bind(update.winner)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("update_match", format!("match {id}")))?
        .ok_or(StoreError::MatchNotFound(id))?;

        decode_match(&row)
    }
}

/// In-memory implementations for testing
#[cfg(test)]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    /// In-memory store implementing both repository traits. Enforces the
    /// same `(group_id, round, side_a, side_b)` uniqueness rule as the
    /// Postgres schema and supports fault injection for batch-failure
    /// tests.
    #[derive(Clone, Default)]
    pub struct MockStore {
        competitors: Arc<Mutex<HashMap<CompetitorId, Competitor>>>,
        matches: Arc<Mutex<Vec<Match>>>,
        next_match_id: Arc<Mutex<MatchId>>,
        /// Pairings whose `create_match` should fail with a database error
        failing_pairings: Arc<Mutex<HashSet<(CompetitorId, CompetitorId)>>>,
        /// Number of upcoming `list_matches` calls that should observe an
        /// empty store even if rows exist (simulates the stale read in
        /// the first-view race)
        stale_reads: Arc<Mutex<u32>>,
    }

    impl MockStore {
        pub fn new() -> Self {
            Self {
                next_match_id: Arc::new(Mutex::new(1)),
                ..Self::default()
            }
        }

        pub fn with_competitor(self, competitor: Competitor) -> Self {
            self.competitors
                .lock()
                .unwrap()
                .insert(competitor.id, competitor);
            self
        }

        pub fn fail_pairing(&self, side_a: CompetitorId, side_b: CompetitorId) {
            self.failing_pairings
                .lock()
                .unwrap()
                .insert((side_a, side_b));
        }

        pub fn stale_reads(&self, count: u32) {
            *self.stale_reads.lock().unwrap() = count;
        }

        pub fn stored_matches(&self) -> Vec<Match> {
            self.matches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompetitorRepository for MockStore {
        async fn list_competitors(
            &self,
            group_id: GroupId,
            status: Option<ApprovalStatus>,
        ) -> StoreResult<Vec<Competitor>> {
            let competitors = self.competitors.lock().unwrap();
            let mut result: Vec<Competitor> = competitors
                .values()
                .filter(|c| c.group_id == group_id)
                .filter(|c| status.is_none_or(|s| c.approval == s))
                .cloned()
                .collect();
            result.sort_by_key(|c| c.id);
            Ok(result)
        }

        async fn get_competitor(&self, id: CompetitorId) -> StoreResult<Option<Competitor>> {
            Ok(self.competitors.lock().unwrap().get(&id).cloned())
        }
    }

    #[async_trait]
    impl MatchRepository for MockStore {
        async fn list_matches(&self, group_id: GroupId) -> StoreResult<Vec<Match>> {
            {
                let mut stale = self.stale_reads.lock().unwrap();
                if *stale > 0 {
                    *stale -= 1;
                    return Ok(Vec::new());
                }
            }
            Ok(self
                .matches
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.group_id == group_id)
                .cloned()
                .collect())
        }

        async fn create_match(&self, seed: &MatchSeed) -> StoreResult<Match> {
            if self
                .failing_pairings
                .lock()
                .unwrap()
                .contains(&(seed.side_a, seed.side_b))
            {
                return Err(StoreError::Database {
                    operation: "create_match",
                    record: format!("{} vs {}", seed.side_a, seed.side_b),
                    source: sqlx::Error::PoolTimedOut,
                });
            }

            let mut matches = self.matches.lock().unwrap();
            let duplicate = matches.iter().any(|m| {
                m.group_id == seed.group_id
                    && m.round == seed.round
                    && m.side_a == seed.side_a
                    && m.side_b == seed.side_b
            });
            if duplicate {
                return Err(StoreError::DuplicateMatch {
                    group_id: seed.group_id,
                    round: seed.round,
                    side_a: seed.side_a,
                    side_b: seed.side_b,
                });
            }

            let id = {
                let mut next_id = self.next_match_id.lock().unwrap();
                let id = *next_id;
                *next_id += 1;
                id
            };
            let record = seed.clone().into_match(id, Utc::now());
            matches.push(record.clone());
            Ok(record)
        }

        async fn update_match(&self, id: MatchId, update: &MatchUpdate) -> StoreResult<Match> {
            let mut matches = self.matches.lock().unwrap();
            let record = matches
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or(StoreError::MatchNotFound(id))?;

            if let Some(status) = update.status {
                record.status = status;
            }
            if let Some(is_scheduled) = update.is_scheduled {
                record.is_scheduled = is_scheduled;
            }
            if let Some(is_reviewed) = update.is_reviewed {
                record.is_reviewed = is_reviewed;
            }
            if let Some(scheduled_for) = update.scheduled_for {
                record.scheduled_for = Some(scheduled_for);
            }
            if let Some(winner) = update.winner {
                record.winner = Some(winner);
            }
            Ok(record.clone())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::seeding::FIRST_ROUND;

        fn seed(group_id: GroupId, side_a: CompetitorId, side_b: CompetitorId) -> MatchSeed {
            MatchSeed {
                group_id,
                round: FIRST_ROUND,
                side_a,
                side_b,
                status: MatchStatus::PendingSchedule,
                is_scheduled: false,
                scheduled_for: None,
                predicted_winner: side_a,
                win_probability: 64,
            }
        }

        #[tokio::test]
        async fn test_mock_create_assigns_sequential_ids() {
            let store = MockStore::new();

            let first = store.create_match(&seed(7, 1, 8)).await.unwrap();
            let second = store.create_match(&seed(7, 2, 7)).await.unwrap();
            assert_eq!(first.id, 1);
            assert_eq!(second.id, 2);
        }

        #[tokio::test]
        async fn test_mock_enforces_pairing_uniqueness() {
            let store = MockStore::new();

            store.create_match(&seed(7, 1, 8)).await.unwrap();
            let err = store.create_match(&seed(7, 1, 8)).await.unwrap_err();
            assert!(matches!(err, StoreError::DuplicateMatch { .. }));

            // Same sides in another group are fine
            store.create_match(&seed(8, 1, 8)).await.unwrap();
        }

        #[tokio::test]
        async fn test_mock_list_filters_by_group() {
            let store = MockStore::new();

            store.create_match(&seed(7, 1, 8)).await.unwrap();
            store.create_match(&seed(8, 2, 7)).await.unwrap();

            let group_seven = store.list_matches(7).await.unwrap();
            assert_eq!(group_seven.len(), 1);
            assert_eq!(group_seven[0].side_a, 1);
        }

        #[tokio::test]
        async fn test_mock_update_applies_partial_fields() {
            let store = MockStore::new();
            let created = store.create_match(&seed(7, 1, 8)).await.unwrap();

            let updated = store
                .update_match(
                    created.id,
                    &MatchUpdate {
                        status: Some(MatchStatus::Scheduled),
                        is_scheduled: Some(true),
                        scheduled_for: Some(Utc::now()),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();

            assert_eq!(updated.status, MatchStatus::Scheduled);
            assert!(updated.is_scheduled);
            // Untouched fields keep their values
            assert!(!updated.is_reviewed);
            assert_eq!(updated.win_probability, 64);
        }

        #[tokio::test]
        async fn test_mock_update_missing_match() {
            let store = MockStore::new();
            let err = store
                .update_match(999, &MatchUpdate::default())
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::MatchNotFound(999)));
        }

        #[tokio::test]
        async fn test_mock_competitor_filtering() {
            let store = MockStore::new()
                .with_competitor(Competitor {
                    id: 1,
                    display_name: "Ada".to_string(),
                    rating: 1700,
                    group_id: 7,
                    approval: ApprovalStatus::Approved,
                })
                .with_competitor(Competitor {
                    id: 2,
                    display_name: "Bo".to_string(),
                    rating: 1600,
                    group_id: 7,
                    approval: ApprovalStatus::Pending,
                })
                .with_competitor(Competitor {
                    id: 3,
                    display_name: "Cy".to_string(),
                    rating: 1500,
                    group_id: 8,
                    approval: ApprovalStatus::Approved,
                });

            let approved = store
                .list_competitors(7, Some(ApprovalStatus::Approved))
                .await
                .unwrap();
            assert_eq!(approved.len(), 1);
            assert_eq!(approved[0].id, 1);

            let everyone = store.list_competitors(7, None).await.unwrap();
            assert_eq!(everyone.len(), 2);

            assert!(store.get_competitor(3).await.unwrap().is_some());
            assert!(store.get_competitor(99).await.unwrap().is_none());
        }
    }
}
