//! Bracket manager: lazy round generation and match administration.

use chrono::{DateTime, Utc};
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use super::models::{BracketView, GroupSummary, MatchCard, PairingFailure};
use crate::db::repository::{CompetitorRepository, MatchRepository, MatchUpdate, StoreError};
use crate::entities::{ApprovalStatus, Competitor, CompetitorId, Group, GroupId};
use crate::lifecycle::{LifecycleError, Match};
use crate::seeding::{self, InitialAssignment, SeedingError};

/// Bracket errors
#[derive(Debug, Error)]
pub enum BracketError {
    #[error(transparent)]
    Seeding(#[from] SeedingError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type BracketResult<T> = Result<T, BracketError>;

/// Bracket manager
///
/// Coordinates the seeding engine with the persistence collaborators. A
/// group's first round is materialized lazily, the first time its bracket
/// is viewed; once match records exist they are never regenerated, which
/// keeps every competitor in at most one round-1 match.
#[derive(Clone)]
pub struct BracketManager {
    competitors: Arc<dyn CompetitorRepository>,
    matches: Arc<dyn MatchRepository>,
}

impl BracketManager {
    /// Create a new bracket manager over the given repositories
    pub fn new(
        competitors: Arc<dyn CompetitorRepository>,
        matches: Arc<dyn MatchRepository>,
    ) -> Self {
        Self {
            competitors,
            matches,
        }
    }

    /// Load a group's bracket, generating the first round if none exists.
    ///
    /// Persistence failures during generation are isolated per pairing:
    /// a failed insert is logged and reported on the view while the
    /// remaining pairings proceed. A `DuplicateMatch` conflict means a
    /// concurrent viewer generated the round between our existence check
    /// and insert; the stored bracket is reloaded and returned instead.
    pub async fn get_or_create_bracket(
        &self,
        group_id: GroupId,
        assignment: InitialAssignment,
    ) -> BracketResult<BracketView> {
        let existing = self.matches.list_matches(group_id).await?;
        if !existing.is_empty() {
            return self.enrich(group_id, existing, None, Vec::new(), false).await;
        }

        let pool = self
            .competitors
            .list_competitors(group_id, Some(ApprovalStatus::Approved))
            .await?;
        let round = seeding::generate_first_round(group_id, &pool, assignment)?;

        let mut stored = Vec::with_capacity(round.pairings.len());
        let mut failed = Vec::new();
        for seed in &round.pairings {
            match self.matches.create_match(seed).await {
                Ok(record) => stored.push(record),
                Err(StoreError::DuplicateMatch { .. }) => {
                    info!(
                        "group {group_id}: bracket generated concurrently, loading stored matches"
                    );
                    let existing = self.matches.list_matches(group_id).await?;
                    return self.enrich(group_id, existing, None, Vec::new(), false).await;
                }
                Err(e) => {
                    warn!(
                        "group {group_id}: failed to persist pairing {} vs {}: {e}",
                        seed.side_a, seed.side_b
                    );
                    failed.push(PairingFailure {
                        side_a: seed.side_a,
                        side_b: seed.side_b,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "group {group_id}: generated round {} with {} matches ({} failed)",
            round.round,
            stored.len(),
            failed.len()
        );
        self.enrich(group_id, stored, round.bye, failed, true).await
    }

    /// Display-only summary of a dynasty: how many of its competitors are
    /// cleared for seeding.
    pub async fn group_summary(&self, group: Group) -> BracketResult<GroupSummary> {
        let eligible = self
            .competitors
            .list_competitors(group.id, Some(ApprovalStatus::Approved))
            .await?;
        Ok(GroupSummary {
            group,
            eligible_count: eligible.len(),
        })
    }

    /// Assign a date to a pending match and persist the transition
    pub async fn schedule_match(
        &self,
        record: &Match,
        when: DateTime<Utc>,
    ) -> BracketResult<Match> {
        let mut updated = record.clone();
        updated.schedule(when)?;
        self.persist(&updated).await
    }

    /// Move a scheduled match to a new date
    pub async fn reschedule_match(
        &self,
        record: &Match,
        when: DateTime<Utc>,
    ) -> BracketResult<Match> {
        let mut updated = record.clone();
        updated.reschedule(when)?;
        self.persist(&updated).await
    }

    /// Throw out a pending match
    pub async fn reject_match(&self, record: &Match) -> BracketResult<Match> {
        let mut updated = record.clone();
        updated.reject()?;
        self.persist(&updated).await
    }

    /// Latch the review flag on a scheduled match
    pub async fn review_match(&self, record: &Match) -> BracketResult<Match> {
        let mut updated = record.clone();
        updated.mark_reviewed()?;
        self.persist(&updated).await
    }

    /// Record that play has begun (externally triggered)
    pub async fn begin_play(&self, record: &Match) -> BracketResult<Match> {
        let mut updated = record.clone();
        updated.advance()?;
        self.persist(&updated).await
    }

    /// Record the result of a played match
    pub async fn record_result(
        &self,
        record: &Match,
        winner: CompetitorId,
    ) -> BracketResult<Match> {
        let mut updated = record.clone();
        updated.finish(winner)?;
        self.persist(&updated).await
    }

    async fn persist(&self, updated: &Match) -> BracketResult<Match> {
        Ok(self
            .matches
            .update_match(updated.id, &MatchUpdate::from_record(updated))
            .await?)
    }

    async fn enrich(
        &self,
        group_id: GroupId,
        records: Vec<Match>,
        bye: Option<Competitor>,
        failed_pairings: Vec<PairingFailure>,
        freshly_generated: bool,
    ) -> BracketResult<BracketView> {
        let mut cache: HashMap<CompetitorId, Option<Competitor>> = HashMap::new();
        let mut cards = Vec::with_capacity(records.len());
        let mut missing_competitors = Vec::new();

        for record in records {
            let side_a = self.resolve(&mut cache, record.side_a).await?;
            let side_b = self.resolve(&mut cache, record.side_b).await?;
            let card = MatchCard {
                record,
                side_a,
                side_b,
            };
            for id in card.missing_sides() {
                if !missing_competitors.contains(&id) {
                    missing_competitors.push(id);
                }
            }
            cards.push(card);
        }

        if !missing_competitors.is_empty() {
            warn!(
                "group {group_id}: {} unresolvable competitor reference(s): {missing_competitors:?}",
                missing_competitors.len()
            );
        }

        Ok(BracketView {
            group_id,
            matches: cards,
            bye,
            missing_competitors,
            failed_pairings,
            freshly_generated,
        })
    }

    async fn resolve(
        &self,
        cache: &mut HashMap<CompetitorId, Option<Competitor>>,
        id: CompetitorId,
    ) -> BracketResult<Option<Competitor>> {
        if let Some(cached) = cache.get(&id) {
            return Ok(cached.clone());
        }
        let competitor = self.competitors.get_competitor(id).await?;
        cache.insert(id, competitor.clone());
        Ok(competitor)
    }
}
