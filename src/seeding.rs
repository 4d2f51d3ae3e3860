//! Seeded first-round pairing.
//!
//! Competitors are sorted by rating and paired highest-vs-lowest so the
//! top seeds cannot meet before the late rounds. Output is fully
//! deterministic for a given input: rating ties are broken by competitor
//! id, so two runs over the same pool always produce the same bracket.

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::entities::{Competitor, CompetitorId, GroupId};
use crate::lifecycle::{Match, MatchStatus};
use crate::rating::{self, RatingError};

/// The engine only ever generates round 1; advancement is out of scope.
pub const FIRST_ROUND: u32 = 1;

/// Seeding errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedingError {
    #[error("not enough approved competitors: need {needed}, have {current}")]
    InsufficientCompetitors { needed: usize, current: usize },

    #[error("competitor {0} appears more than once in the seeding pool")]
    DuplicateCompetitor(CompetitorId),

    #[error(transparent)]
    InvalidRating(#[from] RatingError),
}

pub type SeedingResult<T> = Result<T, SeedingError>;

/// Initial status variant for generated matches.
///
/// Bracket views generate matches without a date; tournament views use
/// the immediate-assignment variant and hand every pairing a date at
/// creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialAssignment {
    /// Start at `PendingSchedule` with no date
    Unscheduled,
    /// Start at `Scheduled` with the given date already assigned
    ScheduledAt(DateTime<Utc>),
}

/// A generated pairing, ready to be persisted. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSeed {
    pub group_id: GroupId,
    pub round: u32,
    pub side_a: CompetitorId,
    pub side_b: CompetitorId,
    pub status: MatchStatus,
    pub is_scheduled: bool,
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Prediction snapshot, resolved against the pairing's sides
    pub predicted_winner: CompetitorId,
    pub win_probability: u8,
}

impl MatchSeed {
    /// Materialize the seed into a match record once the store has
    /// assigned an id.
    pub fn into_match(self, id: i64, created_at: DateTime<Utc>) -> Match {
        Match {
            id,
            group_id: self.group_id,
            round: self.round,
            side_a: self.side_a,
            side_b: self.side_b,
            status: self.status,
            is_scheduled: self.is_scheduled,
            is_reviewed: false,
            scheduled_for: self.scheduled_for,
            predicted_winner: self.predicted_winner,
            win_probability: self.win_probability,
            winner: None,
            created_at,
        }
    }
}

/// A complete first round for one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRound {
    pub group_id: GroupId,
    pub round: u32,
    pub pairings: Vec<MatchSeed>,
    /// The median-ranked competitor left unpaired when the pool is odd.
    /// Surfaced so callers can report the bye; never silently dropped.
    pub bye: Option<Competitor>,
}

/// Pair a pool of competitors into a first round.
///
/// The caller is expected to have filtered the pool to approved
/// competitors of a single group; the pool is taken as-is. Requires at
/// least two competitors.
pub fn generate_first_round(
    group_id: GroupId,
    competitors: &[Competitor],
    assignment: InitialAssignment,
) -> SeedingResult<SeededRound> {
    if competitors.len() < 2 {
        return Err(SeedingError::InsufficientCompetitors {
            needed: 2,
            current: competitors.len(),
        });
    }

    let mut seen = HashSet::new();
    for competitor in competitors {
        if !seen.insert(competitor.id) {
            return Err(SeedingError::DuplicateCompetitor(competitor.id));
        }
    }

    let mut sorted: Vec<&Competitor> = competitors.iter().collect();
    sorted.sort_by(|a, b| b.rating.cmp(&a.rating).then(a.id.cmp(&b.id)));

    let n = sorted.len();
    let (status, is_scheduled, scheduled_for) = match assignment {
        InitialAssignment::Unscheduled => (MatchStatus::PendingSchedule, false, None),
        InitialAssignment::ScheduledAt(when) => (MatchStatus::Scheduled, true, Some(when)),
    };

    let mut pairings = Vec::with_capacity(n / 2);
    for i in 0..n / 2 {
        let top = sorted[i];
        let bottom = sorted[n - 1 - i];

        let prediction = rating::predict(top.rating as f64, bottom.rating as f64)?;
        debug!(
            "seeded group {group_id}: {} (#{}) vs {} (#{}), {}% for the favorite",
            top.display_name,
            i + 1,
            bottom.display_name,
            n - i,
            prediction.win_probability,
        );

        pairings.push(MatchSeed {
            group_id,
            round: FIRST_ROUND,
            side_a: top.id,
            side_b: bottom.id,
            status,
            is_scheduled,
            scheduled_for,
            predicted_winner: Match::predicted_winner_of(top.id, bottom.id, &prediction),
            win_probability: prediction.win_probability,
        });
    }

    let bye = if n % 2 == 1 {
        let median = sorted[n / 2].clone();
        info!(
            "group {group_id}: odd pool of {n}, {} advances on a bye",
            median.display_name
        );
        Some(median)
    } else {
        None
    };

    Ok(SeededRound {
        group_id,
        round: FIRST_ROUND,
        pairings,
        bye,
    })
}
