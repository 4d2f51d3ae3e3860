//! Match records and their administrative state machine.
//!
//! A match moves `PendingSchedule -> Scheduled -> InProgress -> Completed`,
//! with `Rejected` as a parallel terminal reachable only from
//! `PendingSchedule`. Every transition is guard-checked; an action that is
//! not valid from the current status fails loudly rather than no-opping,
//! since an out-of-state action indicates a UI or data-consistency bug.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::entities::{CompetitorId, GroupId, MatchId};
use crate::rating::{Prediction, Side};

/// Match status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Freshly generated, no date assigned yet
    PendingSchedule,
    /// Date assigned
    Scheduled,
    /// Play has begun
    InProgress,
    /// Played to a result (terminal)
    Completed,
    /// Thrown out by an admin before scheduling (terminal)
    Rejected,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::PendingSchedule => "pending_schedule",
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::InProgress => "in_progress",
            MatchStatus::Completed => "completed",
            MatchStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending_schedule" => Some(MatchStatus::PendingSchedule),
            "scheduled" => Some(MatchStatus::Scheduled),
            "in_progress" => Some(MatchStatus::InProgress),
            "completed" => Some(MatchStatus::Completed),
            "rejected" => Some(MatchStatus::Rejected),
            _ => None,
        }
    }

    /// Whether this status admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Rejected)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Administrative actions that drive the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchAction {
    Schedule,
    Reschedule,
    Reject,
    MarkReviewed,
    Advance,
    Finish,
}

impl fmt::Display for MatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            MatchAction::Schedule => "schedule",
            MatchAction::Reschedule => "reschedule",
            MatchAction::Reject => "reject",
            MatchAction::MarkReviewed => "mark reviewed",
            MatchAction::Advance => "advance",
            MatchAction::Finish => "finish",
        };
        f.write_str(repr)
    }
}

/// Lifecycle errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("cannot {action} a match that is {status}")]
    IllegalTransition {
        action: MatchAction,
        status: MatchStatus,
    },

    #[error("competitor {0} is not a side of this match")]
    WinnerNotInMatch(CompetitorId),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// A match record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Match ID (store-assigned)
    pub id: MatchId,
    /// Group the match belongs to
    pub group_id: GroupId,
    /// Round number; first-round generation always produces round 1
    pub round: u32,
    /// First side, in seeding order (not a ranking)
    pub side_a: CompetitorId,
    /// Second side
    pub side_b: CompetitorId,
    /// Current lifecycle status
    pub status: MatchStatus,
    /// Whether a date has ever been assigned
    pub is_scheduled: bool,
    /// One-way review latch, settable only while scheduled
    pub is_reviewed: bool,
    /// Scheduled date, if any
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Win-probability snapshot taken when the pairing was created.
    /// Never recomputed, even if ratings drift before play.
    pub predicted_winner: CompetitorId,
    /// Favored side's win probability at pairing time, in [50, 100]
    pub win_probability: u8,
    /// Winning competitor, set on completion
    pub winner: Option<CompetitorId>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Match {
    fn illegal(&self, action: MatchAction) -> LifecycleError {
        LifecycleError::IllegalTransition {
            action,
            status: self.status,
        }
    }

    /// Resolve the prediction snapshot to a competitor reference
    pub fn predicted_winner_of(
        side_a: CompetitorId,
        side_b: CompetitorId,
        prediction: &Prediction,
    ) -> CompetitorId {
        match prediction.favored {
            Side::A => side_a,
            Side::B => side_b,
        }
    }

    /// Assign a date to a freshly generated match
    pub fn schedule(&mut self, when: DateTime<Utc>) -> LifecycleResult<()> {
        if self.status != MatchStatus::PendingSchedule {
            return Err(self.illegal(MatchAction::Schedule));
        }
        self.status = MatchStatus::Scheduled;
        self.is_scheduled = true;
        self.scheduled_for = Some(when);
        Ok(())
    }

    /// Move a scheduled match to a new date. Always permitted while
    /// scheduled; rescheduling is never blocked by a deadline.
    pub fn reschedule(&mut self, when: DateTime<Utc>) -> LifecycleResult<()> {
        if self.status != MatchStatus::Scheduled {
            return Err(self.illegal(MatchAction::Reschedule));
        }
        self.scheduled_for = Some(when);
        Ok(())
    }

    /// Throw out a match before it has been scheduled. Terminal.
    pub fn reject(&mut self) -> LifecycleResult<()> {
        if self.status != MatchStatus::PendingSchedule {
            return Err(self.illegal(MatchAction::Reject));
        }
        self.status = MatchStatus::Rejected;
        Ok(())
    }

    /// Latch the review flag on a scheduled match. The flag cannot be
    /// cleared again, so call sites must confirm with the admin first.
    /// Reviewing an already-reviewed match is an idempotent success.
    pub fn mark_reviewed(&mut self) -> LifecycleResult<()> {
        if self.status != MatchStatus::Scheduled {
            return Err(self.illegal(MatchAction::MarkReviewed));
        }
        self.is_reviewed = true;
        Ok(())
    }

    /// Record that play has begun. Triggered externally, not by the
    /// bracket manager.
    pub fn advance(&mut self) -> LifecycleResult<()> {
        if self.status != MatchStatus::Scheduled {
            return Err(self.illegal(MatchAction::Advance));
        }
        self.status = MatchStatus::InProgress;
        Ok(())
    }

    /// Record the result of a played match. Terminal.
    pub fn finish(&mut self, winner: CompetitorId) -> LifecycleResult<()> {
        if self.status != MatchStatus::InProgress {
            return Err(self.illegal(MatchAction::Finish));
        }
        if winner != self.side_a && winner != self.side_b {
            return Err(LifecycleError::WinnerNotInMatch(winner));
        }
        self.status = MatchStatus::Completed;
        self.winner = Some(winner);
        Ok(())
    }
}
