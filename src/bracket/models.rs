//! View models returned by the bracket manager.

use serde::{Deserialize, Serialize};

use crate::entities::{Competitor, CompetitorId, Group, GroupId};
use crate::lifecycle::Match;

/// A match enriched with competitor detail for display. A side that could
/// not be resolved is `None`; the unresolved id is also reported on
/// [`BracketView::missing_competitors`] so display code can render an
/// "unknown player" placeholder knowingly rather than silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCard {
    pub record: Match,
    pub side_a: Option<Competitor>,
    pub side_b: Option<Competitor>,
}

impl MatchCard {
    /// Competitor references this card could not resolve
    pub fn missing_sides(&self) -> Vec<CompetitorId> {
        let mut missing = Vec::new();
        if self.side_a.is_none() {
            missing.push(self.record.side_a);
        }
        if self.side_b.is_none() {
            missing.push(self.record.side_b);
        }
        missing
    }
}

/// A pairing the store refused to persist. Generation carries on past it;
/// partial bracket generation beats none at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingFailure {
    pub side_a: CompetitorId,
    pub side_b: CompetitorId,
    pub reason: String,
}

/// One group's bracket, enriched for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketView {
    pub group_id: GroupId,
    pub matches: Vec<MatchCard>,
    /// Competitor advancing without a round-1 match (odd pool). Only set
    /// when this call generated the round.
    pub bye: Option<Competitor>,
    /// Every competitor reference that could not be resolved
    pub missing_competitors: Vec<CompetitorId>,
    /// Pairings lost to per-record persistence failures during generation
    pub failed_pairings: Vec<PairingFailure>,
    /// Whether this call generated the round (false when the bracket was
    /// loaded from existing records)
    pub freshly_generated: bool,
}

/// Display-only summary of a dynasty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub group: Group,
    /// Number of approved competitors; informational, never used for
    /// seeding correctness
    pub eligible_count: usize,
}
