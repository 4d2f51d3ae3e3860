//! Core tournament entities: competitors and dynasty groups.

use serde::{Deserialize, Serialize};

/// Competitor ID type
pub type CompetitorId = i64;

/// Group (dynasty) ID type
pub type GroupId = i64;

/// Match ID type
pub type MatchId = i64;

/// Skill rating type
pub type Rating = i64;

/// Registration approval status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalStatus {
    /// Registered, awaiting admin review
    Pending,
    /// Cleared for seeding
    Approved,
    /// Turned away by an admin
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ApprovalStatus::Pending),
            "approved" => Some(ApprovalStatus::Approved),
            "rejected" => Some(ApprovalStatus::Rejected),
            _ => None,
        }
    }
}

/// A registered player entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    /// Competitor ID (store-assigned)
    pub id: CompetitorId,
    /// Display name
    pub display_name: String,
    /// Skill rating; mutable over time, but fixed for the duration of a
    /// single seeding pass
    pub rating: Rating,
    /// Dynasty the competitor represents
    pub group_id: GroupId,
    /// Approval status; only approved competitors are eligible for seeding
    pub approval: ApprovalStatus,
}

impl Competitor {
    /// Whether this competitor can be seeded into a bracket
    pub fn is_eligible(&self) -> bool {
        self.approval == ApprovalStatus::Approved
    }
}

/// A dynasty: a named collection of competitors forming one independent
/// bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group ID
    pub id: GroupId,
    /// Display name
    pub name: String,
    /// Flag emoji or asset key shown next to the name
    pub flag: String,
}
