//! # Dynasty Brackets
//!
//! A tournament seeding and match lifecycle engine for round-based player
//! tournaments organized into country-style "dynasty" groups.
//!
//! The engine does four things:
//!
//! - **Predict**: estimate the favored side's win probability from a
//!   rating differential using a logistic model ([`rating::predict`]).
//! - **Seed**: pair a pool of rated competitors into a first round with
//!   the highest-vs-lowest rule, surfacing the bye on odd pools
//!   ([`seeding::generate_first_round`]).
//! - **Govern**: drive match records through their administrative state
//!   machine, from `pending_schedule` through `completed`, rejecting any
//!   out-of-state action ([`lifecycle::Match`]).
//! - **Orchestrate**: materialize a group's bracket lazily on first view
//!   and enrich it with competitor detail
//!   ([`bracket::BracketManager::get_or_create_bracket`]).
//!
//! Everything is deterministic and synchronous except the persistence
//! boundary, which goes through the repository traits in [`db`].
//!
//! ## Example
//!
//! ```
//! use dynasty_brackets::rating::predict;
//!
//! let prediction = predict(2800.0, 2400.0).unwrap();
//! assert_eq!(prediction.win_probability, 91);
//! ```

/// Core tournament entities.
pub mod entities;
pub use entities::{ApprovalStatus, Competitor, CompetitorId, Group, GroupId, MatchId, Rating};

/// Win-probability prediction.
pub mod rating;
pub use rating::{Prediction, RATING_SCALE, RatingError, Side, predict};

/// Seeded first-round pairing.
pub mod seeding;
pub use seeding::{
    FIRST_ROUND, InitialAssignment, MatchSeed, SeededRound, SeedingError, generate_first_round,
};

/// Match records and lifecycle transitions.
pub mod lifecycle;
pub use lifecycle::{LifecycleError, Match, MatchAction, MatchStatus};

/// Persistence collaborators.
pub mod db;

/// Bracket orchestration.
pub mod bracket;
pub use bracket::{BracketError, BracketManager, BracketView};
