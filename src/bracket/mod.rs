//! Bracket module: lazy first-round materialization and administration.
//!
//! A group's bracket comes into existence the first time it is viewed:
//! the manager checks the store for match records, seeds a first round
//! if none exist, and returns the matches enriched with competitor
//! detail either way. Existing brackets are never regenerated.
//!
//! ## Example
//!
//! ```no_run
//! use dynasty_brackets::bracket::BracketManager;
//! use dynasty_brackets::db::{Database, DatabaseConfig, PgCompetitorRepository, PgMatchRepository};
//! use dynasty_brackets::seeding::InitialAssignment;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::from_env()).await?;
//!     let manager = BracketManager::new(
//!         Arc::new(PgCompetitorRepository::new(db.pool().clone())),
//!         Arc::new(PgMatchRepository::new(db.pool().clone())),
//!     );
//!
//!     let view = manager
//!         .get_or_create_bracket(7, InitialAssignment::Unscheduled)
//!         .await?;
//!     println!("group 7 has {} matches", view.matches.len());
//!
//!     Ok(())
//! }
//! ```

pub mod manager;
pub mod models;

pub use manager::{BracketError, BracketManager, BracketResult};
pub use models::{BracketView, GroupSummary, MatchCard, PairingFailure};
