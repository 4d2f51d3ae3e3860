//! Logistic win-probability predictor.
//!
//! Given two ratings, estimates the favored side's chance of winning on a
//! 0-100 scale. Predictions are computed once when a pairing is created
//! and stored as a snapshot; rating drift never triggers recomputation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scale constant of the logistic model: a rating gap of this size makes
/// the stronger side roughly a 10:1 favorite.
pub const RATING_SCALE: f64 = 400.0;

/// Equal ratings favor side A. The favorite must be deterministic because
/// display code always renders one side as "the favorite".
pub const TIE_FAVORS: Side = Side::A;

/// Prediction errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RatingError {
    #[error("rating is not a finite number")]
    NonFinite,
}

pub type RatingResult<T> = Result<T, RatingError>;

/// Which side of a pairing is favored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

/// Win-probability snapshot attached to a pairing at creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    /// Probability the favored side wins, in percent. Always in [50, 100].
    pub win_probability: u8,
    /// The favored side
    pub favored: Side,
}

/// Estimate the favored side's win probability from a rating differential.
///
/// Uses `p = 1 / (1 + 10^(-(rating_a - rating_b) / RATING_SCALE))` for
/// side A and reports whichever side has `p >= 0.5`, so the returned
/// probability is never below 50. Ties resolve per [`TIE_FAVORS`].
pub fn predict(rating_a: f64, rating_b: f64) -> RatingResult<Prediction> {
    if !rating_a.is_finite() || !rating_b.is_finite() {
        return Err(RatingError::NonFinite);
    }

    let p_a = 1.0 / (1.0 + 10f64.powf(-(rating_a - rating_b) / RATING_SCALE));

    let (favored, p) = if p_a >= 0.5 {
        (TIE_FAVORS, p_a)
    } else {
        (Side::B, 1.0 - p_a)
    };

    Ok(Prediction {
        win_probability: (p * 100.0).round() as u8,
        favored,
    })
}
