//! Score classification — maps a 0–100 score onto a qualitative band.
//!
//! Every gauge, progress bar and badge reads its colour from the `ScoreView`
//! built here, so a score is classified exactly once.

use serde::{Deserialize, Serialize};

pub const HIGH_THRESHOLD: f64 = 80.0;
pub const MEDIUM_THRESHOLD: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    High,
    Medium,
    Low,
}

impl Band {
    /// Display colour token shared by every score visualization.
    pub fn color(self) -> &'static str {
        match self {
            Band::High => "success",
            Band::Medium => "warning",
            Band::Low => "danger",
        }
    }
}

/// Missing or non-finite scores count as 0; everything else is bounded to [0, 100].
pub fn normalize(score: Option<f64>) -> f64 {
    match score {
        Some(s) if s.is_finite() => s.clamp(0.0, 100.0),
        _ => 0.0,
    }
}

pub fn classify(score: Option<f64>) -> Band {
    let score = normalize(score);
    if score >= HIGH_THRESHOLD {
        Band::High
    } else if score >= MEDIUM_THRESHOLD {
        Band::Medium
    } else {
        Band::Low
    }
}

/// A normalized score together with its band and colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreView {
    pub value: f64,
    pub band: Band,
    pub color: &'static str,
}

impl ScoreView {
    pub fn new(score: Option<f64>) -> Self {
        let value = normalize(score);
        let band = classify(Some(value));
        Self {
            value,
            band,
            color: band.color(),
        }
    }
}
