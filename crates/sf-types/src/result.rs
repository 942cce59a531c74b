//! Outcome of one optimization run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::level::Level;

/// Unique optimization run identifier.
pub type RunId = Uuid;

/// The three quality criteria of a level and their weighted combination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub clearability: f64,
    pub educational: f64,
    pub variety: f64,
    pub total: f64,
}

/// Result of a single optimization run. Built once, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub id: RunId,
    pub success: bool,
    /// Best level found (the final iterate, even when the run failed).
    pub level: Level,
    /// Final parameter vector the level was decoded from.
    pub parameters: Vec<f64>,
    /// Level score (maximization convention, i.e. the negated objective).
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    /// Success message or failure reason reported by the minimizer.
    pub message: String,
    pub iterations: usize,
    pub evaluations: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl OptimizationResult {
    pub fn duration_millis(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
