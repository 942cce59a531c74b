//! The evaluation boundary between the minimizer and level scoring.

use tracing::debug;

use sf_types::{EvaluationError, Level, ScoreBreakdown};

use crate::layout::LayoutDecoder;
use crate::scoring::Scorer;

/// Decode-then-score objective in the minimization convention.
#[derive(Debug, Clone)]
pub struct LevelObjective {
    decoder: LayoutDecoder,
    scorer: Scorer,
    penalty: f64,
}

impl LevelObjective {
    pub fn new(decoder: LayoutDecoder, scorer: Scorer, penalty: f64) -> Self {
        Self {
            decoder,
            scorer,
            penalty,
        }
    }

    pub fn decoder(&self) -> &LayoutDecoder {
        &self.decoder
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Decode and score `params`, failing on shape errors and non-finite scores.
    pub fn evaluate(&self, params: &[f64]) -> Result<(Level, ScoreBreakdown), EvaluationError> {
        let level = self.decoder.decode(params)?;
        let breakdown = self.scorer.breakdown(&level);
        if !breakdown.total.is_finite() {
            return Err(EvaluationError::NonFiniteScore {
                value: breakdown.total,
            });
        }
        Ok((level, breakdown))
    }

    /// Negated score, or the fixed penalty when `params` cannot be scored.
    pub fn value(&self, params: &[f64]) -> f64 {
        match self.evaluate(params) {
            Ok((_, breakdown)) => -breakdown.total,
            Err(e) => {
                debug!("Substituting penalty {} for unscorable candidate: {}", self.penalty, e);
                self.penalty
            }
        }
    }
}
