//! Level quality scoring: clearability, educational value and variety.

use sf_types::{JumpDifficulty, JumpModel, Level, Ledge, MovingPlatform, ScoreBreakdown};

use crate::config::ScoringConfig;

/// Scores decoded levels. Higher is better.
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    model: JumpModel,
    config: ScoringConfig,
}

impl Scorer {
    pub fn new(model: JumpModel, config: ScoringConfig) -> Self {
        Self { model, config }
    }

    pub fn model(&self) -> &JumpModel {
        &self.model
    }

    /// Weighted combination of the three sub-scores.
    pub fn score(&self, level: &Level) -> f64 {
        self.breakdown(level).total
    }

    pub fn breakdown(&self, level: &Level) -> ScoreBreakdown {
        let clearability = self.clearability(level);
        let educational = self.educational(&level.moving_platforms);
        let variety = self.variety(level);
        let total = self.config.clearability_weight * clearability
            + self.config.educational_weight * educational
            + self.config.variety_weight * variety;

        ScoreBreakdown {
            clearability,
            educational,
            variety,
            total,
        }
    }

    /// Reward each adjacent pair in traversal order by how reachable the
    /// jump from the first platform's right edge to the second's left edge is.
    ///
    /// Moving platforms are walked in declaration order after the statics,
    /// so the last static is paired with the first moving platform whatever
    /// their x-positions are.
    pub fn clearability(&self, level: &Level) -> f64 {
        let ledges: Vec<Ledge> = level.ledges().collect();
        ledges
            .windows(2)
            .map(|pair| self.jump_reward(&pair[0], &pair[1]))
            .sum()
    }

    fn jump_reward(&self, from: &Ledge, to: &Ledge) -> f64 {
        let distance = self
            .model
            .required_jump_distance(from.x2, from.y, to.x1, to.y);
        match self.model.classify(distance) {
            JumpDifficulty::Safe => self.config.safe_jump_reward,
            JumpDifficulty::Risky => self.config.risky_jump_reward,
            JumpDifficulty::Impossible => self.config.impossible_jump_penalty,
        }
    }

    /// Bonus for long transport rides and for moderate speeds. One platform
    /// can earn both.
    pub fn educational(&self, moving: &[MovingPlatform]) -> f64 {
        let cfg = &self.config;
        moving
            .iter()
            .map(|p| {
                let mut score = 0.0;
                if p.travel() >= cfg.long_transport_min {
                    score += cfg.long_transport_bonus;
                }
                if (cfg.moderate_speed_min..=cfg.moderate_speed_max).contains(&p.speed) {
                    score += cfg.moderate_speed_bonus;
                }
                score
            })
            .sum()
    }

    /// Capped height variance over every platform plus capped speed variance
    /// over the moving platforms.
    pub fn variety(&self, level: &Level) -> f64 {
        let cfg = &self.config;

        let heights: Vec<f64> = level.ledges().map(|l| l.y).collect();
        let height_term = cap(
            population_variance(&heights) / cfg.height_variance_divisor,
            cfg.height_variance_cap,
        );

        let speeds: Vec<f64> = level.moving_platforms.iter().map(|p| p.speed).collect();
        let speed_term = if speeds.is_empty() {
            0.0
        } else {
            cap(
                population_variance(&speeds) * cfg.speed_variance_scale,
                cfg.speed_variance_cap,
            )
        };

        height_term + speed_term
    }
}

/// `min(value, limit)` that lets NaN through so it can be caught downstream.
fn cap(value: f64, limit: f64) -> f64 {
    if value > limit {
        limit
    } else {
        value
    }
}

/// Population variance (divides by `n`). Empty input has zero variance.
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
}
