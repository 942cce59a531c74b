//! Jump physics constants and the reachability heuristic derived from them.

use serde::{Deserialize, Serialize};

use crate::errors::{StageError, StageResult};

/// Raw per-frame physics of the player character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConstants {
    /// Downward acceleration in px/frame².
    pub gravity: f64,
    /// Initial vertical velocity of a jump in px/frame (negative = upward).
    pub jump_impulse: f64,
    /// Horizontal run speed in px/frame.
    pub move_speed: f64,
    /// Global game-speed multiplier applied to horizontal motion.
    pub game_speed: f64,
}

impl PhysicsConstants {
    pub const fn new(gravity: f64, jump_impulse: f64, move_speed: f64, game_speed: f64) -> Self {
        Self {
            gravity,
            jump_impulse,
            move_speed,
            game_speed,
        }
    }

    /// Apex height of a standing jump.
    pub fn max_jump_height(&self) -> f64 {
        self.jump_impulse.powi(2) / (2.0 * self.gravity)
    }

    /// Horizontal distance covered over a full flat jump arc.
    pub fn max_jump_distance(&self) -> f64 {
        2.0 * self.jump_impulse.abs() * self.move_speed * self.game_speed / self.gravity
    }

    /// Distance a casual player clears reliably (70% of the maximum).
    pub fn safe_jump_distance(&self) -> f64 {
        self.max_jump_distance() * 0.7
    }

    pub fn validate(&self) -> StageResult<()> {
        if self.gravity.is_nan() || self.gravity <= 0.0 {
            return Err(StageError::Config(format!(
                "gravity must be positive, got {}",
                self.gravity
            )));
        }
        let finite = [self.jump_impulse, self.move_speed, self.game_speed]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(StageError::Config(
                "jump impulse, move speed and game speed must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PhysicsConstants {
    fn default() -> Self {
        Self::new(0.6, -12.0, 4.0, 2.0)
    }
}

/// Reachability thresholds derived once from a set of [`PhysicsConstants`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpModel {
    pub constants: PhysicsConstants,
    pub max_jump_height: f64,
    pub max_jump_distance: f64,
    pub safe_jump_distance: f64,
}

impl JumpModel {
    pub fn new(constants: PhysicsConstants) -> Self {
        Self {
            constants,
            max_jump_height: constants.max_jump_height(),
            max_jump_distance: constants.max_jump_distance(),
            safe_jump_distance: constants.safe_jump_distance(),
        }
    }

    /// Effective horizontal distance needed to go from `(x1, y1)` to `(x2, y2)`.
    ///
    /// Only upward climbs count. A climb of `dy` divides the horizontal gap by
    /// `sqrt(2·dy/g)`. This is a difficulty proxy rather than projectile
    /// kinematics and must stay exactly this formula.
    pub fn required_jump_distance(&self, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
        let horizontal = (x2 - x1).abs();
        let vertical = (y2 - y1).max(0.0);

        if vertical > 0.0 {
            let time_factor = (2.0 * vertical / self.constants.gravity).sqrt();
            return horizontal / time_factor;
        }
        horizontal
    }

    /// Classify a required distance against the safe and maximum thresholds.
    pub fn classify(&self, distance: f64) -> JumpDifficulty {
        if distance <= self.safe_jump_distance {
            JumpDifficulty::Safe
        } else if distance <= self.max_jump_distance {
            JumpDifficulty::Risky
        } else {
            JumpDifficulty::Impossible
        }
    }
}

impl Default for JumpModel {
    fn default() -> Self {
        Self::new(PhysicsConstants::default())
    }
}

/// How hard a single jump is under the reachability heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpDifficulty {
    Safe,
    Risky,
    Impossible,
}
