//! Optimizer configuration: level shape, scoring weights and search options.

use serde::{Deserialize, Serialize};
use std::path::Path;

use sf_types::{config_error, PhysicsConstants, StageResult, StaticPlatform};

/// Shape of the level the parameter vector encodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Number of optimized static platforms (P).
    pub static_count: usize,
    /// Number of moving platforms (M).
    pub moving_count: usize,
    pub static_width: f64,
    pub moving_width: f64,
    pub min_platform_width: f64,
    /// Fixed start platform, never optimized.
    pub start_platform: StaticPlatform,
    pub stage_width: f64,
    pub base_y: f64,
}

impl LayoutConfig {
    /// Length of the parameter vector, `2·P + 4·M`.
    pub fn parameter_len(&self) -> usize {
        2 * self.static_count + 4 * self.moving_count
    }

    /// Index of the first moving-platform slot.
    pub fn moving_offset(&self) -> usize {
        2 * self.static_count
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            static_count: 6,
            moving_count: 3,
            static_width: 100.0,
            moving_width: 80.0,
            min_platform_width: 60.0,
            start_platform: StaticPlatform {
                x1: -500.0,
                y1: 500.0,
                x2: 300.0,
                y2: 500.0,
            },
            stage_width: 2500.0,
            base_y: 500.0,
        }
    }
}

/// Rewards, caps and weights used by the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub clearability_weight: f64,
    pub educational_weight: f64,
    pub variety_weight: f64,

    pub safe_jump_reward: f64,
    pub risky_jump_reward: f64,
    pub impossible_jump_penalty: f64,

    /// Travel at or above this earns the long-transport bonus.
    pub long_transport_min: f64,
    pub long_transport_bonus: f64,
    /// Inclusive speed band earning the moderate-speed bonus.
    pub moderate_speed_min: f64,
    pub moderate_speed_max: f64,
    pub moderate_speed_bonus: f64,

    /// Height variance is divided by this before capping.
    pub height_variance_divisor: f64,
    pub height_variance_cap: f64,
    /// Speed variance is multiplied by this before capping.
    pub speed_variance_scale: f64,
    pub speed_variance_cap: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            clearability_weight: 0.5,
            educational_weight: 0.3,
            variety_weight: 0.2,
            safe_jump_reward: 100.0,
            risky_jump_reward: 50.0,
            impossible_jump_penalty: -200.0,
            long_transport_min: 400.0,
            long_transport_bonus: 100.0,
            moderate_speed_min: 0.5,
            moderate_speed_max: 1.5,
            moderate_speed_bonus: 50.0,
            height_variance_divisor: 100.0,
            height_variance_cap: 50.0,
            speed_variance_scale: 100.0,
            speed_variance_cap: 30.0,
        }
    }
}

/// Stopping policy and numerics of the constrained minimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Cap on inner (line-search) iterations across the whole run.
    pub max_iterations: usize,
    /// Merit change below which an inner solve is considered stationary.
    pub ftol: f64,
    /// Forward-difference step for numeric gradients.
    pub gradient_step: f64,
    /// Largest tolerated violation of any `g(x) ≥ 0` constraint.
    pub constraint_tolerance: f64,
    /// Objective value substituted when a candidate cannot be scored.
    pub evaluation_penalty: f64,
    /// Initial augmented-Lagrangian penalty parameter.
    pub initial_penalty: f64,
    /// Minimum gap between consecutive static x-slots.
    pub min_separation: f64,
    /// Minimum `end_x - start_x` of every moving platform.
    pub min_travel_span: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            ftol: 1e-6,
            gradient_step: 1.490_116_119_384_765_6e-8,
            constraint_tolerance: 1e-6,
            evaluation_penalty: 1000.0,
            initial_penalty: 10.0,
            min_separation: 100.0,
            min_travel_span: 50.0,
        }
    }
}

/// Top-level configuration for an optimization run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub physics: PhysicsConstants,
    pub layout: LayoutConfig,
    pub scoring: ScoringConfig,
    pub search: SearchOptions,
}

impl StageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a (possibly partial) configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> StageResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_physics(mut self, physics: PhysicsConstants) -> Self {
        self.physics = physics;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.search.max_iterations = n;
        self
    }

    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.search.ftol = ftol;
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn validate(&self) -> StageResult<()> {
        self.physics.validate()?;
        if self.layout.static_count == 0 {
            return Err(config_error!("static_count must be at least 1"));
        }
        if self.layout.static_width < self.layout.min_platform_width {
            return Err(config_error!(
                "static_width {} is below the minimum platform width {}",
                self.layout.static_width,
                self.layout.min_platform_width
            ));
        }
        if self.search.max_iterations == 0 {
            return Err(config_error!("max_iterations must be positive"));
        }
        if self.search.ftol.is_nan() || self.search.ftol <= 0.0 {
            return Err(config_error!("ftol must be positive, got {}", self.search.ftol));
        }
        if self.search.gradient_step.is_nan() || self.search.gradient_step <= 0.0 {
            return Err(config_error!(
                "gradient_step must be positive, got {}",
                self.search.gradient_step
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_has_expected_length() {
        let layout = LayoutConfig::default();
        assert_eq!(layout.parameter_len(), 24);
        assert_eq!(layout.moving_offset(), 12);
    }

    #[test]
    fn builder_chain() {
        let config = StageConfig::new().with_max_iterations(50).with_ftol(1e-4);
        assert_eq!(config.search.max_iterations, 50);
        assert_eq!(config.search.ftol, 1e-4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: StageConfig =
            serde_json::from_str(r#"{"search": {"max_iterations": 10}, "physics": {"gravity": 0.8}}"#)
                .unwrap();
        assert_eq!(config.search.max_iterations, 10);
        assert_eq!(config.search.ftol, 1e-6);
        assert_eq!(config.physics.gravity, 0.8);
        assert_eq!(config.physics.jump_impulse, -12.0);
        assert_eq!(config.layout.static_count, 6);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let bad_gravity = StageConfig::new().with_physics(PhysicsConstants::new(0.0, -12.0, 4.0, 2.0));
        assert!(bad_gravity.validate().is_err());

        assert!(StageConfig::new().with_max_iterations(0).validate().is_err());
        assert!(StageConfig::new().with_ftol(0.0).validate().is_err());

        let mut narrow = StageConfig::new();
        narrow.layout.static_width = 40.0;
        assert!(narrow.validate().is_err());
    }

    #[test]
    fn from_json_file_reads_and_validates() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("stageforge-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"search": {"max_iterations": 25}}"#).unwrap();
        let config = StageConfig::from_json_file(&path).unwrap();
        assert_eq!(config.search.max_iterations, 25);

        std::fs::write(&path, r#"{"physics": {"gravity": -1.0}}"#).unwrap();
        assert!(StageConfig::from_json_file(&path).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
