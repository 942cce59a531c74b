//! # sf-optimizer
//!
//! Constrained layout search for StageForge stages.
//!
//! A stage is encoded as a flat parameter vector of static-platform positions
//! and moving-platform rows. [`LayoutDecoder`] turns a vector into a level,
//! [`Scorer`] rates the level for clearability, educational value and
//! variety, and [`StageOptimizer`] drives a [`Minimizer`] over the vector
//! under box bounds and linear inequality constraints.

mod config;
mod driver;
mod layout;
mod objective;
mod scoring;
mod search;

pub use config::{LayoutConfig, ScoringConfig, SearchOptions, StageConfig};
pub use driver::{linspace, StageOptimizer};
pub use layout::{sort_permutation, LayoutDecoder, MOVING_ROW_LEN};
pub use objective::LevelObjective;
pub use scoring::{population_variance, Scorer};
pub use search::{
    AugmentedLagrangian, Bound, InequalityConstraint, MinimizeOutcome, Minimizer, ObjectiveFn,
    Problem,
};
