//! Search driver: seed vector, bounds and constraints for a stage, and the
//! single entry point that runs one optimization.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use sf_types::{JumpModel, OptimizationError, OptimizationResult, StageResult};

use crate::config::StageConfig;
use crate::layout::{LayoutDecoder, MOVING_ROW_LEN};
use crate::objective::LevelObjective;
use crate::scoring::Scorer;
use crate::search::{AugmentedLagrangian, Bound, InequalityConstraint, Minimizer, Problem};

/// Static x-positions are seeded evenly across this span.
const STATIC_X_SEED: (f64, f64) = (400.0, 2200.0);

/// Seed rows `(x_start, x_end, y, speed)`: a short tutorial hop, a long
/// transport ride and a final challenge.
const MOVING_SEED: [[f64; MOVING_ROW_LEN]; 3] = [
    [350.0, 450.0, 480.0, 0.8],
    [800.0, 1400.0, 500.0, 0.6],
    [1800.0, 1950.0, 400.0, 1.0],
];

const STATIC_X_BOUND: Bound = Bound::new(300.0, 2300.0);
const STATIC_Y_BOUND: Bound = Bound::new(300.0, 550.0);
const MOVING_ROW_BOUNDS: [Bound; MOVING_ROW_LEN] = [
    Bound::new(200.0, 2000.0),
    Bound::new(400.0, 2200.0),
    Bound::new(300.0, 550.0),
    Bound::new(0.3, 1.5),
];

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Optimizes one stage layout.
pub struct StageOptimizer {
    config: StageConfig,
    objective: LevelObjective,
    minimizer: Box<dyn Minimizer>,
}

impl StageOptimizer {
    pub fn new(config: StageConfig) -> StageResult<Self> {
        Self::with_minimizer(config, Box::new(AugmentedLagrangian::new()))
    }

    /// Use a different minimization strategy.
    pub fn with_minimizer(config: StageConfig, minimizer: Box<dyn Minimizer>) -> StageResult<Self> {
        config.validate()?;
        let objective = LevelObjective::new(
            LayoutDecoder::new(config.layout.clone()),
            Scorer::new(JumpModel::new(config.physics), config.scoring.clone()),
            config.search.evaluation_penalty,
        );
        Ok(Self {
            config,
            objective,
            minimizer,
        })
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn objective(&self) -> &LevelObjective {
        &self.objective
    }

    /// Seed vector: evenly spaced statics at the base height plus the seed
    /// moving rows (cycled when more than three moving platforms are asked for).
    pub fn initial_parameters(&self) -> Vec<f64> {
        let layout = &self.config.layout;
        let mut params = linspace(STATIC_X_SEED.0, STATIC_X_SEED.1, layout.static_count);
        params.extend(std::iter::repeat(layout.base_y).take(layout.static_count));
        for row in MOVING_SEED.iter().cycle().take(layout.moving_count) {
            params.extend_from_slice(row);
        }
        params
    }

    pub fn bounds(&self) -> Vec<Bound> {
        let layout = &self.config.layout;
        let mut bounds = vec![STATIC_X_BOUND; layout.static_count];
        bounds.extend(std::iter::repeat(STATIC_Y_BOUND).take(layout.static_count));
        for _ in 0..layout.moving_count {
            bounds.extend_from_slice(&MOVING_ROW_BOUNDS);
        }
        bounds
    }

    /// Minimum separation between consecutive static x-slots (by parameter
    /// index, not sorted order) and a minimum travel span per moving row.
    pub fn constraints(&self) -> Vec<InequalityConstraint> {
        let layout = &self.config.layout;
        let search = &self.config.search;

        let separation = (0..layout.static_count.saturating_sub(1)).map(|i| {
            InequalityConstraint::min_gap(format!("separation_{i}"), i, i + 1, search.min_separation)
        });
        let travel = (0..layout.moving_count).map(|i| {
            let start = layout.moving_offset() + i * MOVING_ROW_LEN;
            InequalityConstraint::min_gap(format!("travel_{i}"), start, start + 1, search.min_travel_span)
        });

        separation.chain(travel).collect()
    }

    /// Run one constrained minimization from the seed vector.
    pub fn optimize(&self) -> StageResult<OptimizationResult> {
        let started_at = Utc::now();
        let id = Uuid::new_v4();
        info!("Starting stage optimization {} with {}", id, self.minimizer.name());

        let objective = |x: &[f64]| self.objective.value(x);
        let problem = Problem::new(
            &objective,
            self.initial_parameters(),
            self.bounds(),
            self.constraints(),
        );
        let outcome = self.minimizer.minimize(&problem, &self.config.search)?;

        let (level, breakdown) = self.objective.evaluate(&outcome.x).map_err(|e| {
            OptimizationError::InvalidProblem {
                message: format!("{} returned an unscorable point: {e}", self.minimizer.name()),
            }
        })?;

        let message = if outcome.converged {
            info!("Optimization converged with score {:.2}", breakdown.total);
            outcome.message
        } else {
            let failure = OptimizationError::NotConverged {
                message: outcome.message,
            };
            warn!("{failure}");
            failure.to_string()
        };

        Ok(OptimizationResult {
            id,
            success: outcome.converged,
            level,
            parameters: outcome.x,
            score: -outcome.fun,
            breakdown,
            message,
            iterations: outcome.iterations,
            evaluations: outcome.evaluations,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchOptions;
    use crate::search::MinimizeOutcome;
    use sf_types::{OptimizationError, StageError};

    const SEED_SCORE: f64 = 102.325_333_333_333_33;

    /// Returns a vector that cannot be decoded.
    struct Garbage;

    impl Minimizer for Garbage {
        fn minimize(
            &self,
            _problem: &Problem<'_>,
            _options: &SearchOptions,
        ) -> Result<MinimizeOutcome, OptimizationError> {
            Ok(MinimizeOutcome {
                x: vec![f64::NAN; 3],
                fun: 0.0,
                converged: true,
                message: "done".to_string(),
                iterations: 1,
                evaluations: 1,
            })
        }

        fn name(&self) -> &str {
            "garbage"
        }
    }

    /// Returns the initial vector untouched.
    struct Stay {
        converged: bool,
    }

    impl Minimizer for Stay {
        fn minimize(
            &self,
            problem: &Problem<'_>,
            _options: &SearchOptions,
        ) -> Result<MinimizeOutcome, OptimizationError> {
            problem.validate()?;
            Ok(MinimizeOutcome {
                x: problem.initial.clone(),
                fun: (problem.objective)(&problem.initial),
                converged: self.converged,
                message: if self.converged {
                    "stayed".to_string()
                } else {
                    "gave up".to_string()
                },
                iterations: 0,
                evaluations: 1,
            })
        }

        fn name(&self) -> &str {
            "stay"
        }
    }

    fn optimizer() -> StageOptimizer {
        StageOptimizer::new(StageConfig::default()).unwrap()
    }

    #[test]
    fn linspace_matches_seed_spacing() {
        assert_eq!(
            linspace(400.0, 2200.0, 6),
            vec![400.0, 760.0, 1120.0, 1480.0, 1840.0, 2200.0]
        );
        assert_eq!(linspace(1.0, 2.0, 1), vec![1.0]);
        assert!(linspace(1.0, 2.0, 0).is_empty());
    }

    #[test]
    fn initial_parameters_follow_layout() {
        let opt = optimizer();
        let params = opt.initial_parameters();
        assert_eq!(params.len(), 24);
        assert_eq!(&params[..6], &[400.0, 760.0, 1120.0, 1480.0, 1840.0, 2200.0]);
        assert!(params[6..12].iter().all(|&y| y == 500.0));
        assert_eq!(&params[12..16], &[350.0, 450.0, 480.0, 0.8]);
        assert_eq!(&params[20..24], &[1800.0, 1950.0, 400.0, 1.0]);
    }

    #[test]
    fn seed_is_feasible_and_in_bounds() {
        let opt = optimizer();
        let params = opt.initial_parameters();
        let bounds = opt.bounds();
        assert_eq!(bounds.len(), params.len());
        for (v, b) in params.iter().zip(&bounds) {
            assert!(b.contains(*v), "{v} outside {b:?}");
        }
        for c in opt.constraints() {
            assert!(c.value(&params) >= 0.0, "{} violated", c.name);
        }
    }

    #[test]
    fn bounds_per_slot() {
        let bounds = optimizer().bounds();
        assert_eq!(bounds[0], Bound::new(300.0, 2300.0));
        assert_eq!(bounds[6], Bound::new(300.0, 550.0));
        assert_eq!(bounds[12], Bound::new(200.0, 2000.0));
        assert_eq!(bounds[13], Bound::new(400.0, 2200.0));
        assert_eq!(bounds[14], Bound::new(300.0, 550.0));
        assert_eq!(bounds[15], Bound::new(0.3, 1.5));
        assert_eq!(bounds[23], Bound::new(0.3, 1.5));
    }

    #[test]
    fn constraints_cover_slots_and_rows() {
        let constraints = optimizer().constraints();
        assert_eq!(constraints.len(), 5 + 3);

        // Slot order, not sorted order: swapping two x-slots violates it.
        let mut params = optimizer().initial_parameters();
        params.swap(0, 1);
        assert_eq!(constraints[0].value(&params), 400.0 - 760.0 - 100.0);

        let travel = &constraints[5];
        assert_eq!(travel.value(&optimizer().initial_parameters()), 450.0 - 350.0 - 50.0);
    }

    #[test]
    fn seed_result_through_identity_minimizer() {
        let opt = StageOptimizer::with_minimizer(
            StageConfig::default(),
            Box::new(Stay { converged: true }),
        )
        .unwrap();
        let result = opt.optimize().unwrap();

        assert!(result.success);
        assert_eq!(result.message, "stayed");
        assert!((result.score - SEED_SCORE).abs() < 1e-9);
        assert_eq!(result.score, result.breakdown.total);
        assert_eq!(result.level.platforms.len(), 6);
        assert_eq!(result.level.moving_platforms.len(), 3);
        assert!(result.finished_at >= result.started_at);
    }

    #[test]
    fn non_convergence_becomes_failed_result() {
        let opt = StageOptimizer::with_minimizer(
            StageConfig::default(),
            Box::new(Stay { converged: false }),
        )
        .unwrap();
        let result = opt.optimize().unwrap();

        assert!(!result.success);
        assert_eq!(result.message, "Optimization failed: gave up");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = StageConfig::default().with_max_iterations(0);
        assert!(matches!(StageOptimizer::new(config), Err(StageError::Config(_))));
    }

    #[test]
    fn unscorable_final_point_is_an_optimization_error() {
        let opt = StageOptimizer::with_minimizer(StageConfig::default(), Box::new(Garbage)).unwrap();
        match opt.optimize() {
            Err(StageError::Optimization(OptimizationError::InvalidProblem { message })) => {
                assert!(message.contains("garbage"), "{message}");
            }
            other => panic!("Expected InvalidProblem, got {other:?}"),
        }
    }

    #[test]
    fn full_search_moves_off_the_seed() {
        let opt = optimizer();
        let seed = opt.initial_parameters();
        let result = opt.optimize().unwrap();

        assert!(result.iterations > 1, "stopped after {} iterations", result.iterations);
        assert_ne!(result.parameters, seed);
        assert!(result.score > SEED_SCORE, "score {}", result.score);
        assert!(result.iterations <= opt.config().search.max_iterations);
        assert!(result.level.validate(6, 3).is_ok());
        for (v, b) in result.parameters.iter().zip(opt.bounds()) {
            assert!(b.contains(*v), "{v} outside {b:?}");
        }

        // The moving-platform speeds carry the smooth part of the score.
        assert_ne!(&result.parameters[12..], &seed[12..]);

        if result.success {
            assert_eq!(result.message, "Optimization terminated successfully");
            let violation = opt
                .constraints()
                .iter()
                .map(|c| c.violation(&result.parameters))
                .fold(0.0, f64::max);
            assert!(violation <= opt.config().search.constraint_tolerance);
        } else {
            assert!(result.message.starts_with("Optimization failed: "), "{}", result.message);
        }
    }

    #[test]
    fn full_search_is_deterministic() {
        let seed = optimizer().initial_parameters();
        let first = optimizer().optimize().unwrap();
        let second = optimizer().optimize().unwrap();

        assert_ne!(first.parameters, seed);
        assert_eq!(first.score, second.score);
        assert_eq!(first.parameters, second.parameters);
        assert_eq!(first.success, second.success);
        assert_eq!(first.message, second.message);
        assert_eq!(first.iterations, second.iterations);
    }

    #[test]
    fn extra_moving_platforms_cycle_seed_rows() {
        let mut config = StageConfig::default();
        config.layout.moving_count = 4;
        let opt = StageOptimizer::new(config).unwrap();
        let params = opt.initial_parameters();
        assert_eq!(params.len(), 12 + 16);
        assert_eq!(&params[24..28], &[350.0, 450.0, 480.0, 0.8]);
        assert_eq!(opt.bounds().len(), params.len());
    }
}
