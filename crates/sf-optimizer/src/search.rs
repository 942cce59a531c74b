//! Constrained local minimization over a box with linear inequality constraints.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

use sf_types::OptimizationError;

use crate::config::SearchOptions;

/// Objective minimized by a [`Minimizer`].
pub type ObjectiveFn<'a> = &'a (dyn Fn(&[f64]) -> f64 + Sync);

/// Closed interval a single parameter must stay within.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub low: f64,
    pub high: f64,
}

impl Bound {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.low, self.high)
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.low..=self.high).contains(&value)
    }
}

/// Linear inequality `Σ coefficient·x[index] + constant ≥ 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InequalityConstraint {
    pub name: String,
    pub terms: Vec<(usize, f64)>,
    pub constant: f64,
}

impl InequalityConstraint {
    pub fn new(name: impl Into<String>, terms: Vec<(usize, f64)>, constant: f64) -> Self {
        Self {
            name: name.into(),
            terms,
            constant,
        }
    }

    /// `x[upper] - x[lower] - gap ≥ 0`.
    pub fn min_gap(name: impl Into<String>, lower: usize, upper: usize, gap: f64) -> Self {
        Self::new(name, vec![(upper, 1.0), (lower, -1.0)], -gap)
    }

    /// Value of the left-hand side; negative means violated.
    pub fn value(&self, x: &[f64]) -> f64 {
        self.terms
            .iter()
            .fold(self.constant, |acc, &(index, coefficient)| acc + coefficient * x[index])
    }

    pub fn violation(&self, x: &[f64]) -> f64 {
        (-self.value(x)).max(0.0)
    }
}

/// Everything a minimizer needs to know about one problem.
pub struct Problem<'a> {
    pub objective: ObjectiveFn<'a>,
    pub initial: Vec<f64>,
    pub bounds: Vec<Bound>,
    pub constraints: Vec<InequalityConstraint>,
}

impl<'a> Problem<'a> {
    pub fn new(
        objective: ObjectiveFn<'a>,
        initial: Vec<f64>,
        bounds: Vec<Bound>,
        constraints: Vec<InequalityConstraint>,
    ) -> Self {
        Self {
            objective,
            initial,
            bounds,
            constraints,
        }
    }

    pub fn dimension(&self) -> usize {
        self.initial.len()
    }

    pub fn validate(&self) -> Result<(), OptimizationError> {
        if self.initial.is_empty() {
            return Err(OptimizationError::InvalidProblem {
                message: "initial vector is empty".to_string(),
            });
        }
        if self.bounds.len() != self.initial.len() {
            return Err(OptimizationError::InvalidProblem {
                message: format!(
                    "{} bounds for {} parameters",
                    self.bounds.len(),
                    self.initial.len()
                ),
            });
        }
        for (index, bound) in self.bounds.iter().enumerate() {
            if bound.low.is_nan() || bound.high.is_nan() || bound.low > bound.high {
                return Err(OptimizationError::InvertedBounds {
                    index,
                    low: bound.low,
                    high: bound.high,
                });
            }
        }
        for constraint in &self.constraints {
            if let Some(&(index, _)) = constraint.terms.iter().find(|(i, _)| *i >= self.dimension()) {
                return Err(OptimizationError::InvalidProblem {
                    message: format!(
                        "constraint '{}' references parameter {index} of {}",
                        constraint.name,
                        self.dimension()
                    ),
                });
            }
        }
        Ok(())
    }

    /// Largest violation over all constraints (0 when feasible).
    pub fn max_violation(&self, x: &[f64]) -> f64 {
        self.constraints
            .iter()
            .map(|c| c.violation(x))
            .fold(0.0, f64::max)
    }

    fn project(&self, x: &[f64]) -> Vec<f64> {
        x.iter().zip(&self.bounds).map(|(v, b)| b.clamp(*v)).collect()
    }
}

/// What a minimizer reports back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimizeOutcome {
    pub x: Vec<f64>,
    pub fun: f64,
    pub converged: bool,
    pub message: String,
    pub iterations: usize,
    pub evaluations: usize,
}

/// Common trait for constrained local minimizers.
pub trait Minimizer: Send + Sync {
    /// Minimize `problem.objective` from `problem.initial`.
    ///
    /// Non-convergence is reported through [`MinimizeOutcome::converged`];
    /// `Err` is reserved for malformed problems.
    fn minimize(
        &self,
        problem: &Problem<'_>,
        options: &SearchOptions,
    ) -> Result<MinimizeOutcome, OptimizationError>;

    /// Human-readable strategy name.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Augmented Lagrangian
// ---------------------------------------------------------------------------

/// Powell-Hestenes-Rockafellar augmented Lagrangian for the inequality
/// constraints, with a box-projected gradient method (Armijo backtracking,
/// finite-difference gradients) for each inner solve.
///
/// The objective may jump between plateaus, which shows up as huge
/// finite-difference components. When no step along the full gradient is
/// accepted, the line search is retried with those components dropped.
#[derive(Debug, Clone)]
pub struct AugmentedLagrangian {
    /// Factor applied to the penalty when violation does not shrink enough.
    pub penalty_growth: f64,
    /// Required shrink factor of the violation between outer iterations.
    pub violation_shrink: f64,
    pub max_outer_iterations: usize,
    /// Sufficient-decrease constant of the Armijo test.
    pub armijo: f64,
    pub max_backtracks: usize,
    pub initial_step: f64,
    pub max_step: f64,
    /// Gradient components above this magnitude are treated as jumps.
    pub discontinuity_threshold: f64,
    /// A failed line search still counts as stationary when the projected
    /// gradient step is at most this long (finite-difference noise).
    pub stationarity_tolerance: f64,
}

impl Default for AugmentedLagrangian {
    fn default() -> Self {
        Self {
            penalty_growth: 10.0,
            violation_shrink: 0.25,
            max_outer_iterations: 50,
            armijo: 1e-4,
            max_backtracks: 50,
            initial_step: 1.0,
            max_step: 1e8,
            discontinuity_threshold: 1e6,
            stationarity_tolerance: 1e-4,
        }
    }
}

const LINE_SEARCH_FAILED: &str = "Positive directional derivative for linesearch";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InnerStatus {
    Stationary,
    LineSearchFailed,
    IterationLimit,
}

/// Result of one backtracking line search.
enum LineSearch {
    Accepted { x: Vec<f64>, value: f64, step: f64 },
    /// The projected direction is empty.
    Vanished,
    Exhausted,
}

/// Penalized objective for fixed multipliers and penalty.
struct Merit<'p, 'a> {
    problem: &'p Problem<'a>,
    multipliers: &'p [f64],
    penalty: f64,
    evaluations: &'p AtomicUsize,
}

impl Merit<'_, '_> {
    fn value(&self, x: &[f64]) -> f64 {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let objective = (self.problem.objective)(x);
        let augmentation: f64 = self
            .problem
            .constraints
            .iter()
            .zip(self.multipliers)
            .map(|(c, &lambda)| {
                let shifted = (lambda - self.penalty * c.value(x)).max(0.0);
                shifted * shifted - lambda * lambda
            })
            .sum();
        objective + augmentation / (2.0 * self.penalty)
    }

    /// Forward differences, stepping backward where the forward probe would
    /// leave the box. Components are independent, so evaluation order does
    /// not affect the result.
    fn gradient(&self, x: &[f64], base: f64, step: f64) -> Vec<f64> {
        let bounds = &self.problem.bounds;
        (0..x.len())
            .into_par_iter()
            .map(|i| {
                let h = if x[i] + step <= bounds[i].high { step } else { -step };
                let mut probe = x.to_vec();
                probe[i] += h;
                (self.value(&probe) - base) / h
            })
            .collect()
    }
}

impl AugmentedLagrangian {
    pub fn new() -> Self {
        Self::default()
    }

    fn line_search(
        &self,
        merit: &Merit<'_, '_>,
        x: &[f64],
        value: f64,
        direction: &[f64],
        step: f64,
    ) -> LineSearch {
        let mut t = step;
        for _ in 0..self.max_backtracks {
            let candidate: Vec<f64> = x
                .iter()
                .zip(direction)
                .map(|(xi, gi)| xi - t * gi)
                .collect();
            let candidate = merit.problem.project(&candidate);
            let predicted: f64 = direction
                .iter()
                .zip(x.iter().zip(&candidate))
                .map(|(g, (old, new))| g * (old - new))
                .sum();
            if predicted <= 0.0 {
                return LineSearch::Vanished;
            }
            let candidate_value = merit.value(&candidate);
            if candidate_value <= value - self.armijo * predicted {
                return LineSearch::Accepted {
                    x: candidate,
                    value: candidate_value,
                    step: t,
                };
            }
            t *= 0.5;
        }
        LineSearch::Exhausted
    }

    /// Longest coordinate of the unit projected-gradient step.
    fn projected_step_norm(problem: &Problem<'_>, x: &[f64], grad: &[f64]) -> f64 {
        x.iter()
            .zip(grad)
            .zip(&problem.bounds)
            .map(|((xi, gi), b)| (xi - b.clamp(xi - gi)).abs())
            .fold(0.0, f64::max)
    }

    fn solve_inner(
        &self,
        merit: &Merit<'_, '_>,
        x: &mut Vec<f64>,
        options: &SearchOptions,
        iterations: &mut usize,
    ) -> InnerStatus {
        let problem = merit.problem;
        let mut value = merit.value(x);
        let mut step = self.initial_step;

        loop {
            if *iterations >= options.max_iterations {
                return InnerStatus::IterationLimit;
            }
            *iterations += 1;

            let grad = merit.gradient(x, value, options.gradient_step);

            let search = match self.line_search(merit, x, value, &grad, step) {
                LineSearch::Exhausted => {
                    let smooth: Vec<f64> = grad
                        .iter()
                        .map(|g| if g.abs() > self.discontinuity_threshold { 0.0 } else { *g })
                        .collect();
                    if smooth == grad {
                        let norm = Self::projected_step_norm(problem, x, &grad);
                        debug!("Line search found no descent step at merit {value}, projected gradient {norm:e}");
                        return if norm <= self.stationarity_tolerance {
                            InnerStatus::Stationary
                        } else {
                            InnerStatus::LineSearchFailed
                        };
                    }
                    debug!("Retrying line search without jump components at merit {value}");
                    match self.line_search(merit, x, value, &smooth, step) {
                        LineSearch::Exhausted => return InnerStatus::LineSearchFailed,
                        other => other,
                    }
                }
                other => other,
            };

            let LineSearch::Accepted {
                x: candidate,
                value: candidate_value,
                step: t,
            } = search
            else {
                return InnerStatus::Stationary;
            };

            let change = value - candidate_value;
            *x = candidate;
            value = candidate_value;
            step = (2.0 * t).min(self.max_step);

            if change < options.ftol {
                return InnerStatus::Stationary;
            }
        }
    }
}

impl Minimizer for AugmentedLagrangian {
    fn minimize(
        &self,
        problem: &Problem<'_>,
        options: &SearchOptions,
    ) -> Result<MinimizeOutcome, OptimizationError> {
        problem.validate()?;

        let evaluations = AtomicUsize::new(0);
        let mut x = problem.project(&problem.initial);
        let mut multipliers = vec![0.0; problem.constraints.len()];
        let mut penalty = options.initial_penalty;
        let mut iterations = 0;
        let mut previous_violation = problem.max_violation(&x);

        let mut message = format!(
            "Constraint violation still above {:e} after {} penalty updates",
            options.constraint_tolerance, self.max_outer_iterations
        );
        let mut converged = false;

        for outer in 0..self.max_outer_iterations {
            let status = {
                let merit = Merit {
                    problem,
                    multipliers: &multipliers,
                    penalty,
                    evaluations: &evaluations,
                };
                self.solve_inner(&merit, &mut x, options, &mut iterations)
            };
            let violation = problem.max_violation(&x);
            debug!(
                "Outer iteration {outer}: violation {violation:e}, penalty {penalty}, {iterations} iterations so far"
            );

            if status == InnerStatus::Stationary && violation <= options.constraint_tolerance {
                converged = true;
                message = "Optimization terminated successfully".to_string();
                break;
            }
            match status {
                InnerStatus::IterationLimit => {
                    message = "Iteration limit reached".to_string();
                    break;
                }
                InnerStatus::LineSearchFailed => {
                    message = LINE_SEARCH_FAILED.to_string();
                    break;
                }
                InnerStatus::Stationary => {}
            }

            for (lambda, constraint) in multipliers.iter_mut().zip(&problem.constraints) {
                *lambda = (*lambda - penalty * constraint.value(&x)).max(0.0);
            }
            if violation > self.violation_shrink * previous_violation {
                penalty *= self.penalty_growth;
            }
            previous_violation = violation;
        }

        let fun = (problem.objective)(&x);
        let evaluations = evaluations.load(Ordering::Relaxed) + 1;
        info!(
            "{} finished after {iterations} iterations and {evaluations} evaluations: {message}",
            self.name()
        );

        Ok(MinimizeOutcome {
            x,
            fun,
            converged,
            message,
            iterations,
            evaluations,
        })
    }

    fn name(&self) -> &str {
        "augmented_lagrangian"
    }
}
